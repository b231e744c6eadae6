//! One-to-many message dispatch.
//!
//! A [`Broadcaster`] routes each decoded message to every registered
//! listener whose [`Interest`] matches, in registration order. Listeners
//! receive the same `&mut Message`, so a mutation made by one (for example
//! a field restore) is visible to those invoked after it. Registration
//! while a broadcast is in progress is ruled out by the exclusive borrow.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::message::Message;

/// Receive messages from a decode pass.
///
/// Listeners must not retain the message beyond the call; it is owned by
/// the dispatch loop and destroyed after the last listener returns.
pub trait MessageListener {
    fn on_message(&mut self, message: &mut Message);
}

impl<F: FnMut(&mut Message)> MessageListener for F {
    fn on_message(&mut self, message: &mut Message) {
        self(message)
    }
}

/// The message category a listener subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    /// Every message.
    Any,
    /// Messages of one global message number.
    Global(u16),
    /// Messages carrying a valid value for a field number, regardless of
    /// message type.
    Field(u8),
}

impl Interest {
    fn matches(self, message: &Message) -> bool {
        match self {
            Self::Any => true,
            Self::Global(global) => message.global() == global,
            Self::Field(number) => message.field(number).is_some_and(|f| f.is_valid()),
        }
    }
}

/// An ordered collection of listeners.
#[derive(Default)]
pub struct Broadcaster {
    listeners: Vec<(Interest, Box<dyn MessageListener>)>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for a message category. Listeners are invoked in
    /// registration order.
    pub fn listen(&mut self, interest: Interest, listener: impl MessageListener + 'static) {
        self.listeners.push((interest, Box::new(listener)));
    }

    /// Dispatch a message to every matching listener.
    pub fn broadcast(&mut self, message: &mut Message) {
        for (interest, listener) in &mut self.listeners {
            if interest.matches(message) {
                listener.on_message(message);
            }
        }
    }

    /// The number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
