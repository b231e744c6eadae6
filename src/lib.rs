#![no_std]

//! An encoder and decoder for Garmin's Flexible and Interoperable Data
//! Transfer protocol.
//!
//! Freehub decodes FIT documents into dynamic, registry-described messages
//! and encodes them back, without hidden global state: every stream is an
//! explicit [`Decoder`] or [`Encoder`] value, so independent streams can be
//! processed concurrently with no synchronization.
//!
//! Decoding is push-based and resumable. Bytes may be fed in arbitrarily
//! small chunks (down to a single byte), and the decoder buffers partial
//! records across calls:
//!
//! ```ignore
//! let mut decoder = Decoder::new();
//! let mut status = decoder.feed(&chunk)?;
//! while let Feed::MessageAvailable = status {
//!     if let Some(mut message) = decoder.take_message() {
//!         broadcaster.broadcast(&mut message);
//!     }
//!     status = decoder.feed(&[])?;
//! }
//! ```
//!
//! For whole documents, the [`decode::decode_slice`] and (with the `std`
//! feature) [`decode::decode_reader`] drivers run a full decode pass against
//! a [`Broadcaster`] of message listeners.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable reader-based decoding and writer-based encoding (default).

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod broadcast;
pub mod crc;
pub mod decode;
pub mod encode;
pub mod message;
pub mod profile;
pub mod types;

pub use broadcast::{Broadcaster, Interest, MessageListener};
pub use decode::{DecodeError, Decoder, Feed};
pub use encode::{EncodeError, Encoder};
pub use message::{Field, FieldDefinition, Message, MessageDefinition};
pub use types::{BaseType, Value};

/// Protocol version written to encoded documents (2.0).
pub const PROTOCOL_VERSION: u8 = 0x20;

/// Highest major protocol version this crate decodes.
pub const PROTOCOL_VERSION_MAJOR: u8 = 2;

/// Profile version written to encoded documents.
pub const PROFILE_VERSION: u16 = 2195;
