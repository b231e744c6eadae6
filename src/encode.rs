//! In-memory document encoder.
//!
//! [`Encoder`] mirrors the decode direction: definition records first, data
//! records against the active definition for their local message number.
//! The document header is written up front with a placeholder data size;
//! [`Encoder::finish`] back-fills the size, computes the header CRC, and
//! appends the trailing file CRC.

use alloc::vec::Vec;

use thiserror::Error;
use zerocopy::{Immutable, IntoBytes};

use crate::crc;
use crate::message::{FieldDefinition, Message, MessageDefinition};
use crate::profile;
use crate::{PROFILE_VERSION, PROTOCOL_VERSION};

/// An error preparing a record for encoding. All variants are caller errors;
/// the encoder itself is infallible once a record is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The message's global number is not in the compiled-in profile.
    #[error("Global message number {0} is not in the compiled-in profile.")]
    UnknownMessageType(u16),
    /// No definition has been written for the local message number.
    #[error("No definition is active for local message number {0}.")]
    UndefinedLocalMessage(u8),
    /// Local message numbers span 0 through 15.
    #[error("Local message number {0} is out of range.")]
    InvalidLocalNumber(u8),
    /// A definition's field list or field width exceeds what a record can
    /// describe.
    #[error("Definition for global message number {0} does not fit a definition record.")]
    OversizedDefinition(u16),
}

/// A per-stream encoding session accumulating a document in memory.
pub struct Encoder {
    buf: Vec<u8>,
    definitions: [Option<MessageDefinition>; 16],
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Open a document: writes the 14-byte header with a placeholder data
    /// size and CRC.
    pub fn new() -> Self {
        #[repr(C, packed)]
        #[derive(IntoBytes, Immutable)]
        struct FileHeader {
            header_size: u8,
            protocol_version: u8,
            profile_version: [u8; 2],
            data_size: [u8; 4],
            data_type: [u8; 4],
        }

        let header = FileHeader {
            header_size: 14,
            protocol_version: PROTOCOL_VERSION,
            profile_version: PROFILE_VERSION.to_le_bytes(),
            data_size: [0; 4],
            data_type: *b".FIT",
        };

        let mut buf = Vec::new();
        buf.extend_from_slice(header.as_bytes());
        buf.extend_from_slice(&[0, 0]); // Header CRC, back-filled on finish.

        Self {
            buf,
            definitions: [const { None }; 16],
        }
    }

    /// Emit a definition record and make it active for a local message
    /// number, replacing any prior definition on that number.
    pub fn write_definition(
        &mut self,
        local: u8,
        definition: &MessageDefinition,
    ) -> Result<(), EncodeError> {
        if local > 15 {
            return Err(EncodeError::InvalidLocalNumber(local));
        }

        let count = u8::try_from(definition.fields.len())
            .map_err(|_| EncodeError::OversizedDefinition(definition.global))?;

        // Header byte: definition bit plus the local number nibble.
        self.buf.push(0x40 | (local & 0x0F));
        self.buf.push(0); // Reserved.
        self.buf.push(if definition.is_little_endian { 0 } else { 1 });

        let global = if definition.is_little_endian {
            definition.global.to_le_bytes()
        } else {
            definition.global.to_be_bytes()
        };
        self.buf.extend_from_slice(&global);
        self.buf.push(count);

        for field in &definition.fields {
            self.buf.push(field.number);
            self.buf.push(field.size);
            self.buf.push(field.base_type.tag());
        }

        self.definitions[local as usize] = Some(definition.clone());

        Ok(())
    }

    /// Emit a data record for a message against the active definition for a
    /// local message number.
    ///
    /// Fields the definition lists but the message lacks are filled with the
    /// base type's 'invalid' marker; message fields outside the definition
    /// are not written.
    pub fn write_message(&mut self, local: u8, message: &Message) -> Result<(), EncodeError> {
        if local > 15 {
            return Err(EncodeError::InvalidLocalNumber(local));
        }

        let Some(definition) = self.definitions[local as usize].as_ref() else {
            return Err(EncodeError::UndefinedLocalMessage(local));
        };

        self.buf.push(local & 0x0F);
        encode_record(definition, message, &mut self.buf);

        Ok(())
    }

    /// Write a message, deriving and interleaving its definition.
    ///
    /// Local message number 0 is used throughout; a definition record is
    /// emitted whenever the message's shape differs from the one active.
    /// The message's global number must be in the compiled-in profile.
    pub fn write(&mut self, message: &Message) -> Result<(), EncodeError> {
        if profile::message_info(message.global()).is_none() {
            return Err(EncodeError::UnknownMessageType(message.global()));
        }

        let definition = derive_definition(message)?;

        if self.definitions[0].as_ref() != Some(&definition) {
            self.write_definition(0, &definition)?;
        }

        self.write_message(0, message)
    }

    /// Close the document: back-fill the data size, compute the header CRC,
    /// append the trailing file CRC, and return the finished bytes.
    pub fn finish(mut self) -> Vec<u8> {
        let data_size = (self.buf.len() - 14) as u32;
        self.buf[4..8].copy_from_slice(&data_size.to_le_bytes());

        let header_crc = crc::compute(0, &self.buf[..12]);
        self.buf[12..14].copy_from_slice(&header_crc.to_le_bytes());

        let file_crc = crc::compute(0, &self.buf);
        self.buf.extend_from_slice(&file_crc.to_le_bytes());

        self.buf
    }

    /// Close the document and write it to a sink.
    ///
    /// _Requires Cargo feature `std`._
    #[cfg(feature = "std")]
    pub fn finish_into(self, w: &mut impl std::io::Write) -> std::io::Result<()> {
        w.write_all(&self.finish())
    }
}

/// Derive a little-endian wire definition from a message's own fields.
fn derive_definition(message: &Message) -> Result<MessageDefinition, EncodeError> {
    let mut fields = Vec::with_capacity(message.fields().len());

    for field in message.fields() {
        let size = field.values.len() * field.base_type.size();
        let size =
            u8::try_from(size).map_err(|_| EncodeError::OversizedDefinition(message.global()))?;

        fields.push(FieldDefinition {
            number: field.number,
            size,
            base_type: field.base_type,
        });
    }

    Ok(MessageDefinition {
        global: message.global(),
        is_little_endian: true,
        fields,
    })
}

/// Encode a data record's field bytes under a definition.
fn encode_record(definition: &MessageDefinition, message: &Message, out: &mut Vec<u8>) {
    for descriptor in &definition.fields {
        let (base_type, count) = descriptor.layout();
        let field = message.field(descriptor.number);

        for i in 0..count {
            let value = field
                .and_then(|f| f.values.get(i))
                .copied()
                .unwrap_or_else(|| base_type.invalid());

            base_type.encode(value, definition.is_little_endian, out);
        }
    }
}
