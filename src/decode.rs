//! Push-based, resumable document decoder.
//!
//! [`Decoder`] is a state machine over an incoming byte stream. Input may
//! arrive in arbitrarily small chunks: bytes are buffered internally, and a
//! partial record simply reports [`Feed::NeedMoreData`] until enough arrive.
//! Consumed bytes are never reprocessed.
//!
//! Each stream is one `Decoder` value holding the sixteen active local
//! message definitions, the running cyclic redundancy check, and the
//! per-local accumulation cache used by [`Decoder::restore_fields`].
//! Independent streams decode concurrently by constructing independent
//! decoders; nothing is shared but the immutable registry.

use alloc::vec::Vec;

use either::Either::{self, Left, Right};
use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::FromBytes;

use crate::broadcast::Broadcaster;
use crate::crc;
use crate::message::{Field, FieldDefinition, Message, MessageDefinition};
use crate::profile;
use crate::types::BaseType;
use crate::PROTOCOL_VERSION_MAJOR;

/// A terminal or reported decoding failure.
///
/// `ProtocolVersionNotSupported`, `UndefinedLocalMessage`,
/// `UnexpectedEndOfStream`, and the header errors leave the stream unusable.
/// `CrcMismatch` is reported once; messages decoded before it remain valid at
/// the caller's discretion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Unsupported major protocol version.
    #[error("Unsupported protocol version ({0:#04x}).")]
    ProtocolVersionNotSupported(u8),
    /// Incorrect file type marker, rejected in strict mode.
    #[error("Incorrect file type marker.")]
    NotFitData,
    /// Unknown header length.
    #[error("Unknown header length ({0}).")]
    UnknownHeaderLength(u8),
    /// Found developer data (not supported).
    #[error("Found developer data.")]
    DeveloperData,
    /// A data record referenced a local message number with no definition.
    #[error("Data record for undefined local message number {0}.")]
    UndefinedLocalMessage(u8),
    /// Calculated and found CRC values do not match.
    #[error("Calculated ({calculated:#06x}) and found ({found:#06x}) CRC values do not match.")]
    CrcMismatch { found: u16, calculated: u16 },
    /// Input ended before the declared data size was reached.
    #[error("Unexpectedly reached the end of the stream.")]
    UnexpectedEndOfStream,
}

/// Outcome of one [`Decoder::feed`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// A record is incomplete; feed more bytes.
    NeedMoreData,
    /// A message is ready; drain it with [`Decoder::take_message`], then feed
    /// again (an empty slice is fine) to continue.
    MessageAvailable,
    /// The declared data size was consumed and the trailing CRC verified.
    EndOfFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    HeaderSize,
    Header { size: u8 },
    RecordHeader,
    DefinitionHeader { local: u8 },
    DefinitionFields { local: u8, is_little_endian: bool, global: u16, count: u8 },
    DataRecord { local: u8, time_offset: Option<u8> },
    FileCrc,
    EndOfFile,
    Failed(DecodeError),
}

bitfield! {
    struct NormalHeader(u8) {
        [0..4] local_message: u8,
        [5] is_developer,
        [6] is_definition,
        [7] is_compressed,
    }
}

bitfield! {
    struct CompressedHeader(u8) {
        [0..5] time_offset: u8,
        [5..7] local_message: u8,
    }
}

/// A per-stream decoding session.
pub struct Decoder {
    buf: Vec<u8>,
    pos: usize,
    state: State,
    strict: bool,

    crc: u16,
    data_size: u32,
    record_bytes: usize,

    definitions: [Option<MessageDefinition>; 16],
    accumulated: [Option<Message>; 16],

    message: Option<Message>,
    message_global: Option<u16>,
    message_local: u8,
    message_bytes: Vec<u8>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
            state: State::HeaderSize,
            strict: false,
            crc: 0,
            data_size: 0,
            record_bytes: 0,
            definitions: [const { None }; 16],
            accumulated: [const { None }; 16],
            message: None,
            message_global: None,
            message_local: 0,
            message_bytes: Vec::new(),
        }
    }

    /// Promote the file type marker and header CRC warnings to errors.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Feed a chunk of input and advance as far as possible.
    ///
    /// Returns [`Feed::MessageAvailable`] with a decoded message pending;
    /// drain it and call `feed` again (with any chunk, including an empty
    /// one) to continue. A fed chunk is buffered in full, so no input is
    /// lost when a message interrupts processing.
    pub fn feed(&mut self, input: &[u8]) -> Result<Feed, DecodeError> {
        self.buf.extend_from_slice(input);

        loop {
            // Hold until the pending message is drained, so it is never
            // silently replaced.
            if self.message.is_some() {
                return Ok(Feed::MessageAvailable);
            }

            let available = self.buf.len() - self.pos;

            match self.state {
                State::EndOfFile => return Ok(Feed::EndOfFile),
                State::Failed(error) => return Err(error),

                State::HeaderSize => {
                    if available < 1 {
                        return self.need_more();
                    }

                    let size = self.buf[self.pos];
                    if size != 12 && size != 14 {
                        return self.fail(DecodeError::UnknownHeaderLength(size));
                    }

                    self.state = State::Header { size };
                }

                State::Header { size } => {
                    if available < size as usize {
                        return self.need_more();
                    }

                    let start = self.pos;
                    self.consume(size as usize, true);

                    if let Err(error) = self.check_header(start, size) {
                        return self.fail(error);
                    }

                    self.state = if self.data_size == 0 {
                        State::FileCrc
                    } else {
                        State::RecordHeader
                    };
                }

                State::RecordHeader => {
                    if available < 1 {
                        return self.need_more();
                    }

                    let start = self.pos;
                    self.consume(1, true);
                    self.record_bytes += 1;

                    match parse_record_header(self.buf[start]) {
                        Ok((local, Left(()))) => {
                            self.state = State::DefinitionHeader { local };
                        }
                        Ok((local, Right(time_offset))) => {
                            self.state = State::DataRecord { local, time_offset };
                        }
                        Err(error) => return self.fail(error),
                    }
                }

                State::DefinitionHeader { local } => {
                    if available < 5 {
                        return self.need_more();
                    }

                    let start = self.pos;
                    self.consume(5, true);
                    self.record_bytes += 5;

                    let is_little_endian = self.buf[start + 1] == 0;
                    let global = [self.buf[start + 2], self.buf[start + 3]];
                    let global = if is_little_endian {
                        u16::from_le_bytes(global)
                    } else {
                        u16::from_be_bytes(global)
                    };
                    let count = self.buf[start + 4];

                    if count == 0 {
                        self.store_definition(local, global, is_little_endian, Vec::new());
                        self.after_record();
                    } else {
                        self.state = State::DefinitionFields { local, is_little_endian, global, count };
                    }
                }

                State::DefinitionFields { local, is_little_endian, global, count } => {
                    let need = count as usize * 3;
                    if available < need {
                        return self.need_more();
                    }

                    let start = self.pos;
                    self.consume(need, true);
                    self.record_bytes += need;

                    let mut fields = Vec::with_capacity(count as usize);
                    for descriptor in self.buf[start..start + need].chunks_exact(3) {
                        fields.push(FieldDefinition {
                            number: descriptor[0],
                            size: descriptor[1],
                            base_type: BaseType::from_tag(descriptor[2]),
                        });
                    }

                    self.store_definition(local, global, is_little_endian, fields);
                    self.after_record();
                }

                State::DataRecord { local, time_offset } => {
                    let need = match self.definitions[local as usize].as_ref() {
                        Some(definition) => definition.wire_size(),
                        None => return self.fail(DecodeError::UndefinedLocalMessage(local)),
                    };
                    if available < need {
                        return self.need_more();
                    }

                    let start = self.pos;
                    self.consume(need, true);
                    self.record_bytes += need;

                    let message = match self.definitions[local as usize].as_ref() {
                        Some(definition) => {
                            decode_record(definition, &self.buf[start..start + need], time_offset)
                        }
                        None => return self.fail(DecodeError::UndefinedLocalMessage(local)),
                    };

                    self.message_bytes.clear();
                    self.message_bytes.extend_from_slice(&self.buf[start..start + need]);
                    self.message_global = Some(message.global());
                    self.message_local = local;

                    match &mut self.accumulated[local as usize] {
                        Some(accumulated) => accumulated.merge_from(&message),
                        slot => *slot = Some(message.clone()),
                    }

                    self.message = Some(message);
                    self.after_record();

                    return Ok(Feed::MessageAvailable);
                }

                State::FileCrc => {
                    if available < 2 {
                        return self.need_more();
                    }

                    let calculated = self.crc;
                    let start = self.pos;
                    self.consume(2, false);
                    let found = u16::from_le_bytes([self.buf[start], self.buf[start + 1]]);

                    self.state = State::EndOfFile;

                    if found != calculated {
                        // Reported once; decoded messages remain usable.
                        return Err(DecodeError::CrcMismatch { found, calculated });
                    }

                    return Ok(Feed::EndOfFile);
                }
            }
        }
    }

    /// Report how a stream that will receive no further input ended.
    ///
    /// Returns `UnexpectedEndOfStream` when the declared data size was not
    /// reached, or the stream's terminal error if it failed earlier.
    pub fn finish(&self) -> Result<(), DecodeError> {
        match self.state {
            State::EndOfFile => Ok(()),
            State::Failed(error) => Err(error),
            _ => Err(DecodeError::UnexpectedEndOfStream),
        }
    }

    /// Remove and return the pending decoded message.
    pub fn take_message(&mut self) -> Option<Message> {
        self.message.take()
    }

    /// The global message number of the most recently decoded message.
    pub fn message_global(&self) -> Option<u16> {
        self.message_global
    }

    /// The raw data record bytes of the most recently decoded message.
    pub fn message_bytes(&self) -> &[u8] {
        &self.message_bytes
    }

    /// The active definition for a local message number.
    pub fn definition(&self, local: u8) -> Option<&MessageDefinition> {
        self.definitions.get(local as usize)?.as_ref()
    }

    /// The local message number of the most recently decoded message.
    pub fn message_local(&self) -> u8 {
        self.message_local
    }

    /// Overlay accumulated state for the current message type onto a partial
    /// message, filling in fields the target is missing or holds at the
    /// 'invalid' marker. See [`Message::restore_fields`].
    pub fn restore_fields(&self, target: &mut Message) {
        if let Some(accumulated) = self.accumulated[self.message_local as usize].as_ref() {
            accumulated.restore_fields(target);
        }
    }

    fn need_more(&mut self) -> Result<Feed, DecodeError> {
        // Drop consumed bytes before waiting on the caller.
        self.buf.drain(..self.pos);
        self.pos = 0;

        Ok(Feed::NeedMoreData)
    }

    fn fail(&mut self, error: DecodeError) -> Result<Feed, DecodeError> {
        self.state = State::Failed(error);
        Err(error)
    }

    fn consume(&mut self, n: usize, checked: bool) {
        let start = self.pos;
        self.pos += n;

        if checked {
            self.crc = crc::compute(self.crc, &self.buf[start..self.pos]);
        }
    }

    fn check_header(&mut self, start: usize, size: u8) -> Result<(), DecodeError> {
        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct FileHeader {
            header_size: u8,
            protocol_version: u8,
            profile_version: [u8; 2],
            data_size: [u8; 4],
            data_type: [u8; 4],
        }

        let mut raw = [0u8; 12];
        raw.copy_from_slice(&self.buf[start..start + 12]);
        let header: FileHeader = zerocopy::transmute!(raw);

        if header.protocol_version >> 4 > PROTOCOL_VERSION_MAJOR {
            return Err(DecodeError::ProtocolVersionNotSupported(header.protocol_version));
        }

        if &header.data_type != b".FIT" {
            if self.strict {
                return Err(DecodeError::NotFitData);
            }
            log::warn!("File type marker is not \".FIT\"; continuing.");
        }

        if size == 14 {
            let found = u16::from_le_bytes([self.buf[start + 12], self.buf[start + 13]]);
            let calculated = crc::compute(0, &self.buf[start..start + 12]);

            // A zeroed header CRC means it was not computed.
            if found != 0 && found != calculated {
                if self.strict {
                    return Err(DecodeError::CrcMismatch { found, calculated });
                }
                log::warn!("Header CRC mismatch ({found:#06x} found, {calculated:#06x} calculated).");
            }
        }

        self.data_size = u32::from_le_bytes(header.data_size);

        Ok(())
    }

    fn store_definition(
        &mut self,
        local: u8,
        global: u16,
        is_little_endian: bool,
        fields: Vec<FieldDefinition>,
    ) {
        if profile::message_info(global).is_none() {
            log::debug!("No profile entry for global message number {global}.");
        }

        self.definitions[local as usize] = Some(MessageDefinition {
            global,
            is_little_endian,
            fields,
        });

        // A redefinition invalidates accumulated state for this slot.
        self.accumulated[local as usize] = None;
    }

    fn after_record(&mut self) {
        self.state = if self.record_bytes >= self.data_size as usize {
            State::FileCrc
        } else {
            State::RecordHeader
        };
    }
}

/// Split a record header byte into its local message number and either a
/// definition marker (left) or a data marker with any compressed time offset
/// (right).
fn parse_record_header(byte: u8) -> Result<(u8, Either<(), Option<u8>>), DecodeError> {
    let header = NormalHeader(byte);

    if header.is_compressed() {
        let header = CompressedHeader(byte);

        return Ok((header.local_message(), Right(Some(header.time_offset()))));
    }

    if header.is_developer() {
        return Err(DecodeError::DeveloperData);
    }

    if header.is_definition() {
        Ok((header.local_message(), Left(())))
    } else {
        Ok((header.local_message(), Right(None)))
    }
}

/// Decode a data record's bytes under its definition.
fn decode_record(
    definition: &MessageDefinition,
    bytes: &[u8],
    time_offset: Option<u8>,
) -> Message {
    let mut message = Message::new(definition.global);
    message.set_time_offset(time_offset);

    let mut offset = 0;
    for descriptor in &definition.fields {
        let (base_type, count) = descriptor.layout();
        let element = base_type.size();

        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(base_type.decode(
                &bytes[offset..offset + element],
                definition.is_little_endian,
            ));
            offset += element;
        }

        message.insert(Field {
            number: descriptor.number,
            base_type,
            values,
        });
    }

    message
}

/// Decode a complete document from a slice, broadcasting each message.
///
/// Returns the number of messages dispatched.
pub fn decode_slice(r: &[u8], broadcaster: &mut Broadcaster) -> Result<usize, DecodeError> {
    let mut decoder = Decoder::new();
    let mut count = 0;

    let mut status = decoder.feed(r)?;
    loop {
        match status {
            Feed::MessageAvailable => {
                if let Some(mut message) = decoder.take_message() {
                    broadcaster.broadcast(&mut message);
                    count += 1;
                }
                status = decoder.feed(&[])?;
            }
            Feed::NeedMoreData => {
                decoder.finish()?;
                return Ok(count);
            }
            Feed::EndOfFile => return Ok(count),
        }
    }
}

/// Errors occurring while decoding from a reader.
///
/// _Requires Cargo feature `std`._
#[cfg(feature = "std")]
#[derive(Debug, Error)]
pub enum ReadError {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A decoding failure.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Decode a complete document from a reader, broadcasting each message.
///
/// Returns the number of messages dispatched.
///
/// _Requires Cargo feature `std`._
#[cfg(feature = "std")]
pub fn decode_reader(
    r: &mut impl std::io::Read,
    broadcaster: &mut Broadcaster,
) -> Result<usize, ReadError> {
    let mut decoder = Decoder::new();
    let mut count = 0;
    let mut buf = [0u8; 4096];

    loop {
        let n = r.read(&mut buf)?;
        if n == 0 {
            decoder.finish()?;
            return Ok(count);
        }

        let mut status = decoder.feed(&buf[..n])?;
        loop {
            match status {
                Feed::MessageAvailable => {
                    if let Some(mut message) = decoder.take_message() {
                        broadcaster.broadcast(&mut message);
                        count += 1;
                    }
                    status = decoder.feed(&[])?;
                }
                Feed::NeedMoreData => break,
                Feed::EndOfFile => return Ok(count),
            }
        }
    }
}
