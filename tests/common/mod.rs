//! Shared builders for synthetic documents.
#![allow(dead_code)]

use freehub::{crc, DecodeError, Decoder, Feed, Message};

/// Wrap a record section in a 14-byte header and trailing CRC.
pub fn document(records: &[u8]) -> Vec<u8> {
    document_with(0x20, *b".FIT", records)
}

pub fn document_with(protocol_version: u8, data_type: [u8; 4], records: &[u8]) -> Vec<u8> {
    let mut doc = vec![14, protocol_version];
    doc.extend_from_slice(&2195u16.to_le_bytes());
    doc.extend_from_slice(&(records.len() as u32).to_le_bytes());
    doc.extend_from_slice(&data_type);

    let header_crc = crc::compute(0, &doc);
    doc.extend_from_slice(&header_crc.to_le_bytes());

    doc.extend_from_slice(records);

    let file_crc = crc::compute(0, &doc);
    doc.extend_from_slice(&file_crc.to_le_bytes());

    doc
}

/// A definition record: `(number, size, base type tag)` per field.
pub fn definition(local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Vec<u8> {
    definition_with(local, global, true, fields)
}

pub fn definition_with(
    local: u8,
    global: u16,
    is_little_endian: bool,
    fields: &[(u8, u8, u8)],
) -> Vec<u8> {
    let mut record = vec![0x40 | local, 0, if is_little_endian { 0 } else { 1 }];

    let global = if is_little_endian {
        global.to_le_bytes()
    } else {
        global.to_be_bytes()
    };
    record.extend_from_slice(&global);
    record.push(fields.len() as u8);

    for (number, size, tag) in fields {
        record.extend_from_slice(&[*number, *size, *tag]);
    }

    record
}

/// A data record for a local message number.
pub fn data(local: u8, values: &[u8]) -> Vec<u8> {
    let mut record = vec![local];
    record.extend_from_slice(values);
    record
}

/// Decode a whole document, collecting every message.
pub fn decode_all(input: &[u8]) -> Result<Vec<Message>, DecodeError> {
    let mut decoder = Decoder::new();
    let mut messages = vec![];

    let mut status = decoder.feed(input)?;
    loop {
        match status {
            Feed::MessageAvailable => {
                messages.push(decoder.take_message().unwrap());
                status = decoder.feed(&[])?;
            }
            Feed::NeedMoreData => {
                decoder.finish()?;
                return Ok(messages);
            }
            Feed::EndOfFile => return Ok(messages),
        }
    }
}
