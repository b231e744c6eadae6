mod common;

use common::decode_all;
use freehub::profile::global;
use freehub::{
    crc, BaseType, Decoder, EncodeError, Encoder, Feed, Message, MessageDefinition, Value,
};

fn file_id() -> Message {
    let mut message = Message::new(global::FILE_ID);
    message.set(0, BaseType::Enum, Value::U8(4));
    message.set(1, BaseType::U16, Value::U16(1));
    message.set(4, BaseType::U32, Value::U32(1_000_000));
    message
}

fn record(timestamp: u32, heart_rate: u8) -> Message {
    let mut message = Message::new(global::RECORD);
    message.set(253, BaseType::U32, Value::U32(timestamp));
    message.set(3, BaseType::U8, Value::U8(heart_rate));
    message
}

#[test]
fn empty_document_has_header_and_crc_only() {
    let bytes = Encoder::new().finish();

    assert_eq!(bytes.len(), 16);
    assert_eq!(bytes[0], 14);
    assert_eq!(&bytes[8..12], b".FIT");
    assert_eq!(decode_all(&bytes).unwrap(), vec![]);
}

#[test]
fn finish_backfills_size_and_checks() {
    let mut encoder = Encoder::new();
    encoder.write(&file_id()).unwrap();
    let bytes = encoder.finish();

    let data_size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    assert_eq!(data_size as usize, bytes.len() - 16);

    let header_crc = u16::from_le_bytes(bytes[12..14].try_into().unwrap());
    assert_eq!(header_crc, crc::compute(0, &bytes[..12]));

    let file_crc = u16::from_le_bytes(bytes[bytes.len() - 2..].try_into().unwrap());
    assert_eq!(file_crc, crc::compute(0, &bytes[..bytes.len() - 2]));
}

#[test]
fn written_messages_decode_back() {
    let mut encoder = Encoder::new();
    encoder.write(&file_id()).unwrap();
    encoder.write(&record(100, 140)).unwrap();
    encoder.write(&record(101, 142)).unwrap();

    let messages = decode_all(&encoder.finish()).unwrap();

    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].name(), Some("file_id"));
    assert_eq!(messages[1].value(253), Some(Value::U32(100)));
    assert_eq!(messages[2].value(3), Some(Value::U8(142)));
}

#[test]
fn automatic_writes_interleave_definitions_on_shape_change() {
    let mut encoder = Encoder::new();
    encoder.write(&record(100, 140)).unwrap();
    encoder.write(&record(101, 141)).unwrap();
    encoder.write(&file_id()).unwrap();
    encoder.write(&record(102, 142)).unwrap();
    let bytes = encoder.finish();

    // Three shape changes, at least three definition record headers.
    let definition_headers = bytes.iter().filter(|&&b| b == 0x40).count();
    assert!(definition_headers >= 3);

    let messages = decode_all(&bytes).unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[3].value(253), Some(Value::U32(102)));
}

#[test]
fn missing_defined_fields_are_sentinel_filled() {
    let definition = MessageDefinition {
        global: global::RECORD,
        is_little_endian: true,
        fields: vec![
            freehub::FieldDefinition { number: 3, size: 1, base_type: BaseType::U8 },
            freehub::FieldDefinition { number: 4, size: 1, base_type: BaseType::U8 },
        ],
    };

    let mut message = Message::new(global::RECORD);
    message.set(3, BaseType::U8, Value::U8(140));

    let mut encoder = Encoder::new();
    encoder.write_definition(0, &definition).unwrap();
    encoder.write_message(0, &message).unwrap();

    let messages = decode_all(&encoder.finish()).unwrap();

    assert_eq!(messages[0].value(3), Some(Value::U8(140)));
    assert_eq!(messages[0].value(4), None);
    assert_eq!(messages[0].field(4).unwrap().values, vec![Value::U8(u8::MAX)]);
}

#[test]
fn unknown_global_is_a_caller_error() {
    let mut encoder = Encoder::new();
    let message = Message::new(12345);

    assert_eq!(encoder.write(&message), Err(EncodeError::UnknownMessageType(12345)));
}

#[test]
fn data_record_without_definition_is_a_caller_error() {
    let mut encoder = Encoder::new();
    let message = record(100, 140);

    assert_eq!(
        encoder.write_message(3, &message),
        Err(EncodeError::UndefinedLocalMessage(3))
    );
}

#[test]
fn local_numbers_are_bounded() {
    let mut encoder = Encoder::new();
    let definition = MessageDefinition {
        global: global::RECORD,
        is_little_endian: true,
        fields: vec![],
    };

    assert_eq!(
        encoder.write_definition(16, &definition),
        Err(EncodeError::InvalidLocalNumber(16))
    );
}

#[test]
fn decode_then_encode_reproduces_bytes() {
    let mut encoder = Encoder::new();
    encoder.write(&file_id()).unwrap();
    encoder.write(&record(100, 140)).unwrap();
    encoder.write(&record(101, 141)).unwrap();
    let original = encoder.finish();

    // Re-encode from decoded definitions and messages, re-emitting each
    // definition exactly when the decode side saw one.
    let mut decoder = Decoder::new();
    let mut encoder = Encoder::new();
    let mut active: [Option<MessageDefinition>; 16] = [const { None }; 16];

    let mut status = decoder.feed(&original).unwrap();
    loop {
        match status {
            Feed::MessageAvailable => {
                let message = decoder.take_message().unwrap();
                let local = decoder.message_local();
                let definition = decoder.definition(local).unwrap().clone();

                if active[local as usize].as_ref() != Some(&definition) {
                    encoder.write_definition(local, &definition).unwrap();
                    active[local as usize] = Some(definition);
                }
                encoder.write_message(local, &message).unwrap();

                status = decoder.feed(&[]).unwrap();
            }
            Feed::EndOfFile => break,
            Feed::NeedMoreData => panic!("stream incomplete"),
        }
    }

    assert_eq!(encoder.finish(), original);
}
