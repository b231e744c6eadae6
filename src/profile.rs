//! Compiled-in message definition registry.
//!
//! A read-only table from global message numbers to message names and field
//! metadata (base type, scale, offset, units). The registry covers a
//! representative subset of the profile; messages outside it still decode
//! from their wire definitions but carry no name or scaling information.
//!
//! The tables are `'static` and immutable, so any number of concurrent
//! streams may consult them without synchronization.

use alloc::vec::Vec;

use crate::message::{FieldDefinition, MessageDefinition};
use crate::types::BaseType;

/// Global message numbers for the compiled-in profile.
pub mod global {
    pub const FILE_ID: u16 = 0;
    pub const SESSION: u16 = 18;
    pub const LAP: u16 = 19;
    pub const RECORD: u16 = 20;
    pub const EVENT: u16 = 21;
    pub const DEVICE_INFO: u16 = 23;
    pub const ACTIVITY: u16 = 34;
}

/// Profile metadata for one message type.
#[derive(Debug)]
pub struct MessageInfo {
    pub global: u16,
    pub name: &'static str,
    pub fields: &'static [FieldInfo],
}

/// Profile metadata for one field of a message type.
#[derive(Debug)]
pub struct FieldInfo {
    pub number: u8,
    pub name: &'static str,
    pub base_type: BaseType,
    pub scale: f64,
    pub offset: f64,
    pub units: &'static str,
}

impl MessageInfo {
    /// A little-endian wire definition listing every profile field at its
    /// base width.
    pub fn definition(&self) -> MessageDefinition {
        let fields = self
            .fields
            .iter()
            .map(|f| FieldDefinition {
                number: f.number,
                size: f.base_type.size() as u8,
                base_type: f.base_type,
            })
            .collect::<Vec<_>>();

        MessageDefinition {
            global: self.global,
            is_little_endian: true,
            fields,
        }
    }

    /// The wire size of [`definition`](Self::definition), in bytes.
    pub fn wire_size(&self) -> usize {
        self.fields.iter().map(|f| f.base_type.size()).sum()
    }
}

/// Look up a message type by global number.
pub fn message_info(global: u16) -> Option<&'static MessageInfo> {
    MESSAGES.iter().find(|m| m.global == global)
}

/// Look up a field of a message type by field number.
pub fn field_info(global: u16, number: u8) -> Option<&'static FieldInfo> {
    message_info(global)?.fields.iter().find(|f| f.number == number)
}

macro_rules! field {
    ($number:expr, $name:literal, $base:ident) => {
        field!($number, $name, $base, 1.0, 0.0, "")
    };
    ($number:expr, $name:literal, $base:ident, $scale:expr, $offset:expr, $units:literal) => {
        FieldInfo {
            number: $number,
            name: $name,
            base_type: BaseType::$base,
            scale: $scale,
            offset: $offset,
            units: $units,
        }
    };
}

static MESSAGES: [MessageInfo; 7] = [
    MessageInfo {
        global: global::FILE_ID,
        name: "file_id",
        fields: &[
            field!(0, "type", Enum),
            field!(1, "manufacturer", U16),
            field!(2, "product", U16),
            field!(3, "serial_number", U32z),
            field!(4, "time_created", U32, 1.0, 0.0, "s"),
            field!(5, "number", U16),
        ],
    },
    MessageInfo {
        global: global::SESSION,
        name: "session",
        fields: &[
            field!(253, "timestamp", U32, 1.0, 0.0, "s"),
            field!(0, "event", Enum),
            field!(1, "event_type", Enum),
            field!(2, "start_time", U32, 1.0, 0.0, "s"),
            field!(3, "start_position_lat", I32, 1.0, 0.0, "semicircles"),
            field!(4, "start_position_long", I32, 1.0, 0.0, "semicircles"),
            field!(5, "sport", Enum),
            field!(6, "sub_sport", Enum),
            field!(7, "total_elapsed_time", U32, 1000.0, 0.0, "s"),
            field!(8, "total_timer_time", U32, 1000.0, 0.0, "s"),
            field!(9, "total_distance", U32, 100.0, 0.0, "m"),
            field!(14, "avg_speed", U16, 1000.0, 0.0, "m/s"),
            field!(15, "max_speed", U16, 1000.0, 0.0, "m/s"),
            field!(16, "avg_heart_rate", U8, 1.0, 0.0, "bpm"),
            field!(17, "max_heart_rate", U8, 1.0, 0.0, "bpm"),
        ],
    },
    MessageInfo {
        global: global::LAP,
        name: "lap",
        fields: &[
            field!(253, "timestamp", U32, 1.0, 0.0, "s"),
            field!(0, "event", Enum),
            field!(1, "event_type", Enum),
            field!(2, "start_time", U32, 1.0, 0.0, "s"),
            field!(7, "total_elapsed_time", U32, 1000.0, 0.0, "s"),
            field!(8, "total_timer_time", U32, 1000.0, 0.0, "s"),
            field!(9, "total_distance", U32, 100.0, 0.0, "m"),
            field!(13, "avg_speed", U16, 1000.0, 0.0, "m/s"),
            field!(14, "max_speed", U16, 1000.0, 0.0, "m/s"),
            field!(15, "avg_heart_rate", U8, 1.0, 0.0, "bpm"),
            field!(16, "max_heart_rate", U8, 1.0, 0.0, "bpm"),
        ],
    },
    MessageInfo {
        global: global::RECORD,
        name: "record",
        fields: &[
            field!(253, "timestamp", U32, 1.0, 0.0, "s"),
            field!(0, "position_lat", I32, 1.0, 0.0, "semicircles"),
            field!(1, "position_long", I32, 1.0, 0.0, "semicircles"),
            field!(2, "altitude", U16, 5.0, 500.0, "m"),
            field!(3, "heart_rate", U8, 1.0, 0.0, "bpm"),
            field!(4, "cadence", U8, 1.0, 0.0, "rpm"),
            field!(5, "distance", U32, 100.0, 0.0, "m"),
            field!(6, "speed", U16, 1000.0, 0.0, "m/s"),
            field!(7, "power", U16, 1.0, 0.0, "watts"),
            field!(13, "temperature", I8, 1.0, 0.0, "C"),
        ],
    },
    MessageInfo {
        global: global::EVENT,
        name: "event",
        fields: &[
            field!(253, "timestamp", U32, 1.0, 0.0, "s"),
            field!(0, "event", Enum),
            field!(1, "event_type", Enum),
            field!(2, "data16", U16),
            field!(3, "data", U32),
            field!(4, "event_group", U8),
        ],
    },
    MessageInfo {
        global: global::DEVICE_INFO,
        name: "device_info",
        fields: &[
            field!(253, "timestamp", U32, 1.0, 0.0, "s"),
            field!(0, "device_index", U8),
            field!(1, "device_type", U8),
            field!(2, "manufacturer", U16),
            field!(3, "serial_number", U32z),
            field!(4, "product", U16),
            field!(5, "software_version", U16, 100.0, 0.0, ""),
            field!(10, "battery_voltage", U16, 256.0, 0.0, "V"),
        ],
    },
    MessageInfo {
        global: global::ACTIVITY,
        name: "activity",
        fields: &[
            field!(253, "timestamp", U32, 1.0, 0.0, "s"),
            field!(0, "total_timer_time", U32, 1000.0, 0.0, "s"),
            field!(1, "num_sessions", U16),
            field!(2, "type", Enum),
            field!(3, "event", Enum),
            field!(4, "event_type", Enum),
            field!(5, "local_timestamp", U32, 1.0, 0.0, "s"),
        ],
    },
];
