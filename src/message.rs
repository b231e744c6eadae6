//! Wire definitions and dynamic messages.

use alloc::vec::Vec;

use crate::profile;
use crate::types::{BaseType, Value};

/// One field descriptor of a definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Field number within the message type.
    pub number: u8,
    /// Total field width on the wire, in bytes.
    pub size: u8,
    /// Base type of each element.
    pub base_type: BaseType,
}

impl FieldDefinition {
    /// The element base type and count this descriptor spans.
    ///
    /// A field wider than one element splits its bytes evenly. Widths not
    /// divisible by the element size are carried as opaque bytes instead.
    pub fn layout(&self) -> (BaseType, usize) {
        let element = self.base_type.size();
        let size = self.size as usize;

        if size > 0 && size % element == 0 {
            (self.base_type, size / element)
        } else {
            (BaseType::Byte, size)
        }
    }
}

/// The active wire layout for one local message number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDefinition {
    /// Global message number this local number maps to.
    pub global: u16,
    /// Byte order of multi-byte field values.
    pub is_little_endian: bool,
    /// Field descriptors, in wire order.
    pub fields: Vec<FieldDefinition>,
}

impl MessageDefinition {
    /// Total size of a data record under this definition, in bytes.
    pub fn wire_size(&self) -> usize {
        self.fields.iter().map(|f| f.size as usize).sum()
    }
}

/// A decoded field: one or more elements of a single base type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub number: u8,
    pub base_type: BaseType,
    pub values: Vec<Value>,
}

impl Field {
    /// Whether any element holds something other than the 'invalid' marker.
    pub fn is_valid(&self) -> bool {
        self.values.iter().any(|v| self.base_type.is_valid(*v))
    }
}

/// A message: a global message number plus an ordered collection of fields.
///
/// Fields absent from the wire record are absent here too, and read back as
/// the base type's 'invalid' marker; fields present but holding the marker
/// are kept at the marker, never surfaced as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    global: u16,
    time_offset: Option<u8>,
    fields: Vec<Field>,
}

impl Message {
    pub fn new(global: u16) -> Self {
        Self {
            global,
            time_offset: None,
            fields: Vec::new(),
        }
    }

    /// The global message number.
    pub fn global(&self) -> u16 {
        self.global
    }

    /// The profile name of this message type, if the registry knows it.
    pub fn name(&self) -> Option<&'static str> {
        profile::message_info(self.global).map(|m| m.name)
    }

    /// The time offset carried by a compressed-timestamp record header.
    pub fn time_offset(&self) -> Option<u8> {
        self.time_offset
    }

    pub(crate) fn set_time_offset(&mut self, offset: Option<u8>) {
        self.time_offset = offset;
    }

    /// All fields, in wire order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// A field by number.
    pub fn field(&self, number: u8) -> Option<&Field> {
        self.fields.iter().find(|f| f.number == number)
    }

    fn field_mut(&mut self, number: u8) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.number == number)
    }

    /// The first element of a field, if it holds a valid value.
    pub fn value(&self, number: u8) -> Option<Value> {
        let field = self.field(number)?;
        let value = *field.values.first()?;

        field.base_type.is_valid(value).then_some(value)
    }

    /// The first element of a field with the registry's scale and offset
    /// applied.
    pub fn scaled(&self, number: u8) -> Option<f64> {
        let value = self.value(number)?;
        let info = profile::field_info(self.global, number)?;

        Some(value.as_f64() / info.scale - info.offset)
    }

    /// Set a single-element field, replacing any previous elements.
    pub fn set(&mut self, number: u8, base_type: BaseType, value: Value) {
        self.insert(Field {
            number,
            base_type,
            values: alloc::vec![value],
        });
    }

    /// Insert a field, replacing any field with the same number.
    pub fn insert(&mut self, field: Field) {
        match self.field_mut(field.number) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    /// Overlay this message's valid fields onto a target wherever the target
    /// is missing the field or still holds the 'invalid' marker.
    ///
    /// A target field the caller set to a valid value is never overwritten,
    /// so a deliberate reset to the marker survives alongside restored state.
    pub fn restore_fields(&self, target: &mut Message) {
        for field in self.fields.iter().filter(|f| f.is_valid()) {
            match target.field_mut(field.number) {
                Some(existing) if existing.is_valid() => {}
                Some(existing) => *existing = field.clone(),
                None => target.fields.push(field.clone()),
            }
        }
    }

    /// Fold a newer instance of this message type into accumulated state:
    /// valid fields overwrite, fields still at the marker are kept from the
    /// older state.
    pub(crate) fn merge_from(&mut self, newer: &Message) {
        self.time_offset = newer.time_offset;

        for field in &newer.fields {
            match self.field_mut(field.number) {
                Some(existing) if field.is_valid() => *existing = field.clone(),
                Some(_) => {}
                None => self.fields.push(field.clone()),
            }
        }
    }
}
