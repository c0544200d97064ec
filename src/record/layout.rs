use std::collections::HashMap;

use super::{FieldType, Schema};
use crate::file::{INT_SIZE, Page};

/// Physical placement of a schema's fields within a slot.
///
/// Offset 0 holds the empty/in-use flag; fields follow in schema order, each
/// taking its worst-case size. `slot_size` is the full footprint of one
/// record, flag included.
#[derive(Debug, Clone)]
pub struct Layout {
    schema: Schema,
    offsets: HashMap<String, usize>,
    slot_size: usize,
}

impl Layout {
    pub fn new(schema: Schema) -> Self {
        let mut offsets = HashMap::new();
        let mut pos = INT_SIZE; // leave space for the slot flag
        for fldname in schema.fields() {
            offsets.insert(fldname.clone(), pos);
            pos += length_in_bytes(&schema, fldname);
        }
        Layout {
            schema,
            offsets,
            slot_size: pos,
        }
    }

    /// For layouts whose offsets were already computed, e.g. read back from
    /// catalog metadata.
    pub fn from_metadata(schema: Schema, offsets: HashMap<String, usize>, slot_size: usize) -> Self {
        Layout {
            schema,
            offsets,
            slot_size,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn offset(&self, fldname: &str) -> Option<usize> {
        self.offsets.get(fldname).copied()
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }
}

fn length_in_bytes(schema: &Schema, fldname: &str) -> usize {
    match schema.field_type(fldname) {
        Some(FieldType::Integer) => INT_SIZE,
        Some(FieldType::Varchar) => Page::max_length(schema.length(fldname).unwrap_or(0)),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_follow_schema_order() {
        let mut sch = Schema::new();
        sch.add_int_field("a");
        sch.add_string_field("b", 9);
        let layout = Layout::new(sch);

        // flag at 0, a after the flag, b after a
        assert_eq!(layout.offset("a"), Some(4));
        assert_eq!(layout.offset("b"), Some(8));
        assert_eq!(layout.slot_size(), 8 + Page::max_length(9));
        assert_eq!(layout.offset("missing"), None);
    }

    #[test]
    fn test_from_metadata_uses_given_values() {
        let mut sch = Schema::new();
        sch.add_int_field("x");
        let mut offsets = HashMap::new();
        offsets.insert("x".to_string(), 12);
        let layout = Layout::from_metadata(sch, offsets, 64);
        assert_eq!(layout.offset("x"), Some(12));
        assert_eq!(layout.slot_size(), 64);
    }
}
