use std::collections::HashMap;
use std::fmt;

/// Field types supported by the record layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Varchar,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Integer => write!(f, "INT"),
            FieldType::Varchar => write!(f, "VARCHAR"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldInfo {
    ftype: FieldType,
    length: usize,
}

/// Ordered field metadata for one record type. Field length is only
/// meaningful for varchar fields and counts code points, not bytes.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<String>,
    info: HashMap<String, FieldInfo>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&mut self, fldname: &str, ftype: FieldType, length: usize) {
        self.fields.push(fldname.to_string());
        self.info.insert(fldname.to_string(), FieldInfo { ftype, length });
    }

    pub fn add_int_field(&mut self, fldname: &str) {
        self.add_field(fldname, FieldType::Integer, 0);
    }

    pub fn add_string_field(&mut self, fldname: &str, length: usize) {
        self.add_field(fldname, FieldType::Varchar, length);
    }

    /// Copies one field definition from another schema, if present there.
    pub fn add(&mut self, fldname: &str, other: &Schema) {
        if let Some(info) = other.info.get(fldname) {
            self.add_field(fldname, info.ftype, info.length);
        }
    }

    pub fn add_all(&mut self, other: &Schema) {
        for fldname in other.fields() {
            self.add(fldname, other);
        }
    }

    pub fn field_type(&self, fldname: &str) -> Option<FieldType> {
        self.info.get(fldname).map(|info| info.ftype)
    }

    pub fn length(&self, fldname: &str) -> Option<usize> {
        self.info.get(fldname).map(|info| info.length)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, fldname: &str) -> bool {
        self.info.contains_key(fldname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_keep_insertion_order() {
        let mut sch = Schema::new();
        sch.add_int_field("id");
        sch.add_string_field("name", 20);
        sch.add_int_field("age");
        assert_eq!(sch.fields(), &["id", "name", "age"]);
        assert_eq!(sch.field_type("name"), Some(FieldType::Varchar));
        assert_eq!(sch.length("name"), Some(20));
        assert!(sch.has_field("age"));
        assert!(!sch.has_field("salary"));
    }

    #[test]
    fn test_add_all_copies_definitions() {
        let mut src = Schema::new();
        src.add_int_field("a");
        src.add_string_field("b", 9);

        let mut dst = Schema::new();
        dst.add_all(&src);
        assert_eq!(dst.fields(), src.fields());
        assert_eq!(dst.length("b"), Some(9));
    }

    #[test]
    fn test_field_type_display() {
        assert_eq!(FieldType::Integer.to_string(), "INT");
        assert_eq!(FieldType::Varchar.to_string(), "VARCHAR");
    }
}
