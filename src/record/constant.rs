use std::cmp::Ordering;
use std::fmt;

use crate::common::{DbError, DbResult};

/// A typed value stored in the database: an INT or a VARCHAR.
/// Equality and hashing discriminate on the tag; ordering is only defined
/// within a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Int(i32),
    Str(String),
}

impl Constant {
    pub fn as_int(&self) -> DbResult<i32> {
        match self {
            Constant::Int(val) => Ok(*val),
            Constant::Str(_) => Err(DbError::InvalidArgument(
                "constant is not an integer".to_string(),
            )),
        }
    }

    pub fn as_str(&self) -> DbResult<&str> {
        match self {
            Constant::Str(val) => Ok(val),
            Constant::Int(_) => Err(DbError::InvalidArgument(
                "constant is not a string".to_string(),
            )),
        }
    }

    /// Compares two constants of the same tag; mixing tags is an error.
    pub fn compare(&self, other: &Constant) -> DbResult<Ordering> {
        match (self, other) {
            (Constant::Int(a), Constant::Int(b)) => Ok(a.cmp(b)),
            (Constant::Str(a), Constant::Str(b)) => Ok(a.cmp(b)),
            _ => Err(DbError::InvalidArgument(
                "cannot compare INT with VARCHAR".to_string(),
            )),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(val) => write!(f, "{}", val),
            Constant::Str(val) => write!(f, "'{}'", val),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_accessors_are_checked() {
        assert_eq!(Constant::Int(5).as_int().unwrap(), 5);
        assert_eq!(Constant::Str("a".to_string()).as_str().unwrap(), "a");
        assert!(Constant::Int(5).as_str().is_err());
        assert!(Constant::Str("a".to_string()).as_int().is_err());
    }

    #[test]
    fn test_compare_within_a_tag() {
        assert_eq!(
            Constant::Int(1).compare(&Constant::Int(2)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            Constant::Str("b".to_string())
                .compare(&Constant::Str("a".to_string()))
                .unwrap(),
            Ordering::Greater
        );
        assert!(Constant::Int(1).compare(&Constant::Str("1".to_string())).is_err());
    }

    #[test]
    fn test_hash_discriminates_tags() {
        let mut set = HashSet::new();
        set.insert(Constant::Int(1));
        set.insert(Constant::Str("1".to_string()));
        assert_eq!(set.len(), 2);
    }
}
