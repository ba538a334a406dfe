//! Database request (`DBR_*`) type codes and the outbound dispatch table.
//!
//! Every payload-carrying request names the element type of its payload with
//! a small integer code. Only a subset of the 39 codes can be sent by a
//! client; [`copy_kind`] maps a code to the element category used to
//! serialize it, or `None` when the code is not writable.

mod payload;
mod string;

pub use payload::{ElementKind, Payload};
pub use string::{DbrError, DbrString, MAX_STRING_SIZE};

/// Number of defined type codes; valid codes are `0..DBR_TYPE_COUNT`.
pub const DBR_TYPE_COUNT: usize = 39;

/// Fixed-width string value.
pub const DBR_STRING: u16 = 0;
/// Signed 16-bit integer value.
pub const DBR_SHORT: u16 = 1;
/// Alias of [`DBR_SHORT`].
pub const DBR_INT: u16 = DBR_SHORT;
/// 32-bit float value.
pub const DBR_FLOAT: u16 = 2;
/// Enumerated value index.
pub const DBR_ENUM: u16 = 3;
/// Unsigned 8-bit value.
pub const DBR_CHAR: u16 = 4;
/// Signed 32-bit integer value.
pub const DBR_LONG: u16 = 5;
/// 64-bit float value.
pub const DBR_DOUBLE: u16 = 6;
/// String value with alarm status.
pub const DBR_STS_STRING: u16 = 7;
/// String value with timestamp.
pub const DBR_TIME_STRING: u16 = 14;
/// String value with graphic limits.
pub const DBR_GR_STRING: u16 = 21;
/// String value with control limits.
pub const DBR_CTRL_STRING: u16 = 28;
/// Double value with control limits.
pub const DBR_CTRL_DOUBLE: u16 = 34;
/// Alarm acknowledge transient setting.
pub const DBR_PUT_ACKT: u16 = 35;
/// Alarm acknowledge severity.
pub const DBR_PUT_ACKS: u16 = 36;
/// String value with status and acknowledge fields.
pub const DBR_STSACK_STRING: u16 = 37;
/// Record class name.
pub const DBR_CLASS_NAME: u16 = 38;

const TYPE_NAMES: [&str; DBR_TYPE_COUNT] = [
    "DBR_STRING",
    "DBR_SHORT",
    "DBR_FLOAT",
    "DBR_ENUM",
    "DBR_CHAR",
    "DBR_LONG",
    "DBR_DOUBLE",
    "DBR_STS_STRING",
    "DBR_STS_SHORT",
    "DBR_STS_FLOAT",
    "DBR_STS_ENUM",
    "DBR_STS_CHAR",
    "DBR_STS_LONG",
    "DBR_STS_DOUBLE",
    "DBR_TIME_STRING",
    "DBR_TIME_SHORT",
    "DBR_TIME_FLOAT",
    "DBR_TIME_ENUM",
    "DBR_TIME_CHAR",
    "DBR_TIME_LONG",
    "DBR_TIME_DOUBLE",
    "DBR_GR_STRING",
    "DBR_GR_SHORT",
    "DBR_GR_FLOAT",
    "DBR_GR_ENUM",
    "DBR_GR_CHAR",
    "DBR_GR_LONG",
    "DBR_GR_DOUBLE",
    "DBR_CTRL_STRING",
    "DBR_CTRL_SHORT",
    "DBR_CTRL_FLOAT",
    "DBR_CTRL_ENUM",
    "DBR_CTRL_CHAR",
    "DBR_CTRL_LONG",
    "DBR_CTRL_DOUBLE",
    "DBR_PUT_ACKT",
    "DBR_PUT_ACKS",
    "DBR_STSACK_STRING",
    "DBR_CLASS_NAME",
];

// Only plain value types and the two alarm-acknowledge types are writable.
const COPY_TABLE: [Option<ElementKind>; DBR_TYPE_COUNT] = [
    Some(ElementKind::String), // DBR_STRING
    Some(ElementKind::Short),  // DBR_SHORT
    Some(ElementKind::Float),  // DBR_FLOAT
    Some(ElementKind::Enum),   // DBR_ENUM
    Some(ElementKind::Char),   // DBR_CHAR
    Some(ElementKind::Long),   // DBR_LONG
    Some(ElementKind::Double), // DBR_DOUBLE
    None,                      // DBR_STS_STRING
    None,                      // DBR_STS_SHORT
    None,                      // DBR_STS_FLOAT
    None,                      // DBR_STS_ENUM
    None,                      // DBR_STS_CHAR
    None,                      // DBR_STS_LONG
    None,                      // DBR_STS_DOUBLE
    None,                      // DBR_TIME_STRING
    None,                      // DBR_TIME_SHORT
    None,                      // DBR_TIME_FLOAT
    None,                      // DBR_TIME_ENUM
    None,                      // DBR_TIME_CHAR
    None,                      // DBR_TIME_LONG
    None,                      // DBR_TIME_DOUBLE
    None,                      // DBR_GR_STRING
    None,                      // DBR_GR_SHORT
    None,                      // DBR_GR_FLOAT
    None,                      // DBR_GR_ENUM
    None,                      // DBR_GR_CHAR
    None,                      // DBR_GR_LONG
    None,                      // DBR_GR_DOUBLE
    None,                      // DBR_CTRL_STRING
    None,                      // DBR_CTRL_SHORT
    None,                      // DBR_CTRL_FLOAT
    None,                      // DBR_CTRL_ENUM
    None,                      // DBR_CTRL_CHAR
    None,                      // DBR_CTRL_LONG
    None,                      // DBR_CTRL_DOUBLE
    Some(ElementKind::Enum),   // DBR_PUT_ACKT
    Some(ElementKind::Enum),   // DBR_PUT_ACKS
    None,                      // DBR_STSACK_STRING
    None,                      // DBR_CLASS_NAME
];

/// Element category used to serialize payloads of type `code`.
///
/// Returns `None` for codes outside the table and for codes a client cannot
/// send.
#[must_use]
pub fn copy_kind(code: u16) -> Option<ElementKind> {
    COPY_TABLE.get(usize::from(code)).copied().flatten()
}

/// Whether payloads of type `code` can be serialized for transmission.
#[must_use]
pub fn dbr_type_ok(code: u16) -> bool { copy_kind(code).is_some() }

/// Protocol name of a type code, for diagnostics.
#[must_use]
pub fn type_name(code: u16) -> Option<&'static str> {
    TYPE_NAMES.get(usize::from(code)).copied()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(DBR_STRING, ElementKind::String)]
    #[case(DBR_SHORT, ElementKind::Short)]
    #[case(DBR_FLOAT, ElementKind::Float)]
    #[case(DBR_ENUM, ElementKind::Enum)]
    #[case(DBR_CHAR, ElementKind::Char)]
    #[case(DBR_LONG, ElementKind::Long)]
    #[case(DBR_DOUBLE, ElementKind::Double)]
    #[case(DBR_PUT_ACKT, ElementKind::Enum)]
    #[case(DBR_PUT_ACKS, ElementKind::Enum)]
    fn writable_types_map_to_categories(#[case] code: u16, #[case] kind: ElementKind) {
        assert_eq!(copy_kind(code), Some(kind));
        assert!(dbr_type_ok(code));
    }

    #[rstest]
    #[case(DBR_STS_STRING)]
    #[case(DBR_TIME_STRING)]
    #[case(DBR_GR_STRING)]
    #[case(DBR_CTRL_DOUBLE)]
    #[case(DBR_STSACK_STRING)]
    #[case(DBR_CLASS_NAME)]
    fn metadata_types_are_absent(#[case] code: u16) {
        assert!(!dbr_type_ok(code));
    }

    #[rstest]
    #[case(39)]
    #[case(40)]
    #[case(u16::MAX)]
    fn codes_past_the_table_are_rejected(#[case] code: u16) {
        assert!(!dbr_type_ok(code));
        assert_eq!(type_name(code), None);
    }

    #[rstest]
    fn names_cover_the_whole_table() {
        assert_eq!(type_name(DBR_STRING), Some("DBR_STRING"));
        assert_eq!(type_name(DBR_PUT_ACKS), Some("DBR_PUT_ACKS"));
        assert_eq!(type_name(DBR_CLASS_NAME), Some("DBR_CLASS_NAME"));
        assert_eq!(COPY_TABLE.iter().flatten().count(), 9);
    }
}
