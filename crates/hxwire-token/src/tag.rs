//! Tag alphabet.
//!
//! Every token starts with one of these bytes. Terminators and separators
//! share the same byte space but never appear in tag position.

/// `null`.
pub const NULL: u8 = b'n';
/// Boolean `true`.
pub const TRUE: u8 = b't';
/// Boolean `false`.
pub const FALSE: u8 = b'f';
/// Integer zero.
pub const ZERO: u8 = b'z';
/// Signed 32-bit integer, followed by a decimal digit run.
pub const INT: u8 = b'i';
/// Float, followed by a decimal or exponential literal.
pub const FLOAT: u8 = b'd';
/// NaN.
pub const NAN: u8 = b'k';
/// Negative infinity.
pub const NEG_INFINITY: u8 = b'm';
/// Positive infinity.
pub const POS_INFINITY: u8 = b'p';
/// Interned string: `y<len>:<percent-encoded>`.
pub const STRING: u8 = b'y';
/// Back-reference into the string cache.
pub const STRING_REF: u8 = b'R';
/// Byte buffer: `s<len>:<base64>`.
pub const BYTES: u8 = b's';
/// Array with run-length compressed nulls.
pub const ARRAY: u8 = b'a';
/// Run of `N` nulls inside an array.
pub const NULL_RUN: u8 = b'u';
/// List without null compression.
pub const LIST: u8 = b'l';
/// Anonymous object.
pub const OBJECT: u8 = b'o';
/// Named class instance walked field by field.
pub const CLASS: u8 = b'c';
/// Named class instance with a custom payload.
pub const CUSTOM: u8 = b'C';
/// String-keyed map.
pub const STRING_MAP: u8 = b'b';
/// Integer-keyed map.
pub const INT_MAP: u8 = b'q';
/// Identity-keyed map.
pub const OBJECT_MAP: u8 = b'M';
/// Date as epoch milliseconds.
pub const DATE: u8 = b'v';
/// Back-reference into the object cache.
pub const REF: u8 = b'r';
/// Exception wrapper.
pub const EXCEPTION: u8 = b'x';
/// Enum instance by constructor name (not implemented).
pub const ENUM_BY_NAME: u8 = b'w';
/// Enum instance by constructor index (not implemented).
pub const ENUM_BY_INDEX: u8 = b'j';
/// Class value (not implemented).
pub const CLASS_TYPE: u8 = b'A';
/// Enum value (not implemented).
pub const ENUM_TYPE: u8 = b'B';

/// Terminates arrays, lists and maps.
pub const LIST_END: u8 = b'h';
/// Terminates objects and class instances.
pub const OBJECT_END: u8 = b'g';
/// Separates a length from its payload, and introduces integer map keys.
pub const SEPARATOR: u8 = b':';

/// Returns a human-readable name for a tag byte.
pub fn tag_name(tag: u8) -> &'static str {
    match tag {
        NULL => "null",
        TRUE | FALSE => "bool",
        ZERO | INT => "int",
        FLOAT | NAN | NEG_INFINITY | POS_INFINITY => "float",
        STRING => "string",
        STRING_REF => "string-ref",
        BYTES => "bytes",
        ARRAY => "array",
        NULL_RUN => "null-run",
        LIST => "list",
        OBJECT => "object",
        CLASS => "class",
        CUSTOM => "custom",
        STRING_MAP => "string-map",
        INT_MAP => "int-map",
        OBJECT_MAP => "object-map",
        DATE => "date",
        REF => "ref",
        EXCEPTION => "exception",
        ENUM_BY_NAME | ENUM_BY_INDEX => "enum",
        CLASS_TYPE => "class-type",
        ENUM_TYPE => "enum-type",
        LIST_END => "list-end",
        OBJECT_END => "object-end",
        SEPARATOR => "separator",
        _ => "unknown",
    }
}

/// Returns true if the tag introduces a value reserved by the format but
/// rejected by this codec.
pub fn is_unimplemented(tag: u8) -> bool {
    matches!(tag, ENUM_BY_NAME | ENUM_BY_INDEX | CLASS_TYPE | ENUM_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_cover_value_tags() {
        assert_eq!(tag_name(b'y'), "string");
        assert_eq!(tag_name(b'M'), "object-map");
        assert_eq!(tag_name(b'h'), "list-end");
        assert_eq!(tag_name(b'#'), "unknown");
    }

    #[test]
    fn reflective_tags_are_unimplemented() {
        for tag in [b'w', b'j', b'A', b'B'] {
            assert!(is_unimplemented(tag));
        }
        assert!(!is_unimplemented(b'c'));
    }
}
