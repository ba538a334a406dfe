//! Typed payload views handed to the send queue.

use std::fmt;

use super::string::{DbrString, MAX_STRING_SIZE};

/// Primitive element category a writable type code serializes as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Fixed 40-byte strings.
    String,
    /// Signed 16-bit integers.
    Short,
    /// 32-bit floats.
    Float,
    /// Unsigned 16-bit enumeration indices.
    Enum,
    /// Unsigned 8-bit values.
    Char,
    /// Signed 32-bit integers.
    Long,
    /// 64-bit floats.
    Double,
}

impl ElementKind {
    /// Encoded size of one element in bytes.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "string field width is a small constant"
    )]
    pub const fn wire_size(self) -> u32 {
        match self {
            Self::String => MAX_STRING_SIZE as u32,
            Self::Short | Self::Enum => 2,
            Self::Float | Self::Long => 4,
            Self::Char => 1,
            Self::Double => 8,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Short => "short",
            Self::Float => "float",
            Self::Enum => "enum",
            Self::Char => "char",
            Self::Long => "long",
            Self::Double => "double",
        })
    }
}

/// Borrowed array of native values to serialize as a request payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload<'a> {
    /// String elements.
    String(&'a [DbrString]),
    /// Signed 16-bit elements.
    Short(&'a [i16]),
    /// 32-bit float elements.
    Float(&'a [f32]),
    /// Enumeration index elements.
    Enum(&'a [u16]),
    /// Byte elements.
    Char(&'a [u8]),
    /// Signed 32-bit elements.
    Long(&'a [i32]),
    /// 64-bit float elements.
    Double(&'a [f64]),
}

impl Payload<'_> {
    /// Category of the borrowed elements.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::String(_) => ElementKind::String,
            Self::Short(_) => ElementKind::Short,
            Self::Float(_) => ElementKind::Float,
            Self::Enum(_) => ElementKind::Enum,
            Self::Char(_) => ElementKind::Char,
            Self::Long(_) => ElementKind::Long,
            Self::Double(_) => ElementKind::Double,
        }
    }

    /// Number of borrowed elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::String(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Enum(v) => v.len(),
            Self::Char(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }

    /// Whether the view holds no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool { self.len() == 0 }
}

macro_rules! payload_from_slice {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<'a> From<&'a [$ty]> for Payload<'a> {
                fn from(values: &'a [$ty]) -> Self { Self::$variant(values) }
            }
        )*
    };
}

payload_from_slice! {
    DbrString => String,
    i16 => Short,
    f32 => Float,
    u16 => Enum,
    u8 => Char,
    i32 => Long,
    f64 => Double,
}
