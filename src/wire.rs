//! Wire adapter for scalar values appended to transmission buffers.
//!
//! Channel Access encodes every scalar in network (big-endian) order. The
//! [`WireEncode`] trait fixes the encoded width of a type at compile time so
//! buffers can decide whether an element fits before writing any of it.

use bytes::BufMut;

/// A value with a fixed-width, big-endian wire encoding.
pub trait WireEncode {
    /// Number of bytes the encoded value occupies on the wire.
    const WIRE_SIZE: usize;

    /// Append the encoded value to `dst`.
    ///
    /// Implementations must write exactly [`Self::WIRE_SIZE`] bytes.
    fn put_wire<B: BufMut>(&self, dst: &mut B);
}

macro_rules! impl_wire_encode {
    ($($ty:ty => $put:ident),* $(,)?) => {
        $(
            impl WireEncode for $ty {
                const WIRE_SIZE: usize = size_of::<$ty>();

                #[inline]
                fn put_wire<B: BufMut>(&self, dst: &mut B) { dst.$put(*self); }
            }
        )*
    };
}

impl_wire_encode! {
    u8 => put_u8,
    i8 => put_i8,
    u16 => put_u16,
    i16 => put_i16,
    u32 => put_u32,
    i32 => put_i32,
    f32 => put_f32,
    f64 => put_f64,
}
