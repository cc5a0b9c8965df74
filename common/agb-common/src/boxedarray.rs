//! Heap-allocated fixed-length byte arrays with a `bincode::Decode` implementation that reads
//! directly into heap memory.
//!
//! `#[derive(Decode)]` on `Box<[u8; LEN]>` decodes onto the stack and then moves the array, which
//! overflows the stack for VRAM-sized arrays in debug builds.

use bincode::de::read::Reader;
use bincode::de::{BorrowDecoder, Decoder};
use bincode::error::DecodeError;
use bincode::{BorrowDecode, Decode, Encode};
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, PartialEq, Eq, Encode)]
pub struct BoxedByteArray<const LEN: usize>(Box<[u8; LEN]>);

#[allow(clippy::missing_panics_doc)]
fn zeroed<const LEN: usize>() -> Box<[u8; LEN]> {
    // Length always matches LEN
    vec![0; LEN].into_boxed_slice().try_into().unwrap()
}

impl<const LEN: usize> BoxedByteArray<LEN> {
    #[must_use]
    pub fn new() -> Self {
        Self(zeroed())
    }
}

impl<const LEN: usize> Default for BoxedByteArray<LEN> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const LEN: usize> Deref for BoxedByteArray<LEN> {
    type Target = [u8; LEN];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const LEN: usize> DerefMut for BoxedByteArray<LEN> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const LEN: usize, Context> Decode<Context> for BoxedByteArray<LEN> {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let mut array = zeroed::<LEN>();
        decoder.reader().read(array.as_mut())?;
        Ok(Self(array))
    }
}

impl<'de, const LEN: usize, Context> BorrowDecode<'de, Context> for BoxedByteArray<LEN> {
    fn borrow_decode<D: BorrowDecoder<'de, Context = Context>>(
        decoder: &mut D,
    ) -> Result<Self, DecodeError> {
        let mut array = zeroed::<LEN>();
        decoder.reader().read(array.as_mut())?;
        Ok(Self(array))
    }
}
