use std::ops::RangeInclusive;

pub trait GetBit {
    #[must_use]
    fn bit(self, i: u8) -> bool;

    #[must_use]
    fn bits(self, range: RangeInclusive<u8>) -> Self;
}

macro_rules! impl_get_bit {
    ($t:ty) => {
        impl GetBit for $t {
            #[inline]
            fn bit(self, i: u8) -> bool {
                debug_assert!(i < (<$t>::BITS as u8));
                self & (1 << i) != 0
            }

            #[inline]
            fn bits(self, range: RangeInclusive<u8>) -> Self {
                let start = *range.start();
                let end = *range.end();
                debug_assert!(start <= end && end < (<$t>::BITS as u8));

                let width = u32::from(end - start + 1);
                let mask = if width == <$t>::BITS { <$t>::MAX } else { (1 << width) - 1 };
                (self >> start) & mask
            }
        }
    };
}

impl_get_bit!(u8);
impl_get_bit!(u16);
impl_get_bit!(u32);
impl_get_bit!(usize);

pub trait U16Ext {
    fn lsb(self) -> u8;

    fn msb(self) -> u8;

    fn set_lsb(&mut self, value: u8);

    fn set_msb(&mut self, value: u8);
}

impl U16Ext for u16 {
    #[inline(always)]
    fn lsb(self) -> u8 {
        self as u8
    }

    #[inline(always)]
    fn msb(self) -> u8 {
        (self >> 8) as u8
    }

    #[inline(always)]
    fn set_lsb(&mut self, value: u8) {
        *self = (*self & 0xFF00) | u16::from(value);
    }

    #[inline(always)]
    fn set_msb(&mut self, value: u8) {
        *self = (*self & 0x00FF) | (u16::from(value) << 8);
    }
}

/// Interpret the lowest `bits` bits of `value` as a two's complement signed integer.
#[inline]
#[must_use]
pub fn sign_extend(value: u32, bits: u8) -> i32 {
    debug_assert!(bits > 0 && bits <= 32);

    let shift = 32 - u32::from(bits);
    ((value << shift) as i32) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn bit_ranges() {
        let bgcnt: u16 = 0b1101_1111_0100_0110;
        assert_eq!(bgcnt.bits(0..=1), 2);
        assert_eq!(bgcnt.bits(2..=3), 1);
        assert!(bgcnt.bit(6));
        assert!(!bgcnt.bit(7));
        assert_eq!(bgcnt.bits(8..=12), 0x1F);
        assert_eq!(bgcnt.bits(14..=15), 3);
        assert_eq!(bgcnt.bits(0..=15), bgcnt);
    }

    #[test]
    fn halfword_bytes() {
        let mut value = 0x1234_u16;
        value.set_lsb(0xCD);
        assert_eq!(value, 0x12CD);
        value.set_msb(0xAB);
        assert_eq!(value, 0xABCD);
        assert_eq!((value.msb(), value.lsb()), (0xAB, 0xCD));
    }

    #[test]
    fn sign_extension() {
        assert_eq!(sign_extend(0x0FFF_FFFF, 28), -1);
        assert_eq!(sign_extend(0x0800_0000, 28), -(1 << 27));
        assert_eq!(sign_extend(0x07FF_FFFF, 28), (1 << 27) - 1);
        assert_eq!(sign_extend(0xFF00, 16), -256);
        assert_eq!(sign_extend(0x0100, 16), 256);
    }
}
