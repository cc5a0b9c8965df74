//! The emulated PPU's address space: memories plus registers behind the console's bus addresses


use crate::memory::{MemoryMirror, Region, VRAM_LEN};
use crate::registers::RegisterFile;
use bincode::{Decode, Encode};

pub const IO_BASE: u32 = 0x0400_0000;
pub const PALETTE_BASE: u32 = 0x0500_0000;
pub const VRAM_BASE: u32 = 0x0600_0000;
pub const OAM_BASE: u32 = 0x0700_0000;

/// OBJ palette RAM starts 512 bytes into the palette address range
pub const OBJ_PALETTE_BUS_OFFSET: u32 = 0x200;

const IO_LEN: u32 = 0x400;
const PALETTE_BUS_LEN: u32 = 0x400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BusTarget {
    Io(u32),
    Memory(Region, usize),
}

impl BusTarget {
    fn decode(address: u32) -> Option<Self> {
        let offset = address & 0x00FF_FFFF;
        match address >> 24 {
            0x04 if offset < IO_LEN => Some(Self::Io(offset)),
            0x05 if offset < OBJ_PALETTE_BUS_OFFSET => {
                Some(Self::Memory(Region::BgPalette, offset as usize))
            }
            0x05 if offset < PALETTE_BUS_LEN => {
                Some(Self::Memory(Region::ObjPalette, (offset - OBJ_PALETTE_BUS_OFFSET) as usize))
            }
            0x06 if (offset as usize) < VRAM_LEN => {
                Some(Self::Memory(Region::Vram, offset as usize))
            }
            0x07 if (offset as usize) < Region::Oam.len() => {
                Some(Self::Memory(Region::Oam, offset as usize))
            }
            _ => None,
        }
    }

    /// Decode a span of `len` bytes at `address`, which must lie entirely within one region.
    #[track_caller]
    pub(crate) fn decode_span(address: u32, len: usize) -> Self {
        let start = Self::decode(address);
        let last = u32::try_from(len.saturating_sub(1))
            .ok()
            .and_then(|last| address.checked_add(last))
            .and_then(Self::decode);

        match (start, last) {
            (Some(Self::Io(offset)), Some(Self::Io(_))) => Self::Io(offset),
            (Some(Self::Memory(region, offset)), Some(Self::Memory(last_region, _)))
                if region == last_region =>
            {
                Self::Memory(region, offset)
            }
            _ => panic!("Invalid bus access: {len:#X} bytes at {address:08X}"),
        }
    }
}

/// Emulated PPU state: memories and registers, owned by the caller and passed by reference to
/// everything that reads or writes hardware state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct Hardware {
    pub memory: MemoryMirror,
    pub registers: RegisterFile,
}

impl Hardware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    ///
    /// Panics if `address` is not a PPU memory or I/O address.
    #[must_use]
    #[track_caller]
    pub fn read_u8(&self, address: u32) -> u8 {
        match BusTarget::decode_span(address, 1) {
            BusTarget::Io(offset) => {
                let halfword = self.registers.read_register(offset & !1);
                if offset & 1 != 0 { (halfword >> 8) as u8 } else { halfword as u8 }
            }
            BusTarget::Memory(region, offset) => self.memory.read_u8(region, offset),
        }
    }

    /// # Panics
    ///
    /// Panics if `address` is not a PPU memory or I/O address.
    #[must_use]
    #[track_caller]
    pub fn read_u16(&self, address: u32) -> u16 {
        let address = address & !1;
        match BusTarget::decode_span(address, 2) {
            BusTarget::Io(offset) => self.registers.read_register(offset),
            BusTarget::Memory(region, offset) => self.memory.read_u16(region, offset),
        }
    }

    /// # Panics
    ///
    /// Panics if `address` is not a PPU memory or I/O address.
    #[must_use]
    #[track_caller]
    pub fn read_u32(&self, address: u32) -> u32 {
        let address = address & !3;
        match BusTarget::decode_span(address, 4) {
            BusTarget::Io(offset) => {
                let low = self.registers.read_register(offset);
                let high = self.registers.read_register(offset + 2);
                u32::from(low) | (u32::from(high) << 16)
            }
            BusTarget::Memory(region, offset) => self.memory.read_u32(region, offset),
        }
    }

    /// # Panics
    ///
    /// Panics if `address` is not a PPU memory or I/O address.
    #[track_caller]
    pub fn write_u8(&mut self, address: u32, value: u8) {
        match BusTarget::decode_span(address, 1) {
            BusTarget::Io(offset) => self.registers.write_register_byte(offset, value),
            BusTarget::Memory(region, offset) => self.memory.write_u8(region, offset, value),
        }
    }

    /// # Panics
    ///
    /// Panics if `address` is not a PPU memory or I/O address.
    #[track_caller]
    pub fn write_u16(&mut self, address: u32, value: u16) {
        let address = address & !1;
        match BusTarget::decode_span(address, 2) {
            BusTarget::Io(offset) => self.registers.write_register(offset, value),
            BusTarget::Memory(region, offset) => self.memory.write_u16(region, offset, value),
        }
    }

    /// # Panics
    ///
    /// Panics if `address` is not a PPU memory or I/O address.
    #[track_caller]
    pub fn write_u32(&mut self, address: u32, value: u32) {
        let address = address & !3;
        match BusTarget::decode_span(address, 4) {
            BusTarget::Io(offset) => {
                self.registers.write_register(offset, value as u16);
                self.registers.write_register(offset + 2, (value >> 16) as u16);
            }
            BusTarget::Memory(region, offset) => self.memory.write_u32(region, offset, value),
        }
    }
}
