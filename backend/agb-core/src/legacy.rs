//! Compatibility surface for game code written against fixed hardware addresses
//!
//! Register names and memory bases match the console's documented layout. Everything here
//! resolves through a [`Hardware`] handle; nothing in this module holds state of its own.

#[cfg(test)]
mod tests;

use crate::dma::DmaSource;
use crate::hardware::{self, Hardware};

pub const REG_BASE: u32 = hardware::IO_BASE;
pub const PLTT: u32 = hardware::PALETTE_BASE;
pub const BG_PLTT: u32 = PLTT;
pub const OBJ_PLTT: u32 = PLTT + hardware::OBJ_PALETTE_BUS_OFFSET;
pub const VRAM: u32 = hardware::VRAM_BASE;
pub const OAM: u32 = hardware::OAM_BASE;

/// I/O register offsets from [`REG_BASE`]
pub mod offsets {
    pub const DISPCNT: u32 = 0x000;
    pub const DISPSTAT: u32 = 0x004;
    pub const VCOUNT: u32 = 0x006;
    pub const BG0CNT: u32 = 0x008;
    pub const BG1CNT: u32 = 0x00A;
    pub const BG2CNT: u32 = 0x00C;
    pub const BG3CNT: u32 = 0x00E;
    pub const BG0HOFS: u32 = 0x010;
    pub const BG0VOFS: u32 = 0x012;
    pub const BG1HOFS: u32 = 0x014;
    pub const BG1VOFS: u32 = 0x016;
    pub const BG2HOFS: u32 = 0x018;
    pub const BG2VOFS: u32 = 0x01A;
    pub const BG3HOFS: u32 = 0x01C;
    pub const BG3VOFS: u32 = 0x01E;
    pub const BG2PA: u32 = 0x020;
    pub const BG2PB: u32 = 0x022;
    pub const BG2PC: u32 = 0x024;
    pub const BG2PD: u32 = 0x026;
    pub const BG2X: u32 = 0x028;
    pub const BG2Y: u32 = 0x02C;
    pub const BG3PA: u32 = 0x030;
    pub const BG3PB: u32 = 0x032;
    pub const BG3PC: u32 = 0x034;
    pub const BG3PD: u32 = 0x036;
    pub const BG3X: u32 = 0x038;
    pub const BG3Y: u32 = 0x03C;
    pub const WIN0H: u32 = 0x040;
    pub const WIN1H: u32 = 0x042;
    pub const WIN0V: u32 = 0x044;
    pub const WIN1V: u32 = 0x046;
    pub const WININ: u32 = 0x048;
    pub const WINOUT: u32 = 0x04A;
    pub const MOSAIC: u32 = 0x04C;
    pub const BLDCNT: u32 = 0x050;
    pub const BLDALPHA: u32 = 0x052;
    pub const BLDY: u32 = 0x054;

    #[must_use]
    pub const fn bgcnt(bg: u32) -> u32 {
        BG0CNT + 2 * bg
    }

    #[must_use]
    pub const fn bghofs(bg: u32) -> u32 {
        BG0HOFS + 4 * bg
    }

    #[must_use]
    pub const fn bgvofs(bg: u32) -> u32 {
        BG0VOFS + 4 * bg
    }
}

#[must_use]
pub const fn reg_addr(offset: u32) -> u32 {
    REG_BASE + offset
}

/// DMA channel used by the `dma3_*` helpers
pub const DMA3: u32 = 3;

/// Register-offset access for legacy call sites, closing over one [`Hardware`].
#[derive(Debug)]
pub struct IoRedirect<'a> {
    hardware: &'a mut Hardware,
}

impl<'a> IoRedirect<'a> {
    #[must_use]
    pub fn new(hardware: &'a mut Hardware) -> Self {
        Self { hardware }
    }

    #[must_use]
    pub fn read16(&self, offset: u32) -> u16 {
        self.hardware.registers.read_register(offset)
    }

    pub fn write16(&mut self, offset: u32, value: u16) {
        self.hardware.registers.write_register(offset, value);
    }

    /// 32-bit registers (BGxX/BGxY) and register pairs written with one store
    pub fn write32(&mut self, offset: u32, value: u32) {
        self.hardware.write_u32(reg_addr(offset), value);
    }

    pub fn write8(&mut self, offset: u32, value: u8) {
        self.hardware.registers.write_register_byte(offset, value);
    }

    /// Read-modify-write, as `REG_X |= bits` and friends compile to.
    pub fn modify16(&mut self, offset: u32, f: impl FnOnce(u16) -> u16) {
        let value = f(self.read16(offset));
        self.write16(offset, value);
    }

    pub fn set_bits16(&mut self, offset: u32, bits: u16) {
        self.modify16(offset, |value| value | bits);
    }

    pub fn clear_bits16(&mut self, offset: u32, bits: u16) {
        self.modify16(offset, |value| value & !bits);
    }

    /// `DMA3COPY(src, dst, count)`: copy `halfwords` 16-bit units.
    #[track_caller]
    pub fn dma3_copy(&mut self, src: &[u8], dst: u32, halfwords: usize) {
        self.hardware.dma_copy16(DMA3, DmaSource::Host(src), dst, halfwords);
    }

    /// `DMA3FILL(value, dst, count)`: fill `halfwords` 16-bit units.
    #[track_caller]
    pub fn dma3_fill(&mut self, value: u16, dst: u32, halfwords: usize) {
        self.hardware.dma_fill16(DMA3, value, dst, halfwords);
    }

    /// Write a BGR555 color to BG palette entry `index`.
    #[track_caller]
    pub fn set_bg_color(&mut self, index: u32, color: u16) {
        self.hardware.write_u16(BG_PLTT + 2 * index, color);
    }

    /// Write a BGR555 color to OBJ palette entry `index`.
    #[track_caller]
    pub fn set_obj_color(&mut self, index: u32, color: u16) {
        self.hardware.write_u16(OBJ_PLTT + 2 * index, color);
    }
}

impl Hardware {
    #[must_use]
    pub fn io(&mut self) -> IoRedirect<'_> {
        IoRedirect::new(self)
    }
}
