//! Immediate block copies and fills standing in for DMA transfers
//!
//! Transfers complete synchronously; the channel number is accepted for call compatibility and
//! otherwise ignored. Both ends of a transfer are validated before any byte moves, so a transfer
//! that would run past the end of a region panics without modifying anything.


use crate::hardware::{BusTarget, Hardware};

/// Where a DMA copy reads from.
#[derive(Debug, Clone, Copy)]
pub enum DmaSource<'a> {
    /// Bytes in host memory, e.g. graphics data compiled into the game
    Host(&'a [u8]),
    /// A PPU bus address
    Bus(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitSize {
    Halfword,
    Word,
}

impl UnitSize {
    fn bytes(self) -> usize {
        match self {
            Self::Halfword => 2,
            Self::Word => 4,
        }
    }

    fn align(self, address: u32) -> u32 {
        match self {
            Self::Halfword => address & !1,
            Self::Word => address & !3,
        }
    }
}

impl Hardware {
    /// Copy `halfwords` 16-bit units from `src` to the bus address `dst`.
    ///
    /// # Panics
    ///
    /// Panics if either end of the transfer is out of bounds.
    #[track_caller]
    pub fn dma_copy16(&mut self, channel: u32, src: DmaSource<'_>, dst: u32, halfwords: usize) {
        log::trace!("DMA{channel} copy16: {halfwords} halfwords to {dst:08X}");
        self.dma_copy(src, dst, halfwords, UnitSize::Halfword);
    }

    /// Copy `words` 32-bit units from `src` to the bus address `dst`.
    ///
    /// # Panics
    ///
    /// Panics if either end of the transfer is out of bounds.
    #[track_caller]
    pub fn dma_copy32(&mut self, channel: u32, src: DmaSource<'_>, dst: u32, words: usize) {
        log::trace!("DMA{channel} copy32: {words} words to {dst:08X}");
        self.dma_copy(src, dst, words, UnitSize::Word);
    }

    /// Write `value` to `halfwords` consecutive 16-bit units starting at `dst`.
    ///
    /// # Panics
    ///
    /// Panics if the destination span is out of bounds.
    #[track_caller]
    pub fn dma_fill16(&mut self, channel: u32, value: u16, dst: u32, halfwords: usize) {
        log::trace!("DMA{channel} fill16: {value:04X} x {halfwords} at {dst:08X}");

        let bytes: Vec<u8> = value.to_le_bytes().repeat(halfwords);
        self.write_span(UnitSize::Halfword.align(dst), &bytes);
    }

    /// Write `value` to `words` consecutive 32-bit units starting at `dst`.
    ///
    /// # Panics
    ///
    /// Panics if the destination span is out of bounds.
    #[track_caller]
    pub fn dma_fill32(&mut self, channel: u32, value: u32, dst: u32, words: usize) {
        log::trace!("DMA{channel} fill32: {value:08X} x {words} at {dst:08X}");

        let bytes: Vec<u8> = value.to_le_bytes().repeat(words);
        self.write_span(UnitSize::Word.align(dst), &bytes);
    }

    #[track_caller]
    fn dma_copy(&mut self, src: DmaSource<'_>, dst: u32, units: usize, unit: UnitSize) {
        let len = units * unit.bytes();
        if len == 0 {
            return;
        }

        let bytes = match src {
            DmaSource::Host(host) => {
                assert!(
                    host.len() >= len,
                    "DMA source slice too short: {len:#X} bytes requested, {:#X} available",
                    host.len()
                );
                host[..len].to_vec()
            }
            DmaSource::Bus(address) => self.read_span(unit.align(address), len),
        };

        self.write_span(unit.align(dst), &bytes);
    }

    #[track_caller]
    fn read_span(&self, address: u32, len: usize) -> Vec<u8> {
        match BusTarget::decode_span(address, len) {
            BusTarget::Memory(region, offset) => {
                self.memory.region(region)[offset..offset + len].to_vec()
            }
            BusTarget::Io(offset) => (0..len as u32)
                .step_by(2)
                .flat_map(|i| self.registers.read_register(offset + i).to_le_bytes())
                .take(len)
                .collect(),
        }
    }

    #[track_caller]
    fn write_span(&mut self, address: u32, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        match BusTarget::decode_span(address, bytes.len()) {
            BusTarget::Memory(region, offset) => self.memory.write_bytes(region, offset, bytes),
            BusTarget::Io(offset) => {
                // Register destinations go through the register file one halfword at a time
                for (i, chunk) in bytes.chunks(2).enumerate() {
                    let register = offset + 2 * i as u32;
                    match *chunk {
                        [lsb, msb] => {
                            self.registers.write_register(register, u16::from_le_bytes([lsb, msb]));
                        }
                        [lsb] => self.registers.write_register_byte(register, lsb),
                        _ => unreachable!("chunks(2) yields 1 or 2 bytes"),
                    }
                }
            }
        }
    }
}
