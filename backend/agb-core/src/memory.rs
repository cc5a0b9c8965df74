//! Byte storage standing in for the console's VRAM, OAM, and palette RAM


use agb_common::boxedarray::BoxedByteArray;
use bincode::{Decode, Encode};
use std::fmt::{Display, Formatter};
use std::ops::Range;

pub const VRAM_LEN: usize = 96 * 1024;
pub const OAM_LEN: usize = 1024;
pub const BG_PALETTE_LEN: usize = 1024;
pub const OBJ_PALETTE_LEN: usize = 512;

pub type Vram = BoxedByteArray<VRAM_LEN>;
pub type Oam = BoxedByteArray<OAM_LEN>;
pub type BgPalette = BoxedByteArray<BG_PALETTE_LEN>;
pub type ObjPalette = BoxedByteArray<OBJ_PALETTE_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Vram,
    Oam,
    BgPalette,
    ObjPalette,
}

impl Region {
    pub const ALL: [Self; 4] = [Self::Vram, Self::Oam, Self::BgPalette, Self::ObjPalette];

    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            Self::Vram => VRAM_LEN,
            Self::Oam => OAM_LEN,
            Self::BgPalette => BG_PALETTE_LEN,
            Self::ObjPalette => OBJ_PALETTE_LEN,
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vram => write!(f, "VRAM"),
            Self::Oam => write!(f, "OAM"),
            Self::BgPalette => write!(f, "BG palette RAM"),
            Self::ObjPalette => write!(f, "OBJ palette RAM"),
        }
    }
}

/// The four PPU memories. Sizes are fixed at construction.
///
/// Every accessor bounds-checks against the region it targets and panics on an out-of-bounds
/// access; a write never spills into a neighboring region.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MemoryMirror {
    vram: Vram,
    oam: Oam,
    bg_palette: BgPalette,
    obj_palette: ObjPalette,
}

impl MemoryMirror {
    #[must_use]
    pub fn new() -> Self {
        Self {
            vram: Vram::new(),
            oam: Oam::new(),
            bg_palette: BgPalette::new(),
            obj_palette: ObjPalette::new(),
        }
    }

    #[must_use]
    pub fn vram(&self) -> &[u8; VRAM_LEN] {
        &self.vram
    }

    #[must_use]
    pub fn oam(&self) -> &[u8; OAM_LEN] {
        &self.oam
    }

    #[must_use]
    pub fn bg_palette(&self) -> &[u8; BG_PALETTE_LEN] {
        &self.bg_palette
    }

    #[must_use]
    pub fn obj_palette(&self) -> &[u8; OBJ_PALETTE_LEN] {
        &self.obj_palette
    }

    #[must_use]
    pub fn region(&self, region: Region) -> &[u8] {
        match region {
            Region::Vram => self.vram.as_slice(),
            Region::Oam => self.oam.as_slice(),
            Region::BgPalette => self.bg_palette.as_slice(),
            Region::ObjPalette => self.obj_palette.as_slice(),
        }
    }

    fn region_mut(&mut self, region: Region) -> &mut [u8] {
        match region {
            Region::Vram => self.vram.as_mut_slice(),
            Region::Oam => self.oam.as_mut_slice(),
            Region::BgPalette => self.bg_palette.as_mut_slice(),
            Region::ObjPalette => self.obj_palette.as_mut_slice(),
        }
    }

    #[must_use]
    #[track_caller]
    pub fn read_u8(&self, region: Region, offset: usize) -> u8 {
        self.region(region)[checked_range(region, offset, 1)][0]
    }

    #[must_use]
    #[track_caller]
    pub fn read_u16(&self, region: Region, offset: usize) -> u16 {
        let bytes = &self.region(region)[checked_range(region, offset, 2)];
        u16::from_le_bytes([bytes[0], bytes[1]])
    }

    #[must_use]
    #[track_caller]
    pub fn read_u32(&self, region: Region, offset: usize) -> u32 {
        let bytes = &self.region(region)[checked_range(region, offset, 4)];
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[track_caller]
    pub fn write_u8(&mut self, region: Region, offset: usize, value: u8) {
        self.write_bytes(region, offset, &[value]);
    }

    #[track_caller]
    pub fn write_u16(&mut self, region: Region, offset: usize, value: u16) {
        self.write_bytes(region, offset, &value.to_le_bytes());
    }

    #[track_caller]
    pub fn write_u32(&mut self, region: Region, offset: usize, value: u32) {
        self.write_bytes(region, offset, &value.to_le_bytes());
    }

    #[track_caller]
    pub fn write_bytes(&mut self, region: Region, offset: usize, bytes: &[u8]) {
        let range = checked_range(region, offset, bytes.len());
        self.region_mut(region)[range].copy_from_slice(bytes);
    }

    #[track_caller]
    pub fn fill(&mut self, region: Region, offset: usize, len: usize, value: u8) {
        let range = checked_range(region, offset, len);
        self.region_mut(region)[range].fill(value);
    }

    /// Write a BGR555 color to a palette entry.
    #[track_caller]
    pub fn write_palette_color(&mut self, region: Region, index: usize, color: u16) {
        self.write_u16(region, 2 * index, color);
    }

    pub fn clear(&mut self) {
        for region in Region::ALL {
            self.region_mut(region).fill(0);
        }
    }
}

impl Default for MemoryMirror {
    fn default() -> Self {
        Self::new()
    }
}

#[track_caller]
fn checked_range(region: Region, offset: usize, len: usize) -> Range<usize> {
    match offset.checked_add(len) {
        Some(end) if end <= region.len() => offset..end,
        _ => panic!(
            "Out-of-bounds {region} access: offset {offset:#X} length {len:#X} exceeds size {:#X}",
            region.len()
        ),
    }
}
