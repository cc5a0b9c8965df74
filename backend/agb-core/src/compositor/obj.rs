//! OBJ (sprite) decoding and per-line rendering

use crate::compositor::{DispatchParams, FrameMemory, read_byte, read_palette};
use crate::scene::{Mosaic, OBJ_AFFINE_SETS, ObjAffineSet};
use agb_common::num::GetBit;
use agb_config::ObjTileMapping;

pub const OAM_ENTRIES: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteMode {
    Normal,
    SemiTransparent,
    ObjWindow,
    Invalid,
}

impl SpriteMode {
    fn from_bits(bits: u16) -> Self {
        match bits & 3 {
            0 => Self::Normal,
            1 => Self::SemiTransparent,
            2 => Self::ObjWindow,
            3 => Self::Invalid,
            _ => unreachable!("value & 3 is always <= 3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteShape {
    Square,
    HorizontalRect,
    VerticalRect,
    Invalid,
}

impl SpriteShape {
    fn from_bits(bits: u16) -> Self {
        match bits & 3 {
            0 => Self::Square,
            1 => Self::HorizontalRect,
            2 => Self::VerticalRect,
            3 => Self::Invalid,
            _ => unreachable!("value & 3 is always <= 3"),
        }
    }

    /// (width, height) in pixels
    #[must_use]
    pub fn size_pixels(self, size: u16) -> (u32, u32) {
        match (self, size & 3) {
            (Self::Square, 0) => (8, 8),
            (Self::Square, 1) => (16, 16),
            (Self::Square, 2) => (32, 32),
            (Self::Square, 3) => (64, 64),
            (Self::HorizontalRect, 0) => (16, 8),
            (Self::HorizontalRect, 1) => (32, 8),
            (Self::HorizontalRect, 2) => (32, 16),
            (Self::HorizontalRect, 3) => (64, 32),
            (Self::VerticalRect, 0) => (8, 16),
            (Self::VerticalRect, 1) => (8, 32),
            (Self::VerticalRect, 2) => (16, 32),
            (Self::VerticalRect, 3) => (32, 64),
            (Self::Invalid, _) => (8, 8),
            _ => unreachable!("size & 3 is always <= 3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OamEntry {
    pub x: u32,
    pub y: u32,
    pub tile_number: u32,
    pub affine: bool,
    pub affine_double_size: bool,
    pub affine_parameter_group: usize,
    pub disabled: bool,
    pub mode: SpriteMode,
    pub mosaic: bool,
    pub eight_bpp: bool,
    pub width: u32,
    pub height: u32,
    pub h_flip: bool,
    pub v_flip: bool,
    pub priority: u8,
    pub palette: u16,
}

impl OamEntry {
    #[must_use]
    pub fn parse(attributes: [u16; 3]) -> Self {
        let affine = attributes[0].bit(8);
        let shape = SpriteShape::from_bits(attributes[0] >> 14);
        let (width, height) = shape.size_pixels(attributes[1] >> 14);

        Self {
            x: (attributes[1] & 0x1FF).into(),
            y: (attributes[0] & 0xFF).into(),
            tile_number: (attributes[2] & 0x3FF).into(),
            affine,
            affine_double_size: affine && attributes[0].bit(9),
            affine_parameter_group: ((attributes[1] >> 9) & 0x1F).into(),
            disabled: !affine && attributes[0].bit(9),
            mode: SpriteMode::from_bits(attributes[0] >> 10),
            mosaic: attributes[0].bit(12),
            eight_bpp: attributes[0].bit(13),
            width,
            height,
            h_flip: !affine && attributes[1].bit(12),
            v_flip: !affine && attributes[1].bit(13),
            priority: ((attributes[2] >> 10) & 3) as u8,
            palette: attributes[2] >> 12,
        }
    }

    /// Screen-space bounding box size; double-size affine sprites cover twice the area.
    #[must_use]
    pub fn bounds(&self) -> (u32, u32) {
        if self.affine_double_size {
            (2 * self.width, 2 * self.height)
        } else {
            (self.width, self.height)
        }
    }

    fn visible(&self) -> bool {
        !self.disabled && self.mode != SpriteMode::Invalid
    }
}

/// Decode every visible OAM entry, keeping OAM order.
pub(crate) fn decode_oam(oam: &[u8]) -> Vec<OamEntry> {
    (0..OAM_ENTRIES)
        .filter_map(|index| {
            let attribute = |i: usize| {
                let offset = 8 * index + 2 * i;
                match oam.get(offset..offset + 2) {
                    Some(&[lsb, msb]) => u16::from_le_bytes([lsb, msb]),
                    _ => 0x0200,
                }
            };
            let entry = OamEntry::parse([attribute(0), attribute(1), attribute(2)]);
            entry.visible().then_some(entry)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ObjPixel {
    /// BGR555; `None` if no sprite is visible
    pub color: Option<u16>,
    pub priority: u8,
    pub semi_transparent: bool,
}

impl ObjPixel {
    const TRANSPARENT: Self = Self { color: None, priority: u8::MAX, semi_transparent: false };
}

/// One output line of OBJ pixels plus OBJ-window coverage.
#[derive(Debug, Clone)]
pub(crate) struct ObjLine {
    pub pixels: Vec<ObjPixel>,
    pub window: Vec<bool>,
}

pub(crate) struct ObjRenderer<'a> {
    pub sprites: &'a [OamEntry],
    pub affine: &'a [ObjAffineSet; OBJ_AFFINE_SETS],
    pub mosaic: Mosaic,
    pub memory: &'a FrameMemory<'a>,
    pub params: &'a DispatchParams,
}

impl ObjRenderer<'_> {
    pub fn render_line(&self, y: u32, width: u32) -> ObjLine {
        let mut line = ObjLine {
            pixels: vec![ObjPixel::TRANSPARENT; width as usize],
            window: vec![false; width as usize],
        };

        for &sprite in self.sprites {
            let sample_y = if sprite.mosaic { snap(y, self.mosaic.obj_height) } else { y };

            let (bounds_width, bounds_height) = sprite.bounds();
            let local_y = sample_y.wrapping_sub(sprite.y) & 0xFF;
            if local_y >= bounds_height {
                continue;
            }

            for x in 0..width {
                let sample_x = if sprite.mosaic { snap(x, self.mosaic.obj_width) } else { x };
                let local_x = sample_x.wrapping_sub(sprite.x) & 0x1FF;
                if local_x >= bounds_width {
                    continue;
                }

                let existing = line.pixels[x as usize];
                if sprite.mode != SpriteMode::ObjWindow
                    && existing.color.is_some()
                    && sprite.priority >= existing.priority
                {
                    // Sprites are visited in ascending OAM order, so a lower index already won
                    continue;
                }

                let Some(color_id) = self.sample(&sprite, local_x, local_y) else { continue };

                if sprite.mode == SpriteMode::ObjWindow {
                    line.window[x as usize] = true;
                    continue;
                }

                let palette_index = if sprite.eight_bpp {
                    color_id
                } else {
                    16 * u32::from(sprite.palette) + color_id
                };
                line.pixels[x as usize] = ObjPixel {
                    color: read_palette(self.memory.obj_palette, palette_index),
                    priority: sprite.priority,
                    semi_transparent: sprite.mode == SpriteMode::SemiTransparent,
                };
            }
        }

        line
    }

    /// Returns the nonzero color ID at the given position within the sprite's bounding box, if any.
    fn sample(&self, sprite: &OamEntry, local_x: u32, local_y: u32) -> Option<u32> {
        let (sprite_x, sprite_y) = if sprite.affine {
            let (bounds_width, bounds_height) = sprite.bounds();
            let matrix = self.affine[sprite.affine_parameter_group % OBJ_AFFINE_SETS];

            let dx = i64::from(local_x) - i64::from(bounds_width / 2);
            let dy = i64::from(local_y) - i64::from(bounds_height / 2);
            let tx = ((i64::from(matrix.pa) * dx + i64::from(matrix.pb) * dy) >> 8)
                + i64::from(sprite.width / 2);
            let ty = ((i64::from(matrix.pc) * dx + i64::from(matrix.pd) * dy) >> 8)
                + i64::from(sprite.height / 2);

            if !(0..i64::from(sprite.width)).contains(&tx)
                || !(0..i64::from(sprite.height)).contains(&ty)
            {
                return None;
            }

            (tx as u32, ty as u32)
        } else {
            let x = if sprite.h_flip { sprite.width - 1 - local_x } else { local_x };
            let y = if sprite.v_flip { sprite.height - 1 - local_y } else { local_y };
            (x, y)
        };

        let row_stride_tiles = match self.params.obj_tile_mapping {
            ObjTileMapping::TwoDimensional => 32,
            ObjTileMapping::OneDimensional => sprite.width / 8,
        };
        let tile_number = sprite.tile_number + (sprite_y / 8) * row_stride_tiles + sprite_x / 8;
        let (tile_x, tile_y) = (sprite_x % 8, sprite_y % 8);

        let color_id = if sprite.eight_bpp {
            let offset = 64 * tile_number + 8 * tile_y + tile_x;
            read_byte(self.memory.vram, self.params.obj_char_base, offset)?
        } else {
            let offset = 32 * tile_number + 4 * tile_y + tile_x / 2;
            let byte = read_byte(self.memory.vram, self.params.obj_char_base, offset)?;
            (byte >> (4 * (tile_x & 1))) & 0xF
        };

        (color_id != 0).then_some(color_id.into())
    }
}

/// Snap a coordinate down to the origin of its mosaic block.
#[inline]
pub(crate) fn snap(coordinate: u32, block_size: u8) -> u32 {
    let block_size = u32::from(block_size.max(1));
    coordinate - coordinate % block_size
}
