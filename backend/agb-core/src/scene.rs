//! Renderer-neutral snapshot of everything the compositor needs besides raw memory contents

#[cfg(test)]
mod tests;

use agb_common::num::GetBit;
use bincode::{Decode, Encode};
use std::array;

pub const BG_LAYERS: usize = 4;
pub const OBJ_AFFINE_SETS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BgFlags {
    pub affine: bool,
    pub wrap: bool,
    pub mosaic: bool,
    pub eight_bpp: bool,
}

impl BgFlags {
    pub const AFFINE_BIT: u32 = 1 << 0;
    pub const WRAP_BIT: u32 = 1 << 1;
    pub const MOSAIC_BIT: u32 = 1 << 2;
    pub const EIGHT_BPP_BIT: u32 = 1 << 3;

    #[must_use]
    pub fn from_bits(bits: u32) -> Self {
        Self {
            affine: bits & Self::AFFINE_BIT != 0,
            wrap: bits & Self::WRAP_BIT != 0,
            mosaic: bits & Self::MOSAIC_BIT != 0,
            eight_bpp: bits & Self::EIGHT_BPP_BIT != 0,
        }
    }

    #[must_use]
    pub fn to_bits(self) -> u32 {
        (u32::from(self.affine) * Self::AFFINE_BIT)
            | (u32::from(self.wrap) * Self::WRAP_BIT)
            | (u32::from(self.mosaic) * Self::MOSAIC_BIT)
            | (u32::from(self.eight_bpp) * Self::EIGHT_BPP_BIT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BgLayer {
    /// VRAM byte offset of tile data
    pub char_base: u32,
    /// VRAM byte offset of the tile map
    pub screen_base: u32,
    pub scroll_x: u16,
    pub scroll_y: u16,
    pub priority: u8,
    pub enabled: bool,
    pub flags: BgFlags,
}

/// A window rectangle in output pixel coordinates; `x2` and `y2` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl WindowRect {
    pub const EMPTY: Self = Self { x1: 0, y1: 0, x2: 0, y2: 0 };

    #[must_use]
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Clamp to `width`x`height`. Inverted spans collapse to an empty rectangle.
    #[must_use]
    pub fn clipped(self, width: u32, height: u32) -> Self {
        let x2 = self.x2.min(width);
        let y2 = self.y2.min(height);
        if self.x1 >= x2 || self.y1 >= y2 {
            return Self::EMPTY;
        }

        Self { x1: self.x1, y1: self.y1, x2, y2 }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    #[inline]
    #[must_use]
    pub fn contains(self, x: u32, y: u32) -> bool {
        (self.x1..self.x2).contains(&x) && (self.y1..self.y2).contains(&y)
    }
}

/// Which layers and whether color effects are enabled inside one window region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowMask {
    pub bg: [bool; 4],
    pub obj: bool,
    pub effect: bool,
}

impl WindowMask {
    pub const ALL: Self = Self { bg: [true; 4], obj: true, effect: true };
    pub const NONE: Self = Self { bg: [false; 4], obj: false, effect: false };

    /// Decode a 6-bit mask: bits 0-3 BG0-BG3, bit 4 OBJ, bit 5 color effect.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        Self { bg: array::from_fn(|i| bits.bit(i as u8)), obj: bits.bit(4), effect: bits.bit(5) }
    }

    #[must_use]
    pub fn to_bits(self) -> u8 {
        bool_array_to_bits(self.bg) | (u8::from(self.obj) << 4) | (u8::from(self.effect) << 5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowState {
    pub win0: WindowRect,
    pub win1: WindowRect,
    pub win0_mask: WindowMask,
    pub win1_mask: WindowMask,
    pub outside_mask: WindowMask,
    pub obj_window_mask: WindowMask,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            win0: WindowRect::EMPTY,
            win1: WindowRect::EMPTY,
            win0_mask: WindowMask::NONE,
            win1_mask: WindowMask::NONE,
            outside_mask: WindowMask::ALL,
            obj_window_mask: WindowMask::ALL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendMode {
    #[default]
    None = 0,
    AlphaBlending = 1,
    BrightnessIncrease = 2,
    BrightnessDecrease = 3,
}

impl BlendMode {
    #[must_use]
    pub fn from_bits(bits: u16) -> Self {
        match bits & 3 {
            0 => Self::None,
            1 => Self::AlphaBlending,
            2 => Self::BrightnessIncrease,
            3 => Self::BrightnessDecrease,
            _ => unreachable!("value & 3 is always <= 3"),
        }
    }
}

/// BLDCNT target selection for one side of the blend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendTargets {
    pub bg: [bool; 4],
    pub obj: bool,
    pub backdrop: bool,
}

impl BlendTargets {
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        Self { bg: array::from_fn(|i| bits.bit(i as u8)), obj: bits.bit(4), backdrop: bits.bit(5) }
    }

    #[must_use]
    pub fn to_bits(self) -> u8 {
        bool_array_to_bits(self.bg) | (u8::from(self.obj) << 4) | (u8::from(self.backdrop) << 5)
    }
}

pub const MAX_BLEND_COEFFICIENT: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorEffect {
    pub mode: BlendMode,
    /// 1st target layers
    pub source: BlendTargets,
    /// 2nd target layers
    pub target: BlendTargets,
    pub eva: u8,
    pub evb: u8,
    pub brightness: u8,
}

impl ColorEffect {
    /// Decode from raw BLDCNT/BLDALPHA/BLDY values, clamping coefficients to 16.
    #[must_use]
    pub fn from_registers(bldcnt: u16, bldalpha: u16, bldy: u16) -> Self {
        let clamp = |value: u16| (value & 0x1F).min(MAX_BLEND_COEFFICIENT.into()) as u8;

        Self {
            mode: BlendMode::from_bits(bldcnt >> 6),
            source: BlendTargets::from_bits((bldcnt & 0x3F) as u8),
            target: BlendTargets::from_bits(((bldcnt >> 8) & 0x3F) as u8),
            eva: clamp(bldalpha),
            evb: clamp(bldalpha >> 8),
            brightness: clamp(bldy),
        }
    }

    #[must_use]
    pub fn bldcnt(&self) -> u16 {
        u16::from(self.source.to_bits())
            | ((self.mode as u16) << 6)
            | (u16::from(self.target.to_bits()) << 8)
    }

    #[must_use]
    pub fn bldalpha(&self) -> u16 {
        u16::from_le_bytes([self.eva, self.evb])
    }

    #[must_use]
    pub fn bldy(&self) -> u16 {
        self.brightness.into()
    }
}

/// Mosaic block sizes in pixels; always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mosaic {
    pub bg_width: u8,
    pub bg_height: u8,
    pub obj_width: u8,
    pub obj_height: u8,
}

impl Mosaic {
    pub const OFF: Self = Self { bg_width: 1, bg_height: 1, obj_width: 1, obj_height: 1 };

    /// Decode a raw MOSAIC value; each nibble N means blocks of N+1 pixels.
    #[must_use]
    pub fn from_register(value: u16) -> Self {
        let size = |shift: u16| ((value >> shift) & 0xF) as u8 + 1;
        Self { bg_width: size(0), bg_height: size(4), obj_width: size(8), obj_height: size(12) }
    }

    #[must_use]
    pub fn to_register(self) -> u16 {
        let nibble = |size: u8| u16::from(size.clamp(1, 16) - 1);
        nibble(self.bg_width)
            | (nibble(self.bg_height) << 4)
            | (nibble(self.obj_width) << 8)
            | (nibble(self.obj_height) << 12)
    }
}

impl Default for Mosaic {
    fn default() -> Self {
        Self::OFF
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollOverride {
    pub x: [u16; 4],
    pub y: [u16; 4],
}

/// Horizontal span of a window for one line; `x2` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowSpan {
    pub x1: u32,
    pub x2: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowXOverride {
    pub win0: WindowSpan,
    pub win1: WindowSpan,
}

/// Per-line raster effect replacements. A part that is `None` falls back to the frame-wide value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanlineOverride {
    pub scroll: Option<ScrollOverride>,
    pub window_x: Option<WindowXOverride>,
    pub blend: Option<ColorEffect>,
}

impl ScanlineOverride {
    pub const INACTIVE: Self = Self { scroll: None, window_x: None, blend: None };

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.scroll.is_some() || self.window_x.is_some() || self.blend.is_some()
    }
}

/// BG rotation/scaling. The reference point is in the compositor's 8.8 scale; the matrix
/// coefficients are 8.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AffineTransform {
    pub ref_x: i32,
    pub ref_y: i32,
    pub pa: i32,
    pub pb: i32,
    pub pc: i32,
    pub pd: i32,
}

impl AffineTransform {
    pub const IDENTITY: Self = Self { ref_x: 0, ref_y: 0, pa: 1 << 8, pb: 0, pc: 0, pd: 1 << 8 };
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjAffineSet {
    pub pa: i32,
    pub pb: i32,
    pub pc: i32,
    pub pd: i32,
}

impl ObjAffineSet {
    pub const IDENTITY: Self = Self { pa: 1 << 8, pb: 0, pc: 0, pd: 1 << 8 };
}

impl Default for ObjAffineSet {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Everything about one frame except VRAM/OAM/palette contents.
///
/// Produced once per frame and never modified afterwards; OBJ attributes are not included
/// because the compositor decodes them straight from OAM.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneDescriptor {
    pub bg: [BgLayer; BG_LAYERS],
    pub window: WindowState,
    pub effect: ColorEffect,
    pub mosaic: Mosaic,
    /// One entry per output line
    pub scanlines: Vec<ScanlineOverride>,
    pub bg_affine: [AffineTransform; BG_LAYERS],
    pub obj_affine: [ObjAffineSet; OBJ_AFFINE_SETS],
}

impl SceneDescriptor {
    /// A scene with every BG layer disabled, no windows, no effects, and `height` inactive
    /// scanline overrides.
    ///
    /// OBJ stays enabled in every window mask, so sprites in OAM are still drawn. Hide them in
    /// memory to get a backdrop-only frame.
    #[must_use]
    pub fn empty(height: u32) -> Self {
        Self {
            bg: [BgLayer::default(); BG_LAYERS],
            window: WindowState::default(),
            effect: ColorEffect::default(),
            mosaic: Mosaic::OFF,
            scanlines: vec![ScanlineOverride::INACTIVE; height as usize],
            bg_affine: [AffineTransform::IDENTITY; BG_LAYERS],
            obj_affine: [ObjAffineSet::IDENTITY; OBJ_AFFINE_SETS],
        }
    }

    /// Resolve the register values in effect for line `y`, applying that line's override.
    #[must_use]
    pub fn line_state(&self, y: u32, frame_width: u32, frame_height: u32) -> LineState {
        let line = self.scanlines.get(y as usize).copied().unwrap_or(ScanlineOverride::INACTIVE);

        let scroll = match line.scroll {
            Some(scroll) => array::from_fn(|i| (scroll.x[i] & 0x1FF, scroll.y[i] & 0x1FF)),
            None => array::from_fn(|i| (self.bg[i].scroll_x, self.bg[i].scroll_y)),
        };

        let (mut win0, mut win1) = (self.window.win0, self.window.win1);
        if let Some(window_x) = line.window_x {
            win0 = with_span(win0, window_x.win0);
            win1 = with_span(win1, window_x.win1);
        }

        LineState {
            scroll,
            win0: win0.clipped(frame_width, frame_height),
            win1: win1.clipped(frame_width, frame_height),
            effect: line.blend.unwrap_or(self.effect),
        }
    }
}

fn with_span(rect: WindowRect, span: WindowSpan) -> WindowRect {
    if rect.y1 >= rect.y2 {
        // A window with no lines stays empty regardless of its horizontal span
        return rect;
    }

    WindowRect { x1: span.x1, x2: span.x2, ..rect }
}

/// Register state for a single output line after per-line overrides are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineState {
    pub scroll: [(u16, u16); BG_LAYERS],
    pub win0: WindowRect,
    pub win1: WindowRect,
    pub effect: ColorEffect,
}

fn bool_array_to_bits(arr: [bool; 4]) -> u8 {
    arr.iter().enumerate().fold(0, |bits, (i, &set)| bits | (u8::from(set) << i))
}
