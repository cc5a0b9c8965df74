//! Structured mirror of the PPU I/O register block
//!
//! Fields are crate-visible for the scene extractor, but every mutation goes through a typed
//! `write_*` method or the offset-based [`RegisterFile::write_register`] dispatch.


use crate::scene::{BlendMode, BlendTargets, OBJ_AFFINE_SETS, ObjAffineSet, WindowMask};
use agb_common::define_bit_enum;
use agb_common::num::{GetBit, U16Ext, sign_extend};
use bincode::{Decode, Encode};
use std::array;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum BgMode {
    #[default]
    Zero, // 4 text BGs
    One,   // 2 text BGs + 1 affine BG
    Two,   // 2 affine BGs
    Three, // 15bpp bitmap
    Four,  // 8bpp bitmap, two frame buffers
    Five,  // 15bpp bitmap, two frame buffers
    Invalid(u8),
}

impl BgMode {
    fn to_bits(self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Invalid(bits) => bits,
        }
    }

    fn from_bits(bits: u16) -> Self {
        match bits & 7 {
            0 => Self::Zero,
            1 => Self::One,
            2 => Self::Two,
            3 => Self::Three,
            4 => Self::Four,
            5 => Self::Five,
            b @ (6 | 7) => Self::Invalid(b as u8),
            _ => unreachable!("value & 7 is always <= 7"),
        }
    }

    #[allow(clippy::manual_range_patterns)]
    #[must_use]
    pub fn bg_active_in_mode(self, bg: usize) -> bool {
        matches!(
            (self, bg),
            (Self::Zero, _)
                | (Self::One, 0 | 1 | 2)
                | (Self::Two, 2 | 3)
                | (Self::Three | Self::Four | Self::Five, 2)
        )
    }

    #[must_use]
    pub fn bg_is_affine_in_mode(self, bg: usize) -> bool {
        matches!((self, bg), (Self::One, 2) | (Self::Two, 2 | 3))
    }

    #[must_use]
    pub fn is_bitmap(self) -> bool {
        matches!(self, Self::Three | Self::Four | Self::Five)
    }
}

define_bit_enum!(ObjVramMapDimensions, [Two, One]);
define_bit_enum!(BitsPerPixel, [Four, Eight]);
define_bit_enum!(AffineOverflowBehavior, [Transparent, Wrap]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum ScreenSize {
    #[default]
    Zero = 0, // 256x256 text / 128x128 affine
    One = 1,   // 512x256 text / 256x256 affine
    Two = 2,   // 256x512 text / 512x512 affine
    Three = 3, // 512x512 text / 1024x1024 affine
}

impl ScreenSize {
    fn from_bits(bits: u16) -> Self {
        match bits & 3 {
            0 => Self::Zero,
            1 => Self::One,
            2 => Self::Two,
            3 => Self::Three,
            _ => unreachable!("value & 3 is always <= 3"),
        }
    }
}

/// BGxCNT, decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct BgControl {
    pub priority: u8,
    /// Byte offset; 2-bit field in 16 KiB units
    pub char_base: u32,
    pub mosaic: bool,
    pub bpp: BitsPerPixel,
    /// Byte offset; 5-bit field in 2 KiB units
    pub screen_base: u32,
    pub affine_overflow: AffineOverflowBehavior,
    pub size: ScreenSize,
}

impl BgControl {
    pub const CHAR_BASE_UNIT: u32 = 16 * 1024;
    pub const SCREEN_BASE_UNIT: u32 = 2 * 1024;

    #[must_use]
    pub fn from_register(value: u16) -> Self {
        Self {
            priority: value.bits(0..=1) as u8,
            char_base: u32::from(value.bits(2..=3)) * Self::CHAR_BASE_UNIT,
            mosaic: value.bit(6),
            bpp: BitsPerPixel::from_bit(value.bit(7)),
            screen_base: u32::from(value.bits(8..=12)) * Self::SCREEN_BASE_UNIT,
            affine_overflow: AffineOverflowBehavior::from_bit(value.bit(13)),
            size: ScreenSize::from_bits(value >> 14),
        }
    }

    #[must_use]
    pub fn to_register(&self) -> u16 {
        u16::from(self.priority)
            | (((self.char_base / Self::CHAR_BASE_UNIT) as u16) << 2)
            | (u16::from(self.mosaic) << 6)
            | ((self.bpp as u16) << 7)
            | (((self.screen_base / Self::SCREEN_BASE_UNIT) as u16) << 8)
            | ((self.affine_overflow as u16) << 13)
            | ((self.size as u16) << 14)
    }
}

/// BG2/BG3 rotation/scaling registers at hardware precision: 28.8 reference point (sign-extended
/// to 32 bits) and 8.8 matrix coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct BgAffineParameters {
    // BG2X / BG3X
    pub reference_x: i32,
    // BG2Y / BG3Y
    pub reference_y: i32,
    // BG2PA / BG3PA
    pub a: i32,
    // BG2PB / BG3PB
    pub b: i32,
    // BG2PC / BG3PC
    pub c: i32,
    // BG2PD / BG3PD
    pub d: i32,
}

impl Default for BgAffineParameters {
    fn default() -> Self {
        Self { reference_x: 0, reference_y: 0, a: 1 << 8, b: 0, c: 0, d: 1 << 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct RegisterFile {
    // DISPCNT (Display control)
    pub(crate) bg_mode: BgMode,
    pub(crate) dispcnt_unused_bits: u8,
    pub(crate) obj_vram_map_dimensions: ObjVramMapDimensions,
    pub(crate) forced_blanking: bool,
    pub(crate) bg_enabled: [bool; 4],
    pub(crate) obj_enabled: bool,
    pub(crate) window_enabled: [bool; 2],
    pub(crate) obj_window_enabled: bool,
    // DISPSTAT (Display status); stored as written, no interrupt behavior
    pub(crate) dispstat: u16,
    // BGxCNT (BG0-3 control)
    pub(crate) bg_control: [BgControl; 4],
    // BGxHOFS / BGxVOFS (BG0-3 offsets)
    pub(crate) bg_h_scroll: [u16; 4],
    pub(crate) bg_v_scroll: [u16; 4],
    // BG2/3 affine registers
    pub(crate) bg_affine_parameters: [BgAffineParameters; 2],
    // WINxH / WINxV (Window 0/1 coordinates)
    pub(crate) window_x1: [u8; 2],
    pub(crate) window_x2: [u8; 2],
    pub(crate) window_y1: [u8; 2],
    pub(crate) window_y2: [u8; 2],
    // WININ (Window inside control)
    pub(crate) window_in: [WindowMask; 2],
    // WINOUT (Window outside control)
    pub(crate) window_out: WindowMask,
    pub(crate) obj_window: WindowMask,
    // MOSAIC (Mosaic size), raw nibbles
    pub(crate) mosaic: u16,
    // BLDCNT (Blending control)
    pub(crate) blend_1st_target: BlendTargets,
    pub(crate) blend_mode: BlendMode,
    pub(crate) blend_2nd_target: BlendTargets,
    // BLDALPHA (Alpha blending coefficients)
    pub(crate) blend_alpha_a: u8,
    pub(crate) blend_alpha_b: u8,
    // BLDY (Brightness coefficient)
    pub(crate) blend_brightness: u8,
    // OBJ affine parameter sets
    pub(crate) obj_affine: [ObjAffineSet; OBJ_AFFINE_SETS],
}

impl RegisterFile {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bg_mode: BgMode::default(),
            dispcnt_unused_bits: 0,
            obj_vram_map_dimensions: ObjVramMapDimensions::default(),
            forced_blanking: false,
            bg_enabled: [false; 4],
            obj_enabled: false,
            window_enabled: [false; 2],
            obj_window_enabled: false,
            dispstat: 0,
            bg_control: [BgControl::default(); 4],
            bg_h_scroll: [0; 4],
            bg_v_scroll: [0; 4],
            bg_affine_parameters: array::from_fn(|_| BgAffineParameters::default()),
            window_x1: [0; 2],
            window_x2: [0; 2],
            window_y1: [0; 2],
            window_y2: [0; 2],
            window_in: [WindowMask::NONE; 2],
            window_out: WindowMask::NONE,
            obj_window: WindowMask::NONE,
            mosaic: 0,
            blend_1st_target: BlendTargets::default(),
            blend_mode: BlendMode::default(),
            blend_2nd_target: BlendTargets::default(),
            blend_alpha_a: 0,
            blend_alpha_b: 0,
            blend_brightness: 0,
            obj_affine: [ObjAffineSet::IDENTITY; OBJ_AFFINE_SETS],
        }
    }

    /// Read a halfword register by its offset from the I/O base. Unmapped offsets read as 0.
    #[must_use]
    pub fn read_register(&self, offset: u32) -> u16 {
        log::trace!("Register read {offset:03X}");

        match offset & !1 {
            0x000 => self.read_dispcnt(),
            0x004 => self.dispstat,
            // VCOUNT; every snapshot is taken between frames
            0x006 => 0,
            0x008..=0x00E => self.read_bgcnt(bg_from_offset(offset, 7, 1)),
            0x010..=0x01E => {
                let bg = bg_from_offset(offset, 0xF, 2);
                if !offset.bit(1) { self.bg_h_scroll[bg] } else { self.bg_v_scroll[bg] }
            }
            0x020..=0x03E => self.read_bg_affine_register(offset),
            0x040 => self.read_winh(0),
            0x042 => self.read_winh(1),
            0x044 => self.read_winv(0),
            0x046 => self.read_winv(1),
            0x048 => self.read_winin(),
            0x04A => self.read_winout(),
            0x04C => self.mosaic,
            0x050 => self.read_bldcnt(),
            0x052 => self.read_bldalpha(),
            0x054 => self.blend_brightness.into(),
            _ => {
                log::warn!("Unhandled register read {offset:03X}");
                0
            }
        }
    }

    /// Write a halfword register by its offset from the I/O base. Unmapped offsets are ignored.
    pub fn write_register(&mut self, offset: u32, value: u16) {
        log::debug!("Register write {offset:03X} {value:04X}");

        match offset & !1 {
            0x000 => self.write_dispcnt(value),
            0x004 => self.write_dispstat(value),
            0x008..=0x00E => self.write_bgcnt(bg_from_offset(offset, 7, 1), value),
            0x010..=0x01E => {
                let bg = bg_from_offset(offset, 0xF, 2);
                if !offset.bit(1) {
                    self.write_bghofs(bg, value);
                } else {
                    self.write_bgvofs(bg, value);
                }
            }
            0x020..=0x03E => self.write_bg_affine_register(offset, value),
            0x040 => self.write_winh(0, value),
            0x042 => self.write_winh(1, value),
            0x044 => self.write_winv(0, value),
            0x046 => self.write_winv(1, value),
            0x048 => self.write_winin(value),
            0x04A => self.write_winout(value),
            0x04C => self.write_mosaic(value),
            0x050 => self.write_bldcnt(value),
            0x052 => self.write_bldalpha(value),
            0x054 => self.write_bldy(value),
            _ => {
                log::warn!("Unhandled register write {offset:03X} {value:04X}");
            }
        }
    }

    /// Byte writes update one half of the containing halfword register.
    pub fn write_register_byte(&mut self, offset: u32, value: u8) {
        let mut halfword = self.read_register(offset & !1);
        if !offset.bit(0) {
            halfword.set_lsb(value);
        } else {
            halfword.set_msb(value);
        }
        self.write_register(offset & !1, halfword);
    }

    // $000: DISPCNT (Display control)
    pub fn write_dispcnt(&mut self, value: u16) {
        self.bg_mode = BgMode::from_bits(value);
        self.dispcnt_unused_bits = value.bits(3..=5) as u8;
        self.obj_vram_map_dimensions = ObjVramMapDimensions::from_bit(value.bit(6));
        self.forced_blanking = value.bit(7);
        self.bg_enabled = array::from_fn(|i| value.bit((8 + i) as u8));
        self.obj_enabled = value.bit(12);
        self.window_enabled = [value.bit(13), value.bit(14)];
        self.obj_window_enabled = value.bit(15);

        log::debug!("DISPCNT write: {value:04X}");
        log::debug!("  BG mode: {:?}", self.bg_mode);
        log::debug!("  OBJ VRAM map dimensions: {:?}", self.obj_vram_map_dimensions);
        log::debug!("  Forced blanking: {}", self.forced_blanking);
        log::debug!("  BGs enabled: {:?}", self.bg_enabled);
        log::debug!("  OBJ enabled: {}", self.obj_enabled);
        log::debug!("  Window 0 enabled: {}", self.window_enabled[0]);
        log::debug!("  Window 1 enabled: {}", self.window_enabled[1]);
        log::debug!("  OBJ window enabled: {}", self.obj_window_enabled);
    }

    // $000: DISPCNT (Display control)
    #[must_use]
    pub fn read_dispcnt(&self) -> u16 {
        u16::from(self.bg_mode.to_bits())
            | (u16::from(self.dispcnt_unused_bits) << 3)
            | ((self.obj_vram_map_dimensions as u16) << 6)
            | (u16::from(self.forced_blanking) << 7)
            | (u16::from(bool_array_to_bits(self.bg_enabled)) << 8)
            | (u16::from(self.obj_enabled) << 12)
            | (u16::from(self.window_enabled[0]) << 13)
            | (u16::from(self.window_enabled[1]) << 14)
            | (u16::from(self.obj_window_enabled) << 15)
    }

    // $004: DISPSTAT (Display status)
    pub fn write_dispstat(&mut self, value: u16) {
        self.dispstat = value;

        log::debug!("DISPSTAT write: {value:04X}");
    }

    // $008-$00E: BG0CNT-BG3CNT (BG0-3 control)
    #[must_use]
    pub fn read_bgcnt(&self, bg: usize) -> u16 {
        self.bg_control[bg].to_register()
    }

    // $008-$00E: BG0CNT-BG3CNT (BG0-3 control)
    pub fn write_bgcnt(&mut self, bg: usize, value: u16) {
        let control = BgControl::from_register(value);
        self.bg_control[bg] = control;

        log::debug!("BG{bg}CNT write: {value:04X}");
        log::debug!("  Priority: {}", control.priority);
        log::debug!("  Char base address: {:05X}", control.char_base);
        log::debug!("  Mosaic enabled: {}", control.mosaic);
        log::debug!("  Bits per pixel: {:?}", control.bpp);
        log::debug!("  Screen base address: {:05X}", control.screen_base);
        log::debug!("  Affine overflow behavior: {:?}", control.affine_overflow);
        log::debug!("  Screen size: {}", control.size as u8);
    }

    // $010/$014/$018/$01C: BG0HOFS-BG3HOFS (BG0-3 horizontal offset)
    pub fn write_bghofs(&mut self, bg: usize, value: u16) {
        self.bg_h_scroll[bg] = value & 0x1FF;

        log::debug!("BG{bg}HOFS write: {value:04X}");
    }

    // $012/$016/$01A/$01E: BG0VOFS-BG3VOFS (BG0-3 vertical offset)
    pub fn write_bgvofs(&mut self, bg: usize, value: u16) {
        self.bg_v_scroll[bg] = value & 0x1FF;

        log::debug!("BG{bg}VOFS write: {value:04X}");
    }

    // $020-$03E: BG2/3 affine parameter registers
    pub fn write_bg_affine_register(&mut self, offset: u32, value: u16) {
        let affine_bg = ((offset >> 4) & 1) as usize;
        let bg = affine_bg + 2;
        let parameters = &mut self.bg_affine_parameters[affine_bg];

        match offset & 0xE {
            0x0 => {
                parameters.a = i32::from(value as i16);
                log::debug!("BG{bg}PA write: {value:04X}");
            }
            0x2 => {
                parameters.b = i32::from(value as i16);
                log::debug!("BG{bg}PB write: {value:04X}");
            }
            0x4 => {
                parameters.c = i32::from(value as i16);
                log::debug!("BG{bg}PC write: {value:04X}");
            }
            0x6 => {
                parameters.d = i32::from(value as i16);
                log::debug!("BG{bg}PD write: {value:04X}");
            }
            0x8 => {
                parameters.reference_x = write_reference_low(parameters.reference_x, value);
                log::debug!("BG{bg}X_L write: {value:04X}");
                log::debug!("  Reference point X: {:08X}", parameters.reference_x);
            }
            0xA => {
                parameters.reference_x = write_reference_high(parameters.reference_x, value);
                log::debug!("BG{bg}X_H write: {value:04X}");
                log::debug!("  Reference point X: {:08X}", parameters.reference_x);
            }
            0xC => {
                parameters.reference_y = write_reference_low(parameters.reference_y, value);
                log::debug!("BG{bg}Y_L write: {value:04X}");
                log::debug!("  Reference point Y: {:08X}", parameters.reference_y);
            }
            0xE => {
                parameters.reference_y = write_reference_high(parameters.reference_y, value);
                log::debug!("BG{bg}Y_H write: {value:04X}");
                log::debug!("  Reference point Y: {:08X}", parameters.reference_y);
            }
            _ => unreachable!("value & 0xE is always one of the above 8 values"),
        }
    }

    #[must_use]
    pub fn read_bg_affine_register(&self, offset: u32) -> u16 {
        let parameters = &self.bg_affine_parameters[((offset >> 4) & 1) as usize];

        match offset & 0xE {
            0x0 => parameters.a as u16,
            0x2 => parameters.b as u16,
            0x4 => parameters.c as u16,
            0x6 => parameters.d as u16,
            0x8 => parameters.reference_x as u16,
            0xA => ((parameters.reference_x >> 16) & 0x0FFF) as u16,
            0xC => parameters.reference_y as u16,
            0xE => ((parameters.reference_y >> 16) & 0x0FFF) as u16,
            _ => unreachable!("value & 0xE is always one of the above values"),
        }
    }

    /// Set a BG2/BG3 reference point in one step, as a 32-bit write to BGxX/BGxY would.
    pub fn write_bg_reference_point(&mut self, bg: usize, x: i32, y: i32) {
        assert!(bg == 2 || bg == 3, "only BG2 and BG3 have affine registers, got BG{bg}");

        let parameters = &mut self.bg_affine_parameters[bg - 2];
        parameters.reference_x = sign_extend(x as u32, 28);
        parameters.reference_y = sign_extend(y as u32, 28);

        log::debug!("BG{bg}X/BG{bg}Y write: {x:08X} {y:08X}");
    }

    /// Set a BG2/BG3 matrix as PA/PB/PC/PD.
    pub fn write_bg_matrix(&mut self, bg: usize, [a, b, c, d]: [i16; 4]) {
        assert!(bg == 2 || bg == 3, "only BG2 and BG3 have affine registers, got BG{bg}");

        let parameters = &mut self.bg_affine_parameters[bg - 2];
        [parameters.a, parameters.b, parameters.c, parameters.d] = [a, b, c, d].map(i32::from);

        log::debug!("BG{bg}PA-PD write: {a:04X} {b:04X} {c:04X} {d:04X}");
    }

    #[must_use]
    pub fn bg_affine_parameters(&self, bg: usize) -> Option<BgAffineParameters> {
        bg.checked_sub(2).and_then(|i| self.bg_affine_parameters.get(i)).copied()
    }

    // $040/$042: WIN0H/WIN1H (Window 0/1 horizontal coordinates)
    pub fn write_winh(&mut self, window: usize, value: u16) {
        [self.window_x1[window], self.window_x2[window]] = value.to_be_bytes();

        log::debug!("WIN{window}H write: {value:04X}");
        log::debug!("  X1: {}", self.window_x1[window]);
        log::debug!("  X2: {}", self.window_x2[window]);
    }

    #[must_use]
    pub fn read_winh(&self, window: usize) -> u16 {
        u16::from_be_bytes([self.window_x1[window], self.window_x2[window]])
    }

    // $044/$046: WIN0V/WIN1V (Window 0/1 vertical coordinates)
    pub fn write_winv(&mut self, window: usize, value: u16) {
        [self.window_y1[window], self.window_y2[window]] = value.to_be_bytes();

        log::debug!("WIN{window}V write: {value:04X}");
        log::debug!("  Y1: {}", self.window_y1[window]);
        log::debug!("  Y2: {}", self.window_y2[window]);
    }

    #[must_use]
    pub fn read_winv(&self, window: usize) -> u16 {
        u16::from_be_bytes([self.window_y1[window], self.window_y2[window]])
    }

    // $048: WININ (Window inside control)
    #[must_use]
    pub fn read_winin(&self) -> u16 {
        u16::from_le_bytes([self.window_in[0].to_bits(), self.window_in[1].to_bits()])
    }

    // $048: WININ (Window inside control)
    pub fn write_winin(&mut self, value: u16) {
        self.window_in = [WindowMask::from_bits(value.lsb()), WindowMask::from_bits(value.msb())];

        log::debug!("WININ write: {value:04X}");
        log::debug!("  Window 0: {:?}", self.window_in[0]);
        log::debug!("  Window 1: {:?}", self.window_in[1]);
    }

    // $04A: WINOUT (Window outside control)
    #[must_use]
    pub fn read_winout(&self) -> u16 {
        u16::from_le_bytes([self.window_out.to_bits(), self.obj_window.to_bits()])
    }

    // $04A: WINOUT (Window outside control)
    pub fn write_winout(&mut self, value: u16) {
        self.window_out = WindowMask::from_bits(value.lsb());
        self.obj_window = WindowMask::from_bits(value.msb());

        log::debug!("WINOUT write: {value:04X}");
        log::debug!("  Outside windows: {:?}", self.window_out);
        log::debug!("  OBJ window: {:?}", self.obj_window);
    }

    // $04C: MOSAIC (Mosaic size)
    pub fn write_mosaic(&mut self, value: u16) {
        self.mosaic = value;

        log::debug!("MOSAIC write: {value:04X}");
        log::debug!("  BG H size: {}", value.bits(0..=3));
        log::debug!("  BG V size: {}", value.bits(4..=7));
        log::debug!("  OBJ H size: {}", value.bits(8..=11));
        log::debug!("  OBJ V size: {}", value.bits(12..=15));
    }

    // $050: BLDCNT (Blending control)
    #[must_use]
    pub fn read_bldcnt(&self) -> u16 {
        u16::from(self.blend_1st_target.to_bits())
            | ((self.blend_mode as u16) << 6)
            | (u16::from(self.blend_2nd_target.to_bits()) << 8)
    }

    // $050: BLDCNT (Blending control)
    pub fn write_bldcnt(&mut self, value: u16) {
        self.blend_1st_target = BlendTargets::from_bits(value.bits(0..=5) as u8);
        self.blend_mode = BlendMode::from_bits(value >> 6);
        self.blend_2nd_target = BlendTargets::from_bits(value.bits(8..=13) as u8);

        log::debug!("BLDCNT write: {value:04X}");
        log::debug!("  Blend mode: {:?}", self.blend_mode);
        log::debug!("  1st target: {:?}", self.blend_1st_target);
        log::debug!("  2nd target: {:?}", self.blend_2nd_target);
    }

    // $052: BLDALPHA (Alpha blending coefficients)
    #[must_use]
    pub fn read_bldalpha(&self) -> u16 {
        u16::from_le_bytes([self.blend_alpha_a, self.blend_alpha_b])
    }

    // $052: BLDALPHA (Alpha blending coefficients)
    pub fn write_bldalpha(&mut self, value: u16) {
        self.blend_alpha_a = value.bits(0..=4) as u8;
        self.blend_alpha_b = value.bits(8..=12) as u8;

        log::debug!("BLDALPHA write: {value:04X}");
        log::debug!("  A: {}", self.blend_alpha_a);
        log::debug!("  B: {}", self.blend_alpha_b);
    }

    // $054: BLDY (Brightness coefficient)
    pub fn write_bldy(&mut self, value: u16) {
        self.blend_brightness = value.bits(0..=4) as u8;

        log::debug!("BLDY write: {value:04X} (coefficient = {})", self.blend_brightness);
    }

    /// Set one of the 32 OBJ rotation/scaling parameter sets.
    pub fn write_obj_affine(&mut self, index: usize, [pa, pb, pc, pd]: [i16; 4]) {
        let Some(set) = self.obj_affine.get_mut(index) else {
            log::warn!("Ignoring write to nonexistent OBJ affine set {index}");
            return;
        };

        *set = ObjAffineSet {
            pa: pa.into(),
            pb: pb.into(),
            pc: pc.into(),
            pd: pd.into(),
        };

        log::debug!("OBJ affine set {index} write: {pa:04X} {pb:04X} {pc:04X} {pd:04X}");
    }

    #[must_use]
    pub fn obj_affine(&self, index: usize) -> Option<ObjAffineSet> {
        self.obj_affine.get(index).copied()
    }

    #[must_use]
    pub fn bg_control(&self, bg: usize) -> BgControl {
        self.bg_control[bg]
    }

    #[must_use]
    pub fn bg_mode(&self) -> BgMode {
        self.bg_mode
    }

    #[must_use]
    pub fn obj_vram_map_dimensions(&self) -> ObjVramMapDimensions {
        self.obj_vram_map_dimensions
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

fn bg_from_offset(offset: u32, mask: u32, shift: u32) -> usize {
    ((offset & mask) >> shift) as usize
}

fn write_reference_low(reference: i32, value: u16) -> i32 {
    (reference & !0xFFFF) | i32::from(value)
}

fn write_reference_high(reference: i32, value: u16) -> i32 {
    // Only 12 bits of the high halfword exist; bit 11 is the sign bit
    (reference & 0xFFFF) | ((i32::from(value) << 20) >> 4)
}

fn bool_array_to_bits(arr: [bool; 4]) -> u8 {
    arr.iter().enumerate().fold(0, |bits, (i, &set)| bits | (u8::from(set) << i))
}
