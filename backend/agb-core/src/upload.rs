//! Fixed-layout byte streams handed from the core to a compose backend
//!
//! Memory contents travel as raw bytes. Everything else in a [`SceneDescriptor`] is flattened
//! into `#[repr(C)]` records of 32-bit words so that any backend (this crate's software backend,
//! or a GPU compute kernel) can consume the same layout.


use crate::compositor::FrameMemory;
use crate::memory::{BG_PALETTE_LEN, OAM_LEN, OBJ_PALETTE_LEN, VRAM_LEN};
use crate::scene::{
    AffineTransform, BG_LAYERS, BgFlags, BgLayer, ColorEffect, Mosaic, OBJ_AFFINE_SETS,
    ObjAffineSet, ScanlineOverride, SceneDescriptor, ScrollOverride, WindowMask, WindowRect,
    WindowSpan, WindowState, WindowXOverride,
};
use bytemuck::{Pod, Zeroable};
use std::array;
use std::fmt::{Display, Formatter};
use std::mem;

/// Binding slot of the output frame buffer; input streams occupy slots 1 through 10.
pub const OUTPUT_BINDING: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamId {
    Vram,
    BgPalette,
    BgParams,
    ObjPalette,
    Oam,
    Window,
    Fx,
    Scanlines,
    BgAffine,
    ObjAffine,
}

impl StreamId {
    pub const ALL: [Self; 10] = [
        Self::Vram,
        Self::BgPalette,
        Self::BgParams,
        Self::ObjPalette,
        Self::Oam,
        Self::Window,
        Self::Fx,
        Self::Scanlines,
        Self::BgAffine,
        Self::ObjAffine,
    ];

    #[must_use]
    pub fn binding(self) -> u32 {
        match self {
            Self::Vram => 1,
            Self::BgPalette => 2,
            Self::BgParams => 3,
            Self::ObjPalette => 4,
            Self::Oam => 5,
            Self::Window => 6,
            Self::Fx => 7,
            Self::Scanlines => 8,
            Self::BgAffine => 9,
            Self::ObjAffine => 10,
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        (self.binding() - 1) as usize
    }

    /// Exact byte length of the stream, or `None` for the scanline stream, which holds one
    /// record per output line.
    #[must_use]
    pub fn expected_len(self) -> Option<usize> {
        match self {
            Self::Vram => Some(VRAM_LEN),
            Self::BgPalette => Some(BG_PALETTE_LEN),
            Self::BgParams => Some(BG_LAYERS * mem::size_of::<BgParamRecord>()),
            Self::ObjPalette => Some(OBJ_PALETTE_LEN),
            Self::Oam => Some(OAM_LEN),
            Self::Window => Some(mem::size_of::<WindowRecord>()),
            Self::Fx => Some(mem::size_of::<FxRecord>()),
            Self::Scanlines => None,
            Self::BgAffine => Some(BG_LAYERS * mem::size_of::<AffineRecord>()),
            Self::ObjAffine => Some(OBJ_AFFINE_SETS * mem::size_of::<ObjAffineRecord>()),
        }
    }

    /// Whether `len` is a valid byte length for this stream.
    #[must_use]
    pub fn accepts_len(self, len: usize) -> bool {
        match self.expected_len() {
            Some(expected) => len == expected,
            None => len % mem::size_of::<ScanlineRecord>() == 0,
        }
    }
}

impl Display for StreamId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Vram => "VRAM",
            Self::BgPalette => "BG palette",
            Self::BgParams => "BG parameters",
            Self::ObjPalette => "OBJ palette",
            Self::Oam => "OAM",
            Self::Window => "window state",
            Self::Fx => "color effects",
            Self::Scanlines => "scanline overrides",
            Self::BgAffine => "BG affine",
            Self::ObjAffine => "OBJ affine",
        };
        write!(f, "{name}")
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct BgParamRecord {
    pub char_base: u32,
    pub screen_base: u32,
    pub scroll_x: u32,
    pub scroll_y: u32,
    pub priority: u32,
    pub enabled: u32,
    pub flags: u32,
    pub pad: u32,
}

impl From<&BgLayer> for BgParamRecord {
    fn from(layer: &BgLayer) -> Self {
        Self {
            char_base: layer.char_base,
            screen_base: layer.screen_base,
            scroll_x: layer.scroll_x.into(),
            scroll_y: layer.scroll_y.into(),
            priority: layer.priority.into(),
            enabled: layer.enabled.into(),
            flags: layer.flags.to_bits(),
            pad: 0,
        }
    }
}

impl From<&BgParamRecord> for BgLayer {
    fn from(record: &BgParamRecord) -> Self {
        Self {
            char_base: record.char_base,
            screen_base: record.screen_base,
            scroll_x: (record.scroll_x & 0x1FF) as u16,
            scroll_y: (record.scroll_y & 0x1FF) as u16,
            priority: (record.priority & 3) as u8,
            enabled: record.enabled != 0,
            flags: BgFlags::from_bits(record.flags),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct WindowRecord {
    /// x1, y1, x2, y2
    pub win0: [u32; 4],
    pub win1: [u32; 4],
    pub win_in0: u32,
    pub win_in1: u32,
    pub win_out: u32,
    pub win_obj: u32,
}

impl From<&WindowState> for WindowRecord {
    fn from(window: &WindowState) -> Self {
        let rect = |rect: WindowRect| [rect.x1, rect.y1, rect.x2, rect.y2];
        Self {
            win0: rect(window.win0),
            win1: rect(window.win1),
            win_in0: window.win0_mask.to_bits().into(),
            win_in1: window.win1_mask.to_bits().into(),
            win_out: window.outside_mask.to_bits().into(),
            win_obj: window.obj_window_mask.to_bits().into(),
        }
    }
}

impl From<&WindowRecord> for WindowState {
    fn from(record: &WindowRecord) -> Self {
        let rect = |[x1, y1, x2, y2]: [u32; 4]| WindowRect::new(x1, y1, x2, y2);
        let mask = |bits: u32| WindowMask::from_bits((bits & 0x3F) as u8);
        Self {
            win0: rect(record.win0),
            win1: rect(record.win1),
            win0_mask: mask(record.win_in0),
            win1_mask: mask(record.win_in1),
            outside_mask: mask(record.win_out),
            obj_window_mask: mask(record.win_obj),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct FxRecord {
    pub bldcnt: u32,
    pub bldalpha: u32,
    pub bldy: u32,
    pub mosaic: u32,
}

pub mod scanline_flags {
    pub const SCROLL: u32 = 1 << 0;
    pub const WINDOW_X: u32 = 1 << 1;
    pub const BLEND: u32 = 1 << 2;
}

/// One 80-byte per-line override record.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct ScanlineRecord {
    pub hofs: [u32; 4],
    pub vofs: [u32; 4],
    pub win0_x1: u32,
    pub win0_x2: u32,
    pub pad0: [u32; 2],
    pub win1_x1: u32,
    pub win1_x2: u32,
    pub pad1: [u32; 2],
    pub bldcnt: u32,
    pub bldalpha: u32,
    pub bldy: u32,
    pub flags: u32,
}

impl From<&ScanlineOverride> for ScanlineRecord {
    fn from(line: &ScanlineOverride) -> Self {
        let mut record = Self::default();

        if let Some(scroll) = line.scroll {
            record.hofs = scroll.x.map(u32::from);
            record.vofs = scroll.y.map(u32::from);
            record.flags |= scanline_flags::SCROLL;
        }

        if let Some(window_x) = line.window_x {
            record.win0_x1 = window_x.win0.x1;
            record.win0_x2 = window_x.win0.x2;
            record.win1_x1 = window_x.win1.x1;
            record.win1_x2 = window_x.win1.x2;
            record.flags |= scanline_flags::WINDOW_X;
        }

        if let Some(blend) = line.blend {
            record.bldcnt = blend.bldcnt().into();
            record.bldalpha = blend.bldalpha().into();
            record.bldy = blend.bldy().into();
            record.flags |= scanline_flags::BLEND;
        }

        record
    }
}

impl From<&ScanlineRecord> for ScanlineOverride {
    fn from(record: &ScanlineRecord) -> Self {
        let scroll = (record.flags & scanline_flags::SCROLL != 0).then(|| ScrollOverride {
            x: record.hofs.map(|hofs| (hofs & 0x1FF) as u16),
            y: record.vofs.map(|vofs| (vofs & 0x1FF) as u16),
        });

        let window_x = (record.flags & scanline_flags::WINDOW_X != 0).then(|| WindowXOverride {
            win0: WindowSpan { x1: record.win0_x1, x2: record.win0_x2 },
            win1: WindowSpan { x1: record.win1_x1, x2: record.win1_x2 },
        });

        let blend = (record.flags & scanline_flags::BLEND != 0).then(|| {
            ColorEffect::from_registers(
                record.bldcnt as u16,
                record.bldalpha as u16,
                record.bldy as u16,
            )
        });

        Self { scroll, window_x, blend }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct AffineRecord {
    pub ref_x: i32,
    pub ref_y: i32,
    pub pa: i32,
    pub pb: i32,
    pub pc: i32,
    pub pd: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct ObjAffineRecord {
    pub pa: i32,
    pub pb: i32,
    pub pc: i32,
    pub pd: i32,
}

/// All ten input streams for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadStreams {
    pub vram: Vec<u8>,
    pub bg_palette: Vec<u8>,
    pub obj_palette: Vec<u8>,
    pub oam: Vec<u8>,
    pub bg_params: [BgParamRecord; BG_LAYERS],
    pub window: WindowRecord,
    pub fx: FxRecord,
    pub scanlines: Vec<ScanlineRecord>,
    pub bg_affine: [AffineRecord; BG_LAYERS],
    pub obj_affine: [ObjAffineRecord; OBJ_AFFINE_SETS],
}

impl UploadStreams {
    #[must_use]
    pub fn new(scene: &SceneDescriptor, memory: &FrameMemory<'_>) -> Self {
        Self {
            vram: memory.vram.to_vec(),
            bg_palette: memory.bg_palette.to_vec(),
            obj_palette: memory.obj_palette.to_vec(),
            oam: memory.oam.to_vec(),
            bg_params: scene.bg.each_ref().map(BgParamRecord::from),
            window: (&scene.window).into(),
            fx: FxRecord {
                bldcnt: scene.effect.bldcnt().into(),
                bldalpha: scene.effect.bldalpha().into(),
                bldy: scene.effect.bldy().into(),
                mosaic: scene.mosaic.to_register().into(),
            },
            scanlines: scene.scanlines.iter().map(ScanlineRecord::from).collect(),
            bg_affine: scene.bg_affine.map(|transform| AffineRecord {
                ref_x: transform.ref_x,
                ref_y: transform.ref_y,
                pa: transform.pa,
                pb: transform.pb,
                pc: transform.pc,
                pd: transform.pd,
            }),
            obj_affine: scene.obj_affine.map(|set| ObjAffineRecord {
                pa: set.pa,
                pb: set.pb,
                pc: set.pc,
                pd: set.pd,
            }),
        }
    }

    /// Raw bytes of one stream, as a backend would receive them.
    #[must_use]
    pub fn stream_bytes(&self, stream: StreamId) -> &[u8] {
        match stream {
            StreamId::Vram => &self.vram,
            StreamId::BgPalette => &self.bg_palette,
            StreamId::BgParams => bytemuck::cast_slice(&self.bg_params),
            StreamId::ObjPalette => &self.obj_palette,
            StreamId::Oam => &self.oam,
            StreamId::Window => bytemuck::bytes_of(&self.window),
            StreamId::Fx => bytemuck::bytes_of(&self.fx),
            StreamId::Scanlines => bytemuck::cast_slice(&self.scanlines),
            StreamId::BgAffine => bytemuck::cast_slice(&self.bg_affine),
            StreamId::ObjAffine => bytemuck::cast_slice(&self.obj_affine),
        }
    }

    /// Rebuild streams from raw bytes, e.g. as uploaded to a backend.
    ///
    /// # Errors
    ///
    /// Returns the offending stream if any stream has an invalid length.
    pub fn from_stream_bytes<'a>(
        mut get: impl FnMut(StreamId) -> &'a [u8],
    ) -> Result<Self, (StreamId, usize)> {
        let mut checked = |stream: StreamId| {
            let bytes = get(stream);
            if stream.accepts_len(bytes.len()) { Ok(bytes) } else { Err((stream, bytes.len())) }
        };

        let vram = checked(StreamId::Vram)?.to_vec();
        let bg_palette = checked(StreamId::BgPalette)?.to_vec();
        let bg_params = read_records(checked(StreamId::BgParams)?);
        let obj_palette = checked(StreamId::ObjPalette)?.to_vec();
        let oam = checked(StreamId::Oam)?.to_vec();
        let window = bytemuck::pod_read_unaligned(checked(StreamId::Window)?);
        let fx = bytemuck::pod_read_unaligned(checked(StreamId::Fx)?);
        let scanlines = checked(StreamId::Scanlines)?
            .chunks_exact(mem::size_of::<ScanlineRecord>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        let bg_affine = read_records(checked(StreamId::BgAffine)?);
        let obj_affine = read_records(checked(StreamId::ObjAffine)?);

        Ok(Self {
            vram,
            bg_palette,
            obj_palette,
            oam,
            bg_params,
            window,
            fx,
            scanlines,
            bg_affine,
            obj_affine,
        })
    }

    #[must_use]
    pub fn frame_memory(&self) -> FrameMemory<'_> {
        FrameMemory {
            vram: &self.vram,
            bg_palette: &self.bg_palette,
            obj_palette: &self.obj_palette,
            oam: &self.oam,
        }
    }

    /// Decode the record streams back into a scene descriptor.
    #[must_use]
    pub fn to_scene(&self) -> SceneDescriptor {
        SceneDescriptor {
            bg: self.bg_params.each_ref().map(BgLayer::from),
            window: (&self.window).into(),
            effect: ColorEffect::from_registers(
                self.fx.bldcnt as u16,
                self.fx.bldalpha as u16,
                self.fx.bldy as u16,
            ),
            mosaic: Mosaic::from_register(self.fx.mosaic as u16),
            scanlines: self.scanlines.iter().map(ScanlineOverride::from).collect(),
            bg_affine: self.bg_affine.map(|record| AffineTransform {
                ref_x: record.ref_x,
                ref_y: record.ref_y,
                pa: record.pa,
                pb: record.pb,
                pc: record.pc,
                pd: record.pd,
            }),
            obj_affine: self.obj_affine.map(|record| ObjAffineSet {
                pa: record.pa,
                pb: record.pb,
                pc: record.pc,
                pd: record.pd,
            }),
        }
    }
}

// Caller guarantees bytes.len() == N * size_of::<T>()
fn read_records<T: Pod + Default, const N: usize>(bytes: &[u8]) -> [T; N] {
    let size = mem::size_of::<T>();
    array::from_fn(|i| {
        bytes.get(i * size..(i + 1) * size).map(bytemuck::pod_read_unaligned).unwrap_or_default()
    })
}
