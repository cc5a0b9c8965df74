//! Self-contained demo frame exercising every compositor stage
//!
//! Memory is populated the way game code would do it, through the legacy register/DMA surface.
//! The scene is built directly, including a per-line scroll override that extraction alone
//! cannot produce.


use crate::compositor::{DispatchParams, FrameMemory};
use crate::hardware::Hardware;
use crate::legacy::{OAM, VRAM};
use crate::memory::MemoryMirror;
use crate::scene::{
    AffineTransform, BgFlags, BgLayer, ColorEffect, Mosaic, ObjAffineSet, ScanlineOverride,
    SceneDescriptor, ScrollOverride, WindowMask, WindowRect, WindowState,
};
use agb_common::frame::FrameSize;

const CHAR_BASES: [u32; 4] = [0, 8 * 1024, 16 * 1024, 24 * 1024];
const SCREEN_BASES: [u32; 4] = [64 * 1024, 72 * 1024, 80 * 1024, 88 * 1024];
const OBJ_CHAR_BASE: u32 = 32 * 1024;

const MAP_TILES: u32 = 32;

const BG0_SCROLL: (u16, u16) = (12, 7);
const BG1_SCROLL: (u16, u16) = (100, 32);

// 10x10 tile patch of red in BG1's map
const RED_PATCH_ORIGIN: (u32, u32) = (10, 5);
const RED_PATCH_TILES: u32 = 10;

/// Backdrop gray
pub const BACKDROP_COLOR: u16 = 0x4210;

const BG_PALETTE: [(u32, u16); 7] = [
    (0, BACKDROP_COLOR),
    (1, 0x0000),      // black
    (2, 0x7FFF),      // white
    (3, 0x001F),      // red
    (4, 0x03FF),      // yellow
    (16 + 1, 0x03E0), // green
    (16 + 2, 0x7C00), // blue
];

const OBJ_PALETTE: [(u32, u16); 3] = [
    (0, 0x0000),
    (1, 0x7C1F), // magenta
    (2, 0x7FE0), // cyan
];

/// Memory, scene, and dispatch parameters for one demo frame.
#[derive(Debug, Clone)]
pub struct DemoFrame {
    pub memory: MemoryMirror,
    pub scene: SceneDescriptor,
    pub params: DispatchParams,
}

impl DemoFrame {
    #[must_use]
    pub fn new() -> Self {
        let params = DispatchParams {
            frame_size: FrameSize::AGB,
            map_width_tiles: MAP_TILES,
            map_height_tiles: MAP_TILES,
            obj_char_base: OBJ_CHAR_BASE,
            ..DispatchParams::default()
        };

        Self { memory: demo_memory(), scene: demo_scene(params.frame_size.height), params }
    }

    #[must_use]
    pub fn frame_memory(&self) -> FrameMemory<'_> {
        FrameMemory::from(&self.memory)
    }
}

impl Default for DemoFrame {
    fn default() -> Self {
        Self::new()
    }
}

/// VRAM, palettes, and OAM for the demo frame.
#[must_use]
pub fn demo_memory() -> MemoryMirror {
    let mut hardware = Hardware::new();
    let mut io = hardware.io();

    // BG0: 4bpp tile 0 all color 1, tile 1 all color 2
    io.dma3_fill(0x1111, VRAM + CHAR_BASES[0], 16);
    io.dma3_fill(0x2222, VRAM + CHAR_BASES[0] + 32, 16);

    // BG1: tile 0 all red, tile 1 left transparent
    io.dma3_fill(0x3333, VRAM + CHAR_BASES[1], 16);

    // BG2: one 8bpp tile, 2x2-pixel checker of colors 1 and 4
    let checker: Vec<u8> = (0..64)
        .map(|i| {
            let (x, y) = (i % 8, i / 8);
            if ((y / 2) ^ (x / 2)) & 1 != 0 { 1 } else { 4 }
        })
        .collect();
    io.dma3_copy(&checker, VRAM + CHAR_BASES[2], checker.len() / 2);

    // OBJ: 4bpp tiles 0-3 all color 1, 8bpp tiles 16-19 all color 2
    io.dma3_fill(0x1111, VRAM + OBJ_CHAR_BASE, 4 * 16);
    io.dma3_fill(0x0202, VRAM + OBJ_CHAR_BASE + 16 * 64, 4 * 32);

    let bg0_map = text_map(|tx, ty| {
        let tile = (tx + ty) & 1;
        let palette = tx & 1;
        (tile | (palette << 12)) as u16
    });
    io.dma3_copy(&bg0_map, VRAM + SCREEN_BASES[0], bg0_map.len() / 2);

    let bg1_map = text_map(|tx, ty| {
        let (px, py) = (tx.wrapping_sub(RED_PATCH_ORIGIN.0), ty.wrapping_sub(RED_PATCH_ORIGIN.1));
        if px >= RED_PATCH_TILES || py >= RED_PATCH_TILES {
            return 1;
        }

        // Flip alternate tiles; the solid tile must look identical either way
        let h_flip = u16::from(px & 1 != 0) << 10;
        let v_flip = u16::from(py & 1 != 0) << 11;
        h_flip | v_flip
    });
    io.dma3_copy(&bg1_map, VRAM + SCREEN_BASES[1], bg1_map.len() / 2);

    // BG2's affine map is all tile 0, which is already zeroed

    for (index, color) in BG_PALETTE {
        io.set_bg_color(index, color);
    }
    for (index, color) in OBJ_PALETTE {
        io.set_obj_color(index, color);
    }

    write_oam(&mut hardware);

    hardware.memory
}

fn text_map(entry: impl Fn(u32, u32) -> u16) -> Vec<u8> {
    (0..MAP_TILES * MAP_TILES)
        .flat_map(|i| entry(i % MAP_TILES, i / MAP_TILES).to_le_bytes())
        .collect()
}

fn write_oam(hardware: &mut Hardware) {
    // Hide everything first
    for i in 0..128 {
        hardware.write_u16(OAM + 8 * i, 0x0200);
    }

    let sprites: [[u16; 3]; 4] = [
        // 16x16 4bpp, color 1, priority 1
        [12, 12 | (1 << 14), 1 << 10],
        // 16x16 OBJ-window sprite
        [18 | (2 << 10), 18 | (1 << 14), 1 << 10],
        // 16x16 8bpp, affine set 0, double size, semi-transparent, mosaic
        [
            24 | (1 << 8) | (1 << 9) | (1 << 10) | (1 << 12) | (1 << 13),
            44 | (1 << 14),
            16 | (1 << 10),
        ],
        // 32x16 4bpp
        [40 | (1 << 14), 24 | (2 << 14), 1 << 10],
    ];

    for (i, attributes) in (0..).zip(sprites) {
        for (j, attribute) in (0..).zip(attributes) {
            hardware.write_u16(OAM + 8 * i + 2 * j, attribute);
        }
    }
}

/// 8.8 fixed point, rounded to nearest
fn fx8(value: f32) -> i32 {
    (value * 256.0).round() as i32
}

fn rotation(degrees: f32, scale: f32) -> [i32; 4] {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (sin, cos) = (sin * scale, cos * scale);
    [fx8(cos), fx8(-sin), fx8(sin), fx8(cos)]
}

/// The demo scene with `height` scanlines.
#[must_use]
pub fn demo_scene(height: u32) -> SceneDescriptor {
    let mut scene = SceneDescriptor::empty(height);

    scene.bg[0] = BgLayer {
        char_base: CHAR_BASES[0],
        screen_base: SCREEN_BASES[0],
        scroll_x: BG0_SCROLL.0,
        scroll_y: BG0_SCROLL.1,
        priority: 2,
        enabled: true,
        flags: BgFlags::default(),
    };
    scene.bg[1] = BgLayer {
        char_base: CHAR_BASES[1],
        screen_base: SCREEN_BASES[1],
        scroll_x: BG1_SCROLL.0,
        scroll_y: BG1_SCROLL.1,
        priority: 1,
        enabled: true,
        flags: BgFlags { mosaic: true, ..BgFlags::default() },
    };
    scene.bg[2] = BgLayer {
        char_base: CHAR_BASES[2],
        screen_base: SCREEN_BASES[2],
        priority: 1,
        enabled: true,
        flags: BgFlags { affine: true, wrap: true, ..BgFlags::default() },
        ..BgLayer::default()
    };
    scene.bg[3] = BgLayer {
        char_base: CHAR_BASES[3],
        screen_base: SCREEN_BASES[3],
        priority: 3,
        enabled: false,
        ..BgLayer::default()
    };

    // WIN0 brightens BG1; the OBJ window shows BG0 only
    scene.window = WindowState {
        win0: WindowRect::new(8, 8, 112, 56),
        win1: WindowRect::EMPTY,
        win0_mask: WindowMask::from_bits(0x33),
        win1_mask: WindowMask::NONE,
        outside_mask: WindowMask::from_bits(0x1F),
        obj_window_mask: WindowMask::from_bits(0x21),
    };

    scene.effect = ColorEffect::from_registers((1 << 1) | (2 << 6), 8 | (8 << 8), 8);
    scene.mosaic = Mosaic::from_register(0x3333);

    // BG0 sways horizontally with a small sine wave
    for (y, line) in (0..).zip(&mut scene.scanlines) {
        let phase = y as f32 * std::f32::consts::PI / 16.0;
        let sway = (4.0 * phase.sin()) as i32;
        let bg0_x = (i32::from(BG0_SCROLL.0) + sway) as u16;

        *line = ScanlineOverride {
            scroll: Some(ScrollOverride {
                x: [bg0_x, BG1_SCROLL.0, 0, 0],
                y: [BG0_SCROLL.1, BG1_SCROLL.1, 0, 0],
            }),
            ..ScanlineOverride::INACTIVE
        };
    }

    // BG2 rotated 30 degrees at 0.75 scale, screen center mapped to map center
    let [pa, pb, pc, pd] = rotation(30.0, 0.75);
    let (screen_x, screen_y) = (120, 80);
    let map_center = ((MAP_TILES * 8 / 2) as i32) << 8;
    scene.bg_affine[2] = AffineTransform {
        ref_x: map_center - pa * screen_x - pb * screen_y,
        ref_y: map_center - pc * screen_x - pd * screen_y,
        pa,
        pb,
        pc,
        pd,
    };

    let [pa, pb, pc, pd] = rotation(30.0, 1.0);
    scene.obj_affine[0] = ObjAffineSet { pa, pb, pc, pd };

    scene
}
