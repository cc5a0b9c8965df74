use super::*;
use crate::memory::Region;
use crate::scene::{
    AffineTransform, BgFlags, BgLayer, ColorEffect, Mosaic, ScanlineOverride, ScrollOverride,
    WindowRect, WindowSpan, WindowXOverride,
};
use test_log::test;

const WIDTH: u32 = 32;
const HEIGHT: u32 = 24;

const RED: u16 = 0x001F;
const GREEN: u16 = 0x03E0;
const BLUE: u16 = 0x7C00;
const WHITE: u16 = 0x7FFF;
const GRAY: u16 = 0x4210;

const BG_CHAR_BASE: u32 = 0;
const BG_SCREEN_BASE: u32 = 0x4000;
const OBJ_CHAR_BASE: u32 = 0x8000;

fn params() -> DispatchParams {
    DispatchParams {
        frame_size: FrameSize { width: WIDTH, height: HEIGHT },
        obj_char_base: OBJ_CHAR_BASE,
        ..DispatchParams::default()
    }
}

fn new_memory() -> MemoryMirror {
    let mut memory = MemoryMirror::new();
    for i in 0..obj::OAM_ENTRIES {
        memory.write_u16(Region::Oam, 8 * i, 0x0200);
    }
    memory.write_palette_color(Region::BgPalette, 0, GRAY);
    memory
}

fn render(scene: &SceneDescriptor, memory: &MemoryMirror) -> Vec<Color> {
    compose_frame(scene, &FrameMemory::from(memory), &params(), false)
}

fn at(frame: &[Color], x: u32, y: u32) -> Color {
    frame[(y * WIDTH + x) as usize]
}

fn rgb(color: u16) -> Color {
    bgr555_to_rgb8(color)
}

// Fill a 4bpp tile with a single color ID
fn solid_4bpp_tile(memory: &mut MemoryMirror, char_base: u32, tile: u32, color_id: u8) {
    let offset = (char_base + 32 * tile) as usize;
    memory.fill(Region::Vram, offset, 32, color_id | (color_id << 4));
}

// Point every entry of a 32x32 text map at one tile
fn fill_text_map(memory: &mut MemoryMirror, screen_base: u32, entry: u16) {
    for i in 0..32 * 32 {
        memory.write_u16(Region::Vram, (screen_base + 2 * i) as usize, entry);
    }
}

fn text_bg(char_base: u32, screen_base: u32, priority: u8) -> BgLayer {
    BgLayer {
        char_base,
        screen_base,
        scroll_x: 0,
        scroll_y: 0,
        priority,
        enabled: true,
        flags: BgFlags::default(),
    }
}

fn scene() -> SceneDescriptor {
    SceneDescriptor::empty(HEIGHT)
}

// BG0 covering the whole screen in `color`
fn solid_bg0(memory: &mut MemoryMirror, scene: &mut SceneDescriptor, color: u16, priority: u8) {
    memory.write_palette_color(Region::BgPalette, 1, color);
    solid_4bpp_tile(memory, BG_CHAR_BASE, 1, 1);
    fill_text_map(memory, BG_SCREEN_BASE, 1);
    scene.bg[0] = text_bg(BG_CHAR_BASE, BG_SCREEN_BASE, priority);
}

fn write_oam_entry(memory: &mut MemoryMirror, index: usize, attributes: [u16; 3]) {
    for (i, attribute) in attributes.into_iter().enumerate() {
        memory.write_u16(Region::Oam, 8 * index + 2 * i, attribute);
    }
}

// 8x8 4bpp sprite at (x, y) using OBJ tile `tile`
fn small_sprite(x: u16, y: u16, tile: u16, priority: u16) -> [u16; 3] {
    [y, x, tile | (priority << 10)]
}

#[test]
fn backdrop_fills_empty_scene() {
    let memory = new_memory();
    let frame = render(&scene(), &memory);

    assert_eq!(frame.len(), (WIDTH * HEIGHT) as usize);
    assert!(frame.iter().all(|&color| color == Color::rgb(132, 132, 132)));
}

#[test]
fn zero_sized_frame() {
    let memory = new_memory();
    let params = DispatchParams { frame_size: FrameSize { width: 0, height: 0 }, ..params() };
    let frame = compose_frame(&scene(), &FrameMemory::from(&memory), &params, true);
    assert!(frame.is_empty());
}

#[test]
fn color_zero_is_transparent_regardless_of_blend() {
    let mut memory = new_memory();
    let mut scene = scene();

    // Tile 0 is all zeroes; palette bank 1 entry 0 is white but must never show
    memory.write_palette_color(Region::BgPalette, 16, WHITE);
    fill_text_map(&mut memory, BG_SCREEN_BASE, 1 << 12);
    scene.bg[0] = text_bg(BG_CHAR_BASE, BG_SCREEN_BASE, 0);

    memory.write_palette_color(Region::ObjPalette, 0, WHITE);
    write_oam_entry(&mut memory, 0, small_sprite(0, 0, 0, 0));

    scene.effect = ColorEffect::from_registers(0x0001 | (1 << 6) | (0x3F << 8), 0x1010, 0);

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 0, 0), rgb(GRAY));
    assert_eq!(at(&frame, 20, 10), rgb(GRAY));
}

#[test]
fn win0_takes_precedence_over_win1() {
    let mut memory = new_memory();
    let mut scene = scene();
    solid_bg0(&mut memory, &mut scene, RED, 0);

    scene.window.win0 = WindowRect::new(0, 0, 8, 8);
    scene.window.win1 = WindowRect::new(0, 0, 16, 16);
    scene.window.win0_mask = WindowMask::NONE;
    scene.window.win1_mask = WindowMask::ALL;
    scene.window.outside_mask = WindowMask::NONE;

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 4, 4), rgb(GRAY));
    assert_eq!(at(&frame, 12, 12), rgb(RED));
    assert_eq!(at(&frame, 7, 12), rgb(RED));
    assert_eq!(at(&frame, 20, 20), rgb(GRAY));
}

#[test]
fn obj_window_sits_between_rect_windows_and_outside() {
    let mut memory = new_memory();
    let mut scene = scene();
    solid_bg0(&mut memory, &mut scene, RED, 0);

    // 16x16 OBJ-window sprite at (8, 8) with fully opaque tiles
    for tile in [0, 1, 32, 33] {
        solid_4bpp_tile(&mut memory, OBJ_CHAR_BASE, tile, 1);
    }
    write_oam_entry(&mut memory, 0, [8 | (2 << 10), 8 | (1 << 14), 0]);

    scene.window.win0 = WindowRect::new(0, 0, 12, 12);
    scene.window.win0_mask = WindowMask::ALL;
    scene.window.obj_window_mask = WindowMask::NONE;
    scene.window.outside_mask = WindowMask::ALL;

    let frame = render(&scene, &memory);
    // Inside WIN0 and the OBJ window: WIN0 wins
    assert_eq!(at(&frame, 10, 10), rgb(RED));
    // Inside the OBJ window only
    assert_eq!(at(&frame, 20, 20), rgb(GRAY));
    // Outside everything
    assert_eq!(at(&frame, 30, 4), rgb(RED));
    // OBJ-window sprites are never drawn themselves
    assert_eq!(at(&frame, 14, 14), rgb(GRAY));
}

#[test]
fn obj_beats_bg_at_equal_priority() {
    let mut memory = new_memory();
    let mut scene = scene();
    solid_bg0(&mut memory, &mut scene, RED, 1);

    memory.write_palette_color(Region::ObjPalette, 1, GREEN);
    solid_4bpp_tile(&mut memory, OBJ_CHAR_BASE, 0, 1);
    write_oam_entry(&mut memory, 0, small_sprite(0, 0, 0, 1));

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 3, 3), rgb(GREEN));
    assert_eq!(at(&frame, 8, 3), rgb(RED));

    // A BG with a lower priority value still beats the sprite
    scene.bg[0].priority = 0;
    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 3, 3), rgb(RED));
}

#[test]
fn lower_oam_index_wins_priority_ties() {
    let mut memory = new_memory();
    let scene = scene();

    memory.write_palette_color(Region::ObjPalette, 1, GREEN);
    memory.write_palette_color(Region::ObjPalette, 2, BLUE);
    solid_4bpp_tile(&mut memory, OBJ_CHAR_BASE, 0, 1);
    solid_4bpp_tile(&mut memory, OBJ_CHAR_BASE, 1, 2);

    write_oam_entry(&mut memory, 3, small_sprite(0, 0, 0, 2));
    write_oam_entry(&mut memory, 7, small_sprite(4, 0, 1, 2));

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 2, 2), rgb(GREEN));
    assert_eq!(at(&frame, 6, 2), rgb(GREEN));
    assert_eq!(at(&frame, 10, 2), rgb(BLUE));

    // A higher OAM index with a lower priority value wins
    write_oam_entry(&mut memory, 7, small_sprite(4, 0, 1, 1));
    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 6, 2), rgb(BLUE));
}

#[test]
fn lower_bg_wins_priority_ties() {
    let mut memory = new_memory();
    let mut scene = scene();
    solid_bg0(&mut memory, &mut scene, RED, 2);

    memory.write_palette_color(Region::BgPalette, 2, BLUE);
    solid_4bpp_tile(&mut memory, 0x2000, 1, 2);
    fill_text_map(&mut memory, 0x6000, 1);
    scene.bg[1] = text_bg(0x2000, 0x6000, 2);

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 5, 5), rgb(RED));

    scene.bg[0].enabled = false;
    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 5, 5), rgb(BLUE));
}

#[test]
fn text_bg_flips() {
    let mut memory = new_memory();
    let mut scene = scene();

    memory.write_palette_color(Region::BgPalette, 1, RED);
    memory.write_palette_color(Region::BgPalette, 2, BLUE);
    // Tile 1: leftmost column and top row red, everything else blue
    solid_4bpp_tile(&mut memory, BG_CHAR_BASE, 1, 2);
    for row in 0..8 {
        memory.write_u8(Region::Vram, (BG_CHAR_BASE + 32 + 4 * row) as usize, 0x21);
    }
    memory.fill(Region::Vram, (BG_CHAR_BASE + 32) as usize, 4, 0x11);

    fill_text_map(&mut memory, BG_SCREEN_BASE, 1);
    memory.write_u16(Region::Vram, (BG_SCREEN_BASE + 2) as usize, 1 | (1 << 10));
    memory.write_u16(Region::Vram, (BG_SCREEN_BASE + 4) as usize, 1 | (1 << 11));
    scene.bg[0] = text_bg(BG_CHAR_BASE, BG_SCREEN_BASE, 0);

    let frame = render(&scene, &memory);
    // Unflipped
    assert_eq!(at(&frame, 0, 3), rgb(RED));
    assert_eq!(at(&frame, 7, 3), rgb(BLUE));
    // H-flipped
    assert_eq!(at(&frame, 8, 3), rgb(BLUE));
    assert_eq!(at(&frame, 15, 3), rgb(RED));
    // V-flipped
    assert_eq!(at(&frame, 20, 0), rgb(BLUE));
    assert_eq!(at(&frame, 20, 7), rgb(RED));
}

#[test]
fn text_bg_scroll_wraps_around_map() {
    let mut memory = new_memory();
    let mut scene = scene();
    memory.write_palette_color(Region::BgPalette, 1, RED);
    solid_4bpp_tile(&mut memory, BG_CHAR_BASE, 1, 1);

    // Only map entry (31, 31) is opaque
    memory.write_u16(Region::Vram, (BG_SCREEN_BASE + 2 * (31 * 32 + 31)) as usize, 1);
    scene.bg[0] =
        BgLayer { scroll_x: 248, scroll_y: 248, ..text_bg(BG_CHAR_BASE, BG_SCREEN_BASE, 0) };

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 0, 0), rgb(RED));
    assert_eq!(at(&frame, 7, 7), rgb(RED));
    assert_eq!(at(&frame, 8, 0), rgb(GRAY));
    assert_eq!(at(&frame, 0, 8), rgb(GRAY));
}

#[test]
fn scanline_scroll_override_applies_to_one_line() {
    let mut memory = new_memory();
    let mut scene = scene();
    memory.write_palette_color(Region::BgPalette, 1, RED);
    solid_4bpp_tile(&mut memory, BG_CHAR_BASE, 1, 1);
    memory.write_u16(Region::Vram, BG_SCREEN_BASE as usize, 1);
    scene.bg[0] = text_bg(BG_CHAR_BASE, BG_SCREEN_BASE, 0);

    let mut scroll = ScrollOverride::default();
    scroll.x[0] = 4;
    scene.scanlines[2] = ScanlineOverride { scroll: Some(scroll), ..ScanlineOverride::INACTIVE };

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 5, 1), rgb(RED));
    assert_eq!(at(&frame, 9, 1), rgb(GRAY));
    assert_eq!(at(&frame, 3, 2), rgb(RED));
    assert_eq!(at(&frame, 4, 2), rgb(GRAY));
    assert_eq!(at(&frame, 7, 3), rgb(RED));
    assert_eq!(at(&frame, 9, 3), rgb(GRAY));
}

#[test]
fn scanline_window_and_blend_overrides() {
    let mut memory = new_memory();
    let mut scene = scene();
    solid_bg0(&mut memory, &mut scene, RED, 0);

    scene.window.win0 = WindowRect::new(0, 0, 8, HEIGHT);
    scene.window.win0_mask = WindowMask::NONE;

    let window_x = WindowXOverride {
        win0: WindowSpan { x1: 16, x2: 24 },
        win1: WindowSpan::default(),
    };
    scene.scanlines[5] =
        ScanlineOverride { window_x: Some(window_x), ..ScanlineOverride::INACTIVE };

    // Darken BG0 fully on line 6 only
    let darken = ColorEffect::from_registers(0x0001 | (3 << 6), 0, 16);
    scene.scanlines[6] = ScanlineOverride { blend: Some(darken), ..ScanlineOverride::INACTIVE };

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 4, 4), rgb(GRAY));
    assert_eq!(at(&frame, 20, 4), rgb(RED));
    assert_eq!(at(&frame, 4, 5), rgb(RED));
    assert_eq!(at(&frame, 20, 5), rgb(GRAY));
    assert_eq!(at(&frame, 20, 6), Color::rgb(0, 0, 0));
    assert_eq!(at(&frame, 20, 7), rgb(RED));
}

#[test]
fn bg_mosaic_blocks_sample_one_texel() {
    let mut memory = new_memory();
    let mut scene = scene();

    // Tile 1 has a different color in every column
    for color_id in 1..=8 {
        memory.write_palette_color(Region::BgPalette, color_id, (color_id as u16) * 0x0C63);
    }
    for row in 0..8 {
        for pair in 0..4 {
            let byte = (2 * pair + 1) | ((2 * pair + 2) << 4);
            let offset = BG_CHAR_BASE + 32 + 4 * row + pair;
            memory.write_u8(Region::Vram, offset as usize, byte as u8);
        }
    }
    fill_text_map(&mut memory, BG_SCREEN_BASE, 1);

    scene.bg[0] = BgLayer {
        flags: BgFlags { mosaic: true, ..BgFlags::default() },
        ..text_bg(BG_CHAR_BASE, BG_SCREEN_BASE, 0)
    };
    scene.mosaic = Mosaic { bg_width: 4, bg_height: 4, ..Mosaic::OFF };

    let frame = render(&scene, &memory);
    for by in (0..HEIGHT).step_by(4) {
        for bx in (0..WIDTH).step_by(4) {
            let origin = at(&frame, bx, by);
            for y in by..by + 4 {
                for x in bx..bx + 4 {
                    assert_eq!(at(&frame, x, y), origin, "({x}, {y}) in block ({bx}, {by})");
                }
            }
        }
    }
    assert_ne!(at(&frame, 0, 0), at(&frame, 4, 0));
}

#[test]
fn obj_mosaic_snaps_screen_coordinates() {
    let mut memory = new_memory();
    let mut scene = scene();
    scene.mosaic = Mosaic { obj_width: 4, obj_height: 4, ..Mosaic::OFF };

    memory.write_palette_color(Region::ObjPalette, 1, GREEN);
    solid_4bpp_tile(&mut memory, OBJ_CHAR_BASE, 0, 1);
    // 8x8 mosaic sprite at (2, 2): blocks start at 0, 4, 8
    write_oam_entry(&mut memory, 0, [2 | (1 << 12), 2, 0]);

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 3, 3), rgb(GRAY));
    assert_eq!(at(&frame, 4, 4), rgb(GREEN));
    assert_eq!(at(&frame, 9, 9), rgb(GREEN));
    assert_eq!(at(&frame, 11, 11), rgb(GREEN));
    assert_eq!(at(&frame, 12, 12), rgb(GRAY));
}

#[test]
fn alpha_blend_math() {
    let mut memory = new_memory();
    let mut scene = scene();
    solid_bg0(&mut memory, &mut scene, RED, 0);

    memory.write_palette_color(Region::BgPalette, 2, BLUE);
    solid_4bpp_tile(&mut memory, 0x2000, 1, 2);
    fill_text_map(&mut memory, 0x6000, 1);
    scene.bg[1] = text_bg(0x2000, 0x6000, 1);

    // BG0 1st target, BG1 2nd target, 8/16 each
    scene.effect = ColorEffect::from_registers(0x0001 | (1 << 6) | (0x02 << 8), 0x0808, 0);
    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 0, 0), Color::rgb(123, 0, 123));

    // No blending when the layer underneath is not a 2nd target
    scene.effect.target = BlendTargets::default();
    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 0, 0), rgb(RED));

    // Sums saturate at 31
    scene.effect = ColorEffect::from_registers(0x0001 | (1 << 6) | (0x02 << 8), 0x1010, 0);
    memory.write_palette_color(Region::BgPalette, 2, RED);
    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 0, 0), rgb(RED));
}

#[test]
fn brightness_math() {
    let mut memory = new_memory();
    let mut scene = scene();
    solid_bg0(&mut memory, &mut scene, WHITE, 0);

    scene.effect = ColorEffect::from_registers(0x0001 | (3 << 6), 0, 8);
    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 0, 0), Color::rgb(132, 132, 132));

    memory.write_palette_color(Region::BgPalette, 1, 0);
    scene.effect = ColorEffect::from_registers(0x0001 | (2 << 6), 0, 8);
    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 0, 0), Color::rgb(123, 123, 123));

    // Effect disabled by the window
    scene.window.outside_mask.effect = false;
    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 0, 0), Color::rgb(0, 0, 0));
}

#[test]
fn backdrop_can_be_a_blend_source() {
    let memory = new_memory();
    let mut scene = scene();
    scene.effect = ColorEffect::from_registers((1 << 5) | (3 << 6), 0, 16);

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 0, 0), Color::rgb(0, 0, 0));
}

#[test]
fn semi_transparent_obj_forces_alpha_blending() {
    let mut memory = new_memory();
    let mut scene = scene();
    solid_bg0(&mut memory, &mut scene, GREEN, 1);

    memory.write_palette_color(Region::ObjPalette, 1, 0x7C1F);
    solid_4bpp_tile(&mut memory, OBJ_CHAR_BASE, 0, 1);
    write_oam_entry(&mut memory, 0, [1 << 10, 0, 0]);

    // Brighten mode with no 1st targets; BG0 is a 2nd target
    scene.effect = ColorEffect::from_registers((2 << 6) | (0x01 << 8), 0x0808, 16);

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 0, 0), Color::rgb(123, 123, 123));
    // BG0 outside the sprite is not a 1st target
    assert_eq!(at(&frame, 8, 0), rgb(GREEN));
}

#[test]
fn affine_bg_wrap_and_clip() {
    let mut memory = new_memory();
    let mut scene = scene();

    memory.write_palette_color(Region::BgPalette, 4, RED);
    // 8bpp tile 1 all color 4; map byte (0, 0) points at it, everything else at tile 0
    memory.fill(Region::Vram, (BG_CHAR_BASE + 64) as usize, 64, 4);
    memory.write_u8(Region::Vram, BG_SCREEN_BASE as usize, 1);

    scene.bg[2] = BgLayer {
        flags: BgFlags { affine: true, ..BgFlags::default() },
        ..text_bg(BG_CHAR_BASE, BG_SCREEN_BASE, 0)
    };
    // Shift the view 252 pixels right: screen x 4.. lands past the 256-pixel map edge
    scene.bg_affine[2] = AffineTransform { ref_x: 252 << 8, ..AffineTransform::IDENTITY };

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 2, 2), rgb(GRAY));
    assert_eq!(at(&frame, 6, 2), rgb(GRAY));

    scene.bg[2].flags.wrap = true;
    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 2, 2), rgb(GRAY));
    assert_eq!(at(&frame, 4, 2), rgb(RED));
    assert_eq!(at(&frame, 11, 7), rgb(RED));
    assert_eq!(at(&frame, 12, 2), rgb(GRAY));
}

#[test]
fn affine_bg_scaling() {
    let mut memory = new_memory();
    let mut scene = scene();

    memory.write_palette_color(Region::BgPalette, 4, RED);
    memory.fill(Region::Vram, (BG_CHAR_BASE + 64) as usize, 64, 4);
    memory.write_u8(Region::Vram, BG_SCREEN_BASE as usize, 1);

    scene.bg[2] = BgLayer {
        flags: BgFlags { affine: true, ..BgFlags::default() },
        ..text_bg(BG_CHAR_BASE, BG_SCREEN_BASE, 0)
    };
    // Half-size step: one texel per two screen pixels
    scene.bg_affine[2] = AffineTransform { pa: 0x80, pd: 0x80, ..AffineTransform::IDENTITY };

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 15, 15), rgb(RED));
    assert_eq!(at(&frame, 16, 0), rgb(GRAY));
}

#[test]
fn affine_double_size_sprite_is_centered() {
    let mut memory = new_memory();
    let scene = scene();

    memory.write_palette_color(Region::ObjPalette, 1, GREEN);
    solid_4bpp_tile(&mut memory, OBJ_CHAR_BASE, 0, 1);
    // 8x8 affine double-size sprite at (0, 0), identity matrix set 0
    write_oam_entry(&mut memory, 0, [(1 << 8) | (1 << 9), 0, 0]);

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 3, 3), rgb(GRAY));
    assert_eq!(at(&frame, 4, 4), rgb(GREEN));
    assert_eq!(at(&frame, 11, 11), rgb(GREEN));
    assert_eq!(at(&frame, 12, 12), rgb(GRAY));
}

#[test]
fn hidden_and_invalid_sprites_are_skipped() {
    let mut memory = new_memory();
    let scene = scene();

    memory.write_palette_color(Region::ObjPalette, 1, GREEN);
    solid_4bpp_tile(&mut memory, OBJ_CHAR_BASE, 0, 1);
    write_oam_entry(&mut memory, 0, [0x0200, 0, 0]);
    write_oam_entry(&mut memory, 1, [3 << 10, 0, 0]);

    let frame = render(&scene, &memory);
    assert_eq!(at(&frame, 2, 2), rgb(GRAY));
}

#[test]
fn obj_tile_mapping_row_stride() {
    let mut memory = new_memory();
    let scene = scene();

    memory.write_palette_color(Region::ObjPalette, 1, GREEN);
    memory.write_palette_color(Region::ObjPalette, 2, BLUE);
    solid_4bpp_tile(&mut memory, OBJ_CHAR_BASE, 0, 1);
    solid_4bpp_tile(&mut memory, OBJ_CHAR_BASE, 2, 1);
    solid_4bpp_tile(&mut memory, OBJ_CHAR_BASE, 32, 2);
    // 16x16 square sprite at (0, 0)
    write_oam_entry(&mut memory, 0, [0, 1 << 14, 0]);

    let two_d = compose_frame(&scene, &FrameMemory::from(&memory), &params(), false);
    assert_eq!(at(&two_d, 2, 10), rgb(BLUE));

    let one_d_params =
        DispatchParams { obj_tile_mapping: ObjTileMapping::OneDimensional, ..params() };
    let one_d = compose_frame(&scene, &FrameMemory::from(&memory), &one_d_params, false);
    assert_eq!(at(&one_d, 2, 10), rgb(GREEN));
}

#[test]
fn out_of_range_addresses_are_transparent() {
    let mut memory = new_memory();
    let mut scene = scene();
    fill_text_map(&mut memory, BG_SCREEN_BASE, 0x3FF);

    scene.bg[0] = text_bg(u32::MAX - 4, BG_SCREEN_BASE, 0);
    scene.bg[1] = text_bg(BG_CHAR_BASE, 0x17FFF, 0);
    scene.bg[2] = BgLayer {
        flags: BgFlags { affine: true, wrap: true, ..BgFlags::default() },
        ..text_bg(0x17FF0, 0x17FF0, 0)
    };
    scene.bg_affine[2] =
        AffineTransform { ref_x: i32::MIN, ref_y: i32::MAX, ..AffineTransform::IDENTITY };

    let params = DispatchParams { obj_char_base: u32::MAX, ..params() };
    write_oam_entry(&mut memory, 0, [0, 0, 0x3FF]);

    let frame = compose_frame(&scene, &FrameMemory::from(&memory), &params, true);
    assert!(frame.iter().all(|&color| color == rgb(GRAY)));
}

#[test]
fn parallel_matches_sequential() {
    let mut memory = new_memory();
    let mut scene = scene();
    solid_bg0(&mut memory, &mut scene, RED, 1);
    scene.window.win0 = WindowRect::new(3, 5, 17, 19);
    scene.window.win0_mask = WindowMask::from_bits(0x30);
    scene.effect = ColorEffect::from_registers(0x0001 | (2 << 6), 0, 9);

    let memory_view = FrameMemory::from(&memory);
    let sequential = compose_frame(&scene, &memory_view, &params(), false);
    let parallel = compose_frame(&scene, &memory_view, &params(), true);
    assert_eq!(sequential, parallel);
}

#[test]
fn dispatch_params_follow_dispcnt_unless_overridden() {
    let mut registers = RegisterFile::new();
    let mut config = RenderConfig::default();

    assert_eq!(
        DispatchParams::new(&config, &registers).obj_tile_mapping,
        ObjTileMapping::TwoDimensional
    );

    registers.write_dispcnt(1 << 6);
    assert_eq!(
        DispatchParams::new(&config, &registers).obj_tile_mapping,
        ObjTileMapping::OneDimensional
    );

    config.obj_tile_mapping = Some(ObjTileMapping::TwoDimensional);
    assert_eq!(
        DispatchParams::new(&config, &registers).obj_tile_mapping,
        ObjTileMapping::TwoDimensional
    );
}

#[test]
fn oam_entry_parsing() {
    let entry = OamEntry::parse([0x2000 | 0x1000 | (1 << 10) | (1 << 14) | 0x55, 0xD1FF, 0x7C05]);
    assert_eq!(entry.y, 0x55);
    assert_eq!(entry.x, 0x1FF);
    assert!(entry.eight_bpp);
    assert!(entry.mosaic);
    assert_eq!(entry.mode, obj::SpriteMode::SemiTransparent);
    assert_eq!((entry.width, entry.height), (64, 32));
    assert!(entry.h_flip);
    assert!(!entry.v_flip);
    assert_eq!(entry.tile_number, 5);
    assert_eq!(entry.priority, 3);
    assert_eq!(entry.palette, 7);
    assert!(!entry.affine);
    assert!(!entry.disabled);

    let affine = OamEntry::parse([(1 << 8) | (1 << 9), (1 << 12) | (5 << 9), 0]);
    assert!(affine.affine_double_size);
    assert!(!affine.disabled);
    assert!(!affine.h_flip);
    // Bit 12 belongs to the affine parameter group rather than H-flip
    assert_eq!(affine.affine_parameter_group, 13);
    assert_eq!(affine.bounds(), (16, 16));
}
