use super::*;
use test_log::test;

#[test]
fn bg_flag_bits() {
    let flags = BgFlags { affine: true, wrap: false, mosaic: true, eight_bpp: true };
    assert_eq!(flags.to_bits(), 0b1101);
    assert_eq!(BgFlags::from_bits(0b1101), flags);
    assert_eq!(BgFlags::from_bits(0xFFFF_FFF0), BgFlags::default());
}

#[test]
fn window_mask_bits() {
    let mask = WindowMask::from_bits(0x33);
    assert_eq!(mask.bg, [true, true, false, false]);
    assert!(mask.obj);
    assert!(mask.effect);
    assert_eq!(mask.to_bits(), 0x33);

    assert_eq!(WindowMask::from_bits(0x3F), WindowMask::ALL);
    assert_eq!(WindowMask::from_bits(0xC0), WindowMask::NONE);
}

#[test]
fn window_rect_clipping() {
    assert_eq!(WindowRect::new(8, 8, 112, 56).clipped(240, 160), WindowRect::new(8, 8, 112, 56));
    assert_eq!(
        WindowRect::new(200, 0, 255, 255).clipped(240, 160),
        WindowRect::new(200, 0, 240, 160)
    );

    // Inverted spans are empty rather than wrapping around the screen edge
    assert_eq!(WindowRect::new(100, 0, 50, 160).clipped(240, 160), WindowRect::EMPTY);
    assert_eq!(WindowRect::new(0, 170, 240, 180).clipped(240, 160), WindowRect::EMPTY);

    let rect = WindowRect::new(8, 8, 112, 56);
    assert!(rect.contains(8, 8));
    assert!(rect.contains(111, 55));
    assert!(!rect.contains(112, 8));
    assert!(!rect.contains(8, 56));
    assert!(WindowRect::EMPTY.is_empty());
}

#[test]
fn color_effect_registers() {
    let effect = ColorEffect::from_registers(0x3F42, 0x0A04, 9);
    assert_eq!(effect.mode, BlendMode::AlphaBlending);
    assert_eq!(effect.source.bg, [false, true, false, false]);
    assert!(!effect.source.obj);
    assert!(effect.target.backdrop);
    assert_eq!((effect.eva, effect.evb, effect.brightness), (4, 10, 9));
    assert_eq!(effect.bldcnt(), 0x3F42);
    assert_eq!(effect.bldalpha(), 0x0A04);
    assert_eq!(effect.bldy(), 9);
}

#[test]
fn blend_coefficients_clamp_to_16() {
    let effect = ColorEffect::from_registers(0, 0x1F1F, 0x1F);
    assert_eq!((effect.eva, effect.evb, effect.brightness), (16, 16, 16));

    // Bits above the 5-bit fields are ignored
    let effect = ColorEffect::from_registers(0, 0xE0E3, 0xFFE2);
    assert_eq!((effect.eva, effect.evb, effect.brightness), (3, 0, 2));
}

#[test]
fn mosaic_register() {
    let mosaic = Mosaic::from_register(0x3210);
    assert_eq!(mosaic, Mosaic { bg_width: 1, bg_height: 2, obj_width: 3, obj_height: 4 });
    assert_eq!(mosaic.to_register(), 0x3210);

    assert_eq!(Mosaic::from_register(0), Mosaic::OFF);
    assert_eq!(Mosaic::from_register(0xFFFF).bg_width, 16);
}

#[test]
fn line_state_without_overrides() {
    let mut scene = SceneDescriptor::empty(4);
    scene.bg[1].scroll_x = 17;
    scene.bg[1].scroll_y = 3;
    scene.window.win0 = WindowRect::new(0, 0, 250, 10);

    let line = scene.line_state(2, 240, 160);
    assert_eq!(line.scroll[1], (17, 3));
    assert_eq!(line.win0, WindowRect::new(0, 0, 240, 10));
    assert_eq!(line.effect, scene.effect);

    // Lines beyond the override table behave as inactive
    assert_eq!(scene.line_state(100, 240, 160).scroll[1], (17, 3));
}

#[test]
fn line_state_applies_each_override_part() {
    let mut scene = SceneDescriptor::empty(4);
    scene.bg[0].scroll_x = 5;
    scene.window.win0 = WindowRect::new(8, 8, 112, 56);
    scene.window.win1 = WindowRect::new(0, 0, 0, 0);

    scene.scanlines[1].scroll = Some(ScrollOverride { x: [0x3FF, 1, 2, 3], y: [4, 5, 6, 7] });
    scene.scanlines[2].window_x = Some(WindowXOverride {
        win0: WindowSpan { x1: 20, x2: 30 },
        win1: WindowSpan { x1: 40, x2: 50 },
    });
    let blend = ColorEffect::from_registers(0x00C1, 0, 4);
    scene.scanlines[3].blend = Some(blend);

    let line = scene.line_state(1, 240, 160);
    assert_eq!(line.scroll, [(0x1FF, 4), (1, 5), (2, 6), (3, 7)]);
    assert_eq!(line.win0, WindowRect::new(8, 8, 112, 56));

    let line = scene.line_state(2, 240, 160);
    assert_eq!(line.scroll[0], (5, 0));
    assert_eq!(line.win0, WindowRect::new(20, 8, 30, 56));
    // WIN1 has no lines, so its horizontal override has nothing to apply to
    assert_eq!(line.win1, WindowRect::EMPTY);
    assert_eq!(line.effect, scene.effect);

    assert_eq!(scene.line_state(3, 240, 160).effect, blend);
    assert!(scene.scanlines[3].is_active());
    assert!(!scene.scanlines[0].is_active());
}

#[test]
fn empty_scene() {
    let scene = SceneDescriptor::empty(160);
    assert_eq!(scene.scanlines.len(), 160);
    assert!(scene.bg.iter().all(|bg| !bg.enabled));
    assert_eq!(scene.window.outside_mask, WindowMask::ALL);
    assert_eq!(scene.effect.mode, BlendMode::None);
    assert_eq!(scene.obj_affine, [ObjAffineSet::IDENTITY; OBJ_AFFINE_SETS]);
}

#[test]
fn descriptor_bincode_round_trip() {
    let mut scene = SceneDescriptor::empty(2);
    scene.bg[2].flags = BgFlags { affine: true, wrap: true, ..BgFlags::default() };
    scene.bg_affine[2] = AffineTransform { ref_x: -1, ref_y: 2, pa: 3, pb: -4, pc: 5, pd: 6 };
    scene.scanlines[1].scroll = Some(ScrollOverride::default());

    let config = bincode::config::standard();
    let bytes = bincode::encode_to_vec(&scene, config).unwrap();
    let (decoded, len): (SceneDescriptor, usize) =
        bincode::decode_from_slice(&bytes, config).unwrap();
    assert_eq!(len, bytes.len());
    assert_eq!(decoded, scene);
}
