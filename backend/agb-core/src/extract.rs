//! Hardware state → [`SceneDescriptor`]
//!
//! Extraction is a pure function of its inputs: the same memory and register contents always
//! produce an identical descriptor.


use crate::hardware::Hardware;
use crate::memory::{MemoryMirror, Region};
use crate::registers::{AffineOverflowBehavior, BitsPerPixel, RegisterFile};
use crate::scene::{
    AffineTransform, BgFlags, BgLayer, ColorEffect, Mosaic, OBJ_AFFINE_SETS, ObjAffineSet,
    ScanlineOverride, SceneDescriptor, WindowMask, WindowRect, WindowState,
};
use agb_common::frame::FrameSize;
use agb_config::{AffineInference, ObjAffineSource, RenderConfig};
use std::array;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractOptions {
    pub frame_size: FrameSize,
    pub affine_inference: AffineInference,
    pub obj_affine_source: ObjAffineSource,
}

impl From<&RenderConfig> for ExtractOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            frame_size: config.frame_size,
            affine_inference: config.affine_inference,
            obj_affine_source: config.obj_affine_source,
        }
    }
}

/// Convert a 28.8 reference point coordinate to the compositor's scale.
///
/// This is an arithmetic shift, so negative coordinates round towards negative infinity.
#[inline]
#[must_use]
pub fn rescale_reference_point(value: i32) -> i32 {
    value >> 20
}

#[must_use]
pub fn extract_scene(
    memory: &MemoryMirror,
    registers: &RegisterFile,
    options: &ExtractOptions,
) -> SceneDescriptor {
    let FrameSize { width, height } = options.frame_size;

    let scene = SceneDescriptor {
        bg: array::from_fn(|bg| extract_bg_layer(registers, bg, options.affine_inference)),
        window: extract_window_state(registers, width, height),
        effect: ColorEffect::from_registers(
            registers.read_bldcnt(),
            registers.read_bldalpha(),
            registers.blend_brightness.into(),
        ),
        mosaic: Mosaic::from_register(registers.mosaic),
        scanlines: vec![ScanlineOverride::INACTIVE; height as usize],
        bg_affine: array::from_fn(|bg| extract_bg_affine(registers, bg)),
        obj_affine: match options.obj_affine_source {
            ObjAffineSource::Registers => registers.obj_affine,
            ObjAffineSource::Oam => obj_affine_from_oam(memory),
        },
    };

    log::trace!("Extracted scene: BG layers {:?}", scene.bg);
    log::trace!("  Window state: {:?}", scene.window);
    log::trace!("  Color effect: {:?}", scene.effect);

    scene
}

impl Hardware {
    /// Snapshot the current state as a scene descriptor.
    #[must_use]
    pub fn snapshot(&self, options: &ExtractOptions) -> SceneDescriptor {
        extract_scene(&self.memory, &self.registers, options)
    }
}

fn extract_bg_layer(registers: &RegisterFile, bg: usize, inference: AffineInference) -> BgLayer {
    let control = registers.bg_control[bg];
    let mode = registers.bg_mode;

    let (affine, present) = match inference {
        AffineInference::AlwaysAffine => (bg >= 2, true),
        AffineInference::DisplayMode => {
            if mode.is_bitmap() && registers.bg_enabled[bg] {
                log::warn!("BG{bg} enabled in bitmap mode {mode:?}, which is not supported");
            }
            (mode.bg_is_affine_in_mode(bg), mode.bg_active_in_mode(bg) && !mode.is_bitmap())
        }
    };

    BgLayer {
        char_base: control.char_base,
        screen_base: control.screen_base,
        scroll_x: registers.bg_h_scroll[bg],
        scroll_y: registers.bg_v_scroll[bg],
        priority: control.priority,
        enabled: registers.bg_enabled[bg] && present,
        flags: BgFlags {
            affine,
            wrap: control.affine_overflow == AffineOverflowBehavior::Wrap,
            mosaic: control.mosaic,
            eight_bpp: control.bpp == BitsPerPixel::Eight,
        },
    }
}

fn extract_bg_affine(registers: &RegisterFile, bg: usize) -> AffineTransform {
    match registers.bg_affine_parameters(bg) {
        Some(parameters) => AffineTransform {
            ref_x: rescale_reference_point(parameters.reference_x),
            ref_y: rescale_reference_point(parameters.reference_y),
            pa: parameters.a,
            pb: parameters.b,
            pc: parameters.c,
            pd: parameters.d,
        },
        None => AffineTransform::IDENTITY,
    }
}

fn extract_window_state(registers: &RegisterFile, width: u32, height: u32) -> WindowState {
    let window_rect = |window: usize| {
        if !registers.window_enabled[window] {
            return WindowRect::EMPTY;
        }

        WindowRect::new(
            registers.window_x1[window].into(),
            registers.window_y1[window].into(),
            registers.window_x2[window].into(),
            registers.window_y2[window].into(),
        )
        .clipped(width, height)
    };

    let any_window_enabled =
        registers.window_enabled.contains(&true) || registers.obj_window_enabled;

    // With every window disabled, every layer and effect is visible everywhere
    let outside_mask = if any_window_enabled { registers.window_out } else { WindowMask::ALL };
    let obj_window_mask =
        if registers.obj_window_enabled { registers.obj_window } else { outside_mask };

    let mut state = WindowState {
        win0: window_rect(0),
        win1: window_rect(1),
        win0_mask: registers.window_in[0],
        win1_mask: registers.window_in[1],
        outside_mask,
        obj_window_mask,
    };

    if !registers.obj_enabled {
        for mask in [
            &mut state.win0_mask,
            &mut state.win1_mask,
            &mut state.outside_mask,
            &mut state.obj_window_mask,
        ] {
            mask.obj = false;
        }
    }

    state
}

// Each OBJ affine set is interleaved through four consecutive OAM entries, one coefficient in
// the fourth halfword of each
fn obj_affine_from_oam(memory: &MemoryMirror) -> [ObjAffineSet; OBJ_AFFINE_SETS] {
    array::from_fn(|set| {
        let coefficient =
            |i: usize| i32::from(memory.read_u16(Region::Oam, 32 * set + 8 * i + 6) as i16);
        ObjAffineSet {
            pa: coefficient(0),
            pb: coefficient(1),
            pc: coefficient(2),
            pd: coefficient(3),
        }
    })
}
