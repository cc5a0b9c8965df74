//! Software compositor: [`SceneDescriptor`] + raw PPU memory → finished frame
//!
//! Every output pixel is a pure function of the descriptor, the memory contents, and the dispatch
//! parameters, so lines are rendered independently (in parallel when requested).

mod colors;
pub mod obj;

#[cfg(test)]
mod tests;

use crate::memory::MemoryMirror;
use crate::registers::RegisterFile;
use crate::scene::{BG_LAYERS, BlendMode, BlendTargets, LineState, SceneDescriptor, WindowMask};
use agb_common::frame::{Color, FrameSize};
use agb_common::num::GetBit;
use agb_config::{ObjTileMapping, RenderConfig};
use obj::{ObjLine, ObjRenderer, OamEntry};
use rayon::prelude::*;

pub use colors::bgr555_to_rgb8;

/// Read-only views of the memory the compositor samples from.
#[derive(Debug, Clone, Copy)]
pub struct FrameMemory<'a> {
    pub vram: &'a [u8],
    pub bg_palette: &'a [u8],
    pub obj_palette: &'a [u8],
    pub oam: &'a [u8],
}

impl<'a> From<&'a MemoryMirror> for FrameMemory<'a> {
    fn from(memory: &'a MemoryMirror) -> Self {
        Self {
            vram: memory.vram(),
            bg_palette: memory.bg_palette(),
            obj_palette: memory.obj_palette(),
            oam: memory.oam(),
        }
    }
}

/// Frame-level parameters passed alongside the scene on every dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DispatchParams {
    pub frame_size: FrameSize,
    pub map_width_tiles: u32,
    pub map_height_tiles: u32,
    /// VRAM byte offset of OBJ tile data
    pub obj_char_base: u32,
    pub obj_tile_mapping: ObjTileMapping,
}

impl DispatchParams {
    /// Build dispatch parameters from the render config. OBJ tile mapping falls back to DISPCNT
    /// when the config does not force one.
    #[must_use]
    pub fn new(config: &RenderConfig, registers: &RegisterFile) -> Self {
        let obj_tile_mapping = config.obj_tile_mapping.unwrap_or_else(|| {
            ObjTileMapping::from_bit(registers.read_dispcnt().bit(6))
        });

        Self {
            frame_size: config.frame_size,
            map_width_tiles: config.map_width_tiles,
            map_height_tiles: config.map_height_tiles,
            obj_char_base: config.obj_char_base,
            obj_tile_mapping,
        }
    }
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            frame_size: FrameSize::AGB,
            map_width_tiles: 32,
            map_height_tiles: 32,
            obj_char_base: RenderConfig::DEFAULT_OBJ_CHAR_BASE,
            obj_tile_mapping: ObjTileMapping::TwoDimensional,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Pixel(u16);

impl Pixel {
    const TRANSPARENT: Self = Self(0);

    fn transparent(self) -> bool {
        !self.0.bit(15)
    }

    fn red(self) -> u16 {
        self.0 & 0x1F
    }

    fn green(self) -> u16 {
        (self.0 >> 5) & 0x1F
    }

    fn blue(self) -> u16 {
        (self.0 >> 10) & 0x1F
    }

    fn new_opaque(color: u16) -> Self {
        Self(color | 0x8000)
    }

    fn new_opaque_rgb(r: u16, g: u16, b: u16) -> Self {
        Self(0x8000 | r | (g << 5) | (b << 10))
    }

    fn new_transparent(color: u16) -> Self {
        Self(color & 0x7FFF)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Bg0,
    Bg1,
    Bg2,
    Bg3,
    Obj,
    Backdrop,
    None,
}

impl Layer {
    const BG: [Self; 4] = [Self::Bg0, Self::Bg1, Self::Bg2, Self::Bg3];

    fn is_target(self, targets: &BlendTargets) -> bool {
        match self {
            Self::Bg0 => targets.bg[0],
            Self::Bg1 => targets.bg[1],
            Self::Bg2 => targets.bg[2],
            Self::Bg3 => targets.bg[3],
            Self::Obj => targets.obj,
            Self::Backdrop => targets.backdrop,
            Self::None => false,
        }
    }
}

/// Render a full frame. The returned buffer has `width * height` pixels in row-major order.
#[must_use]
pub fn compose_frame(
    scene: &SceneDescriptor,
    memory: &FrameMemory<'_>,
    params: &DispatchParams,
    parallel: bool,
) -> Vec<Color> {
    let FrameSize { width, height } = params.frame_size;

    let mut frame = vec![Color::BLACK; params.frame_size.pixel_count()];
    if width == 0 || height == 0 {
        return frame;
    }

    let sprites = obj::decode_oam(memory.oam);
    log::trace!("Composing {width}x{height} frame with {} visible OAM entries", sprites.len());

    let compositor = Compositor { scene, memory, params, sprites: &sprites };

    if parallel {
        frame
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| compositor.render_line(y as u32, row));
    } else {
        frame
            .chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| compositor.render_line(y as u32, row));
    }

    frame
}

struct Compositor<'a> {
    scene: &'a SceneDescriptor,
    memory: &'a FrameMemory<'a>,
    params: &'a DispatchParams,
    sprites: &'a [OamEntry],
}

impl Compositor<'_> {
    fn render_line(&self, y: u32, row: &mut [Color]) {
        #[derive(Debug, Clone, Copy)]
        struct MergePixel {
            color: Pixel,
            layer: Layer,
            priority: u8,
        }

        let FrameSize { width, height } = self.params.frame_size;
        let line = self.scene.line_state(y, width, height);

        let obj_line = ObjRenderer {
            sprites: self.sprites,
            affine: &self.scene.obj_affine,
            mosaic: self.scene.mosaic,
            memory: self.memory,
            params: self.params,
        }
        .render_line(y, width);

        let backdrop_color =
            Pixel::new_transparent(read_palette(self.memory.bg_palette, 0).unwrap_or(0));

        let effect = line.effect;
        let eva: u16 = effect.eva.min(16).into();
        let evb: u16 = effect.evb.min(16).into();
        let evy: u16 = effect.brightness.min(16).into();

        for (x, out) in (0..width).zip(row.iter_mut()) {
            let window = self.window_mask(&line, &obj_line, x, y);

            let mut first_pixel =
                MergePixel { color: backdrop_color, layer: Layer::Backdrop, priority: u8::MAX };

            let mut second_pixel =
                MergePixel { color: Pixel::TRANSPARENT, layer: Layer::None, priority: u8::MAX };

            let mut check_pixel = |color: Pixel, layer: Layer, priority: u8| {
                if color.transparent() {
                    return;
                }

                if first_pixel.color.transparent() || priority < first_pixel.priority {
                    second_pixel = first_pixel;
                    first_pixel = MergePixel { color, layer, priority };
                    return;
                }

                if second_pixel.color.transparent() || priority < second_pixel.priority {
                    second_pixel = MergePixel { color, layer, priority };
                }
            };

            let obj_pixel = obj_line.pixels[x as usize];
            if window.obj {
                if let Some(color) = obj_pixel.color {
                    check_pixel(Pixel::new_opaque(color), Layer::Obj, obj_pixel.priority);
                }
            }

            for bg in 0..BG_LAYERS {
                let layer = &self.scene.bg[bg];
                if !layer.enabled || !window.bg[bg] {
                    continue;
                }

                if let Some(color) = self.sample_bg(bg, &line, x, y) {
                    check_pixel(Pixel::new_opaque(color), Layer::BG[bg], layer.priority);
                }
            }

            let mut blend_color = first_pixel.color;

            // Semi-transparent OBJs are always 1st target enabled and force alpha blending
            let is_semi_transparent_obj =
                first_pixel.layer == Layer::Obj && obj_pixel.semi_transparent;

            if window.effect
                && (first_pixel.layer.is_target(&effect.source) || is_semi_transparent_obj)
            {
                let blend_mode =
                    if is_semi_transparent_obj { BlendMode::AlphaBlending } else { effect.mode };

                match blend_mode {
                    BlendMode::AlphaBlending => {
                        if second_pixel.layer.is_target(&effect.target) {
                            blend_color =
                                alpha_blend(first_pixel.color, second_pixel.color, eva, evb);
                        }
                    }
                    BlendMode::BrightnessIncrease => {
                        blend_color = adjust_brightness::<true>(first_pixel.color, evy);
                    }
                    BlendMode::BrightnessDecrease => {
                        blend_color = adjust_brightness::<false>(first_pixel.color, evy);
                    }
                    BlendMode::None => {}
                }
            }

            *out = bgr555_to_rgb8(blend_color.0);
        }
    }

    // WIN0 > WIN1 > OBJ window > outside
    fn window_mask(&self, line: &LineState, obj_line: &ObjLine, x: u32, y: u32) -> WindowMask {
        let window = &self.scene.window;
        if line.win0.contains(x, y) {
            window.win0_mask
        } else if line.win1.contains(x, y) {
            window.win1_mask
        } else if obj_line.window[x as usize] {
            window.obj_window_mask
        } else {
            window.outside_mask
        }
    }

    fn sample_bg(&self, bg: usize, line: &LineState, x: u32, y: u32) -> Option<u16> {
        let layer = &self.scene.bg[bg];

        let (x, y) = if layer.flags.mosaic {
            (obj::snap(x, self.scene.mosaic.bg_width), obj::snap(y, self.scene.mosaic.bg_height))
        } else {
            (x, y)
        };

        if layer.flags.affine {
            self.sample_affine_bg(bg, x, y)
        } else {
            self.sample_text_bg(bg, line, x, y)
        }
    }

    fn sample_text_bg(&self, bg: usize, line: &LineState, x: u32, y: u32) -> Option<u16> {
        let layer = &self.scene.bg[bg];
        let (scroll_x, scroll_y) = line.scroll[bg];

        let map_width_tiles = self.params.map_width_tiles.max(1);
        let map_height_tiles = self.params.map_height_tiles.max(1);

        let px = (x + u32::from(scroll_x)) % (8 * map_width_tiles);
        let py = (y + u32::from(scroll_y)) % (8 * map_height_tiles);
        let (tile_x, tile_y) = (px / 8, py / 8);

        // Maps are made of 32x32-entry screenblocks, 2 KiB each
        let screenblocks_wide = map_width_tiles.div_ceil(32);
        let screenblock = tile_x / 32 + (tile_y / 32) * screenblocks_wide;
        let entry_offset = 2048 * screenblock + 2 * (32 * (tile_y % 32) + tile_x % 32);
        let entry = read_u16(self.memory.vram, layer.screen_base, entry_offset)?;

        let tile_number = u32::from(entry & 0x3FF);
        let h_flip = entry.bit(10);
        let v_flip = entry.bit(11);
        let palette = u32::from(entry >> 12);

        let col = if h_flip { 7 - px % 8 } else { px % 8 };
        let row = if v_flip { 7 - py % 8 } else { py % 8 };

        if layer.flags.eight_bpp {
            let offset = 64 * tile_number + 8 * row + col;
            let color_id = read_byte(self.memory.vram, layer.char_base, offset)?;
            if color_id == 0 {
                return None;
            }
            read_palette(self.memory.bg_palette, color_id.into())
        } else {
            let offset = 32 * tile_number + 4 * row + col / 2;
            let byte = read_byte(self.memory.vram, layer.char_base, offset)?;
            let color_id = (byte >> (4 * (col & 1))) & 0xF;
            if color_id == 0 {
                return None;
            }
            read_palette(self.memory.bg_palette, 16 * palette + u32::from(color_id))
        }
    }

    fn sample_affine_bg(&self, bg: usize, x: u32, y: u32) -> Option<u16> {
        let layer = &self.scene.bg[bg];
        let transform = &self.scene.bg_affine[bg];

        let map_width_tiles = self.params.map_width_tiles.max(1);
        let map_width_pixels = 8 * i64::from(map_width_tiles);
        let map_height_pixels = 8 * i64::from(self.params.map_height_tiles.max(1));

        let (x, y) = (i64::from(x), i64::from(y));
        let mut tex_x =
            (i64::from(transform.ref_x) + i64::from(transform.pa) * x + i64::from(transform.pb) * y)
                >> 8;
        let mut tex_y =
            (i64::from(transform.ref_y) + i64::from(transform.pc) * x + i64::from(transform.pd) * y)
                >> 8;

        if layer.flags.wrap {
            tex_x = tex_x.rem_euclid(map_width_pixels);
            tex_y = tex_y.rem_euclid(map_height_pixels);
        } else if !(0..map_width_pixels).contains(&tex_x)
            || !(0..map_height_pixels).contains(&tex_y)
        {
            return None;
        }

        let (tex_x, tex_y) = (tex_x as u32, tex_y as u32);
        let tile_number = read_byte(
            self.memory.vram,
            layer.screen_base,
            (tex_y / 8) * map_width_tiles + tex_x / 8,
        )?;

        let color_id = read_byte(
            self.memory.vram,
            layer.char_base,
            64 * u32::from(tile_number) + 8 * (tex_y % 8) + tex_x % 8,
        )?;
        if color_id == 0 {
            return None;
        }

        read_palette(self.memory.bg_palette, color_id.into())
    }
}

/// Read `data[base + offset]`; out-of-range addresses read as `None`.
#[inline]
pub(crate) fn read_byte(data: &[u8], base: u32, offset: u32) -> Option<u8> {
    let address = base.checked_add(offset)?;
    data.get(address as usize).copied()
}

#[inline]
fn read_u16(data: &[u8], base: u32, offset: u32) -> Option<u16> {
    let lsb = read_byte(data, base, offset)?;
    let msb = read_byte(data, base, offset.checked_add(1)?)?;
    Some(u16::from_le_bytes([lsb, msb]))
}

/// Read palette entry `index` as BGR555.
#[inline]
pub(crate) fn read_palette(palette: &[u8], index: u32) -> Option<u16> {
    read_u16(palette, 0, index.checked_mul(2)?).map(|color| color & 0x7FFF)
}

fn alpha_blend(first: Pixel, second: Pixel, eva: u16, evb: u16) -> Pixel {
    let alpha_blend_component =
        |first: u16, second: u16| ((eva * first + evb * second) >> 4).min(31);

    let r = alpha_blend_component(first.red(), second.red());
    let g = alpha_blend_component(first.green(), second.green());
    let b = alpha_blend_component(first.blue(), second.blue());

    Pixel::new_opaque_rgb(r, g, b)
}

fn adjust_brightness<const INCREASE: bool>(color: Pixel, evy: u16) -> Pixel {
    let adjust_component = |component: u16| {
        if INCREASE {
            component + ((evy * (31 - component)) >> 4)
        } else {
            component - ((evy * component) >> 4)
        }
    };

    let r = adjust_component(color.red());
    let g = adjust_component(color.green());
    let b = adjust_component(color.blue());

    Pixel::new_opaque_rgb(r, g, b)
}
