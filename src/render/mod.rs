//! CPU render pipeline: composes the sand fill, grain texture, vignette,
//! groove paths and items into an offscreen surface that the shell uploads
//! as a texture and the export path encodes as PNG.

mod canvas;
mod grain;

pub use canvas::Canvas;

use std::io::Cursor;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tiny_skia::Pixmap;

use crate::error::EditorError;
use crate::scene::{Point, SceneState};

/// Groove pass parameters: (width factor, alpha, offset factor, color).
/// Shadow below, midtone in place, highlight above — a three-pass fake of
/// an engraved sand look.
const GROOVE_PASSES: [(f32, f32, f32, u32); 3] = [
    (0.65, 0.75, 0.35, 0xaeaaa0),
    (0.50, 0.90, 0.00, 0xc9c3b5),
    (0.35, 0.25, -0.35, 0xffffff),
];

pub struct Renderer {
    canvas: Canvas,
    grain: Option<Pixmap>,
    grain_generation: u64,
    dirty: bool,
    rng: SmallRng,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Self {
        let mut renderer = Self {
            canvas: Canvas::new(width, height),
            grain: None,
            grain_generation: 0,
            dirty: true,
            rng: SmallRng::seed_from_u64(0x5eed_5a4d),
        };
        renderer.recreate_grain();
        renderer
    }

    pub fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    /// Bumps whenever the grain tile is regenerated.
    pub fn grain_generation(&self) -> u64 {
        self.grain_generation
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Resize the surface; regenerates the grain tile and forces a redraw.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == self.size() {
            return;
        }
        self.canvas = Canvas::new(width, height);
        self.recreate_grain();
        self.dirty = true;
    }

    fn recreate_grain(&mut self) {
        self.grain = grain::grain_tile(&mut self.rng);
        self.grain_generation += 1;
    }

    /// Compose all layers from scratch. Layer order, back to front:
    /// sand, grain, vignette, grooves, items.
    pub fn render(&mut self, scene: &SceneState) {
        self.canvas.fill(scene.sand_color());
        if let Some(tile) = self.grain.take() {
            self.canvas.draw_tiled(&tile, grain::GRAIN_OPACITY);
            self.grain = Some(tile);
        }
        self.draw_vignette();
        self.draw_grooves(&scene.paths, scene.brush);
        for item in &scene.items {
            item.draw(&mut self.canvas, scene.selected_id == Some(item.id));
        }
        self.dirty = false;
    }

    /// Redraw only when a scene change was observed since the last render.
    /// Returns whether a redraw happened.
    pub fn render_if_dirty(&mut self, scene: &SceneState) -> bool {
        if self.dirty {
            self.render(scene);
            true
        } else {
            false
        }
    }

    fn draw_vignette(&mut self) {
        let (w, h) = (self.canvas.width() as f32, self.canvas.height() as f32);
        for i in 0..6 {
            let pad = 20.0 + i as f32 * 18.0;
            let alpha = 0.06 - i as f32 * 0.008;
            if alpha <= 0.0 {
                break;
            }
            self.canvas
                .fill_round_rect(pad, pad, w - pad * 2.0, h - pad * 2.0, 26.0, 0x000000, alpha);
        }
    }

    fn draw_grooves(&mut self, paths: &[Vec<Point>], brush: f32) {
        for path in paths {
            for (width_k, alpha, offset_k, color) in GROOVE_PASSES {
                let offset = brush * offset_k;
                self.canvas.stroke_polyline(
                    path,
                    (offset, offset),
                    brush * width_k,
                    color,
                    alpha,
                );
            }
        }
    }

    /// Current frame as an egui image for the shell to upload.
    pub fn to_color_image(&self) -> egui::ColorImage {
        let (w, h) = self.size();
        egui::ColorImage::from_rgba_unmultiplied(
            [w as usize, h as usize],
            &self.canvas.unmultiplied_rgba(),
        )
    }

    /// Encode the current frame as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>, EditorError> {
        let (w, h) = self.size();
        let bytes = self.canvas.unmultiplied_rgba();
        let mut cursor = Cursor::new(Vec::new());
        image::write_buffer_with_format(
            &mut cursor,
            &bytes,
            w,
            h,
            image::ExtendedColorType::Rgba8,
            image::ImageFormat::Png,
        )?;
        Ok(cursor.into_inner())
    }

    /// Release cached surfaces. The renderer stays usable only after a
    /// subsequent `resize`.
    pub fn release(&mut self) {
        self.grain = None;
        self.canvas = Canvas::new(1, 1);
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Item, ItemKind};

    #[test]
    fn grain_regenerates_only_on_resize() {
        let mut r = Renderer::new(320, 240);
        let generation = r.grain_generation();
        r.render(&SceneState::default());
        r.render(&SceneState::default());
        assert_eq!(r.grain_generation(), generation);
        r.resize(320, 240); // same size: no-op
        assert_eq!(r.grain_generation(), generation);
        r.resize(640, 480);
        assert_eq!(r.grain_generation(), generation + 1);
    }

    #[test]
    fn render_clears_dirty_flag() {
        let mut r = Renderer::new(64, 64);
        assert!(r.render_if_dirty(&SceneState::default()));
        assert!(!r.render_if_dirty(&SceneState::default()));
        r.mark_dirty();
        assert!(r.render_if_dirty(&SceneState::default()));
    }

    #[test]
    fn center_is_vignetted_darker_than_edge_band() {
        let mut r = Renderer::new(300, 300);
        r.render(&SceneState::default());
        let img = r.to_color_image();
        let px = |x: usize, y: usize| img.pixels[y * 300 + x];
        // All six vignette fills cover the center; none cover the outer
        // 20px band, so the band stays closer to the raw sand color.
        assert!(px(150, 150).r() < px(5, 5).r());
    }

    #[test]
    fn items_paint_over_the_sand() {
        let mut r = Renderer::new(200, 200);
        let mut scene = SceneState::default();
        scene.items.push(Item::new(ItemKind::StoneTall, 100.0, 100.0));
        r.render(&scene);
        let img = r.to_color_image();
        let center = img.pixels[100 * 200 + 100];
        // Stone green, not sand beige.
        assert!(center.g() > center.r());
    }

    #[test]
    fn png_export_starts_with_signature() {
        let mut r = Renderer::new(32, 32);
        r.render(&SceneState::default());
        let png = r.encode_png().unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }
}
