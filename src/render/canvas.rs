use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};

use crate::scene::Point;

/// CPU drawing surface wrapping a [`Pixmap`] with the small set of
/// primitives the scene needs. Colors are 0xRRGGBB plus a separate alpha,
/// matching how the drawing code reads.
pub struct Canvas {
    pixmap: Pixmap,
    transform: Transform,
}

fn rgb(color: u32) -> (u8, u8, u8) {
    (
        ((color >> 16) & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        (color & 0xff) as u8,
    )
}

fn paint_for(color: u32, alpha: f32) -> Paint<'static> {
    let (r, g, b) = rgb(color);
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, (alpha.clamp(0.0, 1.0) * 255.0) as u8);
    paint.anti_alias = true;
    paint
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let pixmap = Pixmap::new(width.max(1), height.max(1))
            .unwrap_or_else(|| Pixmap::new(1, 1).expect("1x1 pixmap"));
        Self {
            pixmap,
            transform: Transform::identity(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Rotate subsequent drawing by `degrees` around `(cx, cy)`.
    pub fn set_rotation_about(&mut self, degrees: f32, cx: f32, cy: f32) {
        self.transform = Transform::from_rotate_at(degrees, cx, cy);
    }

    pub fn clear_rotation(&mut self) {
        self.transform = Transform::identity();
    }

    /// Flood the whole surface with an opaque color.
    pub fn fill(&mut self, color: u32) {
        let (r, g, b) = rgb(color);
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(r, g, b, 255));
    }

    fn fill_finished(&mut self, path: Option<Path>, color: u32, alpha: f32) {
        if let Some(path) = path {
            self.pixmap.fill_path(
                &path,
                &paint_for(color, alpha),
                FillRule::Winding,
                self.transform,
                None,
            );
        }
    }

    fn stroke_finished(&mut self, path: Option<Path>, width: f32, color: u32, alpha: f32) {
        if let Some(path) = path {
            let stroke = Stroke {
                width,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            self.pixmap.stroke_path(
                &path,
                &paint_for(color, alpha),
                &stroke,
                self.transform,
                None,
            );
        }
    }

    /// Fill an arbitrary path assembled by `build`. Degenerate paths are
    /// silently skipped.
    pub fn fill_path(&mut self, color: u32, alpha: f32, build: impl FnOnce(&mut PathBuilder)) {
        let mut pb = PathBuilder::new();
        build(&mut pb);
        self.fill_finished(pb.finish(), color, alpha);
    }

    pub fn stroke_path(
        &mut self,
        width: f32,
        color: u32,
        alpha: f32,
        build: impl FnOnce(&mut PathBuilder),
    ) {
        let mut pb = PathBuilder::new();
        build(&mut pb);
        self.stroke_finished(pb.finish(), width, color, alpha);
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: u32, alpha: f32) {
        self.fill_path(color, alpha, |pb| pb.push_circle(cx, cy, r));
    }

    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: u32, alpha: f32) {
        if let Some(rect) = Rect::from_xywh(cx - rx, cy - ry, rx * 2.0, ry * 2.0) {
            self.fill_path(color, alpha, |pb| pb.push_oval(rect));
        }
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: u32, alpha: f32) {
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            self.fill_path(color, alpha, |pb| pb.push_rect(rect));
        }
    }

    pub fn fill_round_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        color: u32,
        alpha: f32,
    ) {
        let mut pb = PathBuilder::new();
        push_round_rect(&mut pb, x, y, w, h, radius);
        self.fill_finished(pb.finish(), color, alpha);
    }

    pub fn fill_polygon(&mut self, pts: &[(f32, f32)], color: u32, alpha: f32) {
        if pts.len() < 3 {
            return;
        }
        self.fill_path(color, alpha, |pb| {
            pb.move_to(pts[0].0, pts[0].1);
            for &(x, y) in &pts[1..] {
                pb.line_to(x, y);
            }
            pb.close();
        });
    }

    pub fn stroke_circle(&mut self, cx: f32, cy: f32, r: f32, width: f32, color: u32, alpha: f32) {
        self.stroke_path(width, color, alpha, |pb| pb.push_circle(cx, cy, r));
    }

    pub fn stroke_ellipse(
        &mut self,
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        width: f32,
        color: u32,
        alpha: f32,
    ) {
        if let Some(rect) = Rect::from_xywh(cx - rx, cy - ry, rx * 2.0, ry * 2.0) {
            self.stroke_path(width, color, alpha, |pb| pb.push_oval(rect));
        }
    }

    pub fn stroke_round_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        width: f32,
        color: u32,
        alpha: f32,
    ) {
        let mut pb = PathBuilder::new();
        push_round_rect(&mut pb, x, y, w, h, radius);
        self.stroke_finished(pb.finish(), width, color, alpha);
    }

    /// Stroke a polyline shifted by `offset`; used for the groove passes.
    pub fn stroke_polyline(
        &mut self,
        pts: &[Point],
        offset: (f32, f32),
        width: f32,
        color: u32,
        alpha: f32,
    ) {
        if pts.is_empty() {
            return;
        }
        let (dx, dy) = offset;
        self.stroke_path(width, color, alpha, |pb| {
            pb.move_to(pts[0].x + dx, pts[0].y + dy);
            for p in &pts[1..] {
                pb.line_to(p.x + dx, p.y + dy);
            }
            // A single-point path still needs a visible dot.
            if pts.len() == 1 {
                pb.line_to(pts[0].x + dx + 0.01, pts[0].y + dy);
            }
        });
    }

    /// Tile `tile` across the whole surface at the given opacity.
    pub fn draw_tiled(&mut self, tile: &Pixmap, opacity: f32) {
        let paint = PixmapPaint {
            opacity,
            ..PixmapPaint::default()
        };
        let (tw, th) = (tile.width() as i32, tile.height() as i32);
        let mut y = 0i32;
        while y < self.pixmap.height() as i32 {
            let mut x = 0i32;
            while x < self.pixmap.width() as i32 {
                self.pixmap
                    .draw_pixmap(x, y, tile.as_ref(), &paint, Transform::identity(), None);
                x += tw;
            }
            y += th;
        }
    }

    /// Copy out the surface as straight (unpremultiplied) RGBA bytes.
    pub fn unmultiplied_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.pixels().len() * 4);
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }
}

fn push_round_rect(pb: &mut PathBuilder, x: f32, y: f32, w: f32, h: f32, radius: f32) {
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_sets_every_pixel() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill(0x112233);
        let bytes = canvas.unmultiplied_rgba();
        assert_eq!(&bytes[..4], &[0x11, 0x22, 0x33, 0xff]);
        assert_eq!(bytes.len(), 4 * 4 * 4);
    }

    #[test]
    fn degenerate_shapes_are_skipped() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill(0xffffff);
        canvas.fill_ellipse(2.0, 2.0, 0.0, 0.0, 0x000000, 1.0);
        canvas.fill_polygon(&[(0.0, 0.0), (1.0, 1.0)], 0x000000, 1.0);
        assert_eq!(canvas.unmultiplied_rgba()[0], 0xff);
    }
}
