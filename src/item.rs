use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::render::Canvas;
use crate::scene::Point;

/// Opaque unique token identifying a placed item for the scene's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-kind size: radially symmetric kinds carry a radius, extent kinds a
/// width/height box. Serialized flat (`{"r":26}` or `{"w":52,"h":28}`) to
/// stay compatible with previously persisted documents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemSize {
    Radius { r: f32 },
    Extent { w: f32, h: f32 },
}

impl ItemSize {
    fn radius(self) -> f32 {
        match self {
            ItemSize::Radius { r } => r,
            ItemSize::Extent { w, h } => w.max(h) * 0.5,
        }
    }

    fn extent(self) -> (f32, f32) {
        match self {
            ItemSize::Radius { r } => (r * 2.0, r * 2.0),
            ItemSize::Extent { w, h } => (w, h),
        }
    }
}

/// Shape used for pointer hit-testing an item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitArea {
    Circle { cx: f32, cy: f32, r: f32 },
    Rect { x: f32, y: f32, w: f32, h: f32 },
}

impl HitArea {
    pub fn contains(&self, p: Point) -> bool {
        match *self {
            HitArea::Circle { cx, cy, r } => {
                let (dx, dy) = (p.x - cx, p.y - cy);
                dx * dx + dy * dy <= r * r
            }
            HitArea::Rect { x, y, w, h } => {
                p.x >= x && p.x <= x + w && p.y >= y && p.y <= y + h
            }
        }
    }
}

/// A placed decorative object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub x: f32,
    pub y: f32,
    #[serde(flatten)]
    pub size: ItemSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
}

impl Item {
    /// Create an item of `kind` at the given position with its default size.
    pub fn new(kind: ItemKind, x: f32, y: f32) -> Self {
        Self {
            id: ItemId::new(),
            kind,
            x,
            y,
            size: kind.default_size(),
            rotation: None,
        }
    }

    pub fn hit_area(&self) -> HitArea {
        self.kind.hit_area(self)
    }

    pub fn draw(&self, canvas: &mut Canvas, selected: bool) {
        if let Some(degrees) = self.rotation {
            canvas.set_rotation_about(degrees, self.x, self.y);
        }
        self.kind.draw(self, canvas, selected);
        if self.rotation.is_some() {
            canvas.clear_rotation();
        }
    }
}

/// Closed set of item kinds. Adding a kind means the compiler walks you
/// through every dispatch site below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    // Base catalogue
    StoneFlat,
    StoneOval,
    StoneTall,
    Leaf,
    Lantern,
    Rake,
    WaveRing,
    // Gated catalogue
    StoneBridge,
    ZenBell,
    BonsaiTree,
    BambooFence,
    ToriiGate,
    KitsuneStatue,
    BuddhaStatue,
    KoiPond,
    WinterPond,
    Snowman,
    AutumnLeaves,
    MapleTree,
}

impl ItemKind {
    pub const BASE: [ItemKind; 7] = [
        ItemKind::StoneFlat,
        ItemKind::StoneOval,
        ItemKind::StoneTall,
        ItemKind::Leaf,
        ItemKind::Lantern,
        ItemKind::Rake,
        ItemKind::WaveRing,
    ];

    pub const PREMIUM: [ItemKind; 12] = [
        ItemKind::StoneBridge,
        ItemKind::ZenBell,
        ItemKind::BonsaiTree,
        ItemKind::BambooFence,
        ItemKind::ToriiGate,
        ItemKind::KitsuneStatue,
        ItemKind::BuddhaStatue,
        ItemKind::KoiPond,
        ItemKind::WinterPond,
        ItemKind::Snowman,
        ItemKind::AutumnLeaves,
        ItemKind::MapleTree,
    ];

    pub fn is_premium(self) -> bool {
        Self::PREMIUM.contains(&self)
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemKind::StoneFlat => "Flat stone",
            ItemKind::StoneOval => "Oval stone",
            ItemKind::StoneTall => "Tall stone",
            ItemKind::Leaf => "Leaf",
            ItemKind::Lantern => "Lantern",
            ItemKind::Rake => "Rake",
            ItemKind::WaveRing => "Wave ring",
            ItemKind::StoneBridge => "Stone bridge",
            ItemKind::ZenBell => "Zen bell",
            ItemKind::BonsaiTree => "Bonsai",
            ItemKind::BambooFence => "Bamboo fence",
            ItemKind::ToriiGate => "Torii gate",
            ItemKind::KitsuneStatue => "Kitsune statue",
            ItemKind::BuddhaStatue => "Buddha statue",
            ItemKind::KoiPond => "Koi pond",
            ItemKind::WinterPond => "Winter pond",
            ItemKind::Snowman => "Snowman",
            ItemKind::AutumnLeaves => "Autumn leaves",
            ItemKind::MapleTree => "Maple tree",
        }
    }

    pub fn default_size(self) -> ItemSize {
        match self {
            ItemKind::StoneFlat => ItemSize::Radius { r: 26.0 },
            ItemKind::StoneOval => ItemSize::Radius { r: 28.0 },
            ItemKind::StoneTall => ItemSize::Radius { r: 30.0 },
            ItemKind::Leaf => ItemSize::Extent { w: 52.0, h: 28.0 },
            ItemKind::Lantern => ItemSize::Extent { w: 44.0, h: 64.0 },
            ItemKind::Rake => ItemSize::Extent { w: 58.0, h: 10.0 },
            ItemKind::WaveRing => ItemSize::Radius { r: 34.0 },
            ItemKind::StoneBridge => ItemSize::Extent { w: 140.0, h: 36.0 },
            ItemKind::ZenBell => ItemSize::Extent { w: 70.0, h: 80.0 },
            ItemKind::BonsaiTree => ItemSize::Radius { r: 40.0 },
            ItemKind::BambooFence => ItemSize::Extent { w: 160.0, h: 60.0 },
            ItemKind::ToriiGate => ItemSize::Extent { w: 160.0, h: 110.0 },
            ItemKind::KitsuneStatue => ItemSize::Extent { w: 70.0, h: 90.0 },
            ItemKind::BuddhaStatue => ItemSize::Extent { w: 80.0, h: 100.0 },
            ItemKind::KoiPond => ItemSize::Extent { w: 180.0, h: 110.0 },
            ItemKind::WinterPond => ItemSize::Extent { w: 180.0, h: 110.0 },
            ItemKind::Snowman => ItemSize::Radius { r: 22.0 },
            ItemKind::AutumnLeaves => ItemSize::Extent { w: 120.0, h: 70.0 },
            ItemKind::MapleTree => ItemSize::Extent { w: 100.0, h: 130.0 },
        }
    }

    /// Hit-area shape, recomputed from the item's current position.
    /// Radial kinds get a generous circle, extent kinds a box; ponds use a
    /// tighter box matching their drawn ellipse.
    pub fn hit_area(self, item: &Item) -> HitArea {
        match self {
            ItemKind::StoneFlat
            | ItemKind::StoneOval
            | ItemKind::StoneTall
            | ItemKind::WaveRing
            | ItemKind::Snowman
            | ItemKind::BonsaiTree => HitArea::Circle {
                cx: item.x,
                cy: item.y,
                r: item.size.radius() * 1.3,
            },
            ItemKind::KoiPond | ItemKind::WinterPond => {
                let (w, h) = item.size.extent();
                HitArea::Rect {
                    x: item.x - w * 0.55,
                    y: item.y - h * 0.4,
                    w: w * 1.1,
                    h: h * 0.8,
                }
            }
            _ => {
                let (w, h) = item.size.extent();
                HitArea::Rect {
                    x: item.x - w / 2.0,
                    y: item.y - h / 2.0,
                    w,
                    h,
                }
            }
        }
    }

    fn draw(self, it: &Item, c: &mut Canvas, selected: bool) {
        let (x, y) = (it.x, it.y);
        match self {
            ItemKind::StoneFlat => {
                let r = it.size.radius();
                shadow(c, x + r * 0.06, y + r * 0.1, r * 1.15, r * 0.8, 0.1);
                c.fill_ellipse(x, y, r * 1.15, r * 0.8, 0x7a8f76, 1.0);
                c.stroke_ellipse(x - r * 0.25, y - r * 0.25, r * 0.75, r * 0.5, 2.0, 0xffffff, 0.18);
                if selected {
                    outline_ellipse(c, x, y, r * 1.25, r * 0.9);
                }
            }
            ItemKind::StoneOval => {
                let r = it.size.radius();
                shadow(c, x + r * 0.08, y + r * 0.12, r, r * 0.9, 0.12);
                c.fill_ellipse(x, y, r, r * 0.9, 0x78947e, 1.0);
                c.stroke_ellipse(x - r * 0.2, y - r * 0.2, r * 0.65, r * 0.58, 2.0, 0xffffff, 0.2);
                if selected {
                    outline_ellipse(c, x, y, r * 1.1, r);
                }
            }
            ItemKind::StoneTall => {
                let r = it.size.radius();
                shadow(c, x + r * 0.1, y + r * 0.15, r * 1.05, r * 0.9, 0.14);
                c.fill_circle(x, y, r, 0x6f8c78, 1.0);
                c.stroke_circle(x - r * 0.2, y - r * 0.2, r * 0.7, 2.0, 0xffffff, 0.22);
                if selected {
                    outline_ellipse(c, x, y, r * 1.1, r * 1.1);
                }
            }
            ItemKind::Leaf => {
                let (w, h) = it.size.extent();
                shadow(c, x + 4.0, y + 7.0, w * 0.6, h * 0.55, 0.1);
                c.fill_path(0x8fae6e, 1.0, |pb| {
                    pb.move_to(x, y - h / 2.0);
                    pb.quad_to(x + w / 2.0, y, x, y + h / 2.0);
                    pb.quad_to(x - w / 2.0, y, x, y - h / 2.0);
                    pb.close();
                });
                // Midrib
                c.stroke_path(2.0, 0xdde8cf, 0.7, |pb| {
                    pb.move_to(x - w * 0.2, y);
                    pb.quad_to(x, y - h * 0.1, x + w * 0.25, y - h * 0.2);
                });
                if selected {
                    outline_ellipse(c, x, y, w * 0.7, h * 0.7);
                }
            }
            ItemKind::Lantern => {
                let (w, h) = it.size.extent();
                shadow(c, x + 6.0, y + h * 0.15, w * 0.8, h * 0.25, 0.12);
                c.fill_round_rect(x - w * 0.35, y + h * 0.1, w * 0.7, h * 0.18, 4.0, 0x7e7a70, 1.0);
                c.fill_round_rect(x - w * 0.3, y - h * 0.2, w * 0.6, h * 0.45, 6.0, 0x8d897e, 1.0);
                // Glow window
                c.fill_round_rect(x - w * 0.22, y - h * 0.08, w * 0.44, h * 0.22, 4.0, 0xffe9b0, 0.6);
                c.fill_polygon(
                    &[
                        (x - w * 0.45, y - h * 0.22),
                        (x + w * 0.45, y - h * 0.22),
                        (x, y - h * 0.38),
                    ],
                    0x6f6a62,
                    1.0,
                );
                if selected {
                    outline_round_rect(c, x - w * 0.5, y - h * 0.42, w, h * 0.75, 6.0);
                }
            }
            ItemKind::Rake => {
                let (w, h) = it.size.extent();
                shadow(c, x + 5.0, y + 4.0, w * 0.6, h * 1.2, 0.1);
                c.stroke_path(4.0, 0x8b6e49, 1.0, |pb| {
                    pb.move_to(x - w / 2.0, y);
                    pb.line_to(x + w / 2.0 - 12.0, y);
                });
                let (bx, by) = (x + w / 2.0 - 12.0, y);
                c.stroke_path(3.0, 0x8b6e49, 1.0, |pb| {
                    for i in 0..5 {
                        let ty = by - 6.0 + i as f32 * 3.0;
                        pb.move_to(bx, ty);
                        pb.line_to(bx + 12.0, ty);
                    }
                });
                if selected {
                    outline_ellipse(c, x, y, w * 0.65, h * 2.2);
                }
            }
            ItemKind::WaveRing => {
                let r = it.size.radius();
                let rings = [r * 0.9, r * 1.15, r * 1.4];
                for (idx, alpha) in [0.25, 0.18, 0.12].into_iter().enumerate() {
                    c.stroke_circle(x, y, rings[idx], 4.0 - idx as f32, 0xcfc9ba, alpha);
                }
                if selected {
                    outline_ellipse(c, x, y, r * 1.55, r * 1.55);
                }
            }
            ItemKind::StoneBridge => {
                let (w, h) = it.size.extent();
                shadow(c, x + 10.0, y + 10.0, w * 0.45, h * 0.6, 0.1);
                c.fill_path(0x7d868e, 1.0, |pb| {
                    pb.move_to(x - w / 2.0, y);
                    pb.quad_to(x, y - h * 0.85, x + w / 2.0, y);
                    pb.line_to(x + w / 2.0, y + h * 0.25);
                    pb.quad_to(x, y - h * 0.6, x - w / 2.0, y + h * 0.25);
                    pb.close();
                });
                let arch_r = h * 0.38;
                c.fill_ellipse(x - w * 0.18, y + h * 0.05, arch_r, arch_r * 0.65, 0x6f7a82, 1.0);
                c.fill_ellipse(x + w * 0.18, y + h * 0.05, arch_r, arch_r * 0.65, 0x6f7a82, 1.0);
                // Railing
                c.stroke_path(5.0, 0x707b84, 1.0, |pb| {
                    pb.move_to(x - w / 2.0 + 8.0, y - h * 0.5);
                    pb.quad_to(x, y - h * 0.95, x + w / 2.0 - 8.0, y - h * 0.5);
                });
                c.stroke_path(2.0, 0xffffff, 0.18, |pb| {
                    pb.move_to(x - w / 2.0 + 8.0, y - h * 0.52);
                    pb.quad_to(x, y - h * 0.98, x + w / 2.0 - 8.0, y - h * 0.52);
                });
                if selected {
                    outline_round_rect(c, x - w / 2.0 - 6.0, y - h * 1.1, w + 12.0, h * 1.5, 8.0);
                }
            }
            ItemKind::ZenBell => {
                let (w, h) = it.size.extent();
                shadow(c, x + 8.0, y + h * 0.35, w * 0.45, h * 0.25, 0.1);
                // Wooden frame
                c.fill_rect(x - w * 0.45, y - h * 0.55, w * 0.12, h * 0.9, 0x7a5a3a, 1.0);
                c.fill_rect(x + w * 0.33, y - h * 0.55, w * 0.12, h * 0.9, 0x7a5a3a, 1.0);
                c.fill_rect(x - w * 0.45, y - h * 0.55, w * 0.9, h * 0.09, 0x7a5a3a, 1.0);
                let (bw, bh) = (w * 0.36, h * 0.5);
                c.fill_path(0x6a5e4a, 1.0, |pb| {
                    pb.move_to(x - bw * 0.45, y - bh * 0.3);
                    pb.quad_to(x, y - bh * 0.65, x + bw * 0.45, y - bh * 0.3);
                    pb.line_to(x + bw * 0.38, y + bh * 0.25);
                    pb.quad_to(x, y + bh * 0.35, x - bw * 0.38, y + bh * 0.25);
                    pb.close();
                });
                c.stroke_path(4.0, 0x5a4f3f, 1.0, |pb| {
                    pb.move_to(x, y - bh * 0.6);
                    pb.line_to(x, y - bh * 0.32);
                });
                c.fill_circle(x, y + bh * 0.15, 5.0, 0x3b3a36, 1.0);
                c.stroke_path(2.0, 0xffffff, 0.15, |pb| {
                    pb.move_to(x - bw * 0.2, y - bh * 0.15);
                    pb.quad_to(x, y - bh * 0.35, x + bw * 0.2, y - bh * 0.15);
                });
                if selected {
                    outline_round_rect(c, x - w * 0.5, y - h * 0.65, w, h * 1.2, 8.0);
                }
            }
            ItemKind::BonsaiTree => {
                let r = it.size.radius();
                shadow(c, x + 6.0, y + 16.0, r * 1.2, r * 0.6, 0.12);
                // Trunk
                c.fill_rect(x - 6.0, y - 4.0, 12.0, 28.0, 0x6b4226, 1.0);
                // Crown
                c.fill_circle(x - r * 0.3, y - r * 0.6, r * 0.6, 0x3e6b2f, 1.0);
                c.fill_circle(x + r * 0.25, y - r * 0.55, r * 0.5, 0x3e6b2f, 1.0);
                c.fill_circle(x, y - r * 0.25, r * 0.55, 0x3e6b2f, 1.0);
                // Pot
                c.fill_round_rect(x - r * 0.6, y + 18.0, r * 1.2, 12.0, 6.0, 0x5b3b23, 1.0);
                if selected {
                    outline_ellipse(c, x, y, r * 1.1, r * 1.1);
                }
            }
            ItemKind::BambooFence => {
                let (w, h) = it.size.extent();
                shadow(c, x + 8.0, y + 12.0, w * 0.55, h * 0.35, 0.12);
                let posts = 5;
                for i in 0..posts {
                    let px = x - w / 2.0 + (i as f32 * w) / (posts - 1) as f32;
                    c.fill_round_rect(px - 6.0, y - h / 2.0, 12.0, h, 6.0, 0x9bbf6b, 1.0);
                    // Node ring
                    c.fill_round_rect(px - 8.0, y - h * 0.1, 16.0, 8.0, 4.0, 0x7fa95a, 1.0);
                }
                c.fill_round_rect(x - w / 2.0, y - h * 0.25, w, 10.0, 5.0, 0x86a95a, 1.0);
                c.fill_round_rect(x - w / 2.0, y + h * 0.15, w, 10.0, 5.0, 0x86a95a, 1.0);
                if selected {
                    outline_round_rect(c, x - w / 2.0 - 6.0, y - h / 2.0 - 6.0, w + 12.0, h + 12.0, 8.0);
                }
            }
            ItemKind::ToriiGate => {
                let (w, h) = it.size.extent();
                shadow(c, x + 12.0, y + h * 0.25, w * 0.6, h * 0.3, 0.12);
                c.fill_round_rect(x - w * 0.35, y - h * 0.1, 16.0, h * 0.7, 6.0, 0x8b1a1a, 1.0);
                c.fill_round_rect(x + w * 0.35 - 16.0, y - h * 0.1, 16.0, h * 0.7, 6.0, 0x8b1a1a, 1.0);
                c.fill_round_rect(x - w * 0.5, y - h * 0.35, w, 16.0, 8.0, 0x8b1a1a, 1.0);
                c.fill_round_rect(x - w * 0.4, y - h * 0.2, w * 0.8, 12.0, 6.0, 0x8b1a1a, 1.0);
                if selected {
                    outline_round_rect(c, x - w / 2.0 - 6.0, y - h * 0.45, w + 12.0, h, 10.0);
                }
            }
            ItemKind::KitsuneStatue => {
                let (w, h) = it.size.extent();
                shadow(c, x + 10.0, y + h * 0.3, w * 0.5, h * 0.3, 0.12);
                // Pedestal
                c.fill_round_rect(x - w * 0.35, y + h * 0.15, w * 0.7, h * 0.18, 6.0, 0x9a9a9a, 1.0);
                // Body
                c.fill_ellipse(x, y, w * 0.25, h * 0.35, 0x9f9f9f, 1.0);
                // Head and ears
                c.fill_circle(x, y - h * 0.35, w * 0.18, 0xaaaaaa, 1.0);
                c.fill_polygon(
                    &[
                        (x - w * 0.18, y - h * 0.38),
                        (x - w * 0.08, y - h * 0.55),
                        (x - w * 0.02, y - h * 0.38),
                    ],
                    0xaaaaaa,
                    1.0,
                );
                c.fill_polygon(
                    &[
                        (x + w * 0.18, y - h * 0.38),
                        (x + w * 0.08, y - h * 0.55),
                        (x + w * 0.02, y - h * 0.38),
                    ],
                    0xaaaaaa,
                    1.0,
                );
                // Tail
                c.fill_ellipse(x + w * 0.22, y + h * 0.05, w * 0.18, h * 0.25, 0xb0b0b0, 1.0);
                if selected {
                    outline_round_rect(c, x - w * 0.5, y - h * 0.65, w, h * 1.1, 8.0);
                }
            }
            ItemKind::BuddhaStatue => {
                let (w, h) = it.size.extent();
                shadow(c, x + 10.0, y + h * 0.35, w * 0.55, h * 0.3, 0.12);
                c.fill_round_rect(x - w * 0.4, y + h * 0.2, w * 0.8, h * 0.2, 10.0, 0x8f8f8f, 1.0);
                c.fill_ellipse(x, y + h * 0.05, w * 0.35, h * 0.35, 0x9e9e9e, 1.0);
                c.fill_circle(x, y - h * 0.25, w * 0.18, 0xa8a8a8, 1.0);
                // Shoulder line
                c.stroke_path(5.0, 0xb0b0b0, 0.6, |pb| {
                    pb.move_to(x - w * 0.35, y);
                    pb.quad_to(x, y - h * 0.05, x + w * 0.35, y);
                });
                if selected {
                    outline_round_rect(c, x - w * 0.5, y - h * 0.55, w, h * 1.1, 10.0);
                }
            }
            ItemKind::KoiPond => {
                let (w, h) = it.size.extent();
                shadow(c, x + 8.0, y + 10.0, w * 0.6, h * 0.35, 0.12);
                c.fill_ellipse(x, y, w * 0.55, h * 0.4, 0x7f7a70, 1.0);
                c.fill_ellipse(x, y, w * 0.48, h * 0.33, 0x7cc6e6, 1.0);
                // Koi arcs
                c.stroke_path(4.0, 0xffffff, 0.9, |pb| {
                    pb.move_to(x - w * 0.15, y - h * 0.05);
                    pb.quad_to(x - w * 0.05, y - h * 0.12, x + w * 0.02, y - h * 0.02);
                });
                c.stroke_path(4.0, 0xff7043, 0.9, |pb| {
                    pb.move_to(x + w * 0.1, y + h * 0.02);
                    pb.quad_to(x + w * 0.18, y + h * 0.07, x + w * 0.22, y - h * 0.02);
                });
                if selected {
                    outline_ellipse(c, x, y, w * 0.6, h * 0.45);
                }
            }
            ItemKind::WinterPond => {
                let (w, h) = it.size.extent();
                shadow(c, x + 8.0, y + 10.0, w * 0.6, h * 0.35, 0.12);
                c.fill_ellipse(x, y, w * 0.55, h * 0.4, 0x7f7a70, 1.0);
                // Ice
                c.fill_ellipse(x, y, w * 0.48, h * 0.33, 0xd6f0ff, 1.0);
                c.fill_ellipse(x - w * 0.02, y - h * 0.02, w * 0.42, h * 0.28, 0xffffff, 0.85);
                if selected {
                    outline_ellipse(c, x, y, w * 0.6, h * 0.45);
                }
            }
            ItemKind::Snowman => {
                let r = it.size.radius();
                shadow(c, x + 6.0, y + r * 2.2, r * 1.6, r * 0.9, 0.12);
                c.fill_circle(x, y + r * 1.2, r * 1.1, 0xffffff, 1.0);
                c.fill_circle(x, y, r, 0xffffff, 1.0);
                c.fill_circle(x - r * 0.3, y - r * 0.15, 2.6, 0x000000, 1.0);
                c.fill_circle(x + r * 0.3, y - r * 0.15, 2.6, 0x000000, 1.0);
                // Carrot nose
                c.fill_polygon(
                    &[(x, y + 2.0), (x + r * 0.6, y + 4.0), (x, y + 6.0)],
                    0xff8a00,
                    1.0,
                );
                // Hat
                c.fill_rect(x - r * 0.6, y - r * 0.55, r * 1.2, 6.0, 0x222222, 1.0);
                c.fill_rect(x - r * 0.35, y - r, r * 0.7, r * 0.4, 0x222222, 1.0);
                if selected {
                    outline_ellipse(c, x, y + r * 0.6, r * 1.5, r * 1.5);
                }
            }
            ItemKind::AutumnLeaves => {
                let (w, h) = it.size.extent();
                shadow(c, x + 6.0, y + 10.0, w * 0.5, h * 0.3, 0.09);
                // Deterministic scatter so redraws are stable per item.
                let mut rng = SmallRng::seed_from_u64(scatter_seed(it.id));
                const COLORS: [u32; 4] = [0xd35400, 0xe67e22, 0xc0392b, 0xb03a2e];
                for i in 0..14 {
                    let px = x - w / 2.0 + rng.random::<f32>() * w;
                    let py = y - h / 2.0 + rng.random::<f32>() * h;
                    let rx = 5.0 + rng.random::<f32>() * 6.0;
                    let ry = 3.0 + rng.random::<f32>() * 4.0;
                    c.fill_ellipse(px, py, rx, ry, COLORS[i % 4], 0.9);
                }
                if selected {
                    outline_round_rect(c, x - w / 2.0 - 6.0, y - h / 2.0 - 6.0, w + 12.0, h + 12.0, 8.0);
                }
            }
            ItemKind::MapleTree => {
                let (w, h) = it.size.extent();
                shadow(c, x + 10.0, y + h * 0.35, w * 0.6, h * 0.35, 0.12);
                // Trunk
                c.fill_rect(x - 8.0, y + h * 0.05, 16.0, h * 0.35, 0x6b4226, 1.0);
                // Crown
                c.fill_circle(x, y - h * 0.15, h * 0.28, 0xb3392f, 1.0);
                c.fill_circle(x - w * 0.25, y - h * 0.05, h * 0.22, 0xb3392f, 1.0);
                c.fill_circle(x + w * 0.25, y - h * 0.05, h * 0.22, 0xb3392f, 1.0);
                c.fill_circle(x, y - h * 0.35, h * 0.18, 0xb3392f, 1.0);
                c.stroke_path(2.0, 0xffffff, 0.12, |pb| {
                    pb.move_to(x, y - h * 0.15);
                    pb.line_to(x, y + h * 0.08);
                });
                if selected {
                    outline_round_rect(c, x - w * 0.5, y - h * 0.55, w, h * 1.1, 10.0);
                }
            }
        }
    }
}

/// Drop-shadow ellipse drawn under most kinds.
fn shadow(c: &mut Canvas, x: f32, y: f32, rx: f32, ry: f32, alpha: f32) {
    c.fill_ellipse(x, y, rx, ry, 0x000000, alpha);
}

fn outline_ellipse(c: &mut Canvas, x: f32, y: f32, rx: f32, ry: f32) {
    c.stroke_ellipse(x, y, rx, ry, 2.0, 0x111111, 0.65);
}

fn outline_round_rect(c: &mut Canvas, x: f32, y: f32, w: f32, h: f32, radius: f32) {
    c.stroke_round_rect(x, y, w, h, radius, 2.0, 0x111111, 0.65);
}

fn scatter_seed(id: ItemId) -> u64 {
    let ItemId(uuid) = id;
    u64::from_le_bytes(uuid.as_bytes()[..8].try_into().unwrap_or([0; 8]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radial_kinds_hit_circles_extent_kinds_hit_rects() {
        let stone = Item::new(ItemKind::StoneFlat, 100.0, 100.0);
        assert!(stone.hit_area().contains(Point::new(100.0, 100.0)));
        assert!(stone.hit_area().contains(Point::new(130.0, 100.0))); // within 1.3x radius
        assert!(!stone.hit_area().contains(Point::new(140.0, 100.0)));

        let fence = Item::new(ItemKind::BambooFence, 200.0, 200.0);
        assert!(fence.hit_area().contains(Point::new(130.0, 180.0)));
        assert!(!fence.hit_area().contains(Point::new(110.0, 180.0)));
    }

    #[test]
    fn pond_hit_box_is_tighter_than_full_extent() {
        let pond = Item::new(ItemKind::KoiPond, 0.0, 0.0);
        // Full extent is 180x110; the hit box only spans 0.8h vertically.
        assert!(pond.hit_area().contains(Point::new(0.0, 43.0)));
        assert!(!pond.hit_area().contains(Point::new(0.0, 50.0)));
    }

    #[test]
    fn size_serializes_flat() {
        let stone = Item::new(ItemKind::StoneFlat, 1.0, 2.0);
        let json = serde_json::to_value(&stone).unwrap();
        assert_eq!(json["r"], 26.0);
        assert_eq!(json["kind"], "stoneFlat");

        let leaf = Item::new(ItemKind::Leaf, 0.0, 0.0);
        let json = serde_json::to_value(&leaf).unwrap();
        assert_eq!(json["w"], 52.0);
        assert_eq!(json["h"], 28.0);
    }

    #[test]
    fn catalogue_split_covers_every_kind() {
        assert_eq!(ItemKind::BASE.len() + ItemKind::PREMIUM.len(), 18);
        for kind in ItemKind::BASE {
            assert!(!kind.is_premium());
        }
        for kind in ItemKind::PREMIUM {
            assert!(kind.is_premium());
        }
    }
}
