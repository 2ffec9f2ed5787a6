use rand::Rng;
use rand::rngs::SmallRng;
use tiny_skia::{Pixmap, PremultipliedColorU8};

/// Edge length of the tileable noise square.
pub const GRAIN_TILE: u32 = 140;

/// Opacity at which the grain layer is composited over the sand.
pub const GRAIN_OPACITY: f32 = 0.06;

/// Generate one grain tile: light gray noise in the 220..255 range.
/// Regenerated only when the viewport size changes or a recreate is forced.
pub fn grain_tile(rng: &mut SmallRng) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(GRAIN_TILE, GRAIN_TILE)?;
    for px in pixmap.pixels_mut() {
        let n: u8 = 220u8.saturating_add(rng.random_range(0..35));
        *px = PremultipliedColorU8::from_rgba(n, n, n, 255)?;
    }
    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn tile_is_light_noise() {
        let mut rng = SmallRng::seed_from_u64(1);
        let tile = grain_tile(&mut rng).unwrap();
        let mut distinct = std::collections::HashSet::new();
        for px in tile.pixels() {
            assert!(px.red() >= 220);
            assert_eq!(px.alpha(), 255);
            distinct.insert(px.red());
        }
        assert!(distinct.len() > 8, "noise should not be flat");
    }
}
