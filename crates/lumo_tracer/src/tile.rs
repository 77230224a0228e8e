//! Tile decomposition of the image for parallel rendering.
//!
//! A sample pass traces each tile independently; the film merges the
//! results afterwards, so tiles partition the pixels exactly (no
//! overlap, no gaps) and their order never affects the output.

/// A rectangular region of the image to trace.
#[derive(Debug, Clone, Copy)]
pub struct Tile {
    /// Top-left pixel column
    pub x: u32,
    /// Top-left pixel row
    pub y: u32,
    /// Extent in pixels
    pub width: u32,
    pub height: u32,
    /// Position in the render order
    pub index: usize,
}

impl Tile {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Default tile size in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 64;

/// Cover a width x height image with tiles, center tiles first.
///
/// Edge tiles shrink to fit, so the grid covers the image exactly.
/// Tile indices follow the final ordering and feed the per-task RNG
/// seeds.
pub fn generate_tiles(width: u32, height: u32, tile_size: u32) -> Vec<Tile> {
    let mut tiles = Vec::new();
    let mut index = 0;

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let tw = tile_size.min(width - x);
            let th = tile_size.min(height - y);
            tiles.push(Tile::new(x, y, tw, th, index));
            index += 1;
            x += tile_size;
        }
        y += tile_size;
    }

    sort_center_out(&mut tiles, width, height);
    for (i, tile) in tiles.iter_mut().enumerate() {
        tile.index = i;
    }

    tiles
}

/// Order tiles by squared distance of the tile center to the image
/// center.
fn sort_center_out(tiles: &mut [Tile], width: u32, height: u32) {
    let cx = width as f32 * 0.5;
    let cy = height as f32 * 0.5;
    let dist = |t: &Tile| {
        let dx = t.x as f32 + t.width as f32 * 0.5 - cx;
        let dy = t.y as f32 + t.height as f32 * 0.5 - cy;
        dx * dx + dy * dy
    };

    tiles.sort_by(|a, b| {
        dist(a)
            .partial_cmp(&dist(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
