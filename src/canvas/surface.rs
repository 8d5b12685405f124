use image::imageops::FilterType;
use image::RgbaImage;

pub const MAX_SIDE: u32 = 400;
pub const FALLBACK_SIDE: u32 = 280;
pub const GRID_CELLS: u32 = 28;

const BACKGROUND: [u8; 4] = [0x0a, 0x0e, 0x1a, 0xff];
const STROKE_COLOR: [u8; 4] = [0xff, 0xff, 0xff, 0xff];
const GRID_COLOR: (u8, u8, u8) = (120, 80, 255);
const GRID_ALPHA: f32 = 0.07;

/// Side length for a given container width: the surface hugs the container
/// (minus a 1px border on each side) up to 400px, falling back to 280px when
/// the container size is not yet known.
pub fn side_for_container(container_width: Option<f32>) -> u32 {
    match container_width {
        Some(w) => (w - 2.0).min(MAX_SIDE as f32).max(1.0) as u32,
        None => FALLBACK_SIDE,
    }
}

/// Stroke width scales with the surface so the rendered digit keeps the same
/// thickness relative to the notional 28x28 target grid.
pub fn stroke_width(side: u32) -> f32 {
    (side as f32 / 18.0).max(14.0)
}

/// Immutable copy of the surface pixels at export time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub side: u32,
    pub rgba: Vec<u8>,
}

/// Square RGBA backing store for the drawing area.
///
/// All mutation goes through the command API below; the buffer is always
/// `side * side * 4` bytes and the alignment grid is repainted after every
/// clear, resize, or re-initialisation.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    side: u32,
    pixels: Vec<u8>,
    has_drawn: bool,
}

impl CanvasSurface {
    pub fn new(container_width: Option<f32>) -> Self {
        let side = side_for_container(container_width);
        let mut surface = Self {
            side,
            pixels: vec![0; (side * side * 4) as usize],
            has_drawn: false,
        };
        surface.repaint_background();
        surface
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn has_drawn(&self) -> bool {
        self.has_drawn
    }

    /// A stroke has started; the clear control becomes meaningful even before
    /// the first segment lands.
    pub fn begin_stroke(&mut self) {
        self.has_drawn = true;
    }

    /// Refill the background, repaint the grid and reset the drawn flag.
    pub fn clear(&mut self) {
        self.repaint_background();
        self.has_drawn = false;
    }

    /// Reallocate at `new_side`, scale-blitting the previous content so prior
    /// strokes survive a container-size change (with resampling).
    pub fn resize(&mut self, new_side: u32) {
        if new_side == 0 || new_side == self.side {
            return;
        }
        let prior = std::mem::take(&mut self.pixels);
        let old_side = self.side;
        self.side = new_side;
        self.pixels = vec![0; (new_side * new_side * 4) as usize];
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&BACKGROUND);
        }
        match RgbaImage::from_raw(old_side, old_side, prior) {
            Some(old) => {
                let scaled = image::imageops::resize(&old, new_side, new_side, FilterType::Triangle);
                self.pixels.copy_from_slice(scaled.as_raw());
            }
            // Transient buffer mismatch: keep the fresh background.
            None => {}
        }
        self.draw_grid();
    }

    /// Paint one round-capped segment of the current stroke. Rasterised as a
    /// capsule (every pixel within half the stroke width of the segment), so
    /// joins between consecutive segments are round as well.
    pub fn stroke_to(&mut self, from: (f32, f32), to: (f32, f32)) {
        self.has_drawn = true;
        let radius = stroke_width(self.side) / 2.0;
        let radius_sq = radius * radius;
        let pad = radius.ceil() as i32 + 1;

        let min_x = (from.0.min(to.0) as i32 - pad).max(0);
        let max_x = (from.0.max(to.0) as i32 + pad).min(self.side as i32 - 1);
        let min_y = (from.1.min(to.1) as i32 - pad).max(0);
        let max_y = (from.1.max(to.1) as i32 + pad).min(self.side as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                if point_segment_distance_sq(p, from, to) <= radius_sq {
                    let idx = ((y as u32 * self.side + x as u32) * 4) as usize;
                    self.pixels[idx..idx + 4].copy_from_slice(&STROKE_COLOR);
                }
            }
        }
    }

    /// Full RGBA buffer exactly as visible, background and grid included.
    /// The grid lines are low-contrast and intentionally part of the export.
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            side: self.side,
            rgba: self.pixels.clone(),
        }
    }

    fn repaint_background(&mut self) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&BACKGROUND);
        }
        self.draw_grid();
    }

    /// 28 equal cells over the full surface, drawn as 1px low-alpha lines.
    fn draw_grid(&mut self) {
        let step = self.side as f32 / GRID_CELLS as f32;
        for i in 0..=GRID_CELLS {
            let offset = (i as f32 * step).round() as i32;
            for t in 0..self.side as i32 {
                self.blend_pixel(offset, t);
                self.blend_pixel(t, offset);
            }
        }
    }

    fn blend_pixel(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 || x >= self.side as i32 || y >= self.side as i32 {
            return;
        }
        let idx = ((y as u32 * self.side + x as u32) * 4) as usize;
        let px = &mut self.pixels[idx..idx + 4];
        px[0] = lerp_channel(px[0], GRID_COLOR.0);
        px[1] = lerp_channel(px[1], GRID_COLOR.1);
        px[2] = lerp_channel(px[2], GRID_COLOR.2);
        px[3] = 0xff;
    }
}

fn lerp_channel(under: u8, over: u8) -> u8 {
    (under as f32 + (over as f32 - under as f32) * GRID_ALPHA).round() as u8
}

fn point_segment_distance_sq(point: (f32, f32), start: (f32, f32), end: (f32, f32)) -> f32 {
    let vx = end.0 - start.0;
    let vy = end.1 - start.1;
    let wx = point.0 - start.0;
    let wy = point.1 - start.1;
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f32::EPSILON {
        return wx * wx + wy * wy;
    }
    let t = ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0);
    let dx = point.0 - (start.0 + vx * t);
    let dy = point.1 - (start.1 + vy * t);
    dx * dx + dy * dy
}
