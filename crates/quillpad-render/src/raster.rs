//! CPU raster surface.

use crate::export;
use image::{Rgba, RgbaImage};
use kurbo::{PathEl, Point, QuadBez, Rect, Size};
use peniko::Color;
use quillpad_core::surface::{DrawingContext, ExportFormat, SurfaceResult};

/// Maximum distance in pixels between a curve and its line approximation.
const FLATTEN_TOLERANCE: f64 = 0.1;

/// An RGBA8 pixel buffer that paints anti-aliased round-capped strokes.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
    background: Rgba<u8>,
    stroke_color: Rgba<u8>,
    line_width: f64,
    /// End of the last path element.
    current: Option<Point>,
    /// Segments added since the last `stroke`.
    pending: Vec<QuadBez>,
}

impl RasterSurface {
    /// Transparent surface of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_background(width, height, Color::from_rgba8(0, 0, 0, 0))
    }

    /// Surface filled with `background`, which `clear_rect` also restores.
    pub fn with_background(width: u32, height: u32, background: Color) -> Self {
        let background = to_rgba(background);
        Self {
            pixels: RgbaImage::from_pixel(width, height, background),
            background,
            stroke_color: Rgba([0, 0, 0, 255]),
            line_width: 1.0,
            current: None,
            pending: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// The underlying pixel buffer.
    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// RGBA value at a pixel, if inside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixels.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Number of pixels that differ from the background.
    pub fn painted_pixels(&self) -> usize {
        self.pixels.pixels().filter(|p| **p != self.background).count()
    }

    /// Whether nothing has been painted since the last clear.
    pub fn is_blank(&self) -> bool {
        self.painted_pixels() == 0
    }

    fn paint_pending(&mut self) {
        let segments = std::mem::take(&mut self.pending);
        let radius = self.line_width / 2.0;
        if segments.is_empty() || radius <= 0.0 || !radius.is_finite() {
            return;
        }

        let mut lines = Vec::new();
        for q in &segments {
            flatten(*q, &mut lines);
        }
        let (width, height) = (self.width(), self.height());
        let margin = radius + 1.0;
        let Some(region) = PixelRegion::covering(&lines, margin, width, height) else {
            return;
        };

        // Max-combine coverage first so overlapping pieces blend only once.
        let mut coverage = vec![0.0f32; region.len()];
        for &(a, b) in &lines {
            let Some(piece) = PixelRegion::covering(&[(a, b)], margin, width, height) else {
                continue;
            };
            for y in piece.y0..piece.y1 {
                for x in piece.x0..piece.x1 {
                    let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                    let distance = distance_to_segment(center, a, b);
                    let cov = (radius + 0.5 - distance).clamp(0.0, 1.0) as f32;
                    let slot = &mut coverage[region.index(x, y)];
                    *slot = slot.max(cov);
                }
            }
        }

        for y in region.y0..region.y1 {
            for x in region.x0..region.x1 {
                let cov = coverage[region.index(x, y)];
                if cov > 0.0 {
                    let dst = self.pixels.get_pixel_mut(x, y);
                    *dst = blend_over(*dst, self.stroke_color, cov);
                }
            }
        }
        log::trace!("Painted {} line pieces", lines.len());
    }
}

impl DrawingContext for RasterSurface {
    fn backing_size(&self) -> Size {
        Size::new(self.width() as f64, self.height() as f64)
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.stroke_color = to_rgba(color);
    }

    fn set_line_width(&mut self, width: f64) {
        // Canvas semantics: invalid widths are ignored.
        if width.is_finite() && width > 0.0 {
            self.line_width = width;
        }
    }

    fn begin_path(&mut self) {
        self.pending.clear();
        self.current = None;
    }

    fn move_to(&mut self, point: Point) {
        self.current = Some(point);
    }

    fn quad_to(&mut self, control: Point, end: Point) {
        let start = self.current.unwrap_or(control);
        self.pending.push(QuadBez::new(start, control, end));
        self.current = Some(end);
    }

    fn stroke(&mut self) {
        self.paint_pending();
    }

    fn clear_rect(&mut self, rect: Rect) {
        let Some(region) = PixelRegion::from_rect(rect, self.width(), self.height()) else {
            return;
        };
        for y in region.y0..region.y1 {
            for x in region.x0..region.x1 {
                self.pixels.put_pixel(x, y, self.background);
            }
        }
    }

    fn export(&self, format: ExportFormat) -> SurfaceResult<Vec<u8>> {
        match format {
            ExportFormat::Png => export::encode_png(&self.pixels),
            ExportFormat::Jpeg { quality } => export::encode_jpeg(&self.pixels, quality),
        }
    }

    fn optimize(&mut self) {
        if self.pending.is_empty() {
            self.pending.shrink_to_fit();
        }
    }
}

/// Half-open pixel rectangle clipped to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelRegion {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelRegion {
    fn from_rect(rect: Rect, width: u32, height: u32) -> Option<Self> {
        let rect = rect.abs();
        let clip = |v: f64, max: u32| v.clamp(0.0, max as f64) as u32;
        let region = Self {
            x0: clip(rect.x0.floor(), width),
            y0: clip(rect.y0.floor(), height),
            x1: clip(rect.x1.ceil(), width),
            y1: clip(rect.y1.ceil(), height),
        };
        (region.x0 < region.x1 && region.y0 < region.y1).then_some(region)
    }

    /// Pixels within `margin` of any of the lines.
    fn covering(lines: &[(Point, Point)], margin: f64, width: u32, height: u32) -> Option<Self> {
        let (first, _) = lines.first()?;
        let bounds = lines
            .iter()
            .fold(Rect::from_points(*first, *first), |r, (a, b)| r.union_pt(*a).union_pt(*b));
        Self::from_rect(bounds.inflate(margin, margin), width, height)
    }

    fn len(&self) -> usize {
        ((self.x1 - self.x0) * (self.y1 - self.y0)) as usize
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y - self.y0) * (self.x1 - self.x0) + (x - self.x0)) as usize
    }
}

fn to_rgba(color: Color) -> Rgba<u8> {
    let c = color.to_rgba8();
    Rgba([c.r, c.g, c.b, c.a])
}

/// Append the line pieces approximating `q` to `lines`.
fn flatten(q: QuadBez, lines: &mut Vec<(Point, Point)>) {
    let path = [PathEl::MoveTo(q.p0), PathEl::QuadTo(q.p1, q.p2)];
    let mut last = q.p0;
    kurbo::flatten(path, FLATTEN_TOLERANCE, |el| {
        if let PathEl::LineTo(p) = el {
            lines.push((last, p));
            last = p;
        }
    });
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq < f64::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Source-over compositing of `src` scaled by `coverage` onto `dst`.
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let sa = src.0[3] as f32 / 255.0 * coverage;
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |i: usize| {
        let c = (src.0[i] as f32 * sa + dst.0[i] as f32 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    Rgba([channel(0), channel(1), channel(2), (out_a * 255.0).round() as u8])
}
