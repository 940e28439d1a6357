//! Convex-hull builder for shaped (non-rectangular) packing.
//!
//! Candidate vertices come from boundary crossings of the threshold iso-line
//! over a single-channel intensity image: tile corners, sub-pixel interpolated
//! crossings on the outer edges, and bilinear-interpolated crossings inside
//! each 2x2 cell. Insertion keeps the point list convex; a final reduction pass
//! merges edges until the vertex budget is met.

use image::GrayImage;

use crate::geom::PointF;

const EPS: f32 = 1e-5;

fn cross(o: PointF, a: PointF, b: PointF) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn cross2(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    ax * by - ay * bx
}

/// An ordered vertex list maintained convex under insertion.
#[derive(Debug, Default, Clone)]
pub struct ConvexHull {
    points: Vec<PointF>,
}

impl ConvexHull {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PointF] {
        &self.points
    }

    pub fn into_points(self) -> Vec<PointF> {
        self.points
    }

    /// True when `p` lies inside or on the hull boundary.
    pub fn contains(&self, p: PointF) -> bool {
        if self.points.len() < 3 {
            return false;
        }
        let n = self.points.len();
        (0..n).all(|i| cross(self.points[i], self.points[(i + 1) % n], p) >= -EPS)
    }

    /// Inserts a candidate point. Interior and redundant points are discarded;
    /// an exterior point extends the hull and removes the vertices it shadows.
    pub fn insert(&mut self, p: PointF) {
        if self
            .points
            .iter()
            .any(|v| (v.x - p.x).abs() < EPS && (v.y - p.y).abs() < EPS)
        {
            return;
        }

        match self.points.len() {
            0 | 1 => self.points.push(p),
            2 => {
                let a = self.points[0];
                let b = self.points[1];
                if cross(a, b, p).abs() < EPS {
                    // collinear: keep the two extreme points
                    let d2 = |u: PointF, v: PointF| {
                        (u.x - v.x) * (u.x - v.x) + (u.y - v.y) * (u.y - v.y)
                    };
                    let (ab, ap, bp) = (d2(a, b), d2(a, p), d2(b, p));
                    if ap >= ab && ap >= bp {
                        self.points = vec![a, p];
                    } else if bp >= ab {
                        self.points = vec![b, p];
                    }
                } else {
                    self.points.push(p);
                    if cross(self.points[0], self.points[1], self.points[2]) < 0.0 {
                        self.points.swap(1, 2);
                    }
                }
            }
            n => {
                let outside: Vec<bool> = (0..n)
                    .map(|i| cross(self.points[i], self.points[(i + 1) % n], p) < -EPS)
                    .collect();
                if !outside.iter().any(|&o| o) {
                    return;
                }
                if outside.iter().all(|&o| o) {
                    return;
                }

                // first edge of the contiguous visible run
                let mut start = 0;
                while !(outside[start] && !outside[(start + n - 1) % n]) {
                    start += 1;
                }
                let mut run = 1;
                while outside[(start + run) % n] {
                    run += 1;
                }

                // keep the run's outer endpoints, replace the interior with p
                let mut next = Vec::with_capacity(n - run + 2);
                let mut k = (start + run) % n;
                loop {
                    next.push(self.points[k]);
                    if k == start {
                        break;
                    }
                    k = (k + 1) % n;
                }
                next.push(p);
                self.points = next;
            }
        }
    }

    /// Removes the edge whose removal (extending its neighbors to their
    /// intersection) adds the least area. Returns false when no edge can be
    /// removed, leaving the hull unchanged.
    pub fn remove_least_relevant_edge(&mut self) -> bool {
        let n = self.points.len();
        if n < 4 {
            return false;
        }

        let mut best: Option<(usize, f32, PointF)> = None;
        for i in 0..n {
            let v0 = self.points[(i + n - 1) % n];
            let v1 = self.points[i];
            let v2 = self.points[(i + 1) % n];
            let v3 = self.points[(i + 2) % n];

            // extend (v0 -> v1) and (v3 -> v2) to their intersection
            let d1 = (v1.x - v0.x, v1.y - v0.y);
            let d2 = (v2.x - v3.x, v2.y - v3.y);
            let denom = cross2(d1.0, d1.1, d2.0, d2.1);
            if denom.abs() < EPS {
                continue;
            }
            let e = (v3.x - v0.x, v3.y - v0.y);
            let t = cross2(e.0, e.1, d2.0, d2.1) / denom;
            let u = cross2(e.0, e.1, d1.0, d1.1) / denom;
            if t <= 1.0 || u <= 1.0 {
                continue;
            }
            let q = PointF::new(v0.x + t * d1.0, v0.y + t * d1.1);
            let area = cross(v1, q, v2).abs() * 0.5;
            if best.map_or(true, |(_, a, _)| area < a) {
                best = Some((i, area, q));
            }
        }

        match best {
            Some((i, _, q)) => {
                let j = (i + 1) % n;
                self.points[i] = q;
                self.points.remove(j);
                true
            }
            None => false,
        }
    }
}

/// Computes a convex hull of the above-`threshold` region of a single-channel
/// intensity image, reduced to at most `max_hull_size` vertices where possible.
///
/// Vertex coordinates are tile-local: the top-left of the image maps to (0, 0)
/// and pixel centers sit at `x + 0.5`. When reduction cannot meet the budget
/// the oversized hull is returned as-is.
pub fn create_convex_hull(
    levels: &GrayImage,
    threshold: u8,
    max_hull_size: usize,
    sub_pixel: i32,
) -> Vec<PointF> {
    let width = levels.width() as i32;
    let height = levels.height() as i32;
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let pixels = levels.as_raw();
    let value = |x: i32, y: i32| i32::from(pixels[(y * width + x) as usize]);
    let threshold = i32::from(threshold);
    let threshold_f = threshold as f32;

    let end_x = width - 1;
    let end_y = height - 1;
    let off_x = 0.5 * (width - 1) as f32;
    let off_y = 0.5 * (height - 1) as f32;
    let corner_off_x = 0.5 * width as f32;
    let corner_off_y = 0.5 * height as f32;

    let mut hull = ConvexHull::new();

    // corners
    if value(0, 0) > threshold {
        hull.insert(PointF::new(-corner_off_x, -corner_off_y));
    }
    if value(end_x, 0) > threshold {
        hull.insert(PointF::new(corner_off_x, -corner_off_y));
    }
    if value(0, end_y) > threshold {
        hull.insert(PointF::new(-corner_off_x, corner_off_y));
    }
    if value(end_x, end_y) > threshold {
        hull.insert(PointF::new(corner_off_x, corner_off_y));
    }

    // outer edges: sub-pixel crossing between adjacent pixel pairs
    for x in 0..end_x {
        for (y, corner_y) in [(0, -corner_off_y), (end_y, corner_off_y)] {
            let c0 = value(x, y);
            let c1 = value(x + 1, y);
            if (c0 > threshold) != (c1 > threshold) {
                let f = (threshold_f - c0 as f32) / (c1 - c0) as f32;
                hull.insert(PointF::new(x as f32 - off_x + f, corner_y));
            }
        }
    }
    for y in 0..end_y {
        for (x, corner_x) in [(0, -corner_off_x), (end_x, corner_off_x)] {
            let c0 = value(x, y);
            let c1 = value(x, y + 1);
            if (c0 > threshold) != (c1 > threshold) {
                let f = (threshold_f - c0 as f32) / (c1 - c0) as f32;
                hull.insert(PointF::new(corner_x, y as f32 - off_y + f));
            }
        }
    }

    // interior cells: bilinear samples along both axes
    let steps = sub_pixel.max(1);
    for y in 0..end_y {
        for x in 0..end_x {
            let c00 = value(x, y);
            let c01 = value(x + 1, y);
            let c10 = value(x, y + 1);
            let c11 = value(x + 1, y + 1);

            let count = [c00, c01, c10, c11]
                .iter()
                .filter(|&&c| c > threshold)
                .count();
            if count == 0 || count == 4 {
                continue;
            }

            let (d00, d01, d10, d11) = (c00 as f32, c01 as f32, c10 as f32, c11 as f32);
            for n in 0..=steps {
                let f0 = n as f32 / steps as f32;
                let f1 = 1.0 - f0;

                let left = d00 * f1 + d10 * f0;
                let right = d01 * f1 + d11 * f0;
                if (left > threshold_f) != (right > threshold_f) {
                    let f = (threshold_f - left) / (right - left);
                    hull.insert(PointF::new(x as f32 - off_x + f, y as f32 - off_y + f0));
                }

                let top = d00 * f1 + d01 * f0;
                let bottom = d10 * f1 + d11 * f0;
                if (top > threshold_f) != (bottom > threshold_f) {
                    let f = (threshold_f - top) / (bottom - top);
                    hull.insert(PointF::new(x as f32 - off_x + f0, y as f32 - off_y + f));
                }
            }
        }
    }

    while hull.len() > max_hull_size {
        if !hull.remove_least_relevant_edge() {
            break;
        }
    }

    hull.into_points()
        .into_iter()
        .map(|p| PointF::new(p.x + corner_off_x, p.y + corner_off_y))
        .collect()
}
