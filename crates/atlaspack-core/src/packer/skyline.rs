//! Skyline placement engine: fast single-pass packing into a fixed area.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkylineHeuristic {
    /// Lowest placement first, leftmost on ties.
    BottomLeft,
    /// Least wasted area below the placement, then bottom-left.
    BestFit,
}

#[derive(Debug, Clone, Copy)]
struct SkylineNode {
    x: i32,
    y: i32,
    w: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub rotated: bool,
}

pub struct SkylinePacker {
    width: i32,
    height: i32,
    allow_rotate: bool,
    heuristic: SkylineHeuristic,
    nodes: Vec<SkylineNode>,
}

impl SkylinePacker {
    pub fn new(width: i32, height: i32, allow_rotate: bool, heuristic: SkylineHeuristic) -> Self {
        Self {
            width,
            height,
            allow_rotate,
            heuristic,
            nodes: vec![SkylineNode { x: 0, y: 0, w: width }],
        }
    }

    /// Top y coordinate at which a `w` x `h` rect fits when left-aligned to
    /// node `index`, or None.
    fn fit_at(&self, index: usize, w: i32, h: i32) -> Option<i32> {
        let x = self.nodes[index].x;
        if w <= 0 || h <= 0 || x + w > self.width {
            return None;
        }
        let mut width_left = w;
        let mut y = 0;
        let mut i = index;
        loop {
            y = y.max(self.nodes[i].y);
            if y + h > self.height {
                return None;
            }
            if self.nodes[i].w >= width_left {
                return Some(y);
            }
            width_left -= self.nodes[i].w;
            i += 1;
            if i >= self.nodes.len() {
                return None;
            }
        }
    }

    /// Area between the skyline and the bottom edge of a rect placed at node
    /// `index` with top side `y`.
    fn wasted_area(&self, index: usize, w: i32, y: i32) -> i64 {
        let mut area = 0i64;
        let mut width_left = w;
        let mut i = index;
        while width_left > 0 && i < self.nodes.len() {
            let node = &self.nodes[i];
            let used = width_left.min(node.w);
            area += i64::from(y - node.y) * i64::from(used);
            width_left -= used;
            i += 1;
        }
        area
    }

    fn find_position(&self, w: i32, h: i32) -> Option<(usize, i32, (i64, i64, i64))> {
        let mut best: Option<(usize, i32, (i64, i64, i64))> = None;
        for index in 0..self.nodes.len() {
            if let Some(y) = self.fit_at(index, w, h) {
                let x = self.nodes[index].x;
                let score = match self.heuristic {
                    SkylineHeuristic::BottomLeft => {
                        (i64::from(y + h), i64::from(x), 0)
                    }
                    SkylineHeuristic::BestFit => {
                        (self.wasted_area(index, w, y), i64::from(y + h), i64::from(x))
                    }
                };
                if best.map_or(true, |(_, _, b)| score < b) {
                    best = Some((index, y, score));
                }
            }
        }
        best
    }

    /// Places a rect, trying the rotated orientation as well when allowed.
    pub fn insert(&mut self, w: i32, h: i32) -> Option<Placement> {
        let mut candidate = self
            .find_position(w, h)
            .map(|(index, y, score)| (index, y, score, false));
        if self.allow_rotate && w != h {
            if let Some((index, y, score)) = self.find_position(h, w) {
                if candidate.map_or(true, |(_, _, best, _)| score < best) {
                    candidate = Some((index, y, score, true));
                }
            }
        }

        let (index, y, _, rotated) = candidate?;
        let (pw, ph) = if rotated { (h, w) } else { (w, h) };
        let x = self.nodes[index].x;
        self.place(index, x, y, pw, ph);
        Some(Placement { x, y, rotated })
    }

    fn place(&mut self, index: usize, x: i32, y: i32, w: i32, h: i32) {
        self.nodes.insert(index, SkylineNode { x, y: y + h, w });

        // shrink or drop nodes shadowed by the new one
        let mut i = index + 1;
        while i < self.nodes.len() {
            let prev_right = self.nodes[i - 1].x + self.nodes[i - 1].w;
            if self.nodes[i].x < prev_right {
                let shrink = prev_right - self.nodes[i].x;
                if self.nodes[i].w <= shrink {
                    self.nodes.remove(i);
                } else {
                    self.nodes[i].x += shrink;
                    self.nodes[i].w -= shrink;
                    break;
                }
            } else {
                break;
            }
        }

        // merge neighbors at equal height
        let mut i = 1;
        while i < self.nodes.len() {
            if self.nodes[i - 1].y == self.nodes[i].y {
                self.nodes[i - 1].w += self.nodes[i].w;
                self.nodes.remove(i);
            } else {
                i += 1;
            }
        }
    }
}
