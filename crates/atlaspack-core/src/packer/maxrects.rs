//! MaxRects placement engine: a free-rectangle list with subtractive splitting.
//! Slower than Skyline but finds tighter placements; the batch insert picks the
//! globally best (size, position) pair every round.

use serde::{Deserialize, Serialize};

use crate::geom::Rect;

use super::PackSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxRectsHeuristic {
    BestShortSideFit,
    BestLongSideFit,
    BestAreaFit,
    BottomLeftRule,
    ContactPointRule,
}

#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub rotated: bool,
}

pub struct MaxRectsPacker {
    width: i32,
    height: i32,
    allow_rotate: bool,
    free: Vec<Rect>,
    used: Vec<Rect>,
}

impl MaxRectsPacker {
    pub fn new(width: i32, height: i32, allow_rotate: bool) -> Self {
        Self {
            width,
            height,
            allow_rotate,
            free: vec![Rect::new(0, 0, width.max(0), height.max(0))],
            used: Vec::new(),
        }
    }

    /// Places as many of `sizes` as fit, removing the placed entries.
    /// Each round inserts the size with the best score under `heuristic`.
    pub fn insert_batch(
        &mut self,
        sizes: &mut Vec<PackSize>,
        heuristic: MaxRectsHeuristic,
    ) -> Vec<Placement> {
        let mut placements = Vec::with_capacity(sizes.len());
        while !sizes.is_empty() {
            let mut best: Option<(usize, Rect, bool, (i64, i64))> = None;
            for (i, size) in sizes.iter().enumerate() {
                if let Some((rect, rotated, score)) =
                    self.score_rect(size.width, size.height, heuristic)
                {
                    if best.map_or(true, |(_, _, _, b)| score < b) {
                        best = Some((i, rect, rotated, score));
                    }
                }
            }
            let Some((i, rect, rotated, _)) = best else {
                break;
            };
            self.place(&rect);
            placements.push(Placement {
                id: sizes[i].id,
                x: rect.x,
                y: rect.y,
                rotated,
            });
            sizes.remove(i);
        }
        placements
    }

    /// Extent of all placements: (max right, max bottom).
    pub fn bottom_right(&self) -> (i32, i32) {
        let mut right = 0;
        let mut bottom = 0;
        for rect in &self.used {
            right = right.max(rect.x1());
            bottom = bottom.max(rect.y1());
        }
        (right, bottom)
    }

    fn score_rect(
        &self,
        w: i32,
        h: i32,
        heuristic: MaxRectsHeuristic,
    ) -> Option<(Rect, bool, (i64, i64))> {
        if w <= 0 || h <= 0 {
            return None;
        }
        let mut best: Option<(Rect, bool, (i64, i64))> = None;
        for free in &self.free {
            if free.w >= w && free.h >= h {
                let score = self.score_position(free, w, h, heuristic);
                if best.map_or(true, |(_, _, b)| score < b) {
                    best = Some((Rect::new(free.x, free.y, w, h), false, score));
                }
            }
            if self.allow_rotate && free.w >= h && free.h >= w {
                let score = self.score_position(free, h, w, heuristic);
                if best.map_or(true, |(_, _, b)| score < b) {
                    best = Some((Rect::new(free.x, free.y, h, w), true, score));
                }
            }
        }
        best
    }

    fn score_position(
        &self,
        free: &Rect,
        w: i32,
        h: i32,
        heuristic: MaxRectsHeuristic,
    ) -> (i64, i64) {
        let leftover_h = i64::from(free.w - w);
        let leftover_v = i64::from(free.h - h);
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        let area_fit = i64::from(free.w) * i64::from(free.h) - i64::from(w) * i64::from(h);
        match heuristic {
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BestLongSideFit => (long_fit, short_fit),
            MaxRectsHeuristic::BestAreaFit => (area_fit, short_fit),
            MaxRectsHeuristic::BottomLeftRule => (i64::from(free.y + h), i64::from(free.x)),
            MaxRectsHeuristic::ContactPointRule => {
                (-self.contact_point_score(free.x, free.y, w, h), area_fit)
            }
        }
    }

    /// Total edge length the rect would share with the bin borders and already
    /// placed rects.
    fn contact_point_score(&self, x: i32, y: i32, w: i32, h: i32) -> i64 {
        let mut score = 0i64;
        if x == 0 {
            score += i64::from(h);
        }
        if y == 0 {
            score += i64::from(w);
        }
        if x + w == self.width {
            score += i64::from(h);
        }
        if y + h == self.height {
            score += i64::from(w);
        }
        for used in &self.used {
            if x == used.x1() || used.x == x + w {
                score += i64::from(overlap_1d(y, y + h, used.y, used.y1()));
            }
            if y == used.y1() || used.y == y + h {
                score += i64::from(overlap_1d(x, x + w, used.x, used.x1()));
            }
        }
        score
    }

    fn place(&mut self, node: &Rect) {
        let mut new_free: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for free in &self.free {
            if !free.overlaps(node) {
                new_free.push(*free);
                continue;
            }
            let ix0 = free.x.max(node.x);
            let iy0 = free.y.max(node.y);
            let ix1 = free.x1().min(node.x1());
            let iy1 = free.y1().min(node.y1());

            // above
            if iy0 > free.y {
                new_free.push(Rect::new(free.x, free.y, free.w, iy0 - free.y));
            }
            // below
            if iy1 < free.y1() {
                new_free.push(Rect::new(free.x, iy1, free.w, free.y1() - iy1));
            }
            // left strip within the overlap band
            if ix0 > free.x && iy1 > iy0 {
                new_free.push(Rect::new(free.x, iy0, ix0 - free.x, iy1 - iy0));
            }
            // right strip within the overlap band
            if ix1 < free.x1() && iy1 > iy0 {
                new_free.push(Rect::new(ix1, iy0, free.x1() - ix1, iy1 - iy0));
            }
        }
        self.free = new_free;
        self.prune_free_list();
        self.used.push(*node);
    }

    /// Removes free rects fully contained in another.
    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut remove_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains_rect(&a) {
                    remove_i = true;
                    break;
                }
                if a.contains_rect(&b) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

fn overlap_1d(a0: i32, a1: i32, b0: i32, b1: i32) -> i32 {
    (a1.min(b1) - a0.max(b0)).max(0)
}
