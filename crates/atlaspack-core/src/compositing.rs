//! Slice compositing: materializes the pixels of a packed slice by copying
//! each sprite's trimmed source region to its placement, optionally rotated
//! 90 degrees clockwise and optionally masked by the sprite's hull polygon,
//! then extruding edge pixels of border sprites.

use image::RgbaImage;

use crate::geom::{Point, PointF, Rect};
use crate::image_util::{bounds, check_rect};
use crate::model::{Slice, SourceImage, Sprite, WrapMode};

/// Composites one slice into a fresh RGBA image. `map_index` selects an
/// alternate source map; sprites without that map are skipped. Returns `None`
/// when nothing was copied.
pub fn get_slice_image(
    slice: &Slice,
    sprites: &[Sprite],
    map_index: Option<usize>,
) -> Option<RgbaImage> {
    let mut target = RgbaImage::new(slice.width.max(0) as u32, slice.height.max(0) as u32);
    let mut copied = false;
    for sprite in &sprites[slice.sprites.clone()] {
        copied |= copy_sprite(&mut target, sprite, map_index);
    }
    copied.then_some(target)
}

fn source_of(sprite: &Sprite, map_index: Option<usize>) -> Option<&SourceImage> {
    match map_index {
        None => Some(&sprite.source),
        Some(index) => sprite.maps.get(index).map(|m| m.as_ref()),
    }
}

/// A four-vertex hull spanning the whole trimmed rect adds nothing over a
/// plain rectangular copy.
fn has_rect_vertices(sprite: &Sprite) -> bool {
    let v = &sprite.vertices;
    let w = sprite.trimmed_source_rect.w as f32;
    let h = sprite.trimmed_source_rect.h as f32;
    v.len() == 4
        && v[0] == PointF::new(0.0, 0.0)
        && v[1] == PointF::new(w, 0.0)
        && v[2] == PointF::new(w, h)
        && v[3] == PointF::new(0.0, h)
}

fn copy_sprite(target: &mut RgbaImage, sprite: &Sprite, map_index: Option<usize>) -> bool {
    let Some(source) = source_of(sprite, map_index) else {
        return false;
    };

    // degenerate hulls (fewer than three vertices) copy as plain rects
    let masked = sprite.vertices.len() >= 3 && !has_rect_vertices(sprite);
    let (dx, dy) = (sprite.trimmed_rect.x, sprite.trimmed_rect.y);
    match (sprite.rotated, masked) {
        (false, false) => copy_rect(&source.rgba, &sprite.trimmed_source_rect, target, dx, dy),
        (true, false) => {
            copy_rect_rotated_cw(&source.rgba, &sprite.trimmed_source_rect, target, dx, dy)
        }
        (false, true) => copy_rect_masked(
            &source.rgba,
            &sprite.trimmed_source_rect,
            target,
            dx,
            dy,
            &sprite.vertices,
        ),
        (true, true) => copy_rect_rotated_cw_masked(
            &source.rgba,
            &sprite.trimmed_source_rect,
            target,
            dx,
            dy,
            &sprite.vertices,
        ),
    }

    if sprite.extrude.count > 0 {
        let left = sprite.source_rect.x0() == sprite.trimmed_source_rect.x0();
        let top = sprite.source_rect.y0() == sprite.trimmed_source_rect.y0();
        let right = sprite.source_rect.x1() == sprite.trimmed_source_rect.x1();
        let bottom = sprite.source_rect.y1() == sprite.trimmed_source_rect.y1();
        if left || top || right || bottom {
            extrude_rect(
                target,
                &sprite.trimmed_rect,
                sprite.extrude.count,
                sprite.extrude.mode,
                left,
                top,
                right,
                bottom,
            );
        }
    }
    true
}

pub fn copy_rect(source: &RgbaImage, source_rect: &Rect, dest: &mut RgbaImage, dx: i32, dy: i32) {
    check_rect(source, source_rect);
    check_rect(dest, &Rect::new(dx, dy, source_rect.w, source_rect.h));
    for y in 0..source_rect.h {
        for x in 0..source_rect.w {
            let p = *source.get_pixel((source_rect.x + x) as u32, (source_rect.y + y) as u32);
            dest.put_pixel((dx + x) as u32, (dy + y) as u32, p);
        }
    }
}

pub fn copy_rect_rotated_cw(
    source: &RgbaImage,
    source_rect: &Rect,
    dest: &mut RgbaImage,
    dx: i32,
    dy: i32,
) {
    check_rect(source, source_rect);
    check_rect(dest, &Rect::new(dx, dy, source_rect.h, source_rect.w));
    let h = source_rect.h;
    for y in 0..source_rect.h {
        for x in 0..source_rect.w {
            let p = *source.get_pixel((source_rect.x + x) as u32, (source_rect.y + y) as u32);
            dest.put_pixel((dx + h - 1 - y) as u32, (dy + x) as u32, p);
        }
    }
}

pub fn copy_rect_masked(
    source: &RgbaImage,
    source_rect: &Rect,
    dest: &mut RgbaImage,
    dx: i32,
    dy: i32,
    mask_vertices: &[PointF],
) {
    check_rect(source, source_rect);
    check_rect(dest, &Rect::new(dx, dy, source_rect.w, source_rect.h));
    for y in 0..source_rect.h {
        for x in 0..source_rect.w {
            if point_in_polygon(x as f32 + 0.5, y as f32 + 0.5, mask_vertices) {
                let p = *source.get_pixel((source_rect.x + x) as u32, (source_rect.y + y) as u32);
                dest.put_pixel((dx + x) as u32, (dy + y) as u32, p);
            }
        }
    }
}

pub fn copy_rect_rotated_cw_masked(
    source: &RgbaImage,
    source_rect: &Rect,
    dest: &mut RgbaImage,
    dx: i32,
    dy: i32,
    mask_vertices: &[PointF],
) {
    check_rect(source, source_rect);
    check_rect(dest, &Rect::new(dx, dy, source_rect.h, source_rect.w));
    let h = source_rect.h;
    for y in 0..source_rect.h {
        for x in 0..source_rect.w {
            if point_in_polygon(x as f32 + 0.5, y as f32 + 0.5, mask_vertices) {
                let p = *source.get_pixel((source_rect.x + x) as u32, (source_rect.y + y) as u32);
                dest.put_pixel((dx + h - 1 - y) as u32, (dy + x) as u32, p);
            }
        }
    }
}

// http://paulbourke.net/geometry/polygonmesh/
pub fn point_in_polygon(x: f32, y: f32, polygon: &[PointF]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    if n == 0 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];
        if ((pi.y <= y && y < pj.y) || (pj.y <= y && y < pi.y))
            && x < (pj.x - pi.x) * (y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Replicates the edge pixels of `rect` outward ring by ring on the requested
/// sides. Writes outside the image are skipped.
pub fn extrude_rect(
    image: &mut RgbaImage,
    rect: &Rect,
    count: i32,
    mode: WrapMode,
    left: bool,
    top: bool,
    right: bool,
    bottom: bool,
) {
    if rect.is_empty() {
        return;
    }
    let image_bounds = bounds(image);
    let copy_pixel = |image: &mut RgbaImage, sx: i32, sy: i32, dx: i32, dy: i32| {
        if image_bounds.contains_point(Point::new(sx, sy))
            && image_bounds.contains_point(Point::new(dx, dy))
        {
            let p = *image.get_pixel(sx as u32, sy as u32);
            image.put_pixel(dx as u32, dy as u32, p);
        }
    };

    for i in 1..=count {
        let d = rect.expand(i);
        let dx0 = d.x;
        let dy0 = d.y;
        let dx1 = d.x1() - 1;
        let dy1 = d.y1() - 1;

        let mut wx = 0;
        let mut wy = 0;
        if mode != WrapMode::Clamp {
            wx = (rect.w - i % rect.w) % rect.w;
            wy = (rect.h - i % rect.h) % rect.h;
            if mode == WrapMode::Mirror {
                if ((i - 1) / rect.w) % 2 == 0 {
                    wx = rect.w - 1 - wx;
                }
                if ((i - 1) / rect.h) % 2 == 0 {
                    wy = rect.h - 1 - wy;
                }
            }
        }
        let sx0 = rect.x + wx;
        let sy0 = rect.y + wy;
        let sx1 = rect.x1() - 1 - wx;
        let sy1 = rect.y1() - 1 - wy;

        if top {
            for x in (dx0 + 1)..dx1 {
                copy_pixel(image, x, sy0, x, dy0);
            }
        }
        if bottom {
            for x in (dx0 + 1)..dx1 {
                copy_pixel(image, x, sy1, x, dy1);
            }
        }
        if left {
            for y in dy0..=dy1 {
                copy_pixel(image, sx0, y, dx0, y);
            }
        }
        if right {
            for y in dy0..=dy1 {
                copy_pixel(image, sx1, y, dx1, y);
            }
        }
    }
}
