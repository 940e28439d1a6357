//! Pixel-level primitives over [`image`] buffers: used-bounds trimming, identity
//! checks, alpha/gray level extraction and island detection.
//!
//! All functions take explicit rectangles so sprites can share one source image;
//! every indexed access goes through [`check_rect`].

use image::{GrayImage, ImageBuffer, Pixel, Rgba, RgbaImage};

use crate::geom::Rect;

/// Perceptual gray value; the weights match the ones used for gray-level trimming.
pub fn to_gray(p: Rgba<u8>) -> u8 {
    ((u32::from(p[0]) * 77 + u32::from(p[1]) * 151 + u32::from(p[2]) * 28) >> 8) as u8
}

/// Full bounds of an image as a [`Rect`].
pub fn bounds<P: Pixel<Subpixel = u8>>(image: &ImageBuffer<P, Vec<u8>>) -> Rect {
    Rect::new(0, 0, image.width() as i32, image.height() as i32)
}

/// Panics when `rect` does not lie within `image`.
pub fn check_rect<P: Pixel<Subpixel = u8>>(image: &ImageBuffer<P, Vec<u8>>, rect: &Rect) {
    assert!(
        rect.x >= 0
            && rect.y >= 0
            && rect.w >= 0
            && rect.h >= 0
            && rect.x1() <= image.width() as i32
            && rect.y1() <= image.height() as i32,
        "rect {rect:?} outside image bounds {}x{}",
        image.width(),
        image.height()
    );
}

fn all_of(image: &RgbaImage, rect: &Rect, predicate: impl Fn(Rgba<u8>) -> bool) -> bool {
    check_rect(image, rect);
    for y in rect.y..rect.y1() {
        for x in rect.x..rect.x1() {
            if !predicate(*image.get_pixel(x as u32, y as u32)) {
                return false;
            }
        }
    }
    true
}

/// True when every alpha value within `rect` is below `threshold`.
pub fn is_fully_transparent(image: &RgbaImage, threshold: u8, rect: &Rect) -> bool {
    all_of(image, rect, |p| p[3] < threshold)
}

/// True when every gray value within `rect` is below `threshold`.
pub fn is_fully_black(image: &RgbaImage, threshold: u8, rect: &Rect) -> bool {
    all_of(image, rect, |p| to_gray(p) < threshold)
}

/// True when the two regions have equal size and byte-wise equal RGBA rows.
pub fn is_identical(image_a: &RgbaImage, rect_a: &Rect, image_b: &RgbaImage, rect_b: &Rect) -> bool {
    check_rect(image_a, rect_a);
    check_rect(image_b, rect_b);
    if rect_a.w != rect_b.w || rect_a.h != rect_b.h {
        return false;
    }

    let stride_a = image_a.width() as usize * 4;
    let stride_b = image_b.width() as usize * 4;
    let raw_a = image_a.as_raw();
    let raw_b = image_b.as_raw();
    let row_len = rect_a.w as usize * 4;
    for y in 0..rect_a.h as usize {
        let a = (rect_a.y as usize + y) * stride_a + rect_a.x as usize * 4;
        let b = (rect_b.y as usize + y) * stride_b + rect_b.x as usize * 4;
        if raw_a[a..a + row_len] != raw_b[b..b + row_len] {
            return false;
        }
    }
    true
}

/// Shrinks `rect` until no boundary row or column is fully transparent (or
/// fully black when `gray_levels`). Over an entirely blank region the result
/// collapses to a 1x1 rect, never to an empty one.
pub fn get_used_bounds(image: &RgbaImage, gray_levels: bool, threshold: u8, rect: &Rect) -> Rect {
    check_rect(image, rect);
    let blank = |r: &Rect| {
        if gray_levels {
            is_fully_black(image, threshold, r)
        } else {
            is_fully_transparent(image, threshold, r)
        }
    };

    let x1 = rect.x + rect.w - 1;
    let y1 = rect.y + rect.h - 1;

    let mut min_y = rect.y;
    while min_y < y1 && blank(&Rect::new(rect.x, min_y, rect.w, 1)) {
        min_y += 1;
    }
    let mut max_y = y1;
    while max_y > min_y && blank(&Rect::new(rect.x, max_y, rect.w, 1)) {
        max_y -= 1;
    }
    let mut min_x = rect.x;
    while min_x < x1 && blank(&Rect::new(min_x, min_y, 1, max_y - min_y + 1)) {
        min_x += 1;
    }
    let mut max_x = x1;
    while max_x > min_x && blank(&Rect::new(max_x, min_y, 1, max_y - min_y + 1)) {
        max_x -= 1;
    }

    Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
}

/// Extracts the alpha channel of `rect` into a single-channel image.
pub fn get_alpha_levels(image: &RgbaImage, rect: &Rect) -> GrayImage {
    check_rect(image, rect);
    GrayImage::from_fn(rect.w as u32, rect.h as u32, |x, y| {
        let p = image.get_pixel(rect.x as u32 + x, rect.y as u32 + y);
        image::Luma([p[3]])
    })
}

/// Extracts the gray values of `rect` into a single-channel image.
pub fn get_gray_levels(image: &RgbaImage, rect: &Rect) -> GrayImage {
    check_rect(image, rect);
    GrayImage::from_fn(rect.w as u32, rect.h as u32, |x, y| {
        image::Luma([to_gray(*image.get_pixel(rect.x as u32 + x, rect.y as u32 + y))])
    })
}

/// Flood-fills the 8-connected non-zero region around `(start_x, start_y)`,
/// clearing visited pixels and growing the bounding box through `count`.
fn flood_fill_8(
    levels: &mut GrayImage,
    start_x: i32,
    start_y: i32,
    mut count: impl FnMut(i32, i32),
) {
    let w = levels.width() as i32;
    let h = levels.height() as i32;
    let mut stack = Vec::new();
    let add = |levels: &mut GrayImage, stack: &mut Vec<(i32, i32)>, x: i32, y: i32| {
        let pixel = levels.get_pixel_mut(x as u32, y as u32);
        if pixel[0] != 0 {
            pixel[0] = 0;
            stack.push((x, y));
        }
    };
    add(levels, &mut stack, start_x, start_y);

    while let Some((x, y)) = stack.pop() {
        count(x, y);
        if y > 0 {
            add(levels, &mut stack, x, y - 1);
        }
        if y < h - 1 {
            add(levels, &mut stack, x, y + 1);
        }
        if x > 0 {
            add(levels, &mut stack, x - 1, y);
            if y > 0 {
                add(levels, &mut stack, x - 1, y - 1);
            }
            if y < h - 1 {
                add(levels, &mut stack, x - 1, y + 1);
            }
        }
        if x < w - 1 {
            add(levels, &mut stack, x + 1, y);
            if y > 0 {
                add(levels, &mut stack, x + 1, y - 1);
            }
            if y < h - 1 {
                add(levels, &mut stack, x + 1, y + 1);
            }
        }
    }
}

fn merge_adjacent_rects(image: &RgbaImage, rects: &mut Vec<Rect>, distance: i32, gray_levels: bool) {
    let adjacent = |a: &Rect, b: &Rect| {
        let intersection = a.intersect(&b.expand(distance));
        if intersection.is_empty() {
            return false;
        }
        if gray_levels {
            !is_fully_black(image, 1, &intersection)
        } else {
            !is_fully_transparent(image, 1, &intersection)
        }
    };

    loop {
        let mut merged = false;
        let mut i = 0;
        while i < rects.len() {
            let mut j = i + 1;
            while j < rects.len() {
                if adjacent(&rects[i], &rects[j]) {
                    rects[i] = rects[i].combine(&rects[j]);
                    rects.swap_remove(j);
                    merged = true;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        if !merged {
            break;
        }
    }
}

/// Finds the bounding rectangles of 8-connected opaque (or non-black) islands,
/// merges islands whose expanded bounds overlap over non-blank content, and
/// sorts them top-to-bottom then left-to-right with a fuzzy row tolerance.
pub fn find_islands(
    image: &RgbaImage,
    merge_distance: i32,
    gray_levels: bool,
    rect: &Rect,
) -> Vec<Rect> {
    let mut levels = if gray_levels {
        get_gray_levels(image, rect)
    } else {
        get_alpha_levels(image, rect)
    };

    let mut islands = Vec::new();
    for y in 0..rect.h {
        for x in 0..rect.w {
            if levels.get_pixel(x as u32, y as u32)[0] != 0 {
                let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);
                flood_fill_8(&mut levels, x, y, |px, py| {
                    min_x = min_x.min(px);
                    min_y = min_y.min(py);
                    max_x = max_x.max(px);
                    max_y = max_y.max(py);
                });
                islands.push(Rect::new(
                    rect.x + min_x,
                    rect.y + min_y,
                    max_x - min_x + 1,
                    max_y - min_y + 1,
                ));
            }
        }
    }

    merge_adjacent_rects(image, &mut islands, merge_distance, gray_levels);

    // fuzzy sort from top to bottom, left to right
    islands.sort_by(|a, b| {
        let row_tolerance = a.h.min(b.h) / 4;
        let ca = a.center();
        let cb = b.center();
        if ca.y < cb.y - row_tolerance {
            std::cmp::Ordering::Less
        } else if cb.y < ca.y - row_tolerance {
            std::cmp::Ordering::Greater
        } else {
            (ca.x, ca.y).cmp(&(cb.x, cb.y))
        }
    });

    islands
}
