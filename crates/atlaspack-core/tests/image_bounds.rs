use atlaspack_core::geom::Rect;
use atlaspack_core::image_util::{
    find_islands, get_alpha_levels, get_gray_levels, get_used_bounds, is_fully_black,
    is_fully_transparent, is_identical,
};
use image::{Rgba, RgbaImage};

fn blank(w: u32, h: u32) -> RgbaImage {
    RgbaImage::new(w, h)
}

fn fill(img: &mut RgbaImage, rect: Rect, color: [u8; 4]) {
    for y in rect.y..rect.y1() {
        for x in rect.x..rect.x1() {
            img.put_pixel(x as u32, y as u32, Rgba(color));
        }
    }
}

#[test]
fn used_bounds_shrinks_to_content() {
    let mut img = blank(20, 10);
    fill(&mut img, Rect::new(5, 2, 4, 3), [255, 0, 0, 255]);
    let full = Rect::new(0, 0, 20, 10);
    let used = get_used_bounds(&img, false, 1, &full);
    assert_eq!(used, Rect::new(5, 2, 4, 3));

    // already tight region stays unchanged
    assert_eq!(get_used_bounds(&img, false, 1, &used), used);

    // every row/column outside the result is fully transparent
    for y in [used.y - 1, used.y1()] {
        assert!(is_fully_transparent(&img, 1, &Rect::new(0, y, 20, 1)));
    }
    for x in [used.x - 1, used.x1()] {
        assert!(is_fully_transparent(&img, 1, &Rect::new(x, 0, 1, 10)));
    }
}

#[test]
fn used_bounds_of_blank_region_is_one_pixel() {
    let img = blank(8, 8);
    let used = get_used_bounds(&img, false, 1, &Rect::new(0, 0, 8, 8));
    assert_eq!((used.w, used.h), (1, 1));
}

#[test]
fn used_bounds_respects_sub_rect() {
    let mut img = blank(16, 16);
    fill(&mut img, Rect::new(0, 0, 16, 16), [0, 255, 0, 255]);
    let sub = Rect::new(4, 4, 8, 8);
    assert_eq!(get_used_bounds(&img, false, 1, &sub), sub);
}

#[test]
fn used_bounds_gray_levels() {
    // opaque but black everywhere except a small bright region
    let mut img = blank(12, 12);
    fill(&mut img, Rect::new(0, 0, 12, 12), [0, 0, 0, 255]);
    fill(&mut img, Rect::new(3, 4, 2, 5), [200, 200, 200, 255]);
    let full = Rect::new(0, 0, 12, 12);
    assert_eq!(get_used_bounds(&img, true, 1, &full), Rect::new(3, 4, 2, 5));
    assert!(is_fully_black(&img, 1, &Rect::new(0, 0, 3, 12)));
    // alpha-based trimming sees the whole image as used
    assert_eq!(get_used_bounds(&img, false, 1, &full), full);
}

#[test]
fn identical_regions_compare_equal() {
    let mut a = blank(16, 8);
    let mut b = blank(12, 12);
    fill(&mut a, Rect::new(2, 1, 5, 4), [1, 2, 3, 4]);
    fill(&mut b, Rect::new(6, 7, 5, 4), [1, 2, 3, 4]);
    assert!(is_identical(
        &a,
        &Rect::new(2, 1, 5, 4),
        &b,
        &Rect::new(6, 7, 5, 4)
    ));
    // size mismatch
    assert!(!is_identical(
        &a,
        &Rect::new(2, 1, 5, 4),
        &b,
        &Rect::new(6, 7, 4, 4)
    ));
    // content mismatch
    b.put_pixel(8, 9, Rgba([9, 9, 9, 9]));
    assert!(!is_identical(
        &a,
        &Rect::new(2, 1, 5, 4),
        &b,
        &Rect::new(6, 7, 5, 4)
    ));
}

#[test]
fn level_extraction() {
    let mut img = blank(4, 2);
    img.put_pixel(1, 0, Rgba([255, 255, 255, 70]));
    img.put_pixel(2, 1, Rgba([255, 255, 255, 200]));
    let alpha = get_alpha_levels(&img, &Rect::new(0, 0, 4, 2));
    assert_eq!(alpha.get_pixel(1, 0)[0], 70);
    assert_eq!(alpha.get_pixel(2, 1)[0], 200);
    assert_eq!(alpha.get_pixel(0, 0)[0], 0);

    let gray = get_gray_levels(&img, &Rect::new(0, 0, 4, 2));
    assert_eq!(gray.get_pixel(1, 0)[0], 255);
    assert_eq!(gray.get_pixel(0, 0)[0], 0);
}

#[test]
fn islands_are_found_and_sorted() {
    let mut img = blank(24, 12);
    // two blobs in one row, one below
    fill(&mut img, Rect::new(1, 1, 3, 3), [255, 0, 0, 255]);
    fill(&mut img, Rect::new(9, 2, 3, 3), [0, 255, 0, 255]);
    fill(&mut img, Rect::new(2, 8, 4, 2), [0, 0, 255, 255]);
    let islands = find_islands(&img, 0, false, &Rect::new(0, 0, 24, 12));
    assert_eq!(islands.len(), 3);
    assert_eq!(islands[0], Rect::new(1, 1, 3, 3));
    assert_eq!(islands[1], Rect::new(9, 2, 3, 3));
    assert_eq!(islands[2], Rect::new(2, 8, 4, 2));
}

#[test]
fn diagonal_pixels_are_one_island() {
    let mut img = blank(6, 6);
    img.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
    img.put_pixel(2, 2, Rgba([255, 255, 255, 255]));
    img.put_pixel(3, 3, Rgba([255, 255, 255, 255]));
    let islands = find_islands(&img, 0, false, &Rect::new(0, 0, 6, 6));
    assert_eq!(islands.len(), 1);
    assert_eq!(islands[0], Rect::new(1, 1, 3, 3));
}

#[test]
fn close_islands_merge_over_content() {
    let mut img = blank(16, 8);
    fill(&mut img, Rect::new(1, 1, 3, 3), [255, 0, 0, 255]);
    fill(&mut img, Rect::new(6, 1, 3, 3), [255, 0, 0, 255]);

    // distance 1 leaves a blank gap between the expanded bounds
    let islands = find_islands(&img, 1, false, &Rect::new(0, 0, 16, 8));
    assert_eq!(islands.len(), 2);

    // distance 3 reaches across the gap onto real content
    let islands = find_islands(&img, 3, false, &Rect::new(0, 0, 16, 8));
    assert_eq!(islands.len(), 1);
    assert_eq!(islands[0], Rect::new(1, 1, 8, 3));
}
