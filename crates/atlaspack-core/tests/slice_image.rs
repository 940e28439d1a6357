use std::sync::Arc;

use atlaspack_core::compositing::{copy_rect_rotated_cw, get_slice_image};
use atlaspack_core::geom::{PointF, Rect};
use atlaspack_core::prelude::*;
use image::{Rgba, RgbaImage};

fn solid_source(w: u32, h: u32, color: [u8; 4]) -> Arc<SourceImage> {
    let mut img = RgbaImage::new(w, h);
    for p in img.pixels_mut() {
        *p = Rgba(color);
    }
    Arc::new(SourceImage::new(img))
}

#[test]
fn composites_sprites_at_their_placements() {
    let red = solid_source(8, 8, [255, 0, 0, 255]);
    let green = solid_source(6, 10, [0, 255, 0, 255]);
    let mut sprites = vec![
        Sprite::new(0, "red", red.clone()),
        Sprite::new(1, "green", green.clone()),
    ];
    for s in &mut sprites {
        s.sheet = Some(0);
    }
    let mut sheet = Sheet::new(0, "atlas");
    sheet.shape_padding = 1;

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");
    assert_eq!(slices.len(), 1);

    let image = get_slice_image(&slices[0], &sprites, None).expect("image");
    assert_eq!(
        (image.width() as i32, image.height() as i32),
        (slices[0].width, slices[0].height)
    );
    for sprite in &sprites[slices[0].sprites.clone()] {
        let expected = if sprite.id == "red" {
            [255, 0, 0, 255]
        } else {
            [0, 255, 0, 255]
        };
        let r = sprite.trimmed_rect;
        for (x, y) in [(r.x, r.y), (r.x1() - 1, r.y1() - 1)] {
            assert_eq!(image.get_pixel(x as u32, y as u32).0, expected);
        }
    }
    // padding between sprites stays transparent
    let total: u32 = sprites.iter().map(|s| (s.trimmed_rect.w * s.trimmed_rect.h) as u32).sum();
    let opaque = image.pixels().filter(|p| p[3] != 0).count() as u32;
    assert_eq!(opaque, total);
}

#[test]
fn rotated_copy_maps_pixels_clockwise() {
    let mut src = RgbaImage::new(3, 2);
    let mut v = 0u8;
    for y in 0..2 {
        for x in 0..3 {
            src.put_pixel(x, y, Rgba([v, 0, 0, 255]));
            v += 1;
        }
    }
    let mut dest = RgbaImage::new(2, 3);
    copy_rect_rotated_cw(&src, &Rect::new(0, 0, 3, 2), &mut dest, 0, 0);
    // source (x, y) lands at (h - 1 - y, x)
    for y in 0..2i32 {
        for x in 0..3i32 {
            let p = src.get_pixel(x as u32, y as u32);
            let q = dest.get_pixel((2 - 1 - y) as u32, x as u32);
            assert_eq!(p, q);
        }
    }
}

#[test]
fn hull_masked_copy_skips_pixels_outside_the_polygon() {
    let source = solid_source(4, 4, [9, 9, 9, 255]);
    let mut sprite = Sprite::new(0, "tri", source);
    sprite.sheet = Some(0);
    // a triangular hull over the full 4x4 tile
    sprite.vertices = vec![
        PointF::new(0.0, 0.0),
        PointF::new(4.0, 0.0),
        PointF::new(0.0, 4.0),
    ];
    let mut sprites = vec![sprite];
    let sheet = Sheet::new(0, "atlas");

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");
    let image = get_slice_image(&slices[0], &sprites, None).expect("image");

    let r = sprites[slices[0].sprites.clone()][0].trimmed_rect;
    // inside the triangle
    assert_eq!(image.get_pixel(r.x as u32, r.y as u32)[3], 255);
    // the far corner lies outside
    assert_eq!(image.get_pixel((r.x1() - 1) as u32, (r.y1() - 1) as u32)[3], 0);
}

#[test]
fn extrusion_fills_the_border_ring() {
    let source = solid_source(5, 5, [70, 80, 90, 255]);
    let mut sprite = Sprite::new(0, "ex", source);
    sprite.sheet = Some(0);
    sprite.extrude = Extrude {
        count: 1,
        mode: WrapMode::Clamp,
    };
    let mut sprites = vec![sprite];
    let mut sheet = Sheet::new(0, "atlas");
    sheet.pack = PackMode::Single;

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");
    // the cell grows by the extrusion on each side
    assert_eq!((slices[0].width, slices[0].height), (7, 7));

    let image = get_slice_image(&slices[0], &sprites, None).expect("image");
    for (x, y) in [(0, 0), (3, 0), (6, 6), (0, 3), (6, 3)] {
        assert_eq!(image.get_pixel(x, y).0, [70, 80, 90, 255], "at ({x}, {y})");
    }
}

#[test]
fn missing_map_yields_no_image() {
    let source = solid_source(4, 4, [1, 2, 3, 255]);
    let mut sprite = Sprite::new(0, "plain", source);
    sprite.sheet = Some(0);
    let mut sprites = vec![sprite];
    let sheet = Sheet::new(0, "atlas");

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");
    assert!(get_slice_image(&slices[0], &sprites, Some(0)).is_none());
    assert!(get_slice_image(&slices[0], &sprites, None).is_some());
}
