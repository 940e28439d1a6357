use std::sync::Arc;

use atlaspack_core::prelude::*;
use image::{Rgba, RgbaImage};

/// Filled disc; convex trimming gives it a real polygonal hull.
fn disc_source(size: u32) -> Arc<SourceImage> {
    let mut img = RgbaImage::new(size, size);
    let c = (size / 2) as i32;
    let r = (size / 2) as i32 - 1;
    for y in 0..size as i32 {
        for x in 0..size as i32 {
            if (x - c) * (x - c) + (y - c) * (y - c) <= r * r {
                img.put_pixel(x as u32, y as u32, Rgba([255, 255, 255, 255]));
            }
        }
    }
    Arc::new(SourceImage::new(img))
}

#[test]
fn compact_settles_shaped_sprites() {
    let sources: Vec<Arc<SourceImage>> = [12u32, 16, 20, 14, 18, 12, 16, 10]
        .iter()
        .map(|&s| disc_source(s))
        .collect();
    let mut sprites: Vec<Sprite> = sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let mut sprite = Sprite::new(i, format!("disc_{i}"), source.clone());
            sprite.trim = Trim::Convex;
            sprite.sheet = Some(0);
            sprite
        })
        .collect();
    let mut sheet = Sheet::new(0, "atlas");
    sheet.pack = PackMode::Compact;
    sheet.border_padding = 2;
    sheet.shape_padding = 1;

    trim_sprites(&mut sprites);
    for sprite in &sprites {
        assert!(!sprite.vertices.is_empty());
    }
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");

    assert_eq!(slices.len(), 1);
    let slice = &slices[0];
    assert!(slice.width > 0 && slice.height > 0);

    // the simulation moves sprites but keeps their content sizes and leaves
    // them near the slice area (generous tolerance for solver wiggle)
    let area = Rect::new(0, 0, slice.width, slice.height).expand(16);
    for sprite in &sprites[slice.sprites.clone()] {
        let tsr = sprite.trimmed_source_rect;
        assert_eq!((sprite.trimmed_rect.w, sprite.trimmed_rect.h), (tsr.w, tsr.h));
        assert!(
            area.contains_rect(&sprite.trimmed_rect),
            "sprite '{}' at {:?} escaped slice {}x{}",
            sprite.id,
            sprite.trimmed_rect,
            slice.width,
            slice.height
        );
    }
}

#[test]
fn compact_leaves_rectangular_sprites_in_place() {
    // rect-trimmed sprites have no hull; compact falls back to their
    // binpack placement
    let mut img = RgbaImage::new(8, 8);
    for p in img.pixels_mut() {
        *p = Rgba([10, 20, 30, 255]);
    }
    let source = Arc::new(SourceImage::new(img));
    let mut sprites: Vec<Sprite> = (0..4)
        .map(|i| {
            let mut sprite = Sprite::new(i, format!("box_{i}"), source.clone());
            sprite.trim = Trim::Rect;
            sprite.sheet = Some(0);
            sprite
        })
        .collect();
    let mut sheet = Sheet::new(0, "atlas");
    sheet.pack = PackMode::Compact;

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");

    assert_eq!(slices.len(), 1);
    let slice = &slices[0];
    let placed = &sprites[slice.sprites.clone()];
    for (i, a) in placed.iter().enumerate() {
        assert!(a.trimmed_rect.x >= 0 && a.trimmed_rect.y >= 0);
        assert!(a.trimmed_rect.x1() <= slice.width);
        for b in &placed[i + 1..] {
            assert!(!a.trimmed_rect.overlaps(&b.trimmed_rect));
        }
    }
}
