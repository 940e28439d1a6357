use std::sync::Arc;

use atlaspack_core::prelude::*;
use image::{Rgba, RgbaImage};

fn blob_source(w: u32, h: u32, blob: Rect) -> Arc<SourceImage> {
    let mut img = RgbaImage::new(w, h);
    for y in blob.y..blob.y1() {
        for x in blob.x..blob.x1() {
            img.put_pixel(x as u32, y as u32, Rgba([200, 100, 50, 255]));
        }
    }
    Arc::new(SourceImage::new(img))
}

fn sprite(index: usize, source: &Arc<SourceImage>) -> Sprite {
    let mut s = Sprite::new(index, format!("sprite_{index}"), source.clone());
    s.trim = Trim::Rect;
    s.sheet = Some(0);
    s
}

#[test]
fn keep_preserves_source_positions() {
    let a = blob_source(64, 32, Rect::new(10, 4, 8, 6));
    let b = blob_source(48, 48, Rect::new(30, 20, 5, 9));
    let mut sprites = vec![sprite(0, &a), sprite(1, &b)];
    let mut sheet = Sheet::new(0, "atlas");
    sheet.pack = PackMode::Keep;

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");

    assert_eq!(slices.len(), 1);
    for s in &sprites {
        assert_eq!(s.trimmed_rect, s.trimmed_source_rect);
        assert_eq!(s.rect, s.source_rect);
    }
}

#[test]
fn layers_stack_sprites_at_the_origin() {
    let source = blob_source(32, 32, Rect::new(2, 2, 12, 20));
    let mut sprites: Vec<Sprite> = (0..4).map(|i| sprite(i, &source)).collect();
    let mut sheet = Sheet::new(0, "atlas");
    sheet.pack = PackMode::Layers;
    sheet.border_padding = 1;

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");

    assert_eq!(slices.len(), 1);
    assert!(slices[0].layered);
    for s in &sprites {
        assert_eq!(s.trimmed_rect.x, s.offset.x + 1);
        assert_eq!(s.trimmed_rect.y, s.offset.y + 1);
    }
    assert_eq!(slices[0].width, 12 + 2);
    assert_eq!(slices[0].height, 20 + 2);
}

#[test]
fn columns_wrap_at_the_height_cap() {
    let source = blob_source(16, 16, Rect::new(0, 0, 10, 10));
    let mut sprites: Vec<Sprite> = (0..6).map(|i| sprite(i, &source)).collect();
    let mut sheet = Sheet::new(0, "atlas");
    sheet.pack = PackMode::Columns;
    sheet.max_height = 32;
    sheet.shape_padding = 2;

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");

    assert_eq!(slices.len(), 1);
    // two sprites per column: a third would end at 24 + 10 > 32
    let placed = &sprites[slices[0].sprites.clone()];
    let columns: std::collections::HashSet<i32> =
        placed.iter().map(|s| s.trimmed_rect.x).collect();
    assert_eq!(columns.len(), 3);
    for s in placed {
        assert!(s.trimmed_rect.y1() <= 32);
    }
}

#[test]
fn rows_overflow_is_an_error() {
    // fixed 8px wide sheet cannot take a 10px sprite
    let source = blob_source(16, 16, Rect::new(0, 0, 10, 10));
    let mut sprites = vec![sprite(0, &source)];
    let mut sheet = Sheet::new(0, "atlas");
    sheet.pack = PackMode::Rows;
    sheet.width = 8;
    sheet.max_width = 8;

    trim_sprites(&mut sprites);
    let result = pack_sprites(&mut sprites, &[sheet]);
    assert!(matches!(result, Err(PackError::NotAllSpritesPacked)));
}

#[test]
fn single_respects_slice_cap() {
    let source = blob_source(16, 16, Rect::new(0, 0, 10, 10));
    let mut sprites: Vec<Sprite> = (0..4).map(|i| sprite(i, &source)).collect();
    let mut sheet = Sheet::new(0, "atlas");
    sheet.pack = PackMode::Single;
    sheet.max_slices = Some(2);

    trim_sprites(&mut sprites);
    let result = pack_sprites(&mut sprites, &[sheet]);
    assert!(matches!(result, Err(PackError::NotAllSpritesPacked)));
}
