use std::sync::Arc;

use atlaspack_core::prelude::*;
use image::{Rgba, RgbaImage};

/// A 256x256 sheet of 31 grid cells (16x16) with blobs of varying sizes.
fn grid_source() -> (Arc<SourceImage>, Vec<Rect>) {
    let mut img = RgbaImage::new(256, 256);
    let mut cells = Vec::new();
    for i in 0..31i32 {
        let cell = Rect::new((i % 8) * 16, (i / 8) * 16, 16, 16);
        let w = 3 + (i * 5) % 13;
        let h = 3 + (i * 7) % 13;
        for y in 0..h {
            for x in 0..w {
                img.put_pixel(
                    (cell.x + 1 + x) as u32,
                    (cell.y + 1 + y) as u32,
                    Rgba([(10 + i * 7) as u8, 100, 200, 255]),
                );
            }
        }
        cells.push(cell);
    }
    (Arc::new(SourceImage::new(img)), cells)
}

fn grid_sprites(source: &Arc<SourceImage>, cells: &[Rect]) -> Vec<Sprite> {
    cells
        .iter()
        .enumerate()
        .map(|(i, &cell)| {
            let mut sprite = Sprite::new(i, format!("sprite_{i}"), source.clone());
            sprite.source_rect = cell;
            sprite.trim = Trim::Rect;
            sprite.sheet = Some(0);
            sprite
        })
        .collect()
}

fn assert_trimmed_sizes(sprites: &[Sprite]) {
    for s in sprites.iter().filter(|s| s.sheet.is_some()) {
        let tsr = s.trimmed_source_rect;
        if s.rotated {
            assert_eq!((s.trimmed_rect.w, s.trimmed_rect.h), (tsr.h, tsr.w));
        } else {
            assert_eq!((s.trimmed_rect.w, s.trimmed_rect.h), (tsr.w, tsr.h));
        }
        assert!(s.source_rect.contains_rect(&tsr));
    }
}

fn assert_disjoint_placements(slices: &[Slice], sprites: &[Sprite]) {
    for slice in slices {
        let placed = &sprites[slice.sprites.clone()];
        for (i, a) in placed.iter().enumerate() {
            assert!(a.trimmed_rect.x >= 0 && a.trimmed_rect.y >= 0);
            assert!(
                a.trimmed_rect.x1() <= slice.width && a.trimmed_rect.y1() <= slice.height,
                "sprite '{}' {:?} outside slice {}x{}",
                a.id,
                a.trimmed_rect,
                slice.width,
                slice.height
            );
            for b in &placed[i + 1..] {
                assert!(
                    !a.trimmed_rect.overlaps(&b.trimmed_rect),
                    "sprites '{}' and '{}' overlap",
                    a.id,
                    b.id
                );
            }
        }
    }
}

fn assert_spans_cover(slices: &[Slice], sprites: &[Sprite]) {
    let mut covered = vec![false; sprites.len()];
    for slice in slices {
        for i in slice.sprites.clone() {
            assert!(!covered[i], "sprite position {i} in two slices");
            covered[i] = true;
            assert_eq!(sprites[i].slice_index, slice.index);
        }
    }
    for (i, sprite) in sprites.iter().enumerate() {
        if sprite.sheet.is_some() && sprite.duplicate_of_index.is_none() {
            assert!(covered[i], "sprite '{}' not in any slice", sprite.id);
        }
    }
}

#[test]
fn single_sheet_binpack() {
    let (source, cells) = grid_source();
    let mut sprites = grid_sprites(&source, &cells);
    let sheet = Sheet::new(0, "atlas");

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");

    assert_eq!(slices.len(), 1);
    assert!(slices[0].width <= 128 && slices[0].height <= 128);
    assert_trimmed_sizes(&sprites);
    assert_disjoint_placements(&slices, &sprites);
    assert_spans_cover(&slices, &sprites);
}

#[test]
fn power_of_two_slices() {
    let is_pow2 = |v: i32| v > 0 && (v & (v - 1)) == 0;
    let (source, cells) = grid_source();
    let mut sprites = grid_sprites(&source, &cells);
    let mut sheet = Sheet::new(0, "atlas");
    sheet.power_of_two = true;

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");

    for slice in &slices {
        assert!(is_pow2(slice.width));
        assert!(is_pow2(slice.height));
    }
    assert_disjoint_placements(&slices, &sprites);
}

#[test]
fn multi_sheet_cap_with_square_slices() {
    let (source, cells) = grid_source();
    let mut sprites = grid_sprites(&source, &cells);
    let mut sheet = Sheet::new(0, "atlas");
    sheet.max_width = 40;
    sheet.max_height = 40;
    sheet.square = true;

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");

    assert!(slices.len() >= 2, "expected multiple slices");
    for slice in &slices {
        assert_eq!(slice.width, slice.height);
        assert!(slice.width <= 40);
    }
    assert_trimmed_sizes(&sprites);
    assert_disjoint_placements(&slices, &sprites);
    assert_spans_cover(&slices, &sprites);
    // slice ordinals follow the sheet's output sequence
    for (i, slice) in slices.iter().enumerate() {
        assert_eq!(slice.sheet_index, i);
        assert_eq!(slice.index, i);
    }
}

#[test]
fn rows_with_height_cap() {
    let (source, cells) = grid_source();
    let mut sprites = grid_sprites(&source, &cells);
    let mut sheet = Sheet::new(0, "atlas");
    sheet.pack = PackMode::Rows;
    sheet.max_height = 16;

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");

    assert_eq!(slices.len(), 1);
    for slice in &slices {
        assert!(slice.height <= 16);
    }
    // everything ends up in one long row
    let total_width: i32 = sprites.iter().map(|s| s.size.x).sum();
    assert!(slices[0].width >= total_width);
    assert_disjoint_placements(&slices, &sprites);
}

#[test]
fn single_sprite_per_slice() {
    let (source, cells) = grid_source();
    let mut sprites = grid_sprites(&source, &cells);
    let mut sheet = Sheet::new(0, "atlas");
    sheet.pack = PackMode::Single;
    sheet.border_padding = 2;

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");

    assert_eq!(slices.len(), 31);
    for slice in &slices {
        assert_eq!(slice.sprites.len(), 1);
        let sprite = &sprites[slice.sprites.start];
        assert_eq!(slice.width, sprite.size.x + 4);
        assert_eq!(slice.height, sprite.size.y + 4);
    }
}

#[test]
fn fixed_width_sheet_is_kept() {
    let (source, cells) = grid_source();
    let mut sprites = grid_sprites(&source, &cells);
    let mut sheet = Sheet::new(0, "atlas");
    sheet.width = 96;
    sheet.height = 96;

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");
    assert_eq!(slices.len(), 1);
    assert_eq!((slices[0].width, slices[0].height), (96, 96));
}

#[test]
fn two_sheets_pack_independently() {
    let (source, cells) = grid_source();
    let mut sprites = grid_sprites(&source, &cells);
    for sprite in sprites.iter_mut().skip(16) {
        sprite.sheet = Some(1);
    }
    let sheet_a = Sheet::new(0, "a");
    let sheet_b = Sheet::new(1, "b");

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet_a, sheet_b]).expect("pack");

    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].sheet, 0);
    assert_eq!(slices[1].sheet, 1);
    assert_eq!(slices[0].sprites.len(), 16);
    assert_eq!(slices[1].sprites.len(), 15);
    for i in slices[0].sprites.clone() {
        assert!(sprites[i].index < 16);
    }
    assert_spans_cover(&slices, &sprites);
}

#[test]
fn divisible_width_is_applied() {
    let (source, cells) = grid_source();
    let mut sprites = grid_sprites(&source, &cells);
    let mut sheet = Sheet::new(0, "atlas");
    sheet.divisible_width = 8;

    trim_sprites(&mut sprites);
    let slices = pack_sprites(&mut sprites, &[sheet]).expect("pack");
    for slice in &slices {
        assert_eq!(slice.width % 8, 0);
    }
}

#[test]
fn invalid_source_rect_is_rejected() {
    let (source, _) = grid_source();
    let mut sprite = Sprite::new(0, "bad", source);
    sprite.source_rect = Rect::new(250, 250, 16, 16);
    sprite.sheet = Some(0);
    let sheet = Sheet::new(0, "atlas");
    let mut sprites = vec![sprite];
    let result = pack_sprites(&mut sprites, &[sheet]);
    assert!(matches!(result, Err(PackError::InvalidInput(_))));
}

#[test]
fn inconsistent_sheet_is_rejected() {
    let (source, cells) = grid_source();
    let mut sprites = grid_sprites(&source, &cells);
    let mut sheet = Sheet::new(0, "atlas");
    sheet.width = 128;
    sheet.max_width = 64;
    trim_sprites(&mut sprites);
    let result = pack_sprites(&mut sprites, &[sheet]);
    assert!(matches!(result, Err(PackError::InvalidInput(_))));
}
