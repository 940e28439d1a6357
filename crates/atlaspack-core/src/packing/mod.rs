//! Packing orchestrator: derives per-sprite sizes and offsets, dispatches the
//! per-sheet pack strategy (deduplicating first when requested) and finalizes
//! slice dimensions and sprite rects.

mod binpack;
mod compact;
mod keep;
mod layers;
mod lines;
mod single;

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::instrument;

use crate::error::{PackError, Result};
use crate::geom::{ceil_multiple, ceil_to_pot, floor_to_pot, Rect};
use crate::image_util::is_identical;
use crate::model::{AlignX, AlignY, Duplicates, PackMode, PivotX, PivotY, Sheet, Slice, Sprite};
use crate::scheduler::scheduler;

/// Packs all sprites into slices: the full pipeline after trimming.
///
/// Reorders the sprite vector (stable per sheet, then per slice); `index`
/// keeps each sprite's input identity. Returned slices hold index ranges into
/// the reordered vector.
#[instrument(skip_all)]
pub fn pack_sprites(sprites: &mut [Sprite], sheets: &[Sheet]) -> Result<Vec<Slice>> {
    validate(sprites, sheets)?;

    for sprite in sprites.iter_mut() {
        update_sprite_size(sprite);
    }
    update_common_sizes(sprites);
    for sprite in sprites.iter_mut() {
        update_sprite_offset(sprite);
    }

    let mut slices = pack_sprites_by_sheet(sprites, sheets)?;

    for sprite in sprites.iter_mut() {
        update_sprite_rect(sprite);
        update_sprite_pivot_point(sprite);
    }

    for (index, slice) in slices.iter_mut().enumerate() {
        slice.index = index;
        recompute_slice_size(slice, &sheets[slice.sheet], sprites);
    }
    Ok(slices)
}

fn validate(sprites: &[Sprite], sheets: &[Sheet]) -> Result<()> {
    for sheet in sheets {
        if sheet.max_width > 0 && sheet.width > sheet.max_width {
            return Err(PackError::InvalidInput(format!(
                "sheet '{}': width {} exceeds max width {}",
                sheet.id, sheet.width, sheet.max_width
            )));
        }
        if sheet.max_height > 0 && sheet.height > sheet.max_height {
            return Err(PackError::InvalidInput(format!(
                "sheet '{}': height {} exceeds max height {}",
                sheet.id, sheet.height, sheet.max_height
            )));
        }
        if sheet.border_padding < 0 || sheet.shape_padding < 0 {
            return Err(PackError::InvalidInput(format!(
                "sheet '{}': negative padding",
                sheet.id
            )));
        }
    }
    for sprite in sprites {
        if sprite.source_rect.w <= 0 || sprite.source_rect.h <= 0 {
            return Err(PackError::InvalidInput(format!(
                "sprite '{}': non-positive source rect",
                sprite.id
            )));
        }
        if !sprite.source.bounds().contains_rect(&sprite.source_rect) {
            return Err(PackError::InvalidInput(format!(
                "sprite '{}': source rect outside its image",
                sprite.id
            )));
        }
        if let Some(sheet) = sprite.sheet {
            if sheet >= sheets.len() {
                return Err(PackError::InvalidInput(format!(
                    "sprite '{}': sheet index {} out of range",
                    sprite.id, sheet
                )));
            }
        }
    }
    Ok(())
}

fn update_sprite_size(sprite: &mut Sprite) {
    let content = sprite.trimmed_source_rect.size();
    let div_x = sprite.divisible_size.x.max(1);
    let div_y = sprite.divisible_size.y.max(1);
    sprite.size.x = sprite
        .min_size
        .x
        .max(ceil_multiple(content.x + 2 * sprite.extrude.count, div_x));
    sprite.size.y = sprite
        .min_size
        .y
        .max(ceil_multiple(content.y + 2 * sprite.extrude.count, div_y));
}

fn update_common_sizes(sprites: &mut [Sprite]) {
    let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, sprite) in sprites.iter().enumerate() {
        if !sprite.common_size.is_empty() {
            by_key.entry(sprite.common_size.clone()).or_default().push(i);
        }
    }
    for group in by_key.values() {
        let mut max_x = 0;
        let mut max_y = 0;
        for &i in group {
            max_x = max_x.max(sprites[i].size.x);
            max_y = max_y.max(sprites[i].size.y);
        }
        for &i in group {
            sprites[i].size.x = max_x.max(sprites[i].size.x);
            sprites[i].size.y = max_y.max(sprites[i].size.y);
        }
    }
}

fn update_sprite_offset(sprite: &mut Sprite) {
    let margin_x = sprite.size.x - sprite.trimmed_source_rect.w;
    let margin_y = sprite.size.y - sprite.trimmed_source_rect.h;
    sprite.offset.x = match sprite.align.x {
        AlignX::Left => 0,
        AlignX::Center => margin_x / 2,
        AlignX::Right => margin_x,
    };
    sprite.offset.y = match sprite.align.y {
        AlignY::Top => 0,
        AlignY::Middle => margin_y / 2,
        AlignY::Bottom => margin_y,
    };
}

fn update_sprite_rect(sprite: &mut Sprite) {
    let tsr = sprite.trimmed_source_rect;
    if sprite.rotated {
        sprite.trimmed_rect.w = tsr.h;
        sprite.trimmed_rect.h = tsr.w;
    } else {
        sprite.trimmed_rect.w = tsr.w;
        sprite.trimmed_rect.h = tsr.h;
    }

    if sprite.crop {
        sprite.rect = sprite.trimmed_rect;
    } else if sprite.rotated {
        // margins rotate with the content: the source bottom margin becomes
        // the left margin, the source left margin the top margin
        let left = tsr.x - sprite.source_rect.x;
        let bottom = sprite.source_rect.y1() - tsr.y1();
        sprite.rect = Rect::new(
            sprite.trimmed_rect.x - bottom,
            sprite.trimmed_rect.y - left,
            sprite.source_rect.h,
            sprite.source_rect.w,
        );
    } else {
        sprite.rect = Rect::new(
            sprite.trimmed_rect.x - (tsr.x - sprite.source_rect.x),
            sprite.trimmed_rect.y - (tsr.y - sprite.source_rect.y),
            sprite.source_rect.w,
            sprite.source_rect.h,
        );
    }
}

fn update_sprite_pivot_point(sprite: &mut Sprite) {
    let pivot_rect = if sprite.crop_pivot {
        sprite.trimmed_source_rect
    } else {
        sprite.source_rect
    };
    match sprite.pivot.x {
        PivotX::Left => {}
        PivotX::Center => sprite.pivot_point.x += pivot_rect.w as f32 / 2.0,
        PivotX::Right => sprite.pivot_point.x += pivot_rect.w as f32,
    }
    match sprite.pivot.y {
        PivotY::Top => {}
        PivotY::Middle => sprite.pivot_point.y += pivot_rect.h as f32 / 2.0,
        PivotY::Bottom => sprite.pivot_point.y += pivot_rect.h as f32,
    }
    sprite.pivot_point.x -= (sprite.rect.x - sprite.trimmed_rect.x) as f32;
    sprite.pivot_point.y -= (sprite.rect.y - sprite.trimmed_rect.y) as f32;
    sprite.pivot_point.x += (pivot_rect.x - sprite.trimmed_source_rect.x) as f32;
    sprite.pivot_point.y += (pivot_rect.y - sprite.trimmed_source_rect.y) as f32;
}

fn pack_sprites_by_sheet(sprites: &mut [Sprite], sheets: &[Sheet]) -> Result<Vec<Slice>> {
    if sprites.is_empty() {
        return Ok(Vec::new());
    }

    // group into contiguous per-sheet spans; sheetless sprites sort last
    sprites.sort_by_key(|s| (s.sheet.unwrap_or(usize::MAX), s.index));

    let mut slices = Vec::new();
    let mut begin = 0;
    while begin < sprites.len() {
        let Some(sheet_index) = sprites[begin].sheet else {
            break;
        };
        let mut end = begin + 1;
        while end < sprites.len() && sprites[end].sheet == Some(sheet_index) {
            end += 1;
        }
        let sheet = &sheets[sheet_index];
        if sheet.duplicates != Duplicates::Keep {
            pack_span_deduplicate(sheet, begin, &mut sprites[begin..end], &mut slices)?;
        } else {
            pack_span(sheet, begin, &mut sprites[begin..end], &mut slices)?;
        }
        begin = end;
    }
    Ok(slices)
}

fn pack_span(
    sheet: &Sheet,
    base: usize,
    sprites: &mut [Sprite],
    slices: &mut Vec<Slice>,
) -> Result<()> {
    debug_assert!(!sprites.is_empty());
    match sheet.pack {
        PackMode::Binpack => {
            let fast = sprites.len() > 1000;
            binpack::pack_binpack(sheet, base, sprites, fast, slices)
        }
        PackMode::Compact => compact::pack_compact(sheet, base, sprites, slices),
        PackMode::Single => single::pack_single(sheet, base, sprites, slices),
        PackMode::Keep => keep::pack_keep(sheet, base, sprites, slices),
        PackMode::Rows => lines::pack_lines(true, sheet, base, sprites, slices),
        PackMode::Columns => lines::pack_lines(false, sheet, base, sprites, slices),
        PackMode::Layers => layers::pack_layers(sheet, base, sprites, slices),
    }
}

/// Moves pixel-identical duplicates to the back of the span, packs the unique
/// prefix, then applies the sheet's duplicate policy to the rest.
fn pack_span_deduplicate(
    sheet: &Sheet,
    base: usize,
    sprites: &mut [Sprite],
    slices: &mut Vec<Slice>,
) -> Result<()> {
    debug_assert!(!sprites.is_empty());

    let mut unique_len = sprites.len();
    let mut i = 0;
    while i < unique_len {
        let mut duplicate_of = None;
        for j in 0..i {
            if is_identical(
                &sprites[i].source.rgba,
                &sprites[i].trimmed_source_rect,
                &sprites[j].source.rgba,
                &sprites[j].trimmed_source_rect,
            ) {
                duplicate_of = Some(sprites[j].index);
                break;
            }
        }
        if let Some(representative) = duplicate_of {
            sprites[i].duplicate_of_index = Some(representative);
            sprites.swap(i, unique_len - 1);
            unique_len -= 1;
        } else {
            i += 1;
        }
    }

    // restore input order of the unique sprites before packing
    sprites[..unique_len].sort_by_key(|s| s.index);

    pack_span(sheet, base, &mut sprites[..unique_len], slices)?;

    if sheet.duplicates == Duplicates::Drop {
        for duplicate in &mut sprites[unique_len..] {
            duplicate.sheet = None;
        }
    } else {
        // share: copy the representative's placement into each duplicate;
        // a duplicate of a dropped representative is dropped too
        let placements: HashMap<usize, (Option<usize>, usize, Rect, bool)> = sprites[..unique_len]
            .iter()
            .map(|s| (s.index, (s.sheet, s.slice_index, s.trimmed_rect, s.rotated)))
            .collect();
        for duplicate in &mut sprites[unique_len..] {
            if let Some(&(rep_sheet, slice_index, trimmed_rect, rotated)) = duplicate
                .duplicate_of_index
                .and_then(|index| placements.get(&index))
            {
                duplicate.sheet = rep_sheet;
                duplicate.slice_index = slice_index;
                duplicate.trimmed_rect = trimmed_rect;
                duplicate.rotated = rotated;
            }
        }
    }
    Ok(())
}

/// Appends a slice covering `local` within the span starting at `base`,
/// assigning the new global slice index to the contained sprites.
pub(crate) fn add_slice(
    slices: &mut Vec<Slice>,
    sheet: &Sheet,
    sheet_index: usize,
    base: usize,
    local: Range<usize>,
    sprites: &mut [Sprite],
    layered: bool,
    width: i32,
    height: i32,
) {
    let slice_index = slices.len();
    for sprite in &mut sprites[local.clone()] {
        sprite.slice_index = slice_index;
    }
    slices.push(Slice {
        sheet: sheet.index,
        sheet_index,
        sprites: base + local.start..base + local.end,
        index: slice_index,
        width,
        height,
        layered,
        last_source_written_time: None,
    });
}

/// Effective maximum slice dimensions of a sheet. A set minimum without a
/// maximum fixes the dimension.
pub fn get_slice_max_size(sheet: &Sheet) -> (i32, i32) {
    (
        get_max_size(sheet.width, sheet.max_width, sheet.power_of_two),
        get_max_size(sheet.height, sheet.max_height, sheet.power_of_two),
    )
}

fn get_max_size(size: i32, max_size: i32, power_of_two: bool) -> i32 {
    let size = if power_of_two && size > 0 {
        ceil_to_pot(size)
    } else {
        size
    };
    let max_size = if power_of_two && max_size > 0 {
        floor_to_pot(max_size)
    } else {
        max_size
    };
    if size > 0 && max_size > 0 {
        return size.min(max_size);
    }
    if size > 0 {
        return size;
    }
    if max_size > 0 {
        return max_size;
    }
    i32::MAX
}

/// Recomputes a slice's dimensions from its sprites' placements, then applies
/// the sheet's divisible-width, power-of-two and square constraints.
pub fn recompute_slice_size(slice: &mut Slice, sheet: &Sheet, sprites: &[Sprite]) {
    let mut max_x = 0;
    let mut max_y = 0;
    for sprite in &sprites[slice.sprites.clone()] {
        let (size_x, size_y) = if sprite.rotated {
            (sprite.size.y, sprite.size.x)
        } else {
            (sprite.size.x, sprite.size.y)
        };
        max_x = max_x.max(sprite.trimmed_rect.x - sprite.offset.x + size_x);
        max_y = max_y.max(sprite.trimmed_rect.y - sprite.offset.y + size_y);
    }
    slice.width = sheet.width.max(max_x + sheet.border_padding);
    slice.height = sheet.height.max(max_y + sheet.border_padding);

    if sheet.divisible_width > 0 {
        slice.width = ceil_multiple(slice.width, sheet.divisible_width);
    }
    if sheet.power_of_two {
        slice.width = ceil_to_pot(slice.width);
        slice.height = ceil_to_pot(slice.height);
    }
    if sheet.square {
        let m = slice.width.max(slice.height);
        slice.width = m;
        slice.height = m;
    }
}

/// Populates each slice's newest source modification time, for incremental
/// rebuild decisions by the output stage.
pub fn update_last_source_written_times(slices: &mut [Slice], sprites: &[Sprite]) {
    scheduler().for_each_parallel(slices, |slice| {
        let mut seen = std::collections::HashSet::new();
        let mut last: Option<SystemTime> = None;
        for sprite in &sprites[slice.sprites.clone()] {
            if !seen.insert(Arc::as_ptr(&sprite.source)) {
                continue;
            }
            let Some(path) = &sprite.source.path else {
                continue;
            };
            if let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) {
                last = Some(last.map_or(modified, |l| l.max(modified)));
            }
        }
        slice.last_source_written_time = last;
    });
}
