//! Binpack strategy: delegates to the rect packer's heuristic and
//! dimension search.

use crate::error::{PackError, Result};
use crate::geom::Rect;
use crate::model::{Sheet, Slice, Sprite};
use crate::packer::{self, Method, PackSettings, PackSize};
use crate::warn::warning;

use super::{add_slice, get_slice_max_size};

pub(crate) fn pack_binpack(
    sheet: &Sheet,
    base: usize,
    sprites: &mut [Sprite],
    fast: bool,
    slices: &mut Vec<Slice>,
) -> Result<()> {
    let (max_width, max_height) = get_slice_max_size(sheet);
    let settings = PackSettings {
        method: if fast {
            Method::BestSkyline
        } else {
            Method::Best
        },
        max_sheets: sheet.max_slices,
        power_of_two: sheet.power_of_two,
        square: sheet.square,
        allow_rotate: sheet.allow_rotate,
        align_width: sheet.divisible_width,
        border_padding: sheet.border_padding,
        over_allocate: sheet.shape_padding,
        min_width: sheet.width,
        min_height: sheet.height,
        max_width,
        max_height,
    };

    // drop sprites no admissible slice size can hold
    let mut sizes = Vec::with_capacity(sprites.len());
    for (i, sprite) in sprites.iter_mut().enumerate() {
        let width = sprite.size.x + sheet.shape_padding;
        let height = sprite.size.y + sheet.shape_padding;
        if !packer::can_pack_size(&settings, width, height) {
            warning(format!(
                "sprite '{}' does not fit into sheet '{}'",
                sprite.id, sheet.id
            ));
            sprite.sheet = None;
            continue;
        }
        sizes.push(PackSize {
            id: i,
            width,
            height,
        });
    }
    let submitted = sizes.len();

    let pack_sheets = packer::pack(settings, sizes);

    // write placements back; slice_index temporarily holds the sheet ordinal
    let mut packed = 0usize;
    let mut placed = vec![false; sprites.len()];
    for (ordinal, pack_sheet) in pack_sheets.iter().enumerate() {
        for rect in &pack_sheet.rects {
            let sprite = &mut sprites[rect.id];
            let (w, h) = if rect.rotated {
                (
                    sprite.trimmed_source_rect.h,
                    sprite.trimmed_source_rect.w,
                )
            } else {
                (
                    sprite.trimmed_source_rect.w,
                    sprite.trimmed_source_rect.h,
                )
            };
            sprite.rotated = rect.rotated;
            sprite.slice_index = ordinal;
            sprite.trimmed_rect =
                Rect::new(rect.x + sprite.offset.x, rect.y + sprite.offset.y, w, h);
            placed[rect.id] = true;
            packed += 1;
        }
    }

    if packed < submitted {
        // a truncated sheet sequence is a warning, an exhausted search is fatal
        if sheet.max_slices == Some(pack_sheets.len()) {
            warning(format!(
                "not all sprites could be packed into sheet '{}' ({} left over)",
                sheet.id,
                submitted - packed
            ));
            for (i, sprite) in sprites.iter_mut().enumerate() {
                if sprite.sheet.is_some() && !placed[i] {
                    sprite.sheet = None;
                }
            }
        } else {
            return Err(PackError::NotAllSpritesPacked);
        }
    }

    // group placed sprites by sheet ordinal; dropped sprites sort last
    sprites.sort_by_key(|s| {
        (
            if s.sheet.is_some() {
                s.slice_index
            } else {
                usize::MAX
            },
            s.index,
        )
    });
    let placed_len = sprites.iter().take_while(|s| s.sheet.is_some()).count();

    let mut begin = 0;
    while begin < placed_len {
        let ordinal = sprites[begin].slice_index;
        let mut end = begin + 1;
        while end < placed_len && sprites[end].slice_index == ordinal {
            end += 1;
        }
        let pack_sheet = &pack_sheets[ordinal];
        add_slice(
            slices,
            sheet,
            ordinal,
            base,
            begin..end,
            sprites,
            false,
            pack_sheet.width,
            pack_sheet.height,
        );
        begin = end;
    }
    Ok(())
}
