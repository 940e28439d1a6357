//! Row/column strategy: greedy line packing along one axis, wrapping at the
//! maximum extent and starting a new slice when the perpendicular dimension is
//! exhausted.

use crate::error::{PackError, Result};
use crate::model::{Sheet, Slice, Sprite};

use super::{add_slice, get_slice_max_size};

pub(crate) fn pack_lines(
    horizontal: bool,
    sheet: &Sheet,
    base: usize,
    sprites: &mut [Sprite],
    slices: &mut Vec<Slice>,
) -> Result<()> {
    let (mut max_width, mut max_height) = get_slice_max_size(sheet);
    max_width = max_width.saturating_sub(sheet.border_padding * 2);
    max_height = max_height.saturating_sub(sheet.border_padding * 2);

    // d = packing direction, p = perpendicular
    let (max_d, max_p) = if horizontal {
        (max_width, max_height)
    } else {
        (max_height, max_width)
    };

    let mut sheet_index = 0;
    let mut first = 0;
    let mut pos_d = 0;
    let mut pos_p = 0;
    let mut line_size = 0;

    for i in 0..sprites.len() {
        let size = sprites[i].size;
        let (size_d, size_p) = if horizontal {
            (size.x, size.y)
        } else {
            (size.y, size.x)
        };

        if pos_d + size_d > max_d {
            pos_d = 0;
            pos_p += line_size;
            line_size = 0;
        }
        if pos_p + size_p > max_p {
            add_slice(slices, sheet, sheet_index, base, first..i, sprites, false, 0, 0);
            sheet_index += 1;
            first = i;
            pos_d = 0;
            pos_p = 0;
            line_size = 0;
        }

        let (pos_x, pos_y) = if horizontal {
            (pos_d, pos_p)
        } else {
            (pos_p, pos_d)
        };
        if pos_x + size.x > max_width || pos_y + size.y > max_height {
            return Err(PackError::NotAllSpritesPacked);
        }

        let sprite = &mut sprites[i];
        sprite.rotated = false;
        sprite.trimmed_rect.x = pos_x + sheet.border_padding + sprite.offset.x;
        sprite.trimmed_rect.y = pos_y + sheet.border_padding + sprite.offset.y;
        sprite.trimmed_rect.w = sprite.trimmed_source_rect.w;
        sprite.trimmed_rect.h = sprite.trimmed_source_rect.h;

        pos_d += size_d + sheet.shape_padding;
        line_size = line_size.max(size_p + sheet.shape_padding);
    }

    let len = sprites.len();
    add_slice(slices, sheet, sheet_index, base, first..len, sprites, false, 0, 0);
    Ok(())
}
