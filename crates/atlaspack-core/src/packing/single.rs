//! Single strategy: one slice per sprite, sized to the sprite's cell plus the
//! border padding.

use crate::error::{PackError, Result};
use crate::model::{Sheet, Slice, Sprite};

use super::add_slice;

pub(crate) fn pack_single(
    sheet: &Sheet,
    base: usize,
    sprites: &mut [Sprite],
    slices: &mut Vec<Slice>,
) -> Result<()> {
    for i in 0..sprites.len() {
        if let Some(max_slices) = sheet.max_slices {
            if i >= max_slices {
                return Err(PackError::NotAllSpritesPacked);
            }
        }
        let padding = sheet.border_padding;
        let sprite = &mut sprites[i];
        sprite.rotated = false;
        sprite.trimmed_rect.x = sprite.offset.x + padding;
        sprite.trimmed_rect.y = sprite.offset.y + padding;
        sprite.trimmed_rect.w = sprite.trimmed_source_rect.w;
        sprite.trimmed_rect.h = sprite.trimmed_source_rect.h;
        let width = sprite.size.x + padding * 2;
        let height = sprite.size.y + padding * 2;
        add_slice(slices, sheet, i, base, i..i + 1, sprites, false, width, height);
    }
    Ok(())
}
