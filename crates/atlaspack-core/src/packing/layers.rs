//! Layers strategy: all sprites at the same origin in one layered slice.

use crate::error::Result;
use crate::model::{Sheet, Slice, Sprite};

use super::add_slice;

pub(crate) fn pack_layers(
    sheet: &Sheet,
    base: usize,
    sprites: &mut [Sprite],
    slices: &mut Vec<Slice>,
) -> Result<()> {
    let padding = sheet.border_padding;
    for sprite in sprites.iter_mut() {
        sprite.rotated = false;
        sprite.trimmed_rect.x = sprite.offset.x + padding;
        sprite.trimmed_rect.y = sprite.offset.y + padding;
        sprite.trimmed_rect.w = sprite.trimmed_source_rect.w;
        sprite.trimmed_rect.h = sprite.trimmed_source_rect.h;
    }
    let len = sprites.len();
    add_slice(slices, sheet, 0, base, 0..len, sprites, true, 0, 0);
    Ok(())
}
