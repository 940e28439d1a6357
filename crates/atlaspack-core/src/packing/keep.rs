//! Keep strategy: every sprite keeps its source position; the slice covers the
//! largest source image.

use crate::error::Result;
use crate::model::{Sheet, Slice, Sprite};

use super::add_slice;

pub(crate) fn pack_keep(
    sheet: &Sheet,
    base: usize,
    sprites: &mut [Sprite],
    slices: &mut Vec<Slice>,
) -> Result<()> {
    let mut max_width = 0;
    let mut max_height = 0;
    for sprite in sprites.iter_mut() {
        sprite.rotated = false;
        sprite.trimmed_rect = sprite.trimmed_source_rect;
        sprite.rect = sprite.source_rect;
        max_width = max_width.max(sprite.source.rgba.width() as i32);
        max_height = max_height.max(sprite.source.rgba.height() as i32);
    }
    let len = sprites.len();
    add_slice(
        slices, sheet, 0, base, 0..len, sprites, false, max_width, max_height,
    );
    Ok(())
}
