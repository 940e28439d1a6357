//! Trimming: per-sprite tight bounds and optional convex-hull extraction.

use tracing::instrument;

use crate::hull::create_convex_hull;
use crate::image_util::{get_alpha_levels, get_gray_levels, get_used_bounds};
use crate::model::{Sprite, Trim};
use crate::scheduler::scheduler;
use crate::warn::warning;

/// Vertex budget for convex trims.
pub const MAX_HULL_SIZE: usize = 8;
/// Bilinear sample count per interior cell edge during hull extraction.
pub const HULL_SUB_PIXEL_STEPS: i32 = 8;

/// Trims all sprites in parallel.
#[instrument(skip_all)]
pub fn trim_sprites(sprites: &mut [Sprite]) {
    scheduler().for_each_parallel(sprites, trim_sprite);
}

pub fn trim_sprite(sprite: &mut Sprite) {
    if sprite.trim == Trim::None {
        sprite.trimmed_source_rect = sprite.source_rect;
        return;
    }

    sprite.trimmed_source_rect = get_used_bounds(
        &sprite.source.rgba,
        sprite.trim_gray_levels,
        sprite.trim_threshold,
        &sprite.source_rect,
    );

    if sprite.trim == Trim::Convex {
        let levels = if sprite.trim_gray_levels {
            get_gray_levels(&sprite.source.rgba, &sprite.trimmed_source_rect)
        } else {
            get_alpha_levels(&sprite.source.rgba, &sprite.trimmed_source_rect)
        };
        sprite.vertices = create_convex_hull(
            &levels,
            sprite.trim_threshold,
            MAX_HULL_SIZE,
            HULL_SUB_PIXEL_STEPS,
        );
        if sprite.vertices.len() > MAX_HULL_SIZE {
            warning(format!(
                "convex hull of sprite '{}' could not be reduced to {} vertices",
                sprite.id, MAX_HULL_SIZE
            ));
        }
    }

    if sprite.trim_margin > 0 {
        sprite.trimmed_source_rect = sprite
            .trimmed_source_rect
            .expand(sprite.trim_margin)
            .intersect(&sprite.source_rect);
    }
}
