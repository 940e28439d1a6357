//! Core library of the atlaspack sprite atlas compiler.
//!
//! - Pipeline: `trim_sprites` computes tight bounds and convex hulls,
//!   `pack_sprites` derives cell sizes, deduplicates and places every sprite
//!   into slices, `get_slice_image` materializes a slice's pixels.
//! - Packing: dual-engine rect packer (Skyline and MaxRects) with a
//!   multi-heuristic search and a slice-dimension optimization loop, plus
//!   single/keep/rows/columns/layers strategies and a physics-based compact
//!   mode for shaped sprites.
//! - Configuration parsing, image decoding and file output are left to the
//!   caller; the core operates on in-memory sprites, sheets and slices.
//!
//! Quick example:
//! ```ignore
//! use std::sync::Arc;
//! use atlaspack_core::prelude::*;
//!
//! let source = Arc::new(SourceImage::new(image::open("items.png")?.to_rgba8()));
//! let mut sheet = Sheet::new(0, "atlas");
//! sheet.allow_rotate = true;
//! let mut sprites: Vec<Sprite> = grid_rects
//!     .into_iter()
//!     .enumerate()
//!     .map(|(i, rect)| {
//!         let mut sprite = Sprite::new(i, format!("sprite_{i}"), source.clone());
//!         sprite.source_rect = rect;
//!         sprite.trim = Trim::Rect;
//!         sprite.sheet = Some(0);
//!         sprite
//!     })
//!     .collect();
//! trim_sprites(&mut sprites);
//! let slices = pack_sprites(&mut sprites, &[sheet])?;
//! ```

pub mod compositing;
pub mod error;
pub mod geom;
pub mod hull;
pub mod image_util;
pub mod model;
pub mod packer;
pub mod packing;
pub mod scheduler;
pub mod trim;
pub mod warn;

pub use compositing::get_slice_image;
pub use error::{PackError, Result};
pub use packing::{pack_sprites, update_last_source_written_times};
pub use trim::trim_sprites;

/// Convenience prelude for the primary types and pipeline entry points.
pub mod prelude {
    pub use crate::compositing::get_slice_image;
    pub use crate::error::{PackError, Result};
    pub use crate::geom::{Point, PointF, Rect, Size};
    pub use crate::model::{
        Align, AlignX, AlignY, Duplicates, Extrude, PackMode, Pivot, PivotX, PivotY, Sheet,
        Slice, SourceImage, Sprite, Trim, WrapMode,
    };
    pub use crate::packer::{Method, PackSettings};
    pub use crate::packing::{
        get_slice_max_size, pack_sprites, recompute_slice_size, update_last_source_written_times,
    };
    pub use crate::trim::{trim_sprite, trim_sprites};
}
