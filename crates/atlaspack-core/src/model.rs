//! Data model of one packing job: sprites, sheets and slices.
//!
//! Sheets and sprites live in plain vectors owned by the caller; sprites refer
//! to their sheet by index and each [`Slice`] borrows a contiguous index range
//! of the sprite vector. Source images are reference-counted so many sprites
//! can share one decoded image.

use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::geom::{Point, PointF, Rect, Size};
use crate::image_util;

/// How a sprite's effective rectangle is reduced to its opaque content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trim {
    #[default]
    None,
    /// Tight bounding rectangle.
    Rect,
    /// Tight bounding rectangle plus a convex hull of the content.
    Convex,
}

/// How extruded edge pixels sample the sprite content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    #[default]
    Clamp,
    Repeat,
    Mirror,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extrude {
    pub count: i32,
    pub mode: WrapMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignX {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignY {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Placement of the trimmed content within the sprite's cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Align {
    pub x: AlignX,
    pub y: AlignY,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotX {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotY {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Anchor the final pivot point is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pivot {
    pub x: PivotX,
    pub y: PivotY,
}

/// Policy for pixel-identical sprites within one sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Duplicates {
    /// Pack identical copies separately.
    #[default]
    Keep,
    /// All duplicates point at one physical placement.
    Share,
    /// Omit duplicates from the output.
    Drop,
}

/// Placement strategy of a sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackMode {
    #[default]
    Binpack,
    Compact,
    Single,
    Keep,
    Rows,
    Columns,
    Layers,
}

/// A decoded source image plus the path metadata the pipeline keeps for
/// incremental rebuild decisions. Immutable once constructed.
#[derive(Debug)]
pub struct SourceImage {
    pub rgba: RgbaImage,
    pub path: Option<PathBuf>,
}

impl SourceImage {
    pub fn new(rgba: RgbaImage) -> Self {
        Self { rgba, path: None }
    }

    pub fn with_path(rgba: RgbaImage, path: impl Into<PathBuf>) -> Self {
        Self {
            rgba,
            path: Some(path.into()),
        }
    }

    pub fn bounds(&self) -> Rect {
        image_util::bounds(&self.rgba)
    }
}

/// One logical sprite to place.
///
/// The configuration loader populates everything up to `sheet`; the pipeline
/// fills in the derived fields below it. `index` is the stable input order and
/// survives the sorts the orchestrator performs.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub index: usize,
    pub id: String,
    pub source: Arc<SourceImage>,
    /// Additional per-sprite source maps (e.g. normal maps), composited with
    /// [`crate::compositing::get_slice_image`] by map index.
    pub maps: Vec<Arc<SourceImage>>,
    pub source_rect: Rect,

    pub trim: Trim,
    pub trim_threshold: u8,
    pub trim_margin: i32,
    pub trim_gray_levels: bool,

    pub min_size: Size,
    pub divisible_size: Size,
    pub extrude: Extrude,
    pub align: Align,
    pub crop: bool,
    pub crop_pivot: bool,
    pub pivot: Pivot,
    /// Pivot offset on input; the final pivot point after packing.
    pub pivot_point: PointF,
    /// Sprites sharing a non-empty key are forced to a common cell size.
    pub common_size: String,

    /// Index into the sheet vector; cleared when the sprite is dropped
    /// (duplicate under `drop` policy, or unfittable).
    pub sheet: Option<usize>,

    // derived by trimming
    pub trimmed_source_rect: Rect,
    /// Convex hull in trimmed-rect-local coordinates; empty for rect/none trims.
    pub vertices: Vec<PointF>,

    // derived by packing
    pub duplicate_of_index: Option<usize>,
    pub size: Size,
    pub offset: Point,
    pub trimmed_rect: Rect,
    pub rect: Rect,
    pub rotated: bool,
    pub slice_index: usize,
}

impl Sprite {
    pub fn new(index: usize, id: impl Into<String>, source: Arc<SourceImage>) -> Self {
        let source_rect = source.bounds();
        Self {
            index,
            id: id.into(),
            source,
            maps: Vec::new(),
            source_rect,
            trim: Trim::None,
            trim_threshold: 1,
            trim_margin: 0,
            trim_gray_levels: false,
            min_size: Size::default(),
            divisible_size: Size::new(1, 1),
            extrude: Extrude::default(),
            align: Align::default(),
            crop: false,
            crop_pivot: false,
            pivot: Pivot::default(),
            pivot_point: PointF::default(),
            common_size: String::new(),
            sheet: None,
            trimmed_source_rect: Rect::default(),
            vertices: Vec::new(),
            duplicate_of_index: None,
            size: Size::default(),
            offset: Point::default(),
            trimmed_rect: Rect::default(),
            rect: Rect::default(),
            rotated: false,
            slice_index: 0,
        }
    }
}

/// One packing target configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub index: usize,
    pub id: String,
    /// Minimum slice dimensions; without a maximum they are also the fixed
    /// dimensions. Zero means unset.
    pub width: i32,
    pub height: i32,
    pub max_width: i32,
    pub max_height: i32,
    pub power_of_two: bool,
    pub square: bool,
    pub divisible_width: i32,
    pub allow_rotate: bool,
    /// Inset from the slice edges.
    pub border_padding: i32,
    /// Gap between adjacent sprites within a slice.
    pub shape_padding: i32,
    pub duplicates: Duplicates,
    pub pack: PackMode,
    /// Cap on the number of slices this sheet may produce (usually the length
    /// of its output filename sequence).
    pub max_slices: Option<usize>,
}

impl Sheet {
    pub fn new(index: usize, id: impl Into<String>) -> Self {
        Self {
            index,
            id: id.into(),
            width: 0,
            height: 0,
            max_width: 0,
            max_height: 0,
            power_of_two: false,
            square: false,
            divisible_width: 0,
            allow_rotate: false,
            border_padding: 0,
            shape_padding: 0,
            duplicates: Duplicates::Keep,
            pack: PackMode::Binpack,
            max_slices: None,
        }
    }
}

/// One packed output image of a sheet.
#[derive(Debug, Clone, Serialize)]
pub struct Slice {
    /// Index into the sheet vector.
    pub sheet: usize,
    /// Ordinal within the sheet's output sequence.
    pub sheet_index: usize,
    /// Contiguous index range of the sprite vector, in final sprite order.
    pub sprites: Range<usize>,
    pub index: usize,
    pub width: i32,
    pub height: i32,
    pub layered: bool,
    #[serde(skip)]
    pub last_source_written_time: Option<SystemTime>,
}
