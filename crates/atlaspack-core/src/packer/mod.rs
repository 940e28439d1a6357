//! Rect packer: places `{id, w, h}` rectangles into as few sheets as possible,
//! minimizing sheet count first and total area second.
//!
//! Two engines do the placement work: Skyline (fast) and MaxRects (tighter).
//! Around them runs a search over placement heuristics and sheet dimensions:
//! starting from an area-based size estimate, the optimizer enlarges the sheet
//! to absorb a trailing sheet, then shrinks toward the estimate in halving and
//! single-pixel steps, retrying each stage a few times and rotating through
//! heuristics when a "Best" method was requested. A run that can no longer
//! beat the best result so far is abandoned early.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geom::{ceil_multiple, ceil_to_pot, div_ceil, floor_multiple, floor_to_pot, isqrt};

pub mod maxrects;
pub mod skyline;

pub use maxrects::MaxRectsHeuristic;
pub use skyline::SkylineHeuristic;

use maxrects::MaxRectsPacker;
use skyline::SkylinePacker;

/// Placement method. The `Best*` variants iterate over the concrete
/// heuristics of their family; `Best` iterates across both families but skips
/// the costly ContactPointRule unless it was requested directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Best,
    BestSkyline,
    BestMaxRects,
    SkylineBottomLeft,
    SkylineBestFit,
    MaxRectsBestShortSideFit,
    MaxRectsBestLongSideFit,
    MaxRectsBestAreaFit,
    MaxRectsBottomLeftRule,
    MaxRectsContactPointRule,
}

const CONCRETE_METHODS: [Method; 7] = [
    Method::SkylineBottomLeft,
    Method::SkylineBestFit,
    Method::MaxRectsBestShortSideFit,
    Method::MaxRectsBestLongSideFit,
    Method::MaxRectsBestAreaFit,
    Method::MaxRectsBottomLeftRule,
    Method::MaxRectsContactPointRule,
];

fn method_ordinal(method: Method) -> usize {
    CONCRETE_METHODS
        .iter()
        .position(|&m| m == method)
        .unwrap_or(0)
}

fn is_skyline_method(method: Method) -> bool {
    matches!(method, Method::SkylineBottomLeft | Method::SkylineBestFit)
}

fn is_maxrects_method(method: Method) -> bool {
    matches!(
        method,
        Method::MaxRectsBestShortSideFit
            | Method::MaxRectsBestLongSideFit
            | Method::MaxRectsBestAreaFit
            | Method::MaxRectsBottomLeftRule
            | Method::MaxRectsContactPointRule
    )
}

fn advance_concrete(method: Method) -> Method {
    CONCRETE_METHODS[(method_ordinal(method) + 1) % CONCRETE_METHODS.len()]
}

fn advance_skyline(method: Method) -> Method {
    match method {
        Method::SkylineBottomLeft => Method::SkylineBestFit,
        _ => Method::SkylineBottomLeft,
    }
}

fn advance_maxrects(method: Method) -> Method {
    match method {
        Method::MaxRectsContactPointRule => Method::MaxRectsBestShortSideFit,
        other => CONCRETE_METHODS[method_ordinal(other) + 1],
    }
}

/// First concrete method tried for a settings-level method.
fn concrete_method(method: Method) -> Method {
    match method {
        Method::Best | Method::BestSkyline => Method::SkylineBottomLeft,
        Method::BestMaxRects => Method::MaxRectsBestShortSideFit,
        other => other,
    }
}

/// Rotates `method` according to the settings-level method. Returns false when
/// the rotation wrapped back to `first_method` (all heuristics tried).
fn advance_method(method: &mut Method, settings_method: Method, first_method: Method) -> bool {
    let previous = *method;
    match settings_method {
        Method::Best => {
            *method = advance_concrete(*method);
            // do not try the costly contact point rule
            if *method != first_method && *method == Method::MaxRectsContactPointRule {
                *method = advance_concrete(*method);
            }
        }
        Method::BestSkyline => *method = advance_skyline(*method),
        Method::BestMaxRects => *method = advance_maxrects(*method),
        _ => {}
    }
    *method != previous && *method != first_method
}

fn skyline_heuristic(method: Method) -> SkylineHeuristic {
    match method {
        Method::SkylineBestFit => SkylineHeuristic::BestFit,
        _ => SkylineHeuristic::BottomLeft,
    }
}

fn maxrects_heuristic(method: Method) -> MaxRectsHeuristic {
    match method {
        Method::MaxRectsBestLongSideFit => MaxRectsHeuristic::BestLongSideFit,
        Method::MaxRectsBestAreaFit => MaxRectsHeuristic::BestAreaFit,
        Method::MaxRectsBottomLeftRule => MaxRectsHeuristic::BottomLeftRule,
        Method::MaxRectsContactPointRule => MaxRectsHeuristic::ContactPointRule,
        _ => MaxRectsHeuristic::BestShortSideFit,
    }
}

/// Configuration of one pack job. Dimensions of zero mean "unset".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackSettings {
    pub method: Method,
    pub max_sheets: Option<usize>,
    pub power_of_two: bool,
    pub square: bool,
    pub allow_rotate: bool,
    pub align_width: i32,
    pub border_padding: i32,
    /// Extra pixels granted to the packable area of each sheet (used for the
    /// trailing shape padding of border sprites).
    pub over_allocate: i32,
    pub min_width: i32,
    pub min_height: i32,
    pub max_width: i32,
    pub max_height: i32,
}

impl Default for PackSettings {
    fn default() -> Self {
        Self {
            method: Method::Best,
            max_sheets: None,
            power_of_two: false,
            square: false,
            allow_rotate: false,
            align_width: 0,
            border_padding: 0,
            over_allocate: 0,
            min_width: 0,
            min_height: 0,
            max_width: 0,
            max_height: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackSize {
    pub id: usize,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRect {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub rotated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PackedSheet {
    pub width: i32,
    pub height: i32,
    pub rects: Vec<PackedRect>,
}

const SIZE_LIMIT: i32 = 1_000_000_000;

fn apply_padding(settings: &PackSettings, width: &mut i32, height: &mut i32, indent: bool) {
    let dir = if indent { 1 } else { -1 };
    *width -= dir * settings.border_padding * 2;
    *height -= dir * settings.border_padding * 2;
    *width += dir * settings.over_allocate;
    *height += dir * settings.over_allocate;
}

fn can_fit(settings: &PackSettings, width: i32, height: i32) -> bool {
    (width <= settings.max_width && height <= settings.max_height)
        || (settings.allow_rotate
            && width <= settings.max_height
            && height <= settings.max_width)
}

/// True when a rect of the given size can be placed on some admissible sheet,
/// possibly rotated. Uses the same size-space as [`pack`].
pub fn can_pack_size(settings: &PackSettings, width: i32, height: i32) -> bool {
    let mut s = settings.clone();
    clamp_limits(&mut s);
    let (mut max_w, mut max_h) = (s.max_width, s.max_height);
    apply_padding(&s, &mut max_w, &mut max_h, true);
    s.max_width = max_w;
    s.max_height = max_h;
    can_fit(&s, width, height)
}

fn clamp_limits(settings: &mut PackSettings) {
    if settings.max_width <= 0 || settings.max_width > SIZE_LIMIT {
        settings.max_width = SIZE_LIMIT;
    }
    if settings.max_height <= 0 || settings.max_height > SIZE_LIMIT {
        settings.max_height = SIZE_LIMIT;
    }
}

/// Sanitizes the settings, converts min/max into the packable-area space and
/// drops sizes that cannot fit even rotated. Returns the dropped ids.
fn correct_settings(settings: &mut PackSettings, sizes: &mut Vec<PackSize>) -> Vec<usize> {
    clamp_limits(settings);
    settings.min_width = settings.min_width.clamp(0, settings.max_width);
    settings.min_height = settings.min_height.clamp(0, settings.max_height);

    // padding and over-allocation only matter for the power-of-two and
    // alignment constraints, so fold them in once up front
    let (mut min_w, mut min_h) = (settings.min_width, settings.min_height);
    apply_padding(settings, &mut min_w, &mut min_h, true);
    settings.min_width = min_w;
    settings.min_height = min_h;
    let (mut max_w, mut max_h) = (settings.max_width, settings.max_height);
    apply_padding(settings, &mut max_w, &mut max_h, true);
    settings.max_width = max_w;
    settings.max_height = max_h;

    let mut dropped = Vec::new();
    let mut max_rect_width = 0;
    let mut max_rect_height = 0;
    sizes.retain(|size| {
        if can_fit(settings, size.width, size.height) {
            max_rect_width = max_rect_width.max(size.width);
            max_rect_height = max_rect_height.max(size.height);
            true
        } else {
            dropped.push(size.id);
            false
        }
    });

    if settings.allow_rotate {
        let m = max_rect_width.min(max_rect_height);
        max_rect_width = m;
        max_rect_height = m;
    }
    settings.min_width = settings.min_width.max(max_rect_width);
    settings.min_height = settings.min_height.max(max_rect_height);
    dropped
}

/// Rounds dimensions to the nearest admissible sheet size: clamp to min, round
/// up to power-of-two / alignment / square, clamp to max, round down again.
/// Idempotent.
pub fn correct_size(settings: &PackSettings, width: &mut i32, height: &mut i32) {
    *width = (*width).max(settings.min_width);
    *height = (*height).max(settings.min_height);
    apply_padding(settings, width, height, false);

    if settings.power_of_two {
        *width = ceil_to_pot(*width);
        *height = ceil_to_pot(*height);
    }
    if settings.align_width > 0 {
        *width = ceil_multiple(*width, settings.align_width);
    }
    if settings.square {
        let m = (*width).max(*height);
        *width = m;
        *height = m;
    }

    apply_padding(settings, width, height, true);
    *width = (*width).min(settings.max_width);
    *height = (*height).min(settings.max_height);
    apply_padding(settings, width, height, false);

    if settings.power_of_two {
        *width = floor_to_pot(*width);
        *height = floor_to_pot(*height);
    }
    if settings.align_width > 0 {
        *width = floor_multiple(*width, settings.align_width);
    }
    if settings.square {
        let m = (*width).min(*height);
        *width = m;
        *height = m;
    }

    apply_padding(settings, width, height, true);
}

struct Run {
    width: i32,
    height: i32,
    method: Method,
    sheets: Vec<PackedSheet>,
    total_area: i64,
}

/// Fewer sheets wins; equal sheet counts are decided by total area.
fn is_better_than(a: &Run, b: &Run) -> bool {
    if a.sheets.len() != b.sheets.len() {
        return a.sheets.len() < b.sheets.len();
    }
    a.total_area < b.total_area
}

fn get_perfect_area(sizes: &[PackSize]) -> i64 {
    sizes
        .iter()
        .map(|s| i64::from(s.width) * i64::from(s.height))
        .sum()
}

fn get_run_size(settings: &PackSettings, area: i64) -> (i32, i32) {
    let mut width = isqrt(area);
    let mut height = div_ceil(area, i64::from(width)) as i32;
    if width < settings.min_width || width > settings.max_width {
        width = width.clamp(settings.min_width, settings.max_width);
        height = div_ceil(area, i64::from(width)) as i32;
    } else if height < settings.min_height || height > settings.max_height {
        height = height.clamp(settings.min_height, settings.max_height);
        width = div_ceil(area, i64::from(height)) as i32;
    }
    correct_size(settings, &mut width, &mut height);
    (width, height)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptimizationStage {
    FirstRun,
    MinimizeSheetCount,
    ShrinkSquare,
    ShrinkWidthFast,
    ShrinkHeightFast,
    ShrinkWidthSlow,
    ShrinkHeightSlow,
    End,
}

fn advance_stage(stage: &mut OptimizationStage) -> bool {
    use OptimizationStage::*;
    *stage = match *stage {
        FirstRun => MinimizeSheetCount,
        MinimizeSheetCount => ShrinkSquare,
        ShrinkSquare => ShrinkWidthFast,
        ShrinkWidthFast => ShrinkHeightFast,
        ShrinkHeightFast => ShrinkWidthSlow,
        ShrinkWidthSlow => ShrinkHeightSlow,
        ShrinkHeightSlow => End,
        End => return false,
    };
    true
}

struct OptimizationState {
    perfect_area: i64,
    width: i32,
    height: i32,
    method: Method,
    stage: OptimizationStage,
    first_method: Method,
    iteration: i32,
}

/// Mutates the run settings for another attempt at the current stage.
/// Returns false when the stage is exhausted and should advance.
fn optimize_stage(
    state: &mut OptimizationState,
    pack_settings: &PackSettings,
    best_run: &Run,
) -> bool {
    match state.stage {
        OptimizationStage::FirstRun | OptimizationStage::End => false,

        OptimizationStage::MinimizeSheetCount => {
            if best_run.sheets.len() <= 1 || state.iteration > 5 {
                return false;
            }
            // enlarge to absorb the area of the last sheet
            let Some(last_sheet) = best_run.sheets.last() else {
                return false;
            };
            let mut area = i64::from(last_sheet.width) * i64::from(last_sheet.height);
            let mut i = 0;
            while area > 0 {
                if state.width == pack_settings.max_width
                    && state.height == pack_settings.max_height
                {
                    break;
                }
                if state.height == pack_settings.max_height
                    || (state.width < pack_settings.max_width && i % 2 == 1)
                {
                    state.width += 1;
                    area -= i64::from(state.height);
                } else {
                    state.height += 1;
                    area -= i64::from(state.width);
                }
                i += 1;
            }
            true
        }

        OptimizationStage::ShrinkSquare => {
            if state.width != best_run.width
                || state.height != best_run.height
                || state.iteration > 5
            {
                return false;
            }
            let (width, height) = get_run_size(pack_settings, state.perfect_area);
            state.width = (state.width + width) / 2;
            state.height = (state.height + height) / 2;
            true
        }

        OptimizationStage::ShrinkWidthFast
        | OptimizationStage::ShrinkHeightFast
        | OptimizationStage::ShrinkWidthSlow
        | OptimizationStage::ShrinkHeightSlow => {
            if state.width != best_run.width
                || state.height != best_run.height
                || state.iteration > 5
            {
                // retry the stage with each heuristic of the requested family
                if !advance_method(&mut state.method, pack_settings.method, state.first_method) {
                    return false;
                }
                state.width = best_run.width;
                state.height = best_run.height;
            }

            let (width, height) = get_run_size(pack_settings, state.perfect_area);
            match state.stage {
                OptimizationStage::ShrinkWidthFast => {
                    if state.width > width + 4 {
                        state.width = (state.width + width) / 2;
                    }
                }
                OptimizationStage::ShrinkHeightFast => {
                    if state.height > height + 4 {
                        state.height = (state.height + height) / 2;
                    }
                }
                OptimizationStage::ShrinkWidthSlow => {
                    if state.width > width {
                        state.width -= 1;
                    }
                }
                _ => {
                    if state.height > height {
                        state.height -= 1;
                    }
                }
            }
            true
        }
    }
}

/// Advances to the next run settings worth trying. Returns false when the
/// search is exhausted.
fn optimize_run_settings(
    state: &mut OptimizationState,
    pack_settings: &PackSettings,
    best_run: &Run,
) -> bool {
    let previous = (state.width, state.height, state.method);
    loop {
        if !optimize_stage(state, pack_settings, best_run) && advance_stage(&mut state.stage) {
            state.width = best_run.width;
            state.height = best_run.height;
            state.method = best_run.method;
            state.first_method = best_run.method;
            state.iteration = 0;
            continue;
        }

        if state.stage == OptimizationStage::End {
            return false;
        }

        state.iteration += 1;

        let mut width = state.width;
        let mut height = state.height;
        correct_size(pack_settings, &mut width, &mut height);
        if (width, height, state.method) != previous {
            state.width = width;
            state.height = height;
            return true;
        }
    }
}

/// Runs the MaxRects engine over all remaining sizes, opening a new sheet
/// whenever the current one is exhausted. Returns false when cancelled
/// because the run could no longer beat `best_run`.
fn run_maxrects_method(
    settings: &PackSettings,
    run: &mut Run,
    best_run: Option<&Run>,
    sizes: &[PackSize],
) -> bool {
    let heuristic = maxrects_heuristic(run.method);
    let mut remaining = sizes.to_vec();
    while !remaining.is_empty() {
        let mut packer = MaxRectsPacker::new(run.width, run.height, settings.allow_rotate);
        let placements = packer.insert_batch(&mut remaining, heuristic);
        if placements.is_empty() {
            return false;
        }

        let (mut width, mut height) = packer.bottom_right();
        correct_size(settings, &mut width, &mut height);
        apply_padding(settings, &mut width, &mut height, false);

        let mut sheet = PackedSheet {
            width,
            height,
            rects: Vec::with_capacity(placements.len()),
        };
        for p in placements {
            sheet.rects.push(PackedRect {
                id: p.id,
                x: p.x + settings.border_padding,
                y: p.y + settings.border_padding,
                rotated: p.rotated,
            });
        }
        run.total_area += i64::from(width) * i64::from(height);
        run.sheets.push(sheet);

        if let Some(best) = best_run {
            if !is_better_than(run, best) {
                return false;
            }
        }
    }
    true
}

/// Runs the Skyline engine, tallest rects first, like above.
fn run_skyline_method(
    settings: &PackSettings,
    run: &mut Run,
    best_run: Option<&Run>,
    sizes: &[PackSize],
) -> bool {
    let heuristic = skyline_heuristic(run.method);
    let mut remaining = sizes.to_vec();
    while !remaining.is_empty() {
        let mut packer =
            SkylinePacker::new(run.width, run.height, settings.allow_rotate, heuristic);
        let mut order: Vec<usize> = (0..remaining.len()).collect();
        order.sort_by(|&a, &b| {
            remaining[b]
                .height
                .cmp(&remaining[a].height)
                .then(remaining[b].width.cmp(&remaining[a].width))
        });

        let mut packed = vec![false; remaining.len()];
        let mut sheet = PackedSheet::default();
        let mut used_w = 0;
        let mut used_h = 0;
        for index in order {
            let size = remaining[index];
            if let Some(p) = packer.insert(size.width, size.height) {
                let (w, h) = if p.rotated {
                    (size.height, size.width)
                } else {
                    (size.width, size.height)
                };
                used_w = used_w.max(p.x + w);
                used_h = used_h.max(p.y + h);
                sheet.rects.push(PackedRect {
                    id: size.id,
                    x: p.x + settings.border_padding,
                    y: p.y + settings.border_padding,
                    rotated: p.rotated,
                });
                packed[index] = true;
            }
        }
        if sheet.rects.is_empty() {
            return false;
        }

        let mut keep = packed.iter();
        remaining.retain(|_| !*keep.next().unwrap_or(&false));

        let (mut width, mut height) = (used_w, used_h);
        correct_size(settings, &mut width, &mut height);
        apply_padding(settings, &mut width, &mut height, false);
        sheet.width = width;
        sheet.height = height;
        run.total_area += i64::from(width) * i64::from(height);
        run.sheets.push(sheet);

        if let Some(best) = best_run {
            if !is_better_than(run, best) {
                return false;
            }
        }
    }
    true
}

/// Packs `sizes` into an ordered list of sheets under `settings`.
///
/// Sizes that cannot fit any admissible sheet are silently excluded; callers
/// that care compare placed ids against submitted ids (see
/// [`can_pack_size`] for the pre-flight check). When `max_sheets` is set the
/// returned list is truncated to it.
pub fn pack(mut settings: PackSettings, mut sizes: Vec<PackSize>) -> Vec<PackedSheet> {
    correct_settings(&mut settings, &mut sizes);
    if sizes.is_empty() {
        return Vec::new();
    }

    let perfect_area = get_perfect_area(&sizes);
    let (width, height) = get_run_size(&settings, perfect_area * 5 / 4);
    let mut state = OptimizationState {
        perfect_area,
        width,
        height,
        method: concrete_method(settings.method),
        stage: OptimizationStage::FirstRun,
        first_method: concrete_method(settings.method),
        iteration: 0,
    };

    let mut best_run: Option<Run> = None;
    loop {
        let mut run = Run {
            width: state.width,
            height: state.height,
            method: state.method,
            sheets: Vec::new(),
            total_area: 0,
        };
        let succeeded = if is_maxrects_method(run.method) {
            run_maxrects_method(&settings, &mut run, best_run.as_ref(), &sizes)
        } else {
            debug_assert!(is_skyline_method(run.method));
            run_skyline_method(&settings, &mut run, best_run.as_ref(), &sizes)
        };

        if succeeded && best_run.as_ref().map_or(true, |b| is_better_than(&run, b)) {
            debug!(
                method = ?run.method,
                width = run.width,
                height = run.height,
                sheets = run.sheets.len(),
                area = run.total_area,
                "new best run"
            );
            best_run = Some(run);
        }

        let Some(best) = best_run.as_ref() else {
            // the initial estimate can undercut the largest rotated rect;
            // grow until something can be placed
            let mut width = state.width * 2;
            let mut height = state.height * 2;
            correct_size(&settings, &mut width, &mut height);
            if (width, height) == (state.width, state.height) {
                break;
            }
            state.width = width;
            state.height = height;
            continue;
        };
        if !optimize_run_settings(&mut state, &settings, best) {
            break;
        }
    }

    let Some(mut best) = best_run else {
        return Vec::new();
    };
    if let Some(max_sheets) = settings.max_sheets {
        if best.sheets.len() > max_sheets {
            best.sheets.truncate(max_sheets);
        }
    }
    best.sheets
}
