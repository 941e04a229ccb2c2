// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement resolver: base coordinates before any middleware runs.

use kurbo::Point;

use crate::types::{Alignment, Axis, ElementRects, Placement, Side};

/// Coordinates that put the floating box against `placement`'s side of the
/// reference.
///
/// The floating edge facing the reference is flush with the reference edge.
/// Along the alignment axis the floating box is centered, or shifted by half the
/// length difference for `start`/`end`. Under `rtl`, logical alignment on the
/// top and bottom sides is mirrored.
pub fn compute_coords_from_placement(
    rects: &ElementRects,
    placement: Placement,
    rtl: bool,
) -> Point {
    let reference = rects.reference;
    let floating = rects.floating.size();
    let alignment_axis = placement.alignment_axis();
    let is_vertical = placement.side_axis() == Axis::Y;

    let common_x = reference.x0 + reference.width() / 2.0 - floating.width / 2.0;
    let common_y = reference.y0 + reference.height() / 2.0 - floating.height / 2.0;
    let common_align =
        alignment_axis.rect_length(reference) / 2.0 - alignment_axis.length(floating) / 2.0;

    let coords = match placement.side {
        Side::Top => Point::new(common_x, reference.y0 - floating.height),
        Side::Bottom => Point::new(common_x, reference.y1),
        Side::Right => Point::new(reference.x1, common_y),
        Side::Left => Point::new(reference.x0 - floating.width, common_y),
    };

    let direction = if rtl && is_vertical { -1.0 } else { 1.0 };
    let shift = match placement.alignment {
        Some(Alignment::Start) => -common_align * direction,
        Some(Alignment::End) => common_align * direction,
        None => 0.0,
    };
    let along = alignment_axis.of_point(coords) + shift;
    alignment_axis.with_point(coords, along)
}
