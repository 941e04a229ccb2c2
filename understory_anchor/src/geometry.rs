// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rect math and placement helpers shared by the resolver and the middleware.

use alloc::vec::Vec;

use kurbo::{Insets, Rect};

use crate::types::{Alignment, Axis, ElementRects, Placement, Side};

/// Clamp `value` into `[min, max]`, preferring `min` when the range is inverted.
///
/// An inverted range happens when the floating box is larger than the space it
/// is clamped into; the start edge wins so content stays reachable.
pub fn clamp(min: f64, value: f64, max: f64) -> f64 {
    min.max(value.min(max))
}

/// Build a rect from an origin and extent.
pub fn rect_from_xywh(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::new(x, y, x + width, y + height)
}

/// Per-side overflow of `inner` against `outer`, grown by `padding`.
///
/// Positive components mean `inner` crosses `outer` on that side by that much.
pub fn overflow_insets(outer: Rect, inner: Rect, padding: Insets) -> Insets {
    Insets::new(
        outer.x0 - inner.x0 + padding.x0,
        outer.y0 - inner.y0 + padding.y0,
        inner.x1 - outer.x1 + padding.x1,
        inner.y1 - outer.y1 + padding.y1,
    )
}

/// The pair of sides along the alignment axis, main alignment side first.
///
/// The main alignment side is where an aligned floating box would overflow
/// first. When the reference is longer than the floating box on that axis the
/// pair is reversed.
pub fn alignment_sides(placement: Placement, rects: &ElementRects, rtl: bool) -> (Side, Side) {
    let axis = placement.alignment_axis();
    let main = match axis {
        Axis::X => {
            let leading = if rtl {
                Alignment::End
            } else {
                Alignment::Start
            };
            if placement.alignment == Some(leading) {
                Side::Right
            } else {
                Side::Left
            }
        }
        Axis::Y => {
            if placement.alignment == Some(Alignment::Start) {
                Side::Bottom
            } else {
                Side::Top
            }
        }
    };
    let main = if axis.rect_length(rects.reference) > axis.rect_length(rects.floating) {
        main.opposite()
    } else {
        main
    };
    (main, main.opposite())
}

/// Mirror candidates for an aligned placement: opposite alignment, opposite side,
/// then opposite side with opposite alignment.
pub fn expanded_placements(placement: Placement) -> [Placement; 3] {
    let opposite = placement.opposite();
    [
        placement.opposite_alignment(),
        opposite,
        opposite.opposite_alignment(),
    ]
}

fn side_list(side: Side, is_start: bool, rtl: bool) -> [Side; 2] {
    const LR: [Side; 2] = [Side::Left, Side::Right];
    const RL: [Side; 2] = [Side::Right, Side::Left];
    const TB: [Side; 2] = [Side::Top, Side::Bottom];
    const BT: [Side; 2] = [Side::Bottom, Side::Top];
    match side {
        Side::Top | Side::Bottom => {
            if rtl {
                if is_start { RL } else { LR }
            } else if is_start {
                LR
            } else {
                RL
            }
        }
        Side::Left | Side::Right => {
            if is_start {
                TB
            } else {
                BT
            }
        }
    }
}

/// Perpendicular candidates for `placement`, starting from the logical
/// `direction` side.
///
/// When `placement` is aligned the alignment is carried over and, with
/// `flip_alignment`, the opposite alignments are appended.
pub fn opposite_axis_placements(
    placement: Placement,
    flip_alignment: bool,
    direction: Alignment,
    rtl: bool,
) -> Vec<Placement> {
    let sides = side_list(placement.side, direction == Alignment::Start, rtl);
    let mut list: Vec<Placement> = sides
        .iter()
        .map(|&side| Placement::new(side, placement.alignment))
        .collect();
    if placement.alignment.is_some() && flip_alignment {
        let flipped: Vec<Placement> = list.iter().map(|p| p.opposite_alignment()).collect();
        list.extend(flipped);
    }
    list
}
