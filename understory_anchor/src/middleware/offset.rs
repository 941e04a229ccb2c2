// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Offset: translate the floating box away from or along the reference.

use alloc::boxed::Box;

use kurbo::Vec2;

use super::{BoxFuture, Middleware, MiddlewareReturn, MiddlewareState};
use crate::error::Error;
use crate::platform::Platform;
use crate::types::{Alignment, Axis, Placement};

/// Slot name of [`OffsetData`].
pub const NAME: &str = "offset";

/// Distances applied by [`offset`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct OffsetOptions {
    /// Gap between the reference and the floating box along the side axis.
    pub main_axis: f64,
    /// Skidding along the alignment axis.
    pub cross_axis: f64,
    /// Skidding for aligned placements, replacing `cross_axis`.
    ///
    /// Positive values move towards the logical end for `start` placements and
    /// towards the start for `end` placements.
    pub alignment_axis: Option<f64>,
}

impl From<f64> for OffsetOptions {
    fn from(main_axis: f64) -> Self {
        Self {
            main_axis,
            ..Self::default()
        }
    }
}

/// Translation applied, stored under [`NAME`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OffsetData {
    /// Horizontal translation.
    pub x: f64,
    /// Vertical translation.
    pub y: f64,
    /// Placement the translation was computed for.
    pub placement: Placement,
}

/// The offset middleware. See [`offset`].
#[derive(Copy, Clone, Debug, Default)]
pub struct Offset {
    options: OffsetOptions,
}

/// Translate the floating box by `options`.
///
/// Put this first: later middleware then measure the offset position.
pub fn offset(options: impl Into<OffsetOptions>) -> Offset {
    Offset {
        options: options.into(),
    }
}

/// Convert logical offsets into a physical translation for `placement`.
pub fn offset_to_coords(options: &OffsetOptions, placement: Placement, rtl: bool) -> Vec2 {
    let is_vertical = placement.side_axis() == Axis::Y;
    let main_multi = if placement.side.is_origin() {
        -1.0
    } else {
        1.0
    };
    let cross_multi = if rtl && is_vertical { -1.0 } else { 1.0 };

    let cross_axis = match (placement.alignment, options.alignment_axis) {
        (Some(Alignment::End), Some(v)) => -v,
        (Some(Alignment::Start), Some(v)) => v,
        _ => options.cross_axis,
    };

    if is_vertical {
        Vec2::new(cross_axis * cross_multi, options.main_axis * main_multi)
    } else {
        Vec2::new(options.main_axis * main_multi, cross_axis * cross_multi)
    }
}

impl<P: Platform> Middleware<P> for Offset {
    fn name(&self) -> &'static str {
        NAME
    }

    fn compute<'a>(
        &'a self,
        state: MiddlewareState<'a, P>,
    ) -> BoxFuture<'a, Result<MiddlewareReturn, Error>> {
        Box::pin(async move {
            let rtl = state.platform.is_rtl(state.elements.floating).await?;
            let diff = offset_to_coords(&self.options, state.placement, rtl);

            // The arrow already moved us for this placement; do not apply twice.
            let data = state.middleware_data;
            let previous = data.offset();
            let same_placement = previous.is_some_and(|o| o.placement == state.placement);
            let arrow_shifted = data
                .arrow()
                .is_some_and(|a| a.alignment_offset.is_some_and(|o| o != 0.0));
            if same_placement && arrow_shifted {
                return Ok(MiddlewareReturn::default());
            }

            let out = MiddlewareReturn::coords(state.coords() + diff);
            Ok(out.with_data(OffsetData {
                x: diff.x,
                y: diff.y,
                placement: state.placement,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_axis_points_away_from_reference() {
        let o = OffsetOptions::from(10.0);
        let at = |placement| offset_to_coords(&o, placement, false);
        assert_eq!(at(Placement::TOP), Vec2::new(0.0, -10.0));
        assert_eq!(at(Placement::BOTTOM), Vec2::new(0.0, 10.0));
        assert_eq!(at(Placement::LEFT), Vec2::new(-10.0, 0.0));
        assert_eq!(at(Placement::RIGHT), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn cross_axis_and_alignment_axis() {
        let o = OffsetOptions {
            main_axis: 0.0,
            cross_axis: 5.0,
            alignment_axis: Some(3.0),
        };
        let ltr = |placement| offset_to_coords(&o, placement, false);
        let rtl = |placement| offset_to_coords(&o, placement, true);
        assert_eq!(ltr(Placement::BOTTOM), Vec2::new(5.0, 0.0));
        assert_eq!(rtl(Placement::BOTTOM), Vec2::new(-5.0, 0.0));
        assert_eq!(ltr(Placement::BOTTOM_START), Vec2::new(3.0, 0.0));
        assert_eq!(ltr(Placement::BOTTOM_END), Vec2::new(-3.0, 0.0));
        assert_eq!(
            rtl(Placement::RIGHT_END),
            Vec2::new(0.0, -3.0),
            "rtl does not mirror the vertical alignment axis"
        );
    }
}
