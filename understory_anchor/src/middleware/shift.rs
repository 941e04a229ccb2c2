// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shift: slide the floating box back inside its clipping rect.
//!
//! ## Axes
//!
//! `main_axis` is the alignment axis (horizontal for top/bottom placements), the
//! direction the floating box can slide without leaving its side. `cross_axis`
//! is the side axis; enabling it lets the box move over the reference.
//!
//! A [`Limiter`] runs after clamping. [`limit_shift`] stops the slide once the
//! floating box would no longer touch the reference.

use alloc::boxed::Box;

use kurbo::Point;

use super::{BoxFuture, Middleware, MiddlewareReturn, MiddlewareState};
use crate::error::Error;
use crate::geometry::clamp;
use crate::overflow::{DetectOverflowOptions, detect_overflow};
use crate::platform::Platform;
use crate::types::{Axes, Axis};

/// Slot name of [`ShiftData`].
pub const NAME: &str = "shift";

/// Post-processes shifted coordinates.
pub trait Limiter {
    /// Constrain `coords` (already clamped into the clipping rect).
    fn limit<P: Platform>(&self, state: &MiddlewareState<'_, P>, coords: Point) -> Point;
}

/// Limiter that leaves coordinates alone.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoLimit;

impl Limiter for NoLimit {
    fn limit<P: Platform>(&self, _state: &MiddlewareState<'_, P>, coords: Point) -> Point {
        coords
    }
}

/// Options for [`shift`].
#[derive(Clone, Debug)]
pub struct ShiftOptions<E, L = NoLimit> {
    /// Shift along the alignment axis.
    pub main_axis: bool,
    /// Shift along the side axis.
    pub cross_axis: bool,
    /// Post-processing of the shifted coordinates.
    pub limiter: L,
    /// Overflow measurement options.
    pub detect_overflow: DetectOverflowOptions<E>,
}

impl<E> Default for ShiftOptions<E> {
    fn default() -> Self {
        Self {
            main_axis: true,
            cross_axis: false,
            limiter: NoLimit,
            detect_overflow: DetectOverflowOptions::default(),
        }
    }
}

impl<E, L> ShiftOptions<E, L> {
    /// Replace the limiter.
    pub fn limiter<L2: Limiter>(self, limiter: L2) -> ShiftOptions<E, L2> {
        ShiftOptions {
            main_axis: self.main_axis,
            cross_axis: self.cross_axis,
            limiter,
            detect_overflow: self.detect_overflow,
        }
    }
}

/// Amount shifted, stored under [`NAME`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShiftData {
    /// Horizontal shift.
    pub x: f64,
    /// Vertical shift.
    pub y: f64,
    /// Axes shifting was enabled on.
    pub enabled: Axes,
}

/// The shift middleware. See [`shift`].
#[derive(Clone, Debug)]
pub struct Shift<E, L = NoLimit> {
    options: ShiftOptions<E, L>,
}

/// Keep the floating box inside its clipping rect by sliding it.
pub fn shift<E, L: Limiter>(options: ShiftOptions<E, L>) -> Shift<E, L> {
    Shift { options }
}

impl<P, E, L> Middleware<P> for Shift<E, L>
where
    P: Platform<Element = E>,
    L: Limiter,
{
    fn name(&self) -> &'static str {
        NAME
    }

    fn compute<'a>(
        &'a self,
        state: MiddlewareState<'a, P>,
    ) -> BoxFuture<'a, Result<MiddlewareReturn, Error>> {
        Box::pin(async move {
            let options = &self.options;
            let overflow = detect_overflow(&state, &options.detect_overflow).await?;
            let cross_axis = state.placement.side_axis();
            let main_axis = cross_axis.opposite();

            let mut coords = state.coords();
            if options.main_axis {
                coords = clamp_axis(coords, main_axis, overflow);
            }
            if options.cross_axis {
                coords = clamp_axis(coords, cross_axis, overflow);
            }
            let limited = options.limiter.limit(&state, coords);

            let mut enabled = Axes::empty();
            if options.main_axis {
                enabled |= Axes::from(main_axis);
            }
            if options.cross_axis {
                enabled |= Axes::from(cross_axis);
            }
            Ok(MiddlewareReturn::coords(limited).with_data(ShiftData {
                x: limited.x - state.x,
                y: limited.y - state.y,
                enabled,
            }))
        })
    }
}

fn clamp_axis(coords: Point, axis: Axis, overflow: kurbo::Insets) -> Point {
    let v = axis.of_point(coords);
    let min = v + axis.min_side().of(overflow);
    let max = v - axis.max_side().of(overflow);
    axis.with_point(coords, clamp(min, v, max))
}

/// Offsets for [`limit_shift`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LimitShiftOffset {
    /// How far before the reference's edge the slide stops on the alignment axis.
    pub main_axis: f64,
    /// How far before the reference's edge the slide stops on the side axis.
    pub cross_axis: f64,
}

impl From<f64> for LimitShiftOffset {
    fn from(main_axis: f64) -> Self {
        Self {
            main_axis,
            cross_axis: 0.0,
        }
    }
}

/// Options for [`limit_shift`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LimitShiftOptions {
    /// Offsets at which to stop.
    pub offset: LimitShiftOffset,
    /// Limit the alignment axis.
    pub main_axis: bool,
    /// Limit the side axis.
    pub cross_axis: bool,
}

impl Default for LimitShiftOptions {
    fn default() -> Self {
        Self {
            offset: LimitShiftOffset::default(),
            main_axis: true,
            cross_axis: true,
        }
    }
}

/// Limiter returned by [`limit_shift`].
#[derive(Copy, Clone, Debug, Default)]
pub struct LimitShift {
    options: LimitShiftOptions,
}

/// Stop shifting once the floating box would detach from the reference.
pub fn limit_shift(options: LimitShiftOptions) -> LimitShift {
    LimitShift { options }
}

impl Limiter for LimitShift {
    fn limit<P: Platform>(&self, state: &MiddlewareState<'_, P>, coords: Point) -> Point {
        let options = &self.options;
        let reference = state.rects.reference;
        let floating = state.rects.floating;
        let cross_axis = state.placement.side_axis();
        let main_axis = cross_axis.opposite();
        let mut main = main_axis.of_point(coords);
        let mut cross = cross_axis.of_point(coords);

        if options.main_axis {
            let limit_min = main_axis.start(reference) - main_axis.rect_length(floating)
                + options.offset.main_axis;
            let limit_max = main_axis.start(reference) + main_axis.rect_length(reference)
                - options.offset.main_axis;
            if main < limit_min {
                main = limit_min;
            } else if main > limit_max {
                main = limit_max;
            }
        }

        if options.cross_axis {
            let is_origin_side = state.placement.side.is_origin();
            let applied = state
                .middleware_data
                .offset()
                .map(|o| cross_axis.of_point(Point::new(o.x, o.y)))
                .unwrap_or(0.0);
            let (min_extra, max_extra) = if is_origin_side {
                (applied, -options.offset.cross_axis)
            } else {
                (options.offset.cross_axis, applied)
            };
            let start = cross_axis.start(reference);
            let limit_min = start - cross_axis.rect_length(floating) + min_extra;
            let limit_max = start + cross_axis.rect_length(reference) + max_extra;
            if cross < limit_min {
                cross = limit_min;
            } else if cross > limit_max {
                cross = limit_max;
            }
        }

        let coords = main_axis.with_point(coords, main);
        cross_axis.with_point(coords, cross)
    }
}
