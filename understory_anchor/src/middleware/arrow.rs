// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arrow: position a pointer element so it aims at the reference's center.
//!
//! The arrow moves along the placement's alignment axis, clamped to stay
//! `padding` away from the floating box's edges. When an aligned placement
//! leaves too little reference overlap for the arrow to reach, the floating box
//! itself is nudged by an alignment offset and the pipeline restarts once.

use alloc::boxed::Box;

use kurbo::Insets;

use super::{BoxFuture, Middleware, MiddlewareReturn, MiddlewareState, Reset};
use crate::error::Error;
use crate::geometry::clamp;
use crate::platform::Platform;
use crate::types::{Axis, Side};

/// Slot name of [`ArrowData`].
pub const NAME: &str = "arrow";

/// Options for [`arrow`].
#[derive(Clone, Debug, PartialEq)]
pub struct ArrowOptions<E> {
    /// The arrow element.
    pub element: Option<E>,
    /// Minimum distance between the arrow and the floating box's edges.
    pub padding: Insets,
}

impl<E> ArrowOptions<E> {
    /// Options for `element` without padding.
    pub fn new(element: E) -> Self {
        Self {
            element: Some(element),
            padding: Insets::ZERO,
        }
    }
}

/// Arrow position, stored under [`NAME`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ArrowData {
    /// Offset from the floating box's left edge, for vertical sides.
    pub x: Option<f64>,
    /// Offset from the floating box's top edge, for horizontal sides.
    pub y: Option<f64>,
    /// How far the arrow is from true center because of clamping.
    pub center_offset: f64,
    /// Amount the floating box was nudged to keep the arrow on the reference.
    pub alignment_offset: Option<f64>,
    /// Side of the floating box the arrow sits on.
    pub static_side: Side,
}

/// The arrow middleware. See [`arrow`].
#[derive(Clone, Debug)]
pub struct Arrow<E> {
    element: E,
    padding: Insets,
}

/// Aim an arrow element at the reference.
///
/// Fails with [`Error::MissingArrowElement`] when no element is supplied.
pub fn arrow<E>(options: ArrowOptions<E>) -> Result<Arrow<E>, Error> {
    let element = options.element.ok_or(Error::MissingArrowElement)?;
    Ok(Arrow {
        element,
        padding: options.padding,
    })
}

impl<P, E> Middleware<P> for Arrow<E>
where
    P: Platform<Element = E>,
{
    fn name(&self) -> &'static str {
        NAME
    }

    fn compute<'a>(
        &'a self,
        state: MiddlewareState<'a, P>,
    ) -> BoxFuture<'a, Result<MiddlewareReturn, Error>> {
        Box::pin(async move {
            let placement = state.placement;
            let rects = state.rects;
            let axis = placement.alignment_axis();
            let coords = state.coords();
            let at = axis.of_point(coords);

            let arrow_size = state.platform.get_dimensions(&self.element).await?;
            let arrow_length = axis.length(arrow_size);
            let reference_start = axis.start(rects.reference);
            let reference_length = axis.rect_length(rects.reference);
            let floating_length = axis.rect_length(rects.floating);

            let end_diff = reference_length + reference_start - at - floating_length;
            let start_diff = at - reference_start;
            let center_to_reference = end_diff / 2.0 - start_diff / 2.0;

            let largest_padding = floating_length / 2.0 - arrow_length / 2.0 - 1.0;
            let min_padding = axis.min_side().of(self.padding).min(largest_padding);
            let max_padding = axis.max_side().of(self.padding).min(largest_padding);
            let min = min_padding;
            let max = floating_length - arrow_length - max_padding;
            let center = floating_length / 2.0 - arrow_length / 2.0 + center_to_reference;
            let offset = clamp(min, center, max);

            let edge_padding = if center < min {
                min_padding
            } else {
                max_padding
            };
            let should_add_offset = state.middleware_data.arrow().is_none()
                && placement.alignment.is_some()
                && center != offset
                && reference_length / 2.0 - edge_padding - arrow_length / 2.0 < 0.0;
            let alignment_offset = if !should_add_offset {
                0.0
            } else if center < min {
                center - min
            } else {
                center - max
            };

            let data = ArrowData {
                x: (axis == Axis::X).then_some(offset),
                y: (axis == Axis::Y).then_some(offset),
                center_offset: center - offset - alignment_offset,
                alignment_offset: should_add_offset.then_some(alignment_offset),
                static_side: placement.side.opposite(),
            };
            let out = MiddlewareReturn::coords(axis.with_point(coords, at + alignment_offset))
                .with_data(data);
            Ok(if should_add_offset {
                out.with_reset(Reset::default())
            } else {
                out
            })
        })
    }
}
