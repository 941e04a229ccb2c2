// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Size: report how much room the floating box has, and let the host resize it.
//!
//! The `apply` callback receives the available width and height. If the host
//! resizes the floating element in response, the next measurement differs and
//! the pipeline restarts with fresh rects.

use alloc::boxed::Box;
use core::fmt;

use super::{BoxFuture, Middleware, MiddlewareReturn, MiddlewareState, Reset};
use crate::error::Error;
use crate::overflow::{DetectOverflowOptions, detect_overflow};
use crate::platform::Platform;
use crate::types::{Alignment, Axes, Axis, ElementRects, Elements, Placement, Side};

/// Name the size middleware runs under. It stores no data.
pub const NAME: &str = "size";

/// Room available to the floating box, passed to the `apply` callback.
#[derive(Debug)]
pub struct SizeApply<'a, E> {
    /// Width the floating box can take without overflowing.
    pub available_width: f64,
    /// Height the floating box can take without overflowing.
    pub available_height: f64,
    /// Rects measured for this pass.
    pub rects: ElementRects,
    /// Placement in effect.
    pub placement: Placement,
    /// The element pair, so the callback can resize the floating element.
    pub elements: Elements<'a, E>,
}

/// Options for [`size`].
pub struct SizeOptions<E, F> {
    /// Callback receiving the available space.
    pub apply: F,
    /// Overflow measurement options.
    pub detect_overflow: DetectOverflowOptions<E>,
}

impl<E, F> fmt::Debug for SizeOptions<E, F>
where
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeOptions")
            .field("detect_overflow", &self.detect_overflow)
            .finish_non_exhaustive()
    }
}

impl<E, F> SizeOptions<E, F> {
    /// Options with default overflow detection.
    pub fn new(apply: F) -> Self
    where
        F: Fn(&SizeApply<'_, E>),
    {
        Self {
            apply,
            detect_overflow: DetectOverflowOptions::default(),
        }
    }
}

/// The size middleware. See [`size`].
#[derive(Debug)]
pub struct SizeMiddleware<E, F> {
    options: SizeOptions<E, F>,
}

/// Report the available space to `options.apply`.
pub fn size<E, F>(options: SizeOptions<E, F>) -> SizeMiddleware<E, F>
where
    F: Fn(&SizeApply<'_, E>),
{
    SizeMiddleware { options }
}

/// Available `(width, height)` for the floating box given its overflow.
///
/// `shift` is the set of axes a preceding shift is allowed to move along, or
/// `None` when no shift ran.
pub fn available_size(
    placement: Placement,
    floating: kurbo::Size,
    overflow: kurbo::Insets,
    shift: Option<Axes>,
    rtl: bool,
) -> (f64, f64) {
    let side = placement.side;
    let alignment = placement.alignment;
    let (width_side, height_side) = match side {
        Side::Top | Side::Bottom => {
            let trailing = if rtl {
                Alignment::Start
            } else {
                Alignment::End
            };
            let width_side = if alignment == Some(trailing) {
                Side::Left
            } else {
                Side::Right
            };
            (width_side, side)
        }
        Side::Left | Side::Right => {
            let height_side = if alignment == Some(Alignment::End) {
                Side::Top
            } else {
                Side::Bottom
            };
            (side, height_side)
        }
    };

    let max_clipping_height = floating.height - overflow.y0 - overflow.y1;
    let max_clipping_width = floating.width - overflow.x0 - overflow.x1;
    let mut height = (floating.height - height_side.of(overflow)).min(max_clipping_height);
    let mut width = (floating.width - width_side.of(overflow)).min(max_clipping_width);

    match shift {
        Some(enabled) => {
            if enabled.contains(Axes::X) {
                width = max_clipping_width;
            }
            if enabled.contains(Axes::Y) {
                height = max_clipping_height;
            }
        }
        None if alignment.is_none() => {
            // Centered and unshifted: the box grows symmetrically, so the
            // tighter side limits both.
            let x_min = overflow.x0.max(0.0);
            let x_max = overflow.x1.max(0.0);
            let y_min = overflow.y0.max(0.0);
            let y_max = overflow.y1.max(0.0);
            if placement.side_axis() == Axis::Y {
                let spent = if x_min != 0.0 || x_max != 0.0 {
                    x_min + x_max
                } else {
                    overflow.x0.max(overflow.x1)
                };
                width = floating.width - 2.0 * spent;
            } else {
                let spent = if y_min != 0.0 || y_max != 0.0 {
                    y_min + y_max
                } else {
                    overflow.y0.max(overflow.y1)
                };
                height = floating.height - 2.0 * spent;
            }
        }
        None => {}
    }
    (width, height)
}

impl<P, E, F> Middleware<P> for SizeMiddleware<E, F>
where
    P: Platform<Element = E>,
    F: Fn(&SizeApply<'_, E>),
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
            let rtl = state.platform.is_rtl(state.elements.floating).await?;
            let floating = state.rects.floating.size();
            let shift = state.middleware_data.shift().map(|s| s.enabled);
            let (available_width, available_height) =
                available_size(state.placement, floating, overflow, shift, rtl);

            (options.apply)(&SizeApply {
                available_width,
                available_height,
                rects: state.rects,
                placement: state.placement,
                elements: state.elements,
            });

            let next = state.platform.get_dimensions(state.elements.floating).await?;
            if next != floating {
                return Ok(MiddlewareReturn::default().with_reset(Reset::remeasure()));
            }
            Ok(MiddlewareReturn::default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{ComputePositionConfig, compute_position};
    use crate::geometry::rect_from_xywh;
    use crate::middleware::shift::{ShiftOptions, shift};
    use crate::platform::{Boundary, RootBoundary};
    use crate::scene::{Scene, SceneElement};
    use crate::types::Strategy;
    use core::cell::Cell;
    use core::future::{Future, ready};
    use kurbo::{Rect, Size};
    use pollster::block_on;

    fn scene() -> (Scene, crate::scene::ElementId, crate::scene::ElementId) {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 1000.0, 140.0));
        let r = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(100.0, 100.0, 50.0, 20.0)),
        );
        let f = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(0.0, 0.0, 80.0, 30.0)),
        );
        (scene, r, f)
    }

    #[test]
    fn reports_room_below_the_reference() {
        let (scene, r, f) = scene();
        let seen = Cell::new((0.0, 0.0));
        let config = ComputePositionConfig::new(&scene).with(size(SizeOptions::new(
            |apply: &SizeApply<'_, _>| seen.set((apply.available_width, apply.available_height)),
        )));
        block_on(compute_position(&r, &f, config)).unwrap();
        // 20px below the reference; horizontally limited by the nearer edge (85px each side).
        assert_eq!(seen.get(), (250.0, 20.0));
    }

    #[test]
    fn shift_frees_the_alignment_axis() {
        let (scene, r, f) = scene();
        let seen = Cell::new((0.0, 0.0));
        let config = ComputePositionConfig::new(&scene)
            .with(shift(ShiftOptions::default()))
            .with(size(SizeOptions::new(|apply: &SizeApply<'_, _>| {
                seen.set((apply.available_width, apply.available_height));
            })));
        block_on(compute_position(&r, &f, config)).unwrap();
        assert_eq!(seen.get(), (1000.0, 20.0));
    }

    /// Platform whose floating element takes whatever height it is given.
    struct Elastic {
        floating: Cell<Size>,
    }

    impl Platform for Elastic {
        type Element = u8;

        fn get_element_rects(
            &self,
            _reference: &u8,
            _floating: &u8,
            _strategy: Strategy,
        ) -> impl Future<Output = Result<ElementRects, Error>> {
            ready(Ok(ElementRects {
                reference: rect_from_xywh(100.0, 100.0, 50.0, 20.0),
                floating: Rect::from_origin_size((0.0, 0.0), self.floating.get()),
            }))
        }

        fn get_clipping_rect(
            &self,
            _element: &u8,
            _boundary: &Boundary<u8>,
            _root_boundary: &RootBoundary,
            _strategy: Strategy,
        ) -> impl Future<Output = Result<Rect, Error>> {
            ready(Ok(Rect::new(0.0, 0.0, 1000.0, 140.0)))
        }

        fn get_dimensions(&self, _element: &u8) -> impl Future<Output = Result<Size, Error>> {
            ready(Ok(self.floating.get()))
        }
    }

    #[test]
    fn resizing_restarts_with_new_rects() {
        let platform = Elastic {
            floating: Cell::new(Size::new(80.0, 30.0)),
        };
        let calls = Cell::new(0);
        let options = SizeOptions::new(|apply: &SizeApply<'_, u8>| {
            calls.set(calls.get() + 1);
            let current = platform.floating.get();
            let height = current.height.min(apply.available_height);
            platform.floating.set(Size::new(current.width, height));
        });
        let config = ComputePositionConfig::new(&platform).with(size(options));
        let out = block_on(compute_position(&0, &1, config)).unwrap();
        assert_eq!(platform.floating.get().height, 20.0);
        assert_eq!(calls.get(), 2, "one pass to shrink, one to settle");
        assert_eq!(out.y, 120.0);
    }
}
