// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Middleware: ordered positioning rules threaded through one computation.
//!
//! ## Protocol
//!
//! Each [`Middleware`] receives a [`MiddlewareState`] snapshot (coordinates so
//! far, placements, rects, the platform, and the data written by earlier
//! middleware) and returns a [`MiddlewareReturn`]. The runner applies returned
//! coordinates, stores returned data under the middleware's name, and on a
//! [`Reset`] restarts the pass from the first middleware.
//!
//! ## Standard set
//!
//! - [`offset`](offset::offset): translate away from or along the reference.
//! - [`shift`](shift::shift): slide back into the clipping rect
//!   (optionally bounded by [`limit_shift`](shift::limit_shift)).
//! - [`flip`](flip::flip): switch to a fallback placement when the side overflows.
//! - [`auto_placement`](auto_placement::auto_placement): pick the placement with the most space.
//! - [`size`](size::size): report available width and height.
//! - [`arrow`](arrow::arrow): center an arrow against the reference.
//! - [`hide`](hide::hide): detect a hidden reference or escaped floating box.
//!
//! Order matters: `offset` goes first so later rules see the offset position,
//! and `flip` or `auto_placement` should come before `shift`.
//!
//! ## Custom middleware
//!
//! Implement [`Middleware`] directly for async rules, or wrap a synchronous
//! closure with [`from_fn`].

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;
use core::future::{Future, ready};
use core::pin::Pin;

use kurbo::Point;

use crate::error::Error;
use crate::platform::Platform;
use crate::types::{ElementRects, Elements, Placement, Strategy};

pub mod arrow;
pub mod auto_placement;
pub mod flip;
pub mod hide;
pub mod offset;
pub mod shift;
pub mod size;

/// Boxed future returned by [`Middleware::compute`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Opaque per-middleware payload stored in [`MiddlewareData`].
pub type MiddlewareDatum = Arc<dyn Any>;

/// A single positioning rule.
pub trait Middleware<P: Platform> {
    /// Slot name under which returned data is stored.
    fn name(&self) -> &'static str;

    /// Run the rule against the current state.
    fn compute<'a>(
        &'a self,
        state: MiddlewareState<'a, P>,
    ) -> BoxFuture<'a, Result<MiddlewareReturn, Error>>;
}

/// Everything a middleware can see.
pub struct MiddlewareState<'a, P: Platform> {
    /// Current x coordinate.
    pub x: f64,
    /// Current y coordinate.
    pub y: f64,
    /// Placement the caller asked for.
    pub initial_placement: Placement,
    /// Placement in effect for this pass.
    pub placement: Placement,
    /// Positioning strategy.
    pub strategy: Strategy,
    /// Data written by middleware so far (including earlier passes).
    pub middleware_data: &'a MiddlewareData,
    /// Element pair being positioned.
    pub elements: Elements<'a, P::Element>,
    /// Measured rects for this pass.
    pub rects: ElementRects,
    /// Measurement surface.
    pub platform: &'a P,
}

impl<P: Platform> MiddlewareState<'_, P> {
    /// Current coordinates as a point.
    pub fn coords(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl<P: Platform> Clone for MiddlewareState<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: Platform> Copy for MiddlewareState<'_, P> {}

impl<P: Platform> fmt::Debug for MiddlewareState<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareState")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("initial_placement", &self.initial_placement)
            .field("placement", &self.placement)
            .field("strategy", &self.strategy)
            .field("rects", &self.rects)
            .field("middleware_data", &self.middleware_data)
            .finish_non_exhaustive()
    }
}

/// How the runner should obtain rects after a reset.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ResetRects {
    /// Measure both elements again through the platform.
    Remeasure,
    /// Use these rects.
    Provided(ElementRects),
}

/// Request to restart the pipeline.
///
/// A bare reset (both fields `None`) restarts with the current coordinates.
/// Supplying a placement or rects recomputes the base coordinates first.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Reset {
    /// Placement to use from now on.
    pub placement: Option<Placement>,
    /// Rects to use from now on.
    pub rects: Option<ResetRects>,
}

impl Reset {
    /// Reset to a new placement.
    pub fn placement(placement: Placement) -> Self {
        Self {
            placement: Some(placement),
            rects: None,
        }
    }

    /// Reset after re-measuring both elements.
    pub fn remeasure() -> Self {
        Self {
            placement: None,
            rects: Some(ResetRects::Remeasure),
        }
    }
}

/// Result of one middleware step.
#[derive(Clone, Default)]
pub struct MiddlewareReturn {
    /// New x coordinate, if changed.
    pub x: Option<f64>,
    /// New y coordinate, if changed.
    pub y: Option<f64>,
    /// Payload stored under the middleware's name.
    pub data: Option<MiddlewareDatum>,
    /// Restart request.
    pub reset: Option<Reset>,
}

impl MiddlewareReturn {
    /// Move to `coords`.
    pub fn coords(coords: Point) -> Self {
        Self {
            x: Some(coords.x),
            y: Some(coords.y),
            ..Self::default()
        }
    }

    /// Attach a payload.
    pub fn with_data<T: Any>(mut self, data: T) -> Self {
        self.data = Some(Arc::new(data));
        self
    }

    /// Attach a restart request.
    pub fn with_reset(mut self, reset: Reset) -> Self {
        self.reset = Some(reset);
        self
    }
}

impl fmt::Debug for MiddlewareReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareReturn")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("has_data", &self.data.is_some())
            .field("reset", &self.reset)
            .finish()
    }
}

/// Data written by middleware, keyed by middleware name.
///
/// Each slot belongs to one middleware and holds that middleware's own payload
/// type. A later write to the same slot replaces the earlier one. The map lives
/// for one [`compute_position`](crate::compute::compute_position) call.
#[derive(Clone, Default)]
pub struct MiddlewareData {
    slots: BTreeMap<&'static str, MiddlewareDatum>,
}

impl MiddlewareData {
    /// Typed payload stored under `name`, if present and of type `T`.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.slots.get(name)?.downcast_ref::<T>()
    }

    /// Whether `name` has written data.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Names with data, in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.keys().copied()
    }

    /// Number of slots with data.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when no middleware wrote data.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Data written by [`offset`](offset::offset).
    pub fn offset(&self) -> Option<&offset::OffsetData> {
        self.get(offset::NAME)
    }

    /// Data written by [`shift`](shift::shift).
    pub fn shift(&self) -> Option<&shift::ShiftData> {
        self.get(shift::NAME)
    }

    /// Data written by [`flip`](flip::flip).
    pub fn flip(&self) -> Option<&flip::FlipData> {
        self.get(flip::NAME)
    }

    /// Data written by [`auto_placement`](auto_placement::auto_placement).
    pub fn auto_placement(&self) -> Option<&auto_placement::AutoPlacementData> {
        self.get(auto_placement::NAME)
    }

    /// Data written by [`arrow`](arrow::arrow).
    pub fn arrow(&self) -> Option<&arrow::ArrowData> {
        self.get(arrow::NAME)
    }

    /// Data written by [`hide`](hide::hide).
    pub fn hide(&self) -> Option<&hide::HideData> {
        self.get(hide::NAME)
    }

    pub(crate) fn insert(&mut self, name: &'static str, datum: MiddlewareDatum) {
        self.slots.insert(name, datum);
    }
}

impl fmt::Debug for MiddlewareData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.slots.keys()).finish()
    }
}

/// Middleware built from a synchronous closure. See [`from_fn`].
pub struct FnMiddleware<F> {
    name: &'static str,
    f: F,
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Wrap a synchronous closure as a middleware named `name`.
///
/// ```
/// use understory_anchor::middleware::{MiddlewareReturn, MiddlewareState, from_fn};
/// use understory_anchor::scene::Scene;
///
/// let nudge = from_fn::<Scene, _>("nudge", |state: &MiddlewareState<'_, Scene>| {
///     Ok(MiddlewareReturn { x: Some(state.x + 1.0), ..Default::default() })
/// });
/// # let _ = nudge;
/// ```
pub fn from_fn<P, F>(name: &'static str, f: F) -> FnMiddleware<F>
where
    P: Platform,
    F: for<'s> Fn(&MiddlewareState<'s, P>) -> Result<MiddlewareReturn, Error>,
{
    FnMiddleware { name, f }
}

impl<P, F> Middleware<P> for FnMiddleware<F>
where
    P: Platform,
    F: for<'s> Fn(&MiddlewareState<'s, P>) -> Result<MiddlewareReturn, Error>,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn compute<'a>(
        &'a self,
        state: MiddlewareState<'a, P>,
    ) -> BoxFuture<'a, Result<MiddlewareReturn, Error>> {
        Box::pin(ready((self.f)(&state)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_slots_are_typed() {
        let mut data = MiddlewareData::default();
        data.insert("custom", Arc::new(7_u32));
        assert_eq!(data.get::<u32>("custom"), Some(&7));
        assert_eq!(data.get::<i64>("custom"), None);
        assert!(data.offset().is_none());
        data.insert("custom", Arc::new(9_u32));
        assert_eq!(data.get::<u32>("custom"), Some(&9), "last write wins");
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn return_builders() {
        let r = MiddlewareReturn::coords(Point::new(1.0, 2.0))
            .with_data(3_u8)
            .with_reset(Reset::placement(Placement::TOP));
        assert_eq!(r.x, Some(1.0));
        assert_eq!(r.y, Some(2.0));
        assert!(r.data.is_some());
        assert_eq!(r.reset.and_then(|r| r.placement), Some(Placement::TOP));
    }
}
