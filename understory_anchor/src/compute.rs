// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline runner: resolve a placement, then thread it through the middleware.
//!
//! ## Passes and resets
//!
//! A pass runs every configured middleware once, in order. A middleware may
//! return a [`Reset`](crate::middleware::Reset); the runner then applies the
//! requested placement and rects, recomputes the base coordinates when either
//! changed, and starts a new pass from the first middleware. Data written in
//! earlier passes stays visible. More than [`MAX_RESETS`] resets in one call is
//! treated as a middleware defect and reported as
//! [`Error::ResetLimitExceeded`].

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use tracing::{debug, trace, warn};

use crate::error::Error;
use crate::middleware::{Middleware, MiddlewareData, MiddlewareState, ResetRects};
use crate::placement::compute_coords_from_placement;
use crate::platform::Platform;
use crate::types::{Elements, Placement, Strategy};

/// Upper bound on resets within one [`compute_position`] call.
pub const MAX_RESETS: u32 = 50;

/// Configuration for [`compute_position`].
pub struct ComputePositionConfig<'a, P: Platform> {
    /// Measurement surface.
    pub platform: &'a P,
    /// Requested placement.
    pub placement: Placement,
    /// Positioning strategy.
    pub strategy: Strategy,
    /// Middleware in execution order; `None` entries are skipped.
    pub middleware: Vec<Option<Box<dyn Middleware<P> + 'a>>>,
}

impl<'a, P: Platform> ComputePositionConfig<'a, P> {
    /// Bottom placement, absolute strategy, no middleware.
    pub fn new(platform: &'a P) -> Self {
        Self {
            platform,
            placement: Placement::default(),
            strategy: Strategy::default(),
            middleware: Vec::new(),
        }
    }

    /// Set the requested placement.
    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Set the positioning strategy.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Append a middleware.
    pub fn with(mut self, middleware: impl Middleware<P> + 'a) -> Self {
        self.middleware.push(Some(Box::new(middleware)));
        self
    }

    /// Append a middleware only when present.
    pub fn with_opt(mut self, middleware: Option<impl Middleware<P> + 'a>) -> Self {
        let middleware = middleware.map(|m| Box::new(m) as Box<dyn Middleware<P> + 'a>);
        self.middleware.push(middleware);
        self
    }
}

impl<P: Platform> fmt::Debug for ComputePositionConfig<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<Option<&'static str>> = self
            .middleware
            .iter()
            .map(|m| m.as_ref().map(|m| m.name()))
            .collect();
        f.debug_struct("ComputePositionConfig")
            .field("placement", &self.placement)
            .field("strategy", &self.strategy)
            .field("middleware", &names)
            .finish_non_exhaustive()
    }
}

/// Result of [`compute_position`].
#[derive(Clone, Debug)]
pub struct ComputePositionReturn {
    /// Final x coordinate of the floating element.
    pub x: f64,
    /// Final y coordinate of the floating element.
    pub y: f64,
    /// Placement actually used, after flipping or auto placement.
    pub placement: Placement,
    /// Strategy the coordinates are expressed in.
    pub strategy: Strategy,
    /// Data written by the middleware.
    pub middleware_data: MiddlewareData,
}

impl ComputePositionReturn {
    /// Final coordinates as a point.
    pub fn coords(&self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }
}

/// Compute coordinates that place `floating` next to `reference`.
///
/// Measures both elements, resolves the requested placement, then runs the
/// configured middleware. Measurement failures propagate unchanged.
pub async fn compute_position<'a, P: Platform>(
    reference: &'a P::Element,
    floating: &'a P::Element,
    config: ComputePositionConfig<'a, P>,
) -> Result<ComputePositionReturn, Error> {
    let ComputePositionConfig {
        platform,
        placement,
        strategy,
        middleware,
    } = config;
    let middleware: Vec<&(dyn Middleware<P> + 'a)> =
        middleware.iter().filter_map(|m| m.as_deref()).collect();

    let rtl = platform.is_rtl(floating).await?;
    let mut rects = platform
        .get_element_rects(reference, floating, strategy)
        .await?;
    let mut coords = compute_coords_from_placement(&rects, placement, rtl);
    let mut stateful_placement = placement;
    let mut middleware_data = MiddlewareData::default();
    let mut resets = 0_u32;
    let elements = Elements {
        reference,
        floating,
    };

    let mut i = 0;
    while i < middleware.len() {
        let m = middleware[i];
        let name = m.name();
        let result = {
            let state = MiddlewareState {
                x: coords.x,
                y: coords.y,
                initial_placement: placement,
                placement: stateful_placement,
                strategy,
                middleware_data: &middleware_data,
                elements,
                rects,
                platform,
            };
            m.compute(state).await?
        };
        trace!(
            middleware = name,
            x = ?result.x,
            y = ?result.y,
            reset = result.reset.is_some(),
            "middleware step"
        );

        coords.x = result.x.unwrap_or(coords.x);
        coords.y = result.y.unwrap_or(coords.y);
        if let Some(data) = result.data {
            middleware_data.insert(name, data);
        }

        let Some(reset) = result.reset else {
            i += 1;
            continue;
        };
        if resets >= MAX_RESETS {
            warn!(middleware = name, resets, "reset limit exceeded");
            return Err(Error::ResetLimitExceeded {
                middleware: name,
                resets,
            });
        }
        resets += 1;
        if let Some(p) = reset.placement {
            stateful_placement = p;
        }
        match reset.rects {
            Some(ResetRects::Remeasure) => {
                rects = platform
                    .get_element_rects(reference, floating, strategy)
                    .await?;
            }
            Some(ResetRects::Provided(provided)) => rects = provided,
            None => {}
        }
        if reset.placement.is_some() || reset.rects.is_some() {
            coords = compute_coords_from_placement(&rects, stateful_placement, rtl);
        }
        trace!(
            middleware = name,
            resets,
            placement = %stateful_placement,
            "pipeline reset"
        );
        i = 0;
    }

    debug!(
        x = coords.x,
        y = coords.y,
        placement = %stateful_placement,
        resets,
        "computed position"
    );
    Ok(ComputePositionReturn {
        x: coords.x,
        y: coords.y,
        placement: stateful_placement,
        strategy,
        middleware_data,
    })
}
