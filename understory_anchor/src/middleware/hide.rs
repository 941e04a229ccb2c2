// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hide: report when the floating box should be hidden.

use alloc::boxed::Box;

use kurbo::{Insets, Rect};

use super::{BoxFuture, Middleware, MiddlewareReturn, MiddlewareState};
use crate::error::Error;
use crate::overflow::{DetectOverflowOptions, ElementContext, detect_overflow};
use crate::platform::Platform;

/// Slot name of [`HideData`].
pub const NAME: &str = "hide";

/// What [`hide`] checks.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum HideStrategy {
    /// The reference is fully clipped by its own clipping ancestors.
    #[default]
    ReferenceHidden,
    /// The floating box is fully outside the reference's clipping ancestors.
    Escaped,
}

/// Options for [`hide`].
#[derive(Clone, Debug)]
pub struct HideOptions<E> {
    /// Check to perform.
    pub strategy: HideStrategy,
    /// Overflow measurement options; the element context and alternate
    /// boundary are chosen by the strategy.
    pub detect_overflow: DetectOverflowOptions<E>,
}

impl<E> Default for HideOptions<E> {
    fn default() -> Self {
        Self {
            strategy: HideStrategy::default(),
            detect_overflow: DetectOverflowOptions::default(),
        }
    }
}

impl<E> From<HideStrategy> for HideOptions<E> {
    fn from(strategy: HideStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}

/// Visibility flags, stored under [`NAME`].
///
/// Fields are `None` until the matching strategy has run; running both
/// strategies fills both halves.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HideData {
    /// The reference is fully clipped on at least one side.
    pub reference_hidden: Option<bool>,
    /// Per-side distance past full clipping of the reference.
    pub reference_hidden_offsets: Option<Insets>,
    /// The floating box has fully escaped the reference's clipping context.
    pub escaped: Option<bool>,
    /// Per-side distance past full clipping of the floating box.
    pub escaped_offsets: Option<Insets>,
}

/// The hide middleware. See [`hide`].
#[derive(Clone, Debug)]
pub struct Hide<E> {
    options: HideOptions<E>,
}

/// Detect a hidden reference or an escaped floating box.
pub fn hide<E>(options: impl Into<HideOptions<E>>) -> Hide<E> {
    Hide {
        options: options.into(),
    }
}

/// Overflow minus the rect's extent on each side: non-negative means that side
/// clips the whole rect.
pub fn side_offsets(overflow: Insets, rect: Rect) -> Insets {
    Insets::new(
        overflow.x0 - rect.width(),
        overflow.y0 - rect.height(),
        overflow.x1 - rect.width(),
        overflow.y1 - rect.height(),
    )
}

/// Whether any side clips the whole rect.
pub fn is_any_side_fully_clipped(offsets: Insets) -> bool {
    [offsets.x0, offsets.y0, offsets.x1, offsets.y1]
        .into_iter()
        .any(|o| o >= 0.0)
}

impl<P, E> Middleware<P> for Hide<E>
where
    P: Platform<Element = E>,
    E: Clone,
{
    fn name(&self) -> &'static str {
        NAME
    }

    fn compute<'a>(
        &'a self,
        state: MiddlewareState<'a, P>,
    ) -> BoxFuture<'a, Result<MiddlewareReturn, Error>> {
        Box::pin(async move {
            let mut data = state.middleware_data.hide().copied().unwrap_or_default();
            let mut options = self.options.detect_overflow.clone();
            match self.options.strategy {
                HideStrategy::ReferenceHidden => {
                    options.element_context = ElementContext::Reference;
                    let overflow = detect_overflow(&state, &options).await?;
                    let offsets = side_offsets(overflow, state.rects.reference);
                    data.reference_hidden = Some(is_any_side_fully_clipped(offsets));
                    data.reference_hidden_offsets = Some(offsets);
                }
                HideStrategy::Escaped => {
                    options.alt_boundary = true;
                    let overflow = detect_overflow(&state, &options).await?;
                    let offsets = side_offsets(overflow, state.rects.floating);
                    data.escaped = Some(is_any_side_fully_clipped(offsets));
                    data.escaped_offsets = Some(offsets);
                }
            }
            Ok(MiddlewareReturn::default().with_data(data))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{ComputePositionConfig, compute_position};
    use crate::geometry::rect_from_xywh;
    use crate::scene::{Scene, SceneElement};
    use pollster::block_on;

    #[test]
    fn offsets_subtract_extent() {
        let offsets = side_offsets(
            Insets::new(50.0, -10.0, -300.0, 0.0),
            rect_from_xywh(0.0, 0.0, 20.0, 10.0),
        );
        assert_eq!(offsets, Insets::new(30.0, -20.0, -320.0, -10.0));
        assert!(is_any_side_fully_clipped(offsets));
        assert!(!is_any_side_fully_clipped(Insets::uniform(-1.0)));
    }

    #[test]
    fn both_strategies_share_one_slot() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 200.0, 200.0));
        // Scrolled above the viewport; the floating box below it is half visible.
        let r = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(50.0, -35.0, 20.0, 20.0)),
        );
        let f = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(0.0, 0.0, 80.0, 30.0)),
        );
        let config = ComputePositionConfig::new(&scene)
            .with(hide(HideStrategy::ReferenceHidden))
            .with(hide(HideStrategy::Escaped));
        let out = block_on(compute_position(&r, &f, config)).unwrap();
        let data = out.middleware_data.hide().unwrap();
        assert_eq!(data.reference_hidden, Some(true));
        assert_eq!(data.escaped, Some(false));
        assert_eq!(data.escaped_offsets.map(|o| o.y0), Some(-15.0));
    }

    #[test]
    fn visible_reference_is_not_hidden() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 200.0, 200.0));
        let r = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(50.0, 50.0, 20.0, 20.0)),
        );
        let f = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(0.0, 0.0, 80.0, 30.0)),
        );
        let config = ComputePositionConfig::new(&scene).with(hide(HideOptions::default()));
        let out = block_on(compute_position(&r, &f, config)).unwrap();
        let data = out.middleware_data.hide().unwrap();
        assert_eq!(data.reference_hidden, Some(false));
        assert_eq!(data.escaped, None);
    }
}
