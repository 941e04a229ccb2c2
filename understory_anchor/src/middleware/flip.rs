// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flip: move to a fallback placement when the current side overflows.
//!
//! ## Candidate order
//!
//! Candidates are tried as `[initial, fallbacks...]`, one per pass, each via a
//! placement reset. Without explicit fallbacks the list is mirror-first:
//!
//! - unaligned, or `flip_alignment` off: the opposite side;
//! - aligned: opposite alignment, opposite side, opposite side with opposite
//!   alignment.
//!
//! Perpendicular sides are appended only when
//! [`FlipOptions::fallback_axis_side_direction`] is set.
//!
//! When every candidate overflows, the first tried placement whose side fits
//! and whose alignment overflows least wins; otherwise
//! [`FallbackStrategy`] decides. Ties keep the order candidates were tried in.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use super::{BoxFuture, Middleware, MiddlewareReturn, MiddlewareState, Reset};
use crate::error::Error;
use crate::geometry::{alignment_sides, expanded_placements, opposite_axis_placements};
use crate::overflow::{DetectOverflowOptions, detect_overflow};
use crate::platform::Platform;
use crate::types::{Alignment, Axis, Placement};

/// Slot name of [`FlipData`].
pub const NAME: &str = "flip";

/// Which alignment-axis overflow counts towards flipping.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum CrossAxisCheck {
    /// Ignore the alignment axis.
    Off,
    /// Check the alignment axis for every candidate.
    #[default]
    On,
    /// Check the alignment axis only while staying on the initial side axis.
    Alignment,
}

/// What to do when no candidate fits.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum FallbackStrategy {
    /// The candidate with the least total overflow.
    #[default]
    BestFit,
    /// The requested placement.
    InitialPlacement,
}

/// Options for [`flip`].
#[derive(Clone, Debug)]
pub struct FlipOptions<E> {
    /// Check overflow on the placement's side.
    pub main_axis: bool,
    /// Check overflow along the alignment axis.
    pub cross_axis: CrossAxisCheck,
    /// Explicit candidates tried after the initial placement.
    pub fallback_placements: Option<Vec<Placement>>,
    /// Choice when nothing fits.
    pub fallback_strategy: FallbackStrategy,
    /// Also try perpendicular sides, starting from this logical direction.
    pub fallback_axis_side_direction: Option<Alignment>,
    /// Include opposite alignments among the default candidates.
    pub flip_alignment: bool,
    /// Overflow measurement options.
    pub detect_overflow: DetectOverflowOptions<E>,
}

impl<E> Default for FlipOptions<E> {
    fn default() -> Self {
        Self {
            main_axis: true,
            cross_axis: CrossAxisCheck::default(),
            fallback_placements: None,
            fallback_strategy: FallbackStrategy::default(),
            fallback_axis_side_direction: None,
            flip_alignment: true,
            detect_overflow: DetectOverflowOptions::default(),
        }
    }
}

/// Overflow recorded for one tried placement.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementOverflow {
    /// The placement tried.
    pub placement: Placement,
    /// Checked overflows: side first (when checked), then alignment sides.
    pub overflows: Vec<f64>,
}

/// Progress through the candidates, stored under [`NAME`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlipData {
    /// Index of the candidate currently being tried.
    pub index: usize,
    /// Overflow of every candidate tried so far.
    pub overflows: Vec<PlacementOverflow>,
}

/// The flip middleware. See [`flip`].
#[derive(Clone, Debug)]
pub struct Flip<E> {
    options: FlipOptions<E>,
}

/// Flip to a fallback placement when the current one overflows.
pub fn flip<E>(options: FlipOptions<E>) -> Flip<E> {
    Flip { options }
}

impl<E> Flip<E> {
    fn candidates(&self, initial: Placement, rtl: bool) -> Vec<Placement> {
        let options = &self.options;
        let mut fallbacks = match &options.fallback_placements {
            Some(explicit) => explicit.clone(),
            None if initial.is_base() || !options.flip_alignment => vec![initial.opposite()],
            None => expanded_placements(initial).to_vec(),
        };
        if options.fallback_placements.is_none() {
            if let Some(direction) = options.fallback_axis_side_direction {
                fallbacks.extend(opposite_axis_placements(
                    initial,
                    options.flip_alignment,
                    direction,
                    rtl,
                ));
            }
        }
        let mut placements = Vec::with_capacity(fallbacks.len() + 1);
        placements.push(initial);
        placements.extend(fallbacks);
        placements
    }
}

impl<P, E> Middleware<P> for Flip<E>
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
            let options = &self.options;
            let data = state.middleware_data;

            // The arrow asked for an alignment offset; this placement is settled.
            if data
                .arrow()
                .is_some_and(|a| a.alignment_offset.is_some_and(|o| o != 0.0))
            {
                return Ok(MiddlewareReturn::default());
            }

            let placement = state.placement;
            let initial = state.initial_placement;
            let initial_side_axis = initial.side_axis();
            let rtl = state.platform.is_rtl(state.elements.floating).await?;
            let placements = self.candidates(initial, rtl);

            let overflow = detect_overflow(&state, &options.detect_overflow).await?;
            let mut overflows = Vec::with_capacity(3);
            if options.main_axis {
                overflows.push(placement.side.of(overflow));
            }
            if options.cross_axis != CrossAxisCheck::Off {
                let (main, cross) = alignment_sides(placement, &state.rects, rtl);
                overflows.push(main.of(overflow));
                overflows.push(cross.of(overflow));
            }

            let previous = data.flip();
            let mut history: Vec<PlacementOverflow> =
                previous.map(|f| f.overflows.clone()).unwrap_or_default();
            history.push(PlacementOverflow {
                placement,
                overflows: overflows.clone(),
            });

            if overflows.iter().all(|&o| o <= 0.0) {
                return Ok(MiddlewareReturn::default());
            }

            let next_index = previous.map_or(0, |f| f.index) + 1;
            if let Some(&next) = placements.get(next_index) {
                let ignore_cross_axis_overflow = options.cross_axis == CrossAxisCheck::Alignment
                    && initial_side_axis != next.side_axis();
                let side_overflowed_on_initial_axis = history.iter().all(|d| {
                    d.placement.side_axis() != initial_side_axis
                        || d.overflows.first().is_some_and(|&o| o > 0.0)
                });
                if !ignore_cross_axis_overflow || side_overflowed_on_initial_axis {
                    return Ok(MiddlewareReturn::default()
                        .with_data(FlipData {
                            index: next_index,
                            overflows: history,
                        })
                        .with_reset(Reset::placement(next)));
                }
            }

            let mut reset_placement = fitting_side_with_least_cross_overflow(&history);
            if reset_placement.is_none() {
                reset_placement = match options.fallback_strategy {
                    FallbackStrategy::BestFit => best_fit(
                        &history,
                        initial_side_axis,
                        options.fallback_axis_side_direction.is_some(),
                    ),
                    FallbackStrategy::InitialPlacement => Some(initial),
                };
            }

            match reset_placement {
                Some(p) if p != placement => {
                    Ok(MiddlewareReturn::default().with_reset(Reset::placement(p)))
                }
                _ => Ok(MiddlewareReturn::default()),
            }
        })
    }
}

fn fitting_side_with_least_cross_overflow(history: &[PlacementOverflow]) -> Option<Placement> {
    let mut fitting: Vec<&PlacementOverflow> = history
        .iter()
        .filter(|d| d.overflows.first().is_some_and(|&o| o <= 0.0))
        .collect();
    fitting.sort_by(|a, b| {
        let a = a.overflows.get(1).copied().unwrap_or(0.0);
        let b = b.overflows.get(1).copied().unwrap_or(0.0);
        a.total_cmp(&b)
    });
    fitting.first().map(|d| d.placement)
}

fn best_fit(
    history: &[PlacementOverflow],
    initial_side_axis: Axis,
    has_side_direction: bool,
) -> Option<Placement> {
    let mut totals: Vec<(Placement, f64)> = history
        .iter()
        .filter(|d| {
            if has_side_direction {
                let axis = d.placement.side_axis();
                axis == initial_side_axis || axis == Axis::Y
            } else {
                true
            }
        })
        .map(|d| {
            let total: f64 = d.overflows.iter().filter(|&&o| o > 0.0).sum();
            (d.placement, total)
        })
        .collect();
    totals.sort_by(|a, b| a.1.total_cmp(&b.1));
    totals.first().map(|(p, _)| *p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{ComputePositionConfig, compute_position};
    use crate::geometry::rect_from_xywh;
    use crate::middleware::offset::offset;
    use crate::scene::{ElementId, Scene, SceneElement};
    use kurbo::{Point, Rect};
    use pollster::block_on;

    fn scene(viewport: Rect, reference: Rect) -> (Scene, ElementId, ElementId) {
        let mut scene = Scene::new(viewport);
        let r = scene.insert(None, SceneElement::new(reference));
        let f = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(0.0, 0.0, 80.0, 30.0)),
        );
        (scene, r, f)
    }

    #[test]
    fn flips_to_top_when_bottom_overflows() {
        let (scene, r, f) = scene(
            Rect::new(0.0, 0.0, 1000.0, 140.0),
            rect_from_xywh(100.0, 100.0, 50.0, 20.0),
        );
        let config = ComputePositionConfig::new(&scene).with(flip(FlipOptions::default()));
        let out = block_on(compute_position(&r, &f, config)).unwrap();
        assert_eq!(out.placement, Placement::TOP);
        assert_eq!(out.y, 70.0);
        assert_eq!(out.x, 85.0);
        assert_eq!(out.middleware_data.flip().unwrap().index, 1);
    }

    #[test]
    fn stays_when_it_fits() {
        let (scene, r, f) = scene(
            Rect::new(0.0, 0.0, 1000.0, 1000.0),
            rect_from_xywh(100.0, 100.0, 50.0, 20.0),
        );
        let config = ComputePositionConfig::new(&scene).with(flip(FlipOptions::default()));
        let out = block_on(compute_position(&r, &f, config)).unwrap();
        assert_eq!(out.placement, Placement::BOTTOM);
        assert!(out.middleware_data.flip().is_none());
    }

    #[test]
    fn offset_is_recomputed_after_flip() {
        let (scene, r, f) = scene(
            Rect::new(0.0, 0.0, 1000.0, 140.0),
            rect_from_xywh(100.0, 100.0, 50.0, 20.0),
        );
        let config = ComputePositionConfig::new(&scene)
            .with(offset(5.0))
            .with(flip(FlipOptions::default()));
        let out = block_on(compute_position(&r, &f, config)).unwrap();
        assert_eq!(out.placement, Placement::TOP);
        assert_eq!(out.y, 65.0, "offset applies upwards after flipping");
    }

    #[test]
    fn nothing_fits_picks_best_fit() {
        // Neither above nor below has 30px; above has 20, below has 10.
        let (scene, r, f) = scene(
            Rect::new(0.0, 0.0, 1000.0, 50.0),
            rect_from_xywh(100.0, 20.0, 50.0, 20.0),
        );
        let config = ComputePositionConfig::new(&scene).with(flip(FlipOptions::default()));
        let out = block_on(compute_position(&r, &f, config)).unwrap();
        assert_eq!(out.placement, Placement::TOP);

        let options = FlipOptions {
            fallback_strategy: FallbackStrategy::InitialPlacement,
            ..FlipOptions::default()
        };
        let config = ComputePositionConfig::new(&scene).with(flip(options));
        let out = block_on(compute_position(&r, &f, config)).unwrap();
        assert_eq!(out.placement, Placement::BOTTOM);
    }

    #[test]
    fn explicit_fallbacks_are_tried_in_order() {
        let (scene, r, f) = scene(
            Rect::new(0.0, 0.0, 1000.0, 140.0),
            rect_from_xywh(100.0, 100.0, 50.0, 20.0),
        );
        let options = FlipOptions {
            fallback_placements: Some(vec![Placement::RIGHT, Placement::TOP]),
            ..FlipOptions::default()
        };
        let config = ComputePositionConfig::new(&scene).with(flip(options));
        let out = block_on(compute_position(&r, &f, config)).unwrap();
        assert_eq!(out.placement, Placement::RIGHT);
    }

    #[test]
    fn default_candidates_are_mirror_first() {
        let f: Flip<()> = flip(FlipOptions::default());
        assert_eq!(
            f.candidates(Placement::BOTTOM, false),
            vec![Placement::BOTTOM, Placement::TOP]
        );
        assert_eq!(
            f.candidates(Placement::BOTTOM_START, false),
            vec![
                Placement::BOTTOM_START,
                Placement::BOTTOM_END,
                Placement::TOP_START,
                Placement::TOP_END,
            ]
        );
        let f: Flip<()> = flip(FlipOptions {
            fallback_axis_side_direction: Some(Alignment::End),
            ..FlipOptions::default()
        });
        assert_eq!(
            f.candidates(Placement::TOP, false),
            vec![
                Placement::TOP,
                Placement::BOTTOM,
                Placement::RIGHT,
                Placement::LEFT,
            ]
        );
    }

    #[test]
    fn flip_is_idempotent() {
        let (scene, r, f) = scene(
            Rect::new(0.0, 0.0, 1000.0, 140.0),
            rect_from_xywh(100.0, 100.0, 50.0, 20.0),
        );
        let run = || {
            let config = ComputePositionConfig::new(&scene).with(flip(FlipOptions::default()));
            block_on(compute_position(&r, &f, config)).unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.placement, b.placement);
        assert_eq!(a.coords(), b.coords());
    }

    #[test]
    fn perpendicular_side_when_both_mirrors_overflow() {
        let (scene, r, f) = scene(
            Rect::new(0.0, 0.0, 1000.0, 50.0),
            rect_from_xywh(100.0, 20.0, 50.0, 20.0),
        );
        let options = FlipOptions {
            fallback_axis_side_direction: Some(Alignment::End),
            ..FlipOptions::default()
        };
        let config = ComputePositionConfig::new(&scene).with(flip(options));
        let out = block_on(compute_position(&r, &f, config)).unwrap();
        assert_eq!(out.placement, Placement::RIGHT);
        assert_eq!(out.coords(), Point::new(150.0, 15.0));
        let data = out.middleware_data.flip().unwrap();
        assert_eq!(data.index, 2);
        let tried: Vec<Placement> = data.overflows.iter().map(|d| d.placement).collect();
        assert_eq!(tried, [Placement::BOTTOM, Placement::TOP]);
    }

    #[test]
    fn alignment_check_keeps_the_initial_axis() {
        // Below fits on its side but spills 30px past the left edge.
        let (scene, r, f) = scene(
            Rect::new(0.0, 0.0, 400.0, 300.0),
            rect_from_xywh(0.0, 100.0, 20.0, 20.0),
        );
        let run = |cross_axis| {
            let options = FlipOptions {
                cross_axis,
                fallback_axis_side_direction: Some(Alignment::End),
                ..FlipOptions::default()
            };
            let config = ComputePositionConfig::new(&scene).with(flip(options));
            block_on(compute_position(&r, &f, config)).unwrap()
        };

        let aligned = run(CrossAxisCheck::Alignment);
        assert_eq!(aligned.placement, Placement::BOTTOM);
        assert_eq!(aligned.coords(), Point::new(-30.0, 120.0));

        let everywhere = run(CrossAxisCheck::On);
        assert_eq!(everywhere.placement, Placement::RIGHT);
        assert_eq!(everywhere.coords(), Point::new(20.0, 95.0));
    }
}
