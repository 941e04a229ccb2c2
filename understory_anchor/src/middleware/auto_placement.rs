// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Auto placement: measure every allowed placement and keep the roomiest.
//!
//! Unlike [`flip`](super::flip::flip), the requested placement is only a
//! starting point. The first pass resets to the first candidate; each later
//! pass records that candidate's overflow and resets to the next one. Once all
//! candidates are measured the placement that fits on every checked side with
//! the most main-side room wins, falling back to the least main-side overflow.

use alloc::boxed::Box;
use alloc::vec::Vec;

use super::flip::PlacementOverflow;
use super::{BoxFuture, Middleware, MiddlewareReturn, MiddlewareState, Reset};
use crate::error::Error;
use crate::geometry::alignment_sides;
use crate::overflow::{DetectOverflowOptions, detect_overflow};
use crate::platform::Platform;
use crate::types::{Alignment, Placement};

/// Slot name of [`AutoPlacementData`].
pub const NAME: &str = "auto_placement";

/// Options for [`auto_placement`].
#[derive(Clone, Debug)]
pub struct AutoPlacementOptions<E> {
    /// Add the main alignment side's overflow to the score of aligned placements.
    pub cross_axis: bool,
    /// Prefer placements with this alignment; `None` considers base placements.
    pub alignment: Option<Alignment>,
    /// Candidates; `None` means every placement.
    pub allowed_placements: Option<Vec<Placement>>,
    /// With an alignment, also consider the opposite alignment.
    pub auto_alignment: bool,
    /// Overflow measurement options.
    pub detect_overflow: DetectOverflowOptions<E>,
}

impl<E> Default for AutoPlacementOptions<E> {
    fn default() -> Self {
        Self {
            cross_axis: false,
            alignment: None,
            allowed_placements: None,
            auto_alignment: true,
            detect_overflow: DetectOverflowOptions::default(),
        }
    }
}

/// Progress through the candidates, stored under [`NAME`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AutoPlacementData {
    /// Index of the candidate being measured.
    pub index: usize,
    /// Overflow of every candidate measured so far.
    pub overflows: Vec<PlacementOverflow>,
}

/// The auto placement middleware. See [`auto_placement`].
#[derive(Clone, Debug)]
pub struct AutoPlacement<E> {
    options: AutoPlacementOptions<E>,
}

/// Choose the placement with the most space.
pub fn auto_placement<E>(options: AutoPlacementOptions<E>) -> AutoPlacement<E> {
    AutoPlacement { options }
}

/// Candidate list for an alignment preference.
///
/// With an alignment, placements carrying it come first, followed (when
/// `auto_alignment` is set) by the other aligned placements. Without one,
/// only base placements are kept.
pub fn placement_list(
    alignment: Option<Alignment>,
    auto_alignment: bool,
    allowed: &[Placement],
) -> Vec<Placement> {
    match alignment {
        Some(alignment) => {
            let preferred = allowed.iter().filter(|p| p.alignment == Some(alignment));
            let others = allowed.iter().filter(|p| p.alignment != Some(alignment));
            preferred
                .chain(others)
                .copied()
                .filter(|p| {
                    p.alignment == Some(alignment)
                        || (auto_alignment && p.opposite_alignment() != *p)
                })
                .collect()
        }
        None => allowed.iter().copied().filter(|p| p.is_base()).collect(),
    }
}

impl<E> AutoPlacement<E> {
    fn candidates(&self) -> Vec<Placement> {
        let options = &self.options;
        match &options.allowed_placements {
            Some(allowed) if options.alignment.is_none() => allowed.clone(),
            Some(allowed) => placement_list(options.alignment, options.auto_alignment, allowed),
            None => placement_list(options.alignment, options.auto_alignment, &Placement::ALL),
        }
    }
}

impl<P, E> Middleware<P> for AutoPlacement<E>
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
            let placements = self.candidates();
            let overflow = detect_overflow(&state, &options.detect_overflow).await?;
            let previous = state.middleware_data.auto_placement();
            let current_index = previous.map_or(0, |d| d.index);
            let Some(&current) = placements.get(current_index) else {
                return Ok(MiddlewareReturn::default());
            };
            let rtl = state.platform.is_rtl(state.elements.floating).await?;
            let (main, cross) = alignment_sides(current, &state.rects, rtl);

            if state.placement != current {
                let reset = Reset::placement(placements[0]);
                return Ok(MiddlewareReturn::default().with_reset(reset));
            }

            let mut history: Vec<PlacementOverflow> =
                previous.map(|d| d.overflows.clone()).unwrap_or_default();
            history.push(PlacementOverflow {
                placement: current,
                overflows: Vec::from([
                    current.side.of(overflow),
                    main.of(overflow),
                    cross.of(overflow),
                ]),
            });

            if let Some(&next) = placements.get(current_index + 1) {
                return Ok(MiddlewareReturn::default()
                    .with_data(AutoPlacementData {
                        index: current_index + 1,
                        overflows: history,
                    })
                    .with_reset(Reset::placement(next)));
            }

            let mut scored: Vec<(Placement, f64, &[f64])> = history
                .iter()
                .map(|d| {
                    let score = if d.placement.alignment.is_some() && options.cross_axis {
                        d.overflows.iter().take(2).sum()
                    } else {
                        d.overflows.first().copied().unwrap_or(0.0)
                    };
                    (d.placement, score, d.overflows.as_slice())
                })
                .collect();
            scored.sort_by(|a, b| a.1.total_cmp(&b.1));

            let fits_everywhere = scored.iter().find(|(p, _, overflows)| {
                let checked = if p.alignment.is_some() { 2 } else { 3 };
                overflows.iter().take(checked).all(|&o| o <= 0.0)
            });
            let reset_placement = fits_everywhere.or(scored.first()).map(|(p, _, _)| *p);

            match reset_placement {
                Some(p) if p != state.placement => Ok(MiddlewareReturn::default()
                    .with_data(AutoPlacementData {
                        index: current_index + 1,
                        overflows: history,
                    })
                    .with_reset(Reset::placement(p))),
                _ => Ok(MiddlewareReturn::default()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{ComputePositionConfig, compute_position};
    use crate::geometry::rect_from_xywh;
    use crate::scene::{Scene, SceneElement};
    use alloc::vec;
    use kurbo::{Point, Rect};
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
    fn picks_the_side_with_most_room() {
        let (scene, r, f) = scene();
        let options = AutoPlacementOptions::default();
        let config = ComputePositionConfig::new(&scene).with(auto_placement(options));
        let out = block_on(compute_position(&r, &f, config)).unwrap();
        assert_eq!(out.placement, Placement::RIGHT);
        assert_eq!(out.coords(), Point::new(150.0, 95.0));
        let data = out.middleware_data.auto_placement().unwrap();
        assert_eq!(data.overflows.len(), 4, "every base placement was measured");
    }

    #[test]
    fn allowed_placements_restrict_candidates() {
        let (scene, r, f) = scene();
        let options = AutoPlacementOptions {
            allowed_placements: Some(vec![Placement::TOP, Placement::BOTTOM]),
            ..AutoPlacementOptions::default()
        };
        let config = ComputePositionConfig::new(&scene).with(auto_placement(options));
        let out = block_on(compute_position(&r, &f, config)).unwrap();
        assert_eq!(out.placement, Placement::TOP);
        assert_eq!(out.y, 70.0);
    }

    #[test]
    fn alignment_preference_orders_candidates() {
        let list = placement_list(Some(Alignment::Start), true, &Placement::ALL);
        assert_eq!(
            list,
            vec![
                Placement::TOP_START,
                Placement::RIGHT_START,
                Placement::BOTTOM_START,
                Placement::LEFT_START,
                Placement::TOP_END,
                Placement::RIGHT_END,
                Placement::BOTTOM_END,
                Placement::LEFT_END,
            ]
        );
        let strict = placement_list(Some(Alignment::End), false, &Placement::ALL);
        assert!(strict.iter().all(|p| p.alignment == Some(Alignment::End)));
        let base = placement_list(None, true, &Placement::ALL);
        assert_eq!(
            base,
            vec![
                Placement::TOP,
                Placement::RIGHT,
                Placement::BOTTOM,
                Placement::LEFT,
            ]
        );
    }

    #[test]
    fn cross_axis_counts_alignment_overflow() {
        // Bottom-right corner: bottom-start spills 5px past the bottom edge and
        // sits flush right; right-start spills 10px right but has 25px spare below.
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 400.0, 300.0));
        let r = scene.insert(
            None,
            SceneElement::new(Rect::new(320.0, 245.0, 330.0, 275.0)),
        );
        let f = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(0.0, 0.0, 80.0, 30.0)),
        );
        let run = |cross_axis| {
            let options = AutoPlacementOptions {
                cross_axis,
                alignment: Some(Alignment::Start),
                auto_alignment: false,
                allowed_placements: Some(vec![Placement::BOTTOM_START, Placement::RIGHT_START]),
                ..AutoPlacementOptions::default()
            };
            let config = ComputePositionConfig::new(&scene).with(auto_placement(options));
            block_on(compute_position(&r, &f, config)).unwrap()
        };

        let side_only = run(false);
        assert_eq!(side_only.placement, Placement::BOTTOM_START);
        assert_eq!(side_only.coords(), Point::new(320.0, 275.0));
        let data = side_only.middleware_data.auto_placement().unwrap();
        assert_eq!(data.overflows[0].overflows, [5.0, 0.0, -320.0]);
        assert_eq!(data.overflows[1].overflows, [10.0, -25.0, -245.0]);

        let with_cross = run(true);
        assert_eq!(with_cross.placement, Placement::RIGHT_START);
        assert_eq!(with_cross.coords(), Point::new(330.0, 245.0));
    }
}
