// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overflow detection against clipping rects.

use kurbo::{Insets, Rect};

use crate::error::Error;
use crate::geometry::{overflow_insets, rect_from_xywh};
use crate::middleware::MiddlewareState;
use crate::platform::{Boundary, Platform, RootBoundary};

/// Which element's rect is tested for overflow.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ElementContext {
    /// The floating element at the current coordinates.
    #[default]
    Floating,
    /// The reference element.
    Reference,
}

impl ElementContext {
    /// The other element.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Floating => Self::Reference,
            Self::Reference => Self::Floating,
        }
    }
}

/// Options for [`detect_overflow`], shared by the standard middleware.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectOverflowOptions<E> {
    /// Clipping area.
    pub boundary: Boundary<E>,
    /// Outermost clipping area.
    pub root_boundary: RootBoundary,
    /// Element whose rect is tested.
    pub element_context: ElementContext,
    /// Use the clipping ancestors of the other element instead.
    pub alt_boundary: bool,
    /// Virtual padding inside the clipping rect.
    pub padding: Insets,
}

impl<E> Default for DetectOverflowOptions<E> {
    fn default() -> Self {
        Self {
            boundary: Boundary::default(),
            root_boundary: RootBoundary::default(),
            element_context: ElementContext::default(),
            alt_boundary: false,
            padding: Insets::ZERO,
        }
    }
}

/// Per-side overflow of an element against its clipping rect.
///
/// Positive values overflow by that amount; zero is flush; negative values
/// leave that much room. Values are divided by the offset parent's scale so
/// they are in the same units as the coordinates being adjusted.
pub async fn detect_overflow<P: Platform>(
    state: &MiddlewareState<'_, P>,
    options: &DetectOverflowOptions<P::Element>,
) -> Result<Insets, Error> {
    let platform = state.platform;
    let context = if options.alt_boundary {
        options.element_context.opposite()
    } else {
        options.element_context
    };
    let clipped = match context {
        ElementContext::Floating => state.elements.floating,
        ElementContext::Reference => state.elements.reference,
    };
    let clipping_rect = platform
        .get_clipping_rect(
            clipped,
            &options.boundary,
            &options.root_boundary,
            state.strategy,
        )
        .await?;

    let rect: Rect = match options.element_context {
        ElementContext::Floating => rect_from_xywh(
            state.x,
            state.y,
            state.rects.floating.width(),
            state.rects.floating.height(),
        ),
        ElementContext::Reference => state.rects.reference,
    };

    let offset_parent = platform.get_offset_parent(state.elements.floating).await?;
    let scale = match &offset_parent {
        Some(parent) => platform.get_scale(parent).await?,
        None => kurbo::Vec2::new(1.0, 1.0),
    };
    let element_rect = platform
        .convert_offset_parent_relative_rect_to_viewport_relative_rect(
            rect,
            offset_parent.as_ref(),
            state.strategy,
        )
        .await?;

    let raw = overflow_insets(clipping_rect, element_rect, options.padding);
    Ok(Insets::new(
        raw.x0 / scale.x,
        raw.y0 / scale.y,
        raw.x1 / scale.x,
        raw.y1 / scale.y,
    ))
}
