// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform adapter: the measurement surface the engine positions against.
//!
//! ## Overview
//!
//! The engine never reads geometry itself. A [`Platform`] answers rect, size,
//! direction, and clipping queries for its own element handle type. Every query
//! returns a future so hosts that need a layout pass before they can answer can
//! suspend; hosts with geometry at hand return ready futures.
//!
//! Failing to measure (for example a detached element) is reported as
//! [`Error::ElementUnavailable`] and propagates out of
//! [`compute_position`](crate::compute::compute_position) unchanged.

use alloc::vec::Vec;
use core::future::{Future, ready};

use kurbo::{Rect, Size, Vec2};

use crate::error::Error;
use crate::types::{ElementRects, Strategy};

/// Area an element is clipped to, before the [`RootBoundary`] is applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Boundary<E> {
    /// Every clipping ancestor of the element.
    ClippingAncestors,
    /// Only the listed elements.
    Elements(Vec<E>),
    /// An explicit rect in viewport space.
    Rect(Rect),
}

impl<E> Default for Boundary<E> {
    fn default() -> Self {
        Self::ClippingAncestors
    }
}

/// Outermost clipping area, intersected with the [`Boundary`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum RootBoundary {
    /// The visible viewport.
    #[default]
    Viewport,
    /// The whole scrollable document.
    Document,
    /// An explicit rect in viewport space.
    Rect(Rect),
}

/// Measurement primitives supplied by the host.
pub trait Platform {
    /// Element handle understood by this platform.
    type Element;

    /// Measure the reference and floating elements for `strategy`.
    ///
    /// The reference rect is expressed relative to the floating element's offset
    /// parent (or the viewport for [`Strategy::Fixed`]). The floating rect
    /// carries the floating element's size; its origin is not consulted.
    fn get_element_rects(
        &self,
        reference: &Self::Element,
        floating: &Self::Element,
        strategy: Strategy,
    ) -> impl Future<Output = Result<ElementRects, Error>>;

    /// Rect `element` must stay inside: the intersection of `boundary` and
    /// `root_boundary`, in viewport space.
    fn get_clipping_rect(
        &self,
        element: &Self::Element,
        boundary: &Boundary<Self::Element>,
        root_boundary: &RootBoundary,
        strategy: Strategy,
    ) -> impl Future<Output = Result<Rect, Error>>;

    /// Size of `element`.
    fn get_dimensions(&self, element: &Self::Element) -> impl Future<Output = Result<Size, Error>>;

    /// Whether `element` lays out right to left.
    fn is_rtl(&self, element: &Self::Element) -> impl Future<Output = Result<bool, Error>> {
        let _ = element;
        ready(Ok(false))
    }

    /// Offset parent of `element`, if the platform has that notion.
    fn get_offset_parent(
        &self,
        element: &Self::Element,
    ) -> impl Future<Output = Result<Option<Self::Element>, Error>> {
        let _ = element;
        ready(Ok(None))
    }

    /// Scale applied to `element`'s content.
    fn get_scale(&self, element: &Self::Element) -> impl Future<Output = Result<Vec2, Error>> {
        let _ = element;
        ready(Ok(Vec2::new(1.0, 1.0)))
    }

    /// Convert a rect relative to `offset_parent` into viewport space.
    ///
    /// The default is the identity, which is right when both spaces coincide.
    fn convert_offset_parent_relative_rect_to_viewport_relative_rect(
        &self,
        rect: Rect,
        offset_parent: Option<&Self::Element>,
        strategy: Strategy,
    ) -> impl Future<Output = Result<Rect, Error>> {
        let _ = (offset_parent, strategy);
        ready(Ok(rect))
    }
}
