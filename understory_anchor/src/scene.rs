// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene: an in-memory element tree that implements [`Platform`] and
//! [`ObserverHost`].
//!
//! ## Overview
//!
//! A [`Scene`] holds rectangles in viewport space, arranged in a parent/child
//! tree. It is what headless hosts, tests, and demos position against. Each
//! element carries [`ElementFlags`]:
//!
//! - [`CLIPS`](ElementFlags::CLIPS): the element clips and scrolls its
//!   descendants (an overflow ancestor).
//! - [`POSITIONED`](ElementFlags::POSITIONED): the element is an offset parent;
//!   absolute coordinates of descendants are relative to its content origin.
//! - [`RTL`](ElementFlags::RTL): the element and its descendants lay out right
//!   to left.
//!
//! Bounds are absolute: moving a parent with [`Scene::set_bounds`] does not move
//! its children. [`Scene::scroll_by`] translates all descendants of a scroll
//! container (or of the viewport) and records the container's scroll offset.
//!
//! ## Notifications
//!
//! Mutations notify the listeners registered through
//! [`ObserverHost::observe`]:
//!
//! | Mutation | Target | Triggers |
//! | --- | --- | --- |
//! | [`set_bounds`](Scene::set_bounds) | element | `LAYOUT_SHIFT`, plus both resize triggers |
//! | [`scroll_by`](Scene::scroll_by) | container | `ANCESTOR_SCROLL` |
//! | [`set_viewport`](Scene::set_viewport) | viewport | `ANCESTOR_RESIZE` |
//! | [`remove`](Scene::remove) | removed elements | `LAYOUT_SHIFT`, `ELEMENT_RESIZE` |
//!
//! A size change through `set_bounds` also fires `ELEMENT_RESIZE` and
//! `ANCESTOR_RESIZE`. Descendants moved by `scroll_by` get `LAYOUT_SHIFT`.
//!
//! Listeners live as long as their [`SceneSubscription`]; dead ones are pruned
//! on the next notification or registration.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::future::{Future, ready};

use kurbo::{Point, Rect, Size, Vec2};
use tracing::trace;

use crate::auto_update::{Notifier, ObserveTarget, ObserverHost, Triggers};
use crate::error::Error;
use crate::platform::{Boundary, Platform, RootBoundary};
use crate::types::{ElementRects, Strategy};

/// Identifier for an element in a [`Scene`].
///
/// A slot index plus a generation counter. Removing an element frees its slot;
/// reusing the slot bumps the generation, so stale ids never alias a new element.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32, u32);

impl ElementId {
    const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Layout roles of a scene element.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u8 {
        /// Clips and scrolls its descendants.
        const CLIPS      = 0b0000_0001;
        /// Offset parent for absolutely positioned descendants.
        const POSITIONED = 0b0000_0010;
        /// Right-to-left layout, inherited by descendants.
        const RTL        = 0b0000_0100;
    }
}

/// Geometry and roles of one element.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneElement {
    /// Border box in viewport space.
    pub bounds: Rect,
    /// Layout roles.
    pub flags: ElementFlags,
    /// Scale applied to descendants' coordinates when this is an offset parent.
    pub scale: Vec2,
}

impl SceneElement {
    /// A plain element occupying `bounds`.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            flags: ElementFlags::empty(),
            scale: Vec2::new(1.0, 1.0),
        }
    }

    /// Mark as clipping and scrolling its descendants.
    pub fn clips(mut self) -> Self {
        self.flags |= ElementFlags::CLIPS;
        self
    }

    /// Mark as an offset parent.
    pub fn positioned(mut self) -> Self {
        self.flags |= ElementFlags::POSITIONED;
        self
    }

    /// Mark as right to left.
    pub fn rtl(mut self) -> Self {
        self.flags |= ElementFlags::RTL;
        self
    }

    /// Set the scale of descendant coordinates.
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    element: SceneElement,
    scroll: Vec2,
}

#[derive(Debug)]
struct Listener {
    target: Option<ElementId>,
    triggers: Triggers,
    notifier: Notifier,
}

/// Registration returned by [`Scene`]'s [`ObserverHost::observe`].
///
/// Dropping it removes the listener.
#[derive(Debug)]
pub struct SceneSubscription {
    _listener: Rc<Listener>,
}

/// In-memory element tree. See the [module docs](self).
pub struct Scene {
    slots: Vec<Option<Slot>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    viewport: Rect,
    listeners: RefCell<Vec<Weak<Listener>>>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alive = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("Scene")
            .field("viewport", &self.viewport)
            .field("elements_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Empty scene with the given visible viewport.
    pub fn new(viewport: Rect) -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            viewport,
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Visible viewport.
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Union of the viewport and every element's bounds.
    pub fn document(&self) -> Rect {
        self.slots
            .iter()
            .flatten()
            .fold(self.viewport, |acc, s| acc.union(s.element.bounds))
    }

    /// Insert `element` as a child of `parent` (or as a root if `None`).
    ///
    /// A stale `parent` inserts a root.
    pub fn insert(&mut self, parent: Option<ElementId>, element: SceneElement) -> ElementId {
        let parent = parent.filter(|p| self.is_alive(*p));
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices."
            )]
            (idx as u32, generation)
        } else {
            self.slots.push(None);
            self.generations.push(1);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices."
            )]
            ((self.slots.len() - 1) as u32, 1)
        };
        let id = ElementId::new(idx, generation);
        self.slots[id.idx()] = Some(Slot {
            generation,
            parent,
            children: Vec::new(),
            element,
            scroll: Vec2::ZERO,
        });
        if let Some(p) = parent.and_then(|p| self.slot_mut(p)) {
            p.children.push(id);
        }
        id
    }

    /// Remove an element and its subtree.
    pub fn remove(&mut self, id: ElementId) {
        let Some(parent) = self.slot(id).map(|s| s.parent) else {
            return;
        };
        if let Some(parent) = parent.and_then(|p| self.slot_mut(p)) {
            parent.children.retain(|c| *c != id);
        }
        let mut removed = Vec::new();
        self.collect_subtree(id, &mut removed);
        for gone in &removed {
            self.slots[gone.idx()] = None;
            self.free_list.push(gone.idx());
        }
        let triggers = Triggers::LAYOUT_SHIFT | Triggers::ELEMENT_RESIZE;
        for gone in removed {
            self.notify(Some(gone), triggers);
        }
    }

    /// Whether `id` refers to a live element.
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.slot(id).is_some()
    }

    /// The element behind `id`, if alive.
    pub fn element(&self, id: ElementId) -> Option<&SceneElement> {
        self.slot(id).map(|s| &s.element)
    }

    /// Parent of `id`, if any.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.slot(id)?.parent
    }

    /// Scroll offset of a container.
    pub fn scroll_offset(&self, id: ElementId) -> Option<Vec2> {
        self.slot(id).map(|s| s.scroll)
    }

    /// Move or resize an element. Its children stay where they are.
    pub fn set_bounds(&mut self, id: ElementId, bounds: Rect) {
        let Some(slot) = self.slot_mut(id) else {
            return;
        };
        let old = core::mem::replace(&mut slot.element.bounds, bounds);
        if old == bounds {
            return;
        }
        let mut fired = Triggers::LAYOUT_SHIFT;
        if old.size() != bounds.size() {
            fired |= Triggers::ELEMENT_RESIZE | Triggers::ANCESTOR_RESIZE;
        }
        self.notify(Some(id), fired);
    }

    /// Replace an element's flags.
    pub fn set_flags(&mut self, id: ElementId, flags: ElementFlags) {
        if let Some(slot) = self.slot_mut(id) {
            slot.element.flags = flags;
        }
    }

    /// Scroll a container (or the viewport when `None`) by `delta`.
    ///
    /// Content moves opposite to `delta`.
    pub fn scroll_by(&mut self, container: Option<ElementId>, delta: Vec2) {
        let mut moved = Vec::new();
        match container {
            Some(c) => {
                let Some(slot) = self.slot_mut(c) else {
                    return;
                };
                slot.scroll += delta;
                let children = slot.children.clone();
                for child in children {
                    self.collect_subtree(child, &mut moved);
                }
            }
            None => {
                let is_root = |id: &ElementId| self.parent(*id).is_none();
                let roots: Vec<ElementId> = self.ids().filter(is_root).collect();
                for root in roots {
                    self.collect_subtree(root, &mut moved);
                }
            }
        }
        for id in &moved {
            if let Some(slot) = self.slot_mut(*id) {
                slot.element.bounds = slot.element.bounds - delta;
            }
        }
        self.notify(container, Triggers::ANCESTOR_SCROLL);
        for id in moved {
            self.notify(Some(id), Triggers::LAYOUT_SHIFT);
        }
    }

    /// Resize or move the viewport.
    pub fn set_viewport(&mut self, viewport: Rect) {
        if self.viewport == viewport {
            return;
        }
        self.viewport = viewport;
        self.notify(None, Triggers::ANCESTOR_RESIZE);
    }

    /// Number of listeners whose subscription is still alive.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }

    /// Live element ids in slot order.
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices."
            )]
            s.as_ref().map(|s| ElementId::new(i as u32, s.generation))
        })
    }

    fn slot(&self, id: ElementId) -> Option<&Slot> {
        self.slots
            .get(id.idx())?
            .as_ref()
            .filter(|s| s.generation == id.1)
    }

    fn slot_mut(&mut self, id: ElementId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.idx())?
            .as_mut()
            .filter(|s| s.generation == id.1)
    }

    fn collect_subtree(&self, id: ElementId, out: &mut Vec<ElementId>) {
        let Some(slot) = self.slot(id) else {
            return;
        };
        out.push(id);
        for child in &slot.children {
            self.collect_subtree(*child, out);
        }
    }

    fn ancestors(&self, id: ElementId) -> impl Iterator<Item = (ElementId, &Slot)> + '_ {
        let mut next = self.parent(id);
        core::iter::from_fn(move || {
            let id = next?;
            let slot = self.slot(id)?;
            next = slot.parent;
            Some((id, slot))
        })
    }

    fn bounds(&self, id: ElementId) -> Result<Rect, Error> {
        self.slot(id)
            .map(|s| s.element.bounds)
            .ok_or(Error::ElementUnavailable)
    }

    fn offset_parent(&self, id: ElementId) -> Option<ElementId> {
        self.ancestors(id)
            .find(|(_, s)| s.element.flags.contains(ElementFlags::POSITIONED))
            .map(|(id, _)| id)
    }

    /// Content origin and scale of an offset parent.
    fn parent_space(&self, parent: ElementId) -> Result<(Point, Vec2), Error> {
        let slot = self.slot(parent).ok_or(Error::ElementUnavailable)?;
        let origin = slot.element.bounds.origin() - slot.scroll;
        Ok((origin, slot.element.scale))
    }

    fn clipping_rect(
        &self,
        element: ElementId,
        boundary: &Boundary<ElementId>,
        root_boundary: &RootBoundary,
    ) -> Result<Rect, Error> {
        if !self.is_alive(element) {
            return Err(Error::ElementUnavailable);
        }
        let root = match root_boundary {
            RootBoundary::Viewport => self.viewport,
            RootBoundary::Document => self.document(),
            RootBoundary::Rect(r) => *r,
        };
        let mut rect = root;
        match boundary {
            Boundary::ClippingAncestors => {
                for (_, slot) in self.ancestors(element) {
                    if slot.element.flags.contains(ElementFlags::CLIPS) {
                        rect = rect.intersect(slot.element.bounds);
                    }
                }
            }
            Boundary::Elements(list) => {
                for id in list {
                    rect = rect.intersect(self.bounds(*id)?);
                }
            }
            Boundary::Rect(r) => rect = rect.intersect(*r),
        }
        Ok(rect)
    }

    fn notify(&self, target: Option<ElementId>, fired: Triggers) {
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|weak| {
            let Some(listener) = weak.upgrade() else {
                return false;
            };
            let hit = listener.triggers & fired;
            if listener.target == target && !hit.is_empty() {
                listener.notifier.notify(hit);
            }
            true
        });
        trace!(?target, triggers = fired.bits(), "scene notify");
    }
}

fn to_parent_space(rect: Rect, origin: Point, scale: Vec2) -> Rect {
    Rect::new(
        (rect.x0 - origin.x) / scale.x,
        (rect.y0 - origin.y) / scale.y,
        (rect.x1 - origin.x) / scale.x,
        (rect.y1 - origin.y) / scale.y,
    )
}

fn from_parent_space(rect: Rect, origin: Point, scale: Vec2) -> Rect {
    Rect::new(
        rect.x0 * scale.x + origin.x,
        rect.y0 * scale.y + origin.y,
        rect.x1 * scale.x + origin.x,
        rect.y1 * scale.y + origin.y,
    )
}

impl Scene {
    fn element_rects(
        &self,
        reference: ElementId,
        floating: ElementId,
        strategy: Strategy,
    ) -> Result<ElementRects, Error> {
        let reference_bounds = self.bounds(reference)?;
        let floating_size = self.bounds(floating)?.size();
        let reference = match (strategy, self.offset_parent(floating)) {
            (Strategy::Absolute, Some(parent)) => {
                let (origin, scale) = self.parent_space(parent)?;
                to_parent_space(reference_bounds, origin, scale)
            }
            _ => reference_bounds,
        };
        Ok(ElementRects {
            reference,
            floating: Rect::from_origin_size(Point::ZERO, floating_size),
        })
    }

    fn direction_is_rtl(&self, id: ElementId) -> Result<bool, Error> {
        let slot = self.slot(id).ok_or(Error::ElementUnavailable)?;
        Ok(slot.element.flags.contains(ElementFlags::RTL)
            || self
                .ancestors(id)
                .any(|(_, s)| s.element.flags.contains(ElementFlags::RTL)))
    }
}

impl Platform for Scene {
    type Element = ElementId;

    fn get_element_rects(
        &self,
        reference: &ElementId,
        floating: &ElementId,
        strategy: Strategy,
    ) -> impl Future<Output = Result<ElementRects, Error>> {
        ready(self.element_rects(*reference, *floating, strategy))
    }

    fn get_clipping_rect(
        &self,
        element: &ElementId,
        boundary: &Boundary<ElementId>,
        root_boundary: &RootBoundary,
        _strategy: Strategy,
    ) -> impl Future<Output = Result<Rect, Error>> {
        ready(self.clipping_rect(*element, boundary, root_boundary))
    }

    fn get_dimensions(&self, element: &ElementId) -> impl Future<Output = Result<Size, Error>> {
        ready(self.bounds(*element).map(|b| b.size()))
    }

    fn is_rtl(&self, element: &ElementId) -> impl Future<Output = Result<bool, Error>> {
        ready(self.direction_is_rtl(*element))
    }

    fn get_offset_parent(
        &self,
        element: &ElementId,
    ) -> impl Future<Output = Result<Option<ElementId>, Error>> {
        let parent = if self.is_alive(*element) {
            Ok(self.offset_parent(*element))
        } else {
            Err(Error::ElementUnavailable)
        };
        ready(parent)
    }

    fn get_scale(&self, element: &ElementId) -> impl Future<Output = Result<Vec2, Error>> {
        ready(
            self.slot(*element)
                .map(|s| s.element.scale)
                .ok_or(Error::ElementUnavailable),
        )
    }

    fn convert_offset_parent_relative_rect_to_viewport_relative_rect(
        &self,
        rect: Rect,
        offset_parent: Option<&ElementId>,
        strategy: Strategy,
    ) -> impl Future<Output = Result<Rect, Error>> {
        let converted = match (strategy, offset_parent) {
            (Strategy::Absolute, Some(parent)) => self
                .parent_space(*parent)
                .map(|(origin, scale)| from_parent_space(rect, origin, scale)),
            _ => Ok(rect),
        };
        ready(converted)
    }
}

impl ObserverHost for Scene {
    type Element = ElementId;
    type Subscription = SceneSubscription;

    fn overflow_ancestors(&self, element: &ElementId) -> Vec<ElementId> {
        self.ancestors(*element)
            .filter(|(_, s)| s.element.flags.contains(ElementFlags::CLIPS))
            .map(|(id, _)| id)
            .collect()
    }

    fn observe(
        &self,
        target: ObserveTarget<'_, ElementId>,
        triggers: Triggers,
        notifier: Notifier,
    ) -> Result<SceneSubscription, Error> {
        let target = match target {
            ObserveTarget::Viewport => None,
            ObserveTarget::Element(id) if self.is_alive(*id) => Some(*id),
            ObserveTarget::Element(_) => return Err(Error::ElementUnavailable),
        };
        let listener = Rc::new(Listener {
            target,
            triggers,
            notifier,
        });
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|weak| weak.strong_count() > 0);
        listeners.push(Rc::downgrade(&listener));
        Ok(SceneSubscription {
            _listener: listener,
        })
    }

    fn bounding_rect(&self, element: &ElementId) -> Result<Rect, Error> {
        self.bounds(*element)
    }
}
