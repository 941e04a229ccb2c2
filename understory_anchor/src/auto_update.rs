// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Auto update: re-run positioning when the geometry it depends on changes.
//!
//! ## Overview
//!
//! [`auto_update`] subscribes to everything that can move a floating element
//! relative to its reference:
//!
//! - scroll and resize of the viewport and of every overflow ancestor of either
//!   element ([`Triggers::ANCESTOR_SCROLL`], [`Triggers::ANCESTOR_RESIZE`]),
//! - size changes of both elements ([`Triggers::ELEMENT_RESIZE`]),
//! - the reference moving without any ancestor scrolling ([`Triggers::LAYOUT_SHIFT`]),
//! - optionally, a per-frame comparison of the reference's bounding rect
//!   ([`Triggers::ANIMATION_FRAME`]).
//!
//! Hosts deliver events by calling [`Notifier::notify`] on the notifier handed to
//! [`ObserverHost::observe`]. Deliveries only accumulate; the host's frame loop
//! calls [`AutoUpdate::frame`], which runs the update callback at most once no
//! matter how many triggers arrived since the previous frame.
//!
//! Dropping the [`AutoUpdate`] (or calling [`AutoUpdate::cleanup`]) drops every
//! subscription, which releases the host's listeners.
//!
//! ## Mount tracking and stale results
//!
//! [`WhileMounted`] keeps an [`AutoUpdate`] attached only while both elements
//! exist. [`RequestSequence`] hands out tickets so results of superseded
//! computations can be discarded when updates complete out of order.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;

use kurbo::Rect;
use tracing::debug;

use crate::error::Error;

bitflags::bitflags! {
    /// Kinds of change that can invalidate a computed position.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Triggers: u8 {
        /// An overflow ancestor (or the viewport) scrolled.
        const ANCESTOR_SCROLL = 0b0000_0001;
        /// An overflow ancestor (or the viewport) changed size.
        const ANCESTOR_RESIZE = 0b0000_0010;
        /// The reference or floating element changed size.
        const ELEMENT_RESIZE  = 0b0000_0100;
        /// The reference moved within the layout.
        const LAYOUT_SHIFT    = 0b0000_1000;
        /// The reference's bounding rect differs from the previous frame.
        const ANIMATION_FRAME = 0b0001_0000;
    }
}

/// Which triggers [`auto_update`] subscribes to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AutoUpdateOptions {
    /// Enabled triggers.
    pub triggers: Triggers,
}

impl Default for AutoUpdateOptions {
    fn default() -> Self {
        Self {
            triggers: Triggers::all() - Triggers::ANIMATION_FRAME,
        }
    }
}

impl From<Triggers> for AutoUpdateOptions {
    fn from(triggers: Triggers) -> Self {
        Self { triggers }
    }
}

/// Shared accumulator that hosts signal into.
#[derive(Clone, Default)]
pub struct Notifier(Rc<Cell<Triggers>>);

impl Notifier {
    /// Record that `triggers` fired.
    pub fn notify(&self, triggers: Triggers) {
        self.0.set(self.0.get() | triggers);
    }

    /// Triggers recorded since the last [`take`](Self::take).
    pub fn pending(&self) -> Triggers {
        self.0.get()
    }

    /// Return and clear the recorded triggers.
    pub fn take(&self) -> Triggers {
        self.0.replace(Triggers::empty())
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Notifier").field(&self.0.get()).finish()
    }
}

/// What an [`ObserverHost::observe`] call listens to.
#[derive(Debug)]
pub enum ObserveTarget<'a, E> {
    /// The viewport (window).
    Viewport,
    /// An element.
    Element(&'a E),
}

impl<E> Clone for ObserveTarget<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for ObserveTarget<'_, E> {}

/// Event sources an [`AutoUpdate`] subscribes to.
pub trait ObserverHost {
    /// Element handle.
    type Element;
    /// Live listener registration; dropping it unsubscribes.
    type Subscription;

    /// Scrollable or clipping ancestors of `element`, nearest first. The viewport
    /// is implied and not listed.
    fn overflow_ancestors(&self, element: &Self::Element) -> Vec<Self::Element>;

    /// Deliver `triggers` occurring on `target` to `notifier` until the returned
    /// subscription is dropped.
    fn observe(
        &self,
        target: ObserveTarget<'_, Self::Element>,
        triggers: Triggers,
        notifier: Notifier,
    ) -> Result<Self::Subscription, Error>;

    /// Current bounding rect of `element` in viewport space.
    fn bounding_rect(&self, element: &Self::Element) -> Result<Rect, Error>;
}

/// Live auto update registration. See [`auto_update`].
pub struct AutoUpdate<H: ObserverHost, F> {
    reference: H::Element,
    floating: H::Element,
    update: F,
    options: AutoUpdateOptions,
    notifier: Notifier,
    subscriptions: Vec<H::Subscription>,
    previous_rect: Option<Rect>,
}

impl<H: ObserverHost, F> fmt::Debug for AutoUpdate<H, F>
where
    H::Element: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoUpdate")
            .field("reference", &self.reference)
            .field("floating", &self.floating)
            .field("options", &self.options)
            .field("pending", &self.notifier.pending())
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

/// Subscribe to geometry changes of `reference` and `floating` and call
/// `update` once now and then from [`AutoUpdate::frame`] whenever something
/// changed.
pub fn auto_update<H, F>(
    host: &H,
    reference: &H::Element,
    floating: &H::Element,
    mut update: F,
    options: AutoUpdateOptions,
) -> Result<AutoUpdate<H, F>, Error>
where
    H: ObserverHost,
    H::Element: Clone + PartialEq,
    F: FnMut(),
{
    let triggers = options.triggers;
    let notifier = Notifier::default();
    let mut subscriptions = Vec::new();

    let ancestor_triggers = triggers & (Triggers::ANCESTOR_SCROLL | Triggers::ANCESTOR_RESIZE);
    if !ancestor_triggers.is_empty() {
        let mut ancestors = host.overflow_ancestors(reference);
        for ancestor in host.overflow_ancestors(floating) {
            if !ancestors.contains(&ancestor) {
                ancestors.push(ancestor);
            }
        }
        subscriptions.push(host.observe(
            ObserveTarget::Viewport,
            ancestor_triggers,
            notifier.clone(),
        )?);
        for ancestor in &ancestors {
            subscriptions.push(host.observe(
                ObserveTarget::Element(ancestor),
                ancestor_triggers,
                notifier.clone(),
            )?);
        }
    }

    let reference_triggers = triggers & (Triggers::LAYOUT_SHIFT | Triggers::ELEMENT_RESIZE);
    if !reference_triggers.is_empty() {
        subscriptions.push(host.observe(
            ObserveTarget::Element(reference),
            reference_triggers,
            notifier.clone(),
        )?);
    }
    if triggers.contains(Triggers::ELEMENT_RESIZE) {
        subscriptions.push(host.observe(
            ObserveTarget::Element(floating),
            Triggers::ELEMENT_RESIZE,
            notifier.clone(),
        )?);
    }

    let previous_rect = if triggers.contains(Triggers::ANIMATION_FRAME) {
        Some(host.bounding_rect(reference)?)
    } else {
        None
    };

    debug!(
        subscriptions = subscriptions.len(),
        triggers = triggers.bits(),
        "auto update attached"
    );
    update();
    Ok(AutoUpdate {
        reference: reference.clone(),
        floating: floating.clone(),
        update,
        options,
        notifier,
        subscriptions,
        previous_rect,
    })
}

impl<H, F> AutoUpdate<H, F>
where
    H: ObserverHost,
    F: FnMut(),
{
    /// Run `update` once if anything changed since the previous frame.
    ///
    /// Returns whether `update` ran.
    pub fn frame(&mut self, host: &H) -> Result<bool, Error> {
        let mut fired = self.notifier.take();
        if self.options.triggers.contains(Triggers::ANIMATION_FRAME) {
            let rect = host.bounding_rect(&self.reference)?;
            if self.previous_rect.is_some_and(|previous| previous != rect) {
                fired |= Triggers::ANIMATION_FRAME;
            }
            self.previous_rect = Some(rect);
        }
        if fired.is_empty() {
            return Ok(false);
        }
        debug!(triggers = fired.bits(), "auto update");
        (self.update)();
        Ok(true)
    }

    /// Triggers delivered since the last frame.
    pub fn pending(&self) -> Triggers {
        self.notifier.pending()
    }

    /// Stop observing. Equivalent to dropping.
    pub fn cleanup(self) {
        drop(self);
    }
}

impl<H: ObserverHost, F> AutoUpdate<H, F> {
    /// The observed reference element.
    pub fn reference(&self) -> &H::Element {
        &self.reference
    }

    /// The observed floating element.
    pub fn floating(&self) -> &H::Element {
        &self.floating
    }
}

impl<H: ObserverHost, F> Drop for AutoUpdate<H, F> {
    fn drop(&mut self) {
        debug!(
            subscriptions = self.subscriptions.len(),
            "auto update detached"
        );
        self.subscriptions.clear();
    }
}

/// An [`AutoUpdate`] that exists only while both elements are mounted.
pub struct WhileMounted<H: ObserverHost, F> {
    update: F,
    options: AutoUpdateOptions,
    active: Option<AutoUpdate<H, F>>,
}

impl<H: ObserverHost, F> fmt::Debug for WhileMounted<H, F>
where
    H::Element: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhileMounted")
            .field("options", &self.options)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl<H, F> WhileMounted<H, F>
where
    H: ObserverHost,
    H::Element: Clone + PartialEq,
    F: FnMut() + Clone,
{
    /// Detached tracker that will run clones of `update`.
    pub fn new(update: F, options: AutoUpdateOptions) -> Self {
        Self {
            update,
            options,
            active: None,
        }
    }

    /// Attach, re-attach, or detach so the registration matches the mounted pair.
    ///
    /// Returns whether an auto update is attached afterwards.
    pub fn sync(
        &mut self,
        host: &H,
        reference: Option<&H::Element>,
        floating: Option<&H::Element>,
    ) -> Result<bool, Error> {
        let (Some(reference), Some(floating)) = (reference, floating) else {
            self.active = None;
            return Ok(false);
        };
        if let Some(active) = &self.active {
            if active.reference == *reference && active.floating == *floating {
                return Ok(true);
            }
        }
        self.active = None;
        self.active = Some(auto_update(
            host,
            reference,
            floating,
            self.update.clone(),
            self.options,
        )?);
        Ok(true)
    }

    /// Forward to [`AutoUpdate::frame`] when attached.
    pub fn frame(&mut self, host: &H) -> Result<bool, Error> {
        match &mut self.active {
            Some(active) => active.frame(host),
            None => Ok(false),
        }
    }

    /// Whether an auto update is attached.
    pub fn is_attached(&self) -> bool {
        self.active.is_some()
    }
}

/// Ticket issued by [`RequestSequence::begin`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Monotonic request counter for discarding stale results.
///
/// Take a ticket before starting a computation; apply its result only if the
/// ticket is still current.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: Cell<u64>,
}

impl RequestSequence {
    /// New sequence with no requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding all earlier ones.
    pub fn begin(&self) -> Ticket {
        let next = self.latest.get().wrapping_add(1);
        self.latest.set(next);
        Ticket(next)
    }

    /// Whether `ticket` belongs to the most recent request.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.get() == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rect_from_xywh;
    use crate::scene::{Scene, SceneElement};
    use kurbo::Vec2;

    fn counter() -> (Rc<Cell<u32>>, impl FnMut() + Clone) {
        let calls = Rc::new(Cell::new(0));
        let inner = calls.clone();
        (calls, move || inner.set(inner.get() + 1))
    }

    #[test]
    fn updates_immediately_then_coalesces() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 200.0, 200.0));
        let r = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(10.0, 10.0, 20.0, 20.0)),
        );
        let f = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(0.0, 0.0, 50.0, 20.0)),
        );
        let (calls, update) = counter();
        let mut handle = auto_update(&scene, &r, &f, update, AutoUpdateOptions::default()).unwrap();
        assert_eq!(calls.get(), 1);

        assert!(!handle.frame(&scene).unwrap(), "nothing changed");
        scene.scroll_by(None, Vec2::new(0.0, 5.0));
        scene.set_bounds(f, rect_from_xywh(0.0, 0.0, 60.0, 20.0));
        scene.set_viewport(Rect::new(0.0, 0.0, 300.0, 200.0));
        let expected = Triggers::ANCESTOR_SCROLL | Triggers::ELEMENT_RESIZE;
        assert!(handle.pending().contains(expected));
        assert!(handle.frame(&scene).unwrap());
        assert_eq!(calls.get(), 2, "three changes, one update");
        assert!(!handle.frame(&scene).unwrap());
    }

    #[test]
    fn disabled_triggers_are_not_observed() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 200.0, 200.0));
        let r = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(10.0, 10.0, 20.0, 20.0)),
        );
        let f = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(0.0, 0.0, 50.0, 20.0)),
        );
        let (calls, update) = counter();
        let mut handle =
            auto_update(&scene, &r, &f, update, Triggers::ELEMENT_RESIZE.into()).unwrap();
        scene.scroll_by(None, Vec2::new(0.0, 5.0));
        assert!(!handle.frame(&scene).unwrap());
        scene.set_bounds(r, rect_from_xywh(10.0, 5.0, 30.0, 20.0));
        assert!(handle.frame(&scene).unwrap());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn animation_frame_compares_reference_rect() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 200.0, 200.0));
        let r = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(10.0, 10.0, 20.0, 20.0)),
        );
        let f = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(0.0, 0.0, 50.0, 20.0)),
        );
        let (calls, update) = counter();
        let mut handle =
            auto_update(&scene, &r, &f, update, Triggers::ANIMATION_FRAME.into()).unwrap();
        assert!(!handle.frame(&scene).unwrap());
        scene.set_bounds(r, rect_from_xywh(11.0, 10.0, 20.0, 20.0));
        assert_eq!(handle.pending(), Triggers::empty(), "nothing observed");
        assert!(handle.frame(&scene).unwrap());
        assert!(!handle.frame(&scene).unwrap());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn cleanup_releases_listeners() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 200.0, 200.0));
        let clip = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(0.0, 0.0, 100.0, 100.0)).clips(),
        );
        let r = scene.insert(
            Some(clip),
            SceneElement::new(rect_from_xywh(10.0, 10.0, 20.0, 20.0)),
        );
        let f = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(0.0, 0.0, 50.0, 20.0)),
        );
        let (_calls, update) = counter();
        let handle = auto_update(&scene, &r, &f, update, AutoUpdateOptions::default()).unwrap();
        // viewport, clip container, reference, floating
        assert_eq!(scene.listener_count(), 4);
        handle.cleanup();
        assert_eq!(scene.listener_count(), 0);
    }

    #[test]
    fn while_mounted_follows_element_presence() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 200.0, 200.0));
        let r = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(10.0, 10.0, 20.0, 20.0)),
        );
        let f = scene.insert(
            None,
            SceneElement::new(rect_from_xywh(0.0, 0.0, 50.0, 20.0)),
        );
        let (calls, update) = counter();
        let mut mounted = WhileMounted::new(update, AutoUpdateOptions::default());

        assert!(!mounted.sync(&scene, Some(&r), None).unwrap());
        assert_eq!(calls.get(), 0);
        assert!(mounted.sync(&scene, Some(&r), Some(&f)).unwrap());
        assert_eq!(calls.get(), 1);
        assert!(mounted.sync(&scene, Some(&r), Some(&f)).unwrap());
        assert_eq!(calls.get(), 1, "same pair stays attached");

        scene.remove(f);
        assert!(!mounted.sync(&scene, Some(&r), None).unwrap());
        assert!(!mounted.is_attached());
        assert!(!mounted.frame(&scene).unwrap());
        assert_eq!(scene.listener_count(), 0);
    }

    #[test]
    fn stale_tickets_are_rejected() {
        let sequence = RequestSequence::new();
        let first = sequence.begin();
        let second = sequence.begin();
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
        assert!(first < second);
    }
}
