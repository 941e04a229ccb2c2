// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Anchor: Kurbo-native anchor positioning for floating boxes.
//!
//! Understory Anchor computes where to put a floating box (tooltip, popover,
//! dropdown, context menu) next to a reference box so it stays visible inside
//! its clipping contexts.
//!
//! - Resolves one of twelve [`Placement`]s into coordinates.
//! - Threads the result through an ordered middleware pipeline
//!   ([`offset`](middleware::offset::offset), [`shift`](middleware::shift::shift),
//!   [`flip`](middleware::flip::flip),
//!   [`auto_placement`](middleware::auto_placement::auto_placement),
//!   [`size`](middleware::size::size), [`arrow`](middleware::arrow::arrow),
//!   [`hide`](middleware::hide::hide)) that can adjust coordinates, record data,
//!   and restart with a different placement.
//! - Re-runs positioning when geometry changes via [`auto_update`](auto_update::auto_update).
//!
//! ## Not a layout engine
//!
//! This crate does not measure anything. All geometry comes from a [`Platform`]
//! implementation supplied by the host: element rects, clipping rects,
//! dimensions, writing direction, and offset-parent conversions. The results are
//! coordinates for the host to apply; nothing is rendered or styled here.
//!
//! [`scene::Scene`] is an in-memory platform for headless hosts, tests, and
//! demos. It is also the simplest reference for writing a platform of your own.
//!
//! ## API overview
//!
//! - [`compute_position`]: measure, resolve the placement, run the middleware.
//! - [`ComputePositionConfig`]: platform, placement, [`Strategy`], middleware list.
//! - [`middleware::Middleware`]: the pipeline protocol; [`middleware::from_fn`]
//!   wraps a closure.
//! - [`detect_overflow`](overflow::detect_overflow): per-side overflow against the
//!   clipping rect, shared by the standard middleware.
//! - [`auto_update::auto_update`], [`auto_update::WhileMounted`],
//!   [`auto_update::RequestSequence`]: keeping a position current.
//!
//! Every query to the platform is a future so hosts that need a layout pass
//! can suspend. The engine itself never spawns or blocks; drive it with any
//! executor (the tests use `pollster`).
//!
//! ## Example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use understory_anchor::middleware::flip::{FlipOptions, flip};
//! use understory_anchor::middleware::offset::offset;
//! use understory_anchor::middleware::shift::{ShiftOptions, shift};
//! use understory_anchor::scene::{Scene, SceneElement};
//! use understory_anchor::{ComputePositionConfig, Placement, compute_position};
//!
//! let mut scene = Scene::new(Rect::new(0.0, 0.0, 1000.0, 140.0));
//! let button = scene.insert(None, SceneElement::new(Rect::new(100.0, 100.0, 150.0, 120.0)));
//! let tooltip = scene.insert(None, SceneElement::new(Rect::new(0.0, 0.0, 80.0, 30.0)));
//!
//! let config = ComputePositionConfig::new(&scene)
//!     .placement(Placement::BOTTOM)
//!     .with(offset(4.0))
//!     .with(flip(FlipOptions::default()))
//!     .with(shift(ShiftOptions::default()));
//!
//! let out = pollster::block_on(compute_position(&button, &tooltip, config)).unwrap();
//! // Not enough room below the button, so the tooltip flipped above it.
//! assert_eq!(out.placement, Placement::TOP);
//! assert_eq!(out.coords(), Point::new(85.0, 66.0));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod auto_update;
pub mod compute;
pub mod error;
pub mod geometry;
pub mod middleware;
pub mod overflow;
pub mod placement;
pub mod platform;
pub mod scene;
pub mod types;

pub use compute::{ComputePositionConfig, ComputePositionReturn, MAX_RESETS, compute_position};
pub use error::Error;
pub use platform::{Boundary, Platform, RootBoundary};
pub use types::{Alignment, Axes, Axis, ElementRects, Elements, Placement, Side, Strategy};
