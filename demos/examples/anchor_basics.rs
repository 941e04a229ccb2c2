// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Anchor basics.
//!
//! Place a tooltip under a button, then move the button near the viewport
//! edges and watch flip, shift, arrow, size, and hide react.
//!
//! Run:
//! - `cargo run -p understory_anchor_demos --example anchor_basics`

use std::cell::Cell;

use kurbo::Rect;
use pollster::block_on;
use understory_anchor::middleware::arrow::{ArrowOptions, arrow};
use understory_anchor::middleware::flip::{FlipOptions, flip};
use understory_anchor::middleware::hide::{HideStrategy, hide};
use understory_anchor::middleware::offset::offset;
use understory_anchor::middleware::shift::{LimitShiftOptions, ShiftOptions, limit_shift, shift};
use understory_anchor::middleware::size::{SizeOptions, size};
use understory_anchor::scene::{ElementId, Scene, SceneElement};
use understory_anchor::{ComputePositionConfig, Error, Placement, compute_position};

fn place(
    scene: &Scene,
    button: ElementId,
    tooltip: ElementId,
    tip: ElementId,
    placement: Placement,
) -> Result<(), Error> {
    let room = Cell::new((0.0, 0.0));
    let limiter = limit_shift(LimitShiftOptions::default());
    let config = ComputePositionConfig::new(scene)
        .placement(placement)
        .with(offset(8.0))
        .with(flip(FlipOptions::default()))
        .with(shift(ShiftOptions::default().limiter(limiter)))
        .with(size(SizeOptions::new(|apply| {
            room.set((apply.available_width, apply.available_height));
        })))
        .with(arrow(ArrowOptions::new(tip))?)
        .with(hide(HideStrategy::ReferenceHidden));
    let out = block_on(compute_position(&button, &tooltip, config))?;

    let (got, at) = (out.placement, out.coords());
    println!("requested {placement}, got {got} at {at:?}");
    let (w, h) = room.get();
    println!("  room: {w} x {h}");
    if let Some(a) = out.middleware_data.arrow() {
        println!(
            "  arrow: x={:?} y={:?} on {:?} (center offset {})",
            a.x, a.y, a.static_side, a.center_offset
        );
    }
    if let Some(s) = out.middleware_data.shift() {
        println!("  shifted by {:?}", s);
    }
    if let Some(h) = out.middleware_data.hide() {
        println!("  reference hidden: {:?}", h.reference_hidden);
    }
    Ok(())
}

fn main() -> Result<(), Error> {
    let mut scene = Scene::new(Rect::new(0.0, 0.0, 640.0, 480.0));
    let button = scene.insert(
        None,
        SceneElement::new(Rect::new(300.0, 200.0, 380.0, 230.0)),
    );
    let tooltip = scene.insert(None, SceneElement::new(Rect::new(0.0, 0.0, 180.0, 60.0)));
    let tip = scene.insert(
        Some(tooltip),
        SceneElement::new(Rect::new(0.0, 0.0, 10.0, 10.0)),
    );

    println!("== centered");
    place(&scene, button, tooltip, tip, Placement::BOTTOM)?;

    println!("== near the bottom edge");
    scene.set_bounds(button, Rect::new(300.0, 430.0, 380.0, 460.0));
    place(&scene, button, tooltip, tip, Placement::BOTTOM)?;

    println!("== near the left edge");
    scene.set_bounds(button, Rect::new(4.0, 200.0, 40.0, 230.0));
    place(&scene, button, tooltip, tip, Placement::BOTTOM_START)?;

    println!("== scrolled out of view");
    scene.set_bounds(button, Rect::new(300.0, -80.0, 380.0, -50.0));
    place(&scene, button, tooltip, tip, Placement::BOTTOM)?;

    for text in ["top-end", "left", "sideways"] {
        match text.parse::<Placement>() {
            Ok(p) => println!("parsed {text:?} as {p}"),
            Err(e) => println!("could not parse {text:?}: {e}"),
        }
    }
    Ok(())
}
