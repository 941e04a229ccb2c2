// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keeping a popover attached while the scene changes.
//!
//! A popover is mounted against a button inside a scrolling list. Scrolling,
//! resizing, and unmounting all flow through `WhileMounted`, and a
//! `RequestSequence` drops results that a newer request has superseded.
//!
//! Run:
//! - `cargo run -p understory_anchor_demos --example anchor_auto_update`

use std::cell::Cell;
use std::rc::Rc;

use kurbo::{Rect, Vec2};
use pollster::block_on;
use understory_anchor::auto_update::{AutoUpdateOptions, RequestSequence, WhileMounted};
use understory_anchor::middleware::flip::{FlipOptions, flip};
use understory_anchor::middleware::offset::offset;
use understory_anchor::middleware::shift::{ShiftOptions, shift};
use understory_anchor::scene::{ElementId, Scene, SceneElement};
use understory_anchor::{ComputePositionConfig, Error, compute_position};

fn reposition(
    scene: &Scene,
    requests: &RequestSequence,
    button: ElementId,
    popover: ElementId,
) -> Result<(), Error> {
    let ticket = requests.begin();
    let config = ComputePositionConfig::new(scene)
        .with(offset(4.0))
        .with(flip(FlipOptions::default()))
        .with(shift(ShiftOptions::default()));
    let out = block_on(compute_position(&button, &popover, config))?;
    if requests.is_current(ticket) {
        println!("  popover {} at {:?}", out.placement, out.coords());
    }
    Ok(())
}

fn main() -> Result<(), Error> {
    let mut scene = Scene::new(Rect::new(0.0, 0.0, 400.0, 300.0));
    let list = scene.insert(
        None,
        SceneElement::new(Rect::new(20.0, 20.0, 380.0, 280.0)).clips(),
    );
    let button = scene.insert(
        Some(list),
        SceneElement::new(Rect::new(150.0, 120.0, 230.0, 150.0)),
    );
    let popover = scene.insert(None, SceneElement::new(Rect::new(0.0, 0.0, 160.0, 90.0)));

    // The update callback only marks the popover dirty; positioning runs after
    // the host has finished mutating the scene.
    let dirty = Rc::new(Cell::new(0_u32));
    let mark = {
        let dirty = Rc::clone(&dirty);
        move || dirty.set(dirty.get() + 1)
    };
    let requests = RequestSequence::new();
    let mut tracker = WhileMounted::new(mark, AutoUpdateOptions::default());

    let flush = |scene: &Scene, tracker: &mut WhileMounted<Scene, _>| -> Result<(), Error> {
        tracker.frame(scene)?;
        if dirty.replace(0) > 0 {
            reposition(scene, &requests, button, popover)?;
        } else {
            println!("  nothing changed");
        }
        Ok(())
    };

    println!("== mounted");
    tracker.sync(&scene, Some(&button), Some(&popover))?;
    flush(&scene, &mut tracker)?;

    println!("== idle frame");
    flush(&scene, &mut tracker)?;

    println!("== list scrolled by 100");
    scene.scroll_by(Some(list), Vec2::new(0.0, 100.0));
    flush(&scene, &mut tracker)?;

    println!("== popover grew");
    scene.set_bounds(popover, Rect::new(0.0, 0.0, 160.0, 160.0));
    flush(&scene, &mut tracker)?;

    println!("== unmounted");
    tracker.sync(&scene, None, Some(&popover))?;
    let attached = tracker.is_attached();
    let listeners = scene.listener_count();
    println!("  attached: {attached}, listeners: {listeners}");
    Ok(())
}
