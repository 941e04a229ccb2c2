// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: sides, alignments, placements, strategies, axes, and rect pairs.
//!
//! ## Overview
//!
//! A [`Placement`] names where the floating box sits relative to its reference:
//! one of four [`Side`]s plus an optional logical [`Alignment`].
//! `start`/`end` are logical; on the top and bottom sides they map to left/right
//! for left-to-right content and to right/left for right-to-left content.

use core::fmt;
use core::str::FromStr;

use kurbo::{Insets, Point, Rect, Size};

/// Physical side of the reference box the floating box is placed against.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    /// Above the reference.
    Top,
    /// To the right of the reference.
    Right,
    /// Below the reference.
    Bottom,
    /// To the left of the reference.
    Left,
}

impl Side {
    /// All sides in clockwise order starting at the top.
    pub const ALL: [Self; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    /// The side across from this one.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Right => Self::Left,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
        }
    }

    /// Axis along which a box placed on this side is pushed away from the reference.
    ///
    /// Top and bottom move along `y`; left and right move along `x`.
    pub const fn axis(self) -> Axis {
        match self {
            Self::Top | Self::Bottom => Axis::Y,
            Self::Left | Self::Right => Axis::X,
        }
    }

    /// True for the sides at the coordinate origin (top and left).
    pub const fn is_origin(self) -> bool {
        matches!(self, Self::Top | Self::Left)
    }

    /// Read the inset belonging to this side.
    ///
    /// Insets use `x0` = left, `y0` = top, `x1` = right, `y1` = bottom.
    pub const fn of(self, insets: Insets) -> f64 {
        match self {
            Self::Top => insets.y0,
            Self::Right => insets.x1,
            Self::Bottom => insets.y1,
            Self::Left => insets.x0,
        }
    }

    /// Lowercase name as used in placement strings.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }
}

/// Logical alignment of the floating box along its side.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Alignment {
    /// Align with the start edge of the reference.
    Start,
    /// Align with the end edge of the reference.
    End,
}

impl Alignment {
    /// The other alignment.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Start => Self::End,
            Self::End => Self::Start,
        }
    }

    /// Lowercase name as used in placement strings.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

/// Coordinate axis.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Axis {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
}

impl Axis {
    /// The perpendicular axis.
    pub const fn opposite(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }

    /// Component of a point along this axis.
    pub const fn of_point(self, p: Point) -> f64 {
        match self {
            Self::X => p.x,
            Self::Y => p.y,
        }
    }

    /// Return `p` with its component on this axis replaced by `v`.
    pub const fn with_point(self, p: Point, v: f64) -> Point {
        match self {
            Self::X => Point::new(v, p.y),
            Self::Y => Point::new(p.x, v),
        }
    }

    /// Extent of a size along this axis (width for `x`, height for `y`).
    pub const fn length(self, s: Size) -> f64 {
        match self {
            Self::X => s.width,
            Self::Y => s.height,
        }
    }

    /// Leading edge of a rect on this axis.
    pub const fn start(self, r: Rect) -> f64 {
        match self {
            Self::X => r.x0,
            Self::Y => r.y0,
        }
    }

    /// Extent of a rect along this axis.
    pub fn rect_length(self, r: Rect) -> f64 {
        self.length(r.size())
    }

    /// Side at the start of this axis (left for `x`, top for `y`).
    pub const fn min_side(self) -> Side {
        match self {
            Self::X => Side::Left,
            Self::Y => Side::Top,
        }
    }

    /// Side at the end of this axis (right for `x`, bottom for `y`).
    pub const fn max_side(self) -> Side {
        match self {
            Self::X => Side::Right,
            Self::Y => Side::Bottom,
        }
    }
}

bitflags::bitflags! {
    /// A set of axes.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Axes: u8 {
        /// Horizontal axis.
        const X = 0b0000_0001;
        /// Vertical axis.
        const Y = 0b0000_0010;
    }
}

impl From<Axis> for Axes {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::X => Self::X,
            Axis::Y => Self::Y,
        }
    }
}

/// A side plus an optional alignment.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Placement {
    /// Side of the reference the floating box sits against.
    pub side: Side,
    /// Alignment along that side; `None` centers on the reference.
    pub alignment: Option<Alignment>,
}

impl Placement {
    /// `top`
    pub const TOP: Self = Self::new(Side::Top, None);
    /// `top-start`
    pub const TOP_START: Self = Self::new(Side::Top, Some(Alignment::Start));
    /// `top-end`
    pub const TOP_END: Self = Self::new(Side::Top, Some(Alignment::End));
    /// `right`
    pub const RIGHT: Self = Self::new(Side::Right, None);
    /// `right-start`
    pub const RIGHT_START: Self = Self::new(Side::Right, Some(Alignment::Start));
    /// `right-end`
    pub const RIGHT_END: Self = Self::new(Side::Right, Some(Alignment::End));
    /// `bottom`
    pub const BOTTOM: Self = Self::new(Side::Bottom, None);
    /// `bottom-start`
    pub const BOTTOM_START: Self = Self::new(Side::Bottom, Some(Alignment::Start));
    /// `bottom-end`
    pub const BOTTOM_END: Self = Self::new(Side::Bottom, Some(Alignment::End));
    /// `left`
    pub const LEFT: Self = Self::new(Side::Left, None);
    /// `left-start`
    pub const LEFT_START: Self = Self::new(Side::Left, Some(Alignment::Start));
    /// `left-end`
    pub const LEFT_END: Self = Self::new(Side::Left, Some(Alignment::End));

    /// Every placement, grouped by side in clockwise order.
    pub const ALL: [Self; 12] = [
        Self::TOP,
        Self::TOP_START,
        Self::TOP_END,
        Self::RIGHT,
        Self::RIGHT_START,
        Self::RIGHT_END,
        Self::BOTTOM,
        Self::BOTTOM_START,
        Self::BOTTOM_END,
        Self::LEFT,
        Self::LEFT_START,
        Self::LEFT_END,
    ];

    /// Create a placement.
    pub const fn new(side: Side, alignment: Option<Alignment>) -> Self {
        Self { side, alignment }
    }

    /// Axis the floating box is pushed along (the side axis).
    pub const fn side_axis(self) -> Axis {
        self.side.axis()
    }

    /// Axis the floating box is aligned along (perpendicular to the side axis).
    pub const fn alignment_axis(self) -> Axis {
        self.side.axis().opposite()
    }

    /// True when no alignment is set.
    pub const fn is_base(self) -> bool {
        self.alignment.is_none()
    }

    /// Same alignment on the opposite side.
    pub const fn opposite(self) -> Self {
        Self::new(self.side.opposite(), self.alignment)
    }

    /// Same side with `start` and `end` swapped.
    pub const fn opposite_alignment(self) -> Self {
        let alignment = match self.alignment {
            Some(a) => Some(a.opposite()),
            None => None,
        };
        Self::new(self.side, alignment)
    }

    /// Same side with the given alignment.
    pub const fn with_alignment(self, alignment: Option<Alignment>) -> Self {
        Self::new(self.side, alignment)
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::BOTTOM
    }
}

impl From<Side> for Placement {
    fn from(side: Side) -> Self {
        Self::new(side, None)
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.side.as_str())?;
        if let Some(a) = self.alignment {
            write!(f, "-{}", a.as_str())?;
        }
        Ok(())
    }
}

/// Error returned when parsing a [`Placement`] from a string fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsePlacementError;

impl fmt::Display for ParsePlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(
            "expected `top`, `right`, `bottom` or `left` with optional `-start`/`-end`",
        )
    }
}

impl core::error::Error for ParsePlacementError {}

impl FromStr for Placement {
    type Err = ParsePlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (side, alignment) = match s.split_once('-') {
            Some((side, alignment)) => (side, Some(alignment)),
            None => (s, None),
        };
        let side = match side {
            "top" => Side::Top,
            "right" => Side::Right,
            "bottom" => Side::Bottom,
            "left" => Side::Left,
            _ => return Err(ParsePlacementError),
        };
        let alignment = match alignment {
            None => None,
            Some("start") => Some(Alignment::Start),
            Some("end") => Some(Alignment::End),
            Some(_) => return Err(ParsePlacementError),
        };
        Ok(Self::new(side, alignment))
    }
}

/// Positioning strategy: which coordinate space the result is expressed in.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Strategy {
    /// Relative to the floating element's offset parent.
    #[default]
    Absolute,
    /// Relative to the viewport.
    Fixed,
}

/// Measured reference and floating rects for one computation.
///
/// The floating rect's origin is not meaningful for placement; only its size is
/// consulted. Platforms conventionally report it at the origin.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ElementRects {
    /// Reference (anchor) rect.
    pub reference: Rect,
    /// Floating rect.
    pub floating: Rect,
}

/// The element pair being positioned.
#[derive(Debug)]
pub struct Elements<'a, E> {
    /// Reference (anchor) element.
    pub reference: &'a E,
    /// Floating element.
    pub floating: &'a E,
}

impl<E> Clone for Elements<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Elements<'_, E> {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn placement_string_forms() {
        for p in Placement::ALL {
            let s = p.to_string();
            assert_eq!(s.parse::<Placement>(), Ok(p), "{s} should round-trip");
        }
        assert_eq!(Placement::BOTTOM_START.to_string(), "bottom-start");
        assert!("middle".parse::<Placement>().is_err());
        assert!("top-center".parse::<Placement>().is_err());
    }

    #[test]
    fn opposites() {
        assert_eq!(Placement::TOP_START.opposite(), Placement::BOTTOM_START);
        let flipped = Placement::TOP_START.opposite_alignment();
        assert_eq!(flipped, Placement::TOP_END);
        assert_eq!(Placement::LEFT.opposite_alignment(), Placement::LEFT);
        assert_eq!(Side::Left.opposite(), Side::Right);
    }

    #[test]
    fn axes() {
        assert_eq!(Placement::TOP.side_axis(), Axis::Y);
        assert_eq!(Placement::TOP.alignment_axis(), Axis::X);
        assert_eq!(Placement::RIGHT_END.side_axis(), Axis::X);
        let p = Axis::Y.with_point(Point::new(1.0, 2.0), 9.0);
        assert_eq!(p, Point::new(1.0, 9.0));
    }

    #[test]
    fn side_reads_insets() {
        let insets = Insets::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(Side::Left.of(insets), 1.0);
        assert_eq!(Side::Top.of(insets), 2.0);
        assert_eq!(Side::Right.of(insets), 3.0);
        assert_eq!(Side::Bottom.of(insets), 4.0);
    }
}
