// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors surfaced by positioning and observation.

use core::fmt;

/// Failure modes of [`compute_position`](crate::compute::compute_position) and the
/// pieces that feed it.
///
/// Geometry itself never fails: out-of-range values (negative sizes, inverted
/// rects) are passed through as computed. Only measurement and configuration
/// problems are reported.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The platform could not measure an element (for example it was removed).
    ElementUnavailable,
    /// A middleware kept requesting resets past [`MAX_RESETS`](crate::compute::MAX_RESETS).
    ResetLimitExceeded {
        /// Name of the middleware whose reset tripped the bound.
        middleware: &'static str,
        /// Resets performed before giving up.
        resets: u32,
    },
    /// [`arrow`](crate::middleware::arrow::arrow) was configured without an element.
    MissingArrowElement,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementUnavailable => f.write_str("element is not available for measurement"),
            Self::ResetLimitExceeded { middleware, resets } => write!(
                f,
                "middleware `{middleware}` requested a reset after {resets} resets"
            ),
            Self::MissingArrowElement => f.write_str("arrow middleware requires an element"),
        }
    }
}

impl core::error::Error for Error {}
