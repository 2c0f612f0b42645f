//! Crate-wide error and outcome types.
//!
//! Matches the teacher's approach: hand-rolled structs/enums with manual
//! `Display` impls, no `thiserror`/`anyhow`. Fallible constructors return
//! `Result`; only genuinely fatal conditions (`InvalidConfig`) are meant to
//! propagate to a top-level caller (`spec.md` §7).

use std::fmt;

use crate::model::{RotationId, VehicleId};

/// Raised at depot/area construction time. Never reached at simulation
/// runtime — an `InvalidConfig` means the caller built an impossible depot.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidConfig {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid config: {} — {}", self.field, self.message)
    }
}

impl std::error::Error for InvalidConfig {}

/// The outcome of one `spec.md` §4.4 simulator run.
///
/// The sizer (C6) matches on this directly rather than catching exceptions
/// (`spec.md` §9's "exceptions used for control flow → Result sum type").
#[derive(Debug)]
pub enum SimOutcome {
    /// Steady-state run completed without incident.
    Ok(Box<crate::sim::materializer::ResultBundle>),
    /// The dispatch strategy had to create a new vehicle mid steady-state
    /// replay — this configuration cannot sustain itself.
    Unstable,
    /// A rotation's actual departure/arrival drifted from its schedule.
    DelayedTrip {
        rotation: RotationId,
        expected: crate::model::Time,
        actual: crate::model::Time,
    },
    /// A vehicle's SoC went negative.
    SocUnderflow {
        vehicle: VehicleId,
        at: crate::model::Time,
    },
}

impl SimOutcome {
    /// True if this run should be accepted by the capacity sizer.
    pub fn is_feasible(&self) -> bool {
        matches!(self, SimOutcome::Ok(_))
    }
}

impl fmt::Display for SimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimOutcome::Ok(_) => write!(f, "ok"),
            SimOutcome::Unstable => write!(f, "unstable: new vehicle required mid steady-state"),
            SimOutcome::DelayedTrip {
                rotation,
                expected,
                actual,
            } => write!(
                f,
                "delayed trip on rotation {}: expected t={expected}, actual t={actual}",
                rotation.0
            ),
            SimOutcome::SocUnderflow { vehicle, at } => {
                write!(f, "soc underflow on vehicle {} at t={at}", vehicle.0)
            }
        }
    }
}

/// Raised by the capacity sizer (C6) when no configuration could be found.
#[derive(Debug, Clone, PartialEq)]
pub enum SizingError {
    /// The sizer was asked to synthesize an area type it cannot derive a
    /// formula for (currently: `DIRECT_TWOSIDE`, matching the original's
    /// `NotImplementedError`).
    Unsupported(&'static str),
    /// Phase B exhausted every line-area count without finding a feasible,
    /// non-regressive configuration.
    NoFeasibleConfiguration,
}

impl fmt::Display for SizingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingError::Unsupported(what) => write!(f, "sizing unsupported: {what}"),
            SizingError::NoFeasibleConfiguration => {
                write!(f, "no feasible depot configuration found")
            }
        }
    }
}

impl std::error::Error for SizingError {}

/// Raised by the bin-packing layout engine (C7).
#[derive(Debug, Clone, PartialEq)]
pub enum PackingError {
    PlacementFailed {
        rect_w: f64,
        rect_h: f64,
        footprint_w: f64,
        footprint_h: f64,
    },
}

impl fmt::Display for PackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackingError::PlacementFailed {
                rect_w,
                rect_h,
                footprint_w,
                footprint_h,
            } => write!(
                f,
                "placement failed: rectangle {rect_w}x{rect_h} does not fit footprint {footprint_w}x{footprint_h}"
            ),
        }
    }
}

impl std::error::Error for PackingError {}

/// Raised by the peak-shaving optimizer (C8).
#[derive(Debug, Clone, PartialEq)]
pub enum SmartChargingError {
    /// No MILP solver compiled in and the greedy fallback also unavailable
    /// (never actually constructed today — the fallback is always present —
    /// kept so C8's public signature matches `spec.md` §7's error table).
    SolverUnavailable,
    /// The ILP instance had no feasible solution.
    Infeasible,
}

impl fmt::Display for SmartChargingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmartChargingError::SolverUnavailable => write!(f, "no MILP solver available"),
            SmartChargingError::Infeasible => write!(f, "peak-shaving ILP is infeasible"),
        }
    }
}

impl std::error::Error for SmartChargingError {}
