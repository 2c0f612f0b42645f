//! Electric-bus depot sizing and simulation.
//!
//! Given a fleet schedule (rotations of trips) and a depot template (areas
//! and the plan every bus follows through them), this crate answers three
//! questions: how many parking slots of each kind does the depot need
//! ([`sizing`]), how should those slots be arranged on the ground
//! ([`layout`]), and how should charging power be scheduled to avoid
//! needless demand peaks ([`smart_charging`]). The discrete-event simulator
//! in [`sim`] backs all three.

pub mod cli;
/// TOML-backed `SizingParams`/`PackingParams`/`SmartChargingParams` and presets.
pub mod config;
pub mod error;
/// I/O: CSV export of event logs and layout rectangles.
pub mod io;
/// Bin-packing layout engine (C7): places area rectangles on the depot floor.
pub mod layout;
/// Plain-data domain entities (vehicles, rotations, areas, processes, events).
pub mod model;
/// Human-readable summary and KPI printing.
pub mod reporting;
/// The scenario repository: loads a `ScenarioSnapshot` from CSV/TOML.
pub mod scenario;
/// Discrete-event simulation engine and its supporting primitives (C1–C5).
pub mod sim;
/// Capacity sizer (C6): converges on the minimum depot configuration.
pub mod sizing;
/// Peak-shaving optimizer (C8): reshapes charging power to cut coincident peaks.
pub mod smart_charging;

/// Read-only HTTP view of a finished `ResultBundle` (feature-gated).
#[cfg(feature = "api")]
pub mod api;
/// Terminal dashboard over a finished `ResultBundle` (feature-gated).
#[cfg(feature = "tui")]
pub mod tui;
