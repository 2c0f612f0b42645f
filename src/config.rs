//! Configuration records for the sizer (C6), the layout engine (C7), and the
//! peak-shaving optimizer (C8), plus the top-level TOML-backed aggregate.
//!
//! Follows the teacher's `config.rs` pattern: nested `#[serde(default,
//! deny_unknown_fields)]` sections, manual `Default` impls, a hand-rolled
//! `ConfigError`, and a `validate()` that collects every violated constraint
//! rather than failing on the first (`spec.md` §9: "global module-level
//! constants → grouped into SizingParams/PackingParams configuration record").

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::model::area::AreaType;

/// How the schedule's steady-state repetition period is chosen
/// (`spec.md` §4.4, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepetitionPeriod {
    Day,
    Week,
    Auto,
}

impl Default for RepetitionPeriod {
    fn default() -> Self {
        RepetitionPeriod::Auto
    }
}

impl RepetitionPeriod {
    /// Resolves `Auto` against a schedule's span (seconds from first
    /// departure to last arrival), detecting a day (<= 36h) or week
    /// (otherwise) period. Explicit `Day`/`Week` pass through unchanged.
    pub fn resolve_seconds(self, schedule_span_s: i64) -> i64 {
        const DAY: i64 = 24 * 3600;
        const WEEK: i64 = 7 * DAY;
        match self {
            RepetitionPeriod::Day => DAY,
            RepetitionPeriod::Week => WEEK,
            RepetitionPeriod::Auto => {
                if schedule_span_s <= DAY + DAY / 4 {
                    DAY
                } else {
                    WEEK
                }
            }
        }
    }
}

/// Strategy knob for C8's post-simulation charging reshaping
/// (`spec.md` §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartChargingStrategy {
    None,
    Even,
}

impl Default for SmartChargingStrategy {
    fn default() -> Self {
        SmartChargingStrategy::None
    }
}

/// Parameters governing the capacity sizer (C6) and the geometry formulas
/// C6/C7 share (`spec.md` §4.6, `SPEC_FULL.md` §4.6).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizingParams {
    /// Vehicles nose-to-tail per LINE lane (`spec.md` §3).
    pub standard_block_length: u32,
    /// Driving-lane margin width, meters (`spec.md` §6).
    pub driving_lane_width: f64,
    /// DIRECT-area parking angle, degrees (`SPEC_FULL.md` §4.6).
    pub angle_deg: f64,
    /// Side-by-side clearance between parked vehicles, meters.
    pub side_by_side_spacing: f64,
    /// Front-to-back clearance between DIRECT rows, meters.
    pub front_to_back_spacing: f64,
    pub repetition_period: RepetitionPeriod,
    /// If true, re-run the sizer with the first pass's vehicle count fixed
    /// per type, to shake out over-provisioning (`spec.md` §6).
    pub calculate_exact_vehicle_count: bool,
    /// Minimum SoC fraction required at rotation start (`spec.md` §6).
    pub departure_soc_min: f64,
    /// Buffer added to other vehicle types' peak-direct count when sizing
    /// one type's configuration (`spec.md` §4.6 step 3).
    pub buffer_slots: u32,
}

impl Default for SizingParams {
    fn default() -> Self {
        Self {
            standard_block_length: 6,
            driving_lane_width: 8.0,
            angle_deg: 45.0,
            side_by_side_spacing: 1.0,
            front_to_back_spacing: 0.5,
            repetition_period: RepetitionPeriod::Auto,
            calculate_exact_vehicle_count: false,
            departure_soc_min: 0.8,
            buffer_slots: 5,
        }
    }
}

/// Per-`AreaType` driving-lane margins on each of the four edges, meters
/// (`spec.md` §4.7, Open Question Q3).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AreaMargins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl AreaMargins {
    pub const fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }
}

impl Default for AreaMargins {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

/// Parameters for the bin-packing layout engine (C7).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackingParams {
    /// Footprint-shrink step, meters (`spec.md` §4.7).
    pub reduction_step: f64,
    /// Margins for LINE areas.
    pub line_margins: AreaMargins,
    /// Margins for DIRECT_ONESIDE/DIRECT_TWOSIDE areas.
    pub direct_margins: AreaMargins,
    /// Minimum size, in either dimension, for a free rectangle to be kept
    /// rather than discarded as unusable (`spec.md` §4.7 step 4).
    pub min_free_rect_size: f64,
}

impl Default for PackingParams {
    fn default() -> Self {
        Self {
            reduction_step: 5.0,
            line_margins: AreaMargins::new(8.0, 8.0, 0.0, 0.0),
            direct_margins: AreaMargins::new(0.0, 0.0, 8.0, 0.0),
            min_free_rect_size: 0.5,
        }
    }
}

impl PackingParams {
    pub fn margins_for(&self, area_type: AreaType) -> AreaMargins {
        match area_type {
            AreaType::Line { .. } => self.line_margins,
            AreaType::DirectOneside | AreaType::DirectTwoside => self.direct_margins,
        }
    }
}

/// Parameters for the peak-shaving optimizer (C8).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmartChargingParams {
    pub strategy: SmartChargingStrategy,
    /// Quantization timestep, seconds (`spec.md` §6 default 5 min).
    pub time_step_s: i64,
    /// Quantization power packet, kW (`spec.md` §6 default 10 kW).
    pub power_quantum_kw: f64,
    /// Floor duration a STANDBY_DEPARTURE is shrunk to before its freed time
    /// is donated to the preceding CHARGE event, seconds (default 5 min).
    pub min_standby_departure_s: i64,
}

impl Default for SmartChargingParams {
    fn default() -> Self {
        Self {
            strategy: SmartChargingStrategy::None,
            time_step_s: 5 * 60,
            power_quantum_kw: 10.0,
            min_standby_departure_s: 5 * 60,
        }
    }
}

/// Top-level configuration aggregate, loaded from TOML or built in code via
/// the preset constructors.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    #[serde(default)]
    pub sizing: SizingParams,
    #[serde(default)]
    pub packing: PackingParams,
    #[serde(default)]
    pub smart_charging: SmartChargingParams,
}

/// Configuration error with field path and constraint description, in the
/// teacher's `ConfigError` shape (`spec.md` §9: hand-rolled, no `thiserror`).
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl SimConfig {
    pub fn baseline() -> Self {
        Self {
            sizing: SizingParams::default(),
            packing: PackingParams::default(),
            smart_charging: SmartChargingParams::default(),
        }
    }

    /// A preset tuned for a single vehicle type with smart charging enabled,
    /// used by the CLI demo and `tests/scenario_s1_exact_vehicle_count.rs`.
    pub fn single_type_demo() -> Self {
        Self {
            sizing: SizingParams {
                calculate_exact_vehicle_count: true,
                ..SizingParams::default()
            },
            packing: PackingParams::default(),
            smart_charging: SmartChargingParams {
                strategy: SmartChargingStrategy::Even,
                ..SmartChargingParams::default()
            },
        }
    }

    pub const PRESETS: &[&str] = &["baseline", "single_type_demo"];

    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "single_type_demo" => Ok(Self::single_type_demo()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields, collecting every violated constraint rather
    /// than stopping at the first.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.sizing;

        if s.standard_block_length == 0 {
            errors.push(ConfigError {
                field: "sizing.standard_block_length".into(),
                message: "must be > 0".into(),
            });
        }
        if !(0.0..90.0).contains(&s.angle_deg) {
            errors.push(ConfigError {
                field: "sizing.angle_deg".into(),
                message: "must be in (0, 90) degrees".into(),
            });
        }
        if !(0.0..=1.0).contains(&s.departure_soc_min) {
            errors.push(ConfigError {
                field: "sizing.departure_soc_min".into(),
                message: "must be in [0.0, 1.0]".into(),
            });
        }
        if s.driving_lane_width < 0.0 {
            errors.push(ConfigError {
                field: "sizing.driving_lane_width".into(),
                message: "must be >= 0".into(),
            });
        }

        let p = &self.packing;
        if p.reduction_step <= 0.0 {
            errors.push(ConfigError {
                field: "packing.reduction_step".into(),
                message: "must be > 0".into(),
            });
        }

        let sc = &self.smart_charging;
        if sc.time_step_s <= 0 {
            errors.push(ConfigError {
                field: "smart_charging.time_step_s".into(),
                message: "must be > 0".into(),
            });
        }
        if sc.power_quantum_kw <= 0.0 {
            errors.push(ConfigError {
                field: "smart_charging.power_quantum_kw".into(),
                message: "must be > 0".into(),
            });
        }
        if sc.min_standby_departure_s < 0 {
            errors.push(ConfigError {
                field: "smart_charging.min_standby_departure_s".into(),
                message: "must be >= 0".into(),
            });
        }

        errors
    }
}
