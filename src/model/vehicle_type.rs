//! Vehicle type definitions: capacity, charge curve, consumption, geometry.

use serde::{Deserialize, Serialize};

/// Identifies a [`VehicleType`] within a [`crate::scenario::ScenarioSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleTypeId(pub u32);

/// One point on a piecewise-linear charge-power-vs-SoC curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeCurvePoint {
    /// State of charge in `[0, 1]`.
    pub soc: f64,
    /// Charge power available at this SoC, in kW.
    pub power_kw: f64,
}

/// A class of bus: battery size, charge curve, consumption, and footprint.
///
/// `charge_curve` must be sorted ascending by `soc` and cover `[0.0, 1.0]`;
/// [`VehicleType::charge_power_kw`] interpolates linearly between points and
/// clamps at the ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleType {
    pub id: VehicleTypeId,
    pub name: String,
    /// Usable battery capacity, kWh.
    pub battery_capacity_kwh: f64,
    /// Piecewise-linear charge power curve, SoC → kW.
    pub charge_curve: Vec<ChargeCurvePoint>,
    /// Energy consumption, kWh per km.
    pub consumption_kwh_per_km: f64,
    /// Vehicle length, meters.
    pub length_m: f64,
    /// Vehicle width, meters.
    pub width_m: f64,
    /// Whether this type can receive opportunity charging mid-rotation.
    pub opportunity_charging_capable: bool,
}

impl VehicleType {
    /// Builds a vehicle type, validating the charge curve is non-empty and
    /// sorted by ascending SoC. Construction errors are fatal to the caller
    /// per `spec.md` §7 (`InvalidConfig` is never reached at runtime).
    pub fn new(
        id: VehicleTypeId,
        name: impl Into<String>,
        battery_capacity_kwh: f64,
        charge_curve: Vec<ChargeCurvePoint>,
        consumption_kwh_per_km: f64,
        length_m: f64,
        width_m: f64,
        opportunity_charging_capable: bool,
    ) -> Result<Self, crate::error::InvalidConfig> {
        if battery_capacity_kwh <= 0.0 {
            return Err(crate::error::InvalidConfig {
                field: "vehicle_type.battery_capacity_kwh",
                message: "must be > 0".to_string(),
            });
        }
        if charge_curve.is_empty() {
            return Err(crate::error::InvalidConfig {
                field: "vehicle_type.charge_curve",
                message: "must have at least one point".to_string(),
            });
        }
        if !charge_curve.windows(2).all(|w| w[0].soc <= w[1].soc) {
            return Err(crate::error::InvalidConfig {
                field: "vehicle_type.charge_curve",
                message: "must be sorted by ascending soc".to_string(),
            });
        }
        if length_m <= 0.0 || width_m <= 0.0 {
            return Err(crate::error::InvalidConfig {
                field: "vehicle_type.length_m/width_m",
                message: "must be > 0".to_string(),
            });
        }
        Ok(Self {
            id,
            name: name.into(),
            battery_capacity_kwh,
            charge_curve,
            consumption_kwh_per_km,
            length_m,
            width_m,
            opportunity_charging_capable,
        })
    }

    /// Charge power available at a given SoC, linearly interpolated.
    pub fn charge_power_kw(&self, soc: f64) -> f64 {
        let soc = soc.clamp(0.0, 1.0);
        let curve = &self.charge_curve;
        if soc <= curve[0].soc {
            return curve[0].power_kw;
        }
        if soc >= curve[curve.len() - 1].soc {
            return curve[curve.len() - 1].power_kw;
        }
        for w in curve.windows(2) {
            let (a, b) = (w[0], w[1]);
            if soc >= a.soc && soc <= b.soc {
                if (b.soc - a.soc).abs() < f64::EPSILON {
                    return a.power_kw;
                }
                let t = (soc - a.soc) / (b.soc - a.soc);
                return a.power_kw + t * (b.power_kw - a.power_kw);
            }
        }
        curve[curve.len() - 1].power_kw
    }

    /// Energy consumed driving `distance_km`.
    pub fn energy_for_distance_kwh(&self, distance_km: f64) -> f64 {
        self.consumption_kwh_per_km * distance_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VehicleType {
        VehicleType::new(
            VehicleTypeId(1),
            "articulated_18m",
            300.0,
            vec![
                ChargeCurvePoint { soc: 0.0, power_kw: 150.0 },
                ChargeCurvePoint { soc: 0.8, power_kw: 150.0 },
                ChargeCurvePoint { soc: 1.0, power_kw: 20.0 },
            ],
            1.2,
            18.0,
            2.55,
            false,
        )
        .expect("sample vehicle type should be valid")
    }

    #[test]
    fn rejects_empty_charge_curve() {
        let err = VehicleType::new(VehicleTypeId(1), "x", 300.0, vec![], 1.0, 12.0, 2.5, false);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_unsorted_charge_curve() {
        let curve = vec![
            ChargeCurvePoint { soc: 0.5, power_kw: 100.0 },
            ChargeCurvePoint { soc: 0.1, power_kw: 150.0 },
        ];
        let err = VehicleType::new(VehicleTypeId(1), "x", 300.0, curve, 1.0, 12.0, 2.5, false);
        assert!(err.is_err());
    }

    #[test]
    fn interpolates_charge_power() {
        let vt = sample();
        assert_eq!(vt.charge_power_kw(0.0), 150.0);
        assert_eq!(vt.charge_power_kw(0.8), 150.0);
        let mid = vt.charge_power_kw(0.9);
        assert!((mid - 85.0).abs() < 1e-6);
        assert_eq!(vt.charge_power_kw(1.0), 20.0);
    }

    #[test]
    fn clamps_out_of_range_soc() {
        let vt = sample();
        assert_eq!(vt.charge_power_kw(-0.5), vt.charge_power_kw(0.0));
        assert_eq!(vt.charge_power_kw(1.5), vt.charge_power_kw(1.0));
    }

    #[test]
    fn energy_for_distance_scales_linearly() {
        let vt = sample();
        assert!((vt.energy_for_distance_kwh(10.0) - 12.0).abs() < 1e-9);
    }
}
