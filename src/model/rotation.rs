//! Rotations and trips: the fleet schedule the depot must turn buses around for.

use serde::{Deserialize, Serialize};

use super::vehicle_type::VehicleTypeId;
use super::Time;

/// Identifies a [`Rotation`] within a [`crate::scenario::ScenarioSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RotationId(pub u32);

/// One timetabled movement between two stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub departure: Time,
    pub arrival: Time,
    pub distance_km: f64,
    pub route: String,
    /// SoC at the start of this trip. `None` until resolved by the
    /// upstream consumption model or the simulator's fallback
    /// (`spec.md` §6: "if DRIVING events are missing, compute from
    /// `vehicle_type.consumption * trip.distance`").
    pub soc_start: Option<f64>,
    pub soc_end: Option<f64>,
}

impl Trip {
    /// Fills in `soc_start`/`soc_end` from the vehicle type's consumption
    /// model when the scenario repository did not supply them, starting
    /// from `soc_at_departure`. Returns the SoC at trip end.
    pub fn resolve_soc(&mut self, vehicle_type: &super::VehicleType, soc_at_departure: f64) -> f64 {
        let start = self.soc_start.unwrap_or(soc_at_departure);
        let consumed_kwh = vehicle_type.energy_for_distance_kwh(self.distance_km);
        let end = (start - consumed_kwh / vehicle_type.battery_capacity_kwh).max(0.0);
        self.soc_start.get_or_insert(start);
        self.soc_end.get_or_insert(end);
        self.soc_end.unwrap_or(end)
    }
}

/// An ordered sequence of trips a single vehicle covers in one cycle,
/// starting and ending at the same depot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub id: RotationId,
    pub vehicle_type: VehicleTypeId,
    pub trips: Vec<Trip>,
}

impl Rotation {
    /// Builds a rotation. Fails if `trips` is empty (`spec.md` §3: "ordered
    /// sequence of trips (≥ 1)").
    pub fn new(
        id: RotationId,
        vehicle_type: VehicleTypeId,
        trips: Vec<Trip>,
    ) -> Result<Self, crate::error::InvalidConfig> {
        if trips.is_empty() {
            return Err(crate::error::InvalidConfig {
                field: "rotation.trips",
                message: "must have at least one trip".to_string(),
            });
        }
        Ok(Self {
            id,
            vehicle_type,
            trips,
        })
    }

    pub fn departure(&self) -> Time {
        self.trips[0].departure
    }

    pub fn arrival(&self) -> Time {
        self.trips[self.trips.len() - 1].arrival
    }

    /// Total distance covered by this rotation, km.
    pub fn total_distance_km(&self) -> f64 {
        self.trips.iter().map(|t| t.distance_km).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vehicle_type::{ChargeCurvePoint, VehicleType};

    fn trip(dep: Time, arr: Time, km: f64) -> Trip {
        Trip {
            departure: dep,
            arrival: arr,
            distance_km: km,
            route: "12".to_string(),
            soc_start: None,
            soc_end: None,
        }
    }

    #[test]
    fn rejects_empty_trip_list() {
        let err = Rotation::new(RotationId(1), VehicleTypeId(1), vec![]);
        assert!(err.is_err());
    }

    #[test]
    fn departure_and_arrival_span_all_trips() {
        let r = Rotation::new(
            RotationId(1),
            VehicleTypeId(1),
            vec![trip(0, 1000, 5.0), trip(1200, 2000, 5.0)],
        )
        .unwrap();
        assert_eq!(r.departure(), 0);
        assert_eq!(r.arrival(), 2000);
        assert!((r.total_distance_km() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn resolve_soc_consumes_battery() {
        let vt = VehicleType::new(
            VehicleTypeId(1),
            "std",
            100.0,
            vec![
                ChargeCurvePoint { soc: 0.0, power_kw: 50.0 },
                ChargeCurvePoint { soc: 1.0, power_kw: 50.0 },
            ],
            1.0,
            12.0,
            2.5,
            false,
        )
        .unwrap();
        let mut t = trip(0, 1000, 10.0);
        let end = t.resolve_soc(&vt, 1.0);
        // 10 km * 1.0 kWh/km = 10 kWh consumed from a 100 kWh battery -> 0.9
        assert!((end - 0.9).abs() < 1e-9);
        assert_eq!(t.soc_start, Some(1.0));
    }
}
