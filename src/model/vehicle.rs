//! Vehicles: individual buses tracked across the simulation.

use serde::{Deserialize, Serialize};

use super::area::AreaId;
use super::vehicle_type::VehicleTypeId;
use super::Time;

/// Identifies a [`Vehicle`], assigned when it is lazily created
/// (`spec.md` §3: "Vehicles are created lazily when an outbound rotation
/// needs one and none is ready").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub u32);

/// Where a vehicle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VehicleLocation {
    InSlot { area: AreaId, slot: u32 },
    /// Neither on a trip nor in a depot area: the virtual waiting area
    /// (`spec.md` §4.4).
    Waiting,
    OnTrip,
}

/// One entry in a vehicle's immutable battery log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryLogEntry {
    pub time: Time,
    pub soc: f64,
}

/// An individual bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub vehicle_type: VehicleTypeId,
    pub soc: f64,
    pub location: VehicleLocation,
    /// Append-only; never rewritten once pushed (`spec.md` §3).
    pub battery_log: Vec<BatteryLogEntry>,
}

impl Vehicle {
    pub fn new(id: VehicleId, vehicle_type: VehicleTypeId, initial_soc: f64, at: Time) -> Self {
        Self {
            id,
            vehicle_type,
            soc: initial_soc,
            location: VehicleLocation::Waiting,
            battery_log: vec![BatteryLogEntry {
                time: at,
                soc: initial_soc,
            }],
        }
    }

    /// Appends a battery-log entry and updates current SoC. Panics if
    /// `at` precedes the last logged time — the log must be monotonic in
    /// time (`spec.md` P5).
    pub fn log_soc(&mut self, at: Time, soc: f64) {
        if let Some(last) = self.battery_log.last() {
            assert!(
                at >= last.time,
                "battery log must be monotonic in time: {at} < {}",
                last.time
            );
        }
        self.soc = soc;
        self.battery_log.push(BatteryLogEntry { time: at, soc });
    }

    /// Linear interpolation of SoC at an arbitrary time between two logged
    /// points, used by the result materializer (C5) to set event
    /// boundaries.
    pub fn interpolated_soc_at(&self, at: Time) -> f64 {
        if self.battery_log.is_empty() {
            return self.soc;
        }
        if at <= self.battery_log[0].time {
            return self.battery_log[0].soc;
        }
        let last = self.battery_log.len() - 1;
        if at >= self.battery_log[last].time {
            return self.battery_log[last].soc;
        }
        for w in self.battery_log.windows(2) {
            let (a, b) = (w[0], w[1]);
            if at >= a.time && at <= b.time {
                if b.time == a.time {
                    return a.soc;
                }
                let t = (at - a.time) as f64 / (b.time - a.time) as f64;
                return a.soc + t * (b.soc - a.soc);
            }
        }
        self.soc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_vehicle_starts_waiting_with_one_log_entry() {
        let v = Vehicle::new(VehicleId(1), VehicleTypeId(1), 1.0, 0);
        assert_eq!(v.battery_log.len(), 1);
        assert!(matches!(v.location, VehicleLocation::Waiting));
    }

    #[test]
    #[should_panic]
    fn log_soc_rejects_non_monotonic_time() {
        let mut v = Vehicle::new(VehicleId(1), VehicleTypeId(1), 1.0, 100);
        v.log_soc(50, 0.9);
    }

    #[test]
    fn interpolated_soc_between_points() {
        let mut v = Vehicle::new(VehicleId(1), VehicleTypeId(1), 1.0, 0);
        v.log_soc(100, 0.5);
        let mid = v.interpolated_soc_at(50);
        assert!((mid - 0.75).abs() < 1e-9);
    }

    #[test]
    fn interpolated_soc_clamps_to_ends() {
        let mut v = Vehicle::new(VehicleId(1), VehicleTypeId(1), 1.0, 0);
        v.log_soc(100, 0.5);
        assert_eq!(v.interpolated_soc_at(-10), 1.0);
        assert_eq!(v.interpolated_soc_at(200), 0.5);
    }
}
