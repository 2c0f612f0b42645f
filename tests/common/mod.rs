//! Shared fixtures for integration tests: a standard vehicle type, simple
//! single-trip rotations, and default param sets, mirroring the private
//! fixtures `sizing.rs`'s own unit tests already use.
#![allow(dead_code)]

use depot_sim::config::{PackingParams, RepetitionPeriod, SizingParams};
use depot_sim::model::rotation::{Rotation, Trip};
use depot_sim::model::vehicle_type::{ChargeCurvePoint, VehicleType, VehicleTypeId};
use depot_sim::model::RotationId;

pub fn standard_vehicle_type() -> VehicleType {
    VehicleType::new(
        VehicleTypeId(1),
        "std",
        300.0,
        vec![
            ChargeCurvePoint { soc: 0.0, power_kw: 150.0 },
            ChargeCurvePoint { soc: 1.0, power_kw: 20.0 },
        ],
        1.0,
        12.0,
        2.5,
        false,
    )
    .unwrap()
}

pub fn single_trip_rotation(id: u32, departure: i64, arrival: i64, distance_km: f64) -> Rotation {
    Rotation::new(
        RotationId(id),
        VehicleTypeId(1),
        vec![Trip {
            departure,
            arrival,
            distance_km,
            route: "1".to_string(),
            soc_start: None,
            soc_end: None,
        }],
    )
    .unwrap()
}

pub fn day_sizing() -> SizingParams {
    SizingParams {
        repetition_period: RepetitionPeriod::Day,
        ..SizingParams::default()
    }
}

pub fn default_packing() -> PackingParams {
    PackingParams::default()
}
