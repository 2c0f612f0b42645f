//! Fleet-wide sizing (`sizing::size_fleet`) sizes every vehicle type
//! independently and, with `calculate_exact_vehicle_count` set, never
//! reports more distinct vehicles than the parking capacity it chose.
mod common;

use std::collections::HashMap;

use common::{day_sizing, single_trip_rotation, standard_vehicle_type};
use depot_sim::config::SizingParams;
use depot_sim::model::vehicle_type::{ChargeCurvePoint, VehicleType, VehicleTypeId};
use depot_sim::model::rotation::{Rotation, Trip};
use depot_sim::model::RotationId;
use depot_sim::sizing::size_fleet;

fn second_vehicle_type() -> VehicleType {
    VehicleType::new(
        VehicleTypeId(2),
        "articulated",
        450.0,
        vec![
            ChargeCurvePoint { soc: 0.0, power_kw: 200.0 },
            ChargeCurvePoint { soc: 1.0, power_kw: 30.0 },
        ],
        1.4,
        18.0,
        2.55,
        false,
    )
    .unwrap()
}

fn rotation_for(id: u32, vehicle_type: VehicleTypeId, departure: i64, arrival: i64, distance_km: f64) -> Rotation {
    Rotation::new(
        RotationId(id),
        vehicle_type,
        vec![Trip {
            departure,
            arrival,
            distance_km,
            route: "2".to_string(),
            soc_start: None,
            soc_end: None,
        }],
    )
    .unwrap()
}

#[test]
fn sizes_each_vehicle_type_independently_with_exact_vehicle_counts() {
    let std_vt = standard_vehicle_type();
    let art_vt = second_vehicle_type();

    let std_rotations = vec![
        single_trip_rotation(1, 6 * 3600, 7 * 3600, 15.0),
        single_trip_rotation(2, 7 * 3600, 8 * 3600, 15.0),
        single_trip_rotation(3, 8 * 3600, 9 * 3600, 15.0),
    ];
    let art_rotations = vec![rotation_for(10, art_vt.id, 6 * 3600, 7 * 3600, 15.0)];

    let mut rotations_by_type: HashMap<VehicleTypeId, Vec<Rotation>> = HashMap::new();
    rotations_by_type.insert(std_vt.id, std_rotations);
    rotations_by_type.insert(art_vt.id, art_rotations);

    let sizing = SizingParams {
        calculate_exact_vehicle_count: true,
        ..day_sizing()
    };

    let sized = size_fleet(&[std_vt.clone(), art_vt.clone()], &rotations_by_type, &sizing).unwrap();

    assert_eq!(sized.len(), 2);
    for entry in &sized {
        assert!(entry.fleet_size <= entry.total_capacity());
        assert!(entry.fleet_size >= 1);
        assert!(entry.floor_area_m2() > 0.0);
        assert!(!entry.areas.is_empty());
    }

    let std_sizing = sized.iter().find(|s| s.vehicle_type == std_vt.id).unwrap();
    let art_sizing = sized.iter().find(|s| s.vehicle_type == art_vt.id).unwrap();
    assert!(std_sizing.total_capacity() >= 1);
    assert!(art_sizing.total_capacity() >= 1);
}
