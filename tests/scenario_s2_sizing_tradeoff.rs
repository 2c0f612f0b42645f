//! Sizing picks a real layout (never DIRECT_TWOSIDE, which this crate
//! doesn't synthesize) and never shrinks its chosen capacity when more
//! rotations compete for the same standby area.
mod common;

use common::{day_sizing, single_trip_rotation, standard_vehicle_type};
use depot_sim::model::area::AreaType;
use depot_sim::sizing::{area_needed_for_vehicle_parking, size_vehicle_type};

#[test]
fn more_contention_never_shrinks_the_chosen_capacity_or_footprint() {
    let vt = standard_vehicle_type();
    let sizing = day_sizing();

    let light_rotations = vec![single_trip_rotation(1, 6 * 3600, 7 * 3600, 15.0)];
    let heavy_rotations = vec![
        single_trip_rotation(1, 6 * 3600, 7 * 3600, 15.0),
        single_trip_rotation(2, 6 * 3600 + 300, 7 * 3600 + 300, 15.0),
        single_trip_rotation(3, 6 * 3600 + 600, 7 * 3600 + 600, 15.0),
        single_trip_rotation(4, 6 * 3600 + 900, 7 * 3600 + 900, 15.0),
    ];

    let light = size_vehicle_type(&vt, &light_rotations, &sizing).unwrap();
    let heavy = size_vehicle_type(&vt, &heavy_rotations, &sizing).unwrap();

    for area in light.areas.iter().chain(heavy.areas.iter()) {
        assert!(!matches!(area.area_type, AreaType::DirectTwoside));
    }
    assert!(heavy.total_capacity() >= light.total_capacity());
    assert!(heavy.floor_area_m2() >= light.floor_area_m2() - 1e-6);

    // Every area's reported footprint always matches what the formula for
    // that layout type produces at the chosen capacity.
    for area in &heavy.areas {
        let (w, h) =
            area_needed_for_vehicle_parking(area.area_type, &vt, area.capacity, &sizing).unwrap();
        assert!((w * h - area.floor_area_m2()).abs() < 1e-6);
    }
}
