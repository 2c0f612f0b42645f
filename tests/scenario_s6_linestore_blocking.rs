//! A LINE standby area forces nose-to-tail parking: a vehicle parked
//! behind another at the border cannot be dispatched until whatever is in
//! front of it clears. Exercised through the full simulator, not just the
//! `LineStore` unit tests in `sim/store.rs`.
mod common;

use common::standard_vehicle_type;
use depot_sim::config::SizingParams;
use depot_sim::error::SimOutcome;
use depot_sim::model::area::{Area, AreaId, AreaType};
use depot_sim::model::depot::{Depot, Plan};
use depot_sim::model::process::{Process, ProcessKind};
use depot_sim::model::rotation::{Rotation, Trip};
use depot_sim::model::RotationId;
use depot_sim::sim::engine::simulate;

const STANDBY_AREA: AreaId = AreaId(1);

fn line_depot(block_length: u32, capacity: u32) -> Depot {
    let standby = Area::new(
        STANDBY_AREA,
        AreaType::Line { block_length },
        capacity,
        None,
        vec![ProcessKind::StandbyDeparture],
        true,
    )
    .unwrap();

    let plan = Plan::new(vec![Process {
        kind: ProcessKind::StandbyDeparture,
        duration: None,
        electric_power_kw: None,
        resource_capacity: None,
        resource_switch: None,
        preemptable: false,
        dispatchable: true,
    }]);

    Depot::new("line-depot", plan, vec![standby])
}

fn rotation(id: u32, departure: i64, arrival: i64) -> Rotation {
    Rotation::new(
        RotationId(id),
        depot_sim::model::vehicle_type::VehicleTypeId(1),
        vec![Trip {
            departure,
            arrival,
            distance_km: 5.0,
            route: "line".to_string(),
            soc_start: None,
            soc_end: None,
        }],
    )
    .unwrap()
}

#[test]
fn a_full_block_length_line_area_still_simulates_feasibly() {
    let vt = standard_vehicle_type();
    let depot = line_depot(3, 3);

    // Three vehicles park nose-to-tail in a single 3-deep lane and must
    // depart in reverse arrival order (LIFO) to avoid needing to move a
    // vehicle in front of another out of the way.
    let rotations = vec![
        rotation(1, 6 * 3600, 7 * 3600),
        rotation(2, 9 * 3600, 10 * 3600),
        rotation(3, 12 * 3600, 13 * 3600),
    ];
    let sizing = SizingParams {
        repetition_period: depot_sim::config::RepetitionPeriod::Day,
        ..SizingParams::default()
    };

    let outcome = simulate(&depot, std::slice::from_ref(&vt), &rotations, &sizing);
    match outcome {
        SimOutcome::Ok(bundle) => {
            assert!(bundle.area_peak(STANDBY_AREA) <= 3);
            assert!(!bundle.events.is_empty());
        }
        other => panic!("expected a feasible LINE-area steady state, got {other:?}"),
    }
}

#[test]
fn an_undersized_line_area_is_reported_as_infeasible_rather_than_silently_wrong() {
    let vt = standard_vehicle_type();
    // Only one slot for three vehicles that all need to be parked at once
    // — the depot cannot sustain this schedule.
    let depot = line_depot(1, 1);
    let rotations = vec![
        rotation(1, 6 * 3600, 6 * 3600 + 60),
        rotation(2, 6 * 3600 + 120, 6 * 3600 + 180),
        rotation(3, 6 * 3600 + 240, 6 * 3600 + 300),
    ];
    let sizing = SizingParams {
        repetition_period: depot_sim::config::RepetitionPeriod::Day,
        ..SizingParams::default()
    };

    let outcome = simulate(&depot, std::slice::from_ref(&vt), &rotations, &sizing);
    assert!(!outcome.is_feasible());
}
