//! Smart charging reshapes two coincident full-power CHARGE events so the
//! single highest coincident load drops, without changing either vehicle's
//! delivered energy.
mod common;

use std::collections::HashMap;

use common::standard_vehicle_type;
use depot_sim::config::{SmartChargingParams, SmartChargingStrategy};
use depot_sim::model::area::AreaId;
use depot_sim::model::event::{Event, EventKind};
use depot_sim::model::vehicle::VehicleId;
use depot_sim::sim::materializer::ResultBundle;
use depot_sim::smart_charging::{optimize, peak_charging_power_kw};

fn charge_event(vehicle: u32, start: i64, end: i64, soc_start: f64, soc_end: f64) -> Event {
    Event {
        vehicle: VehicleId(vehicle),
        rotation: None,
        kind: EventKind::Charge,
        area: Some(AreaId(3)),
        slot_index: Some(0),
        time_start: start,
        time_end: end,
        soc_start,
        soc_end,
        soc_timeseries: None,
    }
}

#[test]
fn coincident_charge_events_spread_out_to_cut_the_peak() {
    let vt = standard_vehicle_type();

    // Two vehicles both charge hard over the exact same hour — the worst
    // case for coincident demand — but each has four hours of slack before
    // its STANDBY_DEPARTURE, room enough to spread the load thinner.
    let events = vec![
        charge_event(1, 0, 3600, 0.2, 0.8),
        charge_event(2, 0, 3600, 0.2, 0.8),
        Event {
            vehicle: VehicleId(1),
            rotation: None,
            kind: EventKind::StandbyDeparture,
            area: Some(AreaId(4)),
            slot_index: Some(0),
            time_start: 3600,
            time_end: 3600 + 4 * 3600,
            soc_start: 0.8,
            soc_end: 0.8,
            soc_timeseries: None,
        },
        Event {
            vehicle: VehicleId(2),
            rotation: None,
            kind: EventKind::StandbyDeparture,
            area: Some(AreaId(4)),
            slot_index: Some(0),
            time_start: 3600,
            time_end: 3600 + 4 * 3600,
            soc_start: 0.8,
            soc_end: 0.8,
            soc_timeseries: None,
        },
    ];

    let period = 8 * 3600;
    let bundle = ResultBundle { events: events.clone(), period, area_peaks: vec![] };

    let mut vehicle_type_of = HashMap::new();
    vehicle_type_of.insert(VehicleId(1), vt.id);
    vehicle_type_of.insert(VehicleId(2), vt.id);

    let params = SmartChargingParams {
        strategy: SmartChargingStrategy::Even,
        time_step_s: 900,
        power_quantum_kw: 10.0,
        min_standby_departure_s: 300,
    };

    let mut vt_map = HashMap::new();
    vt_map.insert(vt.id, &vt);

    let peak_before =
        peak_charging_power_kw(&events, &vehicle_type_of, &vt_map, period, params.time_step_s);

    let optimized = optimize(&bundle, &vehicle_type_of, std::slice::from_ref(&vt), &params).unwrap();
    let peak_after = peak_charging_power_kw(
        &optimized.events,
        &vehicle_type_of,
        &vt_map,
        optimized.period,
        params.time_step_s,
    );

    assert!(peak_after <= peak_before + 1e-6);

    // Delivered energy is preserved exactly for both vehicles.
    for vehicle in [1u32, 2u32] {
        let original = events
            .iter()
            .find(|e| e.vehicle == VehicleId(vehicle) && e.kind == EventKind::Charge)
            .unwrap();
        let reshaped = optimized
            .events
            .iter()
            .find(|e| e.vehicle == VehicleId(vehicle) && e.kind == EventKind::ChargingDepot)
            .unwrap();
        let delivered = reshaped.soc_timeseries.as_ref().unwrap().last().unwrap().soc;
        assert!((delivered - original.soc_end).abs() < 1e-6);
    }
}
