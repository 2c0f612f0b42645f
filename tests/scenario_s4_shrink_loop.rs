//! Packing against a generously oversized explicit footprint shrinks it
//! down toward what the areas actually need, rather than reporting the
//! oversized footprint back unchanged.
mod common;

use depot_sim::config::PackingParams;
use depot_sim::layout::layout_depot;
use depot_sim::model::area::{Area, AreaId, AreaType};
use depot_sim::model::process::ProcessKind;

fn direct_area(id: u32, capacity: u32) -> Area {
    Area::new(AreaId(id), AreaType::DirectOneside, capacity, None, vec![ProcessKind::Standby], false).unwrap()
}

#[test]
fn shrinks_an_oversized_footprint_down_from_the_supplied_bound() {
    let areas = vec![(direct_area(1, 4), 10.0, 6.0), (direct_area(2, 6), 12.0, 7.0)];
    let packing = PackingParams::default();

    let oversized_footprint = (500.0, 500.0);
    let result = layout_depot(&areas, Some(oversized_footprint), &packing, 8.0).unwrap();

    assert!(result.footprint.w < oversized_footprint.0);
    assert!(result.footprint.h < oversized_footprint.1);

    // The shrunk footprint must still be large enough to actually hold
    // everything that got placed in it.
    for placement in &result.placements {
        assert!(placement.rect.right() <= result.footprint.w + 1e-6);
        assert!(placement.rect.top() <= result.footprint.h + 1e-6);
    }
}
