//! Laying out a multi-area depot footprint (shunt/clean/charge plus a
//! per-type standby area) never overlaps any two non-driveway placements.
mod common;

use common::{day_sizing, standard_vehicle_type};
use depot_sim::layout::layout_depot;
use depot_sim::layout::rect::Rect;
use depot_sim::model::area::{Area, AreaId, AreaType};
use depot_sim::model::process::{ProcessKind, ServiceKind};
use depot_sim::sizing::area_needed_for_vehicle_parking;
use depot_sim::config::PackingParams;

fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && b.x < a.right() && a.y < b.top() && b.y < a.top()
}

#[test]
fn packed_areas_never_overlap_each_other() {
    let vt = standard_vehicle_type();
    let sizing = day_sizing();

    let shunt = Area::new(
        AreaId(1),
        AreaType::DirectOneside,
        10,
        None,
        vec![ProcessKind::Service(ServiceKind::Shunt)],
        false,
    )
    .unwrap();
    let clean = Area::new(
        AreaId(2),
        AreaType::DirectOneside,
        10,
        None,
        vec![ProcessKind::Service(ServiceKind::Clean)],
        false,
    )
    .unwrap();
    let charge = Area::new(
        AreaId(3),
        AreaType::DirectOneside,
        10,
        None,
        vec![ProcessKind::Charge],
        false,
    )
    .unwrap();
    let (standby_w, standby_h) =
        area_needed_for_vehicle_parking(AreaType::Line { block_length: 6 }, &vt, 12, &sizing).unwrap();
    let standby = Area::new(
        AreaId(4),
        AreaType::Line { block_length: 6 },
        12,
        Some(vt.id),
        vec![ProcessKind::StandbyDeparture],
        true,
    )
    .unwrap();

    let (shunt_w, shunt_h) = (20.0, 4.0);
    let (clean_w, clean_h) = (20.0, 4.0);
    let (charge_w, charge_h) = (20.0, 4.0);

    let areas = vec![
        (shunt, shunt_w, shunt_h),
        (clean, clean_w, clean_h),
        (charge, charge_w, charge_h),
        (standby, standby_w, standby_h),
    ];

    let packing = PackingParams::default();
    let result = layout_depot(&areas, None, &packing, 8.0).unwrap();

    // Border driveways legitimately overlap each other at the four corners,
    // so only check pairs where at least one side is a real area placement.
    for i in 0..result.placements.len() {
        for j in (i + 1)..result.placements.len() {
            let (a, b) = (&result.placements[i], &result.placements[j]);
            if a.is_driveway && b.is_driveway {
                continue;
            }
            assert!(
                !overlaps(&a.rect, &b.rect),
                "placements {i} and {j} overlap: {:?} vs {:?}",
                a.rect,
                b.rect
            );
        }
    }

    let placed_count = result.placements.iter().filter(|p| !p.is_driveway).count();
    assert_eq!(placed_count, 4);
    let driveway_count = result.placements.iter().filter(|p| p.is_driveway).count();
    assert_eq!(driveway_count, 4);
}
