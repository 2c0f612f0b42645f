//! Terse, human-readable summaries printed at the end of a CLI run.

use crate::layout::LayoutResult;
use crate::sim::materializer::ResultBundle;
use crate::sizing::VehicleTypeSizing;

pub fn print_sizing_report(sizes: &[VehicleTypeSizing]) {
    println!("\n--- Fleet Sizing ---");
    for s in sizes {
        println!(
            "vehicle_type {}: fleet_size={} total_capacity={} footprint={:.1} m2",
            s.vehicle_type.0,
            s.fleet_size,
            s.total_capacity(),
            s.floor_area_m2(),
        );
        for area in &s.areas {
            println!(
                "    {:?} capacity={} {:.1}x{:.1}m",
                area.area_type, area.capacity, area.width_m, area.height_m,
            );
        }
    }
}

pub fn print_layout_report(layout: &LayoutResult) {
    let placed = layout.placements.iter().filter(|p| !p.is_driveway).count();
    let driveways = layout.placements.iter().filter(|p| p.is_driveway).count();
    println!("\n--- Depot Layout ---");
    println!(
        "footprint: {:.1}x{:.1}m ({} areas, {} driveway segments)",
        layout.footprint.w, layout.footprint.h, placed, driveways
    );
}

pub fn print_area_occupancy_report(bundle: &ResultBundle) {
    println!("\n--- Area Occupancy Peaks ---");
    for peak in &bundle.area_peaks {
        println!("area {}: peak={} at t={}s", peak.area.0, peak.peak, peak.at);
    }
}

pub fn print_smart_charging_report(before_kw: f64, after_kw: f64) {
    println!("\n--- Smart Charging ---");
    println!("peak charging power before: {before_kw:.1} kW");
    println!("peak charging power after:  {after_kw:.1} kW");
    if before_kw > 0.0 {
        let reduction_pct = 100.0 * (before_kw - after_kw) / before_kw;
        println!("peak reduction: {reduction_pct:.1}%");
    }
}
