//! CSV export of event logs and layout rectangles.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::layout::LayoutResult;
use crate::model::event::Event;

/// Schema v1 column header for event-log CSV export.
const EVENTS_HEADER: &str = "vehicle,rotation,kind,area,slot_index,\
                              time_start,time_end,soc_start,soc_end";

/// Schema v1 column header for layout CSV export.
const LAYOUT_HEADER: &str = "area,x,y,w,h,is_driveway";

/// Exports an event log to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_events_csv(events: &[Event], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_events_csv(events, buf)
}

/// Writes an event log as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_events_csv(events: &[Event], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(EVENTS_HEADER.split(',').map(str::trim))?;

    for e in events {
        wtr.write_record(&[
            e.vehicle.0.to_string(),
            e.rotation.map_or(String::new(), |r| r.0.to_string()),
            format!("{:?}", e.kind),
            e.area.map_or(String::new(), |a| a.0.to_string()),
            e.slot_index.map_or(String::new(), |s| s.to_string()),
            e.time_start.to_string(),
            e.time_end.to_string(),
            format!("{:.6}", e.soc_start),
            format!("{:.6}", e.soc_end),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports a packed layout's placements to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_layout_csv(layout: &LayoutResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_layout_csv(layout, buf)
}

/// Writes a packed layout's placements as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_layout_csv(layout: &LayoutResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(LAYOUT_HEADER.split(',').map(str::trim))?;

    for p in &layout.placements {
        wtr.write_record(&[
            p.area.0.to_string(),
            format!("{:.3}", p.rect.x),
            format!("{:.3}", p.rect.y),
            format!("{:.3}", p.rect.w),
            format!("{:.3}", p.rect.h),
            p.is_driveway.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
