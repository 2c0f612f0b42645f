//! JSON response bodies for the REST API. Kept separate from the domain
//! types ([`crate::sim::materializer::ResultBundle`], [`crate::layout::LayoutResult`],
//! [`crate::sizing::VehicleTypeSizing`]) so the wire format can evolve without
//! dragging internal fields along with it.

use serde::{Deserialize, Serialize};

use crate::layout::LayoutResult;
use crate::model::event::Event;
use crate::sim::materializer::{AreaOccupancyPeak, ResultBundle};
use crate::sizing::VehicleTypeSizing;

#[derive(Debug, Clone, Serialize)]
pub struct StateResponse {
    pub period_s: i64,
    pub event_count: usize,
    pub area_peaks: Vec<AreaOccupancyPeak>,
    pub sizing: Vec<VehicleTypeSizing>,
    pub layout: LayoutResponse,
}

impl StateResponse {
    pub fn new(bundle: &ResultBundle, layout: &LayoutResult, sizes: &[VehicleTypeSizing]) -> Self {
        Self {
            period_s: bundle.period,
            event_count: bundle.events.len(),
            area_peaks: bundle.area_peaks.clone(),
            sizing: sizes.to_vec(),
            layout: LayoutResponse::from(layout),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutResponse {
    pub footprint_w_m: f64,
    pub footprint_h_m: f64,
    pub placements: Vec<PlacementRecord>,
}

impl From<&LayoutResult> for LayoutResponse {
    fn from(layout: &LayoutResult) -> Self {
        Self {
            footprint_w_m: layout.footprint.w,
            footprint_h_m: layout.footprint.h,
            placements: layout.placements.iter().map(PlacementRecord::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacementRecord {
    pub area: u32,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub is_driveway: bool,
}

impl From<&crate::layout::PlacedArea> for PlacementRecord {
    fn from(p: &crate::layout::PlacedArea) -> Self {
        Self {
            area: p.area.0,
            x: p.rect.x,
            y: p.rect.y,
            w: p.rect.w,
            h: p.rect.h,
            is_driveway: p.is_driveway,
        }
    }
}

/// `from`/`to` select a half-open `[from, to)` slice of the event log by
/// index, mirroring the timestep-range query the telemetry endpoint used.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EventsQuery {
    pub from: Option<usize>,
    pub to: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventsResponse {
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::rect::Rect;
    use crate::layout::PlacedArea;
    use crate::model::area::AreaId;

    #[test]
    fn layout_response_carries_driveway_flag() {
        let layout = LayoutResult {
            footprint: Rect::new(0.0, 0.0, 10.0, 10.0),
            placements: vec![PlacedArea {
                area: AreaId(0),
                rect: Rect::new(0.0, 0.0, 10.0, 1.0),
                is_driveway: true,
            }],
        };
        let response = LayoutResponse::from(&layout);
        assert_eq!(response.placements.len(), 1);
        assert!(response.placements[0].is_driveway);
    }
}
