//! Best-Fit-Decreasing + Bottom-Left-Fill rectangle packing (`spec.md` §4.7).

use super::rect::{FreeRectSet, Rect};
use crate::error::PackingError;

/// A rectangle to place, identified by a caller-chosen key (an area id).
/// `is_line` drives step 1's sort: DIRECT areas place before LINE areas.
#[derive(Debug, Clone, Copy)]
pub struct PlacementRequest {
    pub key: u32,
    pub w: f64,
    pub h: f64,
    pub is_line: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct PlacedRect {
    pub key: u32,
    pub rect: Rect,
}

/// Sorts `requests` DIRECT-before-LINE, then within each group decreasing
/// by longer edge then shorter edge (`spec.md` §4.7 step 1), then places
/// each into the free rectangle with smallest `(y, then x)` that fits it
/// (step 3) — bottom-left-fill by position, not best-fit-by-area.
/// Splits/merges the free list as it goes. Fails on the first request with
/// no fitting free rectangle.
pub fn pack(
    requests: &[PlacementRequest],
    footprint: Rect,
    min_free_rect_size: f64,
) -> Result<Vec<PlacedRect>, PackingError> {
    let edges = |r: &PlacementRequest| {
        let (long, short) = if r.w >= r.h { (r.w, r.h) } else { (r.h, r.w) };
        (long, short)
    };
    let mut ordered: Vec<&PlacementRequest> = requests.iter().collect();
    ordered.sort_by(|a, b| {
        a.is_line.cmp(&b.is_line).then_with(|| {
            let (long_a, short_a) = edges(a);
            let (long_b, short_b) = edges(b);
            long_b
                .partial_cmp(&long_a)
                .unwrap()
                .then_with(|| short_b.partial_cmp(&short_a).unwrap())
        })
    });

    let mut free = FreeRectSet::new(footprint);
    let mut placed = Vec::with_capacity(requests.len());

    for req in ordered {
        let best = free
            .rects
            .iter()
            .enumerate()
            .filter(|(_, r)| r.contains(req.w, req.h))
            .min_by(|(_, a), (_, b)| {
                a.y.partial_cmp(&b.y)
                    .unwrap()
                    .then_with(|| a.x.partial_cmp(&b.x).unwrap())
            })
            .map(|(i, _)| i);

        let Some(idx) = best else {
            return Err(PackingError::PlacementFailed {
                rect_w: req.w,
                rect_h: req.h,
                footprint_w: footprint.w,
                footprint_h: footprint.h,
            });
        };

        let rect = free.place(idx, req.w, req.h, min_free_rect_size);
        placed.push(PlacedRect { key: req.key, rect });
    }

    Ok(placed)
}
