/// Future-event queue driving the whole simulation.
pub mod clock;
/// C4: the depot simulator — drives every vehicle's plan through the FEL.
pub mod engine;
/// C2: depot areas and their runtime occupancy stores.
pub mod graph;
/// C5: collapses raw simulation events into a steady-state result bundle.
pub mod materializer;
/// `Resource`: priority-queued capacity with worker-break windows.
pub mod resource;
/// `FilterStore`, `PositionalStore`, `LineStore` — the C1 container primitives.
pub mod store;
/// C3: parking and dispatch ranking over the depot graph.
pub mod strategy;
