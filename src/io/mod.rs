/// CSV export of event logs and layout rectangles.
pub mod export;
