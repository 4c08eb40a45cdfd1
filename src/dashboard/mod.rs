//! Dashboard fan-out
//!
//! Everything observers see flows through here:
//! - `DashboardEvent`: the wire protocol pushed to connected dashboards
//! - `BoundedLog`: append-at-front history capped at 50 entries
//! - `DashboardSink`: best-effort broadcast plus the committed histories
//!   snapshotted into `init` for newly connected observers

mod events;
mod history;
mod sink;

pub use events::{CallStatusUpdate, DashboardEvent, HistorySnapshot};
pub use history::{BoundedLog, HISTORY_CAP};
pub use sink::DashboardSink;
