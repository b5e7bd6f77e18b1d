pub mod engine;
pub mod schedule;
pub mod state;

pub use engine::Monitor;
pub use schedule::{run_schedule, MonitorSchedule};
pub use state::{MonitorState, TickOutcome};
