pub mod controls;
pub mod event_log;
pub mod process_tree;
pub mod usage_block;

pub use self::controls::ControlsWidget;
pub use self::event_log::{EventEntry, EventLevel, EventLogWidget};
pub use self::process_tree::ProcessTreeWidget;
pub use self::usage_block::UsageWidget;
