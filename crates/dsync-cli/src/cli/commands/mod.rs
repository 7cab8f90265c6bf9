//! CLI command handlers. Each command is in its own file.

mod checksum;
mod completions;
mod inventory;
mod plan;
mod progress;
mod sync;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use inventory::run_inventory;
pub use plan::run_plan;
pub use sync::run_sync;
