pub mod delivery;
pub mod status;

pub use delivery::{apply_runs, simulate, simulate_fleet, TruckRun};
pub use status::{observe, status_at};
