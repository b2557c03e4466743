pub mod assignment;
pub mod route_builder;
pub mod trials;

pub use assignment::{Assignment, AssignmentEngine, FillStrategy};
pub use route_builder::{build_route, PlannedRoute, Refinement, RouteStop};
pub use trials::{FleetPlan, TrialOptimizer, TrialOutcome, TrialRecord};
