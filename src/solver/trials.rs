use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, span, Level};

use crate::distance::DistanceIndex;
use crate::domain::catalog::PackageCatalog;
use crate::domain::types::{LocationId, PackageId};
use crate::error::{ConfigurationError, DispatchError};
use crate::solver::assignment::{Assignment, AssignmentEngine, FillStrategy};
use crate::solver::route_builder::{build_route, PlannedRoute, Refinement, RouteStop};

/// A complete partition with one route per truck.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetPlan {
    pub assignment: Assignment,
    pub routes: Vec<PlannedRoute>,
    pub total_distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialRecord {
    pub trial: usize,
    pub seed: u64,
    pub total_distance: f64,
    pub best_so_far: f64,
}

#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub best: FleetPlan,
    pub best_trial: usize,
    pub history: Vec<TrialRecord>,
}

/// Routes every truck's load of `assignment`.
pub fn plan_routes(
    assignment: Assignment,
    catalog: &PackageCatalog,
    dm: &DistanceIndex,
    hub: LocationId,
    refinement: Refinement,
) -> Result<FleetPlan, DispatchError> {
    let routes = assignment
        .loads
        .par_iter()
        .map(|load| -> Result<PlannedRoute, DispatchError> {
            let stops = load
                .iter()
                .map(|&id| -> Result<RouteStop, DispatchError> {
                    let package = catalog.get(id)?;
                    Ok(RouteStop {
                        package: id,
                        location: package.destination(),
                        deadline: package.priority.then(|| package.deadline.time()),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(build_route(hub, &stops, dm, refinement))
        })
        .collect::<Result<Vec<PlannedRoute>, DispatchError>>()?;

    let total_distance = routes.iter().map(|route| route.distance).sum();
    Ok(FleetPlan {
        assignment,
        routes,
        total_distance,
    })
}

/// Seed of trial `trial` in a run seeded with `base`.
pub fn trial_seed(base: u64, trial: usize) -> u64 {
    base.wrapping_add(trial as u64)
}

/// Repeats randomized standard-pool distribution and keeps the whole fleet
/// partition with the lowest combined distance.
pub struct TrialOptimizer<'a> {
    engine: &'a AssignmentEngine<'a>,
    catalog: &'a PackageCatalog,
    dm: &'a DistanceIndex,
    hub: LocationId,
    trials: usize,
    seed: u64,
    refinement: Refinement,
}

impl<'a> TrialOptimizer<'a> {
    pub fn new(
        engine: &'a AssignmentEngine<'a>,
        catalog: &'a PackageCatalog,
        dm: &'a DistanceIndex,
        hub: LocationId,
    ) -> Self {
        Self {
            engine,
            catalog,
            dm,
            hub,
            trials: crate::config::constant::TRIALS,
            seed: crate::config::constant::SEED,
            refinement: Refinement::Off,
        }
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_refinement(mut self, refinement: Refinement) -> Self {
        self.refinement = refinement;
        self
    }

    pub fn optimize(&self) -> Result<TrialOutcome, DispatchError> {
        let trials_span = span!(Level::INFO, "trials", trials = self.trials, seed = self.seed);
        let _guard = trials_span.enter();

        let (template, pool) = self.engine.template()?;

        let plans = (0..self.trials)
            .into_par_iter()
            .map(|trial| self.run_trial(trial, &template, &pool))
            .collect::<Result<Vec<FleetPlan>, DispatchError>>()?;

        let mut best: Option<(usize, FleetPlan)> = None;
        let mut history = Vec::with_capacity(plans.len());

        for (trial, plan) in plans.into_iter().enumerate() {
            let total = plan.total_distance;
            debug!("trial {}: {:.1} miles", trial, total);

            let improves = best
                .as_ref()
                .map_or(true, |(_, current)| total < current.total_distance);
            if improves {
                best = Some((trial, plan));
            }

            let best_so_far = best
                .as_ref()
                .map_or(total, |(_, current)| current.total_distance);
            history.push(TrialRecord {
                trial,
                seed: trial_seed(self.seed, trial),
                total_distance: total,
                best_so_far,
            });
        }

        let (best_trial, best) = best.ok_or(ConfigurationError::NoTrials)?;
        info!(
            "Best trial {} of {}: {:.1} miles",
            best_trial, self.trials, best.total_distance
        );

        Ok(TrialOutcome {
            best,
            best_trial,
            history,
        })
    }

    fn run_trial(
        &self,
        trial: usize,
        template: &Assignment,
        pool: &[PackageId],
    ) -> Result<FleetPlan, DispatchError> {
        let mut rng = ChaCha8Rng::seed_from_u64(trial_seed(self.seed, trial));
        let mut shuffled = pool.to_vec();
        shuffled.shuffle(&mut rng);

        let assignment = self
            .engine
            .fill(template, &shuffled, FillStrategy::RoundRobin)?;
        plan_routes(assignment, self.catalog, self.dm, self.hub, self.refinement)
    }
}
