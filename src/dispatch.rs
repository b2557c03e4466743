use chrono::NaiveTime;
use tracing::{info, span, Level};

use crate::config::{clock, constant, Settings};
use crate::distance::DistanceIndex;
use crate::domain::catalog::{AddressBook, PackageCatalog};
use crate::domain::constraints::ConstraintTable;
use crate::domain::types::{
    Address, Deadline, Package, PackageId, PackageStatus, Truck, TruckId,
};
use crate::error::{DataError, DispatchError, LookupError};
use crate::setup::{setup, LoadedDay};
use crate::simulation::{apply_runs, observe, simulate_fleet};
use crate::solver::trials::plan_routes;
use crate::solver::{AssignmentEngine, FleetPlan, Refinement, TrialOptimizer, TrialRecord};

/// A package as seen by a query at a given time.
#[derive(Debug, Clone)]
pub struct PackageView {
    pub id: PackageId,
    pub address: Address,
    pub deadline: Deadline,
    pub weight: f64,
    pub note: String,
    pub truck: Option<TruckId>,
    pub status: PackageStatus,
    /// Only set once the package has been delivered as of the query time.
    pub delivered_at: Option<NaiveTime>,
    pub queried_at: NaiveTime,
}

/// The planned and simulated day.
#[derive(Debug)]
pub struct Dispatch {
    addresses: AddressBook,
    catalog: PackageCatalog,
    distances: DistanceIndex,
    trucks: Vec<Truck>,
    trial_history: Vec<TrialRecord>,
    best_trial: usize,
}

impl Dispatch {
    /// Loads the configured files and plans the WGUPS day.
    pub fn plan(settings: &Settings) -> Result<Self, DispatchError> {
        let constraints = ConstraintTable::wgups();
        let day = setup(settings, &constraints)?;
        Self::from_loaded(day, &constraints, Truck::fleet(), settings)
    }

    /// Assigns, routes and simulates an already loaded day. Nothing is
    /// returned unless every stage succeeds.
    ///
    /// `settings.trials == 0` skips the randomized trials and plans a single
    /// deterministic pass.
    pub fn from_loaded(
        day: LoadedDay,
        constraints: &ConstraintTable,
        mut trucks: Vec<Truck>,
        settings: &Settings,
    ) -> Result<Self, DispatchError> {
        let LoadedDay {
            addresses,
            mut catalog,
            distances,
        } = day;

        if distances.size() != addresses.len() {
            return Err(DataError::MatrixShape {
                rows: distances.size(),
                expected: addresses.len(),
            }
            .into());
        }

        let refinement = if settings.two_opt {
            Refinement::TwoOpt {
                max_passes: constant::TWO_OPT_MAX_PASSES,
            }
        } else {
            Refinement::Off
        };

        let (plan, trial_history, best_trial) = {
            let engine = AssignmentEngine::new(&catalog, &trucks, constraints);
            if settings.trials == 0 {
                let plan = plan_routes(
                    engine.assign()?,
                    &catalog,
                    &distances,
                    constant::HUB,
                    refinement,
                )?;
                info!("Greedy plan: {:.1} miles", plan.total_distance);
                (plan, Vec::new(), 0)
            } else {
                let outcome = TrialOptimizer::new(&engine, &catalog, &distances, constant::HUB)
                    .with_trials(settings.trials)
                    .with_seed(settings.seed)
                    .with_refinement(refinement)
                    .optimize()?;
                info!(
                    "Best plan from trial {}: {:.1} miles",
                    outcome.best_trial, outcome.best.total_distance
                );
                (outcome.best, outcome.history, outcome.best_trial)
            }
        };

        commit(&mut trucks, &mut catalog, &plan)?;
        let runs = simulate_fleet(&trucks, &catalog, &distances)?;
        apply_runs(&mut trucks, &mut catalog, &runs)?;

        Ok(Self {
            addresses,
            catalog,
            distances,
            trucks,
            trial_history,
            best_trial,
        })
    }

    /// View of the package at the end of the day.
    pub fn lookup_package(&mut self, id: PackageId) -> Result<PackageView, LookupError> {
        self.lookup_package_at(id, clock(constant::END_OF_DAY))
    }

    pub fn lookup_package_at(
        &mut self,
        id: PackageId,
        time: NaiveTime,
    ) -> Result<PackageView, LookupError> {
        let package = self.catalog.get_mut(id)?;
        let status = observe(package, time);
        let package = self.catalog.get(id)?;
        let address = self.addresses.get(package.address_at(time))?.clone();

        Ok(PackageView {
            id,
            address,
            deadline: package.deadline,
            weight: package.weight,
            note: package.note.clone(),
            truck: package.truck,
            status,
            delivered_at: package
                .delivery_time
                .filter(|_| status == PackageStatus::Delivered),
            queried_at: time,
        })
    }

    /// Views of every package at `time`, in id order.
    pub fn packages_at(&mut self, time: NaiveTime) -> Result<Vec<PackageView>, LookupError> {
        let ids: Vec<PackageId> = self.catalog.ids().collect();
        ids.into_iter()
            .map(|id| self.lookup_package_at(id, time))
            .collect()
    }

    pub fn lookup_address(&self, id: usize) -> Result<&Address, LookupError> {
        self.addresses.get(id)
    }

    pub fn list_packages(&self) -> impl Iterator<Item = &Package> {
        self.catalog.iter()
    }

    pub fn list_addresses(&self) -> impl Iterator<Item = &Address> {
        self.addresses.iter()
    }

    pub fn status_at(&mut self, id: PackageId, time: NaiveTime) -> Result<PackageStatus, LookupError> {
        Ok(observe(self.catalog.get_mut(id)?, time))
    }

    pub fn trucks(&self) -> &[Truck] {
        &self.trucks
    }

    /// Combined mileage of every truck.
    pub fn total_distance(&self) -> f64 {
        self.trucks.iter().map(|truck| truck.total_distance).sum()
    }

    pub fn trial_history(&self) -> &[TrialRecord] {
        &self.trial_history
    }

    pub fn best_trial(&self) -> usize {
        self.best_trial
    }

    pub fn distances(&self) -> &DistanceIndex {
        &self.distances
    }
}

/// Hands each truck its planned load and route.
fn commit(
    trucks: &mut [Truck],
    catalog: &mut PackageCatalog,
    plan: &FleetPlan,
) -> Result<(), DispatchError> {
    let assignment_span = span!(Level::INFO, "assignment", trucks = trucks.len());
    let _guard = assignment_span.enter();

    for (truck, planned) in trucks.iter_mut().zip(&plan.routes) {
        truck.packages = planned.packages.clone();
        truck.route = planned.route.clone();
        truck.total_distance = planned.distance;
        for &id in &truck.packages {
            catalog.get_mut(id)?.truck = Some(truck.id);
        }
        info!(
            "Truck {} loaded with {} packages, {:.1} miles planned",
            truck.id,
            truck.packages.len(),
            truck.total_distance
        );
    }
    Ok(())
}
