use std::cmp::Reverse;
use std::collections::BinaryHeap;

use chrono::NaiveTime;
use rayon::prelude::*;
use tracing::{debug, info, span, Level};

use crate::distance::DistanceIndex;
use crate::domain::catalog::PackageCatalog;
use crate::domain::types::{Departure, PackageId, Truck, TruckId};
use crate::error::{ConfigurationError, DispatchError};
use crate::evaluation::fitness::dist_between;
use crate::utils::{arrival_after, format_clock};

/// Result of driving one truck's route.
#[derive(Debug, Clone, PartialEq)]
pub struct TruckRun {
    pub truck: TruckId,
    pub leave_time: NaiveTime,
    pub return_time: NaiveTime,
    pub total_distance: f64,
    /// Delivery stamps in the order they happened.
    pub deliveries: Vec<(PackageId, NaiveTime)>,
}

/// Drives `truck.route` from `leave_time` and stamps each package when the
/// truck first reaches its destination.
pub fn simulate(
    truck: &Truck,
    leave_time: NaiveTime,
    catalog: &PackageCatalog,
    dm: &DistanceIndex,
) -> Result<TruckRun, DispatchError> {
    let mut destinations = Vec::with_capacity(truck.packages.len());
    for &id in &truck.packages {
        let package = catalog.get(id)?;
        if let Some(correction) = package.correction {
            if leave_time < correction.at {
                return Err(ConfigurationError::NotAvailable {
                    package: id,
                    truck: truck.id,
                    available: correction.at,
                }
                .into());
            }
        }
        destinations.push(package.destination());
    }

    let mut delivered = vec![false; truck.packages.len()];
    let mut deliveries = Vec::with_capacity(truck.packages.len());
    let mut distance = 0.0;

    if let Some((&start, rest)) = truck.route.split_first() {
        let mut current = start;
        for &next in rest {
            distance += dist_between(current, next, dm);
            current = next;
            let arrival = arrival_after(leave_time, distance)
                .ok_or(ConfigurationError::DayOverrun { truck: truck.id })?;

            for (slot, &destination) in destinations.iter().enumerate() {
                if !delivered[slot] && destination == next {
                    delivered[slot] = true;
                    deliveries.push((truck.packages[slot], arrival));
                }
            }
        }
    }

    if let Some(slot) = delivered.iter().position(|done| !done) {
        return Err(ConfigurationError::RouteMissesPackage {
            truck: truck.id,
            package: truck.packages[slot],
        }
        .into());
    }

    let return_time = arrival_after(leave_time, distance)
        .ok_or(ConfigurationError::DayOverrun { truck: truck.id })?;
    debug!(
        "truck {} left {}, back {}, {:.1} miles",
        truck.id,
        format_clock(leave_time),
        format_clock(return_time),
        distance
    );

    Ok(TruckRun {
        truck: truck.id,
        leave_time,
        return_time,
        total_distance: distance,
        deliveries,
    })
}

/// Simulates the whole fleet. Fixed-departure trucks run concurrently; relay
/// trucks wait for all of them, then each takes the driver who returns first.
/// Runs come back in fleet order.
pub fn simulate_fleet(
    trucks: &[Truck],
    catalog: &PackageCatalog,
    dm: &DistanceIndex,
) -> Result<Vec<TruckRun>, DispatchError> {
    let simulation_span = span!(Level::INFO, "simulation", trucks = trucks.len());
    let _guard = simulation_span.enter();

    let fixed: Vec<(usize, NaiveTime)> = trucks
        .iter()
        .enumerate()
        .filter_map(|(i, truck)| match truck.departure {
            Departure::Fixed(time) => Some((i, time)),
            Departure::Relay { .. } => None,
        })
        .collect();

    let fixed_runs = fixed
        .par_iter()
        .map(|&(i, leave)| simulate(&trucks[i], leave, catalog, dm).map(|run| (i, run)))
        .collect::<Result<Vec<(usize, TruckRun)>, DispatchError>>()?;

    let mut drivers_back: BinaryHeap<Reverse<NaiveTime>> = fixed_runs
        .iter()
        .map(|(_, run)| Reverse(run.return_time))
        .collect();
    let mut runs: Vec<Option<TruckRun>> = vec![None; trucks.len()];
    for (i, run) in fixed_runs {
        runs[i] = Some(run);
    }

    for (i, truck) in trucks.iter().enumerate() {
        let Departure::Relay { earliest } = truck.departure else {
            continue;
        };
        let leave = match drivers_back.pop() {
            Some(Reverse(back)) => earliest.max(back),
            None => earliest,
        };
        let run = simulate(truck, leave, catalog, dm)?;
        drivers_back.push(Reverse(run.return_time));
        runs[i] = Some(run);
    }

    Ok(runs.into_iter().flatten().collect())
}

/// Writes simulated times and distances back onto trucks and packages.
pub fn apply_runs(
    trucks: &mut [Truck],
    catalog: &mut PackageCatalog,
    runs: &[TruckRun],
) -> Result<(), DispatchError> {
    for run in runs {
        let Some(truck) = trucks.iter_mut().find(|truck| truck.id == run.truck) else {
            return Err(ConfigurationError::UnknownTruck(run.truck).into());
        };
        truck.leave_time = Some(run.leave_time);
        truck.return_time = Some(run.return_time);
        truck.total_distance = run.total_distance;

        for &id in &truck.packages {
            catalog.get_mut(id)?.leave_time = Some(run.leave_time);
        }
        for &(id, delivered_at) in &run.deliveries {
            catalog.get_mut(id)?.delivery_time = Some(delivered_at);
        }

        info!(
            "Truck {} left {} and returned {} after {:.1} miles",
            run.truck,
            format_clock(run.leave_time),
            format_clock(run.return_time),
            run.total_distance
        );
    }
    Ok(())
}
