use std::collections::BTreeMap;
use std::iter;

use chrono::NaiveTime;
use tracing::{debug, trace};

use crate::distance::DistanceIndex;
use crate::domain::types::{LocationId, PackageId};
use crate::evaluation::fitness::{dist_between, tour_distance};

const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Optional improvement applied after nearest-neighbour construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
    Off,
    TwoOpt { max_passes: usize },
}

/// One package to drop off. `deadline` is set for priority packages only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStop {
    pub package: PackageId,
    pub location: LocationId,
    pub deadline: Option<NaiveTime>,
}

/// A truck's visiting order. `route` starts and ends at the hub and holds
/// one stop per package in between, in the same order as `packages`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    pub packages: Vec<PackageId>,
    pub route: Vec<LocationId>,
    pub distance: f64,
}

/// Greedy nearest-neighbour order over `destinations`, starting at `start`.
///
/// Returns positions into `destinations`; every position appears exactly once.
/// Ties go to the earlier position, so the result is deterministic. Repeated
/// locations stay separate slots and cost nothing to chain.
pub fn nearest_neighbor(
    start: LocationId,
    destinations: &[LocationId],
    dm: &DistanceIndex,
) -> Vec<usize> {
    let n = destinations.len();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut current = start;

    while order.len() < n {
        let mut best: Option<(usize, f64)> = None;
        for (i, &destination) in destinations.iter().enumerate() {
            if visited[i] {
                continue;
            }
            let d = dist_between(current, destination, dm);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((i, d));
            }
        }

        let Some((next, d)) = best else { break };
        trace!("nearest from {} is {} ({:.1} mi)", current, destinations[next], d);
        visited[next] = true;
        order.push(next);
        current = destinations[next];
    }

    order
}

/// 2-opt over a path pinned at `start` and `end`.
///
/// Reverses `stops[i..=j]` whenever that shortens the path and repeats until
/// a pass finds no improving reversal or `max_passes` is reached. Returns the
/// number of reversals applied.
pub fn two_opt<T, F>(
    start: LocationId,
    end: LocationId,
    stops: &mut [T],
    location: F,
    dm: &DistanceIndex,
    max_passes: usize,
) -> usize
where
    F: Fn(&T) -> LocationId,
{
    let n = stops.len();
    if n < 2 {
        return 0;
    }

    let mut reversals = 0;
    for pass in 0..max_passes {
        let mut improved = false;

        for i in 0..n - 1 {
            for j in (i + 1)..n {
                let prev = if i == 0 { start } else { location(&stops[i - 1]) };
                let next = if j == n - 1 { end } else { location(&stops[j + 1]) };
                let first = location(&stops[i]);
                let last = location(&stops[j]);

                let delta = dist_between(prev, last, dm) + dist_between(first, next, dm)
                    - dist_between(prev, first, dm)
                    - dist_between(last, next, dm);

                if delta < -IMPROVEMENT_EPSILON {
                    stops[i..=j].reverse();
                    reversals += 1;
                    improved = true;
                }
            }
        }

        if !improved {
            debug!("2-opt converged after {} passes, {} reversals", pass + 1, reversals);
            return reversals;
        }
    }

    debug!("2-opt stopped at pass limit {}, {} reversals", max_passes, reversals);
    reversals
}

/// Orders a truck's stops into a hub-to-hub route.
///
/// Priority stops go first, earliest deadline tier first, nearest neighbour
/// within each tier. Standard stops follow by nearest neighbour from the last
/// priority stop. 2-opt only reorders the standard segment.
pub fn build_route(
    hub: LocationId,
    stops: &[RouteStop],
    dm: &DistanceIndex,
    refinement: Refinement,
) -> PlannedRoute {
    let mut tiers: BTreeMap<NaiveTime, Vec<RouteStop>> = BTreeMap::new();
    let mut standard: Vec<RouteStop> = Vec::new();
    for &stop in stops {
        match stop.deadline {
            Some(deadline) => tiers.entry(deadline).or_default().push(stop),
            None => standard.push(stop),
        }
    }

    let mut ordered: Vec<RouteStop> = Vec::with_capacity(stops.len());
    let mut current = hub;
    for tier in tiers.into_values() {
        current = extend_nearest(&mut ordered, current, &tier, dm);
    }

    let urgent = ordered.len();
    let last_priority = current;
    extend_nearest(&mut ordered, current, &standard, dm);

    if let Refinement::TwoOpt { max_passes } = refinement {
        two_opt(
            last_priority,
            hub,
            &mut ordered[urgent..],
            |stop| stop.location,
            dm,
            max_passes,
        );
    }

    let locations: Vec<LocationId> = ordered.iter().map(|stop| stop.location).collect();
    let distance = tour_distance(hub, &locations, dm);
    let route: Vec<LocationId> = iter::once(hub)
        .chain(locations)
        .chain(iter::once(hub))
        .collect();

    PlannedRoute {
        packages: ordered.into_iter().map(|stop| stop.package).collect(),
        route,
        distance,
    }
}

/// Appends `stops` in nearest-neighbour order from `start` and returns the
/// location the truck ends up at.
fn extend_nearest(
    ordered: &mut Vec<RouteStop>,
    start: LocationId,
    stops: &[RouteStop],
    dm: &DistanceIndex,
) -> LocationId {
    let locations: Vec<LocationId> = stops.iter().map(|stop| stop.location).collect();
    let mut current = start;
    for i in nearest_neighbor(start, &locations, dm) {
        ordered.push(stops[i]);
        current = stops[i].location;
    }
    current
}
