use tracing::{debug, info};

use crate::domain::catalog::PackageCatalog;
use crate::domain::constraints::ConstraintTable;
use crate::domain::types::{PackageId, Truck, TruckId};
use crate::error::ConfigurationError;

/// How the standard pool is spread over trucks with room left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStrategy {
    /// Fill the earliest truck to capacity, then spill to the next.
    Sequential,
    /// Deal packages across trucks one at a time.
    RoundRobin,
}

/// Package ids per truck, indexed like the fleet slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub loads: Vec<Vec<PackageId>>,
}

impl Assignment {
    fn empty(trucks: usize) -> Self {
        Self {
            loads: vec![vec![]; trucks],
        }
    }

    pub fn truck_of(&self, package: PackageId) -> Option<usize> {
        self.loads.iter().position(|load| load.contains(&package))
    }

    pub fn package_count(&self) -> usize {
        self.loads.iter().map(Vec::len).sum()
    }
}

/// Partitions the catalog across the fleet, honouring pins, groups,
/// availability and capacity.
pub struct AssignmentEngine<'a> {
    catalog: &'a PackageCatalog,
    trucks: &'a [Truck],
    constraints: &'a ConstraintTable,
    by_departure: Vec<usize>,
}

impl<'a> AssignmentEngine<'a> {
    pub fn new(
        catalog: &'a PackageCatalog,
        trucks: &'a [Truck],
        constraints: &'a ConstraintTable,
    ) -> Self {
        let mut by_departure: Vec<usize> = (0..trucks.len()).collect();
        by_departure.sort_by_key(|&i| (trucks[i].departure.earliest(), trucks[i].id));

        Self {
            catalog,
            trucks,
            constraints,
            by_departure,
        }
    }

    /// Places pinned, grouped and priority packages. Returns the partial
    /// assignment and the remaining standard pool in package-id order.
    pub fn template(&self) -> Result<(Assignment, Vec<PackageId>), ConfigurationError> {
        self.constraints.validate(self.catalog)?;
        let mut assignment = Assignment::empty(self.trucks.len());

        for &(package, truck_id) in &self.constraints.pinned {
            let truck = self.truck_index(truck_id)?;
            if let Some(current) = assignment.truck_of(package) {
                if current != truck {
                    return Err(ConfigurationError::ConflictingPins(package));
                }
                continue;
            }
            self.check_available(package, truck)?;
            assignment.loads[truck].push(package);
            if assignment.loads[truck].len() > self.trucks[truck].capacity {
                return Err(ConfigurationError::PinnedOverCapacity {
                    truck: truck_id,
                    package,
                });
            }
            debug!("package {} pinned to truck {}", package, truck_id);
        }

        for group in &self.constraints.groups {
            let mut designated: Option<TruckId> = group.truck;
            for &member in &group.packages {
                if let Some(pinned) = self.constraints.pinned_truck(member) {
                    match designated {
                        Some(truck) if truck != pinned => {
                            return Err(ConfigurationError::ConflictingGroupPins(member))
                        }
                        _ => designated = Some(pinned),
                    }
                }
            }

            let pending: Vec<PackageId> = group
                .packages
                .iter()
                .copied()
                .filter(|&member| assignment.truck_of(member).is_none())
                .collect();
            let Some(&first) = pending.first() else {
                continue;
            };

            let truck = match designated {
                Some(truck_id) => {
                    let truck = self.truck_index(truck_id)?;
                    for &member in &pending {
                        self.check_available(member, truck)?;
                    }
                    if self.room(&assignment, truck) < pending.len() {
                        return Err(ConfigurationError::FleetCapacityExceeded(first));
                    }
                    truck
                }
                None => self
                    .by_departure
                    .iter()
                    .copied()
                    .find(|&truck| {
                        self.room(&assignment, truck) >= pending.len()
                            && pending.iter().all(|&m| self.is_available(m, truck))
                    })
                    .ok_or(ConfigurationError::FleetCapacityExceeded(first))?,
            };

            debug!("group {:?} loaded on truck {}", pending, self.trucks[truck].id);
            assignment.loads[truck].extend(pending);
        }

        for package in self.catalog.iter().filter(|p| p.priority) {
            if assignment.truck_of(package.id).is_some() {
                continue;
            }
            let truck = self.next_truck(&assignment, package.id, 0)?;
            assignment.loads[truck].push(package.id);
        }

        let pool: Vec<PackageId> = self
            .catalog
            .ids()
            .filter(|&id| assignment.truck_of(id).is_none())
            .collect();

        info!(
            "Template loads {:?}, {} standard packages pooled",
            assignment.loads.iter().map(Vec::len).collect::<Vec<_>>(),
            pool.len()
        );
        Ok((assignment, pool))
    }

    /// Adds the standard `pool`, in the order given, on top of `template`.
    pub fn fill(
        &self,
        template: &Assignment,
        pool: &[PackageId],
        strategy: FillStrategy,
    ) -> Result<Assignment, ConfigurationError> {
        let mut assignment = template.clone();
        let mut cursor = 0;

        for &package in pool {
            let start = match strategy {
                FillStrategy::Sequential => 0,
                FillStrategy::RoundRobin => cursor,
            };
            let truck = self.next_truck(&assignment, package, start)?;
            assignment.loads[truck].push(package);

            if strategy == FillStrategy::RoundRobin {
                let rank = self
                    .by_departure
                    .iter()
                    .position(|&t| t == truck)
                    .unwrap_or(0);
                cursor = (rank + 1) % self.by_departure.len();
            }
        }

        Ok(assignment)
    }

    /// Full deterministic assignment: template, then the pool in id order.
    pub fn assign(&self) -> Result<Assignment, ConfigurationError> {
        let (template, pool) = self.template()?;
        let assignment = self.fill(&template, &pool, FillStrategy::Sequential)?;
        info!(
            "Assigned {} packages: loads {:?}",
            assignment.package_count(),
            assignment.loads.iter().map(Vec::len).collect::<Vec<_>>()
        );
        Ok(assignment)
    }

    /// Earliest-departing truck, from rank `start` onward (wrapping), that can
    /// take `package`.
    fn next_truck(
        &self,
        assignment: &Assignment,
        package: PackageId,
        start: usize,
    ) -> Result<usize, ConfigurationError> {
        let count = self.by_departure.len();
        let mut any_eligible = false;

        for offset in 0..count {
            let truck = self.by_departure[(start + offset) % count];
            if !self.is_available(package, truck) {
                continue;
            }
            any_eligible = true;
            if self.room(assignment, truck) > 0 {
                return Ok(truck);
            }
        }

        if any_eligible {
            Err(ConfigurationError::FleetCapacityExceeded(package))
        } else {
            Err(ConfigurationError::NoEligibleTruck(package))
        }
    }

    fn room(&self, assignment: &Assignment, truck: usize) -> usize {
        self.trucks[truck]
            .capacity
            .saturating_sub(assignment.loads[truck].len())
    }

    fn is_available(&self, package: PackageId, truck: usize) -> bool {
        self.constraints
            .available_from(package)
            .map_or(true, |available| available <= self.trucks[truck].departure.earliest())
    }

    fn check_available(&self, package: PackageId, truck: usize) -> Result<(), ConfigurationError> {
        match self.constraints.available_from(package) {
            Some(available) if available > self.trucks[truck].departure.earliest() => {
                Err(ConfigurationError::NotAvailable {
                    package,
                    truck: self.trucks[truck].id,
                    available,
                })
            }
            _ => Ok(()),
        }
    }

    fn truck_index(&self, truck_id: TruckId) -> Result<usize, ConfigurationError> {
        self.trucks
            .iter()
            .position(|truck| truck.id == truck_id)
            .ok_or(ConfigurationError::UnknownTruck(truck_id))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::domain::constraints::GroupConstraint;
    use crate::domain::types::Package;
    use crate::test_utils::{at, catalog_of, priority, standard};

    fn fleet(capacity: usize) -> Vec<Truck> {
        vec![
            Truck::new(1, at(8, 0), capacity),
            Truck::new(2, at(9, 5), capacity),
            Truck::new(3, at(10, 20), capacity),
        ]
    }

    fn mixed_catalog(count: u32) -> PackageCatalog {
        catalog_of((1..=count).map(|id| -> Package {
            if id % 4 == 0 {
                priority(id, (id as usize % 5) + 1)
            } else {
                standard(id, (id as usize % 5) + 1)
            }
        }))
    }

    fn constraints() -> ConstraintTable {
        ConstraintTable {
            pinned: vec![(3, 2), (18, 2)],
            groups: vec![GroupConstraint {
                packages: vec![13, 14, 15],
                truck: None,
            }],
            available_from: vec![(6, at(9, 5)), (9, at(10, 20))],
            corrections: vec![],
        }
    }

    fn assert_partition(assignment: &Assignment, catalog: &PackageCatalog, capacity: usize) {
        let mut seen = HashSet::new();
        for load in &assignment.loads {
            assert!(load.len() <= capacity);
            for &id in load {
                assert!(seen.insert(id), "package {id} assigned twice");
            }
        }
        assert_eq!(seen.len(), catalog.len());
    }

    #[test]
    fn every_package_lands_on_exactly_one_truck() {
        let catalog = mixed_catalog(40);
        let trucks = fleet(16);
        let table = constraints();
        let assignment = AssignmentEngine::new(&catalog, &trucks, &table)
            .assign()
            .unwrap();

        assert_partition(&assignment, &catalog, 16);
    }

    #[test]
    fn pins_groups_and_availability_are_honoured() {
        let catalog = mixed_catalog(40);
        let trucks = fleet(16);
        let table = constraints();
        let assignment = AssignmentEngine::new(&catalog, &trucks, &table)
            .assign()
            .unwrap();

        assert_eq!(assignment.truck_of(3), Some(1));
        assert_eq!(assignment.truck_of(18), Some(1));

        let group_truck = assignment.truck_of(13);
        assert!(group_truck.is_some());
        assert_eq!(assignment.truck_of(14), group_truck);
        assert_eq!(assignment.truck_of(15), group_truck);

        assert_ne!(assignment.truck_of(6), Some(0));
        assert_eq!(assignment.truck_of(9), Some(2));
    }

    #[test]
    fn priority_packages_ride_the_earliest_truck() {
        let catalog = catalog_of([standard(1, 1), priority(2, 2), standard(3, 3), priority(4, 4)]);
        let trucks = fleet(2);
        let table = ConstraintTable::default();
        let engine = AssignmentEngine::new(&catalog, &trucks, &table);

        let (template, pool) = engine.template().unwrap();
        assert_eq!(template.loads[0], vec![2, 4]);
        assert_eq!(pool, vec![1, 3]);

        let assignment = engine.fill(&template, &pool, FillStrategy::Sequential).unwrap();
        assert_eq!(assignment.loads[1], vec![1, 3]);
    }

    #[test]
    fn round_robin_spreads_the_pool() {
        let catalog = catalog_of((1..=6).map(|id| standard(id, 1)));
        let trucks = fleet(4);
        let table = ConstraintTable::default();
        let engine = AssignmentEngine::new(&catalog, &trucks, &table);
        let (template, pool) = engine.template().unwrap();

        let assignment = engine.fill(&template, &pool, FillStrategy::RoundRobin).unwrap();
        assert_eq!(assignment.loads, vec![vec![1, 4], vec![2, 5], vec![3, 6]]);
    }

    #[test]
    fn overflowing_the_fleet_is_a_configuration_error() {
        let catalog = catalog_of((1..=7).map(|id| standard(id, 1)));
        let trucks = fleet(2);
        let table = ConstraintTable::default();

        let result = AssignmentEngine::new(&catalog, &trucks, &table).assign();
        assert!(matches!(
            result,
            Err(ConfigurationError::FleetCapacityExceeded(7))
        ));
    }

    #[test]
    fn conflicting_pins_inside_a_group_are_rejected() {
        let catalog = catalog_of((1..=3).map(|id| standard(id, 1)));
        let trucks = fleet(4);
        let table = ConstraintTable {
            pinned: vec![(1, 1), (2, 2)],
            groups: vec![GroupConstraint {
                packages: vec![1, 2, 3],
                truck: None,
            }],
            ..ConstraintTable::default()
        };

        let result = AssignmentEngine::new(&catalog, &trucks, &table).assign();
        assert!(matches!(
            result,
            Err(ConfigurationError::ConflictingGroupPins(2))
        ));
    }

    #[test]
    fn group_follows_a_pinned_member() {
        let catalog = catalog_of((1..=3).map(|id| standard(id, 1)));
        let trucks = fleet(4);
        let table = ConstraintTable {
            pinned: vec![(2, 3)],
            groups: vec![GroupConstraint {
                packages: vec![1, 2, 3],
                truck: None,
            }],
            ..ConstraintTable::default()
        };

        let assignment = AssignmentEngine::new(&catalog, &trucks, &table)
            .assign()
            .unwrap();
        assert_eq!(assignment.loads[2], vec![2, 1, 3]);
    }

    #[test]
    fn package_later_than_every_departure_has_no_truck() {
        let catalog = catalog_of([standard(1, 1)]);
        let trucks = fleet(4);
        let table = ConstraintTable {
            available_from: vec![(1, at(12, 0))],
            ..ConstraintTable::default()
        };

        let result = AssignmentEngine::new(&catalog, &trucks, &table).assign();
        assert!(matches!(result, Err(ConfigurationError::NoEligibleTruck(1))));
    }

    #[test]
    fn pinning_onto_an_early_truck_checks_availability() {
        let catalog = catalog_of([standard(1, 1)]);
        let trucks = fleet(4);
        let table = ConstraintTable {
            pinned: vec![(1, 1)],
            available_from: vec![(1, at(9, 5))],
            ..ConstraintTable::default()
        };

        let result = AssignmentEngine::new(&catalog, &trucks, &table).assign();
        assert!(matches!(
            result,
            Err(ConfigurationError::NotAvailable { package: 1, truck: 1, .. })
        ));
    }

    #[test]
    fn repeated_pin_loads_the_package_once() {
        let catalog = catalog_of((1..=3).map(|id| standard(id, 1)));
        let trucks = fleet(4);
        let table = ConstraintTable {
            pinned: vec![(1, 2), (1, 2)],
            ..ConstraintTable::default()
        };

        let assignment = AssignmentEngine::new(&catalog, &trucks, &table)
            .assign()
            .unwrap();
        assert_partition(&assignment, &catalog, 4);
        assert_eq!(assignment.truck_of(1), Some(1));
    }

    #[test]
    fn package_pinned_to_two_trucks_is_rejected() {
        let catalog = catalog_of([standard(1, 1)]);
        let trucks = fleet(4);
        let table = ConstraintTable {
            pinned: vec![(1, 1), (1, 2)],
            ..ConstraintTable::default()
        };

        let result = AssignmentEngine::new(&catalog, &trucks, &table).assign();
        assert!(matches!(result, Err(ConfigurationError::ConflictingPins(1))));
    }
}
