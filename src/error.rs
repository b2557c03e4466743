use chrono::NaiveTime;
use thiserror::Error;

use crate::domain::types::{PackageId, TruckId};

/// Malformed or incomplete input. Fatal at load time.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("{file}: record {line}: {reason}")]
    Malformed {
        file: String,
        line: u64,
        reason: String,
    },
    #[error("address ids must be contiguous from 0, found {found} at position {expected}")]
    AddressOrder { expected: usize, found: usize },
    #[error("no address with street {0:?}")]
    UnknownStreet(String),
    #[error("duplicate package id {0}")]
    DuplicatePackage(PackageId),
    #[error("package {0} is addressed to the hub")]
    PackageAtHub(PackageId),
    #[error("invalid deadline {0:?}")]
    Deadline(String),
    #[error("distance matrix has {rows} rows but {expected} locations are known")]
    MatrixShape { rows: usize, expected: usize },
    #[error("no distance between locations {0} and {1}")]
    MissingDistance(usize, usize),
    #[error("distance between {0} and {1} is negative or not a number")]
    InvalidDistance(usize, usize),
    #[error("distance between {0} and {1} differs by direction")]
    AsymmetricDistance(usize, usize),
}

/// Constraints that cannot be satisfied by the fleet. Fatal before simulation.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("package {0} does not fit on any truck: fleet capacity exceeded")]
    FleetCapacityExceeded(PackageId),
    #[error("truck {truck} is over capacity after pinning package {package}")]
    PinnedOverCapacity { truck: TruckId, package: PackageId },
    #[error("constraint names unknown truck {0}")]
    UnknownTruck(TruckId),
    #[error("constraint names unknown package {0}")]
    UnknownPackage(PackageId),
    #[error("package {0} is pinned to more than one truck")]
    ConflictingPins(PackageId),
    #[error("group containing package {0} is pinned to more than one truck")]
    ConflictingGroupPins(PackageId),
    #[error("package {package} is not available until {available}, after truck {truck} departs")]
    NotAvailable {
        package: PackageId,
        truck: TruckId,
        available: NaiveTime,
    },
    #[error("package {0} cannot be reached by any truck departure")]
    NoEligibleTruck(PackageId),
    #[error("route of truck {truck} never reaches package {package}")]
    RouteMissesPackage { truck: TruckId, package: PackageId },
    #[error("at least one trial is required")]
    NoTrials,
    #[error("truck {truck} cannot finish its route before midnight")]
    DayOverrun { truck: TruckId },
}

/// Unknown identifier at the query boundary. Never fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("package {0} not found")]
    PackageNotFound(PackageId),
    #[error("address {0} not found")]
    AddressNotFound(usize),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
