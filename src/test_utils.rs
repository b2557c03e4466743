use chrono::NaiveTime;

use crate::config::Settings;
use crate::dispatch::Dispatch;
use crate::distance::DistanceIndex;
use crate::domain::catalog::{AddressBook, PackageCatalog};
use crate::domain::constraints::ConstraintTable;
use crate::domain::types::{Address, Deadline, LocationId, Package, PackageId, Truck};
use crate::setup::LoadedDay;

pub fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn standard(id: PackageId, location: LocationId) -> Package {
    Package::new(id, location, 1.0, String::new(), Deadline::EndOfDay)
}

pub fn priority(id: PackageId, location: LocationId) -> Package {
    Package::new(id, location, 1.0, String::new(), Deadline::At(at(10, 0)))
}

pub fn catalog_of(packages: impl IntoIterator<Item = Package>) -> PackageCatalog {
    let mut catalog = PackageCatalog::new();
    for package in packages {
        catalog.insert(package).unwrap();
    }
    catalog
}

/// `size` locations on a straight road, one mile apart, hub at 0.
pub fn line_distances(size: usize) -> DistanceIndex {
    let rows: Vec<Vec<f64>> = (0..size)
        .map(|i| (0..size).map(|j| (i as f64 - j as f64).abs()).collect())
        .collect();
    DistanceIndex::from_matrix(&rows).unwrap()
}

/// `size` addresses with streets `"{id} Main St"`.
pub fn address_book(size: usize) -> AddressBook {
    let addresses = (0..size)
        .map(|id| Address {
            id,
            name: format!("Stop {id}"),
            street: format!("{id} Main St"),
            city: "Salt Lake City".to_string(),
            state: "UT".to_string(),
            zip: "84101".to_string(),
        })
        .collect();
    AddressBook::new(addresses).unwrap()
}

/// Five packages on a six-stop road, planned for the standard fleet.
pub fn small_dispatch(constraints: &ConstraintTable) -> Dispatch {
    let addresses = address_book(6);
    let mut catalog = catalog_of([
        priority(1, 2),
        standard(2, 4),
        standard(3, 1),
        standard(4, 5),
        priority(5, 3),
    ]);
    constraints
        .attach_corrections(&mut catalog, &addresses)
        .unwrap();
    let day = LoadedDay {
        addresses,
        catalog,
        distances: line_distances(6),
    };
    let settings = Settings {
        trials: 4,
        ..Settings::default()
    };
    Dispatch::from_loaded(day, constraints, Truck::fleet(), &settings).unwrap()
}
