use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;
use tracing::{debug, info, span, warn, Level};

use crate::config::{constant, Settings};
use crate::distance::DistanceIndex;
use crate::domain::catalog::{AddressBook, PackageCatalog};
use crate::domain::constraints::ConstraintTable;
use crate::domain::types::{Address, Deadline, Package};
use crate::error::{DataError, DispatchError};
use crate::setup::init_types::*;

/// Everything known about the day before planning starts.
#[derive(Debug, Clone)]
pub struct LoadedDay {
    pub addresses: AddressBook,
    pub catalog: PackageCatalog,
    pub distances: DistanceIndex,
}

/// Loads the three input files and attaches the constraint table's
/// address corrections.
pub fn setup(settings: &Settings, constraints: &ConstraintTable) -> Result<LoadedDay, DispatchError> {
    let setup_span = span!(Level::INFO, "setup");
    let _guard = setup_span.enter();

    let addresses = read_addresses(open(&settings.addresses_path)?, &label(&settings.addresses_path))?;
    let mut catalog = read_packages(
        open(&settings.packages_path)?,
        &label(&settings.packages_path),
        &addresses,
    )?;
    let distances = read_distances(
        open(&settings.distances_path)?,
        &label(&settings.distances_path),
        addresses.len(),
    )?;

    constraints.attach_corrections(&mut catalog, &addresses)?;

    info!(
        "Loaded {} addresses, {} packages, {}x{} distance matrix",
        addresses.len(),
        catalog.len(),
        distances.size(),
        distances.size()
    );
    Ok(LoadedDay {
        addresses,
        catalog,
        distances,
    })
}

pub fn read_addresses<R: Read>(reader: R, source: &str) -> Result<AddressBook, DispatchError> {
    let records: Vec<AddressRecord> = read_records(reader, source)?;
    let addresses = records
        .into_iter()
        .map(|record| Address {
            id: record.id,
            name: record.name,
            street: record.street,
            city: record.city,
            state: record.state,
            zip: record.zip,
        })
        .collect();
    Ok(AddressBook::new(addresses)?)
}

/// Reads packages, resolving each street to a known address.
pub fn read_packages<R: Read>(
    reader: R,
    source: &str,
    addresses: &AddressBook,
) -> Result<PackageCatalog, DispatchError> {
    let records: Vec<PackageRecord> = read_records(reader, source)?;
    let mut catalog = PackageCatalog::new();

    for record in records {
        let address = addresses
            .by_street(&record.street)
            .ok_or_else(|| DataError::UnknownStreet(record.street.clone()))?;
        if address.id == constant::HUB {
            return Err(DataError::PackageAtHub(record.id).into());
        }
        if address.zip != record.zip {
            warn!(
                "package {}: zip {} differs from address book zip {}",
                record.id, record.zip, address.zip
            );
        }

        let deadline = Deadline::parse(&record.deadline)?;
        let package = Package::new(record.id, address.id, record.weight, record.note, deadline);
        debug!(
            "package {} -> location {}, deadline {}",
            package.id, package.address, package.deadline
        );
        catalog.insert(package)?;
    }

    Ok(catalog)
}

/// Reads a square table of distances in which blank cells are allowed as long
/// as the mirrored cell holds the value.
pub fn read_distances<R: Read>(
    reader: R,
    source: &str,
    expected: usize,
) -> Result<DistanceIndex, DispatchError> {
    let mut reader = csv_reader(reader);
    let mut cells: Vec<Vec<Option<f64>>> = Vec::with_capacity(expected);

    for row in reader.records() {
        let record = row?;
        let line = line_of(&record);
        let parsed = record
            .iter()
            .map(|cell| {
                if cell.is_empty() {
                    Ok(None)
                } else {
                    cell.parse::<f64>().map(Some).map_err(|e| DataError::Malformed {
                        file: source.to_string(),
                        line,
                        reason: format!("distance {cell:?}: {e}"),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        cells.push(parsed);
    }

    Ok(DistanceIndex::from_cells(&cells, expected)?)
}

fn read_records<T: DeserializeOwned, R: Read>(reader: R, source: &str) -> Result<Vec<T>, DispatchError> {
    let mut reader = csv_reader(reader);
    let mut records = Vec::new();

    for row in reader.records() {
        let record = row?;
        let parsed: T = record.deserialize(None).map_err(|e| DataError::Malformed {
            file: source.to_string(),
            line: line_of(&record),
            reason: e.to_string(),
        })?;
        records.push(parsed);
    }

    Ok(records)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |position| position.line())
}

fn open(path: &Path) -> Result<File, DispatchError> {
    File::open(path).map_err(|e| {
        DataError::Malformed {
            file: label(path),
            line: 0,
            reason: e.to_string(),
        }
        .into()
    })
}

fn label(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESSES: &str = "\
0,Hub,4001 South 700 East,Salt Lake City,UT,84107
1,Council Hall,300 State St,Salt Lake City,UT,84103
2,Juvenile Court,410 S State St,Salt Lake City,UT,84111
";

    const PACKAGES: &str = "\
1,300 State St,Salt Lake City,UT,84103,10:30 AM,21,
2,410 S State St,Salt Lake City,UT,84111,EOD,5,\"Must be delivered with 1, 3\"
3,300 State St,Salt Lake City,UT,84103,9:00 AM,2
";

    const DISTANCES: &str = "\
0.0,,
7.2,0.0,
3.8,7.1,0.0
";

    fn book() -> AddressBook {
        read_addresses(ADDRESSES.as_bytes(), "addresses").unwrap()
    }

    #[test]
    fn packages_resolve_streets_and_deadlines() {
        let catalog = read_packages(PACKAGES.as_bytes(), "packages", &book()).unwrap();

        assert_eq!(catalog.len(), 3);
        let first = catalog.get(1).unwrap();
        assert_eq!(first.address, 1);
        assert!(first.priority);
        let second = catalog.get(2).unwrap();
        assert_eq!(second.note, "Must be delivered with 1, 3");
        assert_eq!(second.deadline, Deadline::EndOfDay);
        assert!(!second.priority);
        assert_eq!(catalog.get(3).unwrap().note, "");
    }

    #[test]
    fn unknown_street_is_a_data_error() {
        let rows = "1,1 Nowhere Rd,Salt Lake City,UT,84103,EOD,1,\n";
        assert!(matches!(
            read_packages(rows.as_bytes(), "packages", &book()),
            Err(DispatchError::Data(DataError::UnknownStreet(_)))
        ));
    }

    #[test]
    fn package_for_the_hub_is_rejected() {
        let rows = "1,4001 South 700 East,Salt Lake City,UT,84107,EOD,1,\n";
        assert!(matches!(
            read_packages(rows.as_bytes(), "packages", &book()),
            Err(DispatchError::Data(DataError::PackageAtHub(1)))
        ));
    }

    #[test]
    fn lower_triangle_distances_are_mirrored() {
        let index = read_distances(DISTANCES.as_bytes(), "distances", 3).unwrap();
        assert_eq!(index.distance(0, 2), 3.8);
        assert_eq!(index.distance(2, 1), 7.1);
        assert_eq!(index.distance(1, 2), 7.1);
    }

    #[test]
    fn unparsable_distance_reports_its_line() {
        let rows = "0.0,,\nabc,0.0,\n3.8,7.1,0.0\n";
        match read_distances(rows.as_bytes(), "distances", 3) {
            Err(DispatchError::Data(DataError::Malformed { line, .. })) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_package_row_is_rejected() {
        let rows = "x,300 State St,Salt Lake City,UT,84103,EOD,1,\n";
        assert!(matches!(
            read_packages(rows.as_bytes(), "packages", &book()),
            Err(DispatchError::Data(DataError::Malformed { .. }))
        ));
    }
}
