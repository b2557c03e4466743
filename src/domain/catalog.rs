use std::collections::BTreeMap;

use crate::domain::types::{Address, LocationId, Package, PackageId};
use crate::error::{DataError, LookupError};

/// Addresses indexed by location id.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    addresses: Vec<Address>,
}

impl AddressBook {
    /// Builds the book, requiring ids to run 0, 1, 2, ... in order.
    pub fn new(addresses: Vec<Address>) -> Result<Self, DataError> {
        for (expected, address) in addresses.iter().enumerate() {
            if address.id != expected {
                return Err(DataError::AddressOrder {
                    expected,
                    found: address.id,
                });
            }
        }
        Ok(Self { addresses })
    }

    pub fn get(&self, id: LocationId) -> Result<&Address, LookupError> {
        self.addresses
            .get(id)
            .ok_or(LookupError::AddressNotFound(id))
    }

    pub fn by_street(&self, street: &str) -> Option<&Address> {
        let street = street.trim();
        self.addresses
            .iter()
            .find(|address| address.street.eq_ignore_ascii_case(street))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.addresses.iter()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Keyed package store. Iterates in package-id order.
#[derive(Debug, Clone, Default)]
pub struct PackageCatalog {
    packages: BTreeMap<PackageId, Package>,
}

impl PackageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: Package) -> Result<(), DataError> {
        if self.packages.contains_key(&package.id) {
            return Err(DataError::DuplicatePackage(package.id));
        }
        self.packages.insert(package.id, package);
        Ok(())
    }

    pub fn get(&self, id: PackageId) -> Result<&Package, LookupError> {
        self.packages
            .get(&id)
            .ok_or(LookupError::PackageNotFound(id))
    }

    pub fn get_mut(&mut self, id: PackageId) -> Result<&mut Package, LookupError> {
        self.packages
            .get_mut(&id)
            .ok_or(LookupError::PackageNotFound(id))
    }

    pub fn contains(&self, id: PackageId) -> bool {
        self.packages.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = PackageId> + '_ {
        self.packages.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
