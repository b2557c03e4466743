use chrono::NaiveTime;

use crate::config::clock;
use crate::domain::catalog::{AddressBook, PackageCatalog};
use crate::domain::types::{AddressCorrection, PackageId, TruckId};
use crate::error::{ConfigurationError, DataError, DispatchError};

/// Packages that must share one truck, optionally a specific one.
#[derive(Debug, Clone)]
pub struct GroupConstraint {
    pub packages: Vec<PackageId>,
    pub truck: Option<TruckId>,
}

#[derive(Debug, Clone)]
pub struct CorrectionRule {
    pub package: PackageId,
    pub at: NaiveTime,
    pub street: String,
}

/// Hard placement rules known before the day starts.
#[derive(Debug, Clone, Default)]
pub struct ConstraintTable {
    pub pinned: Vec<(PackageId, TruckId)>,
    pub groups: Vec<GroupConstraint>,
    pub available_from: Vec<(PackageId, NaiveTime)>,
    pub corrections: Vec<CorrectionRule>,
}

impl ConstraintTable {
    /// The rules for the daily WGUPS load.
    pub fn wgups() -> Self {
        let delayed_flight = clock((9, 5));
        let address_fix = clock((10, 20));

        Self {
            pinned: vec![(3, 2), (18, 2), (36, 2), (38, 2)],
            groups: vec![GroupConstraint {
                packages: vec![13, 14, 15, 16, 19, 20],
                truck: None,
            }],
            available_from: vec![
                (6, delayed_flight),
                (25, delayed_flight),
                (28, delayed_flight),
                (32, delayed_flight),
            ],
            corrections: vec![CorrectionRule {
                package: 9,
                at: address_fix,
                street: "410 S State St".to_string(),
            }],
        }
    }

    pub fn pinned_truck(&self, package: PackageId) -> Option<TruckId> {
        self.pinned
            .iter()
            .find(|(id, _)| *id == package)
            .map(|(_, truck)| *truck)
    }

    /// Earliest time the package may leave the hub. A pending address
    /// correction holds the package until the correction is known.
    pub fn available_from(&self, package: PackageId) -> Option<NaiveTime> {
        let delayed = self
            .available_from
            .iter()
            .find(|(id, _)| *id == package)
            .map(|(_, time)| *time);
        let corrected = self
            .corrections
            .iter()
            .find(|rule| rule.package == package)
            .map(|rule| rule.at);
        delayed.max(corrected)
    }

    /// Every package named by a rule must exist in the catalog.
    pub fn validate(&self, catalog: &PackageCatalog) -> Result<(), ConfigurationError> {
        let named = self
            .pinned
            .iter()
            .map(|(id, _)| *id)
            .chain(self.groups.iter().flat_map(|g| g.packages.iter().copied()))
            .chain(self.available_from.iter().map(|(id, _)| *id))
            .chain(self.corrections.iter().map(|rule| rule.package));

        for id in named {
            if !catalog.contains(id) {
                return Err(ConfigurationError::UnknownPackage(id));
            }
        }
        Ok(())
    }

    /// Attaches the pending corrections to their packages. The recorded
    /// address is left untouched until a status query crosses `at`.
    pub fn attach_corrections(
        &self,
        catalog: &mut PackageCatalog,
        addresses: &AddressBook,
    ) -> Result<(), DispatchError> {
        for rule in &self.corrections {
            let address = addresses
                .by_street(&rule.street)
                .ok_or_else(|| DataError::UnknownStreet(rule.street.clone()))?;
            let package = catalog
                .get_mut(rule.package)
                .map_err(|_| ConfigurationError::UnknownPackage(rule.package))?;
            package.correction = Some(AddressCorrection {
                at: rule.at,
                address: address.id,
            });
        }
        Ok(())
    }
}
