use chrono::NaiveTime;
use tracing::info;

use crate::domain::types::{Package, PackageStatus};
use crate::utils::format_clock;

/// Status of `package` at `time`, from its leave and delivery stamps.
///
/// A package with a pending address correction is `Delayed` until the
/// correction time, whatever its truck is doing.
pub fn status_at(package: &Package, time: NaiveTime) -> PackageStatus {
    if let Some(correction) = package.correction {
        if time < correction.at {
            return PackageStatus::Delayed;
        }
    }

    match (package.leave_time, package.delivery_time) {
        (None, _) => PackageStatus::AtHub,
        (Some(leave), _) if time < leave => PackageStatus::AtHub,
        (Some(_), Some(delivered)) if time >= delivered => PackageStatus::Delivered,
        (Some(_), _) => PackageStatus::OutForDelivery,
    }
}

/// Status query that also performs the one-time address correction the first
/// time it is observed at or after the correction time.
pub fn observe(package: &mut Package, time: NaiveTime) -> PackageStatus {
    if let Some(correction) = package.correction {
        if !package.corrected && time >= correction.at {
            package.address = correction.address;
            package.corrected = true;
            info!(
                "Package {} address corrected to location {} (query at {})",
                package.id,
                correction.address,
                format_clock(time)
            );
        }
    }
    status_at(package, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::AddressCorrection;
    use crate::test_utils::{at, standard};

    fn stamped(leave: NaiveTime, delivered: NaiveTime) -> Package {
        let mut package = standard(1, 3);
        package.leave_time = Some(leave);
        package.delivery_time = Some(delivered);
        package
    }

    #[test]
    fn unsimulated_package_is_at_hub() {
        assert_eq!(status_at(&standard(1, 3), at(17, 0)), PackageStatus::AtHub);
    }

    #[test]
    fn status_follows_leave_and_delivery_thresholds() {
        let package = stamped(at(9, 5), at(10, 0));

        assert_eq!(status_at(&package, at(9, 4)), PackageStatus::AtHub);
        assert_eq!(status_at(&package, at(9, 5)), PackageStatus::OutForDelivery);
        assert_eq!(status_at(&package, at(9, 59)), PackageStatus::OutForDelivery);
        assert_eq!(status_at(&package, at(10, 0)), PackageStatus::Delivered);
        assert_eq!(status_at(&package, at(13, 0)), PackageStatus::Delivered);
    }

    #[test]
    fn correction_package_is_delayed_then_resumes() {
        let mut package = stamped(at(10, 20), at(11, 0));
        package.correction = Some(AddressCorrection {
            at: at(10, 20),
            address: 19,
        });

        assert_eq!(observe(&mut package, at(9, 0)), PackageStatus::Delayed);
        assert_eq!(package.address, 3);
        assert!(!package.corrected);

        assert_eq!(observe(&mut package, at(10, 30)), PackageStatus::OutForDelivery);
        assert_eq!(package.address, 19);
        assert!(package.corrected);

        assert_eq!(observe(&mut package, at(11, 0)), PackageStatus::Delivered);
    }

    #[test]
    fn correction_applies_once_and_reporting_stays_time_dependent() {
        let mut package = stamped(at(10, 20), at(11, 0));
        package.correction = Some(AddressCorrection {
            at: at(10, 20),
            address: 19,
        });

        observe(&mut package, at(12, 0));
        let after_first = package.clone();
        observe(&mut package, at(12, 0));

        assert_eq!(package.address, after_first.address);
        assert!(package.corrected);
        assert_eq!(package.address_at(at(9, 0)), 3);
        assert_eq!(package.address_at(at(12, 0)), 19);
        assert_eq!(observe(&mut package, at(9, 0)), PackageStatus::Delayed);
    }

    #[test]
    fn repeated_queries_are_idempotent() {
        let mut package = stamped(at(8, 0), at(8, 45));
        let first = observe(&mut package, at(8, 30));
        let second = observe(&mut package, at(8, 30));
        assert_eq!(first, second);
    }
}
