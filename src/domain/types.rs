use std::fmt;

use chrono::NaiveTime;

use crate::config::{clock, constant};
use crate::error::DataError;
use crate::utils::{format_clock, parse_clock};

pub type PackageId = u32;
pub type TruckId = u32;
pub type LocationId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub id: LocationId,
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} {}, {} {}",
            self.id, self.name, self.street, self.city, self.state, self.zip
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    At(NaiveTime),
    EndOfDay,
}

impl Deadline {
    /// Parses `"EOD"` or a `"H:MM AM|PM"` clock time.
    pub fn parse(raw: &str) -> Result<Self, DataError> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("EOD") {
            return Ok(Deadline::EndOfDay);
        }
        parse_clock(raw)
            .map(Deadline::At)
            .ok_or_else(|| DataError::Deadline(raw.to_string()))
    }

    pub fn time(&self) -> NaiveTime {
        match self {
            Deadline::At(time) => *time,
            Deadline::EndOfDay => clock(constant::END_OF_DAY),
        }
    }

    pub fn is_priority(&self) -> bool {
        self.time() <= clock(constant::PRIORITY_CUTOFF)
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deadline::At(time) => f.write_str(&format_clock(*time)),
            Deadline::EndOfDay => f.write_str("EOD"),
        }
    }
}

/// Address fix that only becomes known at a given wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressCorrection {
    pub at: NaiveTime,
    pub address: LocationId,
}

#[derive(Debug, Clone)]
pub struct Package {
    pub id: PackageId,
    pub weight: f64,
    pub note: String,
    pub deadline: Deadline,
    pub priority: bool,
    /// Address as currently recorded in the catalog.
    pub address: LocationId,
    pub original_address: LocationId,
    pub correction: Option<AddressCorrection>,
    /// Set once, by the first status query at or after the correction time.
    pub corrected: bool,
    pub truck: Option<TruckId>,
    pub leave_time: Option<NaiveTime>,
    pub delivery_time: Option<NaiveTime>,
}

impl Package {
    pub fn new(
        id: PackageId,
        address: LocationId,
        weight: f64,
        note: String,
        deadline: Deadline,
    ) -> Self {
        Self {
            id,
            weight,
            note,
            deadline,
            priority: deadline.is_priority(),
            address,
            original_address: address,
            correction: None,
            corrected: false,
            truck: None,
            leave_time: None,
            delivery_time: None,
        }
    }

    /// Where the package is actually driven to.
    pub fn destination(&self) -> LocationId {
        self.correction
            .map(|correction| correction.address)
            .unwrap_or(self.address)
    }

    /// Address a query at `time` reports.
    pub fn address_at(&self, time: NaiveTime) -> LocationId {
        match self.correction {
            Some(correction) if time >= correction.at => correction.address,
            Some(_) => self.original_address,
            None => self.address,
        }
    }

    pub fn delivered_on_time(&self) -> Option<bool> {
        self.delivery_time
            .map(|delivered| delivered <= self.deadline.time())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageStatus {
    AtHub,
    Delayed,
    OutForDelivery,
    Delivered,
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PackageStatus::AtHub => "AT HUB",
            PackageStatus::Delayed => "DELAYED (AT HUB)",
            PackageStatus::OutForDelivery => "OUT FOR DELIVERY",
            PackageStatus::Delivered => "DELIVERED",
        };
        f.write_str(label)
    }
}

/// When a truck may leave the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    Fixed(NaiveTime),
    /// Leaves once a driver is back from a fixed-departure truck, not before `earliest`.
    Relay { earliest: NaiveTime },
}

impl Departure {
    pub fn earliest(&self) -> NaiveTime {
        match self {
            Departure::Fixed(time) => *time,
            Departure::Relay { earliest } => *earliest,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Truck {
    pub id: TruckId,
    pub capacity: usize,
    pub departure: Departure,
    pub location: LocationId,
    /// Packages in visiting order.
    pub packages: Vec<PackageId>,
    /// Hub, one stop per package, hub.
    pub route: Vec<LocationId>,
    pub leave_time: Option<NaiveTime>,
    pub return_time: Option<NaiveTime>,
    pub total_distance: f64,
}

impl Truck {
    pub fn new(id: TruckId, departure: NaiveTime, capacity: usize) -> Self {
        Self::with_departure(id, Departure::Fixed(departure), capacity)
    }

    pub fn relay(id: TruckId, earliest: NaiveTime, capacity: usize) -> Self {
        Self::with_departure(id, Departure::Relay { earliest }, capacity)
    }

    fn with_departure(id: TruckId, departure: Departure, capacity: usize) -> Self {
        Self {
            id,
            capacity,
            departure,
            location: constant::HUB,
            packages: vec![],
            route: vec![],
            leave_time: None,
            return_time: None,
            total_distance: 0.0,
        }
    }

    /// Two drivers, three trucks: the third leaves when a driver returns.
    pub fn fleet() -> Vec<Truck> {
        vec![
            Truck::new(1, clock(constant::TRUCK_1_DEPARTURE), constant::TRUCK_CAPACITY),
            Truck::new(2, clock(constant::TRUCK_2_DEPARTURE), constant::TRUCK_CAPACITY),
            Truck::relay(
                3,
                clock(constant::TRUCK_3_EARLIEST_DEPARTURE),
                constant::TRUCK_CAPACITY,
            ),
        ]
    }
}

impl fmt::Display for Truck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let leave = self
            .leave_time
            .map(format_clock)
            .unwrap_or_else(|| "-".to_string());
        let back = self
            .return_time
            .map(format_clock)
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "Truck {}: {} packages, left {}, returned {}, {:.1} miles",
            self.id,
            self.packages.len(),
            leave,
            back,
            self.total_distance
        )
    }
}
