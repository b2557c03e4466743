use serde::Deserialize;

/// One row of `addresses.csv`.
#[derive(Debug, Deserialize)]
pub struct AddressRecord {
    pub id: usize,
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// One row of `packages.csv`.
#[derive(Debug, Deserialize)]
pub struct PackageRecord {
    pub id: u32,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub deadline: String,
    pub weight: f64,
    #[serde(default)]
    pub note: String,
}
