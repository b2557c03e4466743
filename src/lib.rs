pub mod cli;
pub mod config;
pub mod dispatch;
pub mod distance;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod report;
pub mod setup;
pub mod simulation;
pub mod solver;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use dispatch::{Dispatch, PackageView};
pub use error::{ConfigurationError, DataError, DispatchError, LookupError};
