use std::io::Write;
use std::path::{Path, PathBuf};

use csv::Writer;
use tracing::info;

use crate::dispatch::Dispatch;
use crate::error::DispatchError;
use crate::solver::TrialRecord;
use crate::utils::format_clock_precise;

/// Writes the delivery schedule to `path` and the trial history next to it.
pub fn save_report(dispatch: &Dispatch, path: &Path) -> Result<(), DispatchError> {
    save_schedule(dispatch, Writer::from_path(path)?)?;
    let trials = trials_path(path);
    save_trials(dispatch.trial_history(), Writer::from_path(&trials)?)?;
    info!(
        "Report written to {} and {}",
        path.display(),
        trials.display()
    );
    Ok(())
}

pub fn save_schedule<W: Write>(dispatch: &Dispatch, mut wtr: Writer<W>) -> Result<(), DispatchError> {
    wtr.write_record([
        "package",
        "truck",
        "address",
        "deadline",
        "leave_time",
        "delivery_time",
        "on_time",
    ])?;

    for package in dispatch.list_packages() {
        let address = dispatch.lookup_address(package.destination())?;
        wtr.write_record([
            package.id.to_string(),
            package.truck.map(|id| id.to_string()).unwrap_or_default(),
            address.street.clone(),
            package.deadline.to_string(),
            package.leave_time.map(format_clock_precise).unwrap_or_default(),
            package.delivery_time.map(format_clock_precise).unwrap_or_default(),
            package
                .delivered_on_time()
                .map(|on_time| on_time.to_string())
                .unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn save_trials<W: Write>(history: &[TrialRecord], mut wtr: Writer<W>) -> Result<(), DispatchError> {
    wtr.write_record(["trial", "total_distance", "best_so_far"])?;

    for record in history {
        wtr.write_record([
            record.trial.to_string(),
            format!("{:.1}", record.total_distance),
            format!("{:.1}", record.best_so_far),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// `out/report.csv` -> `out/report_trials.csv`
pub fn trials_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{stem}_trials.{}", ext.to_string_lossy()),
        None => format!("{stem}_trials"),
    };
    path.with_file_name(name)
}
