use std::io::{self, BufRead, Write};

use chrono::NaiveTime;
use colored::*;
use itertools::Itertools;
use tracing::warn;

use crate::config::{clock, constant};
use crate::dispatch::{Dispatch, PackageView};
use crate::domain::types::PackageStatus;
use crate::utils::{format_clock, parse_clock};

const MENU: &str = "
1. Lookup package
2. Lookup address
3. Print all packages
4. Print all addresses
5. Fleet summary
6. Exit
7. Show menu";

/// Runs the interactive menu until `6` or end of input.
pub fn run<R: BufRead, W: Write>(dispatch: &mut Dispatch, input: R, out: &mut W) -> io::Result<()> {
    let mut lines = input.lines();
    writeln!(out, "{MENU}")?;

    loop {
        write!(out, "\nEnter choice: ")?;
        out.flush()?;
        let Some(choice) = lines.next().transpose()? else {
            break;
        };

        match choice.trim() {
            "1" => {
                let Some(id) = prompt(&mut lines, out, "Package id: ")? else {
                    break;
                };
                let Some(time) = prompt_time(&mut lines, out)? else {
                    break;
                };
                match id.parse::<u32>() {
                    Ok(id) => match dispatch.lookup_package_at(id, time) {
                        Ok(view) => print_package(out, &view)?,
                        Err(e) => writeln!(out, "{}", e.to_string().red())?,
                    },
                    Err(_) => writeln!(out, "{}", format!("Not a package id: {id}").red())?,
                }
            }
            "2" => {
                let Some(id) = prompt(&mut lines, out, "Address id: ")? else {
                    break;
                };
                match id.parse::<usize>() {
                    Ok(id) => match dispatch.lookup_address(id) {
                        Ok(address) => writeln!(out, "{address}")?,
                        Err(e) => writeln!(out, "{}", e.to_string().red())?,
                    },
                    Err(_) => writeln!(out, "{}", format!("Not an address id: {id}").red())?,
                }
            }
            "3" => {
                let Some(time) = prompt_time(&mut lines, out)? else {
                    break;
                };
                match dispatch.packages_at(time) {
                    Ok(views) => {
                        for view in &views {
                            print_package(out, view)?;
                        }
                    }
                    Err(e) => writeln!(out, "{}", e.to_string().red())?,
                }
            }
            "4" => {
                for address in dispatch.list_addresses() {
                    writeln!(out, "{address}")?;
                }
            }
            "5" => print_fleet(dispatch, out)?,
            "6" => {
                writeln!(out, "Exiting...")?;
                break;
            }
            "7" => writeln!(out, "{MENU}")?,
            _ => writeln!(out, "\nInvalid input. Please select an option by its #.")?,
        }
    }

    Ok(())
}

/// `None` on end of input.
fn prompt<I, W>(lines: &mut I, out: &mut W, label: &str) -> io::Result<Option<String>>
where
    I: Iterator<Item = io::Result<String>>,
    W: Write,
{
    write!(out, "{label}")?;
    out.flush()?;
    Ok(lines.next().transpose()?.map(|line| line.trim().to_string()))
}

/// Blank or unreadable input means end of day.
fn prompt_time<I, W>(lines: &mut I, out: &mut W) -> io::Result<Option<NaiveTime>>
where
    I: Iterator<Item = io::Result<String>>,
    W: Write,
{
    let Some(raw) = prompt(lines, out, "Time (e.g. 9:30 AM, blank for end of day): ")? else {
        return Ok(None);
    };
    let end_of_day = clock(constant::END_OF_DAY);
    if raw.is_empty() {
        return Ok(Some(end_of_day));
    }
    Ok(Some(parse_clock(&raw).unwrap_or_else(|| {
        warn!("unreadable time {raw:?}, using end of day");
        end_of_day
    })))
}

fn paint(status: PackageStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        PackageStatus::AtHub => label.yellow(),
        PackageStatus::Delayed => label.red(),
        PackageStatus::OutForDelivery => label.cyan(),
        PackageStatus::Delivered => label.green(),
    }
}

fn print_package<W: Write>(out: &mut W, view: &PackageView) -> io::Result<()> {
    let truck = view
        .truck
        .map(|id| format!("truck {id}"))
        .unwrap_or_else(|| "unassigned".to_string());
    let delivered = view
        .delivered_at
        .map(|time| format!(" at {}", format_clock(time)))
        .unwrap_or_default();

    writeln!(
        out,
        "#{:<3} {} {}, {} {} | deadline {} | {} kg | {} | {}{}",
        view.id,
        view.address.street,
        view.address.city,
        view.address.state,
        view.address.zip,
        view.deadline,
        view.weight,
        truck,
        paint(view.status),
        delivered
    )?;
    if !view.note.is_empty() {
        writeln!(out, "     {}", view.note.dimmed())?;
    }
    Ok(())
}

fn print_fleet<W: Write>(dispatch: &Dispatch, out: &mut W) -> io::Result<()> {
    for truck in dispatch.trucks() {
        writeln!(out, "{truck}")?;
        writeln!(out, "  packages: {}", truck.packages.iter().join(", "))?;
    }
    writeln!(
        out,
        "{}",
        format!("Total distance: {:.1} miles", dispatch.total_distance()).green()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constraints::ConstraintTable;
    use crate::test_utils::small_dispatch;

    fn session(script: &str) -> String {
        let mut dispatch = small_dispatch(&ConstraintTable::default());
        let mut out = Vec::new();
        run(&mut dispatch, script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn package_lookup_shows_status_at_the_given_time() {
        let output = session("1\n1\n7:00 AM\n1\n1\n\n6\n");
        assert!(output.contains("AT HUB"));
        assert!(output.contains("DELIVERED"));
        assert!(output.contains("Exiting..."));
    }

    #[test]
    fn unknown_ids_are_reported_not_fatal() {
        let output = session("1\n99\n\n2\n42\n6\n");
        assert!(output.contains("package 99 not found"));
        assert!(output.contains("address 42 not found"));
    }

    #[test]
    fn invalid_choice_reprompts() {
        let output = session("9\n4\n");
        assert!(output.contains("Invalid input"));
        assert!(output.contains("5 Main St"));
    }

    #[test]
    fn end_of_input_ends_the_session() {
        let output = session("5\n");
        assert!(output.contains("Total distance"));
        assert!(!output.contains("Exiting..."));
    }
}
