use std::error::Error;
use std::io;

use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wgups::config::Settings;
use wgups::report::save_report;
use wgups::{cli, Dispatch};

fn init_tracing_and_env() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_span_events(fmt::format::FmtSpan::CLOSE),
        )
        .init();

    dotenv().ok();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing_and_env();
    let settings = Settings::from_env();

    info!(
        "Planning with {} trials, seed {}, 2-opt {}",
        settings.trials, settings.seed, settings.two_opt
    );
    let mut dispatch = Dispatch::plan(&settings)?;

    if let Some(path) = &settings.report_path {
        save_report(&dispatch, path)?;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    cli::run(&mut dispatch, stdin.lock(), &mut stdout)?;
    Ok(())
}
