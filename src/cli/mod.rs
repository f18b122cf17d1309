pub mod intake;
pub mod io;

use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::api::{HttpClient, VehicleApi};
use crate::config::ConfigManager;
use crate::domain::{ModelCatalog, VehicleRecord};
use crate::errors::{ClearingError, CliError};
use crate::time::SystemClock;

pub use intake::{ChoiceOutcome, DialoguerIo, IntakeIo, IntakeRunner, PromptOutcome, ScriptedIo};

const USAGE: &str = "\
clearing_core_cli - vehicle intake for the clearing workflow

USAGE:
    clearing_core_cli [OPTIONS]

OPTIONS:
    --base-url <URL>    Override the configured API base URL
    --script <FILE>     Answer prompts from a file instead of the terminal
    -h, --help          Print this help
    -V, --version       Print the version";

/// Entry point for the intake CLI.
pub fn run_cli() -> Result<(), CliError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    run_with_args(&args)
}

pub fn run_with_args(args: &[String]) -> Result<(), CliError> {
    let mut base_url: Option<String> = None;
    let mut script: Option<String> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            "-V" | "--version" => {
                println!("clearing_core_cli {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--base-url" => {
                base_url = Some(
                    iter.next()
                        .ok_or_else(|| CliError::Input("--base-url needs a value".into()))?
                        .clone(),
                );
            }
            "--script" => {
                script = Some(
                    iter.next()
                        .ok_or_else(|| CliError::Input("--script needs a file path".into()))?
                        .clone(),
                );
            }
            other => {
                return Err(CliError::Input(format!(
                    "unknown argument `{other}` (try --help)"
                )));
            }
        }
    }

    let manager = ConfigManager::new()?;
    let mut config = manager.load()?;
    if let Some(url) = base_url {
        config.api_base_url = url;
    }

    let client = HttpClient::new(
        &config.api_base_url,
        StdDuration::from_secs(config.request_timeout_secs),
    );
    let clock = SystemClock;
    let catalog = ModelCatalog::builtin();
    let quiet_period = Duration::milliseconds(config.debounce_ms as i64);

    let mut interaction: Box<dyn IntakeIo> = match script {
        Some(path) => Box::new(ScriptedIo::from_file(std::path::Path::new(&path))?),
        None => Box::new(DialoguerIo::new()),
    };

    let mut runner = IntakeRunner::new(
        catalog,
        quiet_period,
        &client,
        &client,
        &clock,
        interaction.as_mut(),
    );

    match runner.run()? {
        Some(record) => {
            io::print_success(format!("Vehicle #{} created.", record.id));
            render_detail(&client, record.id)?;
        }
        None => io::print_info("Intake cancelled. Nothing was saved."),
    }
    Ok(())
}

/// Post-submit detail view of the freshly created record, read back from the
/// service.
fn render_detail(api: &dyn VehicleApi, id: i64) -> Result<(), CliError> {
    let record = api.fetch(id).map_err(ClearingError::from)?;
    print_record(&record);
    Ok(())
}

fn print_record(record: &VehicleRecord) {
    io::print_section(format!("Vehicle #{}", record.id));
    let vehicle = &record.vehicle;
    println!("  VIN:     {}", vehicle.vin);
    println!("  Make:    {}", vehicle.make);
    println!("  Model:   {}", vehicle.model);
    println!("  Year:    {}", vehicle.year);
    println!("  Status:  {}", vehicle.status.label());
    if let Some(color) = &vehicle.color {
        println!("  Color:   {color}");
    }
    if let Some(ship_name) = &vehicle.ship_name {
        println!("  Ship:    {ship_name}");
    }
    if let Some(terminal) = vehicle.terminal {
        println!("  Terminal: {}", terminal.label());
    }
    if let Some(arrival) = &vehicle.arrival_date {
        println!("  Arrival: {arrival}");
    }
    if let Some(estimate) = vehicle.estimated_total_cost {
        println!("  Estimated total: {}", io::format_naira(estimate));
    }
}
