use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use weathervane::summary::{DailyField, Distribution};
use weathervane::{
    DataOrigin, UnitSystem, WeatherError, WeatherService, WeatherSession, WeatherSnapshot,
    WeatherVaneConfig, telemetry,
};

#[derive(Parser, Debug)]
#[command(name = "weathervane", version)]
#[command(about = "Daily and hourly weather with a same-day cache and offline fallback")]
struct Cli {
    /// Config file (default: <config dir>/weathervane/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the weather for a day
    Show {
        /// imperial or metric
        #[arg(long, default_value = "imperial")]
        units: String,
        /// Day to summarise (default: today at the location)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete cache entries fetched before today
    Sweep,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let result = run(cli).await;
    if let Err(e) = &result {
        if let Some(weather_error) = e.downcast_ref::<WeatherError>() {
            eprintln!("{}", weather_error.user_message());
        }
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = WeatherVaneConfig::load_from_path(cli.config)
        .context("Failed to load configuration")?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    telemetry::init(&config.logging);

    let service = WeatherService::from_config(&config)?;
    let today = service.location().today()?;

    match cli.command.unwrap_or(Command::Show {
        units: "imperial".to_string(),
        date: None,
    }) {
        Command::Show { units, date } => {
            let system = units.parse::<UnitSystem>()?;
            let mut session = WeatherSession::new(service);
            let snapshot = session.select(system, today).await?;
            print_snapshot(snapshot, date.unwrap_or(today), today);
        }
        Command::Sweep => {
            let report = service.sweep(today)?;
            println!("Cache sweep: {report}");
            for failure in &report.failures {
                println!("  skipped {}: {}", failure.path.display(), failure.reason);
            }
        }
    }

    Ok(())
}

fn print_snapshot(snapshot: &WeatherSnapshot, date: NaiveDate, today: NaiveDate) {
    let profile = snapshot.profile;
    let temp = profile.temperature().label();
    let wind = profile.wind().label();

    println!(
        "Weather data ({} units, fetched {}, source: {})",
        profile.system(),
        snapshot.fetched_on,
        snapshot.origin
    );
    if snapshot.origin == DataOrigin::Synthetic {
        println!("  Live data unavailable; values below are generated samples.");
    }

    println!();
    match snapshot.day_summary(date) {
        Some(summary) => {
            println!("{date}");
            println!("  Max Temp ({temp}):     {}", fmt_value(summary.temperature_max));
            println!("  Max Wind ({wind}):     {}", fmt_value(summary.wind_speed_max));
            println!("  Mean Humidity (%): {}", fmt_value(summary.humidity_mean));
        }
        None => println!("No daily data for {date}"),
    }

    println!();
    println!("Temperature distribution ({temp}) over {} days", snapshot.daily.len());
    for field in DailyField::TEMPERATURES {
        match snapshot.distribution(field) {
            Some(d) => println!("  {:<17} {}", field.label(), fmt_distribution(&d)),
            None => println!("  {:<17} no data", field.label()),
        }
    }

    let days = snapshot.upcoming_days(today);
    if days.is_empty() {
        return;
    }
    println!();
    println!("Hourly temperature ({temp})");
    for day in days {
        let temps: Vec<f64> = snapshot
            .hourly_for(day)
            .iter()
            .filter_map(|r| r.temperature)
            .collect();
        if let Some(d) = Distribution::of(temps) {
            println!("  {day}  low {:.1}  high {:.1}", d.min, d.max);
        }
    }
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn fmt_distribution(d: &Distribution) -> String {
    format!(
        "min {:.2}  q1 {:.2}  median {:.2}  q3 {:.2}  max {:.2}",
        d.min, d.q1, d.median, d.q3, d.max
    )
}
