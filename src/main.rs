//! wx - weather lookup with an hourly temperature chart.
//!
//! # Usage
//!
//! ```bash
//! # Weather for a city, chart written as SVG
//! wx search Novi Sad --chart hourly.svg
//!
//! # Weather at the configured (or given) location
//! wx locate --lat 44.82 --lon 20.46
//!
//! # Switch between °C and °F
//! wx unit toggle
//!
//! # Interactive prompt (default)
//! wx
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use plotters_svg::SVGBackend;
use tokio::io::{AsyncBufReadExt, BufReader};
use wx_core::{AppError, Config, PreferenceStore};
use wx_weather::{
    BackendSurface, ConfiguredLocation, GeocodingClient, LocationSource, Rgb, TemperatureUnit,
    WeatherProvider, WeatherWidget,
};

const CHART_BACKGROUND: Rgb = Rgb(0x0f, 0x17, 0x2a);

#[derive(Parser)]
#[command(name = "wx")]
#[command(author, version, about = "Weather lookup with an hourly temperature chart")]
struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Latitude used for location lookups
    #[arg(long, global = true, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// Longitude used for location lookups
    #[arg(long, global = true, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// Write the hourly chart as SVG to this path
    #[arg(long, global = true)]
    chart: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Look up the weather for a city
    Search {
        /// City name, e.g. "Novi Sad"
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,
    },
    /// Look up the weather at your location
    Locate,
    /// Show or change the temperature unit
    Unit {
        #[arg(value_enum, default_value_t = UnitArg::Toggle)]
        unit: UnitArg,
    },
    /// Prompt for cities until /quit
    Interactive,
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    C,
    F,
    Toggle,
}

/// Where and how big to draw the chart.
struct ChartOutput {
    path: Option<PathBuf>,
    width: u32,
    height: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = wx_core::init() {
        eprintln!("{}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            match e.downcast_ref::<AppError>() {
                Some(app) => eprintln!("{} ({})", app.user_message(), app),
                None => eprintln!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let (config, _) = Config::load_validated(cli.config.as_deref())?;

    let timeout = Duration::from_secs(config.api.timeout_secs);
    let geocoder = GeocodingClient::new(&config.api.geocoding_url, timeout, &config.api.language)
        .map_err(AppError::from)?;
    let provider =
        WeatherProvider::new(&config.api.forecast_url, timeout).map_err(AppError::from)?;

    let coordinates = cli.lat.zip(cli.lon).or_else(|| config.location.coordinates());
    let location = ConfiguredLocation::new(config.location.enabled, coordinates);
    let prefs = PreferenceStore::new(config.preferences_path());

    let mut widget = WeatherWidget::new(geocoder, provider, location, prefs);
    let chart = ChartOutput {
        path: cli.chart,
        width: config.chart.width,
        height: config.chart.height,
    };

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Search { city } => {
            widget.search(&city.join(" ")).await;
            show(&widget, &chart)?;
        }
        Command::Locate => {
            widget.locate().await;
            show(&widget, &chart)?;
        }
        Command::Unit { unit } => {
            match unit {
                UnitArg::C => widget.set_unit(TemperatureUnit::Celsius),
                UnitArg::F => widget.set_unit(TemperatureUnit::Fahrenheit),
                UnitArg::Toggle => {
                    widget.toggle_unit();
                }
            }
            println!("{}", widget.unit_label());
        }
        Command::Interactive => interactive(&mut widget, &chart).await?,
    }

    Ok(if widget.status().bad {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

const HELP: &str = "Type a city name, or: /loc  /unit  /chart <file.svg>  /quit";

async fn interactive<L: LocationSource>(
    widget: &mut WeatherWidget<L>,
    chart: &ChartOutput,
) -> Result<()> {
    println!("{}  ({})", HELP, widget.unit_label());
    widget.auto_locate().await;
    show(widget, chart)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/q" => break,
            "/help" => println!("{}", HELP),
            "/loc" => {
                widget.locate().await;
                show(widget, chart)?;
            }
            "/unit" => {
                widget.toggle_unit();
                println!("{}", widget.unit_label());
                show(widget, chart)?;
            }
            cmd if cmd.starts_with("/chart") => {
                let target = cmd.trim_start_matches("/chart").trim();
                match (target.is_empty(), &chart.path) {
                    (false, _) => write_chart(widget, Path::new(target), chart)?,
                    (true, Some(path)) => write_chart(widget, path, chart)?,
                    (true, None) => println!("Usage: /chart <file.svg>"),
                }
            }
            query => {
                widget.search(query).await;
                show(widget, chart)?;
            }
        }
        prompt()?;
    }

    Ok(())
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush().context("Failed to flush stdout")
}

/// Print the status line and card, and refresh the chart file if one was requested.
fn show<L: LocationSource>(widget: &WeatherWidget<L>, chart: &ChartOutput) -> Result<()> {
    let status = widget.status();
    if !status.message.is_empty() {
        if status.bad {
            eprintln!("{}", status.message);
        } else {
            println!("{}", status.message);
        }
    }

    if let Some(view) = widget.view() {
        println!("{}", view);
        if let Some(path) = &chart.path {
            write_chart(widget, path, chart)?;
        }
    }

    Ok(())
}

fn write_chart<L: LocationSource>(
    widget: &WeatherWidget<L>,
    path: &Path,
    chart: &ChartOutput,
) -> Result<()> {
    if widget.view().is_none() {
        println!("Nothing to chart yet.");
        return Ok(());
    }

    let backend = SVGBackend::new(path, (chart.width, chart.height));
    let mut surface = BackendSurface::new(backend, CHART_BACKGROUND);
    if widget.draw_chart(&mut surface).is_some() {
        tracing::info!("Chart written to {}", path.display());
    }
    surface
        .finish()
        .with_context(|| format!("Failed to write chart to {}", path.display()))
}
