use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, bail};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, CustomType, Text};
use tempo_core::{
    AppState, Config, Coordinate, TimelineProvider, WeatherApp, WeatherEntry, WeatherStore,
    config::DefaultLocation,
    location::FixedLocationService,
    provider::provider_from_config,
    widget::EntryView,
};
use tracing::info;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "tempo", version, about = "Current-location weather and its widget")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the OpenWeather API key and a default location.
    Configure,

    /// Locate, fetch current weather once and publish it to the widget.
    Fetch(FetchArgs),

    /// Answer widget host requests from the shared store.
    Widget {
        #[command(subcommand)]
        request: WidgetRequest,
    },

    /// Inspect the shared app-group store.
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Latitude in degrees; defaults to the configured location.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude in degrees; defaults to the configured location.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Behave as if location permission was refused.
    #[arg(long)]
    deny: bool,
}

#[derive(Debug, Subcommand)]
pub enum WidgetRequest {
    /// Entry shown before any data is known.
    Placeholder,
    /// One-off entry from the latest stored weather.
    Snapshot,
    /// Current entry plus the next reload time.
    Timeline,
    /// Keep rendering the timeline, reloading when it asks to.
    Watch,
}

#[derive(Debug, Subcommand)]
pub enum StoreAction {
    /// Print the stored snapshot.
    Show,
    /// Delete the stored snapshot.
    Clear,
    /// Print where the snapshot lives.
    Path,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        let config = Config::load_from(&config_path)?;

        match self.command {
            Command::Configure => configure(config, &config_path),
            Command::Fetch(args) => fetch(&config, args).await,
            Command::Widget { request } => widget(&config, request).await,
            Command::Store { action } => store(&config, action),
        }
    }
}

fn configure(mut config: Config, path: &std::path::Path) -> anyhow::Result<()> {
    println!("Configuring OpenWeather");

    let current = if config.has_api_key() {
        config.api_key.clone()
    } else {
        String::new()
    };
    let api_key = Text::new("API key:")
        .with_default(&current)
        .prompt()
        .context("Failed to read API key")?;
    config.api_key = api_key.trim().to_string();

    let set_location = Confirm::new("Set a default location?")
        .with_default(config.default_location.is_none())
        .prompt()
        .context("Failed to read answer")?;
    if set_location {
        let lat = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read latitude")?;
        let lon = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read longitude")?;
        config.default_location = Some(DefaultLocation { lat, lon });
    }

    config.save_to(path)?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

async fn fetch(config: &Config, args: FetchArgs) -> anyhow::Result<()> {
    let store = WeatherStore::from_config(config)?;
    let provider = provider_from_config(config)?;
    let mut app = WeatherApp::new(Arc::new(provider), store);

    let state = if args.deny {
        app.run(&mut FixedLocationService::denied()).await
    } else {
        let at = match (args.lat, args.lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon),
            _ => config.default_coordinate().ok_or_else(|| {
                anyhow::anyhow!(
                    "No location given.\n\
                     Hint: pass `--lat` and `--lon`, or run `tempo configure` to set a default."
                )
            })?,
        };
        app.run(&mut FixedLocationService::new(at)).await
    };

    println!("{}", app_view(state));
    Ok(())
}

/// Summary of a finished app run.
fn app_view(state: &AppState) -> String {
    let mut lines = Vec::new();

    match state.location {
        Some(at) => {
            lines.push(format!("Latitude: {}", at.latitude));
            lines.push(format!("Longitude: {}", at.longitude));
        }
        None => lines.push("No location available.".to_string()),
    }

    if let Some(weather) = &state.weather {
        lines.push("----".to_string());
        lines.push(format!("City: {}", weather.name));
        lines.push(format!("Temperature: {:.1}°C", weather.main.temp));
        lines.push(format!(
            "Weather: {}",
            weather.description().unwrap_or("unknown")
        ));
    } else if state.location.is_some() {
        lines.push("No weather available.".to_string());
    }

    lines.join("\n")
}

async fn widget(config: &Config, request: WidgetRequest) -> anyhow::Result<()> {
    let provider = TimelineProvider::new(WeatherStore::from_config(config)?, config.refresh_interval());

    match request {
        WidgetRequest::Placeholder => print_entry(&provider.placeholder(Utc::now())),
        WidgetRequest::Snapshot => print_entry(&provider.snapshot(Utc::now())),
        WidgetRequest::Timeline => {
            let timeline = provider.timeline(Utc::now());
            timeline.entries.iter().for_each(print_entry);
            println!("next reload: {}", timeline.next_reload().with_timezone(&Local));
        }
        WidgetRequest::Watch => loop {
            let timeline = provider.timeline(Utc::now());
            timeline.entries.iter().for_each(print_entry);

            let next = timeline.next_reload();
            info!(%next, "waiting for next reload");
            let wait = (next - Utc::now()).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = tokio::signal::ctrl_c() => break,
            }
        },
    }

    Ok(())
}

fn print_entry(entry: &WeatherEntry) {
    println!("[{}]", entry.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    println!("{}", EntryView(entry));
}

fn store(config: &Config, action: StoreAction) -> anyhow::Result<()> {
    let store = WeatherStore::from_config(config)?;

    match action {
        StoreAction::Path => println!("{}", store.path().display()),
        StoreAction::Show => match store.try_load()? {
            Some(snapshot) => {
                println!("written at: {}", snapshot.written_at.with_timezone(&Local));
                let record = &snapshot.record;
                println!("{} ({}, {})", record.name, record.coord.lat, record.coord.lon);
                println!(
                    "{:.1}°C (feels like {:.1}°C, {:.1}..{:.1}°C)",
                    record.main.temp, record.main.feels_like, record.main.temp_min, record.main.temp_max
                );
                println!("{} hPa, {}% humidity", record.main.pressure, record.main.humidity);
                for condition in &record.weather {
                    println!("{} [{}] {} ({})", condition.main, condition.id, condition.description, condition.icon);
                }
                if let Some(observed) = record.observed_at() {
                    println!("observed at: {}", observed.with_timezone(&Local));
                }
            }
            None => bail!("No weather saved yet.\nHint: run `tempo fetch` first."),
        },
        StoreAction::Clear => {
            if store.clear()? {
                println!("Removed {}", store.path().display());
            } else {
                println!("Nothing stored.");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fetch_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["tempo", "fetch", "--lat", "-33.86", "--lon", "151.2"]).unwrap();
        match cli.command {
            Command::Fetch(args) => {
                assert_eq!(args.lat, Some(-33.86));
                assert_eq!(args.lon, Some(151.2));
                assert!(!args.deny);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn fetch_requires_both_coordinates() {
        assert!(Cli::try_parse_from(["tempo", "fetch", "--lat", "1.0"]).is_err());
    }

    #[test]
    fn app_view_after_denied_run_reports_no_location() {
        let view = app_view(&AppState::default());
        assert_eq!(view, "No location available.");
    }

    #[test]
    fn app_view_after_failed_fetch_reports_no_weather() {
        let state = AppState {
            location: Some(Coordinate::new(37.5, 127.0)),
            weather: None,
        };
        assert_eq!(
            app_view(&state),
            "Latitude: 37.5\nLongitude: 127\nNo weather available."
        );
    }

    #[test]
    fn widget_subcommands_parse() {
        let cli = Cli::try_parse_from(["tempo", "--config", "/tmp/t.toml", "widget", "timeline"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
        assert!(matches!(
            cli.command,
            Command::Widget { request: WidgetRequest::Timeline }
        ));
    }
}
