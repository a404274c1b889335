use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use owm_core::{
    CheckOptions, Config, Coordinates, JAKARTA_SELATAN, WeatherApi, WeatherApiClient, run_checks,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "owm", version, about = "OpenWeatherMap client and contract checker")]
pub struct Cli {
    /// Print the decoded response as JSON instead of a summary.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct CoordArgs {
    /// Latitude in decimal degrees.
    #[arg(long, default_value_t = JAKARTA_SELATAN.lat, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in decimal degrees.
    #[arg(long, default_value_t = JAKARTA_SELATAN.lon, allow_hyphen_values = true)]
    pub lon: f64,
}

impl CoordArgs {
    fn coordinates(&self) -> anyhow::Result<Coordinates> {
        let coords = Coordinates::new(self.lat, self.lon);
        if !coords.is_valid() {
            bail!("Coordinates out of range: lat must be -90..90, lon must be -180..180");
        }
        Ok(coords)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key.
    Configure,

    /// Show the 5 day / 3 hour forecast.
    Forecast(CoordArgs),

    /// Show current air pollution readings.
    AirPollution(CoordArgs),

    /// Resolve a city to coordinates.
    Geocode {
        /// City name, e.g. "Jakarta Selatan".
        city: String,
        /// ISO 3166 country code, e.g. "ID".
        country: String,
    },

    /// Geocode a city and show its normalized current-weather record.
    City {
        city: String,
        country: String,
    },

    /// Run the live API contract checks.
    Check {
        /// City name the forecast endpoint should report for the fixture location.
        #[arg(long, default_value = "Rawa Barat")]
        expected_city: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure()?,
            Command::Forecast(args) => {
                let client = connect()?;
                let forecast = client.fetch_forecast(args.coordinates()?).await?;
                if self.json {
                    output::print_json(&forecast)?;
                } else {
                    print!("{}", output::render_forecast(&forecast));
                }
            }
            Command::AirPollution(args) => {
                let client = connect()?;
                let air = client.fetch_air_pollution(args.coordinates()?).await?;
                if self.json {
                    output::print_json(&air)?;
                } else {
                    print!("{}", output::render_air_pollution(&air));
                }
            }
            Command::Geocode { city, country } => {
                let client = connect()?;
                let coords = client.geocode_city(&city, &country).await?;
                if self.json {
                    output::print_json(&coords)?;
                } else {
                    println!("{city}, {country}: lat {} lon {}", coords.lat, coords.lon);
                }
            }
            Command::City { city, country } => {
                let client = connect()?;
                let info = client
                    .resolve_city_info(&city, &country)
                    .await
                    .with_context(|| format!("Failed to resolve city info for {city}, {country}"))?;
                if self.json {
                    output::print_json(&info)?;
                } else {
                    print!("{}", output::render_city_info(&info));
                }
            }
            Command::Check { expected_city } => {
                let client = connect()?;
                let opts = CheckOptions { expected_city, ..CheckOptions::default() };
                let report = run_checks(&client, &opts).await;

                for outcome in &report.outcomes {
                    println!("{outcome}");
                }

                let failed = report.failed().count();
                if failed > 0 {
                    bail!("{failed} of {} contract checks failed", report.outcomes.len());
                }
            }
        }

        Ok(())
    }
}

/// Build a client from the stored config plus environment overrides.
fn connect() -> anyhow::Result<WeatherApiClient> {
    let config = Config::load()?.with_env_overrides();
    Ok(WeatherApiClient::new(&config)?)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key.trim().to_string());
    config.api_key()?;

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_defaults_to_fixture_coordinates() {
        let cli = Cli::try_parse_from(["owm", "forecast"]).expect("should parse");
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast command");
        };
        assert_eq!(args.coordinates().unwrap(), JAKARTA_SELATAN);
    }

    #[test]
    fn negative_latitude_is_accepted() {
        let cli = Cli::try_parse_from(["owm", "air-pollution", "--lat", "-33.86", "--lon", "151.2"])
            .expect("should parse");
        let Command::AirPollution(args) = cli.command else {
            panic!("expected air-pollution command");
        };
        assert_eq!(args.coordinates().unwrap(), Coordinates::new(-33.86, 151.2));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let args = CoordArgs { lat: 95.0, lon: 0.0 };
        assert!(args.coordinates().is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["owm", "geocode", "Jakarta Selatan", "ID", "--json", "-vv"])
            .expect("should parse");
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Geocode { .. }));
    }

    #[test]
    fn check_expected_city_default() {
        let cli = Cli::try_parse_from(["owm", "check"]).expect("should parse");
        let Command::Check { expected_city } = cli.command else {
            panic!("expected check command");
        };
        assert_eq!(expected_city, "Rawa Barat");
    }
}
