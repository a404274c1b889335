//! Core library for the `owm` contract checker.
//!
//! This crate defines:
//! - Client configuration & credentials handling
//! - A typed OpenWeatherMap client that validates responses against declared schemas
//! - Shared domain models (coordinates, forecasts, air quality, city info)
//! - Contract checks that exercise the live API
//!
//! It is used by `owm-cli`, but can also be reused by other binaries or test suites.

pub mod check;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod schema;

pub use check::{CheckOptions, CheckOutcome, CheckReport, CheckStatus, run_checks};
pub use client::{WeatherApi, WeatherApiClient};
pub use config::Config;
pub use error::ApiError;
pub use model::{
    AirPollutionResponse, CityInfo, Coordinates, ForecastEntry, ForecastResponse, JAKARTA_SELATAN,
    Population,
};
pub use schema::{AIR_POLLUTION_SCHEMA, FORECAST_SCHEMA, ObjectSchema, SchemaViolation};
