//! Live contract checks against the OpenWeatherMap API.
//!
//! Each check fetches a response for a fixed location and asserts the
//! properties the API is expected to keep stable.

use std::fmt;

use tracing::{info, warn};

use crate::{
    WeatherApi,
    error::ApiError,
    model::{Coordinates, JAKARTA_SELATAN},
};

#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub coords: Coordinates,
    /// `city.name` the forecast endpoint should report for `coords`.
    pub expected_city: String,
    pub geocode_city: String,
    pub geocode_country: String,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            coords: JAKARTA_SELATAN,
            expected_city: "Rawa Barat".to_string(),
            geocode_city: "Jakarta Selatan".to_string(),
            geocode_country: "ID".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Passed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub status: CheckStatus,
}

impl CheckOutcome {
    fn from_result(name: &'static str, result: Result<(), String>) -> Self {
        let status = match result {
            Ok(()) => CheckStatus::Passed,
            Err(reason) => CheckStatus::Failed(reason),
        };
        Self { name, status }
    }

    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            CheckStatus::Passed => write!(f, "PASS  {}", self.name),
            CheckStatus::Failed(reason) => write!(f, "FAIL  {}: {reason}", self.name),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(CheckOutcome::passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }
}

/// Run every contract check in order. A failing check does not stop the rest.
pub async fn run_checks(api: &dyn WeatherApi, opts: &CheckOptions) -> CheckReport {
    let outcomes = vec![
        CheckOutcome::from_result("forecast", check_forecast(api, opts).await),
        CheckOutcome::from_result("air-pollution", check_air_pollution(api, opts).await),
        CheckOutcome::from_result("geocode", check_geocode(api, opts).await),
    ];

    for outcome in &outcomes {
        match &outcome.status {
            CheckStatus::Passed => info!(check = outcome.name, "Check passed"),
            CheckStatus::Failed(reason) => warn!(check = outcome.name, %reason, "Check failed"),
        }
    }

    CheckReport { outcomes }
}

async fn check_forecast(api: &dyn WeatherApi, opts: &CheckOptions) -> Result<(), String> {
    let forecast = api.fetch_forecast(opts.coords).await.map_err(describe)?;

    let name = forecast.city.name.as_deref().unwrap_or("<missing>");
    if name != opts.expected_city {
        return Err(format!("expected city.name '{}', got '{name}'", opts.expected_city));
    }
    Ok(())
}

async fn check_air_pollution(api: &dyn WeatherApi, opts: &CheckOptions) -> Result<(), String> {
    let air = api.fetch_air_pollution(opts.coords).await.map_err(describe)?;

    // The API echoes the query coordinates; they must match exactly.
    if air.coord.coordinates() != Some(opts.coords) {
        return Err(format!("expected coord {:?}, got {:?}", opts.coords, air.coord));
    }
    Ok(())
}

async fn check_geocode(api: &dyn WeatherApi, opts: &CheckOptions) -> Result<(), String> {
    let coords = api
        .geocode_city(&opts.geocode_city, &opts.geocode_country)
        .await
        .map_err(describe)?;

    if !coords.is_valid() {
        return Err(format!("coordinates out of range: {coords:?}"));
    }
    Ok(())
}

fn describe(err: ApiError) -> String {
    match &err {
        ApiError::Schema(violations) => format!("{} schema violation(s): {err}", violations.len()),
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{AirPollutionResponse, CityInfo, ForecastCity, ForecastResponse},
        schema::SchemaViolation,
    };
    use async_trait::async_trait;

    #[derive(Debug)]
    struct FakeApi {
        city_name: &'static str,
        air_coord: Coordinates,
        geocode: Option<Coordinates>,
        forecast_schema_broken: bool,
    }

    impl Default for FakeApi {
        fn default() -> Self {
            Self {
                city_name: "Rawa Barat",
                air_coord: JAKARTA_SELATAN,
                geocode: Some(Coordinates::new(-6.26, 106.81)),
                forecast_schema_broken: false,
            }
        }
    }

    #[async_trait]
    impl WeatherApi for FakeApi {
        async fn fetch_forecast(&self, _: Coordinates) -> Result<ForecastResponse, ApiError> {
            if self.forecast_schema_broken {
                return Err(ApiError::Schema(vec![SchemaViolation::missing("list[0].dt_txt")]));
            }
            Ok(ForecastResponse {
                cod: "200".into(),
                message: 0.0,
                cnt: 0,
                list: vec![],
                city: ForecastCity {
                    name: Some(self.city_name.into()),
                    country: Some("ID".into()),
                    ..ForecastCity::default()
                },
            })
        }

        async fn fetch_air_pollution(
            &self,
            _: Coordinates,
        ) -> Result<AirPollutionResponse, ApiError> {
            Ok(AirPollutionResponse { coord: self.air_coord.into(), list: vec![] })
        }

        async fn geocode_city(&self, name: &str, _: &str) -> Result<Coordinates, ApiError> {
            self.geocode.ok_or_else(|| ApiError::NotFound(name.to_string()))
        }

        async fn fetch_current_weather(&self, _: Coordinates) -> Result<CityInfo, ApiError> {
            Err(ApiError::Network("unused".into()))
        }
    }

    #[tokio::test]
    async fn all_checks_pass_against_expected_data() {
        let report = run_checks(&FakeApi::default(), &CheckOptions::default()).await;

        assert_eq!(report.outcomes.len(), 3);
        assert!(report.all_passed(), "{:?}", report.outcomes);
    }

    #[tokio::test]
    async fn wrong_city_name_fails_only_forecast_check() {
        let api = FakeApi { city_name: "Kebayoran", ..Default::default() };
        let report = run_checks(&api, &CheckOptions::default()).await;

        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "forecast");
        assert!(failed[0].to_string().contains("Kebayoran"));
    }

    #[tokio::test]
    async fn schema_failure_reports_violation_count() {
        let api = FakeApi { forecast_schema_broken: true, ..Default::default() };
        let report = run_checks(&api, &CheckOptions::default()).await;

        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].to_string().contains("1 schema violation(s)"));
    }

    #[tokio::test]
    async fn shifted_air_pollution_coord_fails() {
        let api = FakeApi { air_coord: Coordinates::new(-6.26, 106.81), ..Default::default() };
        let report = run_checks(&api, &CheckOptions::default()).await;

        assert!(!report.all_passed());
        assert_eq!(report.failed().next().map(|o| o.name), Some("air-pollution"));
    }

    #[tokio::test]
    async fn missing_geocode_fails() {
        let api = FakeApi { geocode: None, ..Default::default() };
        let report = run_checks(&api, &CheckOptions::default()).await;

        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "geocode");
        assert!(failed[0].to_string().contains("Not found"));
    }
}
