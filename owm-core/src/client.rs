//! OpenWeatherMap HTTP client.
//!
//! Every response goes through the same trust boundary: the body is parsed
//! into a `serde_json::Value`, checked against the endpoint's declared
//! [`ObjectSchema`] when it has one, and only then decoded into the typed
//! model.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::{
    config::Config,
    error::ApiError,
    model::{
        AirPollutionResponse, CityInfo, Coordinates, CurrentWeatherResponse, ForecastResponse,
        GeocodingResult,
    },
    schema::{AIR_POLLUTION_SCHEMA, FORECAST_SCHEMA, ObjectSchema, SchemaViolation},
};

#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    /// 5 day / 3 hour forecast for `coords`.
    async fn fetch_forecast(&self, coords: Coordinates) -> Result<ForecastResponse, ApiError>;

    /// Current air pollution readings for `coords`.
    async fn fetch_air_pollution(
        &self,
        coords: Coordinates,
    ) -> Result<AirPollutionResponse, ApiError>;

    /// Best geocoding match for `name` in `country_code` (ISO 3166).
    async fn geocode_city(&self, name: &str, country_code: &str) -> Result<Coordinates, ApiError>;

    /// Current weather lookup, normalized into a [`CityInfo`].
    async fn fetch_current_weather(&self, coords: Coordinates) -> Result<CityInfo, ApiError>;

    /// Geocode a city, then look up its current weather record.
    ///
    /// A failure in either step is logged with the step that failed and
    /// returned unchanged; nothing is retried.
    async fn resolve_city_info(
        &self,
        name: &str,
        country_code: &str,
    ) -> Result<CityInfo, ApiError> {
        let coords = self.geocode_city(name, country_code).await.inspect_err(|err| {
            error!(city = name, country = country_code, error = %err, "Error fetching coordinates");
        })?;
        debug!(city = name, %coords, "Resolved coordinates");

        self.fetch_current_weather(coords).await.inspect_err(|err| {
            error!(city = name, %coords, error = %err, "Error fetching city data");
        })
    }
}

#[derive(Clone)]
pub struct WeatherApiClient {
    api_key: String,
    base_url: String,
    geo_url: String,
    http: Client,
}

impl Debug for WeatherApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiClient")
            .field("base_url", &self.base_url)
            .field("geo_url", &self.geo_url)
            .finish_non_exhaustive()
    }
}

impl WeatherApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let api_key = config.api_key()?.to_owned();

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            geo_url: config.geo_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Issue a GET and parse the body as JSON, mapping transport and HTTP
    /// failures to `Network`.
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        debug!(url, "Sending request");

        let res = self
            .http
            .get(url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| network_error(url, e))?;

        if !status.is_success() {
            return Err(ApiError::Network(format!(
                "{url} failed with status {status}: {}",
                truncate_body(&body)
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ApiError::Schema(vec![SchemaViolation::malformed("", format!("invalid JSON: {e}"))])
        })
    }

    fn coord_query(coords: Coordinates) -> [(&'static str, String); 2] {
        [("lat", coords.lat.to_string()), ("lon", coords.lon.to_string())]
    }

    /// Forecast body as received, before any contract check.
    pub async fn fetch_forecast_body(&self, coords: Coordinates) -> Result<Value, ApiError> {
        let url = format!("{}/forecast", self.base_url);
        self.get_json(&url, &Self::coord_query(coords)).await
    }

    /// Air pollution body as received, before any contract check.
    pub async fn fetch_air_pollution_body(&self, coords: Coordinates) -> Result<Value, ApiError> {
        let url = format!("{}/air_pollution", self.base_url);
        self.get_json(&url, &Self::coord_query(coords)).await
    }
}

/// Verify `value` against `schema`, then decode it.
pub fn decode<T: DeserializeOwned>(
    value: Value,
    schema: Option<&ObjectSchema>,
) -> Result<T, ApiError> {
    if let Some(schema) = schema {
        let violations = schema.validate(&value);
        if !violations.is_empty() {
            return Err(ApiError::Schema(violations));
        }
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::Schema(vec![SchemaViolation::malformed("", e.to_string())]))
}

#[async_trait]
impl WeatherApi for WeatherApiClient {
    #[instrument(skip(self), fields(lat = coords.lat, lon = coords.lon))]
    async fn fetch_forecast(&self, coords: Coordinates) -> Result<ForecastResponse, ApiError> {
        let body = self.fetch_forecast_body(coords).await?;
        decode(body, Some(&FORECAST_SCHEMA))
    }

    #[instrument(skip(self), fields(lat = coords.lat, lon = coords.lon))]
    async fn fetch_air_pollution(
        &self,
        coords: Coordinates,
    ) -> Result<AirPollutionResponse, ApiError> {
        let body = self.fetch_air_pollution_body(coords).await?;
        decode(body, Some(&AIR_POLLUTION_SCHEMA))
    }

    #[instrument(skip(self))]
    async fn geocode_city(&self, name: &str, country_code: &str) -> Result<Coordinates, ApiError> {
        let url = format!("{}/direct", self.geo_url);
        let query = [("q", format!("{name},{country_code}")), ("limit", "1".to_string())];

        let body = self.get_json(&url, &query).await?;
        let results: Vec<GeocodingResult> = decode(body, None)?;

        let best = results
            .first()
            .ok_or_else(|| ApiError::NotFound(format!("City not found: {name},{country_code}")))?;
        debug!(name = %best.name, country = %best.country, "Geocoding match");

        Ok(Coordinates::from(best))
    }

    #[instrument(skip(self), fields(lat = coords.lat, lon = coords.lon))]
    async fn fetch_current_weather(&self, coords: Coordinates) -> Result<CityInfo, ApiError> {
        let url = format!("{}/weather", self.base_url);
        let body = self.get_json(&url, &Self::coord_query(coords)).await?;
        let raw: CurrentWeatherResponse = decode(body, None)?;
        Ok(CityInfo::from(raw))
    }
}

fn network_error(url: &str, err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Network(format!("{url}: request timed out: {err}"))
    } else {
        ApiError::Network(format!("{url}: {err}"))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
