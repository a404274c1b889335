use chrono::{DateTime, Utc};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{DeserializeOwned, Error as _},
};
use serde_json::{Number, Value};

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Fixture location used by the contract checks.
pub const JAKARTA_SELATAN: Coordinates = Coordinates { lat: -6.2615, lon: 106.8106 };

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

// The forecast and air pollution models only insist on what their schemas
// declare. Anything else decodes leniently: missing or mistyped values become
// `None`, so a body with zero schema violations always decodes.

/// Missing or mistyped values decode as `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Array elements that do not decode as `T` are dropped.
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values.into_iter().filter_map(|v| serde_json::from_value(v).ok()).collect())
}

/// Any JSON number, truncated to an integer.
fn any_integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = Number::deserialize(deserializer)?;
    n.as_i64()
        .or_else(|| n.as_f64().map(|f| f as i64))
        .ok_or_else(|| D::Error::custom(format!("number {n} is not representable")))
}

// ---------------------------------------------------------------------------
// GET /forecast
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub cod: String,
    pub message: f64,
    #[serde(deserialize_with = "any_integer")]
    pub cnt: i64,
    pub list: Vec<ForecastEntry>,
    pub city: ForecastCity,
}

/// One 3-hour step of the 5 day forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastEntry {
    #[serde(deserialize_with = "any_integer")]
    pub dt: i64,
    pub main: MainReadings,
    #[serde(deserialize_with = "lenient_items")]
    pub weather: Vec<Condition>,
    pub clouds: Clouds,
    pub wind: Wind,
    /// Metres.
    pub visibility: f64,
    /// Probability of precipitation, 0.0..=1.0.
    pub pop: f64,
    pub sys: ForecastSys,
    pub dt_txt: String,
}

impl ForecastEntry {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.dt)
    }

    pub fn description(&self) -> &str {
        self.weather.iter().find_map(|w| w.description.as_deref()).unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MainReadings {
    /// Kelvin, the API default unit.
    #[serde(default, deserialize_with = "lenient")]
    pub temp: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub feels_like: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub temp_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub temp_max: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub pressure: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub main: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Clouds {
    /// Cloudiness, %.
    #[serde(default, deserialize_with = "lenient")]
    pub all: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wind {
    #[serde(default, deserialize_with = "lenient")]
    pub speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub deg: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastSys {
    /// Part of day, `d` or `n`.
    #[serde(default, deserialize_with = "lenient")]
    pub pod: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastCity {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub coord: Option<Coordinates>,
    #[serde(default, deserialize_with = "lenient")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub population: Option<u64>,
    /// Shift in seconds from UTC.
    #[serde(default, deserialize_with = "lenient")]
    pub timezone: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    pub sunrise: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub sunset: Option<i64>,
}

// ---------------------------------------------------------------------------
// GET /air_pollution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirPollutionResponse {
    pub coord: EchoedCoordinates,
    pub list: Vec<AirPollutionEntry>,
}

/// Query coordinates as echoed back by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EchoedCoordinates {
    #[serde(default, deserialize_with = "lenient")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub lon: Option<f64>,
}

impl EchoedCoordinates {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.lat?, self.lon?))
    }
}

impl From<Coordinates> for EchoedCoordinates {
    fn from(coords: Coordinates) -> Self {
        Self { lat: Some(coords.lat), lon: Some(coords.lon) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirPollutionEntry {
    pub main: AirQuality,
    pub components: Components,
    #[serde(deserialize_with = "any_integer")]
    pub dt: i64,
}

impl AirPollutionEntry {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.dt)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirQuality {
    /// Air quality index, 1 (good) ..= 5 (very poor).
    #[serde(default, deserialize_with = "lenient")]
    pub aqi: Option<u8>,
}

/// Pollutant concentrations in μg/m³; `None` when the API omits one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, deserialize_with = "lenient")]
    pub co: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub no: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub no2: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub o3: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub so2: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub pm2_5: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub pm10: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub nh3: Option<f64>,
}

// ---------------------------------------------------------------------------
// GET /geo/1.0/direct
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingResult {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
}

impl From<&GeocodingResult> for Coordinates {
    fn from(result: &GeocodingResult) -> Self {
        Coordinates::new(result.lat, result.lon)
    }
}

// ---------------------------------------------------------------------------
// GET /weather
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CurrentWeatherResponse {
    pub id: u64,
    pub name: String,
    pub coord: Coordinates,
    pub sys: CurrentSys,
    pub timezone: i32,
    #[serde(default)]
    pub population: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CurrentSys {
    #[serde(default)]
    pub country: String,
    pub sunrise: i64,
    pub sunset: i64,
}

/// City population, which the current weather endpoint usually omits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    Known(u64),
    Unknown,
}

impl Population {
    /// Zero is treated the same as absent.
    pub fn from_reported(value: Option<u64>) -> Self {
        match value {
            Some(n) if n > 0 => Population::Known(n),
            _ => Population::Unknown,
        }
    }
}

impl std::fmt::Display for Population {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Population::Known(n) => write!(f, "{n}"),
            Population::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for Population {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Population::Known(n) => serializer.serialize_u64(*n),
            Population::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

/// Normalized city record built from a current weather lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityInfo {
    pub id: u64,
    pub name: String,
    pub coord: Coordinates,
    pub country: String,
    pub population: Population,
    /// Shift in seconds from UTC.
    pub timezone: i32,
    pub sunrise: i64,
    pub sunset: i64,
}

impl CityInfo {
    pub fn sunrise_utc(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.sunrise)
    }

    pub fn sunset_utc(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.sunset)
    }
}

impl From<CurrentWeatherResponse> for CityInfo {
    fn from(raw: CurrentWeatherResponse) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            coord: raw.coord,
            country: raw.sys.country,
            population: Population::from_reported(raw.population),
            timezone: raw.timezone,
            sunrise: raw.sys.sunrise,
            sunset: raw.sys.sunset,
        }
    }
}

pub fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coordinate_ranges() {
        assert!(JAKARTA_SELATAN.is_valid());
        assert!(Coordinates::new(90.0, -180.0).is_valid());
        assert!(!Coordinates::new(90.5, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, 180.1).is_valid());
    }

    #[test]
    fn population_serializes_as_number_or_unknown() {
        assert_eq!(serde_json::to_value(Population::Known(42)).unwrap(), json!(42));
        assert_eq!(serde_json::to_value(Population::Unknown).unwrap(), json!("unknown"));
        assert_eq!(Population::from_reported(Some(0)), Population::Unknown);
        assert_eq!(Population::from_reported(None), Population::Unknown);
        assert_eq!(Population::from_reported(Some(7)), Population::Known(7));
    }

    #[test]
    fn city_info_from_current_weather() {
        let raw: CurrentWeatherResponse = serde_json::from_value(json!({
            "coord": { "lon": 106.8106, "lat": -6.2615 },
            "weather": [],
            "id": 1_624_647,
            "name": "Rawa Barat",
            "sys": { "country": "ID", "sunrise": 1_700_000_000, "sunset": 1_700_043_000 },
            "timezone": 25200
        }))
        .unwrap();

        let info = CityInfo::from(raw);
        assert_eq!(info.name, "Rawa Barat");
        assert_eq!(info.country, "ID");
        assert_eq!(info.coord, JAKARTA_SELATAN);
        assert_eq!(info.population, Population::Unknown);
        assert_eq!(info.timezone, 25200);

        let sunrise = info.sunrise_utc().expect("valid timestamp");
        assert_eq!(sunrise.timestamp(), 1_700_000_000);

        let as_json = serde_json::to_value(&info).unwrap();
        assert_eq!(as_json["population"], json!("unknown"));
    }

    #[test]
    fn forecast_entry_helpers() {
        let entry: ForecastEntry = serde_json::from_value(json!({
            "dt": 1_700_006_400,
            "main": {
                "temp": 301.2, "feels_like": 304.0, "temp_min": 300.1,
                "temp_max": 301.2, "pressure": 1009, "humidity": 78
            },
            "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
            "clouds": { "all": 75 },
            "wind": { "speed": 2.1, "deg": 310 },
            "visibility": 10000,
            "pop": 0.4,
            "sys": { "pod": "d" },
            "dt_txt": "2023-11-15 00:00:00"
        }))
        .unwrap();

        assert_eq!(entry.description(), "light rain");
        let time = entry.time().expect("valid timestamp");
        assert_eq!(time.format("%Y-%m-%d %H:%M:%S").to_string(), entry.dt_txt);
    }

    #[test]
    fn entry_with_only_contract_keys_decodes() {
        let entry: ForecastEntry = serde_json::from_value(json!({
            "dt": 1_700_006_400.0,
            "main": {},
            "weather": [42, { "description": "haze" }],
            "clouds": {},
            "wind": { "speed": "calm" },
            "visibility": 9500.5,
            "pop": 0,
            "sys": {},
            "dt_txt": "2023-11-15 00:00:00"
        }))
        .expect("contract keys are enough");

        assert_eq!(entry.dt, 1_700_006_400);
        assert!(entry.main.temp.is_none());
        assert!(entry.clouds.all.is_none());
        assert!(entry.wind.speed.is_none());
        assert!(entry.sys.pod.is_none());
        assert_eq!(entry.weather.len(), 1);
        assert_eq!(entry.description(), "haze");
    }

    #[test]
    fn missing_components_stay_absent() {
        let entry: AirPollutionEntry = serde_json::from_value(json!({
            "main": {},
            "components": { "pm2_5": 12.5 },
            "dt": 1_700_006_400
        }))
        .unwrap();

        assert_eq!(entry.components.pm2_5, Some(12.5));
        assert_eq!(entry.components.pm10, None);
        assert_eq!(entry.main.aqi, None);

        let as_json = serde_json::to_value(&entry.components).unwrap();
        assert_eq!(as_json["pm10"], Value::Null);
    }

    #[test]
    fn echoed_coordinates_need_both_axes() {
        let full = EchoedCoordinates::from(JAKARTA_SELATAN);
        assert_eq!(full.coordinates(), Some(JAKARTA_SELATAN));

        let half = EchoedCoordinates { lat: Some(1.0), lon: None };
        assert_eq!(half.coordinates(), None);
    }
}
