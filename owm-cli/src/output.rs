//! Human-readable rendering of decoded responses.

use std::fmt::Write;

use chrono::{DateTime, FixedOffset, Utc};
use owm_core::{AirPollutionResponse, CityInfo, ForecastResponse};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn render_forecast(forecast: &ForecastResponse) -> String {
    let city = &forecast.city;
    let offset = city.timezone.unwrap_or(0);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}, {} ({} entries)",
        city.name.as_deref().unwrap_or("Unknown"),
        city.country.as_deref().unwrap_or("??"),
        forecast.list.len()
    );
    for entry in &forecast.list {
        let temp = entry
            .main
            .temp
            .map(|k| format!("{:>6.1}°C", kelvin_to_celsius(k)))
            .unwrap_or_else(|| format!("{:>8}", NOT_AVAILABLE));
        let _ = writeln!(
            out,
            "  {}  {temp}  pop {:>3.0}%  {}",
            local_time(entry.dt, offset),
            entry.pop * 100.0,
            entry.description(),
        );
    }
    out
}

pub fn render_air_pollution(air: &AirPollutionResponse) -> String {
    let mut out = String::new();

    let location = air.coord.coordinates().map(|c| c.to_string());
    let _ = writeln!(
        out,
        "Air pollution at {}",
        location.as_deref().unwrap_or(NOT_AVAILABLE)
    );
    for entry in &air.list {
        let time = entry.time().map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string());
        let aqi = entry.main.aqi;
        let c = &entry.components;
        let _ = writeln!(
            out,
            "  {}  AQI {} ({})  PM2.5 {}  PM10 {}  O3 {}  NO2 {} μg/m³",
            time.unwrap_or_else(|| entry.dt.to_string()),
            aqi.map_or_else(|| NOT_AVAILABLE.to_string(), |a| a.to_string()),
            aqi.map_or("Unknown", aqi_label),
            concentration(c.pm2_5),
            concentration(c.pm10),
            concentration(c.o3),
            concentration(c.no2),
        );
    }
    out
}

pub fn render_city_info(info: &CityInfo) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{} ({}), id {}", info.name, info.country, info.id);
    let _ = writeln!(out, "  coordinates: {}", info.coord);
    let _ = writeln!(out, "  population:  {}", info.population);
    let _ = writeln!(out, "  timezone:    UTC{}", utc_offset(info.timezone));
    let _ = writeln!(out, "  sunrise:     {}", local_time(info.sunrise, info.timezone));
    let _ = writeln!(out, "  sunset:      {}", local_time(info.sunset, info.timezone));
    out
}

const NOT_AVAILABLE: &str = "n/a";

fn concentration(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.1}"))
}

fn kelvin_to_celsius(k: f64) -> f64 {
    k - 273.15
}

fn aqi_label(aqi: u8) -> &'static str {
    match aqi {
        1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very Poor",
        _ => "Unknown",
    }
}

/// Format a unix timestamp in the city's local time; falls back to the raw value.
fn local_time(ts: i64, offset_secs: i32) -> String {
    let Some(offset) = FixedOffset::east_opt(offset_secs) else {
        return ts.to_string();
    };
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|t| t.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn utc_offset(offset_secs: i32) -> String {
    let sign = if offset_secs < 0 { '-' } else { '+' };
    let abs = offset_secs.unsigned_abs();
    format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
}
