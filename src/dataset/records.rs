//! Typed rows of the daily air-quality dataset.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One daily observation for one city, as stored in the dataset CSV.
///
/// Measurement columns are optional: empty fields deserialize to `None`
/// and serialize back to JSON null.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DailyRecord {
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "PM2.5")]
    pub pm25: Option<f64>,
    #[serde(rename = "PM10")]
    pub pm10: Option<f64>,
    #[serde(rename = "NO2")]
    pub no2: Option<f64>,
    #[serde(rename = "CO")]
    pub co: Option<f64>,
    #[serde(rename = "SO2")]
    pub so2: Option<f64>,
    #[serde(rename = "O3")]
    pub o3: Option<f64>,
    #[serde(rename = "AQI")]
    pub aqi: Option<f64>,
    #[serde(rename = "AQI_Bucket")]
    pub aqi_bucket: Option<String>,
}

impl DailyRecord {
    /// Calendar year of the observation.
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Calendar month of the observation (1-12).
    pub fn month(&self) -> u32 {
        self.date.month()
    }
}
