//! In-memory dataset context and its read-only query operations.
//!
//! The whole dataset is loaded once into an explicitly constructed
//! [`DataContext`] and treated as immutable; `reload` is the only way to
//! refresh it. Every query borrows the context, so callers decide when and
//! where the table lives instead of relying on process-global state.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

use crate::dataset::forecast::{self, ForecastReport};
use crate::dataset::records::DailyRecord;
use crate::error::AppError;

/// Pollutant columns exposed by the statistics queries, in presentation
/// order.
const POLLUTANTS: &[(&str, fn(&DailyRecord) -> Option<f64>)] = &[
    ("PM2.5", |r| r.pm25),
    ("PM10", |r| r.pm10),
    ("NO2", |r| r.no2),
    ("CO", |r| r.co),
    ("SO2", |r| r.so2),
    ("O3", |r| r.o3),
];

/// Most recent observation for one city, flattened for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct CitySnapshot {
    pub city: String,
    pub date: NaiveDate,
    pub aqi: Option<f64>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub co: Option<f64>,
    pub so2: Option<f64>,
    pub o3: Option<f64>,
}

/// One point of a city's AQI time series.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub aqi: Option<f64>,
}

/// Mean AQI for one calendar month, null when the month has no readings.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyAverage {
    pub month: String,
    pub aqi: Option<f64>,
}

/// Summary statistics over one measurement column.
#[derive(Debug, Clone, Serialize)]
pub struct FieldStats {
    pub mean: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub std: Option<f64>,
}

/// Per-pollutant statistics for one city.
#[derive(Debug, Clone, Serialize)]
pub struct PollutantStats {
    pub pollutant: String,
    #[serde(flatten)]
    pub stats: FieldStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Statistics across the whole table.
#[derive(Debug, Clone, Serialize)]
pub struct OverallStats {
    pub total_records: usize,
    pub cities_count: usize,
    pub date_range: DateRange,
    pub average_aqi: Option<f64>,
    pub max_aqi: Option<f64>,
    pub min_aqi: Option<f64>,
}

/// The dataset held in memory for the lifetime of the process.
#[derive(Debug)]
pub struct DataContext {
    path: PathBuf,
    records: Vec<DailyRecord>,
}

impl DataContext {
    /// Loads the dataset from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the file is missing and
    /// `AppError::Csv` if any row fails to parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();
        let records = read_records(&path)?;
        tracing::info!(path = %path.display(), records = records.len(), "dataset loaded");
        Ok(Self { path, records })
    }

    /// Re-reads the dataset from the path it was loaded from, replacing
    /// the in-memory table.
    pub fn reload(&mut self) -> Result<(), AppError> {
        self.records = read_records(&self.path)?;
        tracing::info!(path = %self.path.display(), records = self.records.len(), "dataset reloaded");
        Ok(())
    }

    /// Number of records in the table.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct city names.
    pub fn cities(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.city.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Most recent observation for a city.
    pub fn latest(&self, city: &str) -> Result<CitySnapshot, AppError> {
        let rows = self.city_rows(city);
        let record = rows
            .last()
            .ok_or_else(|| AppError::UnknownCity(city.to_string()))?;
        Ok(snapshot(record))
    }

    /// Date-ordered AQI series for a city, optionally bounded.
    pub fn trend(
        &self,
        city: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<TrendPoint>, AppError> {
        let points: Vec<TrendPoint> = self
            .city_rows(city)
            .into_iter()
            .filter(|r| start.is_none_or(|s| r.date >= s))
            .filter(|r| end.is_none_or(|e| r.date <= e))
            .map(|r| TrendPoint { date: r.date, aqi: r.aqi })
            .collect();

        if points.is_empty() {
            return Err(AppError::UnknownCity(city.to_string()));
        }
        Ok(points)
    }

    /// Mean AQI per calendar month for a city. Months keep their place in
    /// the series even when every reading is missing.
    pub fn monthly_average(&self, city: &str) -> Result<Vec<MonthlyAverage>, AppError> {
        let rows = self.city_rows(city);
        if rows.is_empty() {
            return Err(AppError::UnknownCity(city.to_string()));
        }

        let mut months: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
        for record in &rows {
            let values = months.entry((record.year(), record.month())).or_default();
            if let Some(aqi) = record.aqi {
                values.push(aqi);
            }
        }

        Ok(months
            .into_iter()
            .map(|((year, month), values)| MonthlyAverage {
                month: format!("{year:04}-{month:02}"),
                aqi: mean(&values),
            })
            .collect())
    }

    /// Mean/max/min/standard deviation per pollutant for a city.
    pub fn pollutant_stats(&self, city: &str) -> Result<Vec<PollutantStats>, AppError> {
        let rows = self.city_rows(city);
        if rows.is_empty() {
            return Err(AppError::UnknownCity(city.to_string()));
        }

        Ok(POLLUTANTS
            .iter()
            .map(|(name, accessor)| {
                let values: Vec<f64> = rows.iter().filter_map(|r| accessor(r)).collect();
                PollutantStats {
                    pollutant: (*name).to_string(),
                    stats: field_stats(&values),
                }
            })
            .collect())
    }

    /// Statistics across all cities.
    pub fn overall_stats(&self) -> Result<OverallStats, AppError> {
        let (start, end) = self
            .records
            .iter()
            .map(|r| r.date)
            .fold(None, |range: Option<(NaiveDate, NaiveDate)>, date| {
                Some(match range {
                    None => (date, date),
                    Some((min, max)) => (min.min(date), max.max(date)),
                })
            })
            .ok_or(AppError::EmptyDataset)?;

        let aqi_values: Vec<f64> = self.records.iter().filter_map(|r| r.aqi).collect();
        let stats = field_stats(&aqi_values);

        Ok(OverallStats {
            total_records: self.records.len(),
            cities_count: self.cities().len(),
            date_range: DateRange { start, end },
            average_aqi: stats.mean,
            max_aqi: stats.max,
            min_aqi: stats.min,
        })
    }

    /// Latest snapshot per requested city. Unknown cities are skipped
    /// rather than failing the whole comparison.
    pub fn compare(&self, cities: &[String]) -> Vec<CitySnapshot> {
        cities
            .iter()
            .filter_map(|city| self.latest(city).ok())
            .collect()
    }

    /// Simulated forecast for a city.
    pub fn forecast(
        &self,
        city: &str,
        model: &str,
        horizon: usize,
    ) -> Result<ForecastReport, AppError> {
        self.forecast_with_rng(city, model, horizon, &mut rand::rng())
    }

    /// Simulated forecast with a caller-supplied RNG, for reproducible
    /// output.
    pub fn forecast_with_rng(
        &self,
        city: &str,
        model: &str,
        horizon: usize,
        rng: &mut impl Rng,
    ) -> Result<ForecastReport, AppError> {
        let rows = self.city_rows(city);

        let historical: Vec<TrendPoint> = rows
            .iter()
            .rev()
            .take(6)
            .rev()
            .map(|r| TrendPoint { date: r.date, aqi: r.aqi })
            .collect();

        let anchor = historical
            .last()
            .ok_or_else(|| AppError::UnknownCity(city.to_string()))?;

        let points = forecast::simulate(anchor.date, anchor.aqi, horizon, rng);

        Ok(ForecastReport {
            city: city.to_string(),
            model: model.to_string(),
            horizon,
            historical,
            forecast: points,
        })
    }

    /// All rows for a city, in date order.
    fn city_rows(&self, city: &str) -> Vec<&DailyRecord> {
        let mut rows: Vec<&DailyRecord> =
            self.records.iter().filter(|r| r.city == city).collect();
        rows.sort_by_key(|r| r.date);
        rows
    }
}

fn read_records(path: &Path) -> Result<Vec<DailyRecord>, AppError> {
    if !path.exists() {
        return Err(AppError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));
    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

fn snapshot(record: &DailyRecord) -> CitySnapshot {
    CitySnapshot {
        city: record.city.clone(),
        date: record.date,
        aqi: record.aqi,
        pm25: record.pm25,
        pm10: record.pm10,
        no2: record.no2,
        co: record.co,
        so2: record.so2,
        o3: record.o3,
    }
}

fn field_stats(values: &[f64]) -> FieldStats {
    FieldStats {
        mean: mean(values),
        max: values.iter().copied().reduce(f64::max),
        min: values.iter().copied().reduce(f64::min),
        std: sample_std(values),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); `None` below two values.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
