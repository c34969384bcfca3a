//! Placeholder forecast simulation.
//!
//! Not a model: a decaying seasonal random walk seeded from the last
//! observed AQI, kept so downstream consumers have a forecast-shaped
//! payload to integrate against until a real model exists.

use chrono::{Months, NaiveDate};
use rand::Rng;
use serde::Serialize;

use crate::dataset::context::TrendPoint;

/// AQI assumed when the last observation is missing.
const FALLBACK_AQI: f64 = 150.0;
/// Month-over-month decay applied to the walk.
const DECAY: f64 = 0.95;
/// Amplitude of the annual seasonal swing.
const SEASONAL_AMPLITUDE: f64 = 0.1;
/// Half-width of the uniform noise factor.
const NOISE: f64 = 0.05;

/// One simulated future observation.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub aqi: f64,
}

/// Simulated forecast for one city: recent history plus future points.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub city: String,
    pub model: String,
    pub horizon: usize,
    pub historical: Vec<TrendPoint>,
    pub forecast: Vec<ForecastPoint>,
}

/// Walks `horizon` months forward from the last observation.
///
/// Each step applies the decay, a sinusoidal seasonal factor, and a small
/// uniform noise factor, then rounds to two decimals.
pub(crate) fn simulate(
    last_date: NaiveDate,
    last_aqi: Option<f64>,
    horizon: usize,
    rng: &mut impl Rng,
) -> Vec<ForecastPoint> {
    let mut current = last_aqi.unwrap_or(FALLBACK_AQI);
    let mut points = Vec::with_capacity(horizon);

    for step in 0..horizon {
        let seasonal = 1.0
            + SEASONAL_AMPLITUDE * (2.0 * std::f64::consts::PI * step as f64 / 12.0).sin();
        let noise = 1.0 + rng.random_range(-NOISE..NOISE);
        current = current * DECAY * seasonal * noise;

        points.push(ForecastPoint {
            date: last_date + Months::new(step as u32 + 1),
            aqi: (current * 100.0).round() / 100.0,
        });
    }

    points
}
