//! The in-memory air-quality dataset and its read-only query operations.

mod context;
mod forecast;
mod records;

pub use context::{
    CitySnapshot, DataContext, DateRange, FieldStats, MonthlyAverage, OverallStats,
    PollutantStats, TrendPoint,
};
pub use forecast::{ForecastPoint, ForecastReport};
pub use records::DailyRecord;
