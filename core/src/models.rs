use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Direction of a weight entry relative to the most recent known weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    #[serde(rename = "increasing")]
    Increasing,
    #[serde(rename = "decreasing")]
    Decreasing,
    #[serde(rename = "stable")]
    Stable,
    #[serde(rename = "no trend", alias = "No trend")]
    NoTrend,
    #[serde(rename = "no weight provided", alias = "No weight provided")]
    NoWeightProvided,
}

impl Trend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
            Self::NoTrend => "no trend",
            Self::NoWeightProvided => "no weight provided",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trend {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "increasing" => Ok(Self::Increasing),
            "decreasing" => Ok(Self::Decreasing),
            "stable" => Ok(Self::Stable),
            "no trend" => Ok(Self::NoTrend),
            "no weight provided" => Ok(Self::NoWeightProvided),
            _ => Err(ValidationError::UnknownLabel {
                field: "trend".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl ToSql for Trend {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Trend {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// One stored row: everything measured on a single calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub notes: Option<String>,
    pub trend: Option<Trend>,
    pub sleep_duration: Option<f64>,
    pub resting_heart_rate: Option<u32>,
}

impl MeasurementRecord {
    /// Build the row to store for a new entry with its already computed trend.
    #[must_use]
    pub fn from_new(entry: NewMeasurement, trend: Trend) -> Self {
        Self {
            date: entry.date,
            weight: entry.weight,
            notes: normalize_notes(entry.notes),
            trend: Some(trend),
            sleep_duration: entry.sleep_duration,
            resting_heart_rate: entry.resting_heart_rate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMeasurement {
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub notes: Option<String>,
    pub sleep_duration: Option<f64>,
    pub resting_heart_rate: Option<u32>,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateMeasurement {
    pub weight: Option<f64>,
    pub notes: Option<String>,
    pub trend: Option<Trend>,
    pub sleep_duration: Option<f64>,
    pub resting_heart_rate: Option<u32>,
}

impl UpdateMeasurement {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weight.is_none()
            && self.notes.is_none()
            && self.trend.is_none()
            && self.sleep_duration.is_none()
            && self.resting_heart_rate.is_none()
    }
}

/// Empty notes are the same as no notes; this keeps CSV round-trips exact.
#[must_use]
pub fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}
