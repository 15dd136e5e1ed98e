use chrono::NaiveDate;
use serde::Serialize;

/// A single named, dated observation handed to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    name: String,
    date: NaiveDate,
    value: f64,
}

impl Metric {
    pub fn new(name: impl Into<String>, date: NaiveDate, value: f64) -> Metric {
        Metric {
            name: name.into(),
            date,
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.date(), self.name(), self.value())
    }
}
