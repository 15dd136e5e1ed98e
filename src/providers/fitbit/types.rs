use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::CollectError;
use crate::metric::Metric;

const ACTIVITY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Body of `activities/steps/date/<start>/<end>.json`.
#[derive(Debug, Deserialize)]
pub struct StepsResponse {
    #[serde(rename = "activities-steps", default)]
    pub steps: Vec<DailyValue>,
}

impl StepsResponse {
    pub fn decode(body: &[u8]) -> Result<Vec<DailyValue>, serde_json::Error> {
        serde_json::from_slice::<StepsResponse>(body).map(|resp| resp.steps)
    }
}

/// One day of an activity time series. Fitbit sends the value as a string.
#[derive(Debug, Deserialize)]
pub struct DailyValue {
    #[serde(rename = "dateTime")]
    pub activity_date: String,
    pub value: String,
}

impl DailyValue {
    pub fn into_metric(self, name: &str) -> Result<Metric, CollectError> {
        // chrono alone would also take "2024-3-9" and "+2024-03-09".
        if !is_padded_date(&self.activity_date) {
            return Err(CollectError::ParseDate {
                value: self.activity_date,
                source: None,
            });
        }
        let date = NaiveDate::parse_from_str(&self.activity_date, ACTIVITY_DATE_FORMAT).map_err(
            |source| CollectError::ParseDate {
                value: self.activity_date.clone(),
                source: Some(source),
            },
        )?;

        let value = self
            .value
            .parse::<f64>()
            .map_err(|source| CollectError::ParseValue {
                value: self.value.clone(),
                source,
            })?;
        // "inf" and "NaN" parse fine but are not step counts.
        if !value.is_finite() {
            return Err(CollectError::NonFiniteValue(self.value));
        }

        Ok(Metric::new(name, date, value))
    }
}

/// `YYYY-MM-DD`: ten ASCII bytes, dashes at 4 and 7, digits elsewhere.
fn is_padded_date(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
