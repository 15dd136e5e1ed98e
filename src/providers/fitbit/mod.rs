pub mod client;
pub mod types;

use std::path::Path;

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use log::{debug, info};

use self::client::{do_request, HttpGet, OAuthClient};
use self::types::{DailyValue, StepsResponse};
use super::Collector;
use crate::config::FitbitConfig;
use crate::error::CollectError;
use crate::metric::Metric;

const FITBIT_URI: &str = "https://api.fitbit.com/1/user/-";
const FITBIT_SCOPES: &[&str] = &["activity"];
const REQUEST_DATE_FORMAT: &str = "%Y-%m-%d";

/// How one supported metric name is fetched and decoded.
///
/// Only Fitbit daily time series fit here: `decode` must yield `dateTime`/`value`
/// rows. Resources with another body shape need their own conversion path.
pub struct MetricHandler {
    /// Name callers pass to `collect`.
    pub name: &'static str,
    /// Time series resource, relative to the user base URI.
    pub resource: &'static str,
    /// Name carried by the emitted metrics.
    pub emitted_as: &'static str,
    decode: fn(&[u8]) -> Result<Vec<DailyValue>, serde_json::Error>,
}

/// Every metric this collector knows how to fetch.
pub const METRICS: &[MetricHandler] = &[MetricHandler {
    name: "steps",
    resource: "activities/steps",
    emitted_as: "fitbit.steps",
    decode: StepsResponse::decode,
}];

pub fn handler_for(metric_name: &str) -> Option<&'static MetricHandler> {
    METRICS.iter().find(|handler| handler.name == metric_name)
}

/// Returns `(start, end)` where `end` is the day before `today` and `start` lies
/// `days_back` days before `end`. Both ends are inclusive.
pub fn date_window(today: NaiveDate, days_back: u32) -> Result<(NaiveDate, NaiveDate), CollectError> {
    today
        .checked_sub_days(Days::new(1))
        .and_then(|end| {
            end.checked_sub_days(Days::new(u64::from(days_back)))
                .map(|start| (start, end))
        })
        .ok_or(CollectError::DateWindow(days_back))
}

/// FitbitCollector - Reads daily activity time series from the Fitbit Web API.
pub struct FitbitCollector<C = OAuthClient> {
    base_uri: String,
    client: C,
}

impl FitbitCollector<OAuthClient> {
    /// Validates `config` and builds an OAuth client with the `activity` scope.
    /// No request is made until the first `collect`.
    pub async fn new(config: &FitbitConfig) -> Result<FitbitCollector<OAuthClient>, CollectError> {
        config.validate()?;

        let client = OAuthClient::new(
            &config.client_id,
            &config.client_secret,
            Path::new(&config.cache_file),
            FITBIT_SCOPES,
        )
        .await
        .map_err(CollectError::ClientCreation)?;

        Ok(FitbitCollector::with_client(client))
    }
}

impl<C: HttpGet> FitbitCollector<C> {
    pub fn with_client(client: C) -> FitbitCollector<C> {
        FitbitCollector {
            base_uri: FITBIT_URI.to_string(),
            client,
        }
    }

    async fn collect_since(
        &self,
        metric_name: &str,
        days_back: u32,
        today: NaiveDate,
    ) -> Result<Vec<Metric>, CollectError> {
        let handler = handler_for(metric_name)
            .ok_or_else(|| CollectError::UnsupportedMetric(metric_name.to_string()))?;
        let (start, end) = date_window(today, days_back)?;

        let endpoint = format!(
            "{}/date/{}/{}.json",
            handler.resource,
            start.format(REQUEST_DATE_FORMAT),
            end.format(REQUEST_DATE_FORMAT)
        );
        let body = do_request(&self.client, &self.base_uri, &endpoint).await?;

        let rows = (handler.decode)(&body).map_err(|source| CollectError::Decode {
            metric: handler.name,
            source,
        })?;
        debug!("decoded {} {} rows", rows.len(), handler.name);

        let metrics = rows
            .into_iter()
            .map(|row| row.into_metric(handler.emitted_as))
            .collect::<Result<Vec<Metric>, CollectError>>()?;

        info!(
            "collected {} {} metrics for {} to {}",
            metrics.len(),
            handler.emitted_as,
            start,
            end
        );
        Ok(metrics)
    }
}

#[async_trait]
impl<C: HttpGet> Collector for FitbitCollector<C> {
    async fn collect(&self, metric_name: &str, days_back: u32) -> Result<Vec<Metric>, CollectError> {
        let today = Local::now().date_naive();
        self.collect_since(metric_name, days_back, today).await
    }
}

#[cfg(test)]
mod tests {
    use super::client::RawResponse;
    use crate::providers::Collector;
    use super::*;
    use std::sync::Mutex;

    struct FakeFitbit {
        status: u16,
        body: &'static str,
        requests: Mutex<Vec<String>>,
    }

    impl FakeFitbit {
        fn new(status: u16, body: &'static str) -> FakeFitbit {
            FakeFitbit {
                status,
                body,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpGet for FakeFitbit {
        async fn get(&self, uri: &str) -> Result<RawResponse, CollectError> {
            self.requests.lock().unwrap().push(uri.to_string());
            Ok(RawResponse {
                status: self.status,
                body: self.body.as_bytes().to_vec(),
            })
        }
    }

    struct Unreachable;

    #[async_trait]
    impl HttpGet for Unreachable {
        async fn get(&self, uri: &str) -> Result<RawResponse, CollectError> {
            Err(CollectError::PerformRequest {
                uri: uri.to_string(),
                source: anyhow::anyhow!("connection refused"),
            })
        }
    }

    const THREE_DAYS: &str = r#"{"activities-steps":[
        {"dateTime":"2024-03-07","value":"6200"},
        {"dateTime":"2024-03-08","value":"10452"},
        {"dateTime":"2024-03-09","value":"0"}
    ]}"#;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        ymd(2024, 3, 10)
    }

    #[test]
    fn window_ends_yesterday() {
        assert_eq!(
            date_window(today(), 0).unwrap(),
            (ymd(2024, 3, 9), ymd(2024, 3, 9))
        );
        assert_eq!(
            date_window(today(), 7).unwrap(),
            (ymd(2024, 3, 2), ymd(2024, 3, 9))
        );
        assert_eq!(
            date_window(ymd(2024, 3, 1), 1).unwrap(),
            (ymd(2024, 2, 28), ymd(2024, 2, 29))
        );
        assert_eq!(
            date_window(ymd(2025, 1, 1), 30).unwrap(),
            (ymd(2024, 12, 1), ymd(2024, 12, 31))
        );
    }

    #[test]
    fn window_out_of_range() {
        match date_window(today(), u32::MAX) {
            Err(CollectError::DateWindow(days)) => assert_eq!(days, u32::MAX),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn only_steps_is_registered() {
        assert!(handler_for("steps").is_some());
        assert!(handler_for("Steps").is_none());
        assert!(handler_for("heart").is_none());
        assert_eq!(METRICS.len(), 1);
    }

    #[tokio::test]
    async fn requests_the_window_ending_yesterday() {
        let collector = FitbitCollector::with_client(FakeFitbit::new(200, THREE_DAYS));
        collector.collect_since("steps", 6, today()).await.unwrap();

        assert_eq!(
            collector.client.requests(),
            vec![
                "https://api.fitbit.com/1/user/-/activities/steps/date/2024-03-03/2024-03-09.json"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn converts_every_row_in_order() {
        let collector = FitbitCollector::with_client(FakeFitbit::new(200, THREE_DAYS));
        let metrics = collector.collect_since("steps", 2, today()).await.unwrap();

        assert_eq!(
            metrics,
            vec![
                Metric::new("fitbit.steps", ymd(2024, 3, 7), 6200.0),
                Metric::new("fitbit.steps", ymd(2024, 3, 8), 10452.0),
                Metric::new("fitbit.steps", ymd(2024, 3, 9), 0.0),
            ]
        );
    }

    #[tokio::test]
    async fn empty_series_gives_no_metrics() {
        let collector =
            FitbitCollector::with_client(FakeFitbit::new(200, r#"{"activities-steps":[]}"#));
        let metrics = collector.collect_since("steps", 0, today()).await.unwrap();
        assert!(metrics.is_empty());
    }

    #[tokio::test]
    async fn unsupported_metric_makes_no_request() {
        let collector = FitbitCollector::with_client(FakeFitbit::new(200, THREE_DAYS));
        let err = collector.collect("floors", 7).await.unwrap_err();

        match err {
            CollectError::UnsupportedMetric(name) => assert_eq!(name, "floors"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(collector.client.requests().is_empty());
    }

    #[tokio::test]
    async fn one_bad_row_fails_the_whole_call() {
        let body = r#"{"activities-steps":[
            {"dateTime":"2024-03-08","value":"10452"},
            {"dateTime":"2024-03-09","value":"abc"}
        ]}"#;
        let collector = FitbitCollector::with_client(FakeFitbit::new(200, body));

        match collector.collect_since("steps", 1, today()).await {
            Err(CollectError::ParseValue { value, .. }) => assert_eq!(value, "abc"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn bad_date_fails_the_whole_call() {
        let body = r#"{"activities-steps":[{"dateTime":"yesterday","value":"12"}]}"#;
        let collector = FitbitCollector::with_client(FakeFitbit::new(200, body));

        let err = collector.collect_since("steps", 1, today()).await.unwrap_err();
        assert!(matches!(err, CollectError::ParseDate { .. }));
    }

    #[tokio::test]
    async fn server_error_carries_status() {
        let collector = FitbitCollector::with_client(FakeFitbit::new(500, ""));
        let err = collector.collect_since("steps", 1, today()).await.unwrap_err();

        assert!(matches!(err, CollectError::BadStatus { status: 500, .. }));
        assert_eq!(
            err.to_string(),
            "bad response code 500 from https://api.fitbit.com/1/user/-/activities/steps/date/2024-03-08/2024-03-09.json"
        );
    }

    #[tokio::test]
    async fn invalid_json_is_a_decode_error() {
        let collector = FitbitCollector::with_client(FakeFitbit::new(200, "<html>oops</html>"));
        let err = collector.collect_since("steps", 1, today()).await.unwrap_err();

        assert!(matches!(err, CollectError::Decode { metric: "steps", .. }));
        assert_eq!(err.to_string(), "unmarshaling steps failed");
    }

    #[tokio::test]
    async fn transport_errors_are_passed_through() {
        let collector = FitbitCollector::with_client(Unreachable);
        let err = collector.collect("steps", 3).await.unwrap_err();

        match err {
            CollectError::PerformRequest { uri, .. } => {
                assert!(uri.starts_with("https://api.fitbit.com/1/user/-/activities/steps/date/"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_secret_fails_before_building_a_client() {
        let config = FitbitConfig {
            client_id: "22ABCD".to_string(),
            client_secret: String::new(),
            cache_file: "/nonexistent/fitbit_token.json".to_string(),
        };

        let err = FitbitCollector::new(&config)
            .await
            .err()
            .expect("construction should fail");
        assert!(matches!(
            err,
            CollectError::Config(crate::error::ConfigError::MissingClientSecret)
        ));
        assert_eq!(
            err.to_string(),
            "'fitbit.client_secret' must be present in config"
        );
    }
}
