use thiserror::Error;

/// A required `fitbit.*` setting was left empty.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("'fitbit.client_id' must be present in config")]
    MissingClientId,
    #[error("'fitbit.client_secret' must be present in config")]
    MissingClientSecret,
    #[error("'fitbit.cache_file' must be present in config")]
    MissingCacheFile,
}

/// Everything that can abort building a collector or a single `collect` call.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not create fitbit client")]
    ClientCreation(#[source] anyhow::Error),

    #[error("unsupported metric: {0}")]
    UnsupportedMetric(String),

    #[error("a window of {0} days back from yesterday is out of range")]
    DateWindow(u32),

    #[error("creating request to {uri} failed")]
    BuildRequest {
        uri: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("performing request to {uri} failed")]
    PerformRequest {
        uri: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("bad response code {status} from {uri}")]
    BadStatus { uri: String, status: u16 },

    #[error("reading the response body from {uri} failed")]
    ReadBody {
        uri: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unmarshaling {metric} failed")]
    Decode {
        metric: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("parsing activity date {value:?} failed")]
    ParseDate {
        value: String,
        /// `None` when the value is not shaped like `YYYY-MM-DD` at all.
        #[source]
        source: Option<chrono::ParseError>,
    },

    #[error("converting {value:?} to float failed")]
    ParseValue {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("{0:?} is not a finite number")]
    NonFiniteValue(String),
}
