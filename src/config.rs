use crate::error::ConfigError;

/// Credentials for the Fitbit Web API.
///
/// `cache_file` is where the OAuth library keeps its tokens between runs.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct FitbitConfig {
    #[arg(long = "fitbit-client-id", env = "FITBIT_CLIENT_ID", default_value = "")]
    pub client_id: String,
    #[arg(
        long = "fitbit-client-secret",
        env = "FITBIT_CLIENT_SECRET",
        default_value = "",
        hide_env_values = true
    )]
    pub client_secret: String,
    #[arg(long = "fitbit-cache-file", env = "FITBIT_CACHE_FILE", default_value = "")]
    pub cache_file: String,
}

impl FitbitConfig {
    /// Checks the fields in declaration order and reports the first empty one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        if self.client_secret.is_empty() {
            return Err(ConfigError::MissingClientSecret);
        }
        if self.cache_file.is_empty() {
            return Err(ConfigError::MissingCacheFile);
        }
        Ok(())
    }
}
