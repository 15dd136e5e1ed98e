use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper_rustls::HttpsConnector;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use yup_oauth2::authenticator::Authenticator;
use yup_oauth2::{ApplicationSecret, InstalledFlowAuthenticator, InstalledFlowReturnMethod};

use crate::error::CollectError;

const FITBIT_AUTH_URI: &str = "https://www.fitbit.com/oauth2/authorize";
const FITBIT_TOKEN_URI: &str = "https://api.fitbit.com/oauth2/token";

type TlsClient = hyper::Client<HttpsConnector<HttpConnector>>;

/// Status and body of a finished GET.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Something that can perform an authenticated GET against an absolute URI.
#[async_trait]
pub trait HttpGet: Send + Sync {
    async fn get(&self, uri: &str) -> Result<RawResponse, CollectError>;
}

/// `HttpGet` backed by the Fitbit OAuth2 flow.
///
/// Tokens are acquired (and refreshed) by the authenticator and persisted to the
/// cache file, so the interactive consent step only happens on the first run.
pub struct OAuthClient {
    auth: Authenticator<HttpsConnector<HttpConnector>>,
    http: reqwest::Client,
    scopes: Vec<String>,
}

impl OAuthClient {
    pub async fn new(
        client_id: &str,
        client_secret: &str,
        cache_file: &Path,
        scopes: &[&str],
    ) -> anyhow::Result<OAuthClient> {
        let secret = ApplicationSecret {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            auth_uri: FITBIT_AUTH_URI.to_string(),
            token_uri: FITBIT_TOKEN_URI.to_string(),
            ..ApplicationSecret::default()
        };

        let auth = InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::HTTPRedirect)
            .persist_tokens_to_disk(cache_file.to_path_buf())
            .hyper_client(OAuthClient::generate_https_client())
            .build()
            .await
            .with_context(|| format!("building authenticator with cache {}", cache_file.display()))?;

        let http = reqwest::Client::builder()
            .build()
            .context("building http client")?;

        Ok(OAuthClient {
            auth,
            http,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn generate_https_client() -> TlsClient {
        let conn = hyper_rustls::HttpsConnector::with_native_roots();
        hyper::Client::builder().build(conn)
    }
}

#[async_trait]
impl HttpGet for OAuthClient {
    /// The body is only read for `200 OK` responses; any other status comes back
    /// with an empty body.
    async fn get(&self, uri: &str) -> Result<RawResponse, CollectError> {
        let token = self
            .auth
            .token(self.scopes.as_slice())
            .await
            .map_err(|e| CollectError::PerformRequest {
                uri: uri.to_string(),
                source: anyhow::Error::new(e).context("acquiring access token"),
            })?;

        let request = self
            .http
            .get(uri)
            .bearer_auth(token.as_str())
            .header(ACCEPT, "application/json")
            .build()
            .map_err(|e| CollectError::BuildRequest {
                uri: uri.to_string(),
                source: e.into(),
            })?;

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| CollectError::PerformRequest {
                uri: uri.to_string(),
                source: e.into(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!("{} answered {}, skipping body", uri, status);
            return Ok(RawResponse {
                status: status.as_u16(),
                body: Vec::new(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CollectError::ReadBody {
                uri: uri.to_string(),
                source: e.into(),
            })?;

        Ok(RawResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}

/// Joins `endpoint` onto `base_uri`, performs the GET and returns the body of a
/// `200 OK` response.
pub async fn do_request<C>(client: &C, base_uri: &str, endpoint: &str) -> Result<Vec<u8>, CollectError>
where
    C: HttpGet + ?Sized,
{
    let uri = format!("{}/{}", base_uri, endpoint.trim_matches('/'));
    debug!("GET {}", uri);

    let response = client.get(&uri).await?;
    if response.status != 200 {
        return Err(CollectError::BadStatus {
            uri,
            status: response.status,
        });
    }

    Ok(response.body)
}
