//! HTTP implementation of the playback services

use crate::{
    config::ApiConfig,
    services::{ManifestResolver, QualityCatalog, ResumePositionStore, TokenService},
    ContentId, Error, PlaybackToken, ProfileId, ProgressReport, Quality, Result, StreamManifest,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    profile_id: &'a ProfileId,
    content_id: &'a ContentId,
}

#[derive(Serialize)]
struct ManifestRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct PositionResponse {
    #[serde(default)]
    position: Option<f64>,
}

#[derive(Serialize)]
struct ProgressRequest<'a> {
    token: &'a str,
    #[serde(flatten)]
    report: &'a ProgressReport,
}

/// Client for the remote playback API
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl HttpApi {
    /// Build a client from API settings
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url()?,
            access_token: config.access_token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(operation, status = status.as_u16(), "API call succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::from_status(operation, status.as_u16(), error_message(&body)))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(operation, request).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Pull a human-readable message out of an error body
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(alias = "error")]
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl TokenService for HttpApi {
    #[instrument(skip(self))]
    async fn request_token(
        &self,
        profile_id: &ProfileId,
        content_id: &ContentId,
    ) -> Result<PlaybackToken> {
        let request = self
            .client
            .post(self.endpoint("playback/token")?)
            .json(&TokenRequest {
                profile_id,
                content_id,
            });
        self.send_json("RequestToken", request).await
    }
}

#[async_trait]
impl ManifestResolver for HttpApi {
    #[instrument(skip_all)]
    async fn get_manifest(&self, token: &PlaybackToken) -> Result<StreamManifest> {
        let request = self
            .client
            .post(self.endpoint("playback/manifest")?)
            .json(&ManifestRequest {
                token: token.as_str(),
            });
        self.send_json("GetManifest", request).await
    }
}

#[async_trait]
impl QualityCatalog for HttpApi {
    #[instrument(skip(self))]
    async fn get_qualities(&self, content_id: &ContentId) -> Result<Vec<Quality>> {
        let mut url = self.endpoint("content/")?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidConfig("base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend([content_id.as_str(), "qualities"]);
        self.send_json("GetQualities", self.client.get(url)).await
    }
}

#[async_trait]
impl ResumePositionStore for HttpApi {
    #[instrument(skip(self))]
    async fn get_position(&self, content_id: &ContentId, profile_id: &ProfileId) -> Result<f64> {
        let request = self.client.get(self.endpoint("playback/progress")?).query(&[
            ("contentId", content_id.as_str()),
            ("profileId", profile_id.as_str()),
        ]);
        let body: PositionResponse = self.send_json("GetResumePosition", request).await?;
        Ok(body.position.unwrap_or(0.0))
    }

    #[instrument(skip(self, token), fields(position = report.position))]
    async fn put_progress(&self, token: &PlaybackToken, report: &ProgressReport) -> Result<()> {
        let request = self
            .client
            .put(self.endpoint("playback/progress")?)
            .json(&ProgressRequest {
                token: token.as_str(),
                report,
            });
        self.send("PutProgress", request).await?;
        Ok(())
    }
}
