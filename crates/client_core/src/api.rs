use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::MatchId,
    error::ApiError,
    protocol::{CompareResponse, Match, RespondRequest},
};
use tracing::debug;

use crate::error::MatchActionError;

pub type ApiResult<T> = std::result::Result<T, MatchActionError>;

/// Backend operations the match controller depends on. The backend owns every
/// state transition; implementations only carry requests and responses.
#[async_trait]
pub trait MatchApi: Send + Sync {
    async fn fetch_match(&self, match_id: MatchId) -> ApiResult<Match>;
    async fn respond(&self, match_id: MatchId, request: RespondRequest) -> ApiResult<()>;
    async fn compare(&self, match_id: MatchId) -> ApiResult<CompareResponse>;
}

pub struct HttpMatchApi {
    http: Client,
    server_url: String,
}

impl HttpMatchApi {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_timeout(
        server_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, server_url))
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self { http, server_url }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn match_url(&self, match_id: MatchId, action: Option<&str>) -> String {
        match action {
            Some(action) => format!("{}/api/matches/{}/{action}", self.server_url, match_id.0),
            None => format!("{}/api/matches/{}", self.server_url, match_id.0),
        }
    }
}

fn respond_form(request: RespondRequest) -> ApiResult<Form> {
    let form = Form::new().text("accept", request.accept_field());
    let Some(photo) = request.photo else {
        return Ok(form);
    };

    let part = Part::bytes(photo.bytes).file_name(photo.filename);
    let part = match photo.mime_type {
        Some(mime_type) => part
            .mime_str(&mime_type)
            .map_err(|_| MatchActionError::InvalidPhoto(format!("bad mime type '{mime_type}'")))?,
        None => part,
    };
    Ok(form.part("photo", part))
}

/// Non-success responses become `Rejected` carrying the raw body text.
async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MatchActionError::Rejected(ApiError::new(status.as_u16(), body)))
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    response
        .json()
        .await
        .map_err(|e| MatchActionError::Decode(e.to_string()))
}

#[async_trait]
impl MatchApi for HttpMatchApi {
    async fn fetch_match(&self, match_id: MatchId) -> ApiResult<Match> {
        let response = self
            .http
            .get(self.match_url(match_id, None))
            .send()
            .await
            .map_err(MatchActionError::Network)?;
        let snapshot: Match = decode_json(check_status(response).await?).await?;

        if snapshot.id != match_id {
            return Err(MatchActionError::Decode(format!(
                "server returned match {} for match {}",
                snapshot.id, match_id
            )));
        }
        debug!(match_id = match_id.0, status = %snapshot.status, "fetched match snapshot");
        Ok(snapshot)
    }

    async fn respond(&self, match_id: MatchId, request: RespondRequest) -> ApiResult<()> {
        let form = respond_form(request)?;
        let response = self
            .http
            .post(self.match_url(match_id, Some("respond")))
            .multipart(form)
            .send()
            .await
            .map_err(MatchActionError::Network)?;
        check_status(response).await?;
        Ok(())
    }

    async fn compare(&self, match_id: MatchId) -> ApiResult<CompareResponse> {
        let response = self
            .http
            .post(self.match_url(match_id, Some("compare")))
            .send()
            .await
            .map_err(MatchActionError::Network)?;
        decode_json(check_status(response).await?).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
