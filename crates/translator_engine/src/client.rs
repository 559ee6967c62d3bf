use std::time::Duration;

use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use translator_core::{JobHandle, JobPhase, JobStatus, SelectedFile, StartJobRequest};
use url::Url;

use crate::types::{
    parse_detail, StartTranslationBody, StatusResponse, TaskCreated, UploadResponse,
};
use crate::{ApiError, Download, FailureKind};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_download_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8011".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_download_bytes: 50 * 1024 * 1024,
        }
    }
}

/// The four endpoints of the translation service.
#[async_trait::async_trait]
pub trait TranslationApi: Send + Sync {
    /// `POST /api/upload`; returns the server's file id.
    async fn upload(&self, file: &SelectedFile) -> Result<String, ApiError>;

    /// `POST /api/translate`; returns the task id of the started job.
    async fn start_translation(&self, request: &StartJobRequest) -> Result<String, ApiError>;

    /// `GET /api/status/{task_id}`.
    async fn status(&self, job: &JobHandle) -> Result<JobStatus, ApiError>;

    /// `GET /api/download/{task_id}`; the raw artifact.
    async fn download(&self, job: &JobHandle) -> Result<Download, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    settings: ClientSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{base} cannot be used as a base url"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    /// Appends path segments to the base url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::new(FailureKind::InvalidUrl, "base url has no path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_limited(&self, response: reqwest::Response) -> Result<bytes::Bytes, ApiError> {
        let max_bytes = self.settings.max_download_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "artifact too large",
                ));
            }
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "artifact too large",
                ));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}

#[async_trait::async_trait]
impl TranslationApi for ReqwestApi {
    async fn upload(&self, file: &SelectedFile) -> Result<String, ApiError> {
        let url = self.endpoint(&["api", "upload"])?;
        let part = Part::bytes(file.content().to_vec()).file_name(file.name().to_string());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let body: UploadResponse = response.json().await.map_err(map_reqwest_error)?;
        Ok(body.file_id)
    }

    async fn start_translation(&self, request: &StartJobRequest) -> Result<String, ApiError> {
        let url = self.endpoint(&["api", "translate"])?;
        let body = StartTranslationBody {
            file_id: &request.file_id,
            provider: &request.provider,
            api_key: &request.api_key,
            model: &request.model,
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let created: TaskCreated = response.json().await.map_err(map_reqwest_error)?;
        Ok(created.task_id)
    }

    async fn status(&self, job: &JobHandle) -> Result<JobStatus, ApiError> {
        let url = self.endpoint(&["api", "status", job.as_str()])?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let body: StatusResponse = response.json().await.map_err(map_reqwest_error)?;
        let phase: JobPhase = body
            .status
            .parse()
            .map_err(|err| ApiError::new(FailureKind::Decode, format!("{err}")))?;
        Ok(JobStatus::new(phase, body.progress, body.message))
    }

    async fn download(&self, job: &JobHandle) -> Result<Download, ApiError> {
        let url = self.endpoint(&["api", "download", job.as_str()])?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = self.read_limited(response).await?;
        Ok(Download {
            bytes,
            content_type,
        })
    }
}

/// Passes 2xx responses through; turns anything else into an error carrying
/// the body's `detail` when present.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = match response.bytes().await {
        Ok(body) => parse_detail(&body),
        Err(_) => None,
    };
    Err(ApiError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string()).with_detail(detail))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
