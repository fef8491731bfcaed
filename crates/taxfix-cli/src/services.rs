//! HTTP client for the cloud text extraction and document generation services.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use futures_util::{Stream, StreamExt};
use indicatif::ProgressBar;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{RequestBuilder, Response};
use serde::Serialize;
use tracing::{debug, info};

use taxfix_core::models::config::ServiceConfig;
use taxfix_core::service::{
    structured_text, AssetRequest, AssetUpload, ExtractRequest, JobResponse, MergeRequest,
};
use taxfix_core::MergePayload;

const PDF_MEDIA_TYPE: &str = "application/pdf";
const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Client for the upload / submit / poll / download job flow.
pub struct PdfServicesClient {
    http: reqwest::Client,
    config: ServiceConfig,
    client_id: String,
    api_key: String,
}

impl PdfServicesClient {
    /// Build a client, reading credentials from the configured env vars.
    pub fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        let client_id = std::env::var(&config.client_id_env)
            .with_context(|| format!("{} is not set", config.client_id_env))?;
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("{} is not set", config.api_key_env))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("taxfix-cli/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            config: config.clone(),
            client_id,
            api_key,
        })
    }

    /// Extract the plain text of a PDF.
    pub async fn extract_text(&self, pdf: Vec<u8>) -> anyhow::Result<String> {
        let base = self.config.extract_url.trim_end_matches('/');

        let asset_id = self.upload(base, pdf, PDF_MEDIA_TYPE).await?;
        let location = self
            .submit(&format!("{}/operation/extractpdf", base), &ExtractRequest::text(&asset_id))
            .await?;
        let job = self.wait(&location).await?;

        let response = self.http.get(job.content_uri()?).send().await?;
        let body = ensure_success(response, "structured data download").await?.text().await?;
        let text = structured_text(&body)?;

        debug!("Extraction service returned {} chars of text", text.len());
        Ok(text)
    }

    /// Merge a payload into a template and write the rendered PDF to `output`.
    pub async fn generate(
        &self,
        template: Vec<u8>,
        payload: &MergePayload,
        output: &Path,
        pb: &ProgressBar,
    ) -> anyhow::Result<u64> {
        let base = self.config.merge_url.trim_end_matches('/');

        let asset_id = self.upload(base, template, DOCX_MEDIA_TYPE).await?;
        let location = self
            .submit(
                &format!("{}/operation/documentgeneration", base),
                &MergeRequest::pdf(&asset_id, payload),
            )
            .await?;
        let job = self.wait(&location).await?;

        download_file(&self.http, job.asset_uri()?, output, pb).await
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("x-api-key", &self.client_id)
            .bearer_auth(&self.api_key)
    }

    /// Register an asset and upload its bytes; returns the asset id.
    async fn upload(&self, base: &str, data: Vec<u8>, media_type: &str) -> anyhow::Result<String> {
        let response = self
            .authorized(self.http.post(format!("{}/assets", base)))
            .json(&AssetRequest { media_type })
            .send()
            .await?;
        let asset: AssetUpload = ensure_success(response, "asset registration").await?.json().await?;

        let response = self
            .http
            .put(&asset.upload_uri)
            .header(CONTENT_TYPE, media_type)
            .body(data)
            .send()
            .await?;
        ensure_success(response, "asset upload").await?;

        debug!("Uploaded asset {}", asset.asset_id);
        Ok(asset.asset_id)
    }

    /// Submit a job; returns the polling URL.
    async fn submit<T: Serialize>(&self, url: &str, body: &T) -> anyhow::Result<String> {
        let response = self.authorized(self.http.post(url)).json(body).send().await?;
        let response = ensure_success(response, "job submission").await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .context("No location header in job submission response")?
            .to_string();

        info!("Submitted job, polling {}", location);
        Ok(location)
    }

    /// Poll a job until it finishes.
    async fn wait(&self, location: &str) -> anyhow::Result<JobResponse> {
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        for attempt in 1..=self.config.max_polls {
            let response = self.authorized(self.http.get(location)).send().await?;
            let job: JobResponse = ensure_success(response, "job poll").await?.json().await?;

            if let Some(done) = job.finished()? {
                debug!("Job finished after {} polls", attempt);
                return Ok(done);
            }
            tokio::time::sleep(interval).await;
        }

        anyhow::bail!(
            "Job did not finish after {} polls ({}ms apart)",
            self.config.max_polls,
            self.config.poll_interval_ms
        )
    }
}

async fn ensure_success(response: Response, what: &str) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{} failed ({}): {}", what, status, body)
}

async fn download_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    pb: &ProgressBar,
) -> anyhow::Result<u64> {
    let response = ensure_success(client.get(url).send().await?, "document download").await?;

    if let Some(content_length) = response.content_length() {
        pb.set_length(content_length);
    }

    stream_to_file(response.bytes_stream(), path, pb).await
}

/// Write a byte stream to `path` through a `.tmp` file.
async fn stream_to_file<S, B, E>(stream: S, path: &Path, pb: &ProgressBar) -> anyhow::Result<u64>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Only a complete download is renamed into place
    let temp_path = path.with_extension("tmp");
    let downloaded = match write_chunks(stream, &temp_path, pb).await {
        Ok(downloaded) => downloaded,
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(&temp_path) {
                debug!("Could not remove {}: {}", temp_path.display(), remove_err);
            }
            return Err(e);
        }
    };

    fs::rename(&temp_path, path)?;

    Ok(downloaded)
}

async fn write_chunks<S, B, E>(stream: S, temp_path: &Path, pb: &ProgressBar) -> anyhow::Result<u64>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut file = File::create(temp_path)?;
    let mut stream = std::pin::pin!(stream);
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let chunk = chunk.as_ref();
        file.write_all(chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::io;

    #[tokio::test]
    async fn test_stream_to_file_renames_complete_download() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("invoice-1-10-25.pdf");
        let chunks: Vec<Result<Vec<u8>, io::Error>> = vec![Ok(b"%PDF-".to_vec()), Ok(b"1.7".to_vec())];

        let written = stream_to_file(stream::iter(chunks), &path, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(written, 8);
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.7");
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_stream_to_file_removes_partial_download() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice-1-10-25.pdf");
        let chunks: Vec<Result<Vec<u8>, io::Error>> = vec![
            Ok(b"%PDF-".to_vec()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
        ];

        let result = stream_to_file(stream::iter(chunks), &path, &ProgressBar::hidden()).await;

        assert!(result.is_err());
        assert!(!path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
