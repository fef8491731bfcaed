//! Request and response shapes for the cloud PDF services.
//!
//! Both services work the same way: upload an asset, submit a job that
//! references it, poll the job until it is done, then download the result.
//! Only the wire shapes live here; the HTTP client lives in the CLI.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::models::merge::MergePayload;

/// Element list returned by the text extraction service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuredData {
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// One extracted element; only text elements carry `Text`.
#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    #[serde(rename = "Text", default)]
    pub text: Option<String>,
}

impl StructuredData {
    /// Text elements joined by single spaces, in document order.
    pub fn text(&self) -> String {
        self.elements
            .iter()
            .filter_map(|el| el.text.as_deref())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Decode an extraction result and return its plain text.
pub fn structured_text(json: &str) -> Result<String, ServiceError> {
    let data: StructuredData = serde_json::from_str(json)
        .map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;
    Ok(data.text())
}

/// Request to register a new asset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRequest<'a> {
    pub media_type: &'a str,
}

/// Registered asset and where to upload its bytes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetUpload {
    #[serde(rename = "assetID")]
    pub asset_id: String,
    pub upload_uri: String,
}

/// Text extraction job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest<'a> {
    #[serde(rename = "assetID")]
    pub asset_id: &'a str,
    pub elements_to_extract: Vec<&'a str>,
}

impl<'a> ExtractRequest<'a> {
    pub fn text(asset_id: &'a str) -> Self {
        Self {
            asset_id,
            elements_to_extract: vec!["text"],
        }
    }
}

/// Document generation job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest<'a> {
    #[serde(rename = "assetID")]
    pub asset_id: &'a str,
    pub output_format: &'a str,
    pub json_data_for_merge: &'a MergePayload,
}

impl<'a> MergeRequest<'a> {
    pub fn pdf(asset_id: &'a str, payload: &'a MergePayload) -> Self {
        Self {
            asset_id,
            output_format: "pdf",
            json_data_for_merge: payload,
        }
    }
}

/// State of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum JobStatus {
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "failed")]
    Failed,
}

/// A downloadable job result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRef {
    pub download_uri: String,
}

/// Error details on a failed job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Body of a job status poll.
#[derive(Debug, Clone, Deserialize)]
pub struct JobResponse {
    pub status: JobStatus,
    /// Extraction: the structured-data JSON.
    #[serde(default)]
    pub content: Option<DownloadRef>,
    /// Document generation: the rendered document.
    #[serde(default)]
    pub asset: Option<DownloadRef>,
    #[serde(default)]
    pub error: Option<JobError>,
}

impl JobResponse {
    /// `Ok(None)` while running, the response once done, an error if failed.
    pub fn finished(self) -> Result<Option<Self>, ServiceError> {
        match self.status {
            JobStatus::InProgress => Ok(None),
            JobStatus::Done => Ok(Some(self)),
            JobStatus::Failed => {
                let err = self.error.unwrap_or_default();
                Err(ServiceError::JobFailed(format!("{} {}", err.code, err.message).trim().to_string()))
            }
        }
    }

    /// Download link for an extraction result.
    pub fn content_uri(&self) -> Result<&str, ServiceError> {
        self.content
            .as_ref()
            .map(|c| c.download_uri.as_str())
            .ok_or_else(|| ServiceError::MissingField("content.downloadUri".to_string()))
    }

    /// Download link for a generated document.
    pub fn asset_uri(&self) -> Result<&str, ServiceError> {
        self.asset
            .as_ref()
            .map(|a| a.download_uri.as_str())
            .ok_or_else(|| ServiceError::MissingField("asset.downloadUri".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::merge::ItemTable;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_structured_text_joins_text_elements() {
        let json = r#"{
            "version": {"json_export": "1.0"},
            "elements": [
                {"Path": "//Document/P", "Text": "MONTHLY COST"},
                {"Path": "//Document/Figure"},
                {"Path": "//Document/P", "Text": "1.00"},
                {"Path": "//Document/P", "Text": "$217.75"}
            ]
        }"#;
        assert_eq!(structured_text(json).unwrap(), "MONTHLY COST 1.00 $217.75");
    }

    #[test]
    fn test_structured_text_without_elements() {
        assert_eq!(structured_text("{}").unwrap(), "");
    }

    #[test]
    fn test_structured_text_rejects_garbage() {
        assert!(matches!(
            structured_text("not json"),
            Err(ServiceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_job_in_progress() {
        let job: JobResponse = serde_json::from_str(r#"{"status": "in progress"}"#).unwrap();
        assert!(job.finished().unwrap().is_none());
    }

    #[test]
    fn test_job_done() {
        let json = r#"{
            "status": "done",
            "content": {"downloadUri": "https://example.test/structuredData.json"},
            "resource": {"downloadUri": "https://example.test/result.zip"}
        }"#;
        let job: JobResponse = serde_json::from_str(json).unwrap();
        let done = job.finished().unwrap().unwrap();
        assert_eq!(done.content_uri().unwrap(), "https://example.test/structuredData.json");
        assert!(matches!(done.asset_uri(), Err(ServiceError::MissingField(_))));
    }

    #[test]
    fn test_job_failed() {
        let json = r#"{"status": "failed", "error": {"code": "BAD_PDF", "message": "Corrupt file"}}"#;
        let job: JobResponse = serde_json::from_str(json).unwrap();
        match job.finished() {
            Err(ServiceError::JobFailed(msg)) => assert_eq!(msg, "BAD_PDF Corrupt file"),
            other => panic!("expected JobFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_request_shape() {
        let payload = MergePayload {
            items: ItemTable::default(),
            subtotal: "400.00".to_string(),
            tax: "35.50".to_string(),
            paid: "435.50".to_string(),
        };
        let json = serde_json::to_value(MergeRequest::pdf("asset-1", &payload)).unwrap();

        assert_eq!(json["assetID"], "asset-1");
        assert_eq!(json["outputFormat"], "pdf");
        assert_eq!(json["jsonDataForMerge"]["tax"], "35.50");
        assert_eq!(json["jsonDataForMerge"]["items"]["itemTable"], serde_json::json!([]));
    }

    #[test]
    fn test_extract_request_shape() {
        let json = serde_json::to_value(ExtractRequest::text("asset-2")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"assetID": "asset-2", "elementsToExtract": ["text"]})
        );
    }
}
