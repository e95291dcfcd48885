use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::models::{
    Caption, DetectedObject, ImageDescription, ImageTag, OcrStatus, VisionResult,
};

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("vision provider error ({status}): {body}")]
    Provider { status: u16, body: String },
    #[error("vision provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to read image {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Bounded retry policy for the asynchronous text-recognition operation.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(1),
        }
    }
}

/// Trait for image-analysis providers (Azure Computer Vision, etc.)
#[async_trait::async_trait]
pub trait VisionService: Send + Sync {
    async fn analyze_image(&self, image_path: &Path) -> Result<VisionResult, VisionError>;
}

/// Azure Computer Vision v3.2 client: one synchronous visual-analysis call
/// plus the submit-and-poll Read (OCR) operation, normalized into a single
/// VisionResult.
pub struct AzureVisionClient {
    endpoint: String,
    key: String,
    poll: PollPolicy,
    client: reqwest::Client,
}

impl AzureVisionClient {
    pub fn new(endpoint: String, key: String, poll: PollPolicy) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key,
            poll,
            client: reqwest::Client::new(),
        }
    }

    async fn analyze(&self, image: &[u8]) -> Result<AnalyzeResponse, VisionError> {
        let url = format!(
            "{}/vision/v3.2/analyze?visualFeatures=Tags,Objects,Description",
            self.endpoint
        );

        log::debug!("📤 Vision analyze request: {} bytes", image.len());

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json::<AnalyzeResponse>().await?)
    }

    /// Submit the Read operation and poll its Operation-Location until a
    /// terminal state or the attempt limit runs out. Exhaustion is reported
    /// as `TimedOut`, distinct from a succeeded-but-empty result.
    async fn read_text(&self, image: &[u8]) -> Result<(String, OcrStatus), VisionError> {
        let url = format!("{}/vision/v3.2/read/analyze", self.endpoint);

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await?;

        let response = check_status(response).await?;
        let operation_url = match response
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
        {
            Some(url) => url.to_string(),
            None => {
                return Err(VisionError::Provider {
                    status: response.status().as_u16(),
                    body: "read operation accepted without an Operation-Location header"
                        .to_string(),
                })
            }
        };

        log::debug!("🔍 OCR operation submitted: {}", operation_url);

        for attempt in 1..=self.poll.max_attempts {
            let response = self
                .client
                .get(&operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.key)
                .send()
                .await?;
            let operation = check_status(response)
                .await?
                .json::<ReadOperation>()
                .await?;

            match operation.status.as_str() {
                "notStarted" | "running" => {
                    log::debug!(
                        "⏳ OCR still {} (attempt {}/{})",
                        operation.status,
                        attempt,
                        self.poll.max_attempts
                    );
                }
                "succeeded" => {
                    return Ok((collect_read_text(&operation), OcrStatus::Succeeded));
                }
                other => {
                    log::warn!("⚠️ OCR ended in terminal state '{}', treating as empty", other);
                    return Ok((String::new(), OcrStatus::Failed));
                }
            }

            if attempt < self.poll.max_attempts {
                tokio::time::sleep(self.poll.interval).await;
            }
        }

        log::warn!(
            "⚠️ OCR did not finish within {} attempts",
            self.poll.max_attempts
        );
        Ok((String::new(), OcrStatus::TimedOut))
    }
}

#[async_trait::async_trait]
impl VisionService for AzureVisionClient {
    async fn analyze_image(&self, image_path: &Path) -> Result<VisionResult, VisionError> {
        let image = tokio::fs::read(image_path)
            .await
            .map_err(|source| VisionError::Io {
                path: image_path.display().to_string(),
                source,
            })?;

        let analysis = self.analyze(&image).await?;
        let (extracted_text, ocr_status) = self.read_text(&image).await?;

        log::info!(
            "👁️ Vision analysis: {} tags, {} objects, {} captions, ocr={:?}",
            analysis.tags.len(),
            analysis.objects.len(),
            analysis.description.captions.len(),
            ocr_status
        );

        Ok(normalize(analysis, extracted_text, ocr_status))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, VisionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    log::error!("❌ Vision provider error ({}): {}", status, body);
    Err(VisionError::Provider {
        status: status.as_u16(),
        body,
    })
}

fn normalize(
    analysis: AnalyzeResponse,
    extracted_text: String,
    ocr_status: OcrStatus,
) -> VisionResult {
    VisionResult {
        tags: analysis
            .tags
            .into_iter()
            .map(|t| ImageTag {
                name: t.name,
                confidence: t.confidence,
            })
            .collect(),
        objects: analysis
            .objects
            .into_iter()
            .map(|o| DetectedObject {
                label: o.label,
                confidence: o.confidence,
            })
            .collect(),
        description: ImageDescription {
            captions: analysis
                .description
                .captions
                .into_iter()
                .map(|c| Caption {
                    text: c.text,
                    confidence: c.confidence,
                })
                .collect(),
            tags: analysis.description.tags,
        },
        extracted_text,
        ocr_status,
    }
}

/// All recognized lines across all pages, space-joined.
fn collect_read_text(operation: &ReadOperation) -> String {
    let Some(result) = &operation.analyze_result else {
        return String::new();
    };
    result
        .read_results
        .iter()
        .flat_map(|page| page.lines.iter())
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

// Provider wire shapes, kept private to the adapter.

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    tags: Vec<WireTag>,
    #[serde(default)]
    objects: Vec<WireObject>,
    #[serde(default)]
    description: WireDescription,
}

#[derive(Debug, Deserialize)]
struct WireTag {
    name: String,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct WireObject {
    #[serde(rename = "object")]
    label: String,
    confidence: f64,
}

#[derive(Debug, Default, Deserialize)]
struct WireDescription {
    #[serde(default)]
    captions: Vec<WireCaption>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireCaption {
    text: String,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct ReadOperation {
    status: String,
    #[serde(rename = "analyzeResult")]
    analyze_result: Option<ReadAnalyzeResult>,
}

#[derive(Debug, Deserialize)]
struct ReadAnalyzeResult {
    #[serde(rename = "readResults", default)]
    read_results: Vec<ReadPage>,
}

#[derive(Debug, Deserialize)]
struct ReadPage {
    #[serde(default)]
    lines: Vec<ReadLine>,
}

#[derive(Debug, Deserialize)]
struct ReadLine {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_response_normalizes_object_field() {
        let json = r#"{
            "tags": [{"name": "food", "confidence": 0.98}],
            "objects": [{"object": "sandwich", "confidence": 0.71, "rectangle": {"x": 0, "y": 0, "w": 10, "h": 10}}],
            "description": {
                "tags": ["food", "table"],
                "captions": [{"text": "a sandwich on a plate", "confidence": 0.83}]
            }
        }"#;

        let analysis: AnalyzeResponse = serde_json::from_str(json).unwrap();
        let result = normalize(analysis, String::new(), OcrStatus::Succeeded);

        assert_eq!(result.tags[0].name, "food");
        assert_eq!(result.objects[0].label, "sandwich");
        assert_eq!(result.description.captions[0].text, "a sandwich on a plate");
        assert_eq!(result.description.tags, vec!["food", "table"]);
    }

    #[test]
    fn test_analyze_response_tolerates_missing_sections() {
        let analysis: AnalyzeResponse = serde_json::from_str("{}").unwrap();
        let result = normalize(analysis, String::new(), OcrStatus::Failed);
        assert!(result.tags.is_empty());
        assert!(result.objects.is_empty());
        assert!(result.description.captions.is_empty());
    }

    #[test]
    fn test_collect_read_text_space_joins_lines_across_pages() {
        let json = r#"{
            "status": "succeeded",
            "analyzeResult": {
                "readResults": [
                    {"lines": [{"text": "STARTERS"}, {"text": "Garlic bread 4.50"}]},
                    {"lines": [{"text": "MAINS"}]}
                ]
            }
        }"#;

        let operation: ReadOperation = serde_json::from_str(json).unwrap();
        assert_eq!(
            collect_read_text(&operation),
            "STARTERS Garlic bread 4.50 MAINS"
        );
    }

    #[test]
    fn test_collect_read_text_empty_when_no_result() {
        let operation: ReadOperation =
            serde_json::from_str(r#"{"status": "running"}"#).unwrap();
        assert_eq!(collect_read_text(&operation), "");
    }

    #[test]
    fn test_default_poll_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.interval, Duration::from_secs(1));
    }
}
