use serde::{Deserialize, Serialize};

/// Normalized output of one vision-provider round trip (analysis + OCR).
/// Built once per uploaded image and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionResult {
    pub tags: Vec<ImageTag>,
    pub objects: Vec<DetectedObject>,
    pub description: ImageDescription,
    pub extracted_text: String,
    pub ocr_status: OcrStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageTag {
    pub name: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageDescription {
    pub captions: Vec<Caption>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caption {
    pub text: String,
    pub confidence: f64,
}

/// Terminal outcome of the OCR poll loop. `Succeeded` with empty text means
/// the provider finished and found nothing; `TimedOut` means we gave up
/// waiting; `Failed` means the provider reported a terminal error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrStatus {
    Succeeded,
    TimedOut,
    Failed,
}

impl VisionResult {
    /// True when there is any text to feed the menu prompt: OCR output or
    /// at least one non-empty caption.
    pub fn has_readable_text(&self) -> bool {
        if !self.extracted_text.trim().is_empty() {
            return true;
        }
        self.description
            .captions
            .iter()
            .any(|c| !c.text.trim().is_empty())
    }

    pub fn top_caption(&self) -> Option<&str> {
        self.description.captions.first().map(|c| c.text.as_str())
    }
}

/// Per-request user profile for menu recommendations. Every field is
/// optional on the wire; missing or malformed input falls back to the
/// same defaults the mobile client starts with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default = "default_health_goals")]
    pub health_goals: String,
    #[serde(default = "default_calories_target")]
    pub calories_target: String,
}

fn default_health_goals() -> String {
    "balanced".to_string()
}

fn default_calories_target() -> String {
    "moderate".to_string()
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            age: 0,
            height: 0.0,
            weight: 0.0,
            dietary_restrictions: Vec::new(),
            health_goals: default_health_goals(),
            calories_target: default_calories_target(),
        }
    }
}

impl UserPreferences {
    /// Parse the `preferences` form field. Malformed JSON degrades to
    /// defaults instead of failing the request.
    pub fn from_json_or_default(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(prefs) => prefs,
            Err(e) => {
                log::warn!("⚠️ Invalid preferences JSON, using defaults: {}", e);
                Self::default()
            }
        }
    }
}
