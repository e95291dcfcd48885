use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::analysis::extract::FALLBACK_TEXT_KEY;
use crate::analysis::prompt::{self, MENU_SYSTEM_PROMPT, NUTRITION_SYSTEM_PROMPT};
use crate::analysis::{annotate_menu_analysis, extract_analysis, try_extract_json, MenuClassifier};
use crate::models::{UserPreferences, VisionResult};
use crate::services::{LanguageModelService, ResultStore, VisionService};

/// Runs one upload end to end: vision snapshot, prompt, model call,
/// extraction, persistence. A failed model call is embedded as an error
/// section so the vision half of the response survives; a failed vision
/// call propagates, since nothing useful exists without it.
pub struct AnalysisHandler {
    vision: Arc<dyn VisionService>,
    llm: Arc<dyn LanguageModelService>,
    store: ResultStore,
    classifier: MenuClassifier,
}

impl AnalysisHandler {
    pub fn new(
        vision: Arc<dyn VisionService>,
        llm: Arc<dyn LanguageModelService>,
        store: ResultStore,
    ) -> Self {
        Self {
            vision,
            llm,
            store,
            classifier: MenuClassifier::default(),
        }
    }

    /// `/upload`: nutrition analysis of a meal photo.
    pub async fn analyze_upload(
        &self,
        image_path: &Path,
        original_filename: &str,
    ) -> Result<Value> {
        let vision_result = self.vision.analyze_image(image_path).await?;

        let user_prompt = prompt::nutrition_prompt(&vision_result);
        let nutrition = match self.llm.complete(NUTRITION_SYSTEM_PROMPT, &user_prompt).await {
            Ok(reply) => extract_analysis(&reply),
            Err(e) => {
                log::error!("❌ Nutrition analysis failed: {}", e);
                error_section(&e)
            }
        };

        let record = json!({
            "vision_analysis": vision_result,
            "nutrition_analysis": Value::Object(nutrition),
        });
        let saved_to_file = self.store.save(original_filename, &record)?;

        let mut response = record;
        response["saved_to_file"] = Value::String(saved_to_file);
        Ok(response)
    }

    /// `/analyze_menu`: recommendations from a menu photo, gated by the
    /// classifier and by text availability.
    pub async fn analyze_menu(
        &self,
        image_path: &Path,
        original_filename: &str,
        preferences: &UserPreferences,
    ) -> Result<Value> {
        let vision_result = self.vision.analyze_image(image_path).await?;

        let is_menu = self.classifier.is_menu(&vision_result);
        let menu_section = if !vision_result.has_readable_text() {
            // No OCR text and no caption: nothing to recommend from,
            // whatever the classifier said.
            log::info!("ℹ️ No readable text in image, skipping menu analysis");
            no_menu_section()
        } else if !is_menu {
            log::info!("ℹ️ Image not classified as a menu");
            no_menu_section()
        } else {
            self.request_menu_recommendations(&vision_result, preferences)
                .await
        };

        let record = json!({
            "vision_analysis": vision_result,
            "menu_recommendations": Value::Object(menu_section),
        });

        let saved = self.store.save(original_filename, &record)?;
        log::info!("💾 Menu analysis persisted as {}", saved);

        Ok(record)
    }

    async fn request_menu_recommendations(
        &self,
        vision_result: &VisionResult,
        preferences: &UserPreferences,
    ) -> Map<String, Value> {
        let user_prompt = prompt::menu_prompt(vision_result, preferences);
        match self.llm.complete(MENU_SYSTEM_PROMPT, &user_prompt).await {
            Ok(reply) => match try_extract_json(&reply) {
                Some(mut parsed) => {
                    annotate_menu_analysis(&mut parsed, true);
                    parsed
                }
                None => {
                    // Fallback wrapper stays unannotated.
                    log::warn!("⚠️ Menu reply was not valid JSON, wrapping as text");
                    let mut map = Map::new();
                    map.insert(
                        FALLBACK_TEXT_KEY.to_string(),
                        Value::String(reply),
                    );
                    map
                }
            },
            Err(e) => {
                log::error!("❌ Menu analysis failed: {}", e);
                error_section(&e)
            }
        }
    }
}

fn no_menu_section() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("menu_detected".to_string(), Value::Bool(false));
    map.insert(
        "error".to_string(),
        Value::String("No menu detected in the image".to_string()),
    );
    map.insert("recommendations".to_string(), Value::Array(vec![]));
    map.insert("items_to_avoid".to_string(), Value::Array(vec![]));
    map
}

fn error_section(e: &anyhow::Error) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("error".to_string(), Value::String(e.to_string()));
    map
}
