//! Heuristic gate deciding whether an image looks like a restaurant menu.

use crate::models::VisionResult;

const DEFAULT_INDICATORS: [&str; 6] = ["menu", "restaurant", "food", "dining", "dish", "meal"];
const DEFAULT_TAG_CONFIDENCE: f64 = 0.65;

/// Keyword rule over vision tags and the top caption. The indicator set and
/// threshold live in the struct so they can be tuned and tested without
/// touching prompt construction.
#[derive(Debug, Clone)]
pub struct MenuClassifier {
    indicators: Vec<String>,
    tag_confidence_threshold: f64,
}

impl Default for MenuClassifier {
    fn default() -> Self {
        Self {
            indicators: DEFAULT_INDICATORS.iter().map(|s| s.to_string()).collect(),
            tag_confidence_threshold: DEFAULT_TAG_CONFIDENCE,
        }
    }
}

impl MenuClassifier {
    #[allow(dead_code)]
    pub fn new(indicators: Vec<String>, tag_confidence_threshold: f64) -> Self {
        Self {
            indicators,
            tag_confidence_threshold,
        }
    }

    /// A menu is assumed when a confident tag contains an indicator term,
    /// or the top caption mentions one (case-insensitive substring).
    pub fn is_menu(&self, vision: &VisionResult) -> bool {
        for tag in &vision.tags {
            if tag.confidence > self.tag_confidence_threshold
                && self.contains_indicator(&tag.name)
            {
                return true;
            }
        }

        if let Some(caption) = vision.top_caption() {
            if self.contains_indicator(caption) {
                return true;
            }
        }

        false
    }

    fn contains_indicator(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.indicators.iter().any(|term| lowered.contains(term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Caption, ImageDescription, ImageTag, OcrStatus, VisionResult};

    fn vision_with(tags: Vec<(&str, f64)>, caption: Option<&str>) -> VisionResult {
        VisionResult {
            tags: tags
                .into_iter()
                .map(|(name, confidence)| ImageTag {
                    name: name.to_string(),
                    confidence,
                })
                .collect(),
            objects: vec![],
            description: ImageDescription {
                captions: caption
                    .map(|text| {
                        vec![Caption {
                            text: text.to_string(),
                            confidence: 0.9,
                        }]
                    })
                    .unwrap_or_default(),
                tags: vec![],
            },
            extracted_text: String::new(),
            ocr_status: OcrStatus::Succeeded,
        }
    }

    #[test]
    fn test_restaurant_menu_caption_classifies_as_menu() {
        let classifier = MenuClassifier::default();
        let vision = vision_with(vec![], Some("a photo of a restaurant menu"));
        assert!(classifier.is_menu(&vision));
    }

    #[test]
    fn test_confident_menu_tag_classifies_as_menu() {
        let classifier = MenuClassifier::default();
        let vision = vision_with(vec![("menu board", 0.72)], Some("a wall with text"));
        assert!(classifier.is_menu(&vision));
    }

    #[test]
    fn test_low_confidence_tag_does_not_count() {
        let classifier = MenuClassifier::default();
        let vision = vision_with(vec![("menu", 0.5)], Some("a wall with text"));
        assert!(!classifier.is_menu(&vision));
    }

    #[test]
    fn test_non_menu_image_is_rejected() {
        let classifier = MenuClassifier::default();
        let vision = vision_with(vec![("dog", 0.98), ("grass", 0.9)], Some("a dog running"));
        assert!(!classifier.is_menu(&vision));
    }

    #[test]
    fn test_indicator_match_is_case_insensitive() {
        let classifier = MenuClassifier::default();
        let vision = vision_with(vec![("Fine Dining", 0.8)], None);
        assert!(classifier.is_menu(&vision));
    }

    #[test]
    fn test_only_top_caption_is_consulted() {
        let classifier = MenuClassifier::default();
        let mut vision = vision_with(vec![], Some("a wooden table"));
        vision.description.captions.push(Caption {
            text: "a restaurant menu".to_string(),
            confidence: 0.4,
        });
        assert!(!classifier.is_menu(&vision));
    }
}
