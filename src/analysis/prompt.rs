//! Deterministic prompt construction from vision output. Pure functions,
//! no I/O; the only inputs are the vision snapshot and the request
//! preferences.

use std::collections::HashSet;

use crate::models::{UserPreferences, VisionResult};

/// Tags below this confidence are too speculative to name as food items.
const TAG_CONFIDENCE_MIN: f64 = 0.7;
/// Object detections are already localized, so a looser cutoff works.
const OBJECT_CONFIDENCE_MIN: f64 = 0.5;

pub const NUTRITION_SYSTEM_PROMPT: &str =
    "You are a registered dietitian analyzing meals from photos. \
     You always answer with a single JSON object and nothing else.";

pub const MENU_SYSTEM_PROMPT: &str =
    "You are a dietary advisor helping a user choose from a restaurant menu. \
     You always answer with a single JSON object and nothing else.";

/// Confident food-item candidates: union of tag names and object labels
/// above their thresholds, deduplicated case-insensitively in the order
/// the provider returned them.
pub fn food_candidates(vision: &VisionResult) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let names = vision
        .tags
        .iter()
        .filter(|t| t.confidence > TAG_CONFIDENCE_MIN)
        .map(|t| t.name.as_str())
        .chain(
            vision
                .objects
                .iter()
                .filter(|o| o.confidence > OBJECT_CONFIDENCE_MIN)
                .map(|o| o.label.as_str()),
        );

    for name in names {
        if seen.insert(name.to_lowercase()) {
            candidates.push(name.to_string());
        }
    }

    candidates
}

pub fn nutrition_prompt(vision: &VisionResult) -> String {
    let candidates = food_candidates(vision);
    let subject = if candidates.is_empty() {
        vision
            .top_caption()
            .filter(|c| !c.trim().is_empty())
            .map(|c| format!("a meal described as \"{}\"", c))
            .unwrap_or_else(|| "an unidentified meal".to_string())
    } else {
        candidates.join(", ")
    };

    format!(
        "A meal photo was analyzed and the following food items were identified: {subject}.\n\
         \n\
         Provide a nutritional analysis of this meal.\n\
         \n\
         RESPONSE FORMAT: reply with exactly one JSON object with the key \
         \"nutritional_analysis\", whose value is an object with these keys:\n\
         - \"estimated_calories\": estimated total calories, with a \"range\" and \"notes\" when uncertain\n\
         - \"macronutrient_breakdown\": protein, carbohydrates and fat\n\
         - \"key_vitamins_and_minerals\": notable micronutrients\n\
         - \"health_benefits\": short health notes about this meal\n\
         - \"potential_allergens\": common allergens likely present\n\
         - \"recommendations_for_a_healthier_meal\": concrete adjustments\n\
         \n\
         Do not include any text outside the JSON object."
    )
}

pub fn menu_prompt(vision: &VisionResult, preferences: &UserPreferences) -> String {
    format!(
        "MENU TEXT (extracted from a photo):\n{menu}\n\
         \n\
         USER PROFILE:\n\
         - Age: {age}\n\
         - Height: {height}\n\
         - Weight: {weight}\n\
         - Dietary restrictions: {restrictions}\n\
         - Health goals: {goals}\n\
         - Calorie target: {calories}\n\
         \n\
         Recommend dishes from this menu for this user.\n\
         \n\
         IMPORTANT: only recommend items that literally appear in the menu \
         text above. Do not invent dishes. If no menu items are identifiable \
         in the text, return empty \"recommendations\" and \"items_to_avoid\" \
         arrays.\n\
         \n\
         RESPONSE FORMAT: reply with exactly one JSON object with these keys:\n\
         - \"recommendations\": array of {{\"item\", \"reason\"}} objects\n\
         - \"items_to_avoid\": array of {{\"item\", \"reason\"}} objects\n\
         \n\
         Do not include any text outside the JSON object.",
        menu = menu_text(vision),
        age = numeric_or_unspecified(preferences.age as f64),
        height = numeric_or_unspecified(preferences.height),
        weight = numeric_or_unspecified(preferences.weight),
        restrictions = if preferences.dietary_restrictions.is_empty() {
            "none".to_string()
        } else {
            preferences.dietary_restrictions.join(", ")
        },
        goals = preferences.health_goals,
        calories = preferences.calories_target,
    )
}

/// OCR text wins when present; otherwise fall back to captions and the
/// description tags the provider produced.
fn menu_text(vision: &VisionResult) -> String {
    let ocr = vision.extracted_text.trim();
    if !ocr.is_empty() {
        return ocr.to_string();
    }

    let mut parts: Vec<String> = vision
        .description
        .captions
        .iter()
        .map(|c| c.text.clone())
        .filter(|t| !t.trim().is_empty())
        .collect();
    if !vision.description.tags.is_empty() {
        parts.push(vision.description.tags.join(", "));
    }
    parts.join(". ")
}

fn numeric_or_unspecified(value: f64) -> String {
    if value > 0.0 {
        format!("{}", value)
    } else {
        "not specified".to_string()
    }
}
