use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use serde_json::Value;

/// Writes each combined analysis to its own timestamped JSON file.
/// Write-once: there is no update or delete path. Two saves of the same
/// basename within the same second collide; that granularity is a known
/// limitation.
pub struct ResultStore {
    results_dir: PathBuf,
}

impl ResultStore {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    /// Persist `record` as `<basename>_<YYYYMMDD_HHMMSS>.json` under the
    /// results directory (created if absent). Returns the generated file
    /// name.
    pub fn save(&self, original_filename: &str, record: &Value) -> Result<String> {
        fs::create_dir_all(&self.results_dir)?;

        let base = Path::new(original_filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("analysis");
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let file_name = format!("{}_{}.json", base, timestamp);

        let path = self.results_dir.join(&file_name);
        fs::write(&path, serde_json::to_string_pretty(record)?)?;

        log::info!("💾 Saved analysis to {}", path.display());
        Ok(file_name)
    }

    #[cfg(test)]
    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results"));

        let record = json!({"vision_analysis": {}, "nutrition_analysis": {"a": 1}});
        let file_name = store.save("lunch.jpg", &record).unwrap();

        let path = store.results_dir().join(&file_name);
        assert!(path.exists());

        let written: Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, record);
    }

    #[test]
    fn test_file_name_strips_extension_and_appends_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        let file_name = store.save("dinner_menu.png", &json!({})).unwrap();

        assert!(file_name.starts_with("dinner_menu_"));
        assert!(file_name.ends_with(".json"));
        // basename + '_' + YYYYMMDD_HHMMSS + '.json'
        let stamp = &file_name["dinner_menu_".len()..file_name.len() - ".json".len()];
        assert_eq!(stamp.len(), 15);
        assert_eq!(&stamp[8..9], "_");
    }

    #[test]
    fn test_file_name_ignores_directory_components() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        let file_name = store.save("uploads/photo.jpg", &json!({})).unwrap();
        assert!(file_name.starts_with("photo_"));
    }

    #[test]
    fn test_write_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        let file_name = store.save("meal.jpg", &json!({"a": {"b": 1}})).unwrap();
        let contents = fs::read_to_string(store.results_dir().join(&file_name)).unwrap();
        assert!(contents.contains('\n'));
    }
}
