pub mod classify;
pub mod extract;
pub mod prompt;

pub use classify::MenuClassifier;
pub use extract::{annotate_menu_analysis, extract_analysis, try_extract_json};
