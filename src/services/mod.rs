pub mod openrouter; // OpenRouter chat-completion client
pub mod storage;
pub mod vision; // Azure Computer Vision adapter

pub use openrouter::{LanguageModelService, OpenRouterClient};
pub use storage::ResultStore;
pub use vision::{AzureVisionClient, PollPolicy, VisionError, VisionService};
