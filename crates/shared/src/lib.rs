// Public modules
pub mod changelog;
pub mod config;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod models;
pub mod notify;
pub mod orchestrator;
pub mod scheduler;
pub mod slack;
pub mod summarizer;

// Re-export commonly used types
pub use changelog::{ChangelogPoller, NO_SUMMARY_FALLBACK};
pub use config::Config;
pub use error::{Error, Result};
pub use extractor::{extract_relevant_text, HttpFetcher, PageFetcher};
pub use llm::{LanguageModel, OpenAiClient};
pub use models::{ChangelogEntry, ChatMessage, NotificationMessage, PolledUpdate};
pub use notify::{DedupGate, Notifier, ALERT_PREFIX};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use scheduler::CheckScheduler;
pub use slack::{ChatChannel, SlackClient};
pub use summarizer::{clean_response, Summarizer};
