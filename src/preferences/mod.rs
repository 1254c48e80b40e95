//! Preference collection: the conversational form that extracts a
//! musician's job-search preferences.
//!
//! Each user message is wrapped in an extraction prompt, sent to the model,
//! and the structured reply is merged into the session's `PreferenceRecord`.
//! The loop keeps asking for the fields that are still empty until every
//! required field is filled.

pub mod collector;
pub mod model;
pub mod parser;
pub mod prompts;
pub mod schema;
pub mod state;

pub use collector::{CollectorConfig, DisplayInstruction, PreferenceCollector, TurnOutcome};
pub use model::{FieldValue, PreferenceRecord};
pub use parser::{ParsedOutput, parse};
pub use prompts::{INPUT_PLACEHOLDER, WELCOME_MESSAGE, build_prompt, follow_up_message};
pub use schema::{FieldDescriptor, FieldKind, FieldRole, PreferenceSchema};
pub use state::{ConversationTurn, SessionState, Speaker, Step, TranscriptEntry};
