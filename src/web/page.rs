//! Chat page view model and template rendering.

use chrono::{DateTime, Utc};
use minijinja::Environment;
use serde::Serialize;
use uuid::Uuid;

use crate::preferences::{
    INPUT_PLACEHOLDER, PreferenceRecord, PreferenceSchema, SessionState, Step, TranscriptEntry,
};

pub const PAGE_TITLE: &str = "Orchestra Search Demo";

const CHAT_TEMPLATE: &str = "chat.html";

/// Read-only session summary shown in the debug panel.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub step: Step,
    pub turns: usize,
    pub created_at: DateTime<Utc>,
}

/// Diagnostic view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct DebugView {
    pub user_data: PreferenceRecord,
    /// Reserved for job matches; always empty.
    pub job_data: serde_json::Value,
    pub session: SessionSummary,
}

impl DebugView {
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            user_data: state.record.clone(),
            job_data: serde_json::json!({}),
            session: SessionSummary {
                id: state.id,
                step: state.step,
                turns: state.turns.len(),
                created_at: state.created_at,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct PreferenceLine {
    name: String,
    value: String,
}

/// Everything the chat template needs.
#[derive(Debug, Clone, Serialize)]
pub struct ChatPage {
    title: &'static str,
    session_id: Uuid,
    transcript: Vec<TranscriptEntry>,
    error: Option<String>,
    complete: bool,
    placeholder: &'static str,
    preferences: Vec<PreferenceLine>,
    user_data: String,
    job_data: String,
    session_summary: String,
}

impl ChatPage {
    pub fn new(schema: &PreferenceSchema, state: &SessionState, error: Option<String>) -> Self {
        let debug = DebugView::from_state(state);
        let preferences = schema
            .required_fields()
            .filter_map(|f| {
                state.record.get(&f.name).map(|v| PreferenceLine {
                    name: f.name.clone(),
                    value: v.to_string(),
                })
            })
            .collect();

        Self {
            title: PAGE_TITLE,
            session_id: state.id,
            transcript: state.transcript(),
            error,
            complete: state.is_complete(),
            placeholder: INPUT_PLACEHOLDER,
            preferences,
            user_data: serde_json::to_string_pretty(&debug.user_data).unwrap_or_default(),
            job_data: serde_json::to_string_pretty(&debug.job_data).unwrap_or_default(),
            session_summary: serde_json::to_string_pretty(&debug.session).unwrap_or_default(),
        }
    }
}

/// Templates compiled into the binary.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(CHAT_TEMPLATE, include_str!("../../templates/chat.html"))?;
        Ok(Self { env })
    }

    pub fn render_chat(&self, page: &ChatPage) -> Result<String, minijinja::Error> {
        self.env.get_template(CHAT_TEMPLATE)?.render(page)
    }
}
