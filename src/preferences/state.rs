//! Per-session conversation state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::PreferenceRecord;
use super::prompts::WELCOME_MESSAGE;
use super::schema::PreferenceSchema;

/// Collection progress.
///
/// `Collecting` → `Done` once every required field is filled. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Collecting,
    Done,
}

impl Step {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collecting => write!(f, "collecting"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// One user submission and the bot's reply to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user: String,
    pub bot: String,
    /// Request for missing fields, when the turn left any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
    pub at: DateTime<Utc>,
}

/// Who a transcript line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Bot,
}

/// A single rendered line of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Everything one visitor's conversation owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    pub step: Step,
    pub record: PreferenceRecord,
    /// Oldest first.
    pub turns: Vec<ConversationTurn>,
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(schema: &PreferenceSchema) -> Self {
        Self {
            id: Uuid::new_v4(),
            step: Step::default(),
            record: PreferenceRecord::new(schema),
            turns: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.step.is_terminal()
    }

    /// The conversation in chronological order, welcome message first.
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        let mut entries = vec![TranscriptEntry {
            speaker: Speaker::Bot,
            text: WELCOME_MESSAGE.to_string(),
        }];
        for turn in &self.turns {
            entries.push(TranscriptEntry {
                speaker: Speaker::User,
                text: turn.user.clone(),
            });
            entries.push(TranscriptEntry {
                speaker: Speaker::Bot,
                text: turn.bot.clone(),
            });
            if let Some(ref follow_up) = turn.follow_up {
                entries.push(TranscriptEntry {
                    speaker: Speaker::Bot,
                    text: follow_up.clone(),
                });
            }
        }
        entries
    }
}
