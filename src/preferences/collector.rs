//! PreferenceCollector runs one conversational turn: prompt, model call,
//! parse, merge, completeness check.
//!
//! Turns are pure with respect to the session: the caller hands in the
//! current `SessionState` and gets back the next one together with a list of
//! display instructions. A failed turn hands back the input state unchanged.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_HISTORY_TURNS, DEFAULT_MAX_TOKENS};
use crate::error::{Error, SessionError};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

use super::parser::{ParsedOutput, parse};
use super::prompts::{build_prompt, follow_up_message};
use super::schema::PreferenceSchema;
use super::state::{ConversationTurn, SessionState, Step};

/// Extraction must be reproducible, so sampling is disabled.
const EXTRACTION_TEMPERATURE: f32 = 0.0;

/// Tuning for the model call.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Prior turns replayed to the model (0 disables conversation memory).
    pub history_turns: usize,
    pub max_tokens: u32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            history_turns: DEFAULT_HISTORY_TURNS,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Something the user-facing surface should show after a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayInstruction {
    /// The model's conversational reply.
    BotMessage { text: String },
    /// Request for the required fields that are still empty.
    FollowUp { missing: Vec<String>, text: String },
    /// Every required field is filled.
    Completed,
    /// The turn failed; the user may submit again.
    Error { message: String },
    /// Reset the input control.
    ClearInput,
}

/// Result of one submission.
#[derive(Debug)]
pub struct TurnOutcome {
    pub state: SessionState,
    pub display: Vec<DisplayInstruction>,
    /// The failure behind a `DisplayInstruction::Error`, if any.
    pub error: Option<Error>,
}

impl TurnOutcome {
    fn unchanged(state: SessionState) -> Self {
        Self {
            state,
            display: Vec::new(),
            error: None,
        }
    }

    fn failed(state: SessionState, error: Error) -> Self {
        Self {
            state,
            display: vec![DisplayInstruction::Error {
                message: error.user_message(),
            }],
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && !self.display.is_empty()
    }
}

/// Drives the preference collection loop.
pub struct PreferenceCollector {
    llm: Arc<dyn LlmProvider>,
    schema: PreferenceSchema,
    config: CollectorConfig,
}

impl PreferenceCollector {
    pub fn new(llm: Arc<dyn LlmProvider>, schema: PreferenceSchema, config: CollectorConfig) -> Self {
        Self { llm, schema, config }
    }

    pub fn schema(&self) -> &PreferenceSchema {
        &self.schema
    }

    /// A fresh session in the collecting step.
    pub fn new_session(&self) -> SessionState {
        SessionState::new(&self.schema)
    }

    /// Process one user submission.
    ///
    /// Blank input is ignored. Model and parse failures are reported through
    /// `DisplayInstruction::Error` and leave the state untouched.
    pub async fn submit(&self, state: SessionState, input: &str) -> TurnOutcome {
        let input = input.trim();
        if input.is_empty() {
            debug!(session = %state.id, "Ignoring blank submission");
            return TurnOutcome::unchanged(state);
        }

        if state.step.is_terminal() {
            return TurnOutcome::failed(state, SessionError::AlreadyComplete.into());
        }

        match self.extract(&state, input).await {
            Ok(parsed) => self.apply(state, input, parsed),
            Err(e) => {
                warn!(session = %state.id, error = %e, "Turn failed, session left unchanged");
                TurnOutcome::failed(state, e)
            }
        }
    }

    /// Build the prompt, call the model, and decode its reply.
    async fn extract(&self, state: &SessionState, input: &str) -> Result<ParsedOutput, Error> {
        let prompt = build_prompt(&self.schema, input);
        debug!(session = %state.id, prompt = %prompt, "Built extraction prompt");

        let mut messages = self.history_messages(state);
        messages.push(ChatMessage::user(prompt));

        let request = CompletionRequest::new(messages)
            .with_temperature(EXTRACTION_TEMPERATURE)
            .with_max_tokens(self.config.max_tokens);

        let response = self.llm.complete(request).await?;
        debug!(
            session = %state.id,
            raw = %response.content,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Model replied"
        );

        Ok(parse(&self.schema, &response.content)?)
    }

    /// The most recent turns as alternating user/assistant messages.
    ///
    /// The assistant side carries the follow-up that was shown, so the model
    /// knows which fields it already asked for.
    fn history_messages(&self, state: &SessionState) -> Vec<ChatMessage> {
        let skip = state.turns.len().saturating_sub(self.config.history_turns);
        state.turns[skip..]
            .iter()
            .flat_map(|turn| {
                let shown = match &turn.follow_up {
                    Some(follow_up) => format!("{}\n{}", turn.bot, follow_up),
                    None => turn.bot.clone(),
                };
                [
                    ChatMessage::user(turn.user.clone()),
                    ChatMessage::assistant(shown),
                ]
            })
            .collect()
    }

    /// Merge a successful extraction and advance the step when complete.
    fn apply(&self, mut state: SessionState, input: &str, parsed: ParsedOutput) -> TurnOutcome {
        let updated = state.record.merge(&parsed);
        let missing = state.record.missing_fields(&self.schema);

        let follow_up = (!missing.is_empty()).then(|| follow_up_message(&missing));
        state.turns.push(ConversationTurn {
            user: input.to_string(),
            bot: parsed.response().to_string(),
            follow_up: follow_up.clone(),
            at: chrono::Utc::now(),
        });

        let mut display = vec![DisplayInstruction::BotMessage {
            text: parsed.response().to_string(),
        }];
        match follow_up {
            Some(text) => display.push(DisplayInstruction::FollowUp {
                missing: missing.clone(),
                text,
            }),
            None => {
                state.step = Step::Done;
                display.push(DisplayInstruction::Completed);
            }
        }
        display.push(DisplayInstruction::ClearInput);

        info!(
            session = %state.id,
            turn = state.turns.len(),
            updated = ?updated,
            missing = ?missing,
            step = %state.step,
            "Turn recorded"
        );

        TurnOutcome {
            state,
            display,
            error: None,
        }
    }
}
