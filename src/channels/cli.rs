//! CLI channel: a stdin/stdout REPL over a single preference session.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::preferences::{DisplayInstruction, PreferenceCollector, SessionState, WELCOME_MESSAGE};
use crate::web::DebugView;

const PROMPT: &str = "> ";

/// A terminal front end for the preference collector.
pub struct CliChannel {
    collector: Arc<PreferenceCollector>,
}

impl CliChannel {
    pub fn new(collector: Arc<PreferenceCollector>) -> Self {
        Self { collector }
    }

    /// Run against the process's stdin and stdout.
    pub async fn run(&self) -> std::io::Result<SessionState> {
        let stdin = BufReader::new(tokio::io::stdin());
        self.run_with(stdin, tokio::io::stdout()).await
    }

    /// Run the REPL until `/quit`, end of input, or collection completes.
    ///
    /// Returns the final session state.
    pub async fn run_with<R, W>(&self, reader: R, mut out: W) -> std::io::Result<SessionState>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut state = self.collector.new_session();
        let mut lines = reader.lines();

        out.write_all(format!("{WELCOME_MESSAGE}\n").as_bytes())
            .await?;
        out.write_all(b"Type /debug to see collected data, /quit to exit.\n\n")
            .await?;
        out.write_all(PROMPT.as_bytes()).await?;
        out.flush().await?;

        while let Some(line) = lines.next_line().await? {
            match line.trim() {
                "" => {}
                "/quit" => break,
                "/debug" => {
                    let view = DebugView::from_state(&state);
                    let json = serde_json::to_string_pretty(&view).unwrap_or_default();
                    out.write_all(format!("{json}\n").as_bytes()).await?;
                }
                input => {
                    let outcome = self.collector.submit(state, input).await;
                    state = outcome.state;
                    for instruction in &outcome.display {
                        out.write_all(self.format(instruction, &state).as_bytes())
                            .await?;
                    }
                    if state.is_complete() {
                        out.flush().await?;
                        break;
                    }
                }
            }
            out.write_all(PROMPT.as_bytes()).await?;
            out.flush().await?;
        }

        Ok(state)
    }

    fn format(&self, instruction: &DisplayInstruction, state: &SessionState) -> String {
        match instruction {
            DisplayInstruction::BotMessage { text } => format!("\n{text}\n"),
            DisplayInstruction::FollowUp { text, .. } => format!("{text}\n\n"),
            DisplayInstruction::Error { message } => format!("❌ {message}\n\n"),
            DisplayInstruction::Completed => {
                let mut summary = String::from("\n✅ Thanks! Here's what I collected:\n");
                for field in self.collector.schema().required_fields() {
                    if let Some(value) = state.record.get(&field.name) {
                        summary.push_str(&format!("   {}: {}\n", field.name, value));
                    }
                }
                summary
            }
            DisplayInstruction::ClearInput => String::new(),
        }
    }
}
