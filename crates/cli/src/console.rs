//! Terminal surface for the chat loop.

use std::io::{self, IsTerminal, Write};

use runtime::{Surface, ToolCallRequest, ToolCallResult, ToolOutcome};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

const PREVIEW_CHARS: usize = 200;
const NO_MESSAGE: &str = "[No Message]";

/// Reads lines from stdin and prints to stdout.
pub struct Console {
    lines: Lines<BufReader<Stdin>>,
    /// Piped input is not echoed by a terminal, so the console does it.
    echo: bool,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            echo: !io::stdin().is_terminal(),
        }
    }
}

impl Surface for Console {
    async fn read_input(&mut self) -> io::Result<Option<String>> {
        print!("> ");
        io::stdout().flush()?;
        self.lines.next_line().await
    }

    fn user(&mut self, text: &str) {
        if self.echo || text.is_empty() {
            println!("{}", user_line(text));
        }
    }

    fn tool_invocation(&mut self, request: &ToolCallRequest) {
        let arguments = match request.raw_arguments.trim() {
            "" => "{}",
            raw => raw,
        };
        println!("  tool {} {}", request.tool_name, preview(arguments));
    }

    fn tool_response(&mut self, result: &ToolCallResult) {
        match &result.outcome {
            ToolOutcome::Success { content } => {
                debug!(tool = %result.tool_name, call_id = %result.call_id, content = %content, "tool response");
                println!("  done {}", result.tool_name);
            }
            ToolOutcome::Failure { message } => {
                println!("  fail {}: {}", result.tool_name, preview(message));
            }
        }
    }

    fn answer(&mut self, text: &str) {
        println!("\n{text}\n");
    }

    fn error(&mut self, message: &str) {
        eprintln!("Error: {message}\n");
    }

    fn goodbye(&mut self) {
        println!("\nSession ended.");
    }
}

fn user_line(text: &str) -> &str {
    if text.is_empty() { NO_MESSAGE } else { text }
}

/// First line, cut to a readable length.
fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    let mut cut: String = line.chars().take(PREVIEW_CHARS).collect();
    if cut.len() < text.len() {
        cut.push_str("...");
    }
    cut
}
