use async_trait::async_trait;
use std::io::{BufRead, Write};
use tokio::sync::mpsc;

/// Where views are printed and where confirmations and text prompts are
/// answered. The terminal implementation talks to stdin/stdout; tests script
/// the answers.
#[async_trait]
pub trait Console: Send {
    fn print(&mut self, text: &str);

    /// Yes/no question; anything but an explicit yes is a no.
    async fn confirm(&mut self, question: &str) -> bool;

    /// Free-text question. `None` when the user cancels with an empty
    /// answer and there is no default, or input has ended.
    async fn ask(&mut self, question: &str, default: &str) -> Option<String>;
}

pub struct TerminalConsole {
    lines: mpsc::UnboundedReceiver<String>,
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalConsole {
    /// Stdin is read on a dedicated thread so a pending read never keeps the
    /// process alive and can be abandoned when Ctrl-C ends the session.
    pub fn new() -> Self {
        let (tx, lines) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read input: {}", e);
                        break;
                    }
                }
            }
        });
        Self { lines }
    }

    /// Next line typed by the user, `None` on end of input.
    pub async fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.print(prompt);
        self.lines.recv().await
    }
}

#[async_trait]
impl Console for TerminalConsole {
    fn print(&mut self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    async fn confirm(&mut self, question: &str) -> bool {
        let answer = self.read_line(&format!("{} [y/N] ", question)).await;
        is_yes(answer.as_deref().unwrap_or(""))
    }

    async fn ask(&mut self, question: &str, default: &str) -> Option<String> {
        let prompt = if default.is_empty() {
            format!("{}: ", question)
        } else {
            format!("{} [{}]: ", question, default)
        };
        let answer = self.read_line(&prompt).await?;
        resolve_answer(&answer, default)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "是")
}

fn resolve_answer(answer: &str, default: &str) -> Option<String> {
    let answer = answer.trim();
    if !answer.is_empty() {
        Some(answer.to_string())
    } else if !default.is_empty() {
        Some(default.to_string())
    } else {
        None
    }
}

/// Console with canned answers that records everything printed.
#[cfg(test)]
#[derive(Default)]
pub struct ScriptedConsole {
    pub answers: std::collections::VecDeque<String>,
    pub output: String,
}

#[cfg(test)]
impl ScriptedConsole {
    pub fn answering(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            output: String::new(),
        }
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

#[cfg(test)]
#[async_trait]
impl Console for ScriptedConsole {
    fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }

    async fn confirm(&mut self, _question: &str) -> bool {
        is_yes(&self.answers.pop_front().unwrap_or_default())
    }

    async fn ask(&mut self, _question: &str, default: &str) -> Option<String> {
        let answer = self.answers.pop_front()?;
        resolve_answer(&answer, default)
    }
}
