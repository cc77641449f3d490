//! Line-oriented operator console over stdin.

use std::io::Write;

use relaybot::Console;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

/// Shown before each command line.
pub const PROMPT: &str = "BOT> ";

/// Reads lines on a background task so waiting for input never blocks
/// the event loop. End of input closes the console.
///
/// The prompt is shown once per command line. A `next_line` future that
/// is dropped before a line arrives (the event loop rebuilds it after
/// every event) does not show it again.
pub struct StdinConsole {
    lines: mpsc::UnboundedReceiver<String>,
    out: Box<dyn Write + Send>,
    prompted: bool,
}

impl StdinConsole {
    /// A console on the process's stdin and stdout.
    pub fn spawn() -> Self {
        Self::from_reader(tokio::io::stdin()).with_output(std::io::stdout())
    }

    /// A console reading any byte source, one line at a time. Prompts go
    /// nowhere until [`with_output`](Self::with_output) says where.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "Console input failed");
                        break;
                    }
                }
            }
        });
        Self {
            lines: rx,
            out: Box::new(std::io::sink()),
            prompted: false,
        }
    }

    /// Prints prompts to `out`.
    pub fn with_output(mut self, out: impl Write + Send + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    fn show(&mut self, prompt: &str) {
        // A prompt that fails to print still leaves the console usable.
        let _ = write!(self.out, "{prompt}").and_then(|()| self.out.flush());
    }
}

impl Console for StdinConsole {
    async fn next_line(&mut self) -> Option<String> {
        if !self.prompted {
            self.show(PROMPT);
            self.prompted = true;
        }
        let line = self.lines.recv().await;
        self.prompted = false;
        line
    }

    async fn ask(&mut self, question: &str) -> Option<String> {
        self.show(question);
        let answer = self.lines.recv().await;
        self.prompted = false;
        answer
    }
}
