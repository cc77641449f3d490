//! Operator-facing log output.
//!
//! Every line is `<label>: <message> <fields>`, with the label taken from
//! the [`Severity`] table and the whole line colored by severity when the
//! writer supports ANSI.

use std::fmt::{self, Write as _};

use colored::Colorize;
use relaybot::Severity;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Formats events as severity-labelled console lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorFormat;

impl<S, N> FormatEvent<S, N> for OperatorFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let severity = Severity::of(event.metadata());

        let mut body = String::new();
        ctx.field_format()
            .format_fields(format::Writer::new(&mut body), event)?;
        let line = format!("{}: {body}", severity.label());

        if writer.has_ansi_escapes() {
            writeln!(writer, "{}", paint(severity, &line))
        } else {
            writeln!(writer, "{line}")
        }
    }
}

fn paint(severity: Severity, line: &str) -> colored::ColoredString {
    match severity {
        Severity::Debug => line.dimmed(),
        Severity::Info => line.green(),
        Severity::Warning => line.yellow(),
        Severity::Error => line.red(),
        Severity::Critical => line.bright_red().bold(),
        Severity::Chat => line.bright_cyan(),
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default
/// `info` filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .event_format(OperatorFormat)
        .with_env_filter(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use relaybot::{CHAT_TARGET, CRITICAL_TARGET};
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Runs `f` under a plain-text `OperatorFormat` subscriber and
    /// returns what it printed.
    fn render(f: impl FnOnce()) -> String {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .event_format(OperatorFormat)
            .with_writer(capture.clone())
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = capture.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_format_event_prefixes_level_label() {
        let out = render(|| tracing::warn!("Transport fault"));
        assert_eq!(out, "*WARN*: Transport fault\n");
    }

    #[test]
    fn test_format_event_appends_fields() {
        let out = render(|| tracing::info!(account = "bot", "Logged on"));
        assert_eq!(out, "+INFO+: Logged on account=\"bot\"\n");
    }

    #[test]
    fn test_format_event_uses_chat_and_critical_targets() {
        let out = render(|| {
            tracing::info!(target: CHAT_TARGET, from = %"A", "hello");
            tracing::error!(target: CRITICAL_TARGET, "logon failed");
            tracing::error!("sentry write failed");
        });

        let lines: Vec<_> = out.lines().collect();
        assert_eq!(
            lines,
            [
                "!CHAT!: hello from=A",
                "☼CRIT☼: logon failed",
                "≡ERRR≡: sentry write failed",
            ]
        );
    }

    #[test]
    fn test_format_event_debug_label() {
        let out = render(|| tracing::debug!("sentry saved"));
        assert_eq!(out, "-DBUG-: sentry saved\n");
    }
}
