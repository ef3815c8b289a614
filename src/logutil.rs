//! Logging helpers: single-line escaping for dialogue and item text, and logger setup.

use crate::config::LoggingConfig;
use log::LevelFilter;
use std::io::Write;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Characters of dialogue text kept in a log line.
pub const DIALOGUE_PREVIEW: usize = 160;

/// Render `text` on a single log line.
///
/// Backslashes are doubled, `\n` `\r` `\t` become their escapes and any other control
/// character becomes `\xNN`. Text past `limit` characters is replaced by one `…`.
pub fn escape_log(text: &str, limit: usize) -> String {
    let mut out = String::with_capacity(text.len().min(limit) + 4);
    let mut chars = text.chars();
    for ch in chars.by_ref().take(limit) {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02X}", u32::from(c))),
            c => out.push(c),
        }
    }
    if chars.next().is_some() {
        out.push('…');
    }
    out
}

/// Install an `env_logger` logger for the host application.
///
/// With a log file configured, lines are appended to it and mirrored to the console only
/// when stderr is a terminal. Calling this more than once keeps the first logger.
pub fn init_logging(config: &LoggingConfig) {
    let mut builder = env_logger::Builder::new();
    let level = LevelFilter::from_str(&config.level).unwrap_or(LevelFilter::Info);
    builder.filter_level(level);

    let file = config.file.as_ref().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    match file {
        Some(f) => {
            let sink = Arc::new(Mutex::new(f));
            let is_tty = atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format(TIMESTAMP_FORMAT);
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = sink.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format(TIMESTAMP_FORMAT);
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters() {
        let esc = escape_log("*Lisa examines the Locket*\n\nCold\tsilver.\u{7}", 200);
        assert_eq!(esc, "*Lisa examines the Locket*\\n\\nCold\\tsilver.\\x07");
        assert_eq!(escape_log("a\\b", 10), "a\\\\b");
    }

    #[test]
    fn truncates_past_limit() {
        assert_eq!(escape_log("lullaby", 7), "lullaby");
        assert_eq!(escape_log("lullaby", 4), "lull…");
        let long = "a".repeat(400);
        assert_eq!(escape_log(&long, DIALOGUE_PREVIEW).chars().count(), DIALOGUE_PREVIEW + 1);
    }

    #[test]
    fn init_twice_is_harmless() {
        let config = LoggingConfig::default();
        init_logging(&config);
        init_logging(&config);
        log::info!("logger initialised");
    }
}
