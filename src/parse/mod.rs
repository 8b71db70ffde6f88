//! Log parsing: raw text into ordered [`LogRecord`]s.
//!
//! Each line is `<date> <time> <LEVEL> <message...>`. The first three
//! whitespace-delimited tokens are fields and the remainder, internal
//! whitespace included, is the message.

mod level;

pub use level::Level;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::detect::DetectError;

/// Accepts an optional fractional second after `%S`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Format used when timestamps are rendered back out.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One structured log entry. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub timestamp: NaiveDateTime,
    pub level: Level,
    pub message: String,
}

/// Parser output: records in file order plus the number of dropped lines.
#[derive(Debug, Default)]
pub struct ParsedLog {
    pub records: Vec<LogRecord>,
    pub skipped: usize,
}

/// Split off the next whitespace-delimited token.
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(end) => Some((&s[..end], &s[end..])),
        None => Some((s, "")),
    }
}

/// Parse the raw text of a log file.
///
/// Lines with fewer than four tokens are skipped. A line whose timestamp
/// cannot be parsed aborts the whole run with [`DetectError::Parse`].
/// Unrecognized levels skip the line, or abort with
/// [`DetectError::UnknownLevel`] when `strict_levels` is set.
pub fn parse_log(text: &str, strict_levels: bool) -> Result<ParsedLog, DetectError> {
    let mut parsed = ParsedLog::default();

    for (idx, line) in text.lines().enumerate() {
        let Some(fields) = split_fields(line) else {
            debug!(line = idx + 1, "skipping line with fewer than 4 fields");
            parsed.skipped += 1;
            continue;
        };
        let (date, time, level, message) = fields;

        let raw_ts = format!("{} {}", date, time);
        let timestamp = NaiveDateTime::parse_from_str(&raw_ts, TIMESTAMP_FORMAT).map_err(
            |source| DetectError::Parse {
                line: idx + 1,
                input: raw_ts.clone(),
                source,
            },
        )?;

        let level = match level.parse::<Level>() {
            Ok(level) => level,
            Err(e) if strict_levels => return Err(e),
            Err(_) => {
                debug!(line = idx + 1, %level, "skipping line with unknown level");
                parsed.skipped += 1;
                continue;
            }
        };

        parsed.records.push(LogRecord {
            timestamp,
            level,
            message: message.to_string(),
        });
    }

    Ok(parsed)
}

fn split_fields(line: &str) -> Option<(&str, &str, &str, &str)> {
    let (date, rest) = next_token(line)?;
    let (time, rest) = next_token(rest)?;
    let (level, rest) = next_token(rest)?;
    let message = rest.trim_start();
    if message.is_empty() {
        return None;
    }
    Some((date, time, level, message))
}
