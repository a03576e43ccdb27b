//! Purpose: Encode and decode the plain-text cast file representation.
//! Exports: `encode`, `decode`, `MESSAGES_SECTION`, `ALERT_SECTION`.
//! Role: The only place that knows the on-disk layout; `CastStore` load/save/render go through it.
//! Invariants: `decode(encode(x))` reproduces `x` exactly, including whitespace and newlines in text.
//! Invariants: `[Messages]` is written before `[AlertMessage]`; empty sections are omitted.
//! Invariants: Decode is all-or-nothing; any malformed line fails with `ErrorKind::Parse` and its line number.
use crate::core::error::{Error, ErrorKind};
use crate::core::message::{AlertSlot, MessageSequence};

pub const MESSAGES_SECTION: &str = "Messages";
pub const ALERT_SECTION: &str = "AlertMessage";

const ALERT_MESSAGE_KEY: &str = "message";
const ALERT_EXIT_KEY: &str = "exit";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Section {
    Messages,
    Alert,
}

pub fn encode(messages: &MessageSequence, alert: &AlertSlot) -> String {
    let mut out = String::new();
    if !messages.is_empty() {
        out.push_str(&format!("[{MESSAGES_SECTION}]\n"));
        for (idx, message) in messages.iter().enumerate() {
            out.push_str(&format!("{}: {}\n", idx + 1, escape(&message.text)));
        }
    }
    if let Some(message) = alert.get() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("[{ALERT_SECTION}]\n"));
        out.push_str(&format!(
            "{ALERT_MESSAGE_KEY}: {}\n",
            escape(&message.text)
        ));
        out.push_str(&format!("{ALERT_EXIT_KEY}: {}\n", message.exit_on_alert));
    }
    out
}

pub fn decode(text: &str) -> Result<(MessageSequence, AlertSlot), Error> {
    let mut messages = MessageSequence::new();
    let mut section: Option<Section> = None;
    let mut seen_messages = false;
    let mut seen_alert = false;
    let mut alert_text: Option<String> = None;
    let mut alert_exit: Option<bool> = None;
    let mut alert_line = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(name) = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let next = match name.trim() {
                MESSAGES_SECTION => Section::Messages,
                ALERT_SECTION => Section::Alert,
                other => {
                    return Err(parse_error(line_no, format!("unknown section [{other}]")));
                }
            };
            let seen = match next {
                Section::Messages => &mut seen_messages,
                Section::Alert => &mut seen_alert,
            };
            if *seen {
                return Err(parse_error(
                    line_no,
                    format!("section [{}] appears more than once", name.trim()),
                ));
            }
            *seen = true;
            if next == Section::Alert {
                alert_line = line_no;
            }
            section = Some(next);
            continue;
        }

        let Some(current) = section else {
            return Err(parse_error(line_no, "entry outside of any section"));
        };
        let (key, value) = split_entry(raw)
            .ok_or_else(|| parse_error(line_no, "expected `key: value`"))?;
        let value = unescape(value).map_err(|message| parse_error(line_no, message))?;

        match current {
            Section::Messages => {
                let expected = messages.len() + 1;
                match key.parse::<usize>() {
                    Ok(position) if position == expected => messages.append(value),
                    _ => {
                        return Err(parse_error(
                            line_no,
                            format!("expected message key {expected}, found `{key}`"),
                        ));
                    }
                }
            }
            Section::Alert => match key {
                ALERT_MESSAGE_KEY if alert_text.is_none() => alert_text = Some(value),
                ALERT_EXIT_KEY if alert_exit.is_none() => {
                    let exit = match value.as_str() {
                        "true" => true,
                        "false" => false,
                        other => {
                            return Err(parse_error(
                                line_no,
                                format!("exit must be `true` or `false`, found `{other}`"),
                            ));
                        }
                    };
                    alert_exit = Some(exit);
                }
                ALERT_MESSAGE_KEY | ALERT_EXIT_KEY => {
                    return Err(parse_error(line_no, format!("duplicate alert key `{key}`")));
                }
                other => {
                    return Err(parse_error(line_no, format!("unknown alert key `{other}`")));
                }
            },
        }
    }

    let mut alert = AlertSlot::new();
    match alert_text {
        Some(text) => alert.set(text, alert_exit.unwrap_or(false)),
        None if seen_alert => {
            return Err(parse_error(
                alert_line,
                format!("[{ALERT_SECTION}] is missing `{ALERT_MESSAGE_KEY}`"),
            ));
        }
        None => {}
    }

    Ok((messages, alert))
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Parse)
        .with_message(message)
        .with_line(line)
}

// Splits on the first ':' and drops at most one following space.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.strip_prefix(' ').unwrap_or(value)))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => return Err(format!("invalid escape sequence `\\{other}`")),
            None => return Err("dangling `\\` at end of value".to_string()),
        }
    }
    Ok(out)
}
