//! Best-effort closing of a JSON prefix.
//!
//! While a model is still streaming, the accumulated text is a prefix of a
//! JSON document. [`close_partial_json`] cuts it back to the last point where
//! every scalar seen so far is known to be final and appends the missing
//! closing brackets. A string is final at its closing quote; a number or
//! literal only once a delimiter follows it. Keys without a finished value are
//! dropped. Successive snapshots therefore only ever gain fields and
//! elements, never change a value already reported.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object,
    Array,
}

impl Frame {
    const fn closer(self) -> char {
        match self {
            Self::Object => '}',
            Self::Array => ']',
        }
    }
}

/// Close a JSON prefix into a parseable document.
///
/// Leading text before the first `{` or `[` is skipped. Returns the first
/// balanced document unchanged once it is complete (anything after it is
/// ignored), the closed prefix while it is not, and `None` when no container
/// has been opened yet.
pub fn close_partial_json(text: &str) -> Option<String> {
    let start = text.find(['{', '['])?;
    let body = &text[start..];

    let mut stack: Vec<Frame> = Vec::new();
    // (cut position in `body`, open frames at that position)
    let mut safe: Option<(usize, Vec<Frame>)> = None;
    let mut in_string = false;
    let mut escape = false;
    let mut string_is_key = false;
    let mut expect_key = false;
    let mut in_scalar = false;

    for (i, c) in body.char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
                if !string_is_key {
                    safe = Some((i + 1, stack.clone()));
                }
            }
            continue;
        }

        if in_scalar {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-') {
                continue;
            }
            in_scalar = false;
            safe = Some((i, stack.clone()));
        }

        match c {
            '{' => {
                stack.push(Frame::Object);
                expect_key = true;
                safe = Some((i + 1, stack.clone()));
            }
            '[' => {
                stack.push(Frame::Array);
                expect_key = false;
                safe = Some((i + 1, stack.clone()));
            }
            '}' | ']' => {
                stack.pop();
                if stack.is_empty() {
                    return Some(body[..=i].to_string());
                }
                expect_key = false;
                safe = Some((i + 1, stack.clone()));
            }
            '"' => {
                in_string = true;
                string_is_key = expect_key && stack.last() == Some(&Frame::Object);
            }
            ',' => expect_key = stack.last() == Some(&Frame::Object),
            ':' => expect_key = false,
            c if c.is_whitespace() => {}
            _ => in_scalar = true,
        }
    }

    let (cut, frames) = safe?;
    let mut closed = body[..cut].trim_end().to_string();
    if closed.ends_with(',') {
        closed.pop();
    }
    closed.extend(frames.iter().rev().map(|frame| frame.closer()));
    Some(closed)
}
