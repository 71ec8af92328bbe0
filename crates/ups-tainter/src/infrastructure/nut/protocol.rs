//! Line level encoding of the NUT network protocol.
//!
//! Requests and responses are single lines of space separated words. Words
//! containing spaces are double quoted, with `\"` and `\\` as escapes.

use error_stack::Report;

use super::error::NutError;

/// Split a response line into words, unquoting quoted words.
pub(crate) fn tokenize(line: &str) -> Result<Vec<String>, Report<NutError>> {
    let mut words = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_ascii_whitespace()).is_some() {}
        let Some(first) = chars.next() else {
            break;
        };

        let mut word = String::new();
        if first == '"' {
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some(escaped) => word.push(escaped),
                        None => break,
                    },
                    '"' => {
                        closed = true;
                        break;
                    }
                    c => word.push(c),
                }
            }
            if !closed {
                return Err(Report::new(NutError::Protocol {
                    message: format!("unterminated quote in {line:?}"),
                }));
            }
        } else {
            word.push(first);
            while let Some(c) = chars.next_if(|c| !c.is_ascii_whitespace()) {
                word.push(c);
            }
        }
        words.push(word);
    }

    Ok(words)
}

/// Encode a request argument, quoting it when needed.
pub(crate) fn quote(arg: &str) -> String {
    let needs_quotes =
        arg.is_empty() || arg.chars().any(|c| c.is_ascii_whitespace() || c == '"' || c == '\\');
    if !needs_quotes {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Turn an `ERR <code>` response into an error.
pub(crate) fn check_error(words: &[String]) -> Result<(), Report<NutError>> {
    match words {
        [first, code, ..] if first == "ERR" => Err(Report::new(NutError::Server {
            code: code.clone(),
        })),
        [first] if first == "ERR" => Err(Report::new(NutError::Server {
            code: "UNKNOWN".to_string(),
        })),
        _ => Ok(()),
    }
}

/// `UPS <name> "<description>"`
pub(crate) fn parse_ups_entry(words: &[String]) -> Option<String> {
    match words {
        [kind, name, ..] if kind == "UPS" => Some(name.clone()),
        _ => None,
    }
}

/// `VAR <ups> <name> "<value>"`
pub(crate) fn parse_var_entry(words: &[String], ups: &str) -> Option<(String, String)> {
    match words {
        [kind, owner, name, value, ..] if kind == "VAR" && owner == ups => {
            Some((name.clone(), value.clone()))
        }
        _ => None,
    }
}
