//! cURL command parser.
//!
//! Turns a pasted `curl ...` command line into an [`HttpRequest`]. Only the
//! flags that shape the request are interpreted; output and transport flags
//! are skipped.

use crate::auth::basic::{basic_auth, split_credentials};
use crate::models::{HttpMethod, HttpRequest};
use log::debug;
use thiserror::Error;

/// Flags without an argument that do not change the request.
const IGNORED_SWITCHES: &[&str] = &[
    "--compressed",
    "-k",
    "--insecure",
    "-L",
    "--location",
    "-s",
    "--silent",
    "-S",
    "--show-error",
    "-v",
    "--verbose",
    "-i",
    "--include",
    "-f",
    "--fail",
    "-g",
    "--globoff",
    "-N",
    "--no-buffer",
];

/// Flags whose argument does not change the request.
const IGNORED_WITH_VALUE: &[&str] = &[
    "-o",
    "--output",
    "-w",
    "--write-out",
    "-m",
    "--max-time",
    "--connect-timeout",
    "--retry",
    "-x",
    "--proxy",
    "--cacert",
    "--cert",
    "--key",
    "-e",
    "--referer",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Input is empty")]
    EmptyInput,

    #[error("Command does not start with 'curl'")]
    NotACurlCommand,

    #[error("No URL found in cURL command")]
    MissingUrl,

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Invalid header format: {0}")]
    InvalidHeader(String),

    #[error("Missing value after {0}")]
    MissingValue(String),

    #[error("Unbalanced quotes in command")]
    UnbalancedQuotes,
}

/// Parses a cURL command string into a request.
///
/// `-d` implies `POST` unless a method was given; several `-d` values are
/// joined with `&`. A body without an explicit content type is sent as JSON
/// when it looks like JSON and as form data otherwise, like curl does.
///
/// # Errors
///
/// Returns a `ParseError` when the input is not a curl command, has
/// unbalanced quotes, names an unknown method, or has no URL.
pub fn parse_curl_command(curl_str: &str) -> Result<HttpRequest, ParseError> {
    let trimmed = curl_str.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let tokens = tokenize(trimmed)?;
    match tokens.first() {
        Some(first) if first == "curl" => parse_tokens(&tokens[1..]),
        _ => Err(ParseError::NotACurlCommand),
    }
}

/// Splits a command line the way a POSIX shell would: single quotes are
/// literal, double quotes allow `\` escapes, and a backslash-newline joins
/// lines.
fn tokenize(input: &str) -> Result<Vec<String>, ParseError> {
    let cleaned = input.replace("\\\r\n", " ").replace("\\\n", " ");

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut chars = cleaned.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_single_quote {
            if ch == '\'' {
                in_single_quote = false;
            } else {
                current.push(ch);
            }
            continue;
        }
        if in_double_quote {
            match ch {
                '"' => in_double_quote = false,
                '\\' => match chars.peek() {
                    Some(&next @ ('"' | '\\' | '$' | '`')) => {
                        current.push(next);
                        chars.next();
                    }
                    _ => current.push('\\'),
                },
                _ => current.push(ch),
            }
            continue;
        }

        match ch {
            '\'' => {
                in_single_quote = true;
                in_token = true;
            }
            '"' => {
                in_double_quote = true;
                in_token = true;
            }
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_token = true;
            }
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_single_quote || in_double_quote {
        return Err(ParseError::UnbalancedQuotes);
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_tokens(tokens: &[String]) -> Result<HttpRequest, ParseError> {
    let mut method: Option<HttpMethod> = None;
    let mut url: Option<String> = None;
    let mut request = HttpRequest::new(HttpMethod::GET, "");
    let mut body: Option<String> = None;

    let mut iter = tokens.iter();
    while let Some(token) = iter.next() {
        if !token.starts_with('-') || token == "-" {
            if url.is_none() {
                url = Some(token.clone());
            }
            continue;
        }

        let (flag, inline_value) = split_flag(token);
        let mut value = |flag: &str| {
            inline_value
                .clone()
                .or_else(|| iter.next().cloned())
                .ok_or_else(|| ParseError::MissingValue(flag.to_string()))
        };

        match flag {
            "-X" | "--request" => {
                let text = value(flag)?;
                method = Some(
                    text.parse()
                        .map_err(|_| ParseError::InvalidMethod(text.clone()))?,
                );
            }
            "-H" | "--header" => {
                let header = value(flag)?;
                let (name, header_value) = header
                    .split_once(':')
                    .ok_or_else(|| ParseError::InvalidHeader(header.clone()))?;
                request.set_header(name.trim(), header_value.trim());
            }
            "-d" | "--data" | "--data-raw" | "--data-binary" | "--data-ascii" => {
                let data = value(flag)?;
                body = Some(match body {
                    Some(existing) => format!("{}&{}", existing, data),
                    None => data,
                });
            }
            "--json" => {
                body = Some(value(flag)?);
                if request.content_type().is_none() {
                    request.set_header("Content-Type", "application/json");
                }
                if request.header("accept").is_none() {
                    request.set_header("Accept", "application/json");
                }
            }
            "-u" | "--user" => {
                let (user, password) = split_credentials(&value(flag)?);
                request.set_header("Authorization", basic_auth(&user, &password));
            }
            "-A" | "--user-agent" => {
                request.set_header("User-Agent", value(flag)?);
            }
            "--url" => {
                url = Some(value(flag)?);
            }
            f if IGNORED_WITH_VALUE.contains(&f) => {
                value(flag)?;
            }
            f if IGNORED_SWITCHES.contains(&f) => {}
            other => debug!("ignoring curl flag {}", other),
        }
    }

    request.url = url.ok_or(ParseError::MissingUrl)?;
    if let Some(body) = body {
        if request.content_type().is_none() {
            let looks_like_json = body.trim_start().starts_with('{') || body.trim_start().starts_with('[');
            let content_type = if looks_like_json {
                "application/json"
            } else {
                "application/x-www-form-urlencoded"
            };
            request.set_header("Content-Type", content_type);
        }
        request.body = Some(body);
        request.method = method.unwrap_or(HttpMethod::POST);
    } else {
        request.method = method.unwrap_or(HttpMethod::GET);
    }
    Ok(request)
}

/// Splits `--flag=value` and attached short forms like `-XPOST`.
fn split_flag(token: &str) -> (&str, Option<String>) {
    if token.starts_with("--") {
        return match token.split_once('=') {
            Some((flag, value)) => (flag, Some(value.to_string())),
            None => (token, None),
        };
    }
    if token.len() > 2 && token.is_char_boundary(2) {
        let (flag, rest) = token.split_at(2);
        if matches!(flag, "-X" | "-H" | "-d" | "-u" | "-A") {
            return (flag, Some(rest.to_string()));
        }
    }
    (token, None)
}
