//! Command-line arguments.

use crate::chain::RunOptions;
use crate::models::FormField;
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("invalid variable '{0}': expected NAME=VALUE")]
    InvalidVar(String),

    #[error("invalid header '{0}': expected 'Name: Value'")]
    InvalidHeader(String),

    #[error("invalid form field '{0}': expected KEY=VALUE or KEY=@FILE")]
    InvalidFormField(String),
}

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "reqcap")]
#[command(version)]
#[command(about = "Templated HTTP requests with filtered output, request chaining and snapshot diffs")]
#[command(after_help = "Examples:\n  \
    reqcap GET https://api.example.com/users -f 'data[].id,data[].name'\n  \
    reqcap -t create-user -v name=alice --export id\n  \
    reqcap -t get-user --assert status=200 --diff get-user\n  \
    reqcap POST /api/upload --form name=test --form file=@photo.jpg\n  \
    eval \"$(reqcap -t login 2>&1 >/dev/null | grep '^export ')\"")]
pub struct Cli {
    /// HTTP method for a direct request
    #[arg(value_name = "METHOD")]
    pub method: Option<String>,

    /// URL for a direct request
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Template name or path (see --list-templates)
    #[arg(short = 't', long = "template", value_name = "NAME")]
    pub template: Option<String>,

    /// Config file [default: .reqcap.yaml, then ~/.reqcap/config.yaml]
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Templates directory override
    #[arg(long, value_name = "DIR")]
    pub templates_dir: Option<PathBuf>,

    /// Snapshots directory override
    #[arg(long, value_name = "DIR")]
    pub snapshots_dir: Option<PathBuf>,

    /// Variable as NAME=VALUE (repeatable)
    #[arg(short = 'v', long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Request body, replaces the template body
    #[arg(short = 'b', long = "body")]
    pub body: Option<String>,

    /// Multipart form field as KEY=VALUE or KEY=@FILE (repeatable)
    #[arg(long = "form", value_name = "KEY=VALUE", conflicts_with = "body")]
    pub form: Vec<String>,

    /// Header as 'Name: Value' (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Comma-separated body fields to show, e.g. 'id,name' or 'data[].id'
    #[arg(short = 'f', long = "filter", value_name = "FIELDS")]
    pub filter: Option<String>,

    /// Request timeout in seconds [default: 30]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Include response headers in the output
    #[arg(long)]
    pub verbose: bool,

    /// Print only the response body
    #[arg(long)]
    pub raw: bool,

    /// Export a response value as reqcap_<name>: 'name' or 'name=path' (repeatable)
    #[arg(long = "export", value_name = "SPEC")]
    pub exports: Vec<String>,

    /// Assertion like 'status=200' or 'body.state!=failed' (repeatable)
    #[arg(long = "assert", value_name = "EXPR")]
    pub assertions: Vec<String>,

    /// Save the response as a named snapshot
    #[arg(long, value_name = "NAME")]
    pub snapshot: Option<String>,

    /// Compare the response with a saved snapshot; differences fail the run
    #[arg(long, value_name = "NAME")]
    pub diff: Option<String>,

    /// List saved snapshots
    #[arg(long)]
    pub list_snapshots: bool,

    /// List available templates
    #[arg(long)]
    pub list_templates: bool,

    /// Show request history
    #[arg(long)]
    pub history: bool,

    /// Send a request from history again
    #[arg(long, value_name = "INDEX")]
    pub replay: Option<usize>,

    /// Run a curl command
    #[arg(long, value_name = "CURL")]
    pub import_curl: Option<String>,

    /// Create .reqcap.yaml, templates/ and snapshots/ here
    #[arg(long)]
    pub init: bool,
}

impl Cli {
    /// The run options these arguments describe.
    ///
    /// # Errors
    ///
    /// Returns an `ArgError` for a `-v` or `--form` without `=`, or a `-H`
    /// without `:`.
    pub fn run_options(&self) -> Result<RunOptions, ArgError> {
        Ok(RunOptions {
            vars: self
                .vars
                .iter()
                .map(|v| parse_var(v))
                .collect::<Result<_, _>>()?,
            headers: self
                .headers
                .iter()
                .map(|h| parse_header(h))
                .collect::<Result<_, _>>()?,
            body: self.body.clone(),
            form: self
                .form
                .iter()
                .map(|f| FormField::parse(f).ok_or_else(|| ArgError::InvalidFormField(f.clone())))
                .collect::<Result<_, _>>()?,
            timeout: self.timeout,
            filter: self.filter.as_deref().map(parse_filter),
            verbose: self.verbose,
            exports: self.exports.clone(),
            assertions: self.assertions.clone(),
            snapshot: self.snapshot.clone(),
            diff: self.diff.clone(),
        })
    }
}

/// Parses `NAME=VALUE`; the value may contain `=`.
pub fn parse_var(text: &str) -> Result<(String, String), ArgError> {
    match text.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ArgError::InvalidVar(text.to_string())),
    }
}

/// Parses `Name: Value`.
pub fn parse_header(text: &str) -> Result<(String, String), ArgError> {
    match text.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ArgError::InvalidHeader(text.to_string())),
    }
}

/// Splits a `-f` value on commas, dropping empty entries.
pub fn parse_filter(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect()
}
