//! Command handlers for the `reqcap` binary.
//!
//! [`execute`] picks a handler from the parsed arguments. Listing commands
//! and `--init` print to `out` and never touch the network; request modes
//! (template, direct, curl import, replay) all go through the chain runner
//! and print the response to `out` and diagnostics to `err`.

use crate::chain::{ChainError, ChainOutcome, ChainRunner, RunOptions};
use crate::cli::{ArgError, Cli};
use crate::config::{ConfigError, LoadedConfig};
use crate::curl::{import_curl, ParseError};
use crate::environment::{EnvError, ProcessEnv};
use crate::executor::{HttpExecutor, ReqwestExecutor, RequestError};
use crate::formatter::{format_assertions, format_diff, format_outcome, format_raw};
use crate::history::{format_history_list, HistoryEntry, HistoryError, HistoryStore};
use crate::models::HttpMethod;
use crate::snapshot::{FsSnapshotStore, SnapshotError, SnapshotStore};
use crate::template::{FsTemplateLoader, Template, TemplateError};
use log::warn;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Args(#[from] ArgError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("Error parsing curl: {0}")]
    Curl(#[from] ParseError),

    #[error(transparent)]
    Executor(#[from] RequestError),

    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    /// The arguments do not name anything to do.
    #[error("{0}")]
    Usage(String),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the request of a run comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestSource {
    Template(String),
    Direct { method: HttpMethod, url: String },
    Curl(String),
    Replay(usize),
}

impl RequestSource {
    /// Picks the request mode, in order: `--replay`, `--import-curl`,
    /// `-t`, then `METHOD URL`.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidMethod` for an unknown method and
    /// `CommandError::Usage` when nothing names a request.
    pub fn from_cli(cli: &Cli) -> Result<Self, CommandError> {
        if let Some(index) = cli.replay {
            return Ok(Self::Replay(index));
        }
        if let Some(curl) = &cli.import_curl {
            return Ok(Self::Curl(curl.clone()));
        }
        if let Some(name) = &cli.template {
            return Ok(Self::Template(name.clone()));
        }
        match (&cli.method, &cli.url) {
            (Some(method), Some(url)) => Ok(Self::Direct {
                method: method
                    .parse()
                    .map_err(|_| CommandError::InvalidMethod(method.clone()))?,
                url: url.clone(),
            }),
            (Some(method), None) => Err(CommandError::Usage(format!(
                "missing URL after '{}'; use 'reqcap METHOD URL' or 'reqcap -t {}' for a template",
                method, method
            ))),
            _ => Err(CommandError::Usage(
                "nothing to do: pass -t TEMPLATE or METHOD URL (see --help)".to_string(),
            )),
        }
    }
}

/// Config, environment and resource directories for one invocation.
pub struct Workspace {
    cwd: PathBuf,
    config: LoadedConfig,
    env: ProcessEnv,
    templates: FsTemplateLoader,
    templates_dir_override: Option<PathBuf>,
    snapshots_dir_override: Option<PathBuf>,
}

impl Workspace {
    /// Discovers the config and loads the `.env` overlay it names.
    ///
    /// # Errors
    ///
    /// Returns an error when an explicit config is missing, a config file
    /// is invalid, or the `.env` file is malformed.
    pub fn open(cwd: &Path, cli: &Cli) -> Result<Self, CommandError> {
        let config = LoadedConfig::discover(cli.config.as_deref(), cwd)?;
        let env = match config.env_file() {
            Some(path) => ProcessEnv::with_env_file(&path)?,
            None => ProcessEnv::new(),
        };
        let templates_dir =
            config.resolve_resource_dir("templates", cli.templates_dir.as_deref(), cwd);
        Ok(Self {
            cwd: cwd.to_path_buf(),
            templates: FsTemplateLoader::new(cwd, templates_dir),
            config,
            env,
            templates_dir_override: cli.templates_dir.clone(),
            snapshots_dir_override: cli.snapshots_dir.clone(),
        })
    }

    pub fn config(&self) -> &LoadedConfig {
        &self.config
    }

    pub fn templates(&self) -> &FsTemplateLoader {
        &self.templates
    }

    /// The store snapshots are saved to and diffed against.
    pub fn snapshot_store(&self) -> FsSnapshotStore {
        FsSnapshotStore::new(self.config.resource_dir_for_write(
            "snapshots",
            self.snapshots_dir_override.as_deref(),
            &self.cwd,
        ))
    }

    fn searched(&self, resource: &str, cli_override: Option<&Path>) -> String {
        self.config
            .resource_candidates(resource, cli_override, &self.cwd)
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Runs whatever the arguments ask for. Returns `false` when the run
/// completed but failed an assertion or snapshot diff.
///
/// # Errors
///
/// Any configuration, resolution or request error.
pub fn execute(
    cli: &Cli,
    cwd: &Path,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<bool, CommandError> {
    if cli.init {
        init(cwd, out)?;
        return Ok(true);
    }
    if cli.history {
        show_history(&HistoryStore::open_default()?, out)?;
        return Ok(true);
    }

    let workspace = Workspace::open(cwd, cli)?;
    if cli.list_snapshots {
        list_snapshots(&workspace, out)?;
        return Ok(true);
    }
    if cli.list_templates {
        list_templates(&workspace, out)?;
        return Ok(true);
    }

    let source = RequestSource::from_cli(cli)?;
    let options = cli.run_options()?;
    let history = match HistoryStore::open_default() {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("history disabled: {}", e);
            None
        }
    };
    let executor = ReqwestExecutor::new()?;
    run_request(
        &workspace,
        &executor,
        history.as_ref(),
        source,
        &options,
        cli.raw,
        out,
        err,
    )
}

/// Runs one request mode and reports its outcome.
///
/// The response goes to `out` (only the body with `raw`); assertion
/// results and the snapshot diff go to `err`. Template, direct and curl
/// requests are recorded in `history`; replays are not.
#[allow(clippy::too_many_arguments)]
pub fn run_request(
    workspace: &Workspace,
    executor: &dyn HttpExecutor,
    history: Option<&HistoryStore>,
    source: RequestSource,
    options: &RunOptions,
    raw: bool,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<bool, CommandError> {
    let snapshots = workspace.snapshot_store();
    let defaults = workspace.config.defaults_section();
    let runner = ChainRunner::new(
        defaults,
        &workspace.env,
        &workspace.templates,
        executor,
        &snapshots,
    );

    let (outcome, record_as) = match source {
        RequestSource::Template(name) => {
            let outcome = runner.run(&name, options, err)?;
            (outcome, Some(Some(name)))
        }
        RequestSource::Direct { method, url } => {
            let outcome = runner.run_template(Template::adhoc(method, url), options, err)?;
            (outcome, Some(None))
        }
        RequestSource::Curl(command) => {
            let outcome = runner.run_template(import_curl(&command)?, options, err)?;
            (outcome, Some(None))
        }
        RequestSource::Replay(index) => {
            let store = history.ok_or(HistoryError::NoHomeDir)?;
            let request = store.get(index)?.to_request();
            let mut options = options.clone();
            if options.form.is_empty() {
                options.form = request.form.clone();
            }
            let outcome = runner.run_template(Template::from_request(request), &options, err)?;
            (outcome, None)
        }
    };

    report(&outcome, options.verbose, raw, out, err)?;
    if let (Some(store), Some(template)) = (history, record_as) {
        store.record_quietly(&HistoryEntry::new(&outcome.request, template.as_deref()));
    }
    Ok(outcome.succeeded())
}

fn report(
    outcome: &ChainOutcome,
    verbose: bool,
    raw: bool,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CommandError> {
    if raw {
        writeln!(out, "{}", format_raw(&outcome.response))?;
    } else {
        writeln!(out, "{}", format_outcome(outcome, verbose))?;
    }
    if !outcome.assertions.is_empty() {
        writeln!(err, "{}", format_assertions(&outcome.assertions))?;
    }
    if let Some(changes) = &outcome.diff {
        writeln!(err, "{}", format_diff(changes))?;
    }
    Ok(())
}

/// `--list-templates`: name, description and a one-line summary of each.
pub fn list_templates(workspace: &Workspace, out: &mut dyn Write) -> Result<(), CommandError> {
    let Some(dir) = workspace.templates.templates_dir() else {
        writeln!(out, "No templates directory found.")?;
        writeln!(
            out,
            "Searched: {}",
            workspace.searched("templates", workspace.templates_dir_override.as_deref())
        )?;
        return Ok(());
    };

    let templates = workspace.templates.list()?;
    if templates.is_empty() {
        writeln!(out, "No templates found in: {}", dir.display())?;
        return Ok(());
    }

    writeln!(out, "Templates from: {}", dir.display())?;
    writeln!(out, "{} available:", templates.len())?;
    writeln!(out)?;
    for template in &templates {
        write!(out, "{}", describe_template(template))?;
    }
    Ok(())
}

fn describe_template(template: &Template) -> String {
    let mut text = match &template.description {
        Some(description) => format!("  {} - {}\n", template.name, description),
        None => format!("  {}\n", template.name),
    };

    let mut details = vec![format!("{} {}", template.method, template.url)];
    if !template.fields.is_empty() {
        let names: Vec<&str> = template.fields.iter().map(|f| f.name.as_str()).collect();
        details.push(format!("vars: {}", names.join(", ")));
    }
    if !template.exports.is_empty() {
        let names: Vec<&str> = template.exports.keys().map(String::as_str).collect();
        details.push(format!("exports: {}", names.join(", ")));
    }
    if !template.depends.is_empty() {
        details.push(format!("depends: {}", template.depends.join(", ")));
    }
    if let Some(snapshot) = template.snapshot_name() {
        details.push(format!("snapshot: {}", snapshot));
    }
    text.push_str(&format!("    {}\n", details.join(" | ")));

    let fields = template.filter.as_ref().and_then(|f| f.body_fields.as_ref());
    if let Some(fields) = fields.filter(|f| !f.is_empty()) {
        text.push_str(&format!("    filter: {}\n", fields.join(", ")));
    }
    text.push('\n');
    text
}

/// `--list-snapshots`.
pub fn list_snapshots(workspace: &Workspace, out: &mut dyn Write) -> Result<(), CommandError> {
    let dir = workspace.config.resolve_resource_dir(
        "snapshots",
        workspace.snapshots_dir_override.as_deref(),
        &workspace.cwd,
    );
    let Some(dir) = dir else {
        writeln!(out, "No snapshots directory found.")?;
        writeln!(
            out,
            "Searched: {}",
            workspace.searched("snapshots", workspace.snapshots_dir_override.as_deref())
        )?;
        return Ok(());
    };

    let snapshots = FsSnapshotStore::new(&dir).list()?;
    if snapshots.is_empty() {
        writeln!(out, "No snapshots found in: {}", dir.display())?;
        return Ok(());
    }
    writeln!(out, "Snapshots from: {}", dir.display())?;
    writeln!(out)?;
    for snapshot in snapshots {
        writeln!(out, "  {}  ({})", snapshot.name, snapshot.saved_at)?;
    }
    Ok(())
}

/// `--history`.
pub fn show_history(store: &HistoryStore, out: &mut dyn Write) -> Result<(), CommandError> {
    writeln!(out, "{}", format_history_list(&store.load()?))?;
    Ok(())
}

/// Config file written by `--init`; `{base_url}` is filled in.
const CONFIG_TEMPLATE: &str = "\
# reqcap configuration
# See: reqcap --help

defaults:
  base_url: {base_url}
  # env_file: .env
  timeout: 30
  templates_dir: templates
  snapshots_dir: snapshots
  headers:
    Content-Type: application/json
  # auth:
  #   type: bearer
  #   token: ${API_TOKEN}
";

/// `--init`: scaffolds `.reqcap.yaml`, `templates/` and `snapshots/` in
/// `cwd`, leaving anything that already exists alone.
pub fn init(cwd: &Path, out: &mut dyn Write) -> Result<(), CommandError> {
    let config_file = cwd.join(".reqcap.yaml");
    if config_file.exists() {
        writeln!(out, "  .reqcap.yaml (skipped, already exists)")?;
    } else {
        let content = CONFIG_TEMPLATE.replace("{base_url}", detect_base_url(cwd));
        fs::write(&config_file, content)?;
        writeln!(out, "  .reqcap.yaml (created)")?;
    }

    for dir in ["templates", "snapshots"] {
        let path = cwd.join(dir);
        if path.exists() {
            writeln!(out, "  {}/ (skipped, already exists)", dir)?;
        } else {
            fs::create_dir_all(&path)?;
            writeln!(out, "  {}/ (created)", dir)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Project initialized. Run 'reqcap --help' to get started.")?;
    Ok(())
}

/// Guesses the local dev server from the project files in `cwd`.
pub fn detect_base_url(cwd: &Path) -> &'static str {
    const MARKERS: &[(&[&str], &str)] = &[
        (&["package.json"], "http://localhost:3000"),
        (&["pyproject.toml", "requirements.txt"], "http://localhost:8000"),
        (&["go.mod"], "http://localhost:8080"),
        (&["Gemfile"], "http://localhost:3000"),
        (&["Cargo.toml"], "http://localhost:8080"),
    ];
    MARKERS
        .iter()
        .find(|(files, _)| files.iter().any(|file| cwd.join(file).exists()))
        .map_or("http://localhost:3000", |(_, url)| *url)
}
