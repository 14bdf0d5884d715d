//! Chain execution.
//!
//! [`ChainRunner`] turns an execution plan into requests, one step at a time:
//! interpolate the template against the variable table, send it, merge its
//! exports into the table, save snapshots. The last step is the root and
//! additionally gets the caller's filter, assertions and snapshot diff.
//!
//! Before the first request every step is prepared once in dry-run mode
//! against a stand-in table holding the CLI variables plus a stand-in for every
//! export declared by an earlier step. Anything that cannot resolve
//! (unknown placeholder, malformed path, bad injection target, missing
//! `env.*` variable) therefore fails with nothing sent.

use super::error::ChainError;
use super::exports::{export_line, ExportSpec};
use super::resolver::{resolve_plan, resolve_plan_for, ExecutionPlan, PlanStep};
use crate::assertions::{evaluate_all, Assertion, AssertionResult};
use crate::auth::apply_authentication;
use crate::config::{Defaults, FilterConfig};
use crate::environment::EnvProvider;
use crate::executor::{ExecutionConfig, HttpExecutor};
use crate::models::{FormField, FormValue, HttpRequest, HttpResponse};
use crate::path::{filter, inject, PathExpr};
use crate::snapshot::{compare_response, Change, SnapshotRecord, SnapshotStore};
use crate::template::{Template, TemplateSource};
use crate::variables::{expand_env_refs, Interpolator, Provenance, VariableTable};
use log::{debug, info, warn};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;

/// Value bound to not-yet-known exports during pre-validation.
const STAND_IN_VALUE: &str = "stand-in";

/// Caller-supplied settings for one run.
///
/// Everything except `vars` applies to the root step only.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// `-v name=value` variables, visible to every step.
    pub vars: Vec<(String, String)>,
    /// Extra headers, applied last.
    pub headers: Vec<(String, String)>,
    /// Replaces the template body.
    pub body: Option<String>,
    /// Sends multipart form data instead of any body.
    pub form: Vec<FormField>,
    pub timeout: Option<u64>,
    /// Body fields to keep in the output.
    pub filter: Option<Vec<String>>,
    /// Also show response headers.
    pub verbose: bool,
    /// `--export` specs read from the root response.
    pub exports: Vec<String>,
    pub assertions: Vec<String>,
    /// Save the root response under this name.
    pub snapshot: Option<String>,
    /// Compare the root response with this snapshot.
    pub diff: Option<String>,
}

/// What the root step produced.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    /// Name of the root template.
    pub template: String,
    /// Names of all executed steps, in order.
    pub executed: Vec<String>,
    pub request: HttpRequest,
    pub response: HttpResponse,
    /// Output filter in effect, if any.
    pub filter: Option<FilterConfig>,
    /// The response body after filtering.
    pub body: Value,
    /// Exports announced for the root step.
    pub exports: Vec<(String, String)>,
    pub assertions: Vec<AssertionResult>,
    /// Changes against the `--diff` snapshot, when one was requested.
    pub diff: Option<Vec<Change>>,
}

impl ChainOutcome {
    /// True when no assertion failed and the snapshot diff (if any) is empty.
    pub fn succeeded(&self) -> bool {
        self.assertions.iter().all(|a| a.passed)
            && self.diff.as_ref().map_or(true, |changes| changes.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    DryRun,
    Live,
}

/// Root-only checks, parsed before anything runs.
struct RootChecks {
    assertions: Vec<Assertion>,
    exports: Vec<ExportSpec>,
    filter: Option<FilterConfig>,
    baseline: Option<SnapshotRecord>,
}

/// Runs templates and their dependencies.
pub struct ChainRunner<'a> {
    defaults: &'a Defaults,
    env: &'a dyn EnvProvider,
    templates: &'a dyn TemplateSource,
    executor: &'a dyn HttpExecutor,
    snapshots: &'a dyn SnapshotStore,
}

impl<'a> ChainRunner<'a> {
    pub fn new(
        defaults: &'a Defaults,
        env: &'a dyn EnvProvider,
        templates: &'a dyn TemplateSource,
        executor: &'a dyn HttpExecutor,
        snapshots: &'a dyn SnapshotStore,
    ) -> Self {
        Self {
            defaults,
            env,
            templates,
            executor,
            snapshots,
        }
    }

    /// Runs the template called `name` after its dependencies.
    ///
    /// Diagnostics (dependency status lines, exports, snapshot notices) are
    /// written to `diagnostics`.
    ///
    /// # Errors
    ///
    /// Resolution errors are returned before any request is sent. A failed
    /// request aborts the remaining steps.
    pub fn run(
        &self,
        name: &str,
        options: &RunOptions,
        diagnostics: &mut dyn Write,
    ) -> Result<ChainOutcome, ChainError> {
        let plan = resolve_plan(name, self.templates)?;
        self.execute(&plan, options, diagnostics)
    }

    /// Runs an ad-hoc template, e.g. one built from the command line.
    pub fn run_template(
        &self,
        template: Template,
        options: &RunOptions,
        diagnostics: &mut dyn Write,
    ) -> Result<ChainOutcome, ChainError> {
        let name = template.name.clone();
        let plan = resolve_plan_for(&name, template, self.templates)?;
        self.execute(&plan, options, diagnostics)
    }

    fn execute(
        &self,
        plan: &ExecutionPlan,
        options: &RunOptions,
        diagnostics: &mut dyn Write,
    ) -> Result<ChainOutcome, ChainError> {
        let root = plan.root();
        let checks = self.root_checks(root, options)?;
        self.prevalidate(plan, options)?;

        let mut table = VariableTable::from_cli(options.vars.iter().cloned());
        let dependency_timeout = ExecutionConfig::resolve(None, self.defaults).timeout_duration();
        let mut executed = Vec::new();

        for step in plan.dependencies() {
            let request = self.prepare(&step.template, &table, None, Mode::Live)?;
            let response = self.send(step, &request, dependency_timeout)?;
            executed.push(step.name.clone());
            writeln!(
                diagnostics,
                "[dep: {}] STATUS: {} ({}ms)",
                step.name,
                response.status_code,
                response.elapsed_ms()
            )?;
            self.merge_exports(step, &response, &mut table, diagnostics)?;
            self.auto_snapshot(&step.template, &response, diagnostics)?;
        }

        let root_timeout =
            ExecutionConfig::resolve(options.timeout, self.defaults).timeout_duration();
        let request = self.prepare(&root.template, &table, Some(options), Mode::Live)?;
        let response = self.send(root, &request, root_timeout)?;
        executed.push(root.name.clone());

        let mut exports = self.merge_exports(root, &response, &mut table, diagnostics)?;
        for spec in &checks.exports {
            match spec.extract(&response) {
                Some(value) => {
                    writeln!(diagnostics, "{}", export_line(&spec.name, &value))?;
                    exports.push((spec.name.clone(), value));
                }
                None => warn!("export '{}': no value at '{}'", spec.name, spec.path),
            }
        }

        self.auto_snapshot(&root.template, &response, diagnostics)?;
        if let Some(name) = &options.snapshot {
            let path = self
                .snapshots
                .save(name, &SnapshotRecord::from_response(&response))?;
            writeln!(diagnostics, "Snapshot saved: {}", path.display())?;
        }

        let body = match &checks.filter {
            Some(filter_config) => filter(&response.body, &filter_config.body_fields)
                .map_err(ChainError::path(&root.name))?,
            None => response.body.clone(),
        };
        let assertions = evaluate_all(&checks.assertions, &response);
        let diff = checks
            .baseline
            .as_ref()
            .map(|baseline| compare_response(baseline, &response));

        Ok(ChainOutcome {
            template: root.name.clone(),
            executed,
            request,
            response,
            filter: checks.filter,
            body,
            exports,
            assertions,
            diff,
        })
    }

    fn send(
        &self,
        step: &PlanStep,
        request: &HttpRequest,
        timeout: std::time::Duration,
    ) -> Result<HttpResponse, ChainError> {
        info!("{} {} ({})", request.method, request.url, step.name);
        self.executor
            .execute(request, timeout)
            .map_err(|source| ChainError::Request {
                template: step.name.clone(),
                source,
            })
    }

    /// Parses the root-only inputs and loads the diff baseline.
    fn root_checks(&self, root: &PlanStep, options: &RunOptions) -> Result<RootChecks, ChainError> {
        let assertions = options
            .assertions
            .iter()
            .map(|expr| Assertion::parse(expr))
            .collect::<Result<Vec<_>, _>>()?;
        let exports = options
            .exports
            .iter()
            .map(|spec| ExportSpec::parse_cli(spec))
            .collect::<Result<Vec<_>, _>>()?;

        let filter_config = match &options.filter {
            Some(fields) => Some(FilterConfig {
                status: true,
                headers: options.verbose,
                body_fields: fields.clone(),
            }),
            None => match (&root.template.filter, &self.defaults.filter) {
                (Some(overrides), base) => {
                    Some(overrides.apply(base.clone().unwrap_or_default()))
                }
                (None, base) => base.clone(),
            },
        };
        if let Some(filter_config) = &filter_config {
            for field in &filter_config.body_fields {
                if field != crate::path::project::PASSTHROUGH {
                    PathExpr::parse(field).map_err(ChainError::path(&root.name))?;
                }
            }
        }

        let baseline = options
            .diff
            .as_deref()
            .map(|name| self.snapshots.load(name))
            .transpose()?;

        Ok(RootChecks {
            assertions,
            exports,
            filter: filter_config,
            baseline,
        })
    }

    /// Prepares every step against a stand-in table without sending anything.
    fn prevalidate(&self, plan: &ExecutionPlan, options: &RunOptions) -> Result<(), ChainError> {
        let mut stand_in = VariableTable::from_cli(options.vars.iter().cloned());
        let root = plan.root();
        for step in plan.steps() {
            let overrides = std::ptr::eq(step, root).then_some(options);
            self.prepare(&step.template, &stand_in, overrides, Mode::DryRun)?;
            for (name, path) in &step.template.exports {
                PathExpr::parse(path).map_err(ChainError::path(&step.name))?;
                stand_in.merge_export(name.as_str(), STAND_IN_VALUE);
            }
        }
        debug!("pre-validated {} step(s)", plan.dependencies().len() + 1);
        Ok(())
    }

    /// Reads a step's template exports into the table and announces them.
    fn merge_exports(
        &self,
        step: &PlanStep,
        response: &HttpResponse,
        table: &mut VariableTable,
        diagnostics: &mut dyn Write,
    ) -> Result<Vec<(String, String)>, ChainError> {
        let mut merged = Vec::new();
        for (name, path) in &step.template.exports {
            let spec = ExportSpec::new(name.as_str(), path).map_err(ChainError::path(&step.name))?;
            let Some(value) = spec.extract(response) else {
                warn!("{}: export '{}' has no value at '{}'", step.name, name, path);
                continue;
            };
            if !table.merge_export(name.as_str(), value.as_str()) {
                debug!("{}: export '{}' shadowed by a -v variable", step.name, name);
            }
            writeln!(diagnostics, "{}", export_line(name, &value))?;
            merged.push((name.clone(), value));
        }
        Ok(merged)
    }

    fn auto_snapshot(
        &self,
        template: &Template,
        response: &HttpResponse,
        diagnostics: &mut dyn Write,
    ) -> Result<(), ChainError> {
        if let Some(name) = template.snapshot_name() {
            let path = self
                .snapshots
                .save(name, &SnapshotRecord::from_response(response))?;
            writeln!(diagnostics, "Snapshot saved: {}", path.display())?;
        }
        Ok(())
    }

    /// Builds the request for one step.
    ///
    /// Header precedence, lowest first: config defaults, template headers,
    /// auth (template auth, else the default auth), then `-H` overrides.
    fn prepare(
        &self,
        template: &Template,
        table: &VariableTable,
        overrides: Option<&RunOptions>,
        mode: Mode,
    ) -> Result<HttpRequest, ChainError> {
        let interpolator = Interpolator::new(table, self.env, &template.name);
        let resolve = |text: &str| interpolator.interpolate(&expand_env_refs(text, self.env));

        let url = self.resolve_url(template, table, &interpolator, mode)?;
        let mut request = HttpRequest::new(template.method, url);

        for (name, value) in self.defaults.headers.iter().chain(&template.headers) {
            request.set_header(name, resolve(value)?);
        }

        if let Some(auth) = template.auth.as_ref().or(self.defaults.auth.as_ref()) {
            let auth = auth.map_credentials(resolve)?;
            apply_authentication(&mut request, &auth);
        }

        if let Some(options) = overrides {
            for (name, value) in &options.headers {
                request.set_header(name, interpolator.interpolate(value)?);
            }
        }

        let form = overrides.map(|o| o.form.as_slice()).unwrap_or_default();
        if !form.is_empty() {
            if mode == Mode::DryRun {
                check_form_files(&template.name, form)?;
            }
            request.set_form(interpolate_form(form, &interpolator)?);
        } else if let Some((body, is_json)) =
            self.build_body(template, table, &interpolator, overrides)?
        {
            if is_json && request.content_type().is_none() {
                request.set_header("Content-Type", "application/json");
            }
            request.body = Some(body);
        }

        Ok(request)
    }

    /// Interpolates the URL and joins relative URLs to the base URL.
    fn resolve_url(
        &self,
        template: &Template,
        table: &VariableTable,
        interpolator: &Interpolator<'_>,
        mode: Mode,
    ) -> Result<String, ChainError> {
        let url = interpolator.interpolate(&template.url)?;
        if has_scheme(&url) {
            return Ok(url);
        }

        let base_url = template
            .base_url
            .as_deref()
            .or(self.defaults.base_url.as_deref());
        match base_url {
            Some(base_url) => {
                let base_url = interpolator.interpolate(&expand_env_refs(base_url, self.env))?;
                Ok(join_url(&base_url, &url))
            }
            // The stand-in for an export has no scheme; the real value may.
            None if mode == Mode::DryRun && starts_with_export(&template.url, table) => Ok(url),
            None => Err(ChainError::InvalidUrl {
                template: template.name.clone(),
                url,
                reason: "relative URL and no base_url configured".to_string(),
            }),
        }
    }

    /// Serializes the request body. Returns the text and whether it is JSON.
    ///
    /// Bound fields are first injected as `null` so that the placeholder
    /// scan skips the leaves they replace, then set to their values after
    /// interpolation so injected text is never scanned.
    fn build_body(
        &self,
        template: &Template,
        table: &VariableTable,
        interpolator: &Interpolator<'_>,
        overrides: Option<&RunOptions>,
    ) -> Result<Option<(String, bool)>, ChainError> {
        if let Some(raw) = overrides.and_then(|o| o.body.as_deref()) {
            let text = interpolator.interpolate(raw)?;
            let is_json = serde_json::from_str::<Value>(&text)
                .is_ok_and(|v| v.is_object() || v.is_array());
            return Ok(Some((text, is_json)));
        }

        let Some(body) = &template.body else {
            return Ok(None);
        };

        let mut bound = Vec::new();
        for field in &template.fields {
            let expr = PathExpr::parse(field.target()).map_err(ChainError::path(&template.name))?;
            if let Some(value) = table.get(&field.name) {
                bound.push((expr, value));
            }
        }

        let mut body = body.clone();
        for (expr, _) in &bound {
            inject(expr, &mut body, Value::Null).map_err(ChainError::path(&template.name))?;
        }
        let mut body = interpolator.interpolate_value(&body)?;
        for (expr, value) in bound {
            inject(&expr, &mut body, Value::String(value.to_string()))
                .map_err(ChainError::path(&template.name))?;
        }

        Ok(match body {
            Value::Null => None,
            Value::String(text) => Some((text, false)),
            structured => Some((structured.to_string(), true)),
        })
    }
}

/// True for URLs like `https://...`; `localhost:3000/x` has no scheme.
fn has_scheme(url: &str) -> bool {
    url.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Expands placeholders in form values and file paths.
fn interpolate_form(
    form: &[FormField],
    interpolator: &Interpolator<'_>,
) -> Result<Vec<FormField>, ChainError> {
    form.iter()
        .map(|field| -> Result<FormField, ChainError> {
            let value = match &field.value {
                FormValue::Text(text) => FormValue::Text(interpolator.interpolate(text)?),
                FormValue::File(path) => FormValue::File(PathBuf::from(
                    interpolator.interpolate(&path.to_string_lossy())?,
                )),
            };
            Ok(FormField {
                name: field.name.clone(),
                value,
            })
        })
        .collect()
}

/// Fails for a file part whose literal path does not name a file.
fn check_form_files(template: &str, form: &[FormField]) -> Result<(), ChainError> {
    for field in form {
        if let FormValue::File(path) = &field.value {
            if !path.to_string_lossy().contains("{{") && !path.is_file() {
                return Err(ChainError::FormFile {
                    template: template.to_string(),
                    path: path.clone(),
                });
            }
        }
    }
    Ok(())
}

/// True when `url` opens with a placeholder bound to an export.
fn starts_with_export(url: &str, table: &VariableTable) -> bool {
    url.trim_start()
        .strip_prefix("{{")
        .and_then(|rest| rest.split_once("}}"))
        .is_some_and(|(token, _)| {
            table.provenance(token.trim()) == Some(Provenance::DependencyExport)
        })
}

fn join_url(base_url: &str, path: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    if path.is_empty() {
        base_url.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base_url, path)
    } else {
        format!("{}/{}", base_url, path)
    }
}
