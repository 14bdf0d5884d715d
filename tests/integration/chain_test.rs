//! Chains loaded from template files on disk.

use super::{write_template, RecordingExecutor};
use reqcap::chain::{ChainError, ChainRunner, RunOptions};
use reqcap::config::Defaults;
use reqcap::executor::RequestError;
use reqcap::snapshot::{FsSnapshotStore, SnapshotStore};
use reqcap::template::FsTemplateLoader;
use serde_json::json;
use std::collections::HashMap;
use tempfile::TempDir;

struct Project {
    dir: TempDir,
    defaults: Defaults,
    env: HashMap<String, String>,
}

impl Project {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            defaults: Defaults {
                base_url: Some("https://api.example.com".to_string()),
                ..Defaults::default()
            },
            env: HashMap::new(),
        }
    }

    fn template(&self, name: &str, yaml: &str) -> &Self {
        write_template(self.dir.path(), name, yaml);
        self
    }

    fn loader(&self) -> FsTemplateLoader {
        FsTemplateLoader::new(self.dir.path(), Some(self.dir.path().join("templates")))
    }

    fn snapshots(&self) -> FsSnapshotStore {
        FsSnapshotStore::new(self.dir.path().join("snapshots"))
    }

    fn run(
        &self,
        executor: &RecordingExecutor,
        name: &str,
        options: &RunOptions,
    ) -> (Result<reqcap::chain::ChainOutcome, ChainError>, String) {
        let loader = self.loader();
        let snapshots = self.snapshots();
        let runner = ChainRunner::new(&self.defaults, &self.env, &loader, executor, &snapshots);
        let mut diagnostics = Vec::new();
        let result = runner.run(name, options, &mut diagnostics);
        (result, String::from_utf8(diagnostics).unwrap())
    }
}

fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_diamond_runs_shared_dependency_once() {
    let project = Project::new();
    project
        .template("a", "url: /a\ndepends: [b, c]\n")
        .template("b", "url: /b\ndepends: d\n")
        .template("c", "url: /c\ndepends: d\n")
        .template("d", "url: /d\n");
    let executor = RecordingExecutor::default();

    let (result, diagnostics) = project.run(&executor, "a", &RunOptions::default());
    let outcome = result.unwrap();

    assert_eq!(outcome.executed, vec!["d", "b", "c", "a"]);
    assert_eq!(
        executor.urls(),
        vec![
            "https://api.example.com/d",
            "https://api.example.com/b",
            "https://api.example.com/c",
            "https://api.example.com/a",
        ]
    );
    assert_eq!(diagnostics.matches("[dep: d]").count(), 1);
    assert!(!diagnostics.contains("[dep: a]"));
}

#[test]
fn test_cycle_sends_nothing() {
    let project = Project::new();
    project
        .template("a", "url: /a\ndepends: b\n")
        .template("b", "url: /b\ndepends: a\n");
    let executor = RecordingExecutor::default();

    let (result, _) = project.run(&executor, "a", &RunOptions::default());
    let err = result.unwrap_err();

    assert!(matches!(err, ChainError::CircularDependency { .. }));
    assert_eq!(err.to_string(), "Circular dependency detected: a → b → a");
    assert_eq!(executor.calls(), 0);
}

#[test]
fn test_missing_dependency_sends_nothing() {
    let project = Project::new();
    project.template("a", "url: /a\ndepends: ghost\n");
    let executor = RecordingExecutor::default();

    let (result, _) = project.run(&executor, "a", &RunOptions::default());
    let err = result.unwrap_err();

    assert!(err.to_string().contains("not found"));
    assert!(err.to_string().contains("ghost"));
    assert_eq!(executor.calls(), 0);
}

#[test]
fn test_exports_flow_into_later_steps() {
    let project = Project::new();
    project
        .template(
            "login",
            "method: POST\nurl: /login\nbody:\n  user: admin\nexports:\n  token: body.token\n",
        )
        .template(
            "create-item",
            r#"
method: POST
url: /items
depends: login
headers:
  Authorization: "Bearer {{token}}"
body:
  item:
    name: placeholder
fields:
  - name: item_name
    path: item.name
exports:
  item_id: body.id
"#,
        );
    let executor = RecordingExecutor::default()
        .respond(200, json!({"token": "abc123"}))
        .respond(201, json!({"id": 99, "name": "widget"}));
    let options = RunOptions {
        vars: vars(&[("item_name", "widget")]),
        ..RunOptions::default()
    };

    let (result, diagnostics) = project.run(&executor, "create-item", &options);
    let outcome = result.unwrap();

    let requests = executor.requests.borrow();
    assert_eq!(requests[1].header("authorization"), Some("Bearer abc123"));
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(requests[1].body.as_deref().unwrap()).unwrap(),
        json!({"item": {"name": "widget"}})
    );
    assert_eq!(requests[1].content_type(), Some("application/json"));
    assert!(diagnostics.contains("[dep: login] STATUS: 200 (0ms)"));
    assert!(diagnostics.contains("export reqcap_token=abc123"));
    assert!(diagnostics.contains("export reqcap_item_id=99"));
    assert_eq!(outcome.exports, vec![("item_id".to_string(), "99".to_string())]);
}

#[test]
fn test_cli_variable_beats_export() {
    let project = Project::new();
    project
        .template("dep", "url: /dep\nexports:\n  x: body.x\n")
        .template("root", "url: /items/{{x}}\ndepends: dep\n");
    let executor = RecordingExecutor::default().respond(200, json!({"x": "2"}));
    let options = RunOptions {
        vars: vars(&[("x", "1")]),
        ..RunOptions::default()
    };

    let (result, _) = project.run(&executor, "root", &options);
    result.unwrap();

    assert_eq!(executor.urls()[1], "https://api.example.com/items/1");
}

#[test]
fn test_network_error_stops_remaining_steps() {
    let project = Project::new();
    project
        .template("first", "url: /first\n")
        .template("second", "url: /second\ndepends: first\n")
        .template("third", "url: /third\ndepends: second\n");
    let executor = RecordingExecutor::default()
        .respond(200, json!({}))
        .fail(RequestError::NetworkError("connection refused".to_string()));

    let (result, diagnostics) = project.run(&executor, "third", &RunOptions::default());
    let err = result.unwrap_err();

    assert!(matches!(err, ChainError::Request { ref template, .. } if template == "second"));
    assert_eq!(executor.calls(), 2);
    assert!(diagnostics.contains("[dep: first]"));
    assert!(!diagnostics.contains("[dep: second]"));
}

#[test]
fn test_non_success_status_does_not_abort() {
    let project = Project::new();
    project
        .template("dep", "url: /dep\n")
        .template("root", "url: /root\ndepends: dep\n");
    let executor = RecordingExecutor::default().respond(500, json!("Internal Server Error"));

    let (result, diagnostics) = project.run(&executor, "root", &RunOptions::default());

    assert!(result.is_ok());
    assert_eq!(executor.calls(), 2);
    assert!(diagnostics.contains("[dep: dep] STATUS: 500"));
}

#[test]
fn test_snapshot_then_diff_round_trip() {
    let project = Project::new();
    project.template("get-user", "url: /users/1\n");

    let first = RecordingExecutor::default().respond(200, json!({"id": 1, "name": "Ada"}));
    let options = RunOptions {
        snapshot: Some("user".to_string()),
        ..RunOptions::default()
    };
    let (result, diagnostics) = project.run(&first, "get-user", &options);
    result.unwrap();
    assert!(diagnostics.contains("Snapshot saved:"));
    assert!(project.dir.path().join("snapshots/user.json").is_file());

    let same = RecordingExecutor::default().respond(200, json!({"id": 1, "name": "Ada"}));
    let options = RunOptions {
        diff: Some("user".to_string()),
        ..RunOptions::default()
    };
    let (result, _) = project.run(&same, "get-user", &options);
    let outcome = result.unwrap();
    assert_eq!(outcome.diff, Some(vec![]));
    assert!(outcome.succeeded());

    let changed = RecordingExecutor::default().respond(200, json!({"id": 1, "name": "Grace"}));
    let (result, _) = project.run(&changed, "get-user", &options);
    let outcome = result.unwrap();
    let changes = outcome.diff.clone().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].path, "body.name");
    assert!(!outcome.succeeded());
}

#[test]
fn test_missing_diff_baseline_sends_nothing() {
    let project = Project::new();
    project.template("get-user", "url: /users/1\n");
    let executor = RecordingExecutor::default();
    let options = RunOptions {
        diff: Some("never-saved".to_string()),
        ..RunOptions::default()
    };

    let (result, _) = project.run(&executor, "get-user", &options);

    assert!(result.is_err());
    assert_eq!(executor.calls(), 0);
    assert!(project.snapshots().list().unwrap().is_empty());
}

#[test]
fn test_template_snapshot_config_saves_dependency_response() {
    let project = Project::new();
    project
        .template("seed", "url: /seed\nsnapshot:\n  enabled: true\n")
        .template("root", "url: /root\ndepends: seed\n");
    let executor = RecordingExecutor::default().respond(200, json!({"seeded": true}));

    let (result, _) = project.run(&executor, "root", &RunOptions::default());
    result.unwrap();

    let saved = project.snapshots().load("seed").unwrap();
    assert_eq!(saved.body, json!({"seeded": true}));
}

#[test]
fn test_filter_and_assertions_apply_to_root() {
    let project = Project::new();
    project.template("list", "url: /users\nfilter:\n  body_fields: [\"data[].id\"]\n");
    let executor = RecordingExecutor::default().respond(
        200,
        json!({"data": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}], "total": 2}),
    );
    let options = RunOptions {
        assertions: vec!["status=200".to_string(), "body.total=3".to_string()],
        ..RunOptions::default()
    };

    let (result, _) = project.run(&executor, "list", &options);
    let outcome = result.unwrap();

    assert_eq!(outcome.body, json!({"data": [{"id": 1}, {"id": 2}]}));
    assert!(outcome.assertions[0].passed);
    assert!(!outcome.assertions[1].passed);
    assert!(!outcome.succeeded());
}
