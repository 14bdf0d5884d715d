//! Chains sent over HTTP to a local mock server.

use mockito::Matcher;
use reqcap::chain::{ChainError, ChainRunner, RunOptions};
use reqcap::config::Defaults;
use reqcap::executor::{HttpExecutor, ReqwestExecutor};
use reqcap::formatter::format_outcome;
use reqcap::models::{FormField, HttpMethod, HttpRequest};
use reqcap::snapshot::FsSnapshotStore;
use reqcap::template::{Template, TemplateSource};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;

fn templates(entries: &[(&str, &str)]) -> HashMap<String, Template> {
    entries
        .iter()
        .map(|(name, yaml)| (name.to_string(), Template::from_yaml(yaml, name).unwrap()))
        .collect()
}

fn run(
    base_url: &str,
    source: &dyn TemplateSource,
    name: &str,
    options: &RunOptions,
) -> (Result<reqcap::chain::ChainOutcome, ChainError>, String) {
    let defaults = Defaults {
        base_url: Some(base_url.to_string()),
        ..Defaults::default()
    };
    let env: HashMap<String, String> = HashMap::new();
    let snapshots_dir = TempDir::new().unwrap();
    let snapshots = FsSnapshotStore::new(snapshots_dir.path());
    let executor = ReqwestExecutor::new().unwrap();

    let runner = ChainRunner::new(&defaults, &env, source, &executor, &snapshots);
    let mut diagnostics = Vec::new();
    let result = runner.run(name, options, &mut diagnostics);
    (result, String::from_utf8(diagnostics).unwrap())
}

#[test]
fn test_login_then_authorized_request() {
    let mut server = mockito::Server::new();
    let login = server
        .mock("POST", "/auth/login")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({"username": "ada"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "tok-1"}"#)
        .create();
    let profile = server
        .mock("GET", "/me")
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 7, "name": "Ada", "roles": ["admin"]}"#)
        .create();

    let source = templates(&[
        (
            "login",
            r#"
method: POST
url: /auth/login
body:
  username: ""
  password: secret
fields:
  - name: user
    path: username
exports:
  token: body.access_token
"#,
        ),
        (
            "me",
            "url: /me\ndepends: login\nauth:\n  type: bearer\n  token: \"{{token}}\"\n",
        ),
    ]);
    let options = RunOptions {
        vars: vec![("user".to_string(), "ada".to_string())],
        filter: Some(vec!["id".to_string(), "name".to_string()]),
        assertions: vec!["status=200".to_string(), "body.roles[0]=admin".to_string()],
        ..RunOptions::default()
    };

    let (result, diagnostics) = run(&server.url(), &source, "me", &options);
    let outcome = result.unwrap();

    login.assert();
    profile.assert();
    assert!(diagnostics.contains("[dep: login] STATUS: 200"));
    assert!(diagnostics.contains("export reqcap_token=tok-1"));
    assert_eq!(outcome.body, json!({"id": 7, "name": "Ada"}));
    assert!(outcome.succeeded());

    let text = format_outcome(&outcome, false);
    assert!(text.starts_with("STATUS: 200\nTIME: "));
    assert!(text.ends_with("BODY:\n{\n  \"id\": 7,\n  \"name\": \"Ada\"\n}"));
}

#[test]
fn test_text_and_empty_bodies() {
    let mut server = mockito::Server::new();
    let _text = server
        .mock("GET", "/health")
        .with_status(503)
        .with_body("down for maintenance")
        .create();
    let _empty = server.mock("DELETE", "/items/3").with_status(204).create();

    let source = templates(&[
        ("health", "url: /health\n"),
        ("remove", "method: DELETE\nurl: /items/{{id}}\n"),
    ]);

    let (result, _) = run(&server.url(), &source, "health", &RunOptions::default());
    let outcome = result.unwrap();
    assert_eq!(outcome.response.status_code, 503);
    assert_eq!(outcome.body, json!("down for maintenance"));

    let options = RunOptions {
        vars: vec![("id".to_string(), "3".to_string())],
        ..RunOptions::default()
    };
    let (result, _) = run(&server.url(), &source, "remove", &options);
    let outcome = result.unwrap();
    assert_eq!(outcome.response.status_code, 204);
    assert!(outcome.body.is_null());
    assert!(!format_outcome(&outcome, false).contains("BODY:"));
}

#[test]
fn test_cli_headers_override_template_headers() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/ping")
        .match_header("x-trace", "from-cli")
        .match_header("accept", "application/json")
        .with_status(200)
        .create();

    let source = templates(&[(
        "ping",
        "url: /ping\nheaders:\n  X-Trace: from-template\n  Accept: application/json\n",
    )]);
    let options = RunOptions {
        headers: vec![("X-Trace".to_string(), "from-cli".to_string())],
        ..RunOptions::default()
    };

    let (result, _) = run(&server.url(), &source, "ping", &options);
    result.unwrap();
    mock.assert();
}

#[test]
fn test_form_upload_after_login() {
    let upload_dir = TempDir::new().unwrap();
    let report = upload_dir.path().join("report.csv");
    std::fs::write(&report, "id,total\n1,42\n").unwrap();

    let mut server = mockito::Server::new();
    let _login = server
        .mock("POST", "/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token": "tok-9"}"#)
        .create();
    let upload = server
        .mock("POST", "/reports")
        .match_header("authorization", "Bearer tok-9")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="title"\r\n\r\nQ3 tok-9"#.to_string()),
            Matcher::Regex(r#"name="file"; filename="report.csv""#.to_string()),
            Matcher::Regex("id,total".to_string()),
        ]))
        .with_status(201)
        .with_body(r#"{"stored": true}"#)
        .create();

    let source = templates(&[
        (
            "login",
            "method: POST\nurl: /login\nbody:\n  user: ada\nexports:\n  token: body.token\n",
        ),
        (
            "upload",
            r#"
method: POST
url: /reports
depends: login
headers:
  Authorization: "Bearer {{token}}"
  Content-Type: application/json
body:
  replaced: true
"#,
        ),
    ]);
    let options = RunOptions {
        form: vec![
            FormField::parse("title=Q3 {{token}}").unwrap(),
            FormField::parse(&format!("file=@{}", report.display())).unwrap(),
        ],
        ..RunOptions::default()
    };

    let (result, _) = run(&server.url(), &source, "upload", &options);
    let outcome = result.unwrap();

    upload.assert();
    assert_eq!(outcome.response.status_code, 201);
    assert!(outcome.request.is_multipart());
}

#[test]
fn test_connection_refused_is_request_error() {
    let source = templates(&[("down", "url: /down\n")]);

    let (result, _) = run("http://127.0.0.1:1", &source, "down", &RunOptions::default());

    assert!(matches!(result, Err(ChainError::Request { ref template, .. }) if template == "down"));
}

#[test]
fn test_executor_rejects_unsupported_scheme() {
    let executor = ReqwestExecutor::new().unwrap();
    let request = HttpRequest::new(HttpMethod::GET, "ftp://files.example.com/a");

    assert!(executor.execute(&request, Duration::from_secs(1)).is_err());
}
