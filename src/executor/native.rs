//! Native HTTP executor using reqwest.
//!
//! The async client runs on a current-thread tokio runtime owned by the
//! executor, so callers stay synchronous and one request is in flight at a
//! time.

use super::error::RequestError;
use super::HttpExecutor;
use crate::models::request::{FormField, FormValue, HttpMethod, HttpRequest};
use crate::models::response::HttpResponse;
use indexmap::IndexMap;
use log::debug;
use reqwest::multipart::{Form, Part};
use std::fs;
use std::time::{Duration, Instant};
use tokio::runtime::{Builder, Runtime};
use url::Url;

const USER_AGENT: &str = concat!("reqcap/", env!("CARGO_PKG_VERSION"));

/// Executes requests with reqwest.
pub struct ReqwestExecutor {
    client: reqwest::Client,
    runtime: Runtime,
}

impl ReqwestExecutor {
    /// Builds the client and its runtime.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::BuildError` if either cannot be created.
    pub fn new() -> Result<Self, RequestError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RequestError::BuildError(e.to_string()))?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RequestError::BuildError(e.to_string()))?;
        Ok(Self { client, runtime })
    }

    async fn send(
        &self,
        request: &HttpRequest,
        timeout: Duration,
    ) -> Result<HttpResponse, RequestError> {
        let start_time = Instant::now();
        let to_error = |e: reqwest::Error| RequestError::from_reqwest(e, timeout);

        let mut req_builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url)
            .timeout(timeout);

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }

        if request.is_multipart() {
            req_builder = req_builder.multipart(build_form(&request.form)?);
        } else if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }

        let response = req_builder.send().await.map_err(to_error)?;
        let status_code = response.status().as_u16();

        let mut headers: IndexMap<String, String> = IndexMap::new();
        for (name, value) in response.headers() {
            let Ok(value) = value.to_str() else {
                continue;
            };
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let body = response.bytes().await.map_err(to_error)?;
        let elapsed = start_time.elapsed();
        debug!(
            "{} {} -> {} in {}ms",
            request.method,
            request.url,
            status_code,
            elapsed.as_millis()
        );

        Ok(HttpResponse::from_raw(status_code, headers, &body, elapsed))
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn execute(
        &self,
        request: &HttpRequest,
        timeout: Duration,
    ) -> Result<HttpResponse, RequestError> {
        validate_url(&request.url)?;
        self.runtime.block_on(self.send(request, timeout))
    }
}

/// Checks that a URL is absolute and uses http or https.
pub fn validate_url(raw: &str) -> Result<Url, RequestError> {
    let url = Url::parse(raw).map_err(|e| RequestError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RequestError::UnsupportedProtocol(other.to_string())),
    }
}

/// Builds the multipart body, reading file parts from disk.
fn build_form(fields: &[FormField]) -> Result<Form, RequestError> {
    let mut form = Form::new();
    for field in fields {
        form = match &field.value {
            FormValue::Text(text) => form.text(field.name.clone(), text.clone()),
            FormValue::File(path) => {
                let data = fs::read(path).map_err(|e| {
                    RequestError::BuildError(format!("cannot read {}: {}", path.display(), e))
                })?;
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let mime = mime_guess::from_path(path).first_or_octet_stream();
                let part = Part::bytes(data)
                    .file_name(file_name)
                    .mime_str(mime.essence_str())
                    .map_err(|e| RequestError::BuildError(e.to_string()))?;
                form.part(field.name.clone(), part)
            }
        };
    }
    Ok(form)
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::GET => reqwest::Method::GET,
        HttpMethod::POST => reqwest::Method::POST,
        HttpMethod::PUT => reqwest::Method::PUT,
        HttpMethod::DELETE => reqwest::Method::DELETE,
        HttpMethod::PATCH => reqwest::Method::PATCH,
        HttpMethod::HEAD => reqwest::Method::HEAD,
        HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
        HttpMethod::TRACE => reqwest::Method::TRACE,
        HttpMethod::CONNECT => reqwest::Method::CONNECT,
    }
}
