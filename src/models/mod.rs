//! Data models for HTTP requests and responses.
//!
//! These are the values exchanged with an executor: the resolved request
//! going out and the response envelope coming back.

pub mod request;
pub mod response;

pub use request::{FormField, FormValue, HttpMethod, HttpRequest};
pub use response::{value_to_text, HttpResponse};
