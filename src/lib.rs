//! reqcap: templated HTTP requests with filtered output.
//!
//! Requests are described by YAML templates, chained through `depends`,
//! and their responses are filtered, asserted on, exported to the shell
//! and compared against saved snapshots.
//!
//! # Architecture
//!
//! - **models**: requests and the response envelope
//! - **path**: path expressions (`data[].id`, `items[0:2]`) used by filters,
//!   exports, assertions and field injection
//! - **variables**: the variable table, `{{placeholder}}` interpolation and
//!   built-in values
//! - **environment**: process environment with a `.env` overlay
//! - **template**: the template document and its loaders
//! - **auth**: bearer, API key and basic authentication headers
//! - **config**: `.reqcap.yaml` discovery and resource directories
//! - **executor**: sending requests with reqwest
//! - **chain**: dependency resolution and chain execution
//! - **assertions**, **snapshot**: response checks
//! - **formatter**, **history**, **curl**, **commands**, **cli**: the
//!   command-line tool
//!
//! # Template
//!
//! ```yaml
//! method: POST
//! url: /users
//! depends: login
//! headers:
//!   Authorization: Bearer {{token}}
//! body:
//!   name: ""
//!   id: "{{uuid}}"
//! fields:
//!   - name: username
//!     path: name
//! exports:
//!   user_id: body.id
//! ```
//!
//! `reqcap -t create-user -v username=alice` first runs `login`, makes its
//! exports available as variables, then sends the request with `alice`
//! injected at `name`.

pub mod assertions;
pub mod auth;
pub mod chain;
pub mod cli;
pub mod commands;
pub mod config;
pub mod curl;
pub mod environment;
pub mod executor;
pub mod formatter;
pub mod history;
pub mod models;
pub mod path;
pub mod snapshot;
pub mod template;
pub mod variables;
