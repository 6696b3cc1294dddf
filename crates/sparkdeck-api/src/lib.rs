//! REST API 2.0 client for sparkdeck.
//!
//! This crate is the transport layer underneath the domain crate. It provides:
//!
//! - Wire records for clusters, jobs, runs, libraries, workspace objects and
//!   file-store entries ([`types`])
//! - One async trait per resource family plus the [`Backend`] that hands them out
//! - [`HttpBackend`], which talks to `{host}/api/2.0/...` over `reqwest`
//! - [`ApiError`], classifying failures into unauthenticated, unauthorized and
//!   other non-success statuses
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Session        │────▶│   Backend        │
//! │   (domain)       │     │   (trait)        │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │ one client per family
//!                          ┌────────▼─────────┐
//!                          │  Http*Client     │
//!                          │  (impl)          │
//!                          └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │  HttpTransport   │
//!                          │  (auth, errors)  │
//!                          └────────┬─────────┘
//!                                   │ HTTPS
//!                          ┌────────▼─────────┐
//!                          │   Platform       │
//!                          │   REST API 2.0   │
//!                          └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sparkdeck_api::{Backend, Credentials, HttpBackend, HttpConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::from_parts(Some("dapi0123"), None, None)?;
//! let backend = HttpBackend::new(HttpConfig::new("example.cloud.databricks.com", credentials));
//!
//! for cluster in backend.clusters().list().await? {
//!     println!("{} is {}", cluster.cluster_id, cluster.state);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod api;
pub mod auth;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod types;

pub use api::{Backend, ClustersApi, DbfsApi, JobsApi, LibrariesApi, WorkspaceApi};
pub use auth::{Credentials, CredentialsError};
pub use error::{ApiError, Result, RESOURCE_DOES_NOT_EXIST};
pub use http::{HttpBackend, HttpConfig, HttpTransport};

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockBackend;
