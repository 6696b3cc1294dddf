//! Typed jobs, clusters and libraries for sparkdeck.
//!
//! This crate turns the loose records of the REST API into typed objects:
//!
//! - A [`Session`] is the single entry point. It builds one client per
//!   resource family on first use and caches the platform catalog.
//! - Jobs and runs resolve into one of seven variants ([`Job`], [`Run`]),
//!   with their cluster, notebook or script resolved eagerly.
//! - A [`Cluster`] handle reads its state fresh for every decision and guards
//!   its lifecycle operations with a transition table ([`cluster::lifecycle`]).
//! - A [`Library`] pairs with a cluster to install, uninstall and report
//!   status.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Session                            │
//! │  ┌──────────────┐ ┌──────────────┐ ┌─────────────────────┐  │
//! │  │  Builders    │ │  Resolver    │ │  Catalog cache      │  │
//! │  │  (cluster,   │ │  (7 job/run  │ │  (versions, node    │  │
//! │  │   job)       │ │   variants)  │ │   types, zones)     │  │
//! │  └──────────────┘ └──────────────┘ └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!           ┌──────────────────┼──────────────────┐
//!           ▼                  ▼                  ▼
//!    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!    │  Cluster    │    │  Library    │    │  Dbfs /     │
//!    │  lifecycle  │    │  status     │    │  Workspace  │
//!    └─────────────┘    └─────────────┘    └─────────────┘
//!                              │
//!                              ▼
//!                   sparkdeck-api (REST 2.0)
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use sparkdeck_control::{ClusterSize, Session, SessionConfig, WaitOptions};
//! use sparkdeck_control::wait::wait_for_cluster_state;
//! use sparkdeck_api::types::ClusterState;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new(&SessionConfig::from_env())?;
//!
//! let cluster = session
//!     .create_interactive_cluster("etl", ClusterSize::fixed(2))
//!     .autotermination_minutes(30)
//!     .create()
//!     .await?;
//! let cluster =
//!     wait_for_cluster_state(&cluster, ClusterState::Running, &WaitOptions::default()).await?;
//!
//! let notebook = session.get_notebook("/Users/me/etl").await?;
//! let job = session
//!     .create_interactive_notebook_job(&cluster, &notebook)
//!     .name("nightly etl")
//!     .create()
//!     .await?;
//! let run = job.run().await?;
//! println!("Started run {}", run.id());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod cluster;
pub mod config;
pub mod dbfs;
pub mod error;
pub mod job;
pub mod library;
pub mod session;
pub mod wait;
pub mod workspace;

pub use cluster::{Cluster, ClusterBuilder, ClusterOperation, ClusterSize};
pub use config::{SessionConfig, WaitOptions};
pub use dbfs::Dbfs;
pub use error::{Error, Family, Result};
pub use job::{ExecutionMode, Job, JobBuilder, JobVariant, Run, TaskKind, TypedJob, TypedRun};
pub use library::{ClusterLibrary, Library, LibraryKind, LibraryStatus};
pub use session::Session;
pub use workspace::{Notebook, PythonScript};

// Re-export identifiers so callers need not depend on the core crate
pub use sparkdeck_core::{ClusterId, JobId, RunId};
