//! Core types for sparkdeck.
//!
//! This crate provides the foundational types shared by the sparkdeck crates:
//!
//! - **Identifiers**: Strongly-typed IDs for clusters, jobs, and runs
//!
//! # Example
//!
//! ```
//! use sparkdeck_core::{ClusterId, JobId, RunId};
//!
//! let cluster_id: ClusterId = "0923-164208-meows279".parse().unwrap();
//! let job_id = JobId::new(42);
//! let run_id: RunId = "7".parse().unwrap();
//!
//! assert_eq!(cluster_id.as_str(), "0923-164208-meows279");
//! assert_eq!(job_id.get(), 42);
//! assert_eq!(run_id.get(), 7);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;

pub use ids::{ClusterId, IdError, JobId, RunId};
