//! Cluster handles.
//!
//! A [`Cluster`] wraps the record read when the handle was made. Snapshot
//! accessors return that record's values; [`Cluster::state`] and the
//! introspection calls always read the platform again. Lifecycle calls check
//! the transition table against a fresh read before anything is sent.

mod builder;
pub mod lifecycle;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sparkdeck_api::types::{ClusterInfo, ClusterState, ResizeClusterRequest, SparkNode};
use sparkdeck_api::{ClustersApi, LibrariesApi};
use sparkdeck_core::ClusterId;

pub use builder::{ClusterBuilder, ClusterSize};
pub use lifecycle::ClusterOperation;

use crate::error::{Family, Result};
use crate::library::LibraryStatus;

/// A live handle on a remote cluster.
#[derive(Clone)]
pub struct Cluster {
    info: ClusterInfo,
    clusters: Arc<dyn ClustersApi>,
    libraries: Arc<dyn LibrariesApi>,
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("cluster_id", &self.info.cluster_id)
            .field("cluster_name", &self.info.cluster_name)
            .field("state", &self.info.state)
            .finish_non_exhaustive()
    }
}

impl Cluster {
    pub(crate) fn new(
        info: ClusterInfo,
        clusters: Arc<dyn ClustersApi>,
        libraries: Arc<dyn LibrariesApi>,
    ) -> Self {
        Self {
            info,
            clusters,
            libraries,
        }
    }

    pub(crate) fn libraries_api(&self) -> &dyn LibrariesApi {
        self.libraries.as_ref()
    }

    // ===== Snapshot =====

    /// The cluster id.
    #[must_use]
    pub fn id(&self) -> &ClusterId {
        &self.info.cluster_id
    }

    /// The cluster name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.info.cluster_name.as_deref()
    }

    /// The record this handle was made from.
    #[must_use]
    pub fn info(&self) -> &ClusterInfo {
        &self.info
    }

    /// The state recorded in the snapshot. Use [`state`](Self::state) for
    /// the current one.
    #[must_use]
    pub fn snapshot_state(&self) -> ClusterState {
        self.info.state
    }

    /// Runtime version key.
    #[must_use]
    pub fn spark_version(&self) -> Option<&str> {
        self.info.spark_version.as_deref()
    }

    /// Worker node type.
    #[must_use]
    pub fn node_type_id(&self) -> Option<&str> {
        self.info.node_type_id.as_deref()
    }

    /// Driver node type.
    #[must_use]
    pub fn driver_node_type_id(&self) -> Option<&str> {
        self.info.driver_node_type_id.as_deref()
    }

    /// Idle minutes before automatic termination.
    #[must_use]
    pub fn autotermination_minutes(&self) -> Option<u32> {
        self.info.autotermination_minutes
    }

    /// Target sizing, or `None` if the record carries neither or both modes.
    #[must_use]
    pub fn sizing(&self) -> Option<ClusterSize> {
        ClusterSize::from_info(&self.info).ok()
    }

    /// When the cluster was started.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.info.start_time.and_then(DateTime::from_timestamp_millis)
    }

    /// When the cluster was terminated.
    #[must_use]
    pub fn terminated_at(&self) -> Option<DateTime<Utc>> {
        self.info
            .terminated_time
            .and_then(DateTime::from_timestamp_millis)
    }

    // ===== Live reads =====

    /// Read the current state from the platform. Never cached.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error wrapping the transport failure.
    pub async fn state(&self) -> Result<ClusterState> {
        Ok(self.read().await?.state)
    }

    /// A new handle built from a fresh read.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error wrapping the transport failure.
    pub async fn refresh(&self) -> Result<Self> {
        let info = self.read().await?;
        Ok(Self::new(info, self.clusters.clone(), self.libraries.clone()))
    }

    /// Executor nodes. Empty unless the cluster is currently `RUNNING`.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error wrapping the transport failure.
    pub async fn executors(&self) -> Result<Vec<SparkNode>> {
        let info = self.read().await?;
        if info.state == ClusterState::Running {
            Ok(info.executors)
        } else {
            Ok(Vec::new())
        }
    }

    /// Driver node. `None` unless the cluster is currently `RUNNING`.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error wrapping the transport failure.
    pub async fn driver(&self) -> Result<Option<SparkNode>> {
        let info = self.read().await?;
        Ok(info.driver.filter(|_| info.state == ClusterState::Running))
    }

    /// Status of every library associated with the cluster.
    ///
    /// Entries of a library kind this crate does not model are skipped.
    ///
    /// # Errors
    ///
    /// Returns a library configuration error wrapping the transport failure.
    pub async fn library_statuses(&self) -> Result<Vec<LibraryStatus>> {
        let result: Result<Vec<LibraryStatus>> = async {
            let statuses = self.libraries.cluster_status(self.id()).await?;
            let known = statuses
                .library_statuses
                .into_iter()
                .filter_map(|entry| match LibraryStatus::try_from(entry) {
                    Ok(status) => Some(status),
                    Err(e) => {
                        tracing::debug!(
                            cluster_id = %self.id(),
                            error = %e,
                            "Skipping library status"
                        );
                        None
                    }
                })
                .collect();
            Ok(known)
        }
        .await;
        result.map_err(|e| e.within(Family::Library))
    }

    // ===== Lifecycle =====

    /// Change the cluster's sizing and return a handle reflecting it.
    ///
    /// The returned handle is read right after the call, so it normally
    /// reports `RESIZING`.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error if the sizing is invalid, if the
    /// cluster is not `RUNNING`, or wrapping a transport failure.
    pub async fn resize(&self, size: ClusterSize) -> Result<Self> {
        let result: Result<Self> = async {
            size.validate()?;
            self.check(ClusterOperation::Resize).await?;

            let (num_workers, autoscale) = size.to_parts();
            self.clusters
                .resize(&ResizeClusterRequest {
                    cluster_id: self.id().clone(),
                    num_workers,
                    autoscale,
                })
                .await?;

            tracing::info!(cluster_id = %self.id(), size = ?size, "Resizing cluster");
            self.refresh().await
        }
        .await;
        result.map_err(|e| e.within(Family::Cluster))
    }

    /// Restart a running cluster.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error if the cluster is not `RUNNING`
    /// or wrapping a transport failure.
    pub async fn restart(&self) -> Result<()> {
        let result: Result<()> = async {
            self.check(ClusterOperation::Restart).await?;
            self.clusters.restart(self.id()).await?;
            tracing::info!(cluster_id = %self.id(), "Restarting cluster");
            Ok(())
        }
        .await;
        result.map_err(|e| e.within(Family::Cluster))
    }

    /// Terminate the cluster. Its configuration is kept.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error if the cluster is already
    /// terminating or terminal, or wrapping a transport failure.
    pub async fn terminate(&self) -> Result<()> {
        let result: Result<()> = async {
            self.check(ClusterOperation::Terminate).await?;
            self.clusters.terminate(self.id()).await?;
            tracing::info!(cluster_id = %self.id(), "Terminating cluster");
            Ok(())
        }
        .await;
        result.map_err(|e| e.within(Family::Cluster))
    }

    /// Remove a terminated cluster for good.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error if the cluster is not in a
    /// terminal state or wrapping a transport failure.
    pub async fn permanent_delete(self) -> Result<()> {
        let result: Result<()> = async {
            self.check(ClusterOperation::PermanentDelete).await?;
            self.clusters.permanent_delete(self.id()).await?;
            tracing::info!(cluster_id = %self.id(), "Permanently deleted cluster");
            Ok(())
        }
        .await;
        result.map_err(|e| e.within(Family::Cluster))
    }

    async fn read(&self) -> Result<ClusterInfo> {
        self.clusters
            .get(self.id())
            .await
            .map_err(|e| crate::Error::from(e).within(Family::Cluster))
    }

    async fn check(&self, operation: ClusterOperation) -> Result<()> {
        let state = self.state().await?;
        lifecycle::validate_operation(self.id(), state, operation).inspect_err(|_| {
            tracing::warn!(
                cluster_id = %self.id(),
                state = %state,
                operation = operation.as_str(),
                "Rejected cluster operation"
            );
        })
    }
}
