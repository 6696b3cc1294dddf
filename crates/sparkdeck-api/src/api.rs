//! Per-family client traits.
//!
//! Each resource family of the REST API gets its own trait so the domain
//! layer can hold exactly the clients it needs and tests can swap in the
//! in-memory backend.

use std::sync::Arc;

use async_trait::async_trait;
use sparkdeck_core::{ClusterId, JobId, RunId};

use crate::error::Result;
use crate::types::{
    ClusterInfo, ClusterLibraryStatuses, ExportFormat, FileInfo, JobInfo, JobSettings,
    LibrarySpec, NewCluster, NodeTypesResponse, NotebookImport, ObjectInfo,
    ResizeClusterRequest, RunInfo, RunNowRequest, RunNowResponse, RunOutput,
    SparkVersionsResponse, ZonesResponse,
};

/// Operations on clusters.
#[async_trait]
pub trait ClustersApi: Send + Sync {
    /// Create a cluster and return its id. The cluster starts in `PENDING`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the platform rejects the spec.
    async fn create(&self, spec: &NewCluster) -> Result<ClusterId>;

    /// Fetch the current description of a cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the cluster does not exist.
    async fn get(&self, cluster_id: &ClusterId) -> Result<ClusterInfo>;

    /// List all clusters visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn list(&self) -> Result<Vec<ClusterInfo>>;

    /// Change a running cluster's worker count or autoscale bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the cluster cannot be resized.
    async fn resize(&self, request: &ResizeClusterRequest) -> Result<()>;

    /// Restart a running cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn restart(&self, cluster_id: &ClusterId) -> Result<()>;

    /// Terminate a cluster. Its configuration is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn terminate(&self, cluster_id: &ClusterId) -> Result<()>;

    /// Remove a terminated cluster for good.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn permanent_delete(&self, cluster_id: &ClusterId) -> Result<()>;

    /// Runtime versions offered by the platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn spark_versions(&self) -> Result<SparkVersionsResponse>;

    /// Node types offered by the platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn node_types(&self) -> Result<NodeTypesResponse>;

    /// Availability zones offered by the platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn zones(&self) -> Result<ZonesResponse>;
}

/// Operations on jobs and their runs.
#[async_trait]
pub trait JobsApi: Send + Sync {
    /// Create a job and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the settings are rejected.
    async fn create(&self, settings: &JobSettings) -> Result<JobId>;

    /// Fetch a job.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the job does not exist.
    async fn get(&self, job_id: JobId) -> Result<JobInfo>;

    /// Trigger a run of a job.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn run_now(&self, request: &RunNowRequest) -> Result<RunNowResponse>;

    /// Fetch a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the run does not exist.
    async fn get_run(&self, run_id: RunId) -> Result<RunInfo>;

    /// Fetch the output of a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn get_run_output(&self, run_id: RunId) -> Result<RunOutput>;

    /// Delete a job.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn delete(&self, job_id: JobId) -> Result<()>;
}

/// Operations on cluster libraries.
#[async_trait]
pub trait LibrariesApi: Send + Sync {
    /// Request installation of libraries on a cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn install(&self, cluster_id: &ClusterId, libraries: &[LibrarySpec]) -> Result<()>;

    /// Mark libraries for removal from a cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn uninstall(&self, cluster_id: &ClusterId, libraries: &[LibrarySpec]) -> Result<()>;

    /// Fetch the status of every library on a cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn cluster_status(&self, cluster_id: &ClusterId) -> Result<ClusterLibraryStatuses>;
}

/// Operations on workspace objects (notebooks and directories).
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Fetch the status of an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or nothing exists at `path`.
    async fn get_status(&self, path: &str) -> Result<ObjectInfo>;

    /// List the objects in a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn list(&self, path: &str) -> Result<Vec<ObjectInfo>>;

    /// Create a directory and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn mkdirs(&self, path: &str) -> Result<()>;

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn delete(&self, path: &str, recursive: bool) -> Result<()>;

    /// Export a notebook's content.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn export(&self, path: &str, format: ExportFormat) -> Result<Vec<u8>>;

    /// Import a notebook.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn import(&self, notebook: &NotebookImport) -> Result<()>;
}

/// Operations on the distributed file store.
#[async_trait]
pub trait DbfsApi: Send + Sync {
    /// Open a write stream and return its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn create(&self, path: &str, overwrite: bool) -> Result<i64>;

    /// Append a block to an open write stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn add_block(&self, handle: i64, data: &[u8]) -> Result<()>;

    /// Close a write stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn close(&self, handle: i64) -> Result<()>;

    /// Read up to `length` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn read(&self, path: &str, offset: u64, length: u64) -> Result<Vec<u8>>;

    /// Fetch the status of a file or directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or nothing exists at `path`.
    async fn get_status(&self, path: &str) -> Result<FileInfo>;

    /// Delete a file or directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn delete(&self, path: &str, recursive: bool) -> Result<()>;

    /// Move a file or directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn move_path(&self, source: &str, destination: &str) -> Result<()>;

    /// Create a directory and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn mkdirs(&self, path: &str) -> Result<()>;

    /// List a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn list(&self, path: &str) -> Result<Vec<FileInfo>>;
}

/// Source of per-family clients.
///
/// Called once per family by the session, which keeps the returned client for
/// its lifetime.
pub trait Backend: Send + Sync {
    /// Client for `clusters/*`.
    fn clusters(&self) -> Arc<dyn ClustersApi>;
    /// Client for `jobs/*`.
    fn jobs(&self) -> Arc<dyn JobsApi>;
    /// Client for `libraries/*`.
    fn libraries(&self) -> Arc<dyn LibrariesApi>;
    /// Client for `workspace/*`.
    fn workspace(&self) -> Arc<dyn WorkspaceApi>;
    /// Client for `dbfs/*`.
    fn dbfs(&self) -> Arc<dyn DbfsApi>;
}
