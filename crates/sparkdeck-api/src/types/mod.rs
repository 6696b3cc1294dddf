//! Wire records exchanged with the platform's REST API.
//!
//! These mirror the JSON payloads one to one. Most fields are optional
//! because the platform omits what is unset.

#![allow(missing_docs)]

pub mod clusters;
pub mod dbfs;
pub mod jobs;
pub mod libraries;
pub mod workspace;

pub use clusters::{
    AutoScale, AwsAttributes, ClusterIdRequest, ClusterInfo, ClusterState, CreateClusterResponse,
    DbfsStorageInfo, InitScriptInfo, ListClustersResponse, NewCluster, NodeType, NodeTypesResponse,
    ResizeClusterRequest, S3StorageInfo, SparkNode, SparkVersion, SparkVersionsResponse,
    ZonesResponse,
};
pub use dbfs::FileInfo;
pub use jobs::{
    ClusterInstance, CreateJobResponse, CronSchedule, JobIdRequest, JobInfo, JobSettings,
    NotebookOutput, NotebookTaskSettings, RunClusterSpec, RunInfo, RunLifeCycleState,
    RunNowRequest, RunNowResponse, RunOutput, RunResultState, RunState, RunTask,
    SparkJarTaskSettings, SparkPythonTaskSettings, SparkSubmitTaskSettings,
};
pub use libraries::{
    ClusterLibraryStatuses, LibrariesRequest, LibraryFullStatus, LibraryInstallStatus,
    LibrarySpec, MavenLibrary, PythonPyPiLibrary, RCranLibrary,
};
pub use workspace::{ExportFormat, Language, NotebookImport, ObjectInfo, ObjectType};
