//! Wire records for the `clusters/*` endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sparkdeck_core::ClusterId;

/// Lifecycle states reported for a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterState {
    /// The cluster is being provisioned.
    Pending,
    /// The cluster is up and accepting work.
    Running,
    /// The cluster is restarting.
    Restarting,
    /// Workers are being added or removed.
    Resizing,
    /// The cluster is shutting down.
    Terminating,
    /// The cluster has been shut down.
    Terminated,
    /// The cluster failed.
    Error,
    /// Any state this client does not recognise.
    #[default]
    #[serde(other)]
    Unknown,
}

impl ClusterState {
    /// The state's wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Restarting => "RESTARTING",
            Self::Resizing => "RESIZING",
            Self::Terminating => "TERMINATING",
            Self::Terminated => "TERMINATED",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ClusterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Autoscaling bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoScale {
    /// Lower bound on the worker count.
    pub min_workers: u32,
    /// Upper bound on the worker count.
    pub max_workers: u32,
}

/// Cloud placement attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsAttributes {
    /// Availability zone the cluster's nodes are placed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    /// `SPOT`, `ON_DEMAND` or `SPOT_WITH_FALLBACK`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    /// Number of on-demand nodes before spot nodes are used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_on_demand: Option<u32>,
}

/// A storage location on the distributed file store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbfsStorageInfo {
    /// `dbfs:/` destination path.
    pub destination: String,
}

/// A storage location in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3StorageInfo {
    /// `s3://` destination URI.
    pub destination: String,
    /// Bucket region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Location of one init script. Exactly one field is populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitScriptInfo {
    /// Script stored on the distributed file store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbfs: Option<DbfsStorageInfo>,
    /// Script stored in object storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3StorageInfo>,
}

/// A cluster specification, used both by `clusters/create` and as the inline
/// `new_cluster` of an automated job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_node_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_workers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscale: Option<AutoScale>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autotermination_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub spark_conf: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub spark_env_vars: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_scripts: Vec<InitScriptInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_attributes: Option<AwsAttributes>,
}

/// One node of a running cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparkNode {
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub public_dns: Option<String>,
    #[serde(default)]
    pub start_timestamp: Option<i64>,
}

/// The full description of a cluster as returned by `clusters/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub cluster_id: ClusterId,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub spark_version: Option<String>,
    #[serde(default)]
    pub node_type_id: Option<String>,
    #[serde(default)]
    pub driver_node_type_id: Option<String>,
    #[serde(default)]
    pub num_workers: Option<u32>,
    #[serde(default)]
    pub autoscale: Option<AutoScale>,
    #[serde(default)]
    pub autotermination_minutes: Option<u32>,
    #[serde(default)]
    pub state: ClusterState,
    #[serde(default)]
    pub state_message: Option<String>,
    #[serde(default)]
    pub driver: Option<SparkNode>,
    #[serde(default)]
    pub executors: Vec<SparkNode>,
    #[serde(default)]
    pub custom_tags: BTreeMap<String, String>,
    #[serde(default)]
    pub spark_conf: BTreeMap<String, String>,
    #[serde(default)]
    pub init_scripts: Vec<InitScriptInfo>,
    #[serde(default)]
    pub aws_attributes: Option<AwsAttributes>,
    #[serde(default)]
    pub creator_user_name: Option<String>,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub terminated_time: Option<i64>,
}

/// Response of `clusters/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClusterResponse {
    pub cluster_id: ClusterId,
}

/// Body of the single-cluster `POST` endpoints (restart, delete, permanent-delete).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterIdRequest {
    pub cluster_id: ClusterId,
}

/// Body of `clusters/resize`. Exactly one of the sizing fields is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeClusterRequest {
    pub cluster_id: ClusterId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_workers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscale: Option<AutoScale>,
}

/// Response of `clusters/list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListClustersResponse {
    #[serde(default)]
    pub clusters: Vec<ClusterInfo>,
}

/// One runtime version offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparkVersion {
    /// The key passed as `spark_version` when creating clusters.
    pub key: String,
    /// Human-readable name.
    pub name: String,
}

/// Response of `clusters/spark-versions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparkVersionsResponse {
    #[serde(default)]
    pub versions: Vec<SparkVersion>,
    #[serde(default)]
    pub default_version_key: Option<String>,
}

/// One node type offered by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeType {
    pub node_type_id: String,
    #[serde(default)]
    pub memory_mb: u64,
    #[serde(default)]
    pub num_cores: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instance_type_id: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
}

/// Response of `clusters/list-node-types`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeTypesResponse {
    #[serde(default)]
    pub node_types: Vec<NodeType>,
    #[serde(default)]
    pub default_node_type_id: Option<String>,
}

/// Response of `clusters/list-zones`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZonesResponse {
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(default)]
    pub default_zone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_cluster_state_deserializes() {
        let state: ClusterState = serde_json::from_str("\"FROBNICATING\"").unwrap();
        assert_eq!(state, ClusterState::Unknown);
        let state: ClusterState = serde_json::from_str("\"RESIZING\"").unwrap();
        assert_eq!(state, ClusterState::Resizing);
    }

    #[test]
    fn new_cluster_omits_unset_fields() {
        let spec = NewCluster {
            cluster_name: Some("t1".into()),
            num_workers: Some(1),
            ..NewCluster::default()
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json, serde_json::json!({"cluster_name": "t1", "num_workers": 1}));
    }

    #[test]
    fn cluster_info_tolerates_sparse_records() {
        let info: ClusterInfo = serde_json::from_value(serde_json::json!({
            "cluster_id": "0923-164208-meows279",
            "state": "PENDING",
            "autoscale": {"min_workers": 0, "max_workers": 2}
        }))
        .unwrap();
        assert_eq!(info.state, ClusterState::Pending);
        assert!(info.executors.is_empty());
        assert_eq!(
            info.autoscale,
            Some(AutoScale {
                min_workers: 0,
                max_workers: 2
            })
        );
    }
}
