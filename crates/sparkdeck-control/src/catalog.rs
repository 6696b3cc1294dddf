//! Session-scoped platform catalog.
//!
//! Runtime versions, node types and zones are fetched on first access and kept
//! for the rest of the session. There is no TTL: a session never observes
//! catalog changes made on the platform after its first lookup. A failed fetch
//! leaves the entry empty, so the next access tries again.

use sparkdeck_api::types::{
    NodeType, NodeTypesResponse, SparkVersion, SparkVersionsResponse, ZonesResponse,
};
use sparkdeck_api::ClustersApi;
use tokio::sync::OnceCell;

use crate::error::{Error, Result};

/// Runtime versions offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparkVersions {
    versions: Vec<SparkVersion>,
    default_key: Option<String>,
}

impl SparkVersions {
    /// All versions. A default key the platform reports but does not list is
    /// included, with the key as its name.
    #[must_use]
    pub fn versions(&self) -> &[SparkVersion] {
        &self.versions
    }

    /// The default version, if the platform reports one.
    #[must_use]
    pub fn default_version(&self) -> Option<&SparkVersion> {
        self.default_key.as_deref().and_then(|key| self.by_key(key))
    }

    /// Look up a version by key.
    #[must_use]
    pub fn by_key(&self, key: &str) -> Option<&SparkVersion> {
        self.versions.iter().find(|v| v.key == key)
    }
}

impl From<SparkVersionsResponse> for SparkVersions {
    fn from(response: SparkVersionsResponse) -> Self {
        let mut versions = response.versions;
        if let Some(key) = &response.default_version_key {
            if !versions.iter().any(|v| &v.key == key) {
                versions.push(SparkVersion {
                    key: key.clone(),
                    name: key.clone(),
                });
            }
        }
        Self {
            versions,
            default_key: response.default_version_key,
        }
    }
}

/// Node types offered by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTypes {
    node_types: Vec<NodeType>,
    default_id: Option<String>,
}

impl NodeTypes {
    /// All node types.
    #[must_use]
    pub fn node_types(&self) -> &[NodeType] {
        &self.node_types
    }

    /// Id of the default node type, if the platform reports one.
    #[must_use]
    pub fn default_id(&self) -> Option<&str> {
        self.default_id.as_deref()
    }

    /// The default node type, if the platform reports and lists one.
    #[must_use]
    pub fn default_node_type(&self) -> Option<&NodeType> {
        self.default_id().and_then(|id| self.by_id(id))
    }

    /// Look up a node type by id.
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&NodeType> {
        self.node_types.iter().find(|n| n.node_type_id == id)
    }
}

impl From<NodeTypesResponse> for NodeTypes {
    fn from(response: NodeTypesResponse) -> Self {
        Self {
            node_types: response.node_types,
            default_id: response.default_node_type_id,
        }
    }
}

/// Availability zones offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zones {
    zones: Vec<String>,
    default_zone: Option<String>,
}

impl Zones {
    /// All zones.
    #[must_use]
    pub fn zones(&self) -> &[String] {
        &self.zones
    }

    /// The default zone, if the platform reports one.
    #[must_use]
    pub fn default_zone(&self) -> Option<&str> {
        self.default_zone.as_deref()
    }
}

impl From<ZonesResponse> for Zones {
    fn from(response: ZonesResponse) -> Self {
        Self {
            zones: response.zones,
            default_zone: response.default_zone,
        }
    }
}

/// Compute-once cache of the platform catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    spark_versions: OnceCell<SparkVersions>,
    node_types: OnceCell<NodeTypes>,
    zones: OnceCell<Zones>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runtime versions, fetched through `api` on first access.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the first fetch fails.
    pub async fn spark_versions(&self, api: &dyn ClustersApi) -> Result<&SparkVersions> {
        self.spark_versions
            .get_or_try_init(|| async move {
                tracing::debug!("Fetching spark versions");
                Ok::<_, Error>(SparkVersions::from(api.spark_versions().await?))
            })
            .await
    }

    /// Node types, fetched through `api` on first access.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the first fetch fails.
    pub async fn node_types(&self, api: &dyn ClustersApi) -> Result<&NodeTypes> {
        self.node_types
            .get_or_try_init(|| async move {
                tracing::debug!("Fetching node types");
                Ok::<_, Error>(NodeTypes::from(api.node_types().await?))
            })
            .await
    }

    /// Zones, fetched through `api` on first access.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the first fetch fails.
    pub async fn zones(&self, api: &dyn ClustersApi) -> Result<&Zones> {
        self.zones
            .get_or_try_init(|| async move {
                tracing::debug!("Fetching zones");
                Ok::<_, Error>(Zones::from(api.zones().await?))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparkdeck_api::MockBackend;

    #[test]
    fn missing_default_version_is_appended() {
        let versions = SparkVersions::from(SparkVersionsResponse {
            versions: vec![SparkVersion {
                key: "a".into(),
                name: "A".into(),
            }],
            default_version_key: Some("b".into()),
        });

        assert_eq!(versions.versions().len(), 2);
        let default = versions.default_version().unwrap();
        assert_eq!(default.key, "b");
        assert_eq!(default.name, "b");
    }

    #[test]
    fn listed_default_version_is_not_duplicated() {
        let versions = SparkVersions::from(SparkVersionsResponse {
            versions: vec![SparkVersion {
                key: "a".into(),
                name: "A".into(),
            }],
            default_version_key: Some("a".into()),
        });
        assert_eq!(versions.versions().len(), 1);
        assert_eq!(versions.default_version().unwrap().name, "A");
    }

    #[tokio::test]
    async fn fetched_once() {
        let backend = MockBackend::new();
        let catalog = Catalog::new();

        catalog.spark_versions(&backend).await.unwrap();
        catalog.spark_versions(&backend).await.unwrap();
        catalog.zones(&backend).await.unwrap();
        catalog.zones(&backend).await.unwrap();

        assert_eq!(backend.request_count("clusters/spark-versions"), 1);
        assert_eq!(backend.request_count("clusters/list-zones"), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_retried() {
        let backend = MockBackend::new();
        let catalog = Catalog::new();

        backend.fail_with_status("clusters/list-node-types", 500);
        assert!(catalog.node_types(&backend).await.is_err());

        backend.clear_failure("clusters/list-node-types");
        let node_types = catalog.node_types(&backend).await.unwrap();
        assert!(node_types.default_node_type().is_some());
        assert_eq!(backend.request_count("clusters/list-node-types"), 2);
    }
}
