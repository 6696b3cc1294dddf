//! Cluster sizing and the validating cluster builder.

use sparkdeck_api::types::{
    AutoScale, AwsAttributes, ClusterInfo, DbfsStorageInfo, InitScriptInfo, NewCluster,
    S3StorageInfo,
};

use crate::cluster::Cluster;
use crate::error::{Error, Family, Result};
use crate::session::Session;

/// How many workers a cluster runs.
///
/// The two modes are mutually exclusive on the wire: a cluster carries either
/// `num_workers` or `autoscale`, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterSize {
    /// A fixed number of workers.
    Fixed {
        /// Worker count. Zero means a driver-only cluster.
        num_workers: u32,
    },
    /// Autoscaling between two bounds.
    Autoscale {
        /// Lower bound.
        min_workers: u32,
        /// Upper bound.
        max_workers: u32,
    },
}

impl ClusterSize {
    /// A fixed-size cluster.
    #[must_use]
    pub const fn fixed(num_workers: u32) -> Self {
        Self::Fixed { num_workers }
    }

    /// An autoscaling cluster.
    #[must_use]
    pub const fn autoscale(min_workers: u32, max_workers: u32) -> Self {
        Self::Autoscale {
            min_workers,
            max_workers,
        }
    }

    /// Build a sizing from the two optional wire fields.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error if both or neither are set, or
    /// if the autoscale bounds are inverted.
    pub fn from_parts(num_workers: Option<u32>, autoscale: Option<AutoScale>) -> Result<Self> {
        let size = match (num_workers, autoscale) {
            (Some(num_workers), None) => Self::fixed(num_workers),
            (None, Some(bounds)) => Self::autoscale(bounds.min_workers, bounds.max_workers),
            (Some(_), Some(_)) => {
                return Err(Error::config(
                    Family::Cluster,
                    "num_workers and autoscale are mutually exclusive",
                ))
            }
            (None, None) => {
                return Err(Error::config(
                    Family::Cluster,
                    "one of num_workers or autoscale is required",
                ))
            }
        };
        size.validate()?;
        Ok(size)
    }

    /// Read the sizing of a cluster record.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error if the record is inconsistent.
    pub fn from_info(info: &ClusterInfo) -> Result<Self> {
        Self::from_parts(info.num_workers, info.autoscale)
    }

    /// Check that the autoscale bounds are ordered.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error if `min_workers > max_workers`.
    pub fn validate(self) -> Result<()> {
        match self {
            Self::Autoscale {
                min_workers,
                max_workers,
            } if min_workers > max_workers => Err(Error::config(
                Family::Cluster,
                format!("autoscale min_workers ({min_workers}) exceeds max_workers ({max_workers})"),
            )),
            _ => Ok(()),
        }
    }

    /// The `(num_workers, autoscale)` wire pair.
    #[must_use]
    pub const fn to_parts(self) -> (Option<u32>, Option<AutoScale>) {
        match self {
            Self::Fixed { num_workers } => (Some(num_workers), None),
            Self::Autoscale {
                min_workers,
                max_workers,
            } => (
                None,
                Some(AutoScale {
                    min_workers,
                    max_workers,
                }),
            ),
        }
    }
}

/// Fluent builder for a cluster, or for the inline cluster of an automated job.
///
/// Nothing is sent until [`create`](Self::create). Unset runtime version,
/// node type and zone fall back to the platform defaults from the session
/// catalog.
#[derive(Debug)]
#[must_use]
pub struct ClusterBuilder<'a> {
    session: &'a Session,
    size: ClusterSize,
    spec: NewCluster,
    zone: Option<String>,
}

impl<'a> ClusterBuilder<'a> {
    pub(crate) fn new(session: &'a Session, size: ClusterSize) -> Self {
        Self {
            session,
            size,
            spec: NewCluster::default(),
            zone: None,
        }
    }

    /// Cluster name. Required by [`create`](Self::create).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.spec.cluster_name = Some(name.into());
        self
    }

    /// Runtime version key, e.g. `7.3.x-scala2.12`.
    pub fn spark_version(mut self, key: impl Into<String>) -> Self {
        self.spec.spark_version = Some(key.into());
        self
    }

    /// Worker node type.
    pub fn node_type_id(mut self, id: impl Into<String>) -> Self {
        self.spec.node_type_id = Some(id.into());
        self
    }

    /// Driver node type. Defaults to the worker node type on the platform.
    pub fn driver_node_type_id(mut self, id: impl Into<String>) -> Self {
        self.spec.driver_node_type_id = Some(id.into());
        self
    }

    /// Terminate after this many idle minutes.
    pub fn autotermination_minutes(mut self, minutes: u32) -> Self {
        self.spec.autotermination_minutes = Some(minutes);
        self
    }

    /// Add a custom tag.
    pub fn custom_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.custom_tags.insert(key.into(), value.into());
        self
    }

    /// Add a Spark configuration override.
    pub fn spark_conf(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.spark_conf.insert(key.into(), value.into());
        self
    }

    /// Add an environment variable for the Spark processes.
    pub fn spark_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.spark_env_vars.insert(key.into(), value.into());
        self
    }

    /// Run an init script stored in the file store.
    pub fn init_script_dbfs(mut self, destination: impl Into<String>) -> Self {
        self.spec.init_scripts.push(InitScriptInfo {
            dbfs: Some(DbfsStorageInfo {
                destination: destination.into(),
            }),
            s3: None,
        });
        self
    }

    /// Run an init script stored in S3.
    pub fn init_script_s3(
        mut self,
        destination: impl Into<String>,
        region: Option<String>,
    ) -> Self {
        self.spec.init_scripts.push(InitScriptInfo {
            dbfs: None,
            s3: Some(S3StorageInfo {
                destination: destination.into(),
                region,
            }),
        });
        self
    }

    /// Availability zone. Defaults to the platform's default zone.
    pub fn zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Validate and fill in platform defaults without creating anything.
    ///
    /// This is the inline cluster specification used by automated jobs.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error if the sizing is invalid, or if
    /// a default is needed but the catalog cannot be fetched or has none.
    pub async fn build_spec(self) -> Result<NewCluster> {
        self.resolve().await.map_err(|e| e.within(Family::Cluster))
    }

    /// Validate, create the cluster and return a handle to it.
    ///
    /// The handle reflects the first read after creation, normally `PENDING`.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error if validation fails (before any
    /// backend call) or wrapping the failure of the create or read call.
    pub async fn create(self) -> Result<Cluster> {
        let session = self.session;
        let result: Result<Cluster> = async {
            if self.spec.cluster_name.as_deref().map_or(true, str::is_empty) {
                return Err(Error::MissingField {
                    family: Family::Cluster,
                    field: "cluster_name",
                });
            }
            let spec = self.resolve().await?;
            let cluster_id = session.clusters_api().create(&spec).await?;

            tracing::info!(
                cluster_id = %cluster_id,
                name = spec.cluster_name.as_deref().unwrap_or_default(),
                spark_version = spec.spark_version.as_deref().unwrap_or_default(),
                "Created cluster"
            );

            session.get_cluster(&cluster_id).await
        }
        .await;
        result.map_err(|e| e.within(Family::Cluster))
    }

    async fn resolve(self) -> Result<NewCluster> {
        self.size.validate()?;
        let mut spec = self.spec;
        (spec.num_workers, spec.autoscale) = self.size.to_parts();

        if spec.spark_version.is_none() {
            let versions = self.session.spark_versions().await?;
            let default = versions.default_version().ok_or_else(|| {
                Error::config(Family::Cluster, "platform reports no default spark version")
            })?;
            spec.spark_version = Some(default.key.clone());
        }

        if spec.node_type_id.is_none() {
            let node_types = self.session.node_types().await?;
            let default = node_types.default_id().ok_or_else(|| {
                Error::config(Family::Cluster, "platform reports no default node type")
            })?;
            spec.node_type_id = Some(default.to_string());
        }

        let zone = match self.zone {
            Some(zone) => Some(zone),
            None => self.session.default_zone().await?,
        };
        if let Some(zone) = zone {
            spec.aws_attributes
                .get_or_insert_with(AwsAttributes::default)
                .zone_id = Some(zone);
        }

        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparkdeck_api::MockBackend;
    use std::sync::Arc;

    fn session(backend: &MockBackend) -> Session {
        Session::with_backend(Arc::new(backend.clone()))
    }

    #[test]
    fn sizing_is_exclusive() {
        let both = ClusterSize::from_parts(
            Some(2),
            Some(AutoScale {
                min_workers: 1,
                max_workers: 3,
            }),
        );
        assert!(both.unwrap_err().to_string().contains("mutually exclusive"));

        let neither = ClusterSize::from_parts(None, None).unwrap_err();
        assert_eq!(neither.family(), Some(Family::Cluster));

        assert_eq!(
            ClusterSize::from_parts(Some(2), None).unwrap(),
            ClusterSize::fixed(2)
        );
    }

    #[test]
    fn inverted_bounds_rejected() {
        assert!(ClusterSize::autoscale(4, 2).validate().is_err());
        assert!(ClusterSize::autoscale(2, 2).validate().is_ok());
    }

    #[tokio::test]
    async fn invalid_sizing_fails_before_any_call() {
        let backend = MockBackend::new();
        let session = session(&backend);

        let err = session
            .create_interactive_cluster("t1", ClusterSize::autoscale(5, 1))
            .create()
            .await
            .unwrap_err();

        assert_eq!(err.family(), Some(Family::Cluster));
        assert_eq!(backend.total_requests(), 0);
    }

    #[tokio::test]
    async fn missing_name_fails_before_any_call() {
        let backend = MockBackend::new();
        let session = session(&backend);

        let err = session
            .cluster_spec(ClusterSize::fixed(1))
            .create()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::MissingField {
                field: "cluster_name",
                ..
            }
        ));
        assert_eq!(backend.total_requests(), 0);
    }

    #[tokio::test]
    async fn build_spec_applies_catalog_defaults() {
        let backend = MockBackend::new();
        let session = session(&backend);

        let spec = session
            .cluster_spec(ClusterSize::autoscale(1, 4))
            .spark_conf("spark.speculation", "true")
            .build_spec()
            .await
            .unwrap();

        assert_eq!(spec.spark_version.as_deref(), Some("7.3.x-scala2.12"));
        assert_eq!(spec.node_type_id.as_deref(), Some("i3.xlarge"));
        assert_eq!(spec.num_workers, None);
        assert_eq!(spec.autoscale.map(|a| a.max_workers), Some(4));
        assert_eq!(
            spec.aws_attributes.and_then(|a| a.zone_id).as_deref(),
            Some("us-west-2c")
        );
        assert_eq!(backend.request_count("clusters/create"), 0);
    }

    #[tokio::test]
    async fn explicit_values_skip_catalog() {
        let backend = MockBackend::new();
        let session = session(&backend);

        let spec = session
            .cluster_spec(ClusterSize::fixed(1))
            .spark_version("X")
            .node_type_id("n1")
            .zone("us-east-1a")
            .build_spec()
            .await
            .unwrap();

        assert_eq!(spec.spark_version.as_deref(), Some("X"));
        assert_eq!(backend.request_count("clusters/spark-versions"), 0);
        assert_eq!(backend.request_count("clusters/list-node-types"), 0);
        assert_eq!(backend.request_count("clusters/list-zones"), 0);
    }
}
