//! The session: single entry point to the platform.
//!
//! A [`Session`] owns the backend, hands out one client per resource family
//! (built on first use and reused afterwards) and the memoized platform
//! catalog. Every builder and resolver goes through it.

use std::fmt;
use std::sync::{Arc, OnceLock};

use sparkdeck_api::types::{
    ClusterInfo, ExportFormat, Language, NodeType, NotebookImport, ObjectInfo, SparkVersion,
};
use sparkdeck_api::{
    Backend, ClustersApi, DbfsApi, HttpBackend, JobsApi, LibrariesApi, WorkspaceApi,
};
use sparkdeck_core::{ClusterId, JobId, RunId};

use crate::catalog::{Catalog, NodeTypes, SparkVersions, Zones};
use crate::cluster::{Cluster, ClusterBuilder, ClusterSize};
use crate::config::SessionConfig;
use crate::dbfs::Dbfs;
use crate::error::{Error, Family, Result};
use crate::job::{
    resolver, Automated, Interactive, Job, JobBuilder, JarTask, NotebookTask, PythonTask, Run,
    SparkSubmitTask,
};
use crate::workspace::{Notebook, PythonScript};

/// A connection to one platform workspace.
pub struct Session {
    backend: Arc<dyn Backend>,
    clusters: OnceLock<Arc<dyn ClustersApi>>,
    jobs: OnceLock<Arc<dyn JobsApi>>,
    libraries: OnceLock<Arc<dyn LibrariesApi>>,
    workspace: OnceLock<Arc<dyn WorkspaceApi>>,
    dbfs: OnceLock<Arc<dyn DbfsApi>>,
    catalog: Catalog,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Connect over HTTP.
    ///
    /// # Errors
    ///
    /// Returns a session configuration error if the host is empty, if no
    /// token or username is set, or if a username comes without a password.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let http = config.http_config()?;
        tracing::debug!(host = %http.host, "Opening session");
        Ok(Self::with_backend(Arc::new(HttpBackend::new(http))))
    }

    /// Use an existing backend, e.g. a mock in tests.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            clusters: OnceLock::new(),
            jobs: OnceLock::new(),
            libraries: OnceLock::new(),
            workspace: OnceLock::new(),
            dbfs: OnceLock::new(),
            catalog: Catalog::new(),
        }
    }

    // ===== Family clients =====

    pub(crate) fn clusters_api(&self) -> &Arc<dyn ClustersApi> {
        self.clusters.get_or_init(|| self.backend.clusters())
    }

    pub(crate) fn jobs_api(&self) -> &Arc<dyn JobsApi> {
        self.jobs.get_or_init(|| self.backend.jobs())
    }

    pub(crate) fn libraries_api(&self) -> &Arc<dyn LibrariesApi> {
        self.libraries.get_or_init(|| self.backend.libraries())
    }

    pub(crate) fn workspace_api(&self) -> &Arc<dyn WorkspaceApi> {
        self.workspace.get_or_init(|| self.backend.workspace())
    }

    pub(crate) fn dbfs_api(&self) -> &Arc<dyn DbfsApi> {
        self.dbfs.get_or_init(|| self.backend.dbfs())
    }

    pub(crate) fn cluster_handle(&self, info: ClusterInfo) -> Cluster {
        Cluster::new(
            info,
            self.clusters_api().clone(),
            self.libraries_api().clone(),
        )
    }

    // ===== Clusters =====

    /// Fetch a cluster by id.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error wrapping the transport failure.
    pub async fn get_cluster(&self, cluster_id: &ClusterId) -> Result<Cluster> {
        let info = self
            .clusters_api()
            .get(cluster_id)
            .await
            .map_err(|e| Error::from(e).within(Family::Cluster))?;
        Ok(self.cluster_handle(info))
    }

    /// All clusters visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns a cluster configuration error wrapping the transport failure.
    pub async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        let infos = self
            .clusters_api()
            .list()
            .await
            .map_err(|e| Error::from(e).within(Family::Cluster))?;
        Ok(infos
            .into_iter()
            .map(|info| self.cluster_handle(info))
            .collect())
    }

    /// Start building a named cluster with the given sizing.
    pub fn create_interactive_cluster(
        &self,
        name: impl Into<String>,
        size: ClusterSize,
    ) -> ClusterBuilder<'_> {
        ClusterBuilder::new(self, size).name(name)
    }

    /// Start building a cluster specification, e.g. for an automated job.
    pub fn cluster_spec(&self, size: ClusterSize) -> ClusterBuilder<'_> {
        ClusterBuilder::new(self, size)
    }

    // ===== Catalog =====

    /// Runtime versions offered by the platform. Fetched once per session.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the first fetch fails.
    pub async fn spark_versions(&self) -> Result<&SparkVersions> {
        self.catalog.spark_versions(self.clusters_api().as_ref()).await
    }

    /// The platform's default runtime version.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the first fetch fails.
    pub async fn default_spark_version(&self) -> Result<Option<&SparkVersion>> {
        Ok(self.spark_versions().await?.default_version())
    }

    /// Look up a runtime version by key.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the first fetch fails.
    pub async fn spark_version_by_key(&self, key: &str) -> Result<Option<&SparkVersion>> {
        Ok(self.spark_versions().await?.by_key(key))
    }

    /// Node types offered by the platform. Fetched once per session.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the first fetch fails.
    pub async fn node_types(&self) -> Result<&NodeTypes> {
        self.catalog.node_types(self.clusters_api().as_ref()).await
    }

    /// The platform's default node type.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the first fetch fails.
    pub async fn default_node_type(&self) -> Result<Option<&NodeType>> {
        Ok(self.node_types().await?.default_node_type())
    }

    /// Look up a node type by id.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the first fetch fails.
    pub async fn node_type_by_id(&self, id: &str) -> Result<Option<&NodeType>> {
        Ok(self.node_types().await?.by_id(id))
    }

    /// Availability zones. Fetched once per session.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the first fetch fails.
    pub async fn zones(&self) -> Result<&Zones> {
        self.catalog.zones(self.clusters_api().as_ref()).await
    }

    /// The platform's default zone.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the first fetch fails.
    pub async fn default_zone(&self) -> Result<Option<String>> {
        Ok(self.zones().await?.default_zone().map(str::to_string))
    }

    // ===== Jobs =====

    /// Build a notebook job that runs on an existing cluster.
    pub fn create_interactive_notebook_job(
        &self,
        cluster: &Cluster,
        notebook: &Notebook,
    ) -> JobBuilder<'_, Interactive, NotebookTask> {
        JobBuilder::new(
            self,
            Some(Interactive::new(cluster.clone())),
            NotebookTask::new(notebook.clone()),
        )
    }

    /// Build a jar job that runs on an existing cluster.
    ///
    /// `jar_uri` is installed as a library of the job.
    pub fn create_interactive_jar_job(
        &self,
        cluster: &Cluster,
        jar_uri: impl Into<String>,
        main_class_name: impl Into<String>,
    ) -> JobBuilder<'_, Interactive, JarTask> {
        JobBuilder::new(
            self,
            Some(Interactive::new(cluster.clone())),
            JarTask::new(Some(jar_uri.into()), main_class_name),
        )
    }

    /// Build a python job that runs on an existing cluster.
    pub fn create_interactive_python_job(
        &self,
        cluster: &Cluster,
        script_uri: impl Into<String>,
    ) -> JobBuilder<'_, Interactive, PythonTask> {
        JobBuilder::new(
            self,
            Some(Interactive::new(cluster.clone())),
            PythonTask::new(PythonScript::unchecked(script_uri)),
        )
    }

    /// Build a notebook job that runs on its own cluster.
    ///
    /// The cluster is set with [`JobBuilder::new_cluster`].
    pub fn create_automated_notebook_job(
        &self,
        notebook: &Notebook,
    ) -> JobBuilder<'_, Automated, NotebookTask> {
        JobBuilder::new(self, None, NotebookTask::new(notebook.clone()))
    }

    /// Build a jar job that runs on its own cluster.
    pub fn create_automated_jar_job(
        &self,
        jar_uri: impl Into<String>,
        main_class_name: impl Into<String>,
    ) -> JobBuilder<'_, Automated, JarTask> {
        JobBuilder::new(
            self,
            None,
            JarTask::new(Some(jar_uri.into()), main_class_name),
        )
    }

    /// Build a python job that runs on its own cluster.
    pub fn create_automated_python_job(
        &self,
        script_uri: impl Into<String>,
    ) -> JobBuilder<'_, Automated, PythonTask> {
        JobBuilder::new(
            self,
            None,
            PythonTask::new(PythonScript::unchecked(script_uri)),
        )
    }

    /// Build a spark-submit job. Spark-submit jobs always run on their own
    /// cluster.
    pub fn create_automated_spark_submit_job<I, S>(
        &self,
        parameters: I,
    ) -> JobBuilder<'_, Automated, SparkSubmitTask>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        JobBuilder::new(self, None, SparkSubmitTask::new(parameters))
    }

    /// Fetch a job and resolve it into its variant.
    ///
    /// # Errors
    ///
    /// Returns a job configuration error whatever the cause: transport
    /// failure, unsupported shape, missing field or unresolvable reference.
    pub async fn get_job(&self, job_id: JobId) -> Result<Job> {
        let result: Result<Job> = async {
            let info = self.jobs_api().get(job_id).await?;
            resolver::resolve_job(self, info).await
        }
        .await;
        result.map_err(|e| e.within(Family::Job))
    }

    /// Fetch a run and resolve it into its variant.
    ///
    /// # Errors
    ///
    /// Returns a run configuration error whatever the cause.
    pub async fn get_run(&self, run_id: RunId) -> Result<Run> {
        let result: Result<Run> = async {
            let info = self.jobs_api().get_run(run_id).await?;
            resolver::resolve_run(self, info).await
        }
        .await;
        result.map_err(|e| e.within(Family::Run))
    }

    // ===== Workspace =====

    /// Fetch a notebook by workspace path.
    ///
    /// # Errors
    ///
    /// Returns a workspace configuration error wrapping a resource error if
    /// the path does not exist or is not a notebook.
    pub async fn get_notebook(&self, path: &str) -> Result<Notebook> {
        let result = match self.workspace_api().get_status(path).await {
            Ok(info) => Notebook::from_info(info),
            Err(e) => Err(Error::resource_caused_by(
                format!("notebook {path} could not be found"),
                e.into(),
            )),
        };
        result.map_err(|e| e.within(Family::Workspace))
    }

    /// Import notebook source into the workspace and return it.
    ///
    /// # Errors
    ///
    /// Returns a workspace configuration error wrapping the failure.
    pub async fn import_notebook(
        &self,
        path: &str,
        language: Language,
        content: &[u8],
        overwrite: bool,
    ) -> Result<Notebook> {
        let imported = self
            .workspace_api()
            .import(&NotebookImport {
                path: path.to_string(),
                format: ExportFormat::Source,
                language: Some(language),
                content: content.to_vec(),
                overwrite,
            })
            .await;
        if let Err(e) = imported {
            return Err(Error::from(e).within(Family::Workspace));
        }
        tracing::info!(path, language = ?language, "Imported notebook");
        self.get_notebook(path).await
    }

    /// Export a notebook's content.
    ///
    /// # Errors
    ///
    /// Returns a workspace configuration error wrapping the failure.
    pub async fn export_notebook(&self, notebook: &Notebook, format: ExportFormat) -> Result<Vec<u8>> {
        self.workspace_api()
            .export(notebook.path(), format)
            .await
            .map_err(|e| Error::from(e).within(Family::Workspace))
    }

    /// Objects directly under a workspace directory.
    ///
    /// # Errors
    ///
    /// Returns a workspace configuration error wrapping the failure.
    pub async fn list_workspace(&self, path: &str) -> Result<Vec<ObjectInfo>> {
        self.workspace_api()
            .list(path)
            .await
            .map_err(|e| Error::from(e).within(Family::Workspace))
    }

    /// Create a workspace directory and its parents.
    ///
    /// # Errors
    ///
    /// Returns a workspace configuration error wrapping the failure.
    pub async fn mkdirs(&self, path: &str) -> Result<()> {
        self.workspace_api()
            .mkdirs(path)
            .await
            .map_err(|e| Error::from(e).within(Family::Workspace))
    }

    /// Delete a workspace object. Non-empty directories need `recursive`.
    ///
    /// # Errors
    ///
    /// Returns a workspace configuration error wrapping the failure.
    pub async fn delete_workspace_path(&self, path: &str, recursive: bool) -> Result<()> {
        self.workspace_api()
            .delete(path, recursive)
            .await
            .map_err(|e| Error::from(e).within(Family::Workspace))?;
        tracing::info!(path, recursive, "Deleted workspace path");
        Ok(())
    }

    // ===== File store =====

    /// Resolve a python script reference.
    ///
    /// # Errors
    ///
    /// Returns a resource error if a `dbfs:` script does not exist or is a
    /// directory.
    pub async fn python_script(&self, uri: &str) -> Result<PythonScript> {
        PythonScript::resolve(self.dbfs_api().as_ref(), uri).await
    }

    /// File-store helpers.
    #[must_use]
    pub fn dbfs(&self) -> Dbfs {
        Dbfs::new(self.dbfs_api().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparkdeck_api::types::ObjectType;
    use sparkdeck_api::MockBackend;

    fn session(backend: &MockBackend) -> Session {
        Session::with_backend(Arc::new(backend.clone()))
    }

    #[test]
    fn new_validates_credentials() {
        let err = Session::new(&SessionConfig::new("example.com")).unwrap_err();
        assert_eq!(err.family(), Some(Family::Session));

        let err = Session::new(&SessionConfig {
            username: Some("me".into()),
            ..SessionConfig::new("example.com")
        })
        .unwrap_err();
        assert_eq!(err.family(), Some(Family::Session));

        assert!(Session::new(&SessionConfig::new("example.com").with_token("t")).is_ok());
        assert!(
            Session::new(&SessionConfig::new("example.com").with_basic_auth("me", "pw")).is_ok()
        );
    }

    #[tokio::test]
    async fn catalog_defaults() {
        let backend = MockBackend::new();
        let session = session(&backend);

        assert_eq!(
            session.default_spark_version().await.unwrap().map(|v| v.key.as_str()),
            Some("7.3.x-scala2.12")
        );
        assert!(session
            .spark_version_by_key("9.1.x-scala2.12")
            .await
            .unwrap()
            .is_some());
        assert!(session.node_type_by_id("i3.xlarge").await.unwrap().is_some());
        assert_eq!(session.default_zone().await.unwrap().as_deref(), Some("us-west-2c"));
        assert_eq!(backend.request_count("clusters/spark-versions"), 1);
    }

    #[tokio::test]
    async fn missing_cluster_is_a_cluster_error() {
        let backend = MockBackend::new();
        let err = session(&backend)
            .get_cluster(&ClusterId::new("nope").unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.family(), Some(Family::Cluster));
        assert!(err.transport().is_some_and(sparkdeck_api::ApiError::is_not_found));
    }

    #[tokio::test]
    async fn missing_job_is_a_job_error() {
        let backend = MockBackend::new();
        let err = session(&backend).get_job(JobId::new(404)).await.unwrap_err();
        assert_eq!(err.family(), Some(Family::Job));
    }

    #[tokio::test]
    async fn notebook_import_and_lookup() {
        let backend = MockBackend::new();
        let session = session(&backend);
        session.mkdirs("/Users/me").await.unwrap();

        let notebook = session
            .import_notebook("/Users/me/etl", Language::Python, b"print(1)", false)
            .await
            .unwrap();
        assert_eq!(notebook.path(), "/Users/me/etl");
        assert_eq!(notebook.language(), Some(Language::Python));

        let exported = session
            .export_notebook(&notebook, ExportFormat::Source)
            .await
            .unwrap();
        assert_eq!(exported, b"print(1)");

        let listed = session.list_workspace("/Users/me").await.unwrap();
        assert!(listed
            .iter()
            .any(|o| o.object_type == ObjectType::Notebook && o.path == "/Users/me/etl"));
    }

    #[tokio::test]
    async fn missing_notebook_is_a_resource_error_in_workspace_family() {
        let backend = MockBackend::new();
        let err = session(&backend).get_notebook("/nope").await.unwrap_err();

        assert_eq!(err.family(), Some(Family::Workspace));
        assert!(matches!(err, Error::Config { source: Some(ref inner), .. } if matches!(**inner, Error::Resource { .. })));
        assert!(err.transport().is_some_and(sparkdeck_api::ApiError::is_not_found));
    }

    #[tokio::test]
    async fn directory_is_not_a_notebook() {
        let backend = MockBackend::new();
        let session = session(&backend);
        session.mkdirs("/Shared").await.unwrap();

        let err = session.get_notebook("/Shared").await.unwrap_err();
        assert_eq!(err.family(), Some(Family::Workspace));
        assert!(err.to_string().contains("not a notebook"));
    }

    #[tokio::test]
    async fn family_clients_are_built_once() {
        let backend = MockBackend::new();
        let session = session(&backend);
        let first = Arc::as_ptr(session.jobs_api()).cast::<()>();
        let second = Arc::as_ptr(session.jobs_api()).cast::<()>();
        assert_eq!(first, second);
    }
}
