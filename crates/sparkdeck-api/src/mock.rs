//! In-memory simulation of the platform for tests.
//!
//! `MockBackend` keeps clusters, jobs, runs, library statuses, workspace
//! objects and file-store entries in maps behind one lock. Transitional
//! cluster and run states settle on their own after a configurable number of
//! reads so polling code sees the same progression it would against the real
//! platform. Every call is counted per endpoint.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sparkdeck_core::{ClusterId, JobId, RunId};

use crate::api::{Backend, ClustersApi, DbfsApi, JobsApi, LibrariesApi, WorkspaceApi};
use crate::error::{ApiError, Result, RESOURCE_DOES_NOT_EXIST};
use crate::types::{
    ClusterInfo, ClusterInstance, ClusterLibraryStatuses, ClusterState, ExportFormat, FileInfo,
    JobInfo, JobSettings, Language, LibraryFullStatus, LibraryInstallStatus, LibrarySpec,
    NewCluster, NodeType, NodeTypesResponse, NotebookImport, ObjectInfo, ObjectType,
    ResizeClusterRequest, RunClusterSpec, RunInfo, RunLifeCycleState, RunNowRequest,
    RunNowResponse, RunOutput, RunResultState, RunState, RunTask, SparkNode, SparkVersion,
    SparkVersionsResponse, ZonesResponse,
};

/// Default number of reads a transitional state survives.
pub const DEFAULT_SETTLE_AFTER_READS: u32 = 2;

/// Spark version the mock advertises as default.
pub const MOCK_DEFAULT_SPARK_VERSION: &str = "7.3.x-scala2.12";

/// Node type the mock advertises as default.
pub const MOCK_DEFAULT_NODE_TYPE: &str = "i3.xlarge";

/// Zone the mock advertises as default.
pub const MOCK_DEFAULT_ZONE: &str = "us-west-2c";

#[derive(Debug)]
struct MockCluster {
    info: ClusterInfo,
    settles_to: Option<ClusterState>,
    reads_left: u32,
}

#[derive(Debug)]
struct MockLibrary {
    status: LibraryFullStatus,
    reads_left: u32,
}

#[derive(Debug)]
struct MockRun {
    info: RunInfo,
    output: RunOutput,
    reads_left: u32,
}

#[derive(Debug)]
struct MockObject {
    info: ObjectInfo,
    content: Vec<u8>,
}

#[derive(Debug)]
struct MockState {
    settle_after_reads: u32,
    next_id: i64,
    clusters: BTreeMap<String, MockCluster>,
    jobs: BTreeMap<JobId, JobInfo>,
    runs: BTreeMap<RunId, MockRun>,
    libraries: HashMap<String, Vec<MockLibrary>>,
    objects: BTreeMap<String, MockObject>,
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    handles: HashMap<i64, (String, Vec<u8>)>,
    spark_versions: SparkVersionsResponse,
    node_types: NodeTypesResponse,
    zones: ZonesResponse,
    failures: HashMap<String, u16>,
    calls: HashMap<String, usize>,
}

impl MockState {
    fn new() -> Self {
        Self {
            settle_after_reads: DEFAULT_SETTLE_AFTER_READS,
            next_id: 0,
            clusters: BTreeMap::new(),
            jobs: BTreeMap::new(),
            runs: BTreeMap::new(),
            libraries: HashMap::new(),
            objects: BTreeMap::new(),
            files: BTreeMap::new(),
            dirs: BTreeSet::from(["/".to_string()]),
            handles: HashMap::new(),
            spark_versions: SparkVersionsResponse {
                versions: vec![
                    SparkVersion {
                        key: MOCK_DEFAULT_SPARK_VERSION.to_string(),
                        name: "7.3 LTS (includes Apache Spark 3.0.1, Scala 2.12)".to_string(),
                    },
                    SparkVersion {
                        key: "9.1.x-scala2.12".to_string(),
                        name: "9.1 LTS (includes Apache Spark 3.1.2, Scala 2.12)".to_string(),
                    },
                ],
                default_version_key: Some(MOCK_DEFAULT_SPARK_VERSION.to_string()),
            },
            node_types: NodeTypesResponse {
                node_types: vec![NodeType {
                    node_type_id: MOCK_DEFAULT_NODE_TYPE.to_string(),
                    memory_mb: 31_232,
                    num_cores: 4.0,
                    description: "i3.xlarge".to_string(),
                    instance_type_id: Some("i3.xlarge".to_string()),
                    is_deprecated: false,
                }],
                default_node_type_id: Some(MOCK_DEFAULT_NODE_TYPE.to_string()),
            },
            zones: ZonesResponse {
                zones: vec![MOCK_DEFAULT_ZONE.to_string(), "us-west-2b".to_string()],
                default_zone: Some(MOCK_DEFAULT_ZONE.to_string()),
            },
            failures: HashMap::new(),
            calls: HashMap::new(),
        }
    }

    /// Count a call and apply any injected failure for the endpoint.
    fn enter(&mut self, endpoint: &str) -> Result<()> {
        *self.calls.entry(endpoint.to_string()).or_default() += 1;
        match self.failures.get(endpoint).copied() {
            Some(401) => Err(ApiError::Unauthenticated),
            Some(403) => Err(ApiError::Unauthorized),
            Some(status) => Err(ApiError::Status {
                status,
                error_code: None,
                message: format!("injected failure for {endpoint}"),
            }),
            None => Ok(()),
        }
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn cluster_mut(&mut self, cluster_id: &ClusterId) -> Result<&mut MockCluster> {
        self.clusters
            .get_mut(cluster_id.as_str())
            .ok_or_else(|| not_found(format!("Cluster {cluster_id} does not exist")))
    }

    fn begin_transition(
        &mut self,
        cluster_id: &ClusterId,
        state: ClusterState,
        settles_to: ClusterState,
    ) -> Result<()> {
        let reads = self.settle_after_reads;
        let cluster = self.cluster_mut(cluster_id)?;
        cluster.info.state = state;
        cluster.settles_to = Some(settles_to);
        cluster.reads_left = reads;
        Ok(())
    }

    fn settle(&mut self, cluster_id: &str) {
        let Some(cluster) = self.clusters.get_mut(cluster_id) else {
            return;
        };
        let Some(target) = cluster.settles_to.take() else {
            return;
        };
        cluster.reads_left = 0;
        apply_state(&mut cluster.info, target);

        if target == ClusterState::Running {
            // A restart drops libraries marked for removal.
            if let Some(libraries) = self.libraries.get_mut(cluster_id) {
                libraries.retain(|l| l.status.status != LibraryInstallStatus::UninstallOnRestart);
            }
        }
    }

    fn parent_dirs(path: &str) -> Vec<String> {
        let mut dirs = Vec::new();
        let mut current = String::new();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        for segment in segments.iter().take(segments.len().saturating_sub(1)) {
            current.push('/');
            current.push_str(segment);
            dirs.push(current.clone());
        }
        dirs
    }

    fn mkdirs_all(&mut self, path: &str) {
        for dir in Self::parent_dirs(path) {
            self.dirs.insert(dir);
        }
        self.dirs.insert(normalize(path));
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn parent_of(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

fn not_found(message: String) -> ApiError {
    ApiError::Status {
        status: 404,
        error_code: Some(RESOURCE_DOES_NOT_EXIST.to_string()),
        message,
    }
}

fn bad_request(error_code: &str, message: String) -> ApiError {
    ApiError::Status {
        status: 400,
        error_code: Some(error_code.to_string()),
        message,
    }
}

fn worker_count(info: &ClusterInfo) -> u32 {
    info.autoscale
        .map_or_else(|| info.num_workers.unwrap_or(0), |a| a.min_workers)
}

fn node(id: &str) -> SparkNode {
    SparkNode {
        node_id: Some(id.to_string()),
        instance_id: Some(format!("i-{id}")),
        private_ip: Some("10.0.0.1".to_string()),
        public_dns: None,
        start_timestamp: None,
    }
}

fn apply_state(info: &mut ClusterInfo, state: ClusterState) {
    info.state = state;
    match state {
        ClusterState::Running => {
            let workers = worker_count(info);
            info.driver = Some(node("driver"));
            info.executors = (0..workers)
                .map(|i| node(&format!("executor-{i}")))
                .collect();
        }
        ClusterState::Terminated | ClusterState::Error => {
            info.driver = None;
            info.executors.clear();
        }
        _ => {}
    }
}

/// In-memory [`Backend`] for tests.
///
/// Cloning yields another handle on the same state.
#[derive(Debug, Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create an empty platform with a default catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::new())),
        }
    }

    /// Set how many reads a transitional state survives before settling.
    #[must_use]
    pub fn with_settle_after_reads(self, reads: u32) -> Self {
        self.state.lock().settle_after_reads = reads;
        self
    }

    /// Number of calls made to an endpoint, e.g. `"clusters/get"`.
    #[must_use]
    pub fn request_count(&self, endpoint: &str) -> usize {
        self.state.lock().calls.get(endpoint).copied().unwrap_or(0)
    }

    /// Number of calls made to any endpoint.
    #[must_use]
    pub fn total_requests(&self) -> usize {
        self.state.lock().calls.values().sum()
    }

    /// Make every call to `endpoint` fail with the given HTTP status.
    pub fn fail_with_status(&self, endpoint: &str, status: u16) {
        self.state.lock().failures.insert(endpoint.to_string(), status);
    }

    /// Remove an injected failure.
    pub fn clear_failure(&self, endpoint: &str) {
        self.state.lock().failures.remove(endpoint);
    }

    /// Replace the advertised runtime versions.
    pub fn set_spark_versions(&self, versions: SparkVersionsResponse) {
        self.state.lock().spark_versions = versions;
    }

    /// Replace the advertised node types.
    pub fn set_node_types(&self, node_types: NodeTypesResponse) {
        self.state.lock().node_types = node_types;
    }

    /// Replace the advertised zones.
    pub fn set_zones(&self, zones: ZonesResponse) {
        self.state.lock().zones = zones;
    }

    // ===== Clusters =====

    /// Insert a cluster record as is.
    pub fn put_cluster(&self, info: ClusterInfo) {
        self.state.lock().clusters.insert(
            info.cluster_id.as_str().to_string(),
            MockCluster {
                info,
                settles_to: None,
                reads_left: 0,
            },
        );
    }

    /// Insert a running fixed-size cluster and return its id.
    #[must_use]
    pub fn add_running_cluster(&self, name: &str, num_workers: u32) -> ClusterId {
        let mut state = self.state.lock();
        let id = state.next_id();
        let cluster_id = ClusterId::new(format!("0000-000000-mock{id:04}"))
            .unwrap_or_else(|_| unreachable!("generated id is never empty"));
        let mut info = empty_cluster(cluster_id.clone());
        info.cluster_name = Some(name.to_string());
        info.spark_version = Some(MOCK_DEFAULT_SPARK_VERSION.to_string());
        info.node_type_id = Some(MOCK_DEFAULT_NODE_TYPE.to_string());
        info.num_workers = Some(num_workers);
        apply_state(&mut info, ClusterState::Running);
        state.clusters.insert(
            cluster_id.as_str().to_string(),
            MockCluster {
                info,
                settles_to: None,
                reads_left: 0,
            },
        );
        cluster_id
    }

    /// Current record of a cluster, without counting a read.
    #[must_use]
    pub fn cluster(&self, cluster_id: &ClusterId) -> Option<ClusterInfo> {
        self.state
            .lock()
            .clusters
            .get(cluster_id.as_str())
            .map(|c| c.info.clone())
    }

    /// Force a cluster's pending transition to complete now.
    pub fn settle_cluster(&self, cluster_id: &ClusterId) {
        self.state.lock().settle(cluster_id.as_str());
    }

    /// Put a cluster into `ERROR`.
    pub fn fail_cluster(&self, cluster_id: &ClusterId) {
        let mut state = self.state.lock();
        if let Some(cluster) = state.clusters.get_mut(cluster_id.as_str()) {
            cluster.settles_to = None;
            apply_state(&mut cluster.info, ClusterState::Error);
        }
    }

    // ===== Jobs and runs =====

    /// Insert a job with the given settings and return its id.
    #[must_use]
    pub fn put_job(&self, settings: JobSettings) -> JobId {
        let mut state = self.state.lock();
        let job_id = JobId::new(state.next_id());
        state.jobs.insert(
            job_id,
            JobInfo {
                job_id,
                settings,
                creator_user_name: Some("mock@example.com".to_string()),
                created_time: None,
            },
        );
        job_id
    }

    /// Current record of a job.
    #[must_use]
    pub fn job(&self, job_id: JobId) -> Option<JobInfo> {
        self.state.lock().jobs.get(&job_id).cloned()
    }

    /// Number of jobs currently defined.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.state.lock().jobs.len()
    }

    /// Insert a run record as is.
    pub fn put_run(&self, info: RunInfo) {
        let reads = self.state.lock().settle_after_reads;
        self.state.lock().runs.insert(
            info.run_id,
            MockRun {
                info,
                output: RunOutput::default(),
                reads_left: reads,
            },
        );
    }

    /// Current record of a run, without counting a read.
    #[must_use]
    pub fn run(&self, run_id: RunId) -> Option<RunInfo> {
        self.state.lock().runs.get(&run_id).map(|r| r.info.clone())
    }

    /// Set the output returned for a run.
    pub fn set_run_output(&self, run_id: RunId, output: RunOutput) {
        if let Some(run) = self.state.lock().runs.get_mut(&run_id) {
            run.output = output;
        }
    }

    /// Move a run to `TERMINATED` with the given result.
    pub fn finish_run(&self, run_id: RunId, result: RunResultState) {
        if let Some(run) = self.state.lock().runs.get_mut(&run_id) {
            run.info.state.life_cycle_state = RunLifeCycleState::Terminated;
            run.info.state.result_state = Some(result);
            run.reads_left = 0;
        }
    }

    // ===== Libraries =====

    /// Library statuses on a cluster, without counting a read.
    #[must_use]
    pub fn library_statuses(&self, cluster_id: &ClusterId) -> Vec<LibraryFullStatus> {
        self.state
            .lock()
            .libraries
            .get(cluster_id.as_str())
            .map(|libs| libs.iter().map(|l| l.status.clone()).collect())
            .unwrap_or_default()
    }

    /// Force a library's status on a cluster.
    pub fn set_library_status(
        &self,
        cluster_id: &ClusterId,
        library: &LibrarySpec,
        status: LibraryInstallStatus,
    ) {
        let mut state = self.state.lock();
        if let Some(libraries) = state.libraries.get_mut(cluster_id.as_str()) {
            for entry in libraries.iter_mut().filter(|l| &l.status.library == library) {
                entry.status.status = status;
                entry.reads_left = 0;
            }
        }
    }

    // ===== Workspace and file store =====

    /// Insert a notebook, creating its parent directories.
    pub fn add_notebook(&self, path: &str, language: Language, content: &[u8]) {
        let mut state = self.state.lock();
        let id = state.next_id();
        state.mkdirs_all(&parent_of(path));
        state.objects.insert(
            path.to_string(),
            MockObject {
                info: ObjectInfo {
                    object_type: ObjectType::Notebook,
                    path: path.to_string(),
                    language: Some(language),
                    object_id: Some(id),
                },
                content: content.to_vec(),
            },
        );
    }

    /// Insert a file into the file store, creating its parent directories.
    pub fn add_file(&self, path: &str, content: &[u8]) {
        let mut state = self.state.lock();
        state.mkdirs_all(&parent_of(path));
        state.files.insert(path.to_string(), content.to_vec());
    }

    /// Content of a file-store file.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(path).cloned()
    }
}

fn empty_cluster(cluster_id: ClusterId) -> ClusterInfo {
    ClusterInfo {
        cluster_id,
        cluster_name: None,
        spark_version: None,
        node_type_id: None,
        driver_node_type_id: None,
        num_workers: None,
        autoscale: None,
        autotermination_minutes: None,
        state: ClusterState::Pending,
        state_message: None,
        driver: None,
        executors: Vec::new(),
        custom_tags: BTreeMap::new(),
        spark_conf: BTreeMap::new(),
        init_scripts: Vec::new(),
        aws_attributes: None,
        creator_user_name: Some("mock@example.com".to_string()),
        start_time: None,
        terminated_time: None,
    }
}

impl Backend for MockBackend {
    fn clusters(&self) -> Arc<dyn ClustersApi> {
        Arc::new(self.clone())
    }

    fn jobs(&self) -> Arc<dyn JobsApi> {
        Arc::new(self.clone())
    }

    fn libraries(&self) -> Arc<dyn LibrariesApi> {
        Arc::new(self.clone())
    }

    fn workspace(&self) -> Arc<dyn WorkspaceApi> {
        Arc::new(self.clone())
    }

    fn dbfs(&self) -> Arc<dyn DbfsApi> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl ClustersApi for MockBackend {
    async fn create(&self, spec: &NewCluster) -> Result<ClusterId> {
        let mut state = self.state.lock();
        state.enter("clusters/create")?;

        if spec.spark_version.is_none() || spec.node_type_id.is_none() {
            return Err(bad_request(
                "INVALID_PARAMETER_VALUE",
                "spark_version and node_type_id are required".to_string(),
            ));
        }
        if spec.num_workers.is_some() == spec.autoscale.is_some() {
            return Err(bad_request(
                "INVALID_PARAMETER_VALUE",
                "exactly one of num_workers and autoscale is required".to_string(),
            ));
        }

        let id = state.next_id();
        let cluster_id = ClusterId::new(format!("0000-000000-mock{id:04}"))
            .unwrap_or_else(|_| unreachable!("generated id is never empty"));
        let mut info = empty_cluster(cluster_id.clone());
        info.cluster_name.clone_from(&spec.cluster_name);
        info.spark_version.clone_from(&spec.spark_version);
        info.node_type_id.clone_from(&spec.node_type_id);
        info.driver_node_type_id = spec
            .driver_node_type_id
            .clone()
            .or_else(|| spec.node_type_id.clone());
        info.num_workers = spec.num_workers;
        info.autoscale = spec.autoscale;
        info.autotermination_minutes = spec.autotermination_minutes;
        info.custom_tags.clone_from(&spec.custom_tags);
        info.spark_conf.clone_from(&spec.spark_conf);
        info.init_scripts.clone_from(&spec.init_scripts);
        info.aws_attributes.clone_from(&spec.aws_attributes);

        let reads = state.settle_after_reads;
        state.clusters.insert(
            cluster_id.as_str().to_string(),
            MockCluster {
                info,
                settles_to: Some(ClusterState::Running),
                reads_left: reads,
            },
        );
        Ok(cluster_id)
    }

    async fn get(&self, cluster_id: &ClusterId) -> Result<ClusterInfo> {
        let mut state = self.state.lock();
        state.enter("clusters/get")?;

        let cluster = state.cluster_mut(cluster_id)?;
        if cluster.settles_to.is_some() {
            if cluster.reads_left == 0 {
                state.settle(cluster_id.as_str());
            } else {
                cluster.reads_left -= 1;
            }
        }
        Ok(state.cluster_mut(cluster_id)?.info.clone())
    }

    async fn list(&self) -> Result<Vec<ClusterInfo>> {
        let mut state = self.state.lock();
        state.enter("clusters/list")?;
        Ok(state.clusters.values().map(|c| c.info.clone()).collect())
    }

    async fn resize(&self, request: &ResizeClusterRequest) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("clusters/resize")?;

        let cluster = state.cluster_mut(&request.cluster_id)?;
        if cluster.info.state != ClusterState::Running {
            return Err(bad_request(
                "INVALID_STATE",
                format!(
                    "Cluster {} is in unexpected state {}",
                    request.cluster_id, cluster.info.state
                ),
            ));
        }
        cluster.info.num_workers = request.num_workers;
        cluster.info.autoscale = request.autoscale;
        state.begin_transition(
            &request.cluster_id,
            ClusterState::Resizing,
            ClusterState::Running,
        )
    }

    async fn restart(&self, cluster_id: &ClusterId) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("clusters/restart")?;

        let current = state.cluster_mut(cluster_id)?.info.state;
        if current != ClusterState::Running {
            return Err(bad_request(
                "INVALID_STATE",
                format!("Cluster {cluster_id} is in unexpected state {current}"),
            ));
        }
        state.begin_transition(cluster_id, ClusterState::Restarting, ClusterState::Running)
    }

    async fn terminate(&self, cluster_id: &ClusterId) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("clusters/delete")?;

        let current = state.cluster_mut(cluster_id)?.info.state;
        if matches!(current, ClusterState::Terminated | ClusterState::Error) {
            return Err(bad_request(
                "INVALID_STATE",
                format!("Cluster {cluster_id} is in unexpected state {current}"),
            ));
        }
        state.begin_transition(
            cluster_id,
            ClusterState::Terminating,
            ClusterState::Terminated,
        )
    }

    async fn permanent_delete(&self, cluster_id: &ClusterId) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("clusters/permanent-delete")?;

        state
            .clusters
            .remove(cluster_id.as_str())
            .map(|_| ())
            .ok_or_else(|| not_found(format!("Cluster {cluster_id} does not exist")))
    }

    async fn spark_versions(&self) -> Result<SparkVersionsResponse> {
        let mut state = self.state.lock();
        state.enter("clusters/spark-versions")?;
        Ok(state.spark_versions.clone())
    }

    async fn node_types(&self) -> Result<NodeTypesResponse> {
        let mut state = self.state.lock();
        state.enter("clusters/list-node-types")?;
        Ok(state.node_types.clone())
    }

    async fn zones(&self) -> Result<ZonesResponse> {
        let mut state = self.state.lock();
        state.enter("clusters/list-zones")?;
        Ok(state.zones.clone())
    }
}

#[async_trait]
impl JobsApi for MockBackend {
    async fn create(&self, settings: &JobSettings) -> Result<JobId> {
        {
            let mut state = self.state.lock();
            state.enter("jobs/create")?;
        }
        Ok(self.put_job(settings.clone()))
    }

    async fn get(&self, job_id: JobId) -> Result<JobInfo> {
        let mut state = self.state.lock();
        state.enter("jobs/get")?;
        state
            .jobs
            .get(&job_id)
            .cloned()
            .ok_or_else(|| not_found(format!("Job {job_id} does not exist.")))
    }

    async fn run_now(&self, request: &RunNowRequest) -> Result<RunNowResponse> {
        let mut state = self.state.lock();
        state.enter("jobs/run-now")?;

        let job = state
            .jobs
            .get(&request.job_id)
            .cloned()
            .ok_or_else(|| not_found(format!("Job {} does not exist.", request.job_id)))?;
        let settings = job.settings;

        let mut task = RunTask {
            notebook_task: settings.notebook_task,
            spark_jar_task: settings.spark_jar_task,
            spark_python_task: settings.spark_python_task,
            spark_submit_task: settings.spark_submit_task,
        };
        if let (Some(notebook), Some(params)) = (&mut task.notebook_task, &request.notebook_params) {
            notebook.base_parameters.extend(params.clone());
        }
        if let (Some(jar), Some(params)) = (&mut task.spark_jar_task, &request.jar_params) {
            jar.parameters.clone_from(params);
        }
        if let (Some(python), Some(params)) = (&mut task.spark_python_task, &request.python_params)
        {
            python.parameters.clone_from(params);
        }
        if let (Some(submit), Some(params)) =
            (&mut task.spark_submit_task, &request.spark_submit_params)
        {
            submit.parameters = Some(params.clone());
        }

        let number_in_job = i64::try_from(
            state
                .runs
                .values()
                .filter(|r| r.info.job_id == request.job_id)
                .count(),
        )
        .unwrap_or(i64::MAX)
            + 1;
        let run_id = RunId::new(state.next_id());
        let info = RunInfo {
            job_id: request.job_id,
            run_id,
            number_in_job: Some(number_in_job),
            creator_user_name: job.creator_user_name,
            cluster_instance: settings.existing_cluster_id.clone().map(|id| ClusterInstance {
                cluster_id: Some(id),
                spark_context_id: None,
            }),
            cluster_spec: RunClusterSpec {
                existing_cluster_id: settings.existing_cluster_id,
                new_cluster: settings.new_cluster,
                libraries: settings.libraries,
            },
            task,
            state: RunState {
                life_cycle_state: RunLifeCycleState::Pending,
                result_state: None,
                state_message: Some("Waiting for cluster".to_string()),
            },
            start_time: None,
            setup_duration: None,
            execution_duration: None,
            cleanup_duration: None,
            trigger: Some("ONE_TIME".to_string()),
            run_page_url: Some(format!("https://mock.example.com/#job/{}/run/{number_in_job}", request.job_id)),
        };

        let reads = state.settle_after_reads;
        state.runs.insert(
            run_id,
            MockRun {
                info,
                output: RunOutput::default(),
                reads_left: reads,
            },
        );
        Ok(RunNowResponse {
            run_id,
            number_in_job: Some(number_in_job),
        })
    }

    async fn get_run(&self, run_id: RunId) -> Result<RunInfo> {
        let mut state = self.state.lock();
        state.enter("jobs/runs/get")?;

        let run = state
            .runs
            .get_mut(&run_id)
            .ok_or_else(|| not_found(format!("Run {run_id} does not exist.")))?;
        if !run.info.state.life_cycle_state.is_terminal() {
            if run.reads_left == 0 {
                run.info.state = RunState {
                    life_cycle_state: RunLifeCycleState::Terminated,
                    result_state: Some(RunResultState::Success),
                    state_message: None,
                };
            } else {
                run.reads_left -= 1;
            }
        }
        Ok(run.info.clone())
    }

    async fn get_run_output(&self, run_id: RunId) -> Result<RunOutput> {
        let mut state = self.state.lock();
        state.enter("jobs/runs/get-output")?;

        let run = state
            .runs
            .get(&run_id)
            .ok_or_else(|| not_found(format!("Run {run_id} does not exist.")))?;
        let mut output = run.output.clone();
        output.metadata = Some(run.info.clone());
        Ok(output)
    }

    async fn delete(&self, job_id: JobId) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("jobs/delete")?;
        state
            .jobs
            .remove(&job_id)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("Job {job_id} does not exist.")))
    }
}

#[async_trait]
impl LibrariesApi for MockBackend {
    async fn install(&self, cluster_id: &ClusterId, libraries: &[LibrarySpec]) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("libraries/install")?;
        state.cluster_mut(cluster_id)?;

        let reads = state.settle_after_reads;
        let entries = state
            .libraries
            .entry(cluster_id.as_str().to_string())
            .or_default();
        for library in libraries {
            if let Some(existing) = entries.iter_mut().find(|l| &l.status.library == library) {
                if existing.status.status == LibraryInstallStatus::UninstallOnRestart {
                    existing.status.status = LibraryInstallStatus::Installed;
                }
                continue;
            }
            entries.push(MockLibrary {
                status: LibraryFullStatus {
                    library: library.clone(),
                    status: LibraryInstallStatus::Pending,
                    messages: Vec::new(),
                    is_library_for_all_clusters: false,
                },
                reads_left: reads,
            });
        }
        Ok(())
    }

    async fn uninstall(&self, cluster_id: &ClusterId, libraries: &[LibrarySpec]) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("libraries/uninstall")?;
        state.cluster_mut(cluster_id)?;

        if let Some(entries) = state.libraries.get_mut(cluster_id.as_str()) {
            for entry in entries
                .iter_mut()
                .filter(|l| libraries.contains(&l.status.library))
            {
                entry.status.status = LibraryInstallStatus::UninstallOnRestart;
                entry.reads_left = 0;
            }
        }
        Ok(())
    }

    async fn cluster_status(&self, cluster_id: &ClusterId) -> Result<ClusterLibraryStatuses> {
        let mut state = self.state.lock();
        state.enter("libraries/cluster-status")?;
        let running = state.cluster_mut(cluster_id)?.info.state == ClusterState::Running;

        let entries = state
            .libraries
            .entry(cluster_id.as_str().to_string())
            .or_default();
        for entry in entries.iter_mut().filter(|l| !l.status.status.is_settled()) {
            if !running {
                continue;
            }
            if entry.reads_left == 0 {
                entry.status.status = LibraryInstallStatus::Installed;
            } else {
                entry.reads_left -= 1;
                entry.status.status = LibraryInstallStatus::Installing;
            }
        }

        Ok(ClusterLibraryStatuses {
            cluster_id: cluster_id.clone(),
            library_statuses: entries.iter().map(|l| l.status.clone()).collect(),
        })
    }
}

#[async_trait]
impl WorkspaceApi for MockBackend {
    async fn get_status(&self, path: &str) -> Result<ObjectInfo> {
        let mut state = self.state.lock();
        state.enter("workspace/get-status")?;

        if let Some(object) = state.objects.get(path) {
            return Ok(object.info.clone());
        }
        if state.dirs.contains(&normalize(path)) {
            return Ok(ObjectInfo {
                object_type: ObjectType::Directory,
                path: normalize(path),
                language: None,
                object_id: None,
            });
        }
        Err(not_found(format!("Path ({path}) doesn't exist.")))
    }

    async fn list(&self, path: &str) -> Result<Vec<ObjectInfo>> {
        let mut state = self.state.lock();
        state.enter("workspace/list")?;

        let dir = normalize(path);
        if !state.dirs.contains(&dir) {
            return Err(not_found(format!("Path ({path}) doesn't exist.")));
        }
        let mut objects: Vec<ObjectInfo> = state
            .dirs
            .iter()
            .filter(|d| **d != dir && parent_of(d) == dir)
            .map(|d| ObjectInfo {
                object_type: ObjectType::Directory,
                path: d.clone(),
                language: None,
                object_id: None,
            })
            .collect();
        objects.extend(
            state
                .objects
                .values()
                .filter(|o| parent_of(&o.info.path) == dir)
                .map(|o| o.info.clone()),
        );
        Ok(objects)
    }

    async fn mkdirs(&self, path: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("workspace/mkdirs")?;
        state.mkdirs_all(path);
        Ok(())
    }

    async fn delete(&self, path: &str, recursive: bool) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("workspace/delete")?;

        if state.objects.remove(path).is_some() {
            return Ok(());
        }
        let dir = normalize(path);
        if !state.dirs.contains(&dir) {
            return Err(not_found(format!("Path ({path}) doesn't exist.")));
        }
        let prefix = format!("{dir}/");
        let has_children = state.objects.keys().any(|p| p.starts_with(&prefix))
            || state.dirs.iter().any(|d| d.starts_with(&prefix));
        if has_children && !recursive {
            return Err(bad_request(
                "DIRECTORY_NOT_EMPTY",
                format!("Folder ({path}) is not empty"),
            ));
        }
        state.objects.retain(|p, _| !p.starts_with(&prefix));
        state.dirs.retain(|d| !d.starts_with(&prefix) && *d != dir);
        Ok(())
    }

    async fn export(&self, path: &str, _format: ExportFormat) -> Result<Vec<u8>> {
        let mut state = self.state.lock();
        state.enter("workspace/export")?;
        state
            .objects
            .get(path)
            .map(|o| o.content.clone())
            .ok_or_else(|| not_found(format!("Path ({path}) doesn't exist.")))
    }

    async fn import(&self, notebook: &NotebookImport) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("workspace/import")?;

        if state.objects.contains_key(&notebook.path) && !notebook.overwrite {
            return Err(bad_request(
                "RESOURCE_ALREADY_EXISTS",
                format!("Path ({}) already exists.", notebook.path),
            ));
        }
        if !state.dirs.contains(&parent_of(&notebook.path)) {
            return Err(not_found(format!(
                "The parent folder ({}) does not exist.",
                parent_of(&notebook.path)
            )));
        }
        let id = state.next_id();
        state.objects.insert(
            notebook.path.clone(),
            MockObject {
                info: ObjectInfo {
                    object_type: ObjectType::Notebook,
                    path: notebook.path.clone(),
                    language: notebook.language,
                    object_id: Some(id),
                },
                content: notebook.content.clone(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl DbfsApi for MockBackend {
    async fn create(&self, path: &str, overwrite: bool) -> Result<i64> {
        let mut state = self.state.lock();
        state.enter("dbfs/create")?;

        if state.files.contains_key(path) && !overwrite {
            return Err(bad_request(
                "RESOURCE_ALREADY_EXISTS",
                format!("A file or directory already exists at the input path {path}."),
            ));
        }
        let handle = state.next_id();
        state.handles.insert(handle, (path.to_string(), Vec::new()));
        Ok(handle)
    }

    async fn add_block(&self, handle: i64, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("dbfs/add-block")?;

        let (_, buffer) = state
            .handles
            .get_mut(&handle)
            .ok_or_else(|| not_found(format!("Handle {handle} does not exist.")))?;
        buffer.extend_from_slice(data);
        Ok(())
    }

    async fn close(&self, handle: i64) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("dbfs/close")?;

        let (path, buffer) = state
            .handles
            .remove(&handle)
            .ok_or_else(|| not_found(format!("Handle {handle} does not exist.")))?;
        state.mkdirs_all(&parent_of(&path));
        state.files.insert(path, buffer);
        Ok(())
    }

    async fn read(&self, path: &str, offset: u64, length: u64) -> Result<Vec<u8>> {
        let mut state = self.state.lock();
        state.enter("dbfs/read")?;

        let content = state
            .files
            .get(path)
            .ok_or_else(|| not_found(format!("No file or directory exists on path {path}.")))?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(content.len());
        let end = usize::try_from(length)
            .map_or(content.len(), |len| start.saturating_add(len))
            .min(content.len());
        Ok(content[start..end].to_vec())
    }

    async fn get_status(&self, path: &str) -> Result<FileInfo> {
        let mut state = self.state.lock();
        state.enter("dbfs/get-status")?;

        if let Some(content) = state.files.get(path) {
            return Ok(FileInfo {
                path: path.to_string(),
                is_dir: false,
                file_size: content.len() as u64,
            });
        }
        if state.dirs.contains(&normalize(path)) {
            return Ok(FileInfo {
                path: normalize(path),
                is_dir: true,
                file_size: 0,
            });
        }
        Err(not_found(format!("No file or directory exists on path {path}.")))
    }

    async fn delete(&self, path: &str, recursive: bool) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("dbfs/delete")?;

        if state.files.remove(path).is_some() {
            return Ok(());
        }
        let dir = normalize(path);
        let prefix = format!("{dir}/");
        let has_children = state.files.keys().any(|p| p.starts_with(&prefix));
        if has_children && !recursive {
            return Err(bad_request(
                "IO_ERROR",
                format!("Directory {path} is not empty"),
            ));
        }
        state.files.retain(|p, _| !p.starts_with(&prefix));
        state.dirs.retain(|d| !d.starts_with(&prefix) && *d != dir);
        Ok(())
    }

    async fn move_path(&self, source: &str, destination: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("dbfs/move")?;

        if state.files.contains_key(destination) {
            return Err(bad_request(
                "RESOURCE_ALREADY_EXISTS",
                format!("A file or directory already exists at the input path {destination}."),
            ));
        }
        let content = state
            .files
            .remove(source)
            .ok_or_else(|| not_found(format!("No file or directory exists on path {source}.")))?;
        state.mkdirs_all(&parent_of(destination));
        state.files.insert(destination.to_string(), content);
        Ok(())
    }

    async fn mkdirs(&self, path: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.enter("dbfs/mkdirs")?;
        state.mkdirs_all(path);
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Vec<FileInfo>> {
        let mut state = self.state.lock();
        state.enter("dbfs/list")?;

        let dir = normalize(path);
        if !state.dirs.contains(&dir) {
            return Err(not_found(format!("No file or directory exists on path {path}.")));
        }
        let mut files: Vec<FileInfo> = state
            .dirs
            .iter()
            .filter(|d| **d != dir && parent_of(d) == dir)
            .map(|d| FileInfo {
                path: d.clone(),
                is_dir: true,
                file_size: 0,
            })
            .collect();
        files.extend(
            state
                .files
                .iter()
                .filter(|(p, _)| parent_of(p) == dir)
                .map(|(p, content)| FileInfo {
                    path: p.clone(),
                    is_dir: false,
                    file_size: content.len() as u64,
                }),
        );
        Ok(files)
    }
}
