//! Jobs and their seven variants.
//!
//! A job is a [`JobCore`] combined with an execution [`Mode`] and a [`Task`].
//! The mode says where it runs ([`Interactive`] on an existing cluster or
//! [`Automated`] on its own cluster); the task says what runs. The closed
//! [`Job`] union names every supported combination:
//!
//! | Mode        | Notebook | Jar | Python | Spark-submit |
//! |-------------|----------|-----|--------|--------------|
//! | Interactive | yes      | yes | yes    | no           |
//! | Automated   | yes      | yes | yes    | yes          |
//!
//! Running a job never changes it; it yields a [`Run`] of the same variant.

mod builder;
pub(crate) mod resolver;
mod run;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sparkdeck_api::types::{
    JobInfo, JobSettings, LibrarySpec, NewCluster, NotebookTaskSettings, RunNowRequest,
    SparkJarTaskSettings, SparkPythonTaskSettings, SparkSubmitTaskSettings,
};
use sparkdeck_api::JobsApi;
use sparkdeck_core::JobId;

pub use builder::JobBuilder;
pub use run::{Run, TypedRun};

use crate::cluster::Cluster;
use crate::error::{Error, Family, Result};
use crate::library::Library;
use crate::workspace::{Notebook, PythonScript};

// ===== Classification =====

/// Where a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// On an existing cluster.
    Interactive,
    /// On a cluster created for each run.
    Automated,
}

/// What a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// A workspace notebook.
    Notebook,
    /// A main class from a jar.
    Jar,
    /// A python script.
    Python,
    /// Raw spark-submit arguments.
    SparkSubmit,
}

/// The seven supported (mode, task) combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobVariant {
    /// Notebook on an existing cluster.
    InteractiveNotebook,
    /// Jar on an existing cluster.
    InteractiveJar,
    /// Python on an existing cluster.
    InteractivePython,
    /// Notebook on a new cluster.
    AutomatedNotebook,
    /// Jar on a new cluster.
    AutomatedJar,
    /// Python on a new cluster.
    AutomatedPython,
    /// Spark-submit on a new cluster.
    AutomatedSparkSubmit,
}

impl JobVariant {
    /// Select the variant for a mode and task kind.
    ///
    /// `None` for interactive spark-submit, which the platform does not offer.
    #[must_use]
    pub const fn from_pair(mode: ExecutionMode, kind: TaskKind) -> Option<Self> {
        use ExecutionMode::{Automated, Interactive};
        use TaskKind::{Jar, Notebook, Python, SparkSubmit};

        match (mode, kind) {
            (Interactive, Notebook) => Some(Self::InteractiveNotebook),
            (Interactive, Jar) => Some(Self::InteractiveJar),
            (Interactive, Python) => Some(Self::InteractivePython),
            (Automated, Notebook) => Some(Self::AutomatedNotebook),
            (Automated, Jar) => Some(Self::AutomatedJar),
            (Automated, Python) => Some(Self::AutomatedPython),
            (Automated, SparkSubmit) => Some(Self::AutomatedSparkSubmit),
            (Interactive, SparkSubmit) => None,
        }
    }

    /// The execution mode.
    #[must_use]
    pub const fn mode(self) -> ExecutionMode {
        match self {
            Self::InteractiveNotebook | Self::InteractiveJar | Self::InteractivePython => {
                ExecutionMode::Interactive
            }
            Self::AutomatedNotebook
            | Self::AutomatedJar
            | Self::AutomatedPython
            | Self::AutomatedSparkSubmit => ExecutionMode::Automated,
        }
    }

    /// The task kind.
    #[must_use]
    pub const fn kind(self) -> TaskKind {
        match self {
            Self::InteractiveNotebook | Self::AutomatedNotebook => TaskKind::Notebook,
            Self::InteractiveJar | Self::AutomatedJar => TaskKind::Jar,
            Self::InteractivePython | Self::AutomatedPython => TaskKind::Python,
            Self::AutomatedSparkSubmit => TaskKind::SparkSubmit,
        }
    }
}

impl fmt::Display for JobVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode() {
            ExecutionMode::Interactive => "interactive",
            ExecutionMode::Automated => "automated",
        };
        let kind = match self.kind() {
            TaskKind::Notebook => "notebook",
            TaskKind::Jar => "jar",
            TaskKind::Python => "python",
            TaskKind::SparkSubmit => "spark-submit",
        };
        write!(f, "{mode} {kind}")
    }
}

// ===== Modes =====

/// Execution-mode capability of a job.
pub trait Mode: Clone + fmt::Debug + Send + Sync + 'static {
    /// The mode this type stands for.
    const MODE: ExecutionMode;

    /// Write the compute target into job settings.
    fn apply(&self, settings: &mut JobSettings);

    /// The existing cluster, for interactive jobs.
    fn cluster(&self) -> Option<&Cluster>;
}

/// Runs on an existing cluster.
#[derive(Debug, Clone)]
pub struct Interactive {
    cluster: Cluster,
}

impl Interactive {
    pub(crate) fn new(cluster: Cluster) -> Self {
        Self { cluster }
    }
}

impl Mode for Interactive {
    const MODE: ExecutionMode = ExecutionMode::Interactive;

    fn apply(&self, settings: &mut JobSettings) {
        settings.existing_cluster_id = Some(self.cluster.id().clone());
    }

    fn cluster(&self) -> Option<&Cluster> {
        Some(&self.cluster)
    }
}

/// Runs on a cluster created for each run.
#[derive(Debug, Clone, PartialEq)]
pub struct Automated {
    new_cluster: NewCluster,
}

impl Automated {
    pub(crate) fn new(new_cluster: NewCluster) -> Self {
        Self { new_cluster }
    }

    /// The cluster specification used for each run.
    #[must_use]
    pub fn new_cluster(&self) -> &NewCluster {
        &self.new_cluster
    }
}

impl Mode for Automated {
    const MODE: ExecutionMode = ExecutionMode::Automated;

    fn apply(&self, settings: &mut JobSettings) {
        settings.new_cluster = Some(self.new_cluster.clone());
    }

    fn cluster(&self) -> Option<&Cluster> {
        None
    }
}

// ===== Tasks =====

/// Task-kind capability of a job.
pub trait Task: Clone + fmt::Debug + Send + Sync + 'static {
    /// The kind this type stands for.
    const KIND: TaskKind;

    /// Per-run parameter overrides. The default value overrides nothing.
    type Overrides: Default + Send;

    /// Write the task definition into job settings.
    fn apply(&self, settings: &mut JobSettings);

    /// Check builder input before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns a job configuration error naming the offending field.
    fn validate(&self) -> Result<()>;

    /// Add overrides to a run-now request and return the task as it will run.
    fn override_run(&self, request: &mut RunNowRequest, overrides: Self::Overrides) -> Self;

    /// Where a local file attached to the builder is uploaded, if anywhere.
    fn upload_target(&self) -> Option<&str> {
        None
    }

    /// Script the task runs, checked against the file store before create.
    fn script_uri(&self) -> Option<&str> {
        None
    }
}

/// Runs a workspace notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookTask {
    notebook: Notebook,
    base_parameters: BTreeMap<String, String>,
}

impl NotebookTask {
    pub(crate) fn new(notebook: Notebook) -> Self {
        Self {
            notebook,
            base_parameters: BTreeMap::new(),
        }
    }

    /// The notebook.
    #[must_use]
    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    /// Widget values passed on every run.
    #[must_use]
    pub fn base_parameters(&self) -> &BTreeMap<String, String> {
        &self.base_parameters
    }
}

impl Task for NotebookTask {
    const KIND: TaskKind = TaskKind::Notebook;
    type Overrides = BTreeMap<String, String>;

    fn apply(&self, settings: &mut JobSettings) {
        settings.notebook_task = Some(NotebookTaskSettings {
            notebook_path: Some(self.notebook.path().to_string()),
            base_parameters: self.base_parameters.clone(),
        });
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn override_run(&self, request: &mut RunNowRequest, overrides: Self::Overrides) -> Self {
        let mut task = self.clone();
        if !overrides.is_empty() {
            task.base_parameters.extend(overrides.clone());
            request.notebook_params = Some(overrides);
        }
        task
    }
}

/// Runs a main class from a jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JarTask {
    jar_uri: Option<String>,
    main_class_name: String,
    parameters: Vec<String>,
}

impl JarTask {
    pub(crate) fn new(jar_uri: Option<String>, main_class_name: impl Into<String>) -> Self {
        Self {
            jar_uri,
            main_class_name: main_class_name.into(),
            parameters: Vec::new(),
        }
    }

    /// The jar holding the main class, attached as a job library.
    #[must_use]
    pub fn jar_uri(&self) -> Option<&str> {
        self.jar_uri.as_deref()
    }

    /// Fully qualified main class.
    #[must_use]
    pub fn main_class_name(&self) -> &str {
        &self.main_class_name
    }

    /// Arguments passed to `main`.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
}

impl Task for JarTask {
    const KIND: TaskKind = TaskKind::Jar;
    type Overrides = Vec<String>;

    fn apply(&self, settings: &mut JobSettings) {
        settings.spark_jar_task = Some(SparkJarTaskSettings {
            main_class_name: Some(self.main_class_name.clone()),
            parameters: self.parameters.clone(),
        });
        if let Some(uri) = &self.jar_uri {
            let spec = LibrarySpec {
                jar: Some(uri.clone()),
                ..LibrarySpec::default()
            };
            // Resolution reads the task jar from the first jar library.
            settings.libraries.retain(|library| library != &spec);
            settings.libraries.insert(0, spec);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.main_class_name.trim().is_empty() {
            return Err(Error::MissingField {
                family: Family::Job,
                field: "spark_jar_task.main_class_name",
            });
        }
        if self.jar_uri.as_deref().is_some_and(|uri| uri.trim().is_empty()) {
            return Err(Error::config(Family::Job, "jar URI is empty"));
        }
        Ok(())
    }

    fn override_run(&self, request: &mut RunNowRequest, overrides: Self::Overrides) -> Self {
        let mut task = self.clone();
        if !overrides.is_empty() {
            task.parameters.clone_from(&overrides);
            request.jar_params = Some(overrides);
        }
        task
    }

    fn upload_target(&self) -> Option<&str> {
        self.jar_uri.as_deref()
    }
}

/// Runs a python script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonTask {
    script: PythonScript,
    parameters: Vec<String>,
}

impl PythonTask {
    pub(crate) fn new(script: PythonScript) -> Self {
        Self {
            script,
            parameters: Vec::new(),
        }
    }

    /// The script.
    #[must_use]
    pub fn script(&self) -> &PythonScript {
        &self.script
    }

    /// Command-line arguments.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
}

impl Task for PythonTask {
    const KIND: TaskKind = TaskKind::Python;
    type Overrides = Vec<String>;

    fn apply(&self, settings: &mut JobSettings) {
        settings.spark_python_task = Some(SparkPythonTaskSettings {
            python_file: Some(self.script.uri().to_string()),
            parameters: self.parameters.clone(),
        });
    }

    fn validate(&self) -> Result<()> {
        if self.script.uri().trim().is_empty() {
            return Err(Error::MissingField {
                family: Family::Job,
                field: "spark_python_task.python_file",
            });
        }
        Ok(())
    }

    fn override_run(&self, request: &mut RunNowRequest, overrides: Self::Overrides) -> Self {
        let mut task = self.clone();
        if !overrides.is_empty() {
            task.parameters.clone_from(&overrides);
            request.python_params = Some(overrides);
        }
        task
    }

    fn upload_target(&self) -> Option<&str> {
        Some(self.script.uri())
    }

    fn script_uri(&self) -> Option<&str> {
        Some(self.script.uri())
    }
}

/// Runs `spark-submit` with raw arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparkSubmitTask {
    parameters: Vec<String>,
}

impl SparkSubmitTask {
    pub(crate) fn new<I, S>(parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    /// The spark-submit arguments.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
}

impl Task for SparkSubmitTask {
    const KIND: TaskKind = TaskKind::SparkSubmit;
    type Overrides = Vec<String>;

    fn apply(&self, settings: &mut JobSettings) {
        settings.spark_submit_task = Some(SparkSubmitTaskSettings {
            parameters: Some(self.parameters.clone()),
        });
    }

    fn validate(&self) -> Result<()> {
        if self.parameters.is_empty() {
            return Err(Error::MissingField {
                family: Family::Job,
                field: "spark_submit_task.parameters",
            });
        }
        Ok(())
    }

    fn override_run(&self, request: &mut RunNowRequest, overrides: Self::Overrides) -> Self {
        let mut task = self.clone();
        if !overrides.is_empty() {
            task.parameters.clone_from(&overrides);
            request.spark_submit_params = Some(overrides);
        }
        task
    }
}

// ===== Jobs =====

/// What every job has regardless of variant.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCore {
    id: JobId,
    creator: Option<String>,
    created_time: Option<i64>,
    libraries: Vec<Library>,
    settings: JobSettings,
}

impl JobCore {
    pub(crate) fn from_info(info: JobInfo) -> Self {
        let libraries = info
            .settings
            .libraries
            .iter()
            .filter_map(Library::from_spec)
            .collect();
        Self {
            id: info.job_id,
            creator: info.creator_user_name,
            created_time: info.created_time,
            libraries,
            settings: info.settings,
        }
    }

    /// The job id.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// The job name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.settings.name.as_deref()
    }

    /// Libraries installed for each run.
    #[must_use]
    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }

    /// Who created the job.
    #[must_use]
    pub fn creator(&self) -> Option<&str> {
        self.creator.as_deref()
    }

    /// When the job was created.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_time.and_then(DateTime::from_timestamp_millis)
    }

    /// The settings as stored on the platform.
    #[must_use]
    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }
}

/// A job whose mode and task are known at compile time.
#[derive(Clone)]
pub struct TypedJob<M, T> {
    core: JobCore,
    mode: M,
    task: T,
    jobs: Arc<dyn JobsApi>,
}

impl<M: fmt::Debug, T: fmt::Debug> fmt::Debug for TypedJob<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedJob")
            .field("core", &self.core)
            .field("mode", &self.mode)
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}

impl<M: Mode, T: Task> TypedJob<M, T> {
    pub(crate) fn new(core: JobCore, mode: M, task: T, jobs: Arc<dyn JobsApi>) -> Self {
        Self {
            core,
            mode,
            task,
            jobs,
        }
    }

    /// Id, name, libraries and raw settings.
    #[must_use]
    pub fn core(&self) -> &JobCore {
        &self.core
    }

    /// The job id.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.core.id
    }

    /// The job name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.core.name()
    }

    /// The execution mode.
    #[must_use]
    pub fn mode(&self) -> &M {
        &self.mode
    }

    /// The task.
    #[must_use]
    pub fn task(&self) -> &T {
        &self.task
    }

    /// The existing cluster, for interactive jobs.
    #[must_use]
    pub fn cluster(&self) -> Option<&Cluster> {
        self.mode.cluster()
    }

    /// Start a run with the job's own parameters.
    ///
    /// # Errors
    ///
    /// Returns a job configuration error wrapping the transport failure.
    pub async fn run(&self) -> Result<TypedRun<M, T>> {
        self.run_with(T::Overrides::default()).await
    }

    /// Start a run with parameter overrides.
    ///
    /// The returned run carries this job's resolved cluster and task, with
    /// the overrides applied to the task.
    ///
    /// # Errors
    ///
    /// Returns a job configuration error wrapping the transport failure.
    pub async fn run_with(&self, overrides: T::Overrides) -> Result<TypedRun<M, T>> {
        let result: Result<TypedRun<M, T>> = async {
            let mut request = RunNowRequest::new(self.id());
            let task = self.task.override_run(&mut request, overrides);
            let response = self.jobs.run_now(&request).await?;

            tracing::info!(job_id = %self.id(), run_id = %response.run_id, "Started run");

            let info = self.jobs.get_run(response.run_id).await?;
            Ok(TypedRun::new(info, self.mode.clone(), task, self.jobs.clone()))
        }
        .await;
        result.map_err(|e| e.within(Family::Job))
    }

    /// Delete the job. Runs in progress are not cancelled.
    ///
    /// # Errors
    ///
    /// Returns a job configuration error wrapping the transport failure.
    pub async fn delete(self) -> Result<()> {
        self.jobs
            .delete(self.id())
            .await
            .map_err(|e| Error::from(e).within(Family::Job))?;
        tracing::info!(job_id = %self.id(), "Deleted job");
        Ok(())
    }
}

/// A job resolved into one of the seven variants.
#[derive(Debug, Clone)]
pub enum Job {
    /// Notebook on an existing cluster.
    InteractiveNotebook(TypedJob<Interactive, NotebookTask>),
    /// Jar on an existing cluster.
    InteractiveJar(TypedJob<Interactive, JarTask>),
    /// Python on an existing cluster.
    InteractivePython(TypedJob<Interactive, PythonTask>),
    /// Notebook on a new cluster.
    AutomatedNotebook(TypedJob<Automated, NotebookTask>),
    /// Jar on a new cluster.
    AutomatedJar(TypedJob<Automated, JarTask>),
    /// Python on a new cluster.
    AutomatedPython(TypedJob<Automated, PythonTask>),
    /// Spark-submit on a new cluster.
    AutomatedSparkSubmit(TypedJob<Automated, SparkSubmitTask>),
}

/// Evaluate `$body` with `$job` bound to the typed job of any variant.
macro_rules! each_job {
    ($value:expr, $job:ident => $body:expr) => {
        match $value {
            Job::InteractiveNotebook($job) => $body,
            Job::InteractiveJar($job) => $body,
            Job::InteractivePython($job) => $body,
            Job::AutomatedNotebook($job) => $body,
            Job::AutomatedJar($job) => $body,
            Job::AutomatedPython($job) => $body,
            Job::AutomatedSparkSubmit($job) => $body,
        }
    };
}

impl Job {
    /// Which variant this is.
    #[must_use]
    pub const fn variant(&self) -> JobVariant {
        match self {
            Self::InteractiveNotebook(_) => JobVariant::InteractiveNotebook,
            Self::InteractiveJar(_) => JobVariant::InteractiveJar,
            Self::InteractivePython(_) => JobVariant::InteractivePython,
            Self::AutomatedNotebook(_) => JobVariant::AutomatedNotebook,
            Self::AutomatedJar(_) => JobVariant::AutomatedJar,
            Self::AutomatedPython(_) => JobVariant::AutomatedPython,
            Self::AutomatedSparkSubmit(_) => JobVariant::AutomatedSparkSubmit,
        }
    }

    /// Id, name, libraries and raw settings.
    #[must_use]
    pub fn core(&self) -> &JobCore {
        each_job!(self, job => job.core())
    }

    /// The job id.
    #[must_use]
    pub fn id(&self) -> JobId {
        self.core().id()
    }

    /// The job name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.core().name()
    }

    /// The existing cluster, for interactive jobs.
    #[must_use]
    pub fn cluster(&self) -> Option<&Cluster> {
        each_job!(self, job => job.cluster())
    }

    /// Start a run with the job's own parameters.
    ///
    /// # Errors
    ///
    /// Returns a job configuration error wrapping the transport failure.
    pub async fn run(&self) -> Result<Run> {
        Ok(each_job!(self, job => job.run().await?.into()))
    }

    /// Delete the job.
    ///
    /// # Errors
    ///
    /// Returns a job configuration error wrapping the transport failure.
    pub async fn delete(self) -> Result<()> {
        each_job!(self, job => job.delete().await)
    }
}

macro_rules! job_conversions {
    ($($variant:ident => $mode:ty, $task:ty;)+) => {
        $(
            impl From<TypedJob<$mode, $task>> for Job {
                fn from(job: TypedJob<$mode, $task>) -> Self {
                    Self::$variant(job)
                }
            }

            impl TryFrom<Job> for TypedJob<$mode, $task> {
                type Error = Error;

                fn try_from(job: Job) -> Result<Self> {
                    match job {
                        Job::$variant(job) => Ok(job),
                        other => Err(Error::config(
                            Family::Job,
                            format!(
                                "job {} is {}, expected {}",
                                other.id(),
                                other.variant(),
                                JobVariant::$variant
                            ),
                        )),
                    }
                }
            }
        )+
    };
}

job_conversions! {
    InteractiveNotebook => Interactive, NotebookTask;
    InteractiveJar => Interactive, JarTask;
    InteractivePython => Interactive, PythonTask;
    AutomatedNotebook => Automated, NotebookTask;
    AutomatedJar => Automated, JarTask;
    AutomatedPython => Automated, PythonTask;
    AutomatedSparkSubmit => Automated, SparkSubmitTask;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pair_but_interactive_spark_submit_is_a_variant() {
        use ExecutionMode::{Automated, Interactive};

        let kinds = [
            TaskKind::Notebook,
            TaskKind::Jar,
            TaskKind::Python,
            TaskKind::SparkSubmit,
        ];
        let mut variants = Vec::new();
        for mode in [Interactive, Automated] {
            for kind in kinds {
                if let Some(variant) = JobVariant::from_pair(mode, kind) {
                    assert_eq!(variant.mode(), mode);
                    assert_eq!(variant.kind(), kind);
                    variants.push(variant);
                }
            }
        }
        assert_eq!(variants.len(), 7);
        assert_eq!(JobVariant::from_pair(Interactive, TaskKind::SparkSubmit), None);
    }

    #[test]
    fn variant_display() {
        assert_eq!(
            JobVariant::AutomatedSparkSubmit.to_string(),
            "automated spark-submit"
        );
        assert_eq!(
            JobVariant::InteractiveNotebook.to_string(),
            "interactive notebook"
        );
    }

    #[test]
    fn jar_task_attaches_its_jar_once() {
        let task = JarTask::new(Some("dbfs:/libs/etl.jar".into()), "com.example.Main");
        let mut settings = JobSettings::default();
        task.apply(&mut settings);
        task.apply(&mut settings);

        assert_eq!(settings.libraries.len(), 1);
        assert_eq!(settings.libraries[0].jar.as_deref(), Some("dbfs:/libs/etl.jar"));
        assert_eq!(
            settings
                .spark_jar_task
                .and_then(|t| t.main_class_name)
                .as_deref(),
            Some("com.example.Main")
        );
    }

    #[test]
    fn jar_task_moves_its_jar_ahead_of_other_jars() {
        let task = JarTask::new(Some("dbfs:/libs/etl.jar".into()), "com.example.Main");
        let jar = |uri: &str| LibrarySpec {
            jar: Some(uri.into()),
            ..LibrarySpec::default()
        };
        let mut settings = JobSettings {
            libraries: vec![jar("dbfs:/libs/util.jar"), jar("dbfs:/libs/etl.jar")],
            ..JobSettings::default()
        };
        task.apply(&mut settings);

        assert_eq!(
            settings.libraries,
            [jar("dbfs:/libs/etl.jar"), jar("dbfs:/libs/util.jar")]
        );
    }

    #[test]
    fn task_validation() {
        assert!(JarTask::new(None, " ").validate().is_err());
        assert!(JarTask::new(Some(String::new()), "Main").validate().is_err());
        assert!(SparkSubmitTask::new(Vec::<String>::new()).validate().is_err());
        assert!(SparkSubmitTask::new(["--class", "Main"]).validate().is_ok());
        assert!(PythonTask::new(PythonScript::unchecked("")).validate().is_err());
    }

    #[test]
    fn overrides_reach_request_and_task() {
        let task = SparkSubmitTask::new(["a"]);
        let mut request = RunNowRequest::new(JobId::new(1));

        let unchanged = task.override_run(&mut request, Vec::new());
        assert_eq!(unchanged, task);
        assert_eq!(request.spark_submit_params, None);

        let overridden = task.override_run(&mut request, vec!["b".into()]);
        assert_eq!(overridden.parameters(), ["b".to_string()]);
        assert_eq!(request.spark_submit_params, Some(vec!["b".to_string()]));
    }
}
