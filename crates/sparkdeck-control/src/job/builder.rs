//! Job builders, one per variant.
//!
//! A builder collects the task, its compute target and the optional job
//! settings. [`JobBuilder::create`] uploads any attached local file, creates
//! the job and reads it back through the resolver, so a freshly built job and
//! a fetched one are the same value.

use std::collections::BTreeMap;
use std::path::PathBuf;

use sparkdeck_api::types::{CronSchedule, JobSettings, NewCluster};

use super::{Automated, JarTask, Mode, NotebookTask, PythonTask, Task, TypedJob};
use crate::dbfs::strip_scheme;
use crate::error::{Error, Family, Result};
use crate::library::Library;
use crate::session::Session;
use crate::workspace::PythonScript;

/// Builder for a job of mode `M` running task `T`.
#[derive(Debug)]
#[must_use]
pub struct JobBuilder<'a, M, T> {
    session: &'a Session,
    mode: Option<M>,
    task: T,
    settings: JobSettings,
    libraries: Vec<Library>,
    upload: Option<PathBuf>,
}

impl<'a, M: Mode, T: Task> JobBuilder<'a, M, T> {
    pub(crate) fn new(session: &'a Session, mode: Option<M>, task: T) -> Self {
        Self {
            session,
            mode,
            task,
            settings: JobSettings::default(),
            libraries: Vec::new(),
            upload: None,
        }
    }

    /// Display name of the job.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.settings.name = Some(name.into());
        self
    }

    /// Install a library for each run.
    pub fn library(mut self, library: Library) -> Self {
        self.libraries.push(library);
        self
    }

    /// Install several libraries for each run.
    pub fn libraries(mut self, libraries: impl IntoIterator<Item = Library>) -> Self {
        self.libraries.extend(libraries);
        self
    }

    /// Fail a run that takes longer than this.
    pub const fn timeout_seconds(mut self, seconds: u32) -> Self {
        self.settings.timeout_seconds = Some(seconds);
        self
    }

    /// Retry a failed run up to `retries` times; `-1` retries forever.
    pub const fn max_retries(mut self, retries: i32) -> Self {
        self.settings.max_retries = Some(retries);
        self
    }

    /// Minimum delay between a failure and its retry.
    pub const fn min_retry_interval_millis(mut self, millis: u32) -> Self {
        self.settings.min_retry_interval_millis = Some(millis);
        self
    }

    /// Whether a timed-out run is retried.
    pub const fn retry_on_timeout(mut self, retry: bool) -> Self {
        self.settings.retry_on_timeout = Some(retry);
        self
    }

    /// Run on a cron schedule.
    pub fn schedule(mut self, schedule: CronSchedule) -> Self {
        self.settings.schedule = Some(schedule);
        self
    }

    /// Cap on simultaneous runs.
    pub const fn max_concurrent_runs(mut self, runs: u32) -> Self {
        self.settings.max_concurrent_runs = Some(runs);
        self
    }

    /// The settings this builder would send, without contacting the platform.
    ///
    /// # Errors
    ///
    /// Returns a job configuration error if the compute target is missing or
    /// the task is invalid.
    pub fn build_settings(&self) -> Result<JobSettings> {
        let mode = self.mode.as_ref().ok_or(Error::MissingField {
            family: Family::Job,
            field: "new_cluster",
        })?;
        self.task.validate()?;

        let mut settings = self.settings.clone();
        settings.libraries = self.libraries.iter().map(Library::to_spec).collect();
        mode.apply(&mut settings);
        self.task.apply(&mut settings);
        Ok(settings)
    }

    /// Create the job and return it resolved.
    ///
    /// # Errors
    ///
    /// Returns a job configuration error whatever the cause: invalid builder
    /// input, a failed upload, a missing script, a failed create call, or a
    /// failure resolving the created job. A job that was created but cannot
    /// be resolved is deleted again.
    pub async fn create(self) -> Result<TypedJob<M, T>>
    where
        TypedJob<M, T>: TryFrom<super::Job, Error = Error>,
    {
        let result: Result<TypedJob<M, T>> = async {
            let settings = self.build_settings()?;
            self.upload_attachment().await?;
            if let Some(uri) = self.task.script_uri() {
                PythonScript::resolve(self.session.dbfs_api().as_ref(), uri).await?;
            }

            let job_id = self.session.jobs_api().create(&settings).await?;
            tracing::info!(
                %job_id,
                name = settings.name.as_deref().unwrap_or_default(),
                mode = ?M::MODE,
                kind = ?T::KIND,
                "Created job"
            );

            let resolved: Result<TypedJob<M, T>> =
                async { self.session.get_job(job_id).await?.try_into() }.await;
            if resolved.is_err() {
                if let Err(cleanup) = self.session.jobs_api().delete(job_id).await {
                    tracing::warn!(%job_id, error = %cleanup, "Failed to delete unresolved job");
                } else {
                    tracing::info!(%job_id, "Deleted unresolved job");
                }
            }
            resolved
        }
        .await;
        result.map_err(|e| e.within(Family::Job))
    }

    async fn upload_attachment(&self) -> Result<()> {
        let Some(local) = &self.upload else {
            return Ok(());
        };
        let target = self
            .task
            .upload_target()
            .ok_or_else(|| Error::config(Family::Job, "task has no upload target"))?;
        if strip_scheme(target).is_none() {
            return Err(Error::config(
                Family::Job,
                format!(
                    "cannot upload {} to {target}: only dbfs: targets are supported",
                    local.display()
                ),
            ));
        }
        self.session.dbfs().put_file(local, target, true).await
    }
}

impl<M: Mode> JobBuilder<'_, M, NotebookTask> {
    /// Widget value passed to the notebook on every run.
    pub fn base_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.task.base_parameters.insert(key.into(), value.into());
        self
    }

    /// Replace all widget values.
    pub fn base_parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.task.base_parameters = parameters;
        self
    }
}

impl<M: Mode> JobBuilder<'_, M, JarTask> {
    /// Arguments passed to `main`.
    pub fn parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.task.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// Upload a local jar to the job's jar URI on create.
    pub fn jar_file(mut self, local: impl Into<PathBuf>) -> Self {
        self.upload = Some(local.into());
        self
    }
}

impl<M: Mode> JobBuilder<'_, M, PythonTask> {
    /// Command-line arguments.
    pub fn parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.task.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// Upload a local script to the job's script URI on create.
    pub fn python_file(mut self, local: impl Into<PathBuf>) -> Self {
        self.upload = Some(local.into());
        self
    }
}

impl<T: Task> JobBuilder<'_, Automated, T> {
    /// The cluster created for each run.
    pub fn new_cluster(mut self, spec: NewCluster) -> Self {
        self.mode = Some(Automated::new(spec));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterSize;
    use crate::job::{Job, JobVariant, SparkSubmitTask};
    use sparkdeck_api::types::Language;
    use sparkdeck_api::MockBackend;
    use std::sync::Arc;

    fn session(backend: &MockBackend) -> Session {
        Session::with_backend(Arc::new(backend.clone()))
    }

    #[tokio::test]
    async fn automated_job_requires_a_cluster() {
        let backend = MockBackend::new();
        let session = session(&backend);

        let err = session
            .create_automated_spark_submit_job(["--class", "Main"])
            .create()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::MissingField {
                family: Family::Job,
                field: "new_cluster"
            }
        ));
        assert_eq!(backend.request_count("jobs/create"), 0);
    }

    #[tokio::test]
    async fn empty_spark_submit_is_rejected_before_any_call() {
        let backend = MockBackend::new();
        let session = session(&backend);

        let err = session
            .create_automated_spark_submit_job(Vec::<String>::new())
            .new_cluster(NewCluster::default())
            .create()
            .await
            .unwrap_err();

        assert!(err.to_string().contains("spark_submit_task.parameters"));
        assert_eq!(backend.total_requests(), 0);
    }

    #[tokio::test]
    async fn notebook_job_round_trips() {
        let backend = MockBackend::new();
        let session = session(&backend);
        let cluster_id = backend.add_running_cluster("shared", 2);
        backend.add_notebook("/Users/me/etl", Language::Python, b"print(1)");

        let cluster = session.get_cluster(&cluster_id).await.unwrap();
        let notebook = session.get_notebook("/Users/me/etl").await.unwrap();

        let job = session
            .create_interactive_notebook_job(&cluster, &notebook)
            .name("etl")
            .base_parameter("date", "2020-01-01")
            .library(Library::pypi("numpy"))
            .timeout_seconds(600)
            .create()
            .await
            .unwrap();

        assert_eq!(job.name(), Some("etl"));
        assert_eq!(job.task().notebook(), &notebook);
        assert_eq!(job.task().base_parameters()["date"], "2020-01-01");
        assert_eq!(job.cluster().map(|c| c.id()), Some(&cluster_id));
        assert_eq!(job.core().libraries(), [Library::pypi("numpy")]);
        assert_eq!(job.core().settings().timeout_seconds, Some(600));

        let fetched = session.get_job(job.id()).await.unwrap();
        assert_eq!(fetched.variant(), JobVariant::InteractiveNotebook);
        let Job::InteractiveNotebook(fetched) = fetched else {
            unreachable!()
        };
        assert_eq!(fetched.task(), job.task());
    }

    #[tokio::test]
    async fn jar_file_is_uploaded_before_create() {
        let backend = MockBackend::new();
        let session = session(&backend);
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("etl.jar");
        std::fs::write(&local, b"PK\x03\x04").unwrap();

        let spec = session
            .cluster_spec(ClusterSize::fixed(1))
            .spark_version("X")
            .node_type_id("n1")
            .build_spec()
            .await
            .unwrap();

        let job = session
            .create_automated_jar_job("dbfs:/jars/etl.jar", "com.example.Etl")
            .jar_file(&local)
            .parameters(["--full"])
            .new_cluster(spec)
            .create()
            .await
            .unwrap();

        assert_eq!(backend.file("/jars/etl.jar").unwrap(), b"PK\x03\x04");
        assert_eq!(job.task().jar_uri(), Some("dbfs:/jars/etl.jar"));
        assert_eq!(job.task().parameters(), ["--full".to_string()]);
        assert_eq!(job.core().libraries(), [Library::jar("dbfs:/jars/etl.jar")]);
    }

    #[tokio::test]
    async fn upload_to_foreign_scheme_is_rejected() {
        let backend = MockBackend::new();
        let session = session(&backend);

        let err = session
            .create_automated_python_job("s3://bucket/etl.py")
            .python_file("/tmp/etl.py")
            .new_cluster(NewCluster::default())
            .create()
            .await
            .unwrap_err();

        assert_eq!(err.family(), Some(Family::Job));
        assert_eq!(backend.request_count("jobs/create"), 0);
    }

    #[tokio::test]
    async fn missing_python_script_fails_resolution() {
        let backend = MockBackend::new();
        let session = session(&backend);
        let cluster_id = backend.add_running_cluster("shared", 1);
        let cluster = session.get_cluster(&cluster_id).await.unwrap();

        let err = session
            .create_interactive_python_job(&cluster, "dbfs:/scripts/missing.py")
            .create()
            .await
            .unwrap_err();

        assert_eq!(err.family(), Some(Family::Job));
        assert!(matches!(err.root_cause(), Error::Transport(_)));
        assert_eq!(backend.request_count("jobs/create"), 0);
        assert_eq!(backend.job_count(), 0);
    }

    #[tokio::test]
    async fn unresolvable_created_job_is_deleted() {
        let backend = MockBackend::new();
        let session = session(&backend);
        let cluster_id = backend.add_running_cluster("shared", 1);
        backend.add_notebook("/Users/me/etl", Language::Python, b"print(1)");

        let cluster = session.get_cluster(&cluster_id).await.unwrap();
        let notebook = session.get_notebook("/Users/me/etl").await.unwrap();
        backend.fail_with_status("workspace/get-status", 500);

        let err = session
            .create_interactive_notebook_job(&cluster, &notebook)
            .create()
            .await
            .unwrap_err();

        assert_eq!(err.family(), Some(Family::Job));
        assert_eq!(backend.request_count("jobs/create"), 1);
        assert_eq!(backend.request_count("jobs/delete"), 1);
        assert_eq!(backend.job_count(), 0);
    }

    #[test]
    fn settings_carry_mode_and_task() {
        let backend = MockBackend::new();
        let session = session(&backend);

        let settings = JobBuilder::<Automated, SparkSubmitTask>::new(
            &session,
            Some(Automated::new(NewCluster::default())),
            SparkSubmitTask::new(["--version"]),
        )
        .max_concurrent_runs(2)
        .build_settings()
        .unwrap();

        assert!(settings.new_cluster.is_some());
        assert!(settings.existing_cluster_id.is_none());
        assert_eq!(
            settings.spark_submit_task.and_then(|t| t.parameters),
            Some(vec!["--version".to_string()])
        );
        assert_eq!(settings.max_concurrent_runs, Some(2));
    }
}
