//! Runs of jobs.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sparkdeck_api::types::{RunInfo, RunState};
use sparkdeck_api::JobsApi;
use sparkdeck_core::{JobId, RunId};

use super::{
    Automated, Interactive, JarTask, JobVariant, Mode, NotebookTask, PythonTask,
    SparkSubmitTask, Task,
};
use crate::cluster::Cluster;
use crate::error::{Error, Family, Result};

/// A run whose mode and task are known at compile time.
///
/// The record is a snapshot taken when the handle was built; [`state`]
/// and [`refresh`] read the platform again.
///
/// [`state`]: TypedRun::state
/// [`refresh`]: TypedRun::refresh
#[derive(Clone)]
pub struct TypedRun<M, T> {
    info: RunInfo,
    mode: M,
    task: T,
    jobs: Arc<dyn JobsApi>,
}

impl<M: fmt::Debug, T: fmt::Debug> fmt::Debug for TypedRun<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedRun")
            .field("run_id", &self.info.run_id)
            .field("job_id", &self.info.job_id)
            .field("mode", &self.mode)
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}

impl<M: Mode, T: Task> TypedRun<M, T> {
    pub(crate) fn new(info: RunInfo, mode: M, task: T, jobs: Arc<dyn JobsApi>) -> Self {
        Self {
            info,
            mode,
            task,
            jobs,
        }
    }

    /// The run id.
    #[must_use]
    pub const fn id(&self) -> RunId {
        self.info.run_id
    }

    /// The job this run belongs to.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.info.job_id
    }

    /// The record as last read.
    #[must_use]
    pub fn info(&self) -> &RunInfo {
        &self.info
    }

    /// The execution mode.
    #[must_use]
    pub fn mode(&self) -> &M {
        &self.mode
    }

    /// The task as it runs, overrides included.
    #[must_use]
    pub fn task(&self) -> &T {
        &self.task
    }

    /// The existing cluster, for interactive runs.
    #[must_use]
    pub fn cluster(&self) -> Option<&Cluster> {
        self.mode.cluster()
    }

    /// Link to the run in the platform UI.
    #[must_use]
    pub fn run_page_url(&self) -> Option<&str> {
        self.info.run_page_url.as_deref()
    }

    /// When the run started.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.info.start_time.and_then(DateTime::from_timestamp_millis)
    }

    /// Read the run's current state.
    ///
    /// # Errors
    ///
    /// Returns a run configuration error wrapping the transport failure.
    pub async fn state(&self) -> Result<RunState> {
        Ok(self.read().await?.state)
    }

    /// A new handle carrying the run's current record.
    ///
    /// # Errors
    ///
    /// Returns a run configuration error wrapping the transport failure.
    pub async fn refresh(&self) -> Result<Self> {
        let info = self.read().await?;
        Ok(Self::new(info, self.mode.clone(), self.task.clone(), self.jobs.clone()))
    }

    /// The value a notebook returned on exit.
    ///
    /// `None` while the run is in progress and for tasks that return nothing.
    ///
    /// # Errors
    ///
    /// Returns a run configuration error carrying the platform's message if
    /// the run failed without notebook output, or wrapping the transport
    /// failure.
    pub async fn output(&self) -> Result<Option<String>> {
        let output = self
            .jobs
            .get_run_output(self.id())
            .await
            .map_err(|e| Error::from(e).within(Family::Run))?;

        match (output.notebook_output, output.error) {
            (Some(notebook), _) => Ok(notebook.result),
            (None, Some(error)) => {
                tracing::debug!(run_id = %self.id(), error = %error, "Run reported an error");
                Err(Error::config(Family::Run, error))
            }
            (None, None) => Ok(None),
        }
    }

    async fn read(&self) -> Result<RunInfo> {
        self.jobs
            .get_run(self.id())
            .await
            .map_err(|e| Error::from(e).within(Family::Run))
    }
}

/// A run resolved into one of the seven variants.
#[derive(Debug, Clone)]
pub enum Run {
    /// Notebook on an existing cluster.
    InteractiveNotebook(TypedRun<Interactive, NotebookTask>),
    /// Jar on an existing cluster.
    InteractiveJar(TypedRun<Interactive, JarTask>),
    /// Python on an existing cluster.
    InteractivePython(TypedRun<Interactive, PythonTask>),
    /// Notebook on a new cluster.
    AutomatedNotebook(TypedRun<Automated, NotebookTask>),
    /// Jar on a new cluster.
    AutomatedJar(TypedRun<Automated, JarTask>),
    /// Python on a new cluster.
    AutomatedPython(TypedRun<Automated, PythonTask>),
    /// Spark-submit on a new cluster.
    AutomatedSparkSubmit(TypedRun<Automated, SparkSubmitTask>),
}

macro_rules! each_run {
    ($value:expr, $run:ident => $body:expr) => {
        match $value {
            Run::InteractiveNotebook($run) => $body,
            Run::InteractiveJar($run) => $body,
            Run::InteractivePython($run) => $body,
            Run::AutomatedNotebook($run) => $body,
            Run::AutomatedJar($run) => $body,
            Run::AutomatedPython($run) => $body,
            Run::AutomatedSparkSubmit($run) => $body,
        }
    };
}

impl Run {
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

    /// The record as last read.
    #[must_use]
    pub fn info(&self) -> &RunInfo {
        each_run!(self, run => run.info())
    }

    /// The run id.
    #[must_use]
    pub fn id(&self) -> RunId {
        self.info().run_id
    }

    /// The job this run belongs to.
    #[must_use]
    pub fn job_id(&self) -> JobId {
        self.info().job_id
    }

    /// The existing cluster, for interactive runs.
    #[must_use]
    pub fn cluster(&self) -> Option<&Cluster> {
        each_run!(self, run => run.cluster())
    }

    /// Read the run's current state.
    ///
    /// # Errors
    ///
    /// Returns a run configuration error wrapping the transport failure.
    pub async fn state(&self) -> Result<RunState> {
        each_run!(self, run => run.state().await)
    }

    /// A new handle carrying the run's current record.
    ///
    /// # Errors
    ///
    /// Returns a run configuration error wrapping the transport failure.
    pub async fn refresh(&self) -> Result<Self> {
        Ok(each_run!(self, run => run.refresh().await?.into()))
    }

    /// The value a notebook returned on exit.
    ///
    /// # Errors
    ///
    /// As [`TypedRun::output`].
    pub async fn output(&self) -> Result<Option<String>> {
        each_run!(self, run => run.output().await)
    }
}

macro_rules! run_conversions {
    ($($variant:ident => $mode:ty, $task:ty;)+) => {
        $(
            impl From<TypedRun<$mode, $task>> for Run {
                fn from(run: TypedRun<$mode, $task>) -> Self {
                    Self::$variant(run)
                }
            }

            impl TryFrom<Run> for TypedRun<$mode, $task> {
                type Error = Error;

                fn try_from(run: Run) -> Result<Self> {
                    match run {
                        Run::$variant(run) => Ok(run),
                        other => Err(Error::config(
                            Family::Run,
                            format!(
                                "run {} is {}, expected {}",
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

run_conversions! {
    InteractiveNotebook => Interactive, NotebookTask;
    InteractiveJar => Interactive, JarTask;
    InteractivePython => Interactive, PythonTask;
    AutomatedNotebook => Automated, NotebookTask;
    AutomatedJar => Automated, JarTask;
    AutomatedPython => Automated, PythonTask;
    AutomatedSparkSubmit => Automated, SparkSubmitTask;
}
