//! Resolve loose job and run records into typed variants.
//!
//! Classification looks only at which fields are populated: the compute
//! target picks the mode and the single task field picks the kind. The pair
//! selects one [`JobVariant`]; anything else is an unsupported type. Once
//! classified, embedded references are resolved eagerly through the session
//! (the existing cluster, the notebook, a `dbfs:` script) and each component
//! re-checks the fields it needs.

use sparkdeck_api::types::{
    JobInfo, LibrarySpec, NewCluster, NotebookTaskSettings, RunInfo, SparkJarTaskSettings,
    SparkPythonTaskSettings, SparkSubmitTaskSettings,
};
use sparkdeck_core::ClusterId;

use super::{
    Automated, ExecutionMode, Interactive, JarTask, Job, JobCore, JobVariant, NotebookTask,
    PythonTask, Run, SparkSubmitTask, TaskKind, TypedJob, TypedRun,
};
use crate::error::{Error, Family, Result};
use crate::session::Session;
use crate::workspace::PythonScript;

/// The fields classification and resolution read, shared by job settings and
/// run records.
pub(crate) trait TaskShape {
    fn existing_cluster_id(&self) -> Option<&ClusterId>;
    fn new_cluster(&self) -> Option<&NewCluster>;
    fn notebook_task(&self) -> Option<&NotebookTaskSettings>;
    fn spark_jar_task(&self) -> Option<&SparkJarTaskSettings>;
    fn spark_python_task(&self) -> Option<&SparkPythonTaskSettings>;
    fn spark_submit_task(&self) -> Option<&SparkSubmitTaskSettings>;
    fn libraries(&self) -> &[LibrarySpec];
}

impl TaskShape for sparkdeck_api::types::JobSettings {
    fn existing_cluster_id(&self) -> Option<&ClusterId> {
        self.existing_cluster_id.as_ref()
    }

    fn new_cluster(&self) -> Option<&NewCluster> {
        self.new_cluster.as_ref()
    }

    fn notebook_task(&self) -> Option<&NotebookTaskSettings> {
        self.notebook_task.as_ref()
    }

    fn spark_jar_task(&self) -> Option<&SparkJarTaskSettings> {
        self.spark_jar_task.as_ref()
    }

    fn spark_python_task(&self) -> Option<&SparkPythonTaskSettings> {
        self.spark_python_task.as_ref()
    }

    fn spark_submit_task(&self) -> Option<&SparkSubmitTaskSettings> {
        self.spark_submit_task.as_ref()
    }

    fn libraries(&self) -> &[LibrarySpec] {
        &self.libraries
    }
}

impl TaskShape for RunInfo {
    fn existing_cluster_id(&self) -> Option<&ClusterId> {
        self.cluster_spec.existing_cluster_id.as_ref()
    }

    fn new_cluster(&self) -> Option<&NewCluster> {
        self.cluster_spec.new_cluster.as_ref()
    }

    fn notebook_task(&self) -> Option<&NotebookTaskSettings> {
        self.task.notebook_task.as_ref()
    }

    fn spark_jar_task(&self) -> Option<&SparkJarTaskSettings> {
        self.task.spark_jar_task.as_ref()
    }

    fn spark_python_task(&self) -> Option<&SparkPythonTaskSettings> {
        self.task.spark_python_task.as_ref()
    }

    fn spark_submit_task(&self) -> Option<&SparkSubmitTaskSettings> {
        self.task.spark_submit_task.as_ref()
    }

    fn libraries(&self) -> &[LibrarySpec] {
        &self.cluster_spec.libraries
    }
}

// ===== Classification =====

/// Pick the variant a record describes.
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] in `family` unless exactly one compute
/// target and exactly one task field are populated and the pair is supported.
pub(crate) fn classify(shape: &impl TaskShape, family: Family) -> Result<JobVariant> {
    let mode = match (shape.existing_cluster_id(), shape.new_cluster()) {
        (Some(_), None) => ExecutionMode::Interactive,
        (None, Some(_)) => ExecutionMode::Automated,
        (Some(_), Some(_)) => {
            return Err(unsupported(family, "both existing_cluster_id and new_cluster are set"));
        }
        (None, None) => {
            return Err(unsupported(family, "neither existing_cluster_id nor new_cluster is set"));
        }
    };

    let populated: Vec<TaskKind> = [
        shape.notebook_task().map(|_| TaskKind::Notebook),
        shape.spark_jar_task().map(|_| TaskKind::Jar),
        shape.spark_python_task().map(|_| TaskKind::Python),
        shape.spark_submit_task().map(|_| TaskKind::SparkSubmit),
    ]
    .into_iter()
    .flatten()
    .collect();

    let kind = match populated.as_slice() {
        [kind] => *kind,
        [] => return Err(unsupported(family, "no task is set")),
        kinds => return Err(unsupported(family, format!("several tasks are set: {kinds:?}"))),
    };

    JobVariant::from_pair(mode, kind)
        .ok_or_else(|| unsupported(family, format!("{mode:?} mode with {kind:?} task")))
}

fn unsupported(family: Family, detail: impl Into<String>) -> Error {
    Error::UnsupportedType {
        family,
        detail: detail.into(),
    }
}

const fn missing(family: Family, field: &'static str) -> Error {
    Error::MissingField { family, field }
}

// ===== Components =====

async fn interactive(
    session: &Session,
    shape: &impl TaskShape,
    family: Family,
) -> Result<Interactive> {
    let cluster_id = shape
        .existing_cluster_id()
        .ok_or(missing(family, "existing_cluster_id"))?;
    let cluster = session.get_cluster(cluster_id).await?;
    Ok(Interactive::new(cluster))
}

fn automated(shape: &impl TaskShape, family: Family) -> Result<Automated> {
    let spec = shape
        .new_cluster()
        .ok_or(missing(family, "new_cluster"))?;
    Ok(Automated::new(spec.clone()))
}

async fn notebook_task(
    session: &Session,
    shape: &impl TaskShape,
    family: Family,
) -> Result<NotebookTask> {
    let settings = shape
        .notebook_task()
        .ok_or(missing(family, "notebook_task"))?;
    let path = settings
        .notebook_path
        .as_deref()
        .ok_or(missing(family, "notebook_task.notebook_path"))?;
    let notebook = session.get_notebook(path).await?;

    let mut task = NotebookTask::new(notebook);
    task.base_parameters.clone_from(&settings.base_parameters);
    Ok(task)
}

fn jar_task(shape: &impl TaskShape, family: Family) -> Result<JarTask> {
    let settings = shape
        .spark_jar_task()
        .ok_or(missing(family, "spark_jar_task"))?;
    let main_class_name = settings
        .main_class_name
        .as_deref()
        .ok_or(missing(family, "spark_jar_task.main_class_name"))?;
    let jar_uri = shape.libraries().iter().find_map(|spec| spec.jar.clone());

    let mut task = JarTask::new(jar_uri, main_class_name);
    task.parameters.clone_from(&settings.parameters);
    Ok(task)
}

async fn python_task(
    session: &Session,
    shape: &impl TaskShape,
    family: Family,
) -> Result<PythonTask> {
    let settings = shape
        .spark_python_task()
        .ok_or(missing(family, "spark_python_task"))?;
    let uri = settings
        .python_file
        .as_deref()
        .ok_or(missing(family, "spark_python_task.python_file"))?;
    let script = PythonScript::resolve(session.dbfs_api().as_ref(), uri).await?;

    let mut task = PythonTask::new(script);
    task.parameters.clone_from(&settings.parameters);
    Ok(task)
}

fn spark_submit_task(shape: &impl TaskShape, family: Family) -> Result<SparkSubmitTask> {
    let parameters = shape
        .spark_submit_task()
        .and_then(|settings| settings.parameters.clone())
        .ok_or(missing(family, "spark_submit_task.parameters"))?;
    Ok(SparkSubmitTask::new(parameters))
}

// ===== Entry points =====

/// Resolve a job record into its variant.
///
/// # Errors
///
/// Returns an unsupported-type error for unrecognized shapes, a missing-field
/// error when a required task field is null, or the failure of resolving an
/// embedded reference.
pub(crate) async fn resolve_job(session: &Session, info: JobInfo) -> Result<Job> {
    const F: Family = Family::Job;

    let variant = classify(&info.settings, F)?;
    tracing::debug!(job_id = %info.job_id, %variant, "Resolving job");

    let jobs = session.jobs_api().clone();
    let shape = &info.settings;

    let job = match variant {
        JobVariant::InteractiveNotebook => {
            let mode = interactive(session, shape, F).await?;
            let task = notebook_task(session, shape, F).await?;
            TypedJob::new(JobCore::from_info(info), mode, task, jobs).into()
        }
        JobVariant::InteractiveJar => {
            let mode = interactive(session, shape, F).await?;
            let task = jar_task(shape, F)?;
            TypedJob::new(JobCore::from_info(info), mode, task, jobs).into()
        }
        JobVariant::InteractivePython => {
            let mode = interactive(session, shape, F).await?;
            let task = python_task(session, shape, F).await?;
            TypedJob::new(JobCore::from_info(info), mode, task, jobs).into()
        }
        JobVariant::AutomatedNotebook => {
            let mode = automated(shape, F)?;
            let task = notebook_task(session, shape, F).await?;
            TypedJob::new(JobCore::from_info(info), mode, task, jobs).into()
        }
        JobVariant::AutomatedJar => {
            let mode = automated(shape, F)?;
            let task = jar_task(shape, F)?;
            TypedJob::new(JobCore::from_info(info), mode, task, jobs).into()
        }
        JobVariant::AutomatedPython => {
            let mode = automated(shape, F)?;
            let task = python_task(session, shape, F).await?;
            TypedJob::new(JobCore::from_info(info), mode, task, jobs).into()
        }
        JobVariant::AutomatedSparkSubmit => {
            let mode = automated(shape, F)?;
            let task = spark_submit_task(shape, F)?;
            TypedJob::new(JobCore::from_info(info), mode, task, jobs).into()
        }
    };
    Ok(job)
}

/// Resolve a run record into its variant. Every job variant has a run
/// counterpart.
///
/// # Errors
///
/// As [`resolve_job`], reported in the run family.
pub(crate) async fn resolve_run(session: &Session, info: RunInfo) -> Result<Run> {
    const F: Family = Family::Run;

    let variant = classify(&info, F)?;
    tracing::debug!(run_id = %info.run_id, %variant, "Resolving run");

    let jobs = session.jobs_api().clone();

    let run = match variant {
        JobVariant::InteractiveNotebook => {
            let mode = interactive(session, &info, F).await?;
            let task = notebook_task(session, &info, F).await?;
            TypedRun::new(info, mode, task, jobs).into()
        }
        JobVariant::InteractiveJar => {
            let mode = interactive(session, &info, F).await?;
            let task = jar_task(&info, F)?;
            TypedRun::new(info, mode, task, jobs).into()
        }
        JobVariant::InteractivePython => {
            let mode = interactive(session, &info, F).await?;
            let task = python_task(session, &info, F).await?;
            TypedRun::new(info, mode, task, jobs).into()
        }
        JobVariant::AutomatedNotebook => {
            let mode = automated(&info, F)?;
            let task = notebook_task(session, &info, F).await?;
            TypedRun::new(info, mode, task, jobs).into()
        }
        JobVariant::AutomatedJar => {
            let mode = automated(&info, F)?;
            let task = jar_task(&info, F)?;
            TypedRun::new(info, mode, task, jobs).into()
        }
        JobVariant::AutomatedPython => {
            let mode = automated(&info, F)?;
            let task = python_task(session, &info, F).await?;
            TypedRun::new(info, mode, task, jobs).into()
        }
        JobVariant::AutomatedSparkSubmit => {
            let mode = automated(&info, F)?;
            let task = spark_submit_task(&info, F)?;
            TypedRun::new(info, mode, task, jobs).into()
        }
    };
    Ok(run)
}
