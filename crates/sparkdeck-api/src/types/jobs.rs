//! Wire records for the `jobs/*` endpoints.
//!
//! A job's settings and a run's record share the same loose shape: which
//! variant a record describes is only visible from which optional fields are
//! populated. Classifying them is the domain layer's job; these types decode
//! whatever the platform sends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sparkdeck_core::{ClusterId, JobId, RunId};

use super::clusters::NewCluster;
use super::libraries::LibrarySpec;

/// Notebook task definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookTaskSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_path: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub base_parameters: BTreeMap<String, String>,
}

/// JAR task definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparkJarTaskSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

/// Python task definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparkPythonTaskSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_file: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

/// spark-submit task definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparkSubmitTaskSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<String>>,
}

/// A quartz cron schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronSchedule {
    pub quartz_cron_expression: String,
    pub timezone_id: String,
}

/// The settings of a job, as sent to `jobs/create` and returned by `jobs/get`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_cluster_id: Option<ClusterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_cluster: Option<NewCluster>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_task: Option<NotebookTaskSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_jar_task: Option<SparkJarTaskSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_python_task: Option<SparkPythonTaskSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_submit_task: Option<SparkSubmitTaskSettings>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<LibrarySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_retry_interval_millis: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_on_timeout: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<CronSchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_runs: Option<u32>,
}

/// A job as returned by `jobs/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    pub job_id: JobId,
    #[serde(default)]
    pub settings: JobSettings,
    #[serde(default)]
    pub creator_user_name: Option<String>,
    #[serde(default)]
    pub created_time: Option<i64>,
}

/// Response of `jobs/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub job_id: JobId,
}

/// Body of `jobs/delete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobIdRequest {
    pub job_id: JobId,
}

/// Body of `jobs/run-now`. At most one parameter field is expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunNowRequest {
    pub job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jar_params: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_params: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_params: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_submit_params: Option<Vec<String>>,
}

impl RunNowRequest {
    /// A request that runs the job with its stored parameters.
    #[must_use]
    pub const fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            jar_params: None,
            notebook_params: None,
            python_params: None,
            spark_submit_params: None,
        }
    }
}

/// Response of `jobs/run-now`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunNowResponse {
    pub run_id: RunId,
    #[serde(default)]
    pub number_in_job: Option<i64>,
}

/// Life-cycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunLifeCycleState {
    Pending,
    Running,
    Terminating,
    Terminated,
    Skipped,
    InternalError,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RunLifeCycleState {
    /// Returns true once the run will not change state any more.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated | Self::Skipped | Self::InternalError)
    }
}

/// Outcome of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunResultState {
    Success,
    Failed,
    Timedout,
    Canceled,
    #[serde(other)]
    Unknown,
}

/// State of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    #[serde(default)]
    pub life_cycle_state: RunLifeCycleState,
    #[serde(default)]
    pub result_state: Option<RunResultState>,
    #[serde(default)]
    pub state_message: Option<String>,
}

/// The compute target of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunClusterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_cluster_id: Option<ClusterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_cluster: Option<NewCluster>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<LibrarySpec>,
}

/// The cluster a run actually executed on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInstance {
    #[serde(default)]
    pub cluster_id: Option<ClusterId>,
    #[serde(default)]
    pub spark_context_id: Option<String>,
}

/// The task a run executes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_task: Option<NotebookTaskSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_jar_task: Option<SparkJarTaskSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_python_task: Option<SparkPythonTaskSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_submit_task: Option<SparkSubmitTaskSettings>,
}

/// A run as returned by `jobs/runs/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub job_id: JobId,
    pub run_id: RunId,
    #[serde(default)]
    pub number_in_job: Option<i64>,
    #[serde(default)]
    pub creator_user_name: Option<String>,
    #[serde(default)]
    pub cluster_spec: RunClusterSpec,
    #[serde(default)]
    pub cluster_instance: Option<ClusterInstance>,
    #[serde(default)]
    pub task: RunTask,
    #[serde(default)]
    pub state: RunState,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub setup_duration: Option<i64>,
    #[serde(default)]
    pub execution_duration: Option<i64>,
    #[serde(default)]
    pub cleanup_duration: Option<i64>,
    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default)]
    pub run_page_url: Option<String>,
}

/// Output of a notebook run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookOutput {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub truncated: bool,
}

/// Response of `jobs/runs/get-output`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    #[serde(default)]
    pub notebook_output: Option<NotebookOutput>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_trace: Option<String>,
    #[serde(default)]
    pub metadata: Option<RunInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_now_request_only_sends_set_params() {
        let mut req = RunNowRequest::new(JobId::new(3));
        req.python_params = Some(vec!["--x".into()]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"job_id": 3, "python_params": ["--x"]}));
    }

    #[test]
    fn run_info_decodes_platform_record() {
        let run: RunInfo = serde_json::from_value(serde_json::json!({
            "job_id": 1,
            "run_id": 455,
            "number_in_job": 1,
            "cluster_spec": {"existing_cluster_id": "1201-my-cluster"},
            "cluster_instance": {"cluster_id": "1201-my-cluster", "spark_context_id": "1102398"},
            "task": {"notebook_task": {"notebook_path": "/Users/me/nb"}},
            "state": {"life_cycle_state": "PENDING", "state_message": "Waiting for cluster"},
            "start_time": 1_457_570_074_236_i64
        }))
        .unwrap();

        assert_eq!(run.run_id, RunId::new(455));
        assert_eq!(run.state.life_cycle_state, RunLifeCycleState::Pending);
        assert!(run.state.result_state.is_none());
        assert_eq!(
            run.task.notebook_task.unwrap().notebook_path.as_deref(),
            Some("/Users/me/nb")
        );
    }

    #[test]
    fn terminal_life_cycle_states() {
        assert!(RunLifeCycleState::Terminated.is_terminal());
        assert!(RunLifeCycleState::InternalError.is_terminal());
        assert!(!RunLifeCycleState::Running.is_terminal());
        assert!(!RunLifeCycleState::Unknown.is_terminal());
    }
}
