//! Job and run resolution across all seven variants.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use sparkdeck_api::types::{
    JobSettings, Language, LibrarySpec, NewCluster, NotebookOutput, NotebookTaskSettings,
    RunClusterSpec, RunInfo, RunLifeCycleState, RunOutput, RunResultState, RunState, RunTask,
    SparkJarTaskSettings, SparkPythonTaskSettings, SparkSubmitTaskSettings,
};
use sparkdeck_api::MockBackend;
use sparkdeck_control::job::{Automated, NotebookTask};
use sparkdeck_control::wait::wait_for_run;
use sparkdeck_control::{
    ClusterId, Error, Family, Job, JobVariant, Library, Run, RunId, Session, TypedJob, WaitOptions,
};

const NOTEBOOK: &str = "/Shared/etl";
const SCRIPT: &str = "dbfs:/scripts/etl.py";
const JAR: &str = "dbfs:/jars/etl.jar";

struct Fixture {
    backend: MockBackend,
    session: Session,
    cluster_id: ClusterId,
}

fn fixture() -> Fixture {
    let backend = MockBackend::new();
    backend.add_notebook(NOTEBOOK, Language::Python, b"dbutils.notebook.exit('done')");
    backend.add_file("/scripts/etl.py", b"print('etl')");
    let cluster_id = backend.add_running_cluster("shared", 2);
    let session = Session::with_backend(Arc::new(backend.clone()));
    Fixture {
        backend,
        session,
        cluster_id,
    }
}

fn notebook_task() -> NotebookTaskSettings {
    NotebookTaskSettings {
        notebook_path: Some(NOTEBOOK.into()),
        base_parameters: BTreeMap::from([("env".to_string(), "prod".to_string())]),
    }
}

/// Job settings of the given shape.
fn settings(variant: JobVariant, cluster_id: &ClusterId) -> JobSettings {
    let mut settings = JobSettings {
        name: Some(format!("{variant}")),
        ..JobSettings::default()
    };
    match variant {
        JobVariant::InteractiveNotebook
        | JobVariant::InteractiveJar
        | JobVariant::InteractivePython => {
            settings.existing_cluster_id = Some(cluster_id.clone());
        }
        JobVariant::AutomatedNotebook
        | JobVariant::AutomatedJar
        | JobVariant::AutomatedPython
        | JobVariant::AutomatedSparkSubmit => {
            settings.new_cluster = Some(NewCluster {
                spark_version: Some("X".into()),
                node_type_id: Some("n1".into()),
                num_workers: Some(1),
                ..NewCluster::default()
            });
        }
    }
    match variant {
        JobVariant::InteractiveNotebook | JobVariant::AutomatedNotebook => {
            settings.notebook_task = Some(notebook_task());
        }
        JobVariant::InteractiveJar | JobVariant::AutomatedJar => {
            settings.spark_jar_task = Some(SparkJarTaskSettings {
                main_class_name: Some("com.example.Etl".into()),
                parameters: vec!["--full".into()],
            });
            settings.libraries.push(LibrarySpec {
                jar: Some(JAR.into()),
                ..LibrarySpec::default()
            });
        }
        JobVariant::InteractivePython | JobVariant::AutomatedPython => {
            settings.spark_python_task = Some(SparkPythonTaskSettings {
                python_file: Some(SCRIPT.into()),
                parameters: vec!["2020-01-01".into()],
            });
        }
        JobVariant::AutomatedSparkSubmit => {
            settings.spark_submit_task = Some(SparkSubmitTaskSettings {
                parameters: Some(vec!["--class".into(), "Main".into()]),
            });
        }
    }
    settings
}

const ALL: [JobVariant; 7] = [
    JobVariant::InteractiveNotebook,
    JobVariant::InteractiveJar,
    JobVariant::InteractivePython,
    JobVariant::AutomatedNotebook,
    JobVariant::AutomatedJar,
    JobVariant::AutomatedPython,
    JobVariant::AutomatedSparkSubmit,
];

#[tokio::test]
async fn every_job_shape_resolves_to_its_variant() {
    let f = fixture();

    for variant in ALL {
        let job_id = f.backend.put_job(settings(variant, &f.cluster_id));
        let job = f.session.get_job(job_id).await.unwrap();

        assert_eq!(job.variant(), variant);
        assert_eq!(job.id(), job_id);
        assert_eq!(job.name(), Some(variant.to_string().as_str()));
        assert_eq!(
            job.cluster().map(|c| c.id().clone()),
            matches!(variant.mode(), sparkdeck_control::ExecutionMode::Interactive)
                .then(|| f.cluster_id.clone())
        );
    }
}

fn new_cluster() -> NewCluster {
    NewCluster {
        spark_version: Some("X".into()),
        node_type_id: Some("n1".into()),
        num_workers: Some(1),
        ..NewCluster::default()
    }
}

/// Compare what a builder returned with what the platform hands back.
fn assert_same_job(created: &Job, fetched: &Job) {
    assert_eq!(fetched.variant(), created.variant());
    assert_eq!(fetched.id(), created.id());
    assert_eq!(fetched.name(), created.name());
    assert_eq!(
        fetched.cluster().map(|c| c.id().clone()),
        created.cluster().map(|c| c.id().clone())
    );

    match (created, fetched) {
        (Job::InteractiveNotebook(a), Job::InteractiveNotebook(b)) => {
            assert_eq!(a.task(), b.task());
        }
        (Job::InteractiveJar(a), Job::InteractiveJar(b)) => {
            assert_eq!(a.task(), b.task());
            assert_eq!(a.core().libraries(), b.core().libraries());
        }
        (Job::InteractivePython(a), Job::InteractivePython(b)) => {
            assert_eq!(a.task(), b.task());
        }
        (Job::AutomatedNotebook(a), Job::AutomatedNotebook(b)) => {
            assert_eq!(a.task(), b.task());
            assert_eq!(a.mode().new_cluster(), b.mode().new_cluster());
        }
        (Job::AutomatedJar(a), Job::AutomatedJar(b)) => {
            assert_eq!(a.task(), b.task());
            assert_eq!(a.mode().new_cluster(), b.mode().new_cluster());
            assert_eq!(a.core().libraries(), b.core().libraries());
        }
        (Job::AutomatedPython(a), Job::AutomatedPython(b)) => {
            assert_eq!(a.task(), b.task());
            assert_eq!(a.mode().new_cluster(), b.mode().new_cluster());
        }
        (Job::AutomatedSparkSubmit(a), Job::AutomatedSparkSubmit(b)) => {
            assert_eq!(a.task(), b.task());
            assert_eq!(a.mode().new_cluster(), b.mode().new_cluster());
        }
        _ => panic!("{} came back as {}", created.variant(), fetched.variant()),
    }
}

#[tokio::test]
async fn every_builder_round_trips_through_get_job() {
    let f = fixture();
    let cluster = f.session.get_cluster(&f.cluster_id).await.unwrap();
    let notebook = f.session.get_notebook(NOTEBOOK).await.unwrap();
    let util = Library::jar("dbfs:/jars/util.jar");

    let created: Vec<Job> = vec![
        f.session
            .create_interactive_notebook_job(&cluster, &notebook)
            .name("interactive notebook")
            .base_parameter("env", "prod")
            .create()
            .await
            .unwrap()
            .into(),
        f.session
            .create_interactive_jar_job(&cluster, JAR, "com.example.Etl")
            .name("interactive jar")
            .library(util.clone())
            .library(Library::jar(JAR))
            .parameters(["--full"])
            .create()
            .await
            .unwrap()
            .into(),
        f.session
            .create_interactive_python_job(&cluster, SCRIPT)
            .name("interactive python")
            .parameters(["2020-01-01"])
            .create()
            .await
            .unwrap()
            .into(),
        f.session
            .create_automated_notebook_job(&notebook)
            .name("automated notebook")
            .base_parameter("env", "dev")
            .new_cluster(new_cluster())
            .create()
            .await
            .unwrap()
            .into(),
        f.session
            .create_automated_jar_job(JAR, "com.example.Etl")
            .name("automated jar")
            .library(util.clone())
            .new_cluster(new_cluster())
            .create()
            .await
            .unwrap()
            .into(),
        f.session
            .create_automated_python_job(SCRIPT)
            .name("automated python")
            .new_cluster(new_cluster())
            .create()
            .await
            .unwrap()
            .into(),
        f.session
            .create_automated_spark_submit_job(["--class", "Main"])
            .name("automated spark-submit")
            .new_cluster(new_cluster())
            .create()
            .await
            .unwrap()
            .into(),
    ];

    let variants: Vec<JobVariant> = created.iter().map(Job::variant).collect();
    assert_eq!(variants, ALL);

    for job in &created {
        let fetched = f.session.get_job(job.id()).await.unwrap();
        assert_same_job(job, &fetched);
    }

    let Job::InteractiveJar(jar_job) = &created[1] else {
        panic!("expected an interactive jar job");
    };
    assert_eq!(jar_job.task().jar_uri(), Some(JAR));
    assert_eq!(jar_job.core().libraries(), [Library::jar(JAR), util]);
}

#[tokio::test]
async fn resolved_tasks_carry_their_fields() {
    let f = fixture();

    let job_id = f
        .backend
        .put_job(settings(JobVariant::InteractiveNotebook, &f.cluster_id));
    let Job::InteractiveNotebook(job) = f.session.get_job(job_id).await.unwrap() else {
        panic!("expected an interactive notebook job");
    };
    assert_eq!(job.task().notebook().path(), NOTEBOOK);
    assert_eq!(job.task().notebook().language(), Some(Language::Python));
    assert_eq!(job.task().base_parameters()["env"], "prod");

    let job_id = f
        .backend
        .put_job(settings(JobVariant::AutomatedJar, &f.cluster_id));
    let Job::AutomatedJar(job) = f.session.get_job(job_id).await.unwrap() else {
        panic!("expected an automated jar job");
    };
    assert_eq!(job.task().jar_uri(), Some(JAR));
    assert_eq!(job.task().main_class_name(), "com.example.Etl");
    assert_eq!(job.task().parameters(), ["--full".to_string()]);
    assert_eq!(job.core().libraries(), [Library::jar(JAR)]);
    assert_eq!(job.mode().new_cluster().num_workers, Some(1));

    let job_id = f
        .backend
        .put_job(settings(JobVariant::InteractivePython, &f.cluster_id));
    let Job::InteractivePython(job) = f.session.get_job(job_id).await.unwrap() else {
        panic!("expected an interactive python job");
    };
    assert_eq!(job.task().script().uri(), SCRIPT);
    assert_eq!(job.task().parameters(), ["2020-01-01".to_string()]);
}

#[tokio::test]
async fn unsupported_shapes_are_rejected() {
    let f = fixture();

    let mut interactive_submit = settings(JobVariant::AutomatedSparkSubmit, &f.cluster_id);
    interactive_submit.new_cluster = None;
    interactive_submit.existing_cluster_id = Some(f.cluster_id.clone());

    let mut no_task = settings(JobVariant::AutomatedNotebook, &f.cluster_id);
    no_task.notebook_task = None;

    let mut two_tasks = settings(JobVariant::AutomatedNotebook, &f.cluster_id);
    two_tasks.spark_submit_task = Some(SparkSubmitTaskSettings {
        parameters: Some(vec!["x".into()]),
    });

    for shape in [interactive_submit, no_task, two_tasks] {
        let job_id = f.backend.put_job(shape);
        let err = f.session.get_job(job_id).await.unwrap_err();
        assert!(
            matches!(err, Error::UnsupportedType { family: Family::Job, .. }),
            "{err}"
        );
    }
}

#[tokio::test]
async fn missing_fields_are_named() {
    let f = fixture();

    let mut no_path = settings(JobVariant::AutomatedNotebook, &f.cluster_id);
    no_path.notebook_task = Some(NotebookTaskSettings::default());
    let job_id = f.backend.put_job(no_path);
    let err = f.session.get_job(job_id).await.unwrap_err();
    assert!(matches!(
        err,
        Error::MissingField {
            family: Family::Job,
            field: "notebook_task.notebook_path"
        }
    ));

    let mut no_class = settings(JobVariant::InteractiveJar, &f.cluster_id);
    no_class.spark_jar_task = Some(SparkJarTaskSettings::default());
    let job_id = f.backend.put_job(no_class);
    let err = f.session.get_job(job_id).await.unwrap_err();
    assert!(err.to_string().contains("spark_jar_task.main_class_name"));
}

#[tokio::test]
async fn unresolvable_references_fail_resolution() {
    let f = fixture();

    let mut missing_notebook = settings(JobVariant::AutomatedNotebook, &f.cluster_id);
    missing_notebook.notebook_task = Some(NotebookTaskSettings {
        notebook_path: Some("/Shared/gone".into()),
        ..NotebookTaskSettings::default()
    });
    let job_id = f.backend.put_job(missing_notebook);
    let err = f.session.get_job(job_id).await.unwrap_err();
    assert_eq!(err.family(), Some(Family::Job));
    assert!(err.to_string().contains("/Shared/gone"));

    let missing_cluster = settings(
        JobVariant::InteractivePython,
        &ClusterId::new("0000-000000-gone").unwrap(),
    );
    let job_id = f.backend.put_job(missing_cluster);
    let err = f.session.get_job(job_id).await.unwrap_err();
    assert_eq!(err.family(), Some(Family::Job));
    assert!(err
        .root_cause()
        .to_string()
        .contains("0000-000000-gone"));
}

#[tokio::test]
async fn running_a_job_yields_a_run_of_the_same_variant() {
    let f = fixture();

    for variant in ALL {
        let job_id = f.backend.put_job(settings(variant, &f.cluster_id));
        let job = f.session.get_job(job_id).await.unwrap();

        let run = job.run().await.unwrap();
        assert_eq!(run.variant(), variant);
        assert_eq!(run.job_id(), job_id);
        assert_eq!(
            run.cluster().map(|c| c.id().clone()),
            job.cluster().map(|c| c.id().clone())
        );

        let fetched = f.session.get_run(run.id()).await.unwrap();
        assert_eq!(fetched.variant(), variant);
        assert_eq!(fetched.id(), run.id());
    }
}

#[tokio::test]
async fn run_overrides_reach_platform_and_task() {
    let f = fixture();
    let job_id = f
        .backend
        .put_job(settings(JobVariant::AutomatedNotebook, &f.cluster_id));
    let job: TypedJob<Automated, NotebookTask> =
        f.session.get_job(job_id).await.unwrap().try_into().unwrap();

    let run = job
        .run_with(BTreeMap::from([("date".to_string(), "2021-06-01".to_string())]))
        .await
        .unwrap();

    assert_eq!(run.task().base_parameters()["date"], "2021-06-01");
    assert_eq!(run.task().base_parameters()["env"], "prod");
    assert_eq!(job.task().base_parameters().get("date"), None);

    let recorded = f.backend.run(run.id()).unwrap();
    let params = recorded.task.notebook_task.unwrap().base_parameters;
    assert_eq!(params["date"], "2021-06-01");
}

#[tokio::test]
async fn run_shapes_resolve_like_job_shapes() {
    let f = fixture();
    let job_id = f
        .backend
        .put_job(settings(JobVariant::AutomatedSparkSubmit, &f.cluster_id));

    let record = |run_id: i64, task: RunTask, cluster_spec: RunClusterSpec| RunInfo {
        job_id,
        run_id: RunId::new(run_id),
        number_in_job: Some(1),
        creator_user_name: None,
        cluster_spec,
        cluster_instance: None,
        task,
        state: RunState::default(),
        start_time: Some(1_600_000_000_000),
        setup_duration: None,
        execution_duration: None,
        cleanup_duration: None,
        trigger: None,
        run_page_url: None,
    };

    f.backend.put_run(record(
        9001,
        RunTask {
            notebook_task: Some(notebook_task()),
            ..RunTask::default()
        },
        RunClusterSpec {
            existing_cluster_id: Some(f.cluster_id.clone()),
            ..RunClusterSpec::default()
        },
    ));
    let run = f.session.get_run(RunId::new(9001)).await.unwrap();
    assert_eq!(run.variant(), JobVariant::InteractiveNotebook);
    let Run::InteractiveNotebook(run) = run else {
        panic!("expected an interactive notebook run");
    };
    assert_eq!(run.task().notebook().path(), NOTEBOOK);
    assert!(run.started_at().is_some());

    f.backend.put_run(record(
        9002,
        RunTask {
            notebook_task: Some(NotebookTaskSettings::default()),
            ..RunTask::default()
        },
        RunClusterSpec {
            existing_cluster_id: Some(f.cluster_id.clone()),
            ..RunClusterSpec::default()
        },
    ));
    let err = f.session.get_run(RunId::new(9002)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::MissingField {
            family: Family::Run,
            ..
        }
    ));

    f.backend.put_run(record(
        9003,
        RunTask {
            spark_submit_task: Some(SparkSubmitTaskSettings::default()),
            ..RunTask::default()
        },
        RunClusterSpec {
            existing_cluster_id: Some(f.cluster_id.clone()),
            ..RunClusterSpec::default()
        },
    ));
    let err = f.session.get_run(RunId::new(9003)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedType {
            family: Family::Run,
            ..
        }
    ));
}

#[tokio::test]
async fn run_completes_and_reports_output() {
    let f = fixture();
    let job_id = f
        .backend
        .put_job(settings(JobVariant::InteractiveNotebook, &f.cluster_id));
    let job = f.session.get_job(job_id).await.unwrap();
    let run = job.run().await.unwrap();

    let options = WaitOptions::new(Duration::from_millis(1), Duration::from_secs(5));
    let state = wait_for_run(&run, &options).await.unwrap();
    assert_eq!(state.life_cycle_state, RunLifeCycleState::Terminated);
    assert_eq!(state.result_state, Some(RunResultState::Success));

    f.backend.set_run_output(
        run.id(),
        RunOutput {
            notebook_output: Some(NotebookOutput {
                result: Some("done".into()),
                truncated: false,
            }),
            ..RunOutput::default()
        },
    );
    assert_eq!(run.output().await.unwrap().as_deref(), Some("done"));
}

#[tokio::test]
async fn deleted_job_is_gone() {
    let f = fixture();
    let job_id = f
        .backend
        .put_job(settings(JobVariant::AutomatedPython, &f.cluster_id));
    let job = f.session.get_job(job_id).await.unwrap();

    job.delete().await.unwrap();

    let err = f.session.get_job(job_id).await.unwrap_err();
    assert!(err
        .transport()
        .is_some_and(sparkdeck_api::ApiError::is_not_found));
}
