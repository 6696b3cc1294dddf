//! Library installs and file-store transfers against the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use sparkdeck_api::types::LibraryInstallStatus;
use sparkdeck_api::MockBackend;
use sparkdeck_control::dbfs::BLOCK_SIZE;
use sparkdeck_control::wait::wait_for_library;
use sparkdeck_control::{Family, Library, Session, WaitOptions};

fn fast() -> WaitOptions {
    WaitOptions::new(Duration::from_millis(1), Duration::from_secs(5))
}

#[tokio::test]
async fn pypi_library_installs() {
    let backend = MockBackend::new();
    let session = Session::with_backend(Arc::new(backend.clone()));
    let cluster_id = backend.add_running_cluster("libs", 1);
    let cluster = session.get_cluster(&cluster_id).await.unwrap();

    let numpy = Library::pypi("numpy");
    let installed = numpy.install(&cluster).await.unwrap();

    let status = wait_for_library(&installed, &fast()).await.unwrap();
    assert_eq!(status.state, LibraryInstallStatus::Installed);
    assert_eq!(status.library, numpy);

    let all = cluster.library_statuses().await.unwrap();
    assert_eq!(all.len(), 1);

    installed.uninstall().await.unwrap();
    let status = numpy.cluster_status(&cluster).await.unwrap();
    assert_eq!(status.state, LibraryInstallStatus::UninstallOnRestart);
}

#[tokio::test]
async fn status_of_unassociated_library_is_a_library_error() {
    let backend = MockBackend::new();
    let session = Session::with_backend(Arc::new(backend.clone()));
    let cluster_id = backend.add_running_cluster("libs", 1);
    let cluster = session.get_cluster(&cluster_id).await.unwrap();

    Library::maven("org.example:lib:1.0")
        .install(&cluster)
        .await
        .unwrap();

    let err = Library::maven("org.example:lib:2.0")
        .cluster_status(&cluster)
        .await
        .unwrap_err();
    assert_eq!(err.family(), Some(Family::Library));
    assert!(err.to_string().contains("org.example:lib:2.0"));
}

#[tokio::test]
async fn large_upload_is_split_into_blocks() {
    let backend = MockBackend::new();
    let session = Session::with_backend(Arc::new(backend.clone()));

    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("big.bin");
    let data: Vec<u8> = (0..BLOCK_SIZE * 2 + 17).map(|i| (i % 251) as u8).collect();
    std::fs::write(&local, &data).unwrap();

    let dbfs = session.dbfs();
    dbfs.put_file(&local, "dbfs:/data/big.bin", false).await.unwrap();

    assert_eq!(backend.request_count("dbfs/add-block"), 3);
    assert_eq!(backend.file("/data/big.bin").unwrap(), data);

    let read = dbfs.get("dbfs:/data/big.bin").await.unwrap();
    assert_eq!(read, data);
    assert_eq!(backend.request_count("dbfs/read"), 3);
}

#[tokio::test]
async fn missing_local_file_is_an_io_error() {
    let backend = MockBackend::new();
    let session = Session::with_backend(Arc::new(backend.clone()));
    let dir = tempfile::tempdir().unwrap();

    let err = session
        .dbfs()
        .put_file(&dir.path().join("absent"), "/x", true)
        .await
        .unwrap_err();
    assert!(matches!(err, sparkdeck_control::Error::Io(_)));
    assert_eq!(backend.total_requests(), 0);
}
