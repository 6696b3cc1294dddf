//! REST API 2.0 client over HTTP.
//!
//! [`HttpTransport`] owns the `reqwest` client, the base URL and the
//! credentials; one `Http*Client` per family shares it and maps trait calls
//! onto `{host}/api/2.0/{family}/{operation}` endpoints.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use sparkdeck_core::{ClusterId, JobId, RunId};

use crate::api::{Backend, ClustersApi, DbfsApi, JobsApi, LibrariesApi, WorkspaceApi};
use crate::auth::Credentials;
use crate::error::{ApiError, Result};
use crate::types::dbfs::{
    AddBlockRequest, CloseRequest, CreateHandleRequest, CreateHandleResponse, DbfsDeleteRequest,
    ListResponse, MoveRequest, PathRequest, ReadResponse,
};
use crate::types::jobs::JobIdRequest;
use crate::types::workspace::{
    ExportResponse, ImportRequest, ListObjectsResponse, WorkspaceDeleteRequest,
    WorkspaceMkdirsRequest,
};
use crate::types::{
    ClusterIdRequest, ClusterInfo, ClusterLibraryStatuses, CreateClusterResponse,
    CreateJobResponse, ExportFormat, FileInfo, JobInfo, JobSettings, LibrariesRequest,
    LibrarySpec, ListClustersResponse, NewCluster, NodeTypesResponse, NotebookImport, ObjectInfo,
    ResizeClusterRequest, RunInfo, RunNowRequest, RunNowResponse, RunOutput,
    SparkVersionsResponse, ZonesResponse,
};

const API_PREFIX: &str = "api/2.0";

/// Connection settings for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Workspace host, e.g. `https://example.cloud.databricks.com`. A bare host
    /// name gets an `https://` scheme.
    pub host: String,
    /// Credentials attached to every request.
    pub credentials: Credentials,
    /// Total timeout for one request.
    pub request_timeout: Duration,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
}

impl HttpConfig {
    /// Settings with the default timeouts (60 s per request, 10 s to connect).
    #[must_use]
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            host: host.into(),
            credentials,
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Error body returned by the platform on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_code: Option<String>,
    message: Option<String>,
}

/// Shared HTTP state for all family clients.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpTransport {
    /// Create a transport from connection settings.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created.
    #[must_use]
    pub fn new(config: HttpConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self::with_client(client, &config.host, config.credentials)
    }

    /// Create a transport with a custom reqwest client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, host: &str, credentials: Credentials) -> Self {
        Self {
            client,
            base_url: normalize_host(host),
            credentials,
        }
    }

    /// The normalized base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{API_PREFIX}/{path}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        tracing::debug!(method = "GET", path, "Sending request");

        let request = self.client.get(self.url(path)).query(query);
        let response = self
            .credentials
            .apply(request)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Self::handle_response(path, response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!(method = "POST", path, "Sending request");

        let request = self.client.post(self.url(path)).json(body);
        let response = self
            .credentials
            .apply(request)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Self::handle_response(path, response).await
    }

    /// `POST` whose response body carries nothing of interest.
    async fn post_unit<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.post::<B, IgnoredAny>(path, body).await.map(|_| ())
    }

    async fn handle_response<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| ApiError::Request(e.to_string()))?;
            let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
                b"{}"
            } else {
                &body
            };
            return serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()));
        }

        tracing::debug!(path, status = status.as_u16(), "Request failed");

        match status.as_u16() {
            401 => Err(ApiError::Unauthenticated),
            403 => Err(ApiError::Unauthorized),
            code => {
                let body: Option<ErrorBody> = response.json().await.ok();
                let (error_code, message) = match body {
                    Some(body) => (body.error_code, body.message),
                    None => (None, None),
                };
                Err(ApiError::Status {
                    status: code,
                    error_code,
                    message: message.unwrap_or_else(|| format!("request to {path} failed")),
                })
            }
        }
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(data)
        .map_err(|e| ApiError::Decode(format!("invalid base64 content: {e}")))
}

// ===== Clusters =====

/// `clusters/*` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClustersClient {
    transport: Arc<HttpTransport>,
}

impl HttpClustersClient {
    /// Create a client on a shared transport.
    #[must_use]
    pub const fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ClustersApi for HttpClustersClient {
    async fn create(&self, spec: &NewCluster) -> Result<ClusterId> {
        let response: CreateClusterResponse = self.transport.post("clusters/create", spec).await?;
        Ok(response.cluster_id)
    }

    async fn get(&self, cluster_id: &ClusterId) -> Result<ClusterInfo> {
        self.transport
            .get("clusters/get", &[("cluster_id", cluster_id.to_string())])
            .await
    }

    async fn list(&self) -> Result<Vec<ClusterInfo>> {
        let response: ListClustersResponse = self.transport.get("clusters/list", &[]).await?;
        Ok(response.clusters)
    }

    async fn resize(&self, request: &ResizeClusterRequest) -> Result<()> {
        self.transport.post_unit("clusters/resize", request).await
    }

    async fn restart(&self, cluster_id: &ClusterId) -> Result<()> {
        let body = ClusterIdRequest {
            cluster_id: cluster_id.clone(),
        };
        self.transport.post_unit("clusters/restart", &body).await
    }

    async fn terminate(&self, cluster_id: &ClusterId) -> Result<()> {
        let body = ClusterIdRequest {
            cluster_id: cluster_id.clone(),
        };
        self.transport.post_unit("clusters/delete", &body).await
    }

    async fn permanent_delete(&self, cluster_id: &ClusterId) -> Result<()> {
        let body = ClusterIdRequest {
            cluster_id: cluster_id.clone(),
        };
        self.transport
            .post_unit("clusters/permanent-delete", &body)
            .await
    }

    async fn spark_versions(&self) -> Result<SparkVersionsResponse> {
        self.transport.get("clusters/spark-versions", &[]).await
    }

    async fn node_types(&self) -> Result<NodeTypesResponse> {
        self.transport.get("clusters/list-node-types", &[]).await
    }

    async fn zones(&self) -> Result<ZonesResponse> {
        self.transport.get("clusters/list-zones", &[]).await
    }
}

// ===== Jobs =====

/// `jobs/*` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpJobsClient {
    transport: Arc<HttpTransport>,
}

impl HttpJobsClient {
    /// Create a client on a shared transport.
    #[must_use]
    pub const fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl JobsApi for HttpJobsClient {
    async fn create(&self, settings: &JobSettings) -> Result<JobId> {
        let response: CreateJobResponse = self.transport.post("jobs/create", settings).await?;
        Ok(response.job_id)
    }

    async fn get(&self, job_id: JobId) -> Result<JobInfo> {
        self.transport
            .get("jobs/get", &[("job_id", job_id.to_string())])
            .await
    }

    async fn run_now(&self, request: &RunNowRequest) -> Result<RunNowResponse> {
        self.transport.post("jobs/run-now", request).await
    }

    async fn get_run(&self, run_id: RunId) -> Result<RunInfo> {
        self.transport
            .get("jobs/runs/get", &[("run_id", run_id.to_string())])
            .await
    }

    async fn get_run_output(&self, run_id: RunId) -> Result<RunOutput> {
        self.transport
            .get("jobs/runs/get-output", &[("run_id", run_id.to_string())])
            .await
    }

    async fn delete(&self, job_id: JobId) -> Result<()> {
        self.transport
            .post_unit("jobs/delete", &JobIdRequest { job_id })
            .await
    }
}

// ===== Libraries =====

/// `libraries/*` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLibrariesClient {
    transport: Arc<HttpTransport>,
}

impl HttpLibrariesClient {
    /// Create a client on a shared transport.
    #[must_use]
    pub const fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl LibrariesApi for HttpLibrariesClient {
    async fn install(&self, cluster_id: &ClusterId, libraries: &[LibrarySpec]) -> Result<()> {
        let body = LibrariesRequest {
            cluster_id: cluster_id.clone(),
            libraries: libraries.to_vec(),
        };
        self.transport.post_unit("libraries/install", &body).await
    }

    async fn uninstall(&self, cluster_id: &ClusterId, libraries: &[LibrarySpec]) -> Result<()> {
        let body = LibrariesRequest {
            cluster_id: cluster_id.clone(),
            libraries: libraries.to_vec(),
        };
        self.transport.post_unit("libraries/uninstall", &body).await
    }

    async fn cluster_status(&self, cluster_id: &ClusterId) -> Result<ClusterLibraryStatuses> {
        self.transport
            .get(
                "libraries/cluster-status",
                &[("cluster_id", cluster_id.to_string())],
            )
            .await
    }
}

// ===== Workspace =====

/// `workspace/*` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpWorkspaceClient {
    transport: Arc<HttpTransport>,
}

impl HttpWorkspaceClient {
    /// Create a client on a shared transport.
    #[must_use]
    pub const fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl WorkspaceApi for HttpWorkspaceClient {
    async fn get_status(&self, path: &str) -> Result<ObjectInfo> {
        self.transport
            .get("workspace/get-status", &[("path", path.to_string())])
            .await
    }

    async fn list(&self, path: &str) -> Result<Vec<ObjectInfo>> {
        let response: ListObjectsResponse = self
            .transport
            .get("workspace/list", &[("path", path.to_string())])
            .await?;
        Ok(response.objects)
    }

    async fn mkdirs(&self, path: &str) -> Result<()> {
        let body = WorkspaceMkdirsRequest {
            path: path.to_string(),
        };
        self.transport.post_unit("workspace/mkdirs", &body).await
    }

    async fn delete(&self, path: &str, recursive: bool) -> Result<()> {
        let body = WorkspaceDeleteRequest {
            path: path.to_string(),
            recursive,
        };
        self.transport.post_unit("workspace/delete", &body).await
    }

    async fn export(&self, path: &str, format: ExportFormat) -> Result<Vec<u8>> {
        let response: ExportResponse = self
            .transport
            .get(
                "workspace/export",
                &[
                    ("path", path.to_string()),
                    ("format", format.as_str().to_string()),
                ],
            )
            .await?;
        decode_base64(&response.content)
    }

    async fn import(&self, notebook: &NotebookImport) -> Result<()> {
        let body = ImportRequest {
            path: notebook.path.clone(),
            format: notebook.format,
            language: notebook.language,
            content: STANDARD.encode(&notebook.content),
            overwrite: notebook.overwrite,
        };
        self.transport.post_unit("workspace/import", &body).await
    }
}

// ===== File store =====

/// `dbfs/*` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDbfsClient {
    transport: Arc<HttpTransport>,
}

impl HttpDbfsClient {
    /// Create a client on a shared transport.
    #[must_use]
    pub const fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl DbfsApi for HttpDbfsClient {
    async fn create(&self, path: &str, overwrite: bool) -> Result<i64> {
        let body = CreateHandleRequest {
            path: path.to_string(),
            overwrite,
        };
        let response: CreateHandleResponse = self.transport.post("dbfs/create", &body).await?;
        Ok(response.handle)
    }

    async fn add_block(&self, handle: i64, data: &[u8]) -> Result<()> {
        let body = AddBlockRequest {
            handle,
            data: STANDARD.encode(data),
        };
        self.transport.post_unit("dbfs/add-block", &body).await
    }

    async fn close(&self, handle: i64) -> Result<()> {
        self.transport
            .post_unit("dbfs/close", &CloseRequest { handle })
            .await
    }

    async fn read(&self, path: &str, offset: u64, length: u64) -> Result<Vec<u8>> {
        let response: ReadResponse = self
            .transport
            .get(
                "dbfs/read",
                &[
                    ("path", path.to_string()),
                    ("offset", offset.to_string()),
                    ("length", length.to_string()),
                ],
            )
            .await?;
        decode_base64(&response.data)
    }

    async fn get_status(&self, path: &str) -> Result<FileInfo> {
        self.transport
            .get("dbfs/get-status", &[("path", path.to_string())])
            .await
    }

    async fn delete(&self, path: &str, recursive: bool) -> Result<()> {
        let body = DbfsDeleteRequest {
            path: path.to_string(),
            recursive,
        };
        self.transport.post_unit("dbfs/delete", &body).await
    }

    async fn move_path(&self, source: &str, destination: &str) -> Result<()> {
        let body = MoveRequest {
            source_path: source.to_string(),
            destination_path: destination.to_string(),
        };
        self.transport.post_unit("dbfs/move", &body).await
    }

    async fn mkdirs(&self, path: &str) -> Result<()> {
        let body = PathRequest {
            path: path.to_string(),
        };
        self.transport.post_unit("dbfs/mkdirs", &body).await
    }

    async fn list(&self, path: &str) -> Result<Vec<FileInfo>> {
        let response: ListResponse = self
            .transport
            .get("dbfs/list", &[("path", path.to_string())])
            .await?;
        Ok(response.files)
    }
}

// ===== Backend =====

/// [`Backend`] over the platform's REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    transport: Arc<HttpTransport>,
}

impl HttpBackend {
    /// Create a backend from connection settings.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created.
    #[must_use]
    pub fn new(config: HttpConfig) -> Self {
        Self::with_transport(HttpTransport::new(config))
    }

    /// Create a backend on an existing transport.
    #[must_use]
    pub fn with_transport(transport: HttpTransport) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// The normalized base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }
}

impl Backend for HttpBackend {
    fn clusters(&self) -> Arc<dyn ClustersApi> {
        Arc::new(HttpClustersClient::new(Arc::clone(&self.transport)))
    }

    fn jobs(&self) -> Arc<dyn JobsApi> {
        Arc::new(HttpJobsClient::new(Arc::clone(&self.transport)))
    }

    fn libraries(&self) -> Arc<dyn LibrariesApi> {
        Arc::new(HttpLibrariesClient::new(Arc::clone(&self.transport)))
    }

    fn workspace(&self) -> Arc<dyn WorkspaceApi> {
        Arc::new(HttpWorkspaceClient::new(Arc::clone(&self.transport)))
    }

    fn dbfs(&self) -> Arc<dyn DbfsApi> {
        Arc::new(HttpDbfsClient::new(Arc::clone(&self.transport)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClusterState, LibraryInstallStatus, PythonPyPiLibrary};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_backend(server: &MockServer) -> HttpBackend {
        HttpBackend::new(HttpConfig::new(
            server.uri(),
            Credentials::Token("dapi-test".into()),
        ))
    }

    #[test]
    fn host_normalization() {
        assert_eq!(normalize_host("example.cloud.databricks.com"), "https://example.cloud.databricks.com");
        assert_eq!(normalize_host("https://example.com/"), "https://example.com");
        assert_eq!(normalize_host("http://127.0.0.1:8080"), "http://127.0.0.1:8080");
    }

    #[tokio::test]
    async fn get_cluster_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2.0/clusters/get"))
            .and(query_param("cluster_id", "1234-abc"))
            .and(header("authorization", "Bearer dapi-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cluster_id": "1234-abc",
                "cluster_name": "t1",
                "state": "RUNNING",
                "num_workers": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let clusters = token_backend(&server).clusters();
        let info = clusters.get(&"1234-abc".parse().unwrap()).await.unwrap();

        assert_eq!(info.state, ClusterState::Running);
        assert_eq!(info.cluster_name.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn basic_auth_when_no_token() {
        let server = MockServer::start().await;
        // "me:pw" base64 encoded
        Mock::given(method("GET"))
            .and(path("/api/2.0/clusters/list"))
            .and(header("authorization", "Basic bWU6cHc="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(HttpConfig::new(
            server.uri(),
            Credentials::Basic {
                username: "me".into(),
                password: "pw".into(),
            },
        ));
        let clusters = backend.clusters().list().await.unwrap();
        assert!(clusters.is_empty());
    }

    #[tokio::test]
    async fn status_classification() {
        let server = MockServer::start().await;
        Mock::given(path("/api/2.0/jobs/get"))
            .and(query_param("job_id", "1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(path("/api/2.0/jobs/get"))
            .and(query_param("job_id", "2"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(path("/api/2.0/jobs/get"))
            .and(query_param("job_id", "3"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error_code": "INTERNAL_ERROR",
                "message": "something broke"
            })))
            .mount(&server)
            .await;
        Mock::given(path("/api/2.0/jobs/get"))
            .and(query_param("job_id", "4"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let jobs = token_backend(&server).jobs();

        assert!(matches!(
            jobs.get(JobId::new(1)).await,
            Err(ApiError::Unauthenticated)
        ));
        assert!(matches!(
            jobs.get(JobId::new(2)).await,
            Err(ApiError::Unauthorized)
        ));
        match jobs.get(JobId::new(3)).await {
            Err(ApiError::Status {
                status,
                error_code,
                message,
            }) => {
                assert_eq!(status, 500);
                assert_eq!(error_code.as_deref(), Some("INTERNAL_ERROR"));
                assert_eq!(message, "something broke");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        match jobs.get(JobId::new(4)).await {
            Err(ApiError::Status {
                status, error_code, ..
            }) => {
                assert_eq!(status, 502);
                assert!(error_code.is_none());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_success_body_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/2.0/clusters/delete"))
            .and(body_json(serde_json::json!({"cluster_id": "1234-abc"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        token_backend(&server)
            .clusters()
            .terminate(&"1234-abc".parse().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn install_sends_library_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/2.0/libraries/install"))
            .and(body_json(serde_json::json!({
                "cluster_id": "1234-abc",
                "libraries": [{"pypi": {"package": "numpy"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/2.0/libraries/cluster-status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cluster_id": "1234-abc",
                "library_statuses": [
                    {"library": {"pypi": {"package": "numpy"}}, "status": "INSTALLED"}
                ]
            })))
            .mount(&server)
            .await;

        let libraries = token_backend(&server).libraries();
        let cluster_id: ClusterId = "1234-abc".parse().unwrap();
        let spec = LibrarySpec {
            pypi: Some(PythonPyPiLibrary {
                package: "numpy".into(),
                repo: None,
            }),
            ..LibrarySpec::default()
        };

        libraries.install(&cluster_id, &[spec]).await.unwrap();
        let statuses = libraries.cluster_status(&cluster_id).await.unwrap();
        assert_eq!(
            statuses.library_statuses[0].status,
            LibraryInstallStatus::Installed
        );
    }

    #[tokio::test]
    async fn dbfs_blocks_are_base64() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/2.0/dbfs/add-block"))
            .and(body_json(serde_json::json!({"handle": 7, "data": "aGVsbG8="})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/2.0/dbfs/read"))
            .and(query_param("path", "/tmp/x"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "bytes_read": 5,
                "data": "aGVsbG8="
            })))
            .mount(&server)
            .await;

        let dbfs = token_backend(&server).dbfs();
        dbfs.add_block(7, b"hello").await.unwrap();
        let data = dbfs.read("/tmp/x", 0, 1024).await.unwrap();
        assert_eq!(data, b"hello");
    }

    #[tokio::test]
    async fn export_decodes_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2.0/workspace/export"))
            .and(query_param("format", "SOURCE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": "cHJpbnQoMSk="
            })))
            .mount(&server)
            .await;

        let content = token_backend(&server)
            .workspace()
            .export("/Users/me/nb", ExportFormat::Source)
            .await
            .unwrap();
        assert_eq!(content, b"print(1)");
    }
}
