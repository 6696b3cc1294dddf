//! Wire records for the `dbfs/*` endpoints.

use serde::{Deserialize, Serialize};

/// Status of a file-store entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub file_size: u64,
}

/// Body of `dbfs/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHandleRequest {
    pub path: String,
    pub overwrite: bool,
}

/// Response of `dbfs/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHandleResponse {
    pub handle: i64,
}

/// Body of `dbfs/add-block`. `data` is base64 encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddBlockRequest {
    pub handle: i64,
    pub data: String,
}

/// Body of `dbfs/close`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseRequest {
    pub handle: i64,
}

/// Response of `dbfs/read`. `data` is base64 encoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadResponse {
    #[serde(default)]
    pub bytes_read: u64,
    #[serde(default)]
    pub data: String,
}

/// Body of `dbfs/delete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbfsDeleteRequest {
    pub path: String,
    pub recursive: bool,
}

/// Body of `dbfs/move`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    pub source_path: String,
    pub destination_path: String,
}

/// Body of `dbfs/mkdirs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRequest {
    pub path: String,
}

/// Response of `dbfs/list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub files: Vec<FileInfo>,
}
