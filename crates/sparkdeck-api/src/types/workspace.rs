//! Wire records for the `workspace/*` endpoints.

use serde::{Deserialize, Serialize};

/// Kind of a workspace object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    Notebook,
    Directory,
    Library,
    File,
    Repo,
    #[serde(other)]
    Unknown,
}

/// Language of a notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Language {
    Scala,
    Python,
    Sql,
    R,
}

/// Format used when exporting or importing a notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportFormat {
    #[default]
    Source,
    Html,
    Jupyter,
    Dbc,
}

impl ExportFormat {
    /// The format's wire name, as used in query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "SOURCE",
            Self::Html => "HTML",
            Self::Jupyter => "JUPYTER",
            Self::Dbc => "DBC",
        }
    }
}

/// Status of a workspace object, as returned by `workspace/get-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub object_type: ObjectType,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<i64>,
}

/// Response of `workspace/list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListObjectsResponse {
    #[serde(default)]
    pub objects: Vec<ObjectInfo>,
}

/// Body of `workspace/mkdirs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMkdirsRequest {
    pub path: String,
}

/// Body of `workspace/delete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceDeleteRequest {
    pub path: String,
    pub recursive: bool,
}

/// Response of `workspace/export`. `content` is base64 encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    #[serde(default)]
    pub content: String,
}

/// Body of `workspace/import`. `content` is base64 encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub path: String,
    pub format: ExportFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    pub content: String,
    pub overwrite: bool,
}

/// A notebook to import, with its content as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookImport {
    /// Absolute workspace path of the notebook.
    pub path: String,
    /// Format of `content`.
    pub format: ExportFormat,
    /// Required when `format` is `Source`.
    pub language: Option<Language>,
    /// Notebook content.
    pub content: Vec<u8>,
    /// Replace an existing notebook at `path`.
    pub overwrite: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_info_decodes() {
        let info: ObjectInfo = serde_json::from_value(serde_json::json!({
            "path": "/Users/user@example.com/project/ScalaExampleNotebook",
            "language": "SCALA",
            "object_type": "NOTEBOOK",
            "object_id": 789
        }))
        .unwrap();
        assert_eq!(info.object_type, ObjectType::Notebook);
        assert_eq!(info.language, Some(Language::Scala));
    }

    #[test]
    fn unknown_object_type() {
        let ty: ObjectType = serde_json::from_str("\"DASHBOARD\"").unwrap();
        assert_eq!(ty, ObjectType::Unknown);
    }
}
