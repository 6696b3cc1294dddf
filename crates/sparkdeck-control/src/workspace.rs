//! Workspace objects referenced by jobs.

use sparkdeck_api::types::{Language, ObjectInfo, ObjectType};
use sparkdeck_api::DbfsApi;

use crate::dbfs::strip_scheme;
use crate::error::{Error, Result};

/// A notebook in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notebook {
    path: String,
    language: Option<Language>,
    object_id: Option<i64>,
}

impl Notebook {
    /// Build a notebook from a workspace status record.
    ///
    /// # Errors
    ///
    /// Returns a resource error if the object is not a notebook.
    pub fn from_info(info: ObjectInfo) -> Result<Self> {
        if info.object_type != ObjectType::Notebook {
            return Err(Error::resource(format!(
                "{} is not a notebook ({:?})",
                info.path, info.object_type
            )));
        }
        Ok(Self {
            path: info.path,
            language: info.language,
            object_id: info.object_id,
        })
    }

    /// Workspace path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Notebook language.
    #[must_use]
    pub const fn language(&self) -> Option<Language> {
        self.language
    }

    /// Platform object id.
    #[must_use]
    pub const fn object_id(&self) -> Option<i64> {
        self.object_id
    }
}

/// A python script run by a python job, e.g. `dbfs:/jobs/etl.py`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonScript {
    uri: String,
}

impl PythonScript {
    /// A reference that has not been checked against the file store.
    pub(crate) fn unchecked(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// Resolve a script reference.
    ///
    /// `dbfs:` scripts must exist and be a file. Other schemes (`s3:`,
    /// `file:`) are accepted as is.
    ///
    /// # Errors
    ///
    /// Returns a resource error if a `dbfs:` script is missing or a directory.
    pub(crate) async fn resolve(dbfs: &dyn DbfsApi, uri: &str) -> Result<Self> {
        if let Some(path) = strip_scheme(uri) {
            let status = dbfs.get_status(path).await.map_err(|e| {
                Error::resource_caused_by(format!("python script {uri} could not be found"), e.into())
            })?;
            if status.is_dir {
                return Err(Error::resource(format!("python script {uri} is a directory")));
            }
        }
        Ok(Self::unchecked(uri))
    }

    /// The script URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }
}
