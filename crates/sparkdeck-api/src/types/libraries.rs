//! Wire records for the `libraries/*` endpoints.

use serde::{Deserialize, Serialize};
use sparkdeck_core::ClusterId;

/// A package published on PyPI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PythonPyPiLibrary {
    /// Package name, optionally with a version pin (`numpy==1.26.0`).
    pub package: String,
    /// Index URL overriding the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

/// A package published to a Maven repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MavenLibrary {
    /// `group:artifact:version` coordinates.
    pub coordinates: String,
    /// Repository URL overriding Maven Central.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Dependencies to exclude, as `group:artifact`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<String>,
}

/// A package published on CRAN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RCranLibrary {
    /// Package name.
    pub package: String,
    /// CRAN mirror overriding the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

/// The wire form of a library. Exactly one field is populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibrarySpec {
    /// Storage URI of a jar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jar: Option<String>,
    /// Storage URI of an egg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egg: Option<String>,
    /// A PyPI package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pypi: Option<PythonPyPiLibrary>,
    /// A Maven package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maven: Option<MavenLibrary>,
    /// A CRAN package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cran: Option<RCranLibrary>,
}

/// Installation progress of a library on a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LibraryInstallStatus {
    /// Install requested, not yet started.
    Pending,
    /// Dependencies are being resolved.
    Resolving,
    /// Files are being installed.
    Installing,
    /// Installed and usable.
    Installed,
    /// Skipped, typically because the cluster runtime is incompatible.
    Skipped,
    /// Installation failed.
    Failed,
    /// Marked for removal on the next restart.
    UninstallOnRestart,
}

impl LibraryInstallStatus {
    /// Returns true once the install will not progress any further.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(
            self,
            Self::Installed | Self::Skipped | Self::Failed | Self::UninstallOnRestart
        )
    }
}

/// One entry of a cluster's library status list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryFullStatus {
    /// The library this entry is about.
    pub library: LibrarySpec,
    /// Its installation progress.
    pub status: LibraryInstallStatus,
    /// Messages reported by the platform, typically on failure.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
    /// Whether the library is configured for every cluster.
    #[serde(default)]
    pub is_library_for_all_clusters: bool,
}

/// Response of `libraries/cluster-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterLibraryStatuses {
    /// The cluster the statuses belong to.
    pub cluster_id: ClusterId,
    /// One entry per library.
    #[serde(default)]
    pub library_statuses: Vec<LibraryFullStatus>,
}

/// Body of `libraries/install` and `libraries/uninstall`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrariesRequest {
    /// Target cluster.
    pub cluster_id: ClusterId,
    /// Libraries to install or remove.
    pub libraries: Vec<LibrarySpec>,
}
