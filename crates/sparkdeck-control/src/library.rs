//! Libraries and their association with clusters.
//!
//! A library has no platform id. Status lookups match a cluster's status
//! entries against the library's identity: its kind, package or coordinate
//! identifier and repository override. Two separately built libraries with
//! the same identity are the same library.

use sparkdeck_api::types::{
    LibraryFullStatus, LibraryInstallStatus, LibrarySpec, MavenLibrary, PythonPyPiLibrary,
    RCranLibrary,
};

use crate::cluster::Cluster;
use crate::error::{Error, Family, Result};

/// The kind of a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryKind {
    /// Java archive at a storage path.
    Jar,
    /// Python egg at a storage path.
    Egg,
    /// Package from PyPI.
    PyPi,
    /// Maven coordinates.
    Maven,
    /// Package from CRAN.
    Cran,
}

impl LibraryKind {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jar => "jar",
            Self::Egg => "egg",
            Self::PyPi => "pypi",
            Self::Maven => "maven",
            Self::Cran => "cran",
        }
    }
}

/// A library that can be installed on a cluster or attached to a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Library {
    /// Java archive, e.g. `dbfs:/libs/etl.jar`.
    Jar {
        /// Storage URI.
        uri: String,
    },
    /// Python egg, e.g. `dbfs:/libs/etl.egg`.
    Egg {
        /// Storage URI.
        uri: String,
    },
    /// PyPI package, optionally pinned, e.g. `numpy==1.19.0`.
    PyPi {
        /// Package requirement.
        package: String,
        /// Index URL override.
        repo: Option<String>,
    },
    /// Maven artifact.
    Maven {
        /// `group:artifact:version`.
        coordinates: String,
        /// Repository override.
        repo: Option<String>,
        /// Dependencies to leave out.
        exclusions: Vec<String>,
    },
    /// CRAN package.
    Cran {
        /// Package name.
        package: String,
        /// Mirror override.
        repo: Option<String>,
    },
}

impl Library {
    /// A jar at `uri`.
    #[must_use]
    pub fn jar(uri: impl Into<String>) -> Self {
        Self::Jar { uri: uri.into() }
    }

    /// An egg at `uri`.
    #[must_use]
    pub fn egg(uri: impl Into<String>) -> Self {
        Self::Egg { uri: uri.into() }
    }

    /// A PyPI package from the default index.
    #[must_use]
    pub fn pypi(package: impl Into<String>) -> Self {
        Self::PyPi {
            package: package.into(),
            repo: None,
        }
    }

    /// A Maven artifact from the default repository.
    #[must_use]
    pub fn maven(coordinates: impl Into<String>) -> Self {
        Self::Maven {
            coordinates: coordinates.into(),
            repo: None,
            exclusions: Vec::new(),
        }
    }

    /// A CRAN package from the default mirror.
    #[must_use]
    pub fn cran(package: impl Into<String>) -> Self {
        Self::Cran {
            package: package.into(),
            repo: None,
        }
    }

    /// Set the repository override. Ignored for archive libraries.
    #[must_use]
    pub fn with_repo(mut self, repository: impl Into<String>) -> Self {
        match &mut self {
            Self::PyPi { repo, .. } | Self::Maven { repo, .. } | Self::Cran { repo, .. } => {
                *repo = Some(repository.into());
            }
            Self::Jar { .. } | Self::Egg { .. } => {}
        }
        self
    }

    /// Set Maven exclusions. Ignored for other kinds.
    #[must_use]
    pub fn with_exclusions<I, S>(mut self, excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Self::Maven { exclusions, .. } = &mut self {
            *exclusions = excluded.into_iter().map(Into::into).collect();
        }
        self
    }

    /// The library kind.
    #[must_use]
    pub const fn kind(&self) -> LibraryKind {
        match self {
            Self::Jar { .. } => LibraryKind::Jar,
            Self::Egg { .. } => LibraryKind::Egg,
            Self::PyPi { .. } => LibraryKind::PyPi,
            Self::Maven { .. } => LibraryKind::Maven,
            Self::Cran { .. } => LibraryKind::Cran,
        }
    }

    /// Storage URI, package requirement or Maven coordinates.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Jar { uri } | Self::Egg { uri } => uri,
            Self::PyPi { package, .. } | Self::Cran { package, .. } => package,
            Self::Maven { coordinates, .. } => coordinates,
        }
    }

    /// Repository override.
    #[must_use]
    pub fn repo(&self) -> Option<&str> {
        match self {
            Self::Jar { .. } | Self::Egg { .. } => None,
            Self::PyPi { repo, .. } | Self::Maven { repo, .. } | Self::Cran { repo, .. } => {
                repo.as_deref()
            }
        }
    }

    /// The identity used for matching: kind, identifier and repository.
    #[must_use]
    pub fn identity(&self) -> (LibraryKind, &str, Option<&str>) {
        (self.kind(), self.identifier(), self.repo())
    }

    /// Whether `other` is the same library. Maven exclusions are ignored.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }

    /// The wire representation.
    #[must_use]
    pub fn to_spec(&self) -> LibrarySpec {
        let mut spec = LibrarySpec::default();
        match self.clone() {
            Self::Jar { uri } => spec.jar = Some(uri),
            Self::Egg { uri } => spec.egg = Some(uri),
            Self::PyPi { package, repo } => spec.pypi = Some(PythonPyPiLibrary { package, repo }),
            Self::Maven {
                coordinates,
                repo,
                exclusions,
            } => {
                spec.maven = Some(MavenLibrary {
                    coordinates,
                    repo,
                    exclusions,
                });
            }
            Self::Cran { package, repo } => spec.cran = Some(RCranLibrary { package, repo }),
        }
        spec
    }

    /// Read a wire record. `None` if no known field is set.
    #[must_use]
    pub fn from_spec(spec: &LibrarySpec) -> Option<Self> {
        if let Some(uri) = &spec.jar {
            return Some(Self::jar(uri.clone()));
        }
        if let Some(uri) = &spec.egg {
            return Some(Self::egg(uri.clone()));
        }
        if let Some(pypi) = &spec.pypi {
            return Some(Self::PyPi {
                package: pypi.package.clone(),
                repo: pypi.repo.clone(),
            });
        }
        if let Some(maven) = &spec.maven {
            return Some(Self::Maven {
                coordinates: maven.coordinates.clone(),
                repo: maven.repo.clone(),
                exclusions: maven.exclusions.clone(),
            });
        }
        spec.cran.as_ref().map(|cran| Self::Cran {
            package: cran.package.clone(),
            repo: cran.repo.clone(),
        })
    }

    /// Ask the platform to install this library on `cluster`.
    ///
    /// Completion is not awaited; poll [`ClusterLibrary::status`].
    ///
    /// # Errors
    ///
    /// Returns a library configuration error wrapping the transport failure.
    pub async fn install(&self, cluster: &Cluster) -> Result<ClusterLibrary> {
        cluster
            .libraries_api()
            .install(cluster.id(), &[self.to_spec()])
            .await
            .map_err(|e| Error::from(e).within(Family::Library))?;

        tracing::info!(
            cluster_id = %cluster.id(),
            kind = self.kind().as_str(),
            library = self.identifier(),
            "Installing library"
        );
        Ok(ClusterLibrary {
            cluster: cluster.clone(),
            library: self.clone(),
        })
    }

    /// Ask the platform to remove this library from `cluster`. Takes effect
    /// on the next restart.
    ///
    /// # Errors
    ///
    /// Returns a library configuration error wrapping the transport failure.
    pub async fn uninstall(&self, cluster: &Cluster) -> Result<()> {
        cluster
            .libraries_api()
            .uninstall(cluster.id(), &[self.to_spec()])
            .await
            .map_err(|e| Error::from(e).within(Family::Library))?;

        tracing::info!(
            cluster_id = %cluster.id(),
            kind = self.kind().as_str(),
            library = self.identifier(),
            "Uninstalling library"
        );
        Ok(())
    }

    /// Status of this library on `cluster`.
    ///
    /// # Errors
    ///
    /// Returns a library configuration error if the cluster has no entry for
    /// this library, or wrapping the transport failure.
    pub async fn cluster_status(&self, cluster: &Cluster) -> Result<LibraryStatus> {
        cluster
            .library_statuses()
            .await?
            .into_iter()
            .find(|status| status.library.matches(self))
            .ok_or_else(|| {
                Error::config(
                    Family::Library,
                    format!(
                        "{} library {} is not associated with cluster {}",
                        self.kind().as_str(),
                        self.identifier(),
                        cluster.id()
                    ),
                )
            })
    }
}

/// A library installed on a cluster.
#[derive(Debug, Clone)]
pub struct ClusterLibrary {
    cluster: Cluster,
    library: Library,
}

impl ClusterLibrary {
    /// The cluster.
    #[must_use]
    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// The library.
    #[must_use]
    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Current installation status.
    ///
    /// # Errors
    ///
    /// See [`Library::cluster_status`].
    pub async fn status(&self) -> Result<LibraryStatus> {
        self.library.cluster_status(&self.cluster).await
    }

    /// Remove the library from the cluster.
    ///
    /// # Errors
    ///
    /// See [`Library::uninstall`].
    pub async fn uninstall(self) -> Result<()> {
        self.library.uninstall(&self.cluster).await
    }
}

/// One library's installation progress on one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryStatus {
    /// The library.
    pub library: Library,
    /// Installation state.
    pub state: LibraryInstallStatus,
    /// Messages from the platform, e.g. install errors.
    pub messages: Vec<String>,
    /// Whether the library is installed on every cluster.
    pub for_all_clusters: bool,
}

impl TryFrom<LibraryFullStatus> for LibraryStatus {
    type Error = Error;

    fn try_from(status: LibraryFullStatus) -> Result<Self> {
        let library = Library::from_spec(&status.library).ok_or_else(|| {
            Error::config(Family::Library, "status entry carries no known library kind")
        })?;
        Ok(Self {
            library,
            state: status.status,
            messages: status.messages,
            for_all_clusters: status.is_library_for_all_clusters,
        })
    }
}
