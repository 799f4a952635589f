use crate::error::{LibrarianError, Result};
use std::fmt;

/// Level of change a set of commits introduces.
///
/// Totally ordered: `None < Patch < Minor < Major`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeLevel {
    #[default]
    None,
    Patch,
    Minor,
    Major,
}

impl fmt::Display for ChangeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeLevel::None => write!(f, "none"),
            ChangeLevel::Patch => write!(f, "patch"),
            ChangeLevel::Minor => write!(f, "minor"),
            ChangeLevel::Major => write!(f, "major"),
        }
    }
}

/// Semantic version representation
///
/// The three numeric components are parsed leniently (any non-negative
/// integer), while pre-release and build suffixes must satisfy semver's
/// identifier grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<semver::Prerelease>,
    pub build: Option<semver::BuildMetadata>,
}

impl Version {
    /// Create a new version without suffixes
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            pre: None,
            build: None,
        }
    }

    /// Parse `X.Y.Z[-pre][+build]`
    pub fn parse(input: &str) -> Result<Self> {
        let (rest, build) = match input.split_once('+') {
            Some((_, "")) => {
                return Err(LibrarianError::malformed_version(input, "empty build metadata"));
            }
            Some((rest, build)) => {
                let build = semver::BuildMetadata::new(build).map_err(|e| {
                    LibrarianError::malformed_version(input, format!("invalid build metadata: {}", e))
                })?;
                (rest, Some(build))
            }
            None => (input, None),
        };

        let (core, pre) = match rest.split_once('-') {
            Some((_, "")) => {
                return Err(LibrarianError::malformed_version(input, "empty pre-release"));
            }
            Some((core, pre)) => {
                let pre = semver::Prerelease::new(pre).map_err(|e| {
                    LibrarianError::malformed_version(input, format!("invalid pre-release: {}", e))
                })?;
                (core, Some(pre))
            }
            None => (rest, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(LibrarianError::malformed_version(
                input,
                "expected three dot-separated components X.Y.Z",
            ));
        }

        let component = |name: &str, value: &str| -> Result<u64> {
            if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(LibrarianError::malformed_version(
                    input,
                    format!("invalid {} component '{}'", name, value),
                ));
            }
            value.parse::<u64>().map_err(|_| {
                LibrarianError::malformed_version(
                    input,
                    format!("{} component '{}' is out of range", name, value),
                )
            })
        };

        Ok(Version {
            major: component("major", parts[0])?,
            minor: component("minor", parts[1])?,
            patch: component("patch", parts[2])?,
            pre,
            build,
        })
    }

    /// Pre-general-availability versions have a zero major component
    pub fn is_pre_ga(&self) -> bool {
        self.major == 0
    }

    /// Bump version according to change level.
    ///
    /// Suffixes are dropped on any bump and kept on `ChangeLevel::None`.
    /// A component already at `u64::MAX` cannot be bumped.
    pub fn bump(&self, level: ChangeLevel) -> Result<Self> {
        let next = |name: &str, value: u64| -> Result<u64> {
            value.checked_add(1).ok_or_else(|| {
                LibrarianError::malformed_version(
                    self.to_string(),
                    format!("{} component out of range", name),
                )
            })
        };

        Ok(match level {
            ChangeLevel::None => self.clone(),
            ChangeLevel::Major => Version::new(next("major", self.major)?, 0, 0),
            ChangeLevel::Minor => Version::new(self.major, next("minor", self.minor)?, 0),
            ChangeLevel::Patch => Version::new(self.major, self.minor, next("patch", self.patch)?),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}
