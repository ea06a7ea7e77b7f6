//! Maven coordinates and the names derived from them.

use crate::catalog::LibraryDescriptor;
use serde::Serialize;
use std::fmt;

/// A fully qualified artifact: `group:artifact:version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

/// Combine a catalog entry with a configured version. No validation.
pub fn resolve(descriptor: &LibraryDescriptor, version: impl Into<String>) -> Dependency {
    Dependency {
        group_id: descriptor.group_id.to_string(),
        artifact_id: descriptor.artifact_id.to_string(),
        version: version.into(),
    }
}

impl Dependency {
    /// Cache file name. Does not include the group id, so two groups
    /// publishing the same artifact id and version share a file.
    pub fn file_name(&self, packaging: &str) -> String {
        format!("{}-{}.{}", self.artifact_id, self.version, packaging)
    }

    /// Group id as a repository path (`org.jetbrains.kotlin` -> `org/jetbrains/kotlin`).
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// Standard Maven layout URL. `base` is concatenated as-is and is
    /// expected to end with `/`.
    pub fn download_url(&self, base: &str, packaging: &str) -> String {
        format!(
            "{}{}/{}/{}/{}",
            base,
            self.group_path(),
            self.artifact_id,
            self.version,
            self.file_name(packaging)
        )
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stdlib(version: &str) -> Dependency {
        Dependency {
            group_id: "org.jetbrains.kotlin".to_string(),
            artifact_id: "kotlin-stdlib-jdk8".to_string(),
            version: version.to_string(),
        }
    }

    #[test]
    fn file_name_ignores_group() {
        let a = stdlib("1.8.0");
        let mut b = stdlib("1.8.0");
        b.group_id = "com.example.fork".to_string();

        assert_eq!(a.file_name("jar"), "kotlin-stdlib-jdk8-1.8.0.jar");
        assert_eq!(a.file_name("jar"), b.file_name("jar"));
    }

    #[test]
    fn download_url_uses_maven_layout() {
        let url = stdlib("1.8.0").download_url("https://repo.maven.apache.org/maven2/", "jar");
        assert_eq!(
            url,
            "https://repo.maven.apache.org/maven2/org/jetbrains/kotlin/kotlin-stdlib-jdk8/1.8.0/kotlin-stdlib-jdk8-1.8.0.jar"
        );
    }

    #[test]
    fn empty_version_propagates_into_url() {
        let url = stdlib("").download_url("https://repo.example/", "jar");
        assert_eq!(
            url,
            "https://repo.example/org/jetbrains/kotlin/kotlin-stdlib-jdk8//kotlin-stdlib-jdk8-.jar"
        );
    }

    #[test]
    fn resolve_twice_is_equal() {
        let lib = LibraryDescriptor::find("stdlib").unwrap();
        let first = resolve(lib, "1.8.0");
        let second = resolve(lib, "1.8.0");
        assert_eq!(first, second);
        assert_eq!(first.group_id, second.group_id);
        assert_eq!(first.artifact_id, second.artifact_id);
        assert_eq!(first.version, second.version);
    }

    #[test]
    fn display_is_gav() {
        assert_eq!(
            stdlib("1.8.0").to_string(),
            "org.jetbrains.kotlin:kotlin-stdlib-jdk8:1.8.0"
        );
    }
}
