//! Package description for IMOD
//!
//! Static metadata only: the pinned version, where to get it, and what must
//! already be present on the host. The build steps live in [`crate::stage`],
//! [`crate::install`] and [`crate::environment`].

mod dependency;

pub use dependency::{check_dependencies, probe_all, Dependency, DependencyStatus};

use std::fmt;

/// A downloadable, pinned version of the package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// Version string as published upstream
    pub version: &'static str,
    /// SHA256 of the archive (lowercase hex)
    pub sha256: &'static str,
    /// Download URL
    pub url: &'static str,
    /// Whether the archive is unpacked by the fetcher.
    /// Always false here: the archive is a self-extracting shell script.
    pub expand: bool,
}

impl Descriptor {
    /// File name of the archive, taken from the last URL segment
    pub fn archive_name(&self) -> &'static str {
        self.url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("archive.sh")
    }
}

/// Everything the orchestrator needs to know about the package
#[derive(Debug, Clone, Copy)]
pub struct Recipe {
    pub name: &'static str,
    pub homepage: &'static str,
    pub description: &'static str,
    pub descriptor: Descriptor,
    pub dependencies: &'static [Dependency],
}

impl Recipe {
    /// Directory name used for the stage and cached archive
    pub fn stage_name(&self) -> String {
        format!("{}-{}", self.name, self.descriptor.version)
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.descriptor.version)
    }
}

/// IMOD 4.11.24, RHEL7 64-bit build with CUDA 10.1
pub const IMOD: Recipe = Recipe {
    name: "imod",
    homepage: "https://bio3d.colorado.edu/imod/",
    description: "Image processing, modeling and display programs for tomographic \
                  reconstruction and 3D reconstruction of EM serial sections and optical sections.",
    descriptor: Descriptor {
        version: "4.11.24",
        sha256: "7d128a0f0fda4bbb79bd75823e9242ffb548c9c596a27b3ce92e0dfd790dfaff",
        url: "https://bio3d.colorado.edu/imod/AMD64-RHEL5/imod_4.11.24_RHEL7-64_CUDA10.1.sh",
        expand: false,
    },
    dependencies: &[
        Dependency {
            name: "python",
            probe: &["python3", "--version"],
            hint: "Install Python 3 (e.g. dnf install python3)",
        },
        Dependency {
            name: "java",
            probe: &["java", "-version"],
            hint: "Install a Java runtime (e.g. dnf install java-latest-openjdk)",
        },
        Dependency {
            name: "mesa-glu",
            probe: &["pkg-config", "--exists", "glu"],
            hint: "Install the OpenGL utility library (e.g. dnf install mesa-libGLU)",
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_is_pinned() {
        let d = IMOD.descriptor;
        assert_eq!(d.version, "4.11.24");
        assert_eq!(d.sha256.len(), 64);
        assert!(d.sha256.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(!d.expand);
    }

    #[test]
    fn archive_name_from_url() {
        assert_eq!(
            IMOD.descriptor.archive_name(),
            "imod_4.11.24_RHEL7-64_CUDA10.1.sh"
        );
    }

    #[test]
    fn declared_dependencies_are_unconstrained_names() {
        let names: Vec<_> = IMOD.dependencies.iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["python", "java", "mesa-glu"]);
    }

    #[test]
    fn recipe_display() {
        assert_eq!(IMOD.to_string(), "imod@4.11.24");
        assert_eq!(IMOD.stage_name(), "imod-4.11.24");
    }
}
