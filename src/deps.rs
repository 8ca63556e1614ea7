//! Third-party libraries the build toolchain must make available.
//!
//! The pipeline only declares this version-pinned set; resolving and
//! building the libraries belongs to the external toolchain. The set is
//! handed to the generate phase as a single cache define.

use std::fmt;

/// A pinned third-party library requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub name: &'static str,
    pub version: &'static str,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// The sample application's pinned dependency set.
pub const DEPENDENCIES: &[Dependency] = &[
    // cryptography
    Dependency { name: "botan", version: "2.19.2" },
    // concurrency and general utility
    Dependency { name: "boost", version: "1.79.0" },
    // logging
    Dependency { name: "spdlog", version: "1.10.0" },
    // XML parsing
    Dependency { name: "pugixml", version: "1.12.1" },
];

/// Renders the set as a semicolon-separated `name/version` list, the value
/// passed to the toolchain's dependency cache define.
pub fn cache_define_value() -> String {
    DEPENDENCIES
        .iter()
        .map(Dependency::to_string)
        .collect::<Vec<_>>()
        .join(";")
}
