use serde::{Deserialize, Serialize};
use std::fmt;

/// Host operating system family as far as launching is concerned.
///
/// `MacOs` is kept apart from `Other` only so the configuration directory can
/// be computed; the client cannot be launched there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl Platform {
    /// Classify an OS identifier as reported by `std::env::consts::OS`.
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            _ => Self::Other,
        }
    }

    #[inline]
    pub fn is_windows(self) -> bool {
        self == Self::Windows
    }

    #[inline]
    pub fn is_linux(self) -> bool {
        self == Self::Linux
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn current_platform() -> Platform {
    Platform::from_os(std::env::consts::OS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_identifiers() {
        assert_eq!(Platform::from_os("windows"), Platform::Windows);
        assert_eq!(Platform::from_os("linux"), Platform::Linux);
        assert_eq!(Platform::from_os("macos"), Platform::MacOs);
        assert_eq!(Platform::from_os("freebsd"), Platform::Other);
    }

    #[test]
    fn current_platform_is_stable() {
        assert_eq!(current_platform(), current_platform());
        #[cfg(target_os = "linux")]
        assert!(current_platform().is_linux());
        #[cfg(windows)]
        assert!(current_platform().is_windows());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Platform::MacOs).unwrap();
        assert_eq!(json, "\"macos\"");
    }
}
