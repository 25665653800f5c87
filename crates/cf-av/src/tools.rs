//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers and caches the locations of `ffmpeg` and
//! `ffprobe` and provides lookup methods for the rest of the crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Known tool names that the registry manages.
const KNOWN_TOOLS: &[&str] = &["ffmpeg", "ffprobe"];

/// Directories checked before `PATH`; Homebrew installs are usually newer
/// than the system package.
const PREFERRED_DIRS: &[&str] = &["/opt/homebrew/bin", "/usr/local/bin"];

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool paths.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, PathBuf>,
}

impl ToolRegistry {
    /// Discover tools, honouring overrides from config.
    ///
    /// For each known tool, a configured path is used if it exists. Otherwise
    /// the preferred install directories are checked, then [`which::which`]
    /// searches `PATH`. Tools that are not found are omitted.
    pub fn discover(tools_config: &cf_core::config::ToolsConfig) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let custom_path = match name {
                "ffmpeg" => tools_config.ffmpeg_path.as_deref(),
                "ffprobe" => tools_config.ffprobe_path.as_deref(),
                _ => None,
            };

            let resolved = custom_path
                .filter(|p| p.exists())
                .map(Path::to_path_buf)
                .or_else(|| {
                    PREFERRED_DIRS
                        .iter()
                        .map(|dir| Path::new(dir).join(name))
                        .find(|p| p.is_file())
                })
                .or_else(|| which::which(name).ok());

            if let Some(path) = resolved {
                tracing::debug!("resolved {name} -> {}", path.display());
                tools.insert(name.to_string(), path);
            }
        }

        Self { tools }
    }

    /// Build a registry from explicit paths without touching the filesystem.
    pub fn with_paths(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        let mut tools = HashMap::new();
        tools.insert("ffmpeg".to_string(), ffmpeg);
        tools.insert("ffprobe".to_string(), ffprobe);
        Self { tools }
    }

    /// Return the path of the given tool, or an [`cf_core::Error::Tool`] if
    /// it was not found during discovery.
    pub fn require(&self, name: &str) -> cf_core::Result<&Path> {
        self.tools.get(name).map(PathBuf::as_path).ok_or_else(|| {
            cf_core::Error::tool(name, format!("{name} not found; is it installed and in PATH?"))
        })
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(path) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(path),
                    path: Some(path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}
