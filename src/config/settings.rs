use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default base name of the native library.
pub const DEFAULT_LIBRARY_NAME: &str = "freeimagealgorithms";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library_name: String,
    pub search_dirs: Vec<PathBuf>,
    pub include_exe_dir: bool,
    pub initialise: bool,
    pub forward_messages: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            library_name: DEFAULT_LIBRARY_NAME.to_string(),
            search_dirs: Vec::new(),
            include_exe_dir: true,
            initialise: true,
            forward_messages: true,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::FiaError::config(format!("Failed to parse settings YAML: {e}"))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Relative search directories are resolved against `base_dir`.
    pub fn resolve_relative_to(mut self, base_dir: &Path) -> Self {
        for dir in &mut self.search_dirs {
            if dir.is_relative() {
                *dir = base_dir.join(&*dir);
            }
        }
        self
    }

    /// The full directory list handed to the loader, in search order.
    pub fn effective_search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.search_dirs.clone();
        if self.include_exe_dir {
            if let Some(exe_dir) = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(Path::to_path_buf))
            {
                if !dirs.contains(&exe_dir) {
                    dirs.push(exe_dir);
                }
            }
        }
        dirs
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.library_name.trim().is_empty() {
            return Err(crate::error::FiaError::config(
                "library_name must not be empty",
            ));
        }
        Ok(())
    }
}
