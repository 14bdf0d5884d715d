//! Template lookup.
//!
//! A name resolves, in order, to:
//!
//! 1. an existing file at that exact path
//! 2. the path with `.yaml` or `.yml` appended
//! 3. `<templates_dir>/<name>.yaml` or `.yml`

use super::{Template, TemplateError};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Anything that can turn a template name into a [`Template`].
pub trait TemplateSource {
    /// Loads the template called `name`.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::NotFound` if no template matches, or a read or
    /// parse error for the matching file.
    fn load(&self, name: &str) -> Result<Template, TemplateError>;
}

/// Loads templates from the filesystem.
#[derive(Debug, Clone)]
pub struct FsTemplateLoader {
    /// Directory relative names are resolved against.
    base_dir: PathBuf,
    templates_dir: Option<PathBuf>,
}

impl FsTemplateLoader {
    pub fn new(base_dir: impl Into<PathBuf>, templates_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            templates_dir,
        }
    }

    pub fn templates_dir(&self) -> Option<&Path> {
        self.templates_dir.as_deref()
    }

    /// Paths tried for `name`, in lookup order.
    pub fn search_paths(&self, name: &str) -> Vec<PathBuf> {
        let direct = self.base_dir.join(name);
        let mut paths = vec![direct.clone()];
        paths.extend(EXTENSIONS.iter().map(|ext| with_extension(&direct, ext)));
        if let Some(dir) = &self.templates_dir {
            paths.extend(
                EXTENSIONS
                    .iter()
                    .map(|ext| dir.join(format!("{}.{}", name, ext))),
            );
        }
        paths
    }

    /// Every template in the templates directory, sorted by file name.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub fn list(&self) -> Result<Vec<Template>, TemplateError> {
        let Some(dir) = self.templates_dir.as_deref().filter(|d| d.is_dir()) else {
            return Ok(Vec::new());
        };

        let entries = fs::read_dir(dir).map_err(|source| TemplateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && has_template_extension(p))
            .collect();
        files.sort();

        let mut templates = Vec::with_capacity(files.len());
        for path in files {
            match read_template(&path) {
                Ok(template) => templates.push(template),
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }
        Ok(templates)
    }
}

impl TemplateSource for FsTemplateLoader {
    fn load(&self, name: &str) -> Result<Template, TemplateError> {
        let searched = self.search_paths(name);
        match searched.iter().find(|p| p.is_file()) {
            Some(path) => {
                debug!("loading template '{}' from {}", name, path.display());
                read_template(path)
            }
            None => Err(TemplateError::NotFound {
                name: name.to_string(),
                searched,
            }),
        }
    }
}

/// In-memory templates keyed by name.
impl TemplateSource for HashMap<String, Template> {
    fn load(&self, name: &str) -> Result<Template, TemplateError> {
        self.get(name).cloned().ok_or_else(|| TemplateError::NotFound {
            name: name.to_string(),
            searched: Vec::new(),
        })
    }
}

fn read_template(path: &Path) -> Result<Template, TemplateError> {
    let text = fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Template::from_yaml(&text, &stem).map_err(|source| TemplateError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn with_extension(path: &Path, ext: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}

fn has_template_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.contains(&e))
}
