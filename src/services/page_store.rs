use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::errors::WikiError;
use crate::utils::is_safe_path;

/// File extension of stored pages
pub const PAGE_EXT: &str = "md";

/// Document backing the root path `/`
pub const INDEX_PAGE: &str = "index";

/// Flat-file storage of markdown pages below a data directory
#[derive(Debug, Clone)]
pub struct PageStore {
    base_dir: PathBuf,
}

impl PageStore {
    /// Create a new page store
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        debug!("Creating PageStore with base directory: {:?}", base_dir);
        Self { base_dir }
    }

    /// Map a URL path to its file: `/` is `index.md`, `/a/b` is `a/b.md`
    pub fn path_for(&self, url_path: &str) -> Result<PathBuf, WikiError> {
        if !is_safe_path(url_path) {
            warn!("Rejecting page path with parent segment: {:?}", url_path);
            return Err(WikiError::InvalidPath);
        }
        let name = match url_path.trim_start_matches('/') {
            "" => INDEX_PAGE,
            name => name,
        };
        let mut file = self.base_dir.join(name).into_os_string();
        file.push(".");
        file.push(PAGE_EXT);
        Ok(PathBuf::from(file))
    }

    /// Read raw page content. A missing page is `WikiError::NotFound`.
    pub fn read(&self, url_path: &str) -> Result<Vec<u8>, WikiError> {
        let full_path = self.path_for(url_path)?;
        match fs::read(&full_path) {
            Ok(content) => {
                debug!("Read page {:?}, {} bytes", full_path, content.len());
                Ok(content)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(WikiError::NotFound),
            Err(e) => Err(WikiError::Io(e)),
        }
    }

    /// Create or overwrite a page, creating parent directories as needed
    pub fn write(&self, url_path: &str, content: &[u8]) -> Result<(), WikiError> {
        let full_path = self.path_for(url_path)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, content)?;
        info!("Saved page {:?}, {} bytes", full_path, content.len());
        Ok(())
    }

    /// Remove a page. Removing a page that does not exist is not an error.
    pub fn delete(&self, url_path: &str) -> Result<(), WikiError> {
        let full_path = self.path_for(url_path)?;
        match fs::remove_file(&full_path) {
            Ok(()) => {
                info!("Deleted page {:?}", full_path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Nothing to delete at {:?}", full_path);
                Ok(())
            }
            Err(e) => Err(WikiError::Io(e)),
        }
    }

    /// Identifiers (`/a/b`) of every stored page except the index, in walk order
    pub fn list(&self) -> Result<Vec<String>, WikiError> {
        let mut pages = Vec::new();
        if !self.base_dir.is_dir() {
            warn!("Data directory does not exist: {:?}", self.base_dir);
            return Ok(pages);
        }
        self.walk(&self.base_dir, &mut pages)?;
        info!("Listed {} pages under {:?}", pages.len(), self.base_dir);
        Ok(pages)
    }

    fn walk(&self, dir: &Path, pages: &mut Vec<String>) -> Result<(), WikiError> {
        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                self.walk(&path, pages)?;
            } else if let Some(id) = self.page_id(&path) {
                pages.push(id);
            }
        }
        Ok(())
    }

    /// `a/b.md` is `/a/b`. Matching on the suffix keeps `a/.md`, saved from
    /// the URL `/a/`, listed as `/a/`.
    fn page_id(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_dir).ok()?;
        let segments: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let joined = segments.join("/");
        let stem = joined.strip_suffix(&format!(".{}", PAGE_EXT))?;
        if stem.is_empty() || stem == INDEX_PAGE {
            return None;
        }
        Some(format!("/{}", stem))
    }
}
