use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::PathBuf;

use log::debug;

use crate::errors::WikiError;
use crate::utils::is_safe_path;

/// Source of templates and public static files, addressed by logical path
/// such as `templates/layout.html` or `www/css/wiki.css`
pub trait AssetSource: Send + Sync {
    /// True when `path` names a readable file (never a directory)
    fn exists(&self, path: &str) -> bool;

    fn read(&self, path: &str) -> Result<Cow<'static, [u8]>, WikiError>;

    /// Whether static serving writes straight to the transport instead of
    /// going through the in-memory response
    fn delegates_writes(&self) -> bool {
        false
    }
}

macro_rules! bundle {
    ($($path:literal),* $(,)?) => {
        &[$(($path, include_bytes!(concat!("../../assets/", $path)) as &[u8])),*]
    };
}

static BUNDLE: &[(&str, &[u8])] = bundle![
    "templates/layout.html",
    "templates/read.html",
    "templates/update.html",
    "templates/index.html",
    "www/css/wiki.css",
    "www/js/wiki.js",
];

/// Assets compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedAssets;

impl EmbeddedAssets {
    pub fn new() -> Self {
        Self
    }

    fn lookup(path: &str) -> Option<&'static [u8]> {
        BUNDLE.iter().find(|(name, _)| *name == path).map(|(_, bytes)| *bytes)
    }

    /// Logical paths of every bundled asset
    pub fn names() -> impl Iterator<Item = &'static str> {
        BUNDLE.iter().map(|(name, _)| *name)
    }
}

impl AssetSource for EmbeddedAssets {
    fn exists(&self, path: &str) -> bool {
        Self::lookup(path).is_some()
    }

    fn read(&self, path: &str) -> Result<Cow<'static, [u8]>, WikiError> {
        Self::lookup(path)
            .map(Cow::Borrowed)
            .ok_or_else(|| WikiError::AssetNotFound(path.to_string()))
    }
}

/// Assets read live from a directory on every request
#[derive(Debug, Clone)]
pub struct DiskAssets {
    root: PathBuf,
}

impl DiskAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!("Serving assets from {:?}", root);
        Self { root }
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        if !is_safe_path(path) {
            return None;
        }
        Some(self.root.join(path.trim_start_matches('/')))
    }
}

impl AssetSource for DiskAssets {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|p| p.is_file())
    }

    fn read(&self, path: &str) -> Result<Cow<'static, [u8]>, WikiError> {
        let full = self.resolve(path).ok_or(WikiError::InvalidPath)?;
        match fs::read(&full) {
            Ok(bytes) => Ok(Cow::Owned(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(WikiError::AssetNotFound(path.to_string()))
            }
            Err(e) => Err(WikiError::Io(e)),
        }
    }

    fn delegates_writes(&self) -> bool {
        true
    }
}
