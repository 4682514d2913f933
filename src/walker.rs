//! Catalog discovery.
//!
//! Catalogs are expected at `<root>/<locale>/LC_MESSAGES/<domain>.po`; the
//! locale is the name of the file's grandparent directory.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extension of catalog files.
pub const CATALOG_EXTENSION: &str = "po";

/// A catalog to translate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFile {
    pub path: PathBuf,
    /// Directory holding the file.
    pub dir: PathBuf,
    /// Target locale derived from the directory layout.
    pub locale: String,
}

/// One step of the walk.
#[derive(Debug)]
pub enum WalkItem {
    Catalog(CatalogFile),
    /// The file's locale is not in the allow-list.
    LocaleSkipped { path: PathBuf, locale: String },
    /// No grandparent directory to take a locale from.
    Unresolved { path: PathBuf },
    /// Traversal error (missing root, permission denied, ...).
    Unreadable { path: Option<PathBuf>, error: walkdir::Error },
}

/// Walks catalog roots in order, depth first, entries sorted by file name.
#[derive(Debug, Clone, Default)]
pub struct CatalogWalker {
    roots: Vec<PathBuf>,
    locales: Vec<String>,
}

impl CatalogWalker {
    /// `locales` empty means every locale.
    pub fn new(roots: Vec<PathBuf>, locales: Vec<String>) -> Self {
        Self { roots, locales }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Lazily walks a single root.
    pub fn walk_root<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = WalkItem> + 'a {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    // `Path::is_file` follows symlinked catalogs
                    let is_catalog = entry.path().is_file()
                        && entry.path().extension().and_then(|ext| ext.to_str())
                            == Some(CATALOG_EXTENSION);
                    is_catalog.then(|| self.classify(entry.into_path()))
                }
                Err(error) => Some(WalkItem::Unreadable {
                    path: error.path().map(Path::to_path_buf),
                    error,
                }),
            })
    }

    /// Lazily walks every root in configured order.
    pub fn walk(&self) -> impl Iterator<Item = WalkItem> + '_ {
        self.roots.iter().flat_map(move |root| self.walk_root(root))
    }

    fn classify(&self, path: PathBuf) -> WalkItem {
        let Some(locale) = locale_for(&path) else {
            return WalkItem::Unresolved { path };
        };
        if !self.locales.is_empty() && !self.locales.iter().any(|l| *l == locale) {
            return WalkItem::LocaleSkipped { path, locale };
        }
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        WalkItem::Catalog(CatalogFile { path, dir, locale })
    }
}

/// Name of the directory two levels above `path`.
pub fn locale_for(path: &Path) -> Option<String> {
    path.parent()?
        .parent()?
        .file_name()?
        .to_str()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
