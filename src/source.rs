//! Where provider units come from.
//!
//! The container asks a [`Discovery`] what a registered location is and which
//! provider units live below a directory, then asks a [`UnitLoader`] for the
//! [`ProviderDef`] of each unit. [`UnitTable`] serves both from memory;
//! [`FsDiscovery`] scans a real directory tree and leaves loading to a table
//! keyed by the same paths.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

use crate::error::{SourceError, SourceResult};
use crate::provider::ProviderDef;

/// What a registered location points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A single provider unit.
    Unit,
    /// A directory whose subdirectories may hold provider units.
    Directory,
}

/// Classifies locations and lists provider units.
pub trait Discovery {
    /// Classify `path`; fails when nothing exists there.
    fn locate(&self, path: &Path) -> SourceResult<Target>;

    /// List `<dir>/<sub>/<entry>` units for every immediate subdirectory
    /// that has one, sorted.
    fn discover(&self, dir: &Path, entry: &str) -> SourceResult<Vec<PathBuf>>;
}

/// Produces the definition exported by a provider unit.
pub trait UnitLoader {
    fn load(&self, path: &Path) -> SourceResult<ProviderDef>;
}

type UnitFn = Rc<dyn Fn() -> ProviderDef>;

/// In-memory provider units keyed by normalized path.
///
/// Every unit is a constructor, so a container reset reloads a fresh
/// definition.
///
/// # Example
///
/// ```rust
/// use artisan::{Discovery, ProviderDef, Target, UnitTable};
/// use std::path::Path;
///
/// let table = UnitTable::new()
///     .with("providers/mail/index", || ProviderDef::new("mail"))
///     .with("providers/queue/index", || ProviderDef::new("queue"));
///
/// assert_eq!(table.locate(Path::new("providers")).unwrap(), Target::Directory);
/// assert_eq!(table.discover(Path::new("providers"), "index").unwrap().len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct UnitTable {
    units: BTreeMap<PathBuf, UnitFn>,
}

impl UnitTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit at `path`, replacing any previous one.
    pub fn insert<F>(&mut self, path: impl AsRef<Path>, unit: F)
    where
        F: Fn() -> ProviderDef + 'static,
    {
        self.units.insert(normalize(path.as_ref()), Rc::new(unit));
    }

    /// Builder form of [`UnitTable::insert`].
    pub fn with<F>(mut self, path: impl AsRef<Path>, unit: F) -> Self
    where
        F: Fn() -> ProviderDef + 'static,
    {
        self.insert(path, unit);
        self
    }

    /// Check whether a unit exists at `path`.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.units.contains_key(&normalize(path.as_ref()))
    }

    /// Unit paths, in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.units.keys().map(PathBuf::as_path)
    }

    /// Get the number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl std::fmt::Debug for UnitTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitTable")
            .field("units", &self.units.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Discovery for UnitTable {
    fn locate(&self, path: &Path) -> SourceResult<Target> {
        let path = normalize(path);
        if self.units.contains_key(&path) {
            return Ok(Target::Unit);
        }
        if self.units.keys().any(|unit| unit != &path && unit.starts_with(&path)) {
            return Ok(Target::Directory);
        }
        Err(SourceError::LocationNotFound(path))
    }

    fn discover(&self, dir: &Path, entry: &str) -> SourceResult<Vec<PathBuf>> {
        let dir = normalize(dir);
        Ok(self
            .units
            .keys()
            .filter(|unit| {
                unit.file_name().is_some_and(|name| name == entry)
                    && unit
                        .parent()
                        .and_then(Path::parent)
                        .is_some_and(|grandparent| grandparent == dir)
            })
            .cloned()
            .collect())
    }
}

impl UnitLoader for UnitTable {
    fn load(&self, path: &Path) -> SourceResult<ProviderDef> {
        let path = normalize(path);
        match self.units.get(&path) {
            Some(unit) => Ok(unit()),
            None => Err(SourceError::UnitNotFound(path)),
        }
    }
}

/// Discovers provider units on disk with a `<dir>/*/<entry>` glob.
///
/// `entry` may itself be a pattern, such as `index.*`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDiscovery;

impl FsDiscovery {
    /// Create a filesystem discovery.
    pub fn new() -> Self {
        Self
    }
}

impl Discovery for FsDiscovery {
    fn locate(&self, path: &Path) -> SourceResult<Target> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Ok(Target::Directory),
            Ok(_) => Ok(Target::Unit),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(SourceError::LocationNotFound(path.to_path_buf()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn discover(&self, dir: &Path, entry: &str) -> SourceResult<Vec<PathBuf>> {
        let dir = dir
            .to_str()
            .ok_or_else(|| SourceError::Pattern(format!("non UTF-8 path {}", dir.display())))?;
        let pattern = Path::new(&glob::Pattern::escape(dir))
            .join("*")
            .join(entry);
        let pattern = pattern
            .to_str()
            .ok_or_else(|| SourceError::Pattern(format!("non UTF-8 entry {entry}")))?;

        let mut units = Vec::new();
        for unit in glob::glob(pattern)? {
            let unit = unit?;
            if unit.is_file() {
                units.push(normalize(&unit));
            }
        }
        units.sort();
        Ok(units)
    }
}

/// Lexically normalizes a path: drops `.` and folds `name/..`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let folds = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if folds {
                    normalized.pop();
                } else if !matches!(
                    normalized.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
