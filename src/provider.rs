//! Providers: namespaced units that register modules when loaded.
//!
//! A provider unit exports a [`ProviderDef`]: its local name, whether it
//! loads eagerly, and the `register` callback. The container wraps each
//! definition in a [`Provider`] that tracks its slug and load state.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::ArtisanResult;
use crate::scope::Scope;

/// Callback that registers a provider's modules, commands and sub-providers.
pub type RegisterFn = Rc<dyn Fn(&mut Scope<'_>) -> ArtisanResult<()>>;

/// Metadata exported by a provider unit.
///
/// # Example
///
/// ```rust
/// use artisan::{ModuleSpec, ProviderDef};
///
/// let def = ProviderDef::new("moduleA").register(|scope| {
///     scope.module("a", ModuleSpec::direct(|| "moduleA.a loaded".to_string()))?;
///     Ok(())
/// });
///
/// assert_eq!(def.name(), "moduleA");
/// assert!(!def.is_eager());
/// ```
#[derive(Clone)]
pub struct ProviderDef {
    name: String,
    eager: bool,
    register: RegisterFn,
}

impl ProviderDef {
    /// Create a lazy definition with an empty `register` callback.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            eager: false,
            register: Rc::new(register_nothing),
        }
    }

    /// Load as soon as the provider is discovered.
    pub fn eager(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    /// Set the `register` callback.
    pub fn register<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Scope<'_>) -> ArtisanResult<()> + 'static,
    {
        self.register = Rc::new(f);
        self
    }

    /// Get the local provider name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether the provider loads on discovery.
    pub fn is_eager(&self) -> bool {
        self.eager
    }
}

fn register_nothing(_: &mut Scope<'_>) -> ArtisanResult<()> {
    Ok(())
}

impl fmt::Debug for ProviderDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDef")
            .field("name", &self.name)
            .field("eager", &self.eager)
            .finish_non_exhaustive()
    }
}

/// Load progress of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    /// `register` is running.
    Loading,
    Loaded,
}

/// Namespace a provider's callback runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    slug: String,
    dir: PathBuf,
}

impl Context {
    pub(crate) fn new(slug: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            slug: slug.into(),
            dir: dir.into(),
        }
    }

    /// Slug that names registered inside this context are prefixed with.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Directory relative registrations resolve against.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// A registered provider.
#[derive(Debug)]
pub struct Provider {
    slug: String,
    path: PathBuf,
    def: ProviderDef,
    state: LoadState,
}

impl Provider {
    pub(crate) fn new(slug: String, path: PathBuf, def: ProviderDef) -> Self {
        Self {
            slug,
            path,
            def,
            state: LoadState::Unloaded,
        }
    }

    /// Get the full provider slug.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Path of the unit the provider was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether the provider loads on discovery.
    pub fn is_eager(&self) -> bool {
        self.def.is_eager()
    }

    /// Get the load state.
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// True once `register` has completed.
    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    /// True while the provider may still be loaded.
    pub fn is_pending(&self) -> bool {
        self.state == LoadState::Unloaded
    }

    /// Context for this provider's callback: its slug and unit directory.
    pub fn context(&self) -> Context {
        let dir = self.path.parent().map(Path::to_path_buf).unwrap_or_default();
        Context::new(self.slug.clone(), dir)
    }

    /// Marks the provider as loading and hands out its callback.
    ///
    /// Returns `None` when the provider is loading or already loaded.
    pub(crate) fn begin_load(&mut self) -> Option<RegisterFn> {
        if !self.is_pending() {
            return None;
        }
        self.state = LoadState::Loading;
        Some(Rc::clone(&self.def.register))
    }

    pub(crate) fn finish_load(&mut self) {
        self.state = LoadState::Loaded;
    }
}
