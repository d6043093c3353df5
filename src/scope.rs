//! The view of the container a provider's `register` callback gets.

use std::path::Path;

use crate::artisan::Artisan;
use crate::command::CommandSpec;
use crate::error::ArtisanResult;
use crate::module::ModuleSpec;
use crate::provider::Context;
use crate::value::{Overrides, Value};

/// Container access namespaced under the provider being loaded.
///
/// Names passed to [`Scope::module`] and [`Scope::command`] are prefixed
/// with the provider slug, `./`-relative names passed to [`Scope::resolve`]
/// are qualified the same way, and [`Scope::register`] resolves locations
/// against the provider's own directory and nests discovered providers
/// under its slug.
pub struct Scope<'a> {
    artisan: &'a mut Artisan,
    context: Context,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(artisan: &'a mut Artisan, context: Context) -> Self {
        Self { artisan, context }
    }

    /// Slug of the provider being loaded.
    pub fn slug(&self) -> &str {
        self.context.slug()
    }

    /// Directory of the provider being loaded.
    pub fn dir(&self) -> &Path {
        self.context.dir()
    }

    /// Register a module under this provider.
    pub fn module(&mut self, name: &str, spec: ModuleSpec) -> ArtisanResult<()> {
        self.artisan.module_in(Some(&self.context), name, spec)
    }

    /// Register a command under this provider.
    pub fn command(&mut self, name: &str, spec: CommandSpec) -> ArtisanResult<()> {
        self.artisan.command_in(Some(&self.context), name, spec)
    }

    /// Register providers below this provider.
    pub fn register(&mut self, location: impl AsRef<Path>) -> ArtisanResult<()> {
        let caller = self.context.dir().to_path_buf();
        self.artisan
            .register_in(Some(&self.context), location.as_ref(), &caller)
    }

    /// Resolve `name`; `./` names are relative to this provider.
    pub fn resolve(&mut self, name: &str) -> ArtisanResult<Value> {
        self.artisan.resolve_in(Some(&self.context), name, None)
    }

    /// Resolve `name` with call-scoped overrides.
    pub fn resolve_with(&mut self, name: &str, overrides: &Overrides) -> ArtisanResult<Value> {
        self.artisan
            .resolve_in(Some(&self.context), name, Some(overrides))
    }

    /// Check whether the provider at `slug` has finished loading.
    pub fn is_loaded(&self, slug: &str) -> bool {
        self.artisan.is_loaded(slug)
    }
}

impl std::fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
