//! The container and its resolution engine.
//!
//! [`Artisan`] owns every [`Provider`] and [`Module`]. Resolving a slug
//! either returns a memoized value, evaluates a registered module, or walks
//! the slug's parent path loading providers until one registers the module.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::command::{Command, CommandFactory, CommandSpec};
use crate::config::{ArtisanConfig, Config, OverridePolicy};
use crate::error::{ArtisanError, ArtisanResult};
use crate::module::{Module, ModuleSpec, ModuleState};
use crate::provider::{Context, Provider};
use crate::scope::Scope;
use crate::slug;
use crate::source::{self, Discovery, Target, UnitLoader, UnitTable};
use crate::value::{Overrides, Value};

/// A root-level `register` call, replayed by [`Artisan::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct Registration {
    location: PathBuf,
    caller: PathBuf,
}

/// Hierarchical, lazily loading dependency-injection container.
///
/// # Example
///
/// ```rust
/// use artisan::{Artisan, ModuleSpec, ProviderDef, UnitTable};
///
/// let units = UnitTable::new().with("providers/greeter/index", || {
///     ProviderDef::new("greeter").register(|scope| {
///         scope.module("name", ModuleSpec::value("world".to_string()))?;
///         scope.module(
///             "message",
///             ModuleSpec::injected(["./name"], |deps| {
///                 Ok(format!("hello {}", deps.get::<String>(0)?))
///             }),
///         )?;
///         Ok(())
///     })
/// });
///
/// let mut app = Artisan::builder().units(units).build()?;
/// app.register("providers")?;
///
/// assert!(!app.is_loaded("greeter"));
/// assert_eq!(*app.get::<String>("greeter.message")?, "hello world");
/// assert!(app.is_loaded("greeter"));
/// # Ok::<(), artisan::ArtisanError>(())
/// ```
pub struct Artisan {
    config: ArtisanConfig,
    discovery: Rc<dyn Discovery>,
    loader: Rc<dyn UnitLoader>,
    providers: HashMap<String, Provider>,
    provider_paths: HashSet<PathBuf>,
    modules: HashMap<String, Module>,
    /// Originals set aside while a mock holds their slug.
    pulled: HashMap<String, Module>,
    /// Slug -> evaluated value fast path.
    cache: HashMap<String, Value>,
    registrations: Vec<Registration>,
}

impl Artisan {
    /// Container over `units`, with the default configuration.
    pub fn new(units: UnitTable) -> Self {
        let units = Rc::new(units);
        Self::from_parts(ArtisanConfig::default(), units.clone(), units)
    }

    /// Create a builder for a configured container.
    pub fn builder() -> ArtisanBuilder {
        ArtisanBuilder::new()
    }

    fn from_parts(
        config: ArtisanConfig,
        discovery: Rc<dyn Discovery>,
        loader: Rc<dyn UnitLoader>,
    ) -> Self {
        Self {
            config,
            discovery,
            loader,
            providers: HashMap::new(),
            provider_paths: HashSet::new(),
            modules: HashMap::new(),
            pulled: HashMap::new(),
            cache: HashMap::new(),
            registrations: Vec::new(),
        }
    }

    /// Get the container configuration.
    pub fn config(&self) -> &ArtisanConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register the provider unit, or every provider directory, at `location`.
    ///
    /// `location` is resolved against the configured base directory.
    pub fn register(&mut self, location: impl AsRef<Path>) -> ArtisanResult<()> {
        let caller = self.config.base.clone();
        self.register_at(location, caller)
    }

    /// Like [`Artisan::register`], resolving `location` against `caller`.
    pub fn register_at(
        &mut self,
        location: impl AsRef<Path>,
        caller: impl AsRef<Path>,
    ) -> ArtisanResult<()> {
        self.register_root(Registration {
            location: location.as_ref().to_path_buf(),
            caller: caller.as_ref().to_path_buf(),
        })
    }

    /// Registers at the root and records the call for [`Artisan::reset`].
    ///
    /// A failed call is still recorded once it has added a provider, so
    /// reset replays whatever it left live.
    fn register_root(&mut self, registration: Registration) -> ArtisanResult<()> {
        let known = self.provider_paths.len();
        let result = self.register_in(None, &registration.location, &registration.caller);
        if result.is_ok() || self.provider_paths.len() > known {
            self.registrations.push(registration);
        }
        result
    }

    pub(crate) fn register_in(
        &mut self,
        context: Option<&Context>,
        location: &Path,
        caller: &Path,
    ) -> ArtisanResult<()> {
        let search = source::normalize(&caller.join(location));
        match self.discovery.locate(&search)? {
            Target::Unit => self.add_provider(context, search),
            Target::Directory => {
                let units = self.discovery.discover(&search, &self.config.entry)?;
                debug!(dir = %search.display(), found = units.len(), "discovered providers");
                for unit in units {
                    self.add_provider(context, source::normalize(&unit))?;
                }
                Ok(())
            }
        }
    }

    fn add_provider(&mut self, context: Option<&Context>, path: PathBuf) -> ArtisanResult<()> {
        if self.provider_paths.contains(&path) {
            return Ok(());
        }

        let def = self.loader.load(&path)?;
        let slug = slug::join(context.map_or("", Context::slug), def.name());
        if self.modules.contains_key(&slug) || self.pulled.contains_key(&slug) {
            return Err(ArtisanError::ModuleOverwrite(slug));
        }
        if self.providers.contains_key(&slug) {
            return Err(ArtisanError::ProviderExists(slug));
        }

        let eager = def.is_eager();
        debug!(provider = %slug, path = %path.display(), eager, "adding provider");
        self.provider_paths.insert(path.clone());
        self.providers
            .insert(slug.clone(), Provider::new(slug.clone(), path, def));

        if eager {
            self.load_provider(&slug)?;
        }
        Ok(())
    }

    /// Runs a provider's `register` callback in its own scope.
    fn load_provider(&mut self, slug: &str) -> ArtisanResult<()> {
        let Some(provider) = self.providers.get_mut(slug) else {
            return Ok(());
        };
        let Some(register) = provider.begin_load() else {
            return Ok(());
        };
        let context = provider.context();

        debug!(provider = %slug, "loading provider");
        let result = (*register)(&mut Scope::new(self, context));
        // A failed callback is not replayed; reset() rebuilds from scratch.
        if let Some(provider) = self.providers.get_mut(slug) {
            provider.finish_load();
        }
        result
    }

    /// Register a module at the root namespace.
    pub fn module(&mut self, name: &str, spec: ModuleSpec) -> ArtisanResult<()> {
        self.module_in(None, name, spec)
    }

    /// Register a command at the root namespace.
    pub fn command(&mut self, name: &str, spec: CommandSpec) -> ArtisanResult<()> {
        self.command_in(None, name, spec)
    }

    pub(crate) fn module_in(
        &mut self,
        context: Option<&Context>,
        name: &str,
        spec: ModuleSpec,
    ) -> ArtisanResult<()> {
        let slug = local_slug(context, name);
        self.component(Module::new(slug, spec))
    }

    pub(crate) fn command_in(
        &mut self,
        context: Option<&Context>,
        name: &str,
        spec: CommandSpec,
    ) -> ArtisanResult<()> {
        let slug = local_slug(context, name);
        let spec = spec.qualified(slug::parent(&slug));
        let factory = CommandFactory::new(slug.clone(), spec);
        self.component(Module::new(slug, ModuleSpec::value(factory)))
    }

    fn component(&mut self, module: Module) -> ArtisanResult<()> {
        let slug = module.slug().to_string();
        if self.providers.contains_key(&slug) {
            return Err(ArtisanError::ModuleOverwrite(slug));
        }
        if self.pulled.contains_key(&slug) {
            return Err(ArtisanError::ModuleExists(slug));
        }

        match self.modules.get(&slug) {
            Some(existing) if existing.is_mock() => {
                debug!(module = %slug, "registered behind a mock");
                self.pulled.insert(slug, module);
            }
            Some(_) => return Err(ArtisanError::ModuleExists(slug)),
            None => {
                trace!(module = %slug, "registered");
                self.modules.insert(slug, module);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve `name` to its value, loading providers on demand.
    pub fn resolve(&mut self, name: &str) -> ArtisanResult<Value> {
        self.resolve_in(None, name, None)
    }

    /// Resolve `name`, substituting `overrides` for its direct dependencies.
    ///
    /// Whether the result is memoized depends on [`OverridePolicy`].
    pub fn resolve_with(&mut self, name: &str, overrides: &Overrides) -> ArtisanResult<Value> {
        self.resolve_in(None, name, Some(overrides))
    }

    /// Resolve `name` and downcast the value to `T`.
    pub fn get<T: Any>(&mut self, name: &str) -> ArtisanResult<Rc<T>> {
        self.resolve(name)?.expect_type::<T>(name)
    }

    pub(crate) fn resolve_in(
        &mut self,
        context: Option<&Context>,
        name: &str,
        overrides: Option<&Overrides>,
    ) -> ArtisanResult<Value> {
        if overrides.is_none() {
            if let Some(value) = self.cache.get(name) {
                trace!(module = %name, "cache hit");
                return Ok(value.clone());
            }
        }

        let slug = qualify(context, name);
        loop {
            if self.modules.contains_key(&slug) {
                return self.run_module(&slug, overrides);
            }

            // Every pass loads one more provider, so this terminates.
            match self.walk_to_provider(slug::parent(&slug))? {
                Some(owner) if self.providers.get(&owner).is_some_and(Provider::is_pending) => {
                    self.load_provider(&owner)?;
                }
                _ => return Err(ArtisanError::ModuleNotFound(slug)),
            }
        }
    }

    /// Loads every ancestor provider of `path`; returns `path`'s provider slug if one exists.
    fn walk_to_provider(&mut self, path: &str) -> ArtisanResult<Option<String>> {
        if path.is_empty() {
            return Ok(None);
        }

        let segments: Vec<&str> = path.split(slug::SEPARATOR).collect();
        let (last, ancestors) = match segments.split_last() {
            Some(split) => split,
            None => return Ok(None),
        };

        let mut prefix = String::new();
        for segment in ancestors {
            prefix = slug::join(&prefix, segment);
            if !self.providers.contains_key(&prefix) {
                return Ok(None);
            }
            self.load_provider(&prefix)?;
        }

        let owner = slug::join(&prefix, last);
        Ok(self.providers.contains_key(&owner).then_some(owner))
    }

    fn run_module(&mut self, slug: &str, overrides: Option<&Overrides>) -> ArtisanResult<Value> {
        let spec = match self.modules.get(slug) {
            Some(module) => {
                if let (None, Some(value)) = (overrides, module.value()) {
                    return Ok(value.clone());
                }
                module.spec().clone()
            }
            None => return Err(ArtisanError::ModuleNotFound(slug.to_string())),
        };

        debug!(module = %slug, overridden = overrides.is_some(), "evaluating module");
        let value = spec.evaluate(overrides, |dep| self.resolve_in(None, dep, None))?;

        if overrides.is_none() || self.config.overrides == OverridePolicy::Persist {
            if let Some(module) = self.modules.get_mut(slug) {
                module.store(value.clone());
                self.cache.insert(slug.to_string(), value.clone());
            }
        }
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// A fresh instance of the command registered as `name`.
    pub fn make_command(&mut self, name: &str) -> ArtisanResult<Command> {
        Ok(self.get::<CommandFactory>(name)?.create())
    }

    /// Create the command registered as `name` and run it with `args`.
    pub async fn dispatch(&mut self, name: &str, args: Vec<Value>) -> ArtisanResult<Value> {
        let command = self.make_command(name)?;
        command.run(self, args).await
    }

    // ------------------------------------------------------------------
    // Mocks and resets
    // ------------------------------------------------------------------

    /// Overlay the module at `name` with `spec` until [`Artisan::unmock`].
    ///
    /// Every memoized value is dropped so dependents pick the mock up.
    pub fn mock(&mut self, name: &str, spec: ModuleSpec) {
        let slug = qualify(None, name);
        self.invalidate_all();

        if let Some(existing) = self.modules.remove(&slug) {
            if !existing.is_mock() {
                self.pulled.insert(slug.clone(), existing);
            }
        }
        debug!(module = %slug, "mocked");
        self.modules.insert(slug.clone(), Module::mock(slug, spec));
    }

    /// Remove the mock at `name`, restoring the original if there is one.
    pub fn unmock(&mut self, name: &str) {
        let slug = qualify(None, name);
        match self.pulled.remove(&slug) {
            Some(original) => {
                self.modules.insert(slug.clone(), original);
            }
            None => {
                if self.modules.get(&slug).is_some_and(Module::is_mock) {
                    self.modules.remove(&slug);
                }
            }
        }
        debug!(module = %slug, "unmocked");
        self.invalidate_all();
    }

    /// Remove every mock and restore every original.
    pub fn unmock_all(&mut self) {
        for (slug, original) in self.pulled.drain() {
            self.modules.insert(slug, original);
        }
        self.modules.retain(|_, module| !module.is_mock());
        debug!("unmocked all modules");
        self.invalidate_all();
    }

    /// Drop every provider, module, mock and cached value, then replay the
    /// root-level registrations in their original order.
    pub fn reset(&mut self) -> ArtisanResult<()> {
        self.providers.clear();
        self.provider_paths.clear();
        self.modules.clear();
        self.pulled.clear();
        self.cache.clear();

        let registrations = std::mem::take(&mut self.registrations);
        debug!(registrations = registrations.len(), "resetting container");
        for (i, registration) in registrations.iter().enumerate() {
            let recorded = self.registrations.len();
            if let Err(err) = self.register_root(registration.clone()) {
                // keep the failed call and everything after it for the next reset
                if self.registrations.len() == recorded {
                    self.registrations.push(registration.clone());
                }
                self.registrations.extend_from_slice(&registrations[i + 1..]);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Forget the memoized value of one module. Idempotent.
    pub fn reset_module(&mut self, slug: &str) {
        if let Some(module) = self.modules.get_mut(slug) {
            module.reset();
        }
        self.cache.remove(slug);
    }

    fn invalidate_all(&mut self) {
        for module in self.modules.values_mut().chain(self.pulled.values_mut()) {
            module.reset();
        }
        self.cache.clear();
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// True only for a registered provider whose `register` has completed.
    pub fn is_loaded(&self, slug: &str) -> bool {
        self.providers.get(slug).is_some_and(Provider::is_loaded)
    }

    /// Get the evaluation state of the module at `slug`.
    pub fn module_state(&self, slug: &str) -> ModuleState {
        self.modules
            .get(slug)
            .map_or(ModuleState::Unregistered, Module::state)
    }

    /// Check whether a mock currently holds `slug`.
    pub fn is_mocked(&self, slug: &str) -> bool {
        self.modules.get(slug).is_some_and(Module::is_mock)
    }

    /// Get a registered provider by slug.
    pub fn provider(&self, slug: &str) -> Option<&Provider> {
        self.providers.get(slug)
    }

    /// Slugs of the registered providers, sorted.
    pub fn provider_slugs(&self) -> Vec<&str> {
        let mut slugs: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        slugs.sort_unstable();
        slugs
    }
}

/// Slug a component registered as `name` gets: always under the current provider.
fn local_slug(context: Option<&Context>, name: &str) -> String {
    let name = name.strip_prefix(slug::RELATIVE_MARKER).unwrap_or(name);
    slug::join(context.map_or("", Context::slug), name)
}

/// Slug a resolved `name` refers to: only `./` names are namespaced.
fn qualify(context: Option<&Context>, name: &str) -> String {
    slug::qualify(context.map_or("", Context::slug), name)
}

impl fmt::Debug for Artisan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artisan")
            .field("config", &self.config)
            .field("providers", &self.provider_slugs())
            .field("modules", &self.modules.len())
            .field("mocks_pulled", &self.pulled.len())
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Builder for creating containers with fluent API.
///
/// Units default to an empty [`UnitTable`]; [`ArtisanBuilder::units`] makes
/// one table serve both discovery and loading, and
/// [`ArtisanBuilder::discovery`] swaps in another discovery such as
/// [`crate::FsDiscovery`].
pub struct ArtisanBuilder {
    config: ArtisanConfig,
    discovery: Option<Rc<dyn Discovery>>,
    loader: Option<Rc<dyn UnitLoader>>,
}

impl ArtisanBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: ArtisanConfig::default(),
            discovery: None,
            loader: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ArtisanConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the directory root-level registrations resolve against.
    pub fn base(mut self, base: impl AsRef<Path>) -> Self {
        self.config.base = base.as_ref().to_path_buf();
        self
    }

    /// Use the directory of the calling source file as base.
    #[track_caller]
    pub fn caller_base(mut self) -> Self {
        let file = Path::new(std::panic::Location::caller().file());
        self.config.base = file.parent().map(Path::to_path_buf).unwrap_or_default();
        self
    }

    /// Set the entry unit name looked up in provider directories.
    pub fn entry(mut self, entry: impl Into<String>) -> Self {
        self.config.entry = entry.into();
        self
    }

    /// Set the override policy.
    pub fn overrides(mut self, policy: OverridePolicy) -> Self {
        self.config.overrides = policy;
        self
    }

    /// Serve discovery and loading from `units`.
    pub fn units(mut self, units: UnitTable) -> Self {
        let units = Rc::new(units);
        self.discovery = Some(units.clone());
        self.loader = Some(units);
        self
    }

    /// Use `discovery` to classify and list provider units.
    pub fn discovery(mut self, discovery: impl Discovery + 'static) -> Self {
        self.discovery = Some(Rc::new(discovery));
        self
    }

    /// Use `loader` to load provider definitions.
    pub fn loader(mut self, loader: impl UnitLoader + 'static) -> Self {
        self.loader = Some(Rc::new(loader));
        self
    }

    /// Validate the configuration and build the container.
    pub fn build(self) -> ArtisanResult<Artisan> {
        self.config.validate().map_err(ArtisanError::Config)?;
        let empty = Rc::new(UnitTable::new());
        let discovery: Rc<dyn Discovery> = match self.discovery {
            Some(discovery) => discovery,
            None => empty.clone(),
        };
        let loader: Rc<dyn UnitLoader> = match self.loader {
            Some(loader) => loader,
            None => empty,
        };
        debug!(name = self.config.name(), base = %self.config.base.display(), "container built");
        Ok(Artisan::from_parts(self.config, discovery, loader))
    }
}

impl Default for ArtisanBuilder {
    fn default() -> Self {
        Self::new()
    }
}
