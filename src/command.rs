//! Commands: fresh, dependency-injected actions dispatched by name.
//!
//! Registering a command stores a [`CommandFactory`] as the module value.
//! Each [`CommandFactory::create`] call hands out a new [`Command`], which
//! resolves its dependencies when run and awaits its [`Handler`].

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use async_trait::async_trait;
use tracing::debug;

use crate::artisan::Artisan;
use crate::error::ArtisanResult;
use crate::slug;
use crate::value::{Deps, Value};

/// Body of a command.
///
/// # Example
///
/// ```rust
/// use artisan::{async_trait, ArtisanResult, Deps, Handler, Value};
///
/// struct Greet;
///
/// #[async_trait(?Send)]
/// impl Handler for Greet {
///     async fn handle(&self, deps: Deps, args: Vec<Value>) -> ArtisanResult<Value> {
///         let greeting = deps.get::<String>(0)?;
///         let who = args.first().and_then(|v| v.downcast_ref::<String>()).cloned();
///         Ok(Value::new(format!("{greeting}, {}", who.unwrap_or_default())))
///     }
/// }
/// ```
#[async_trait(?Send)]
pub trait Handler {
    /// Run with the resolved dependencies and the caller's arguments.
    async fn handle(&self, deps: Deps, args: Vec<Value>) -> ArtisanResult<Value>;
}

/// [`Handler`] backed by an async closure. See [`handler_fn`].
pub struct FnHandler<F>(F);

#[async_trait(?Send)]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Deps, Vec<Value>) -> Fut + 'static,
    Fut: Future<Output = ArtisanResult<Value>> + 'static,
{
    async fn handle(&self, deps: Deps, args: Vec<Value>) -> ArtisanResult<Value> {
        (self.0)(deps, args).await
    }
}

/// Wrap a closure returning a future as a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Deps, Vec<Value>) -> Fut + 'static,
    Fut: Future<Output = ArtisanResult<Value>> + 'static,
{
    FnHandler(f)
}

/// Dependencies and handler of a command.
#[derive(Clone)]
pub struct CommandSpec {
    deps: Vec<String>,
    handler: Rc<dyn Handler>,
}

impl CommandSpec {
    /// Command without dependencies.
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self {
            deps: Vec::new(),
            handler: Rc::new(handler),
        }
    }

    /// Command whose handler receives `deps` resolved in order.
    pub fn injected<I, S>(deps: I, handler: impl Handler + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            deps: deps.into_iter().map(Into::into).collect(),
            handler: Rc::new(handler),
        }
    }

    /// Declared dependency slugs, in positional order.
    pub fn dependencies(&self) -> &[String] {
        &self.deps
    }

    pub(crate) fn qualified(mut self, namespace: &str) -> Self {
        self.deps = self
            .deps
            .iter()
            .map(|dep| slug::qualify(namespace, dep))
            .collect();
        self
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

/// Value stored under a command's slug; creates fresh commands.
#[derive(Debug, Clone)]
pub struct CommandFactory {
    slug: String,
    spec: CommandSpec,
}

impl CommandFactory {
    pub(crate) fn new(slug: String, spec: CommandSpec) -> Self {
        Self { slug, spec }
    }

    /// Slug the command is registered under.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// A new command instance.
    pub fn create(&self) -> Command {
        Command {
            slug: self.slug.clone(),
            spec: self.spec.clone(),
        }
    }
}

/// A single command instance.
#[derive(Debug)]
pub struct Command {
    slug: String,
    spec: CommandSpec,
}

impl Command {
    /// Slug the command is registered under.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Resolve the dependencies through `artisan` and run the handler.
    pub async fn run(&self, artisan: &mut Artisan, args: Vec<Value>) -> ArtisanResult<Value> {
        let mut values = Vec::with_capacity(self.spec.deps.len());
        for dep in &self.spec.deps {
            values.push(artisan.resolve(dep)?);
        }
        debug!(command = %self.slug, args = args.len(), "running command");
        let deps = Deps::new(self.spec.deps.clone(), values);
        self.spec.handler.handle(deps, args).await
    }
}
