//! # Artisan
//!
//! **Artisan** is a hierarchical dependency-injection container. Capabilities
//! are declared in isolated provider units, loaded on demand rather than
//! eagerly, and can be swapped for mocks during tests without rebuilding the
//! application.
//!
//! ## Overview
//!
//! - **Modules** are named, lazily evaluated values. A module either has a
//!   plain factory or lists the slugs it depends on; the container resolves
//!   those first and memoizes the result.
//! - **Providers** are namespaces backed by a unit (an entry file, or an
//!   entry in a [`UnitTable`]). Loading a provider runs its `register`
//!   callback, which declares modules, commands and nested providers.
//! - **Slugs** (`moduleA.subModule.a`) address everything. Resolving a slug
//!   that is not registered yet walks its parent path and loads the
//!   providers along the way.
//!
//! ## Quick Start
//!
//! ```rust
//! use artisan::prelude::*;
//!
//! let units = UnitTable::new().with("app/moduleA/index", || {
//!     ProviderDef::new("moduleA").register(|scope| {
//!         scope.module("a", ModuleSpec::direct(|| "moduleA.a loaded".to_string()))?;
//!         scope.module(
//!             "b",
//!             ModuleSpec::injected(["moduleA.a"], |deps| {
//!                 Ok(format!("moduleA.b loaded with {}", deps.get::<String>(0)?))
//!             }),
//!         )?;
//!         Ok(())
//!     })
//! });
//!
//! let mut app = Artisan::builder().units(units).build()?;
//! app.register("app")?;
//!
//! assert_eq!(*app.get::<String>("moduleA.b")?, "moduleA.b loaded with moduleA.a loaded");
//!
//! // Swap a dependency for the rest of the test.
//! app.mock("moduleA.a", ModuleSpec::value("mockd!".to_string()));
//! assert_eq!(*app.get::<String>("moduleA.b")?, "moduleA.b loaded with mockd!");
//! app.unmock_all();
//! # Ok::<(), ArtisanError>(())
//! ```
//!
//! ## Features
//!
//! - Lazy provider loading, with opt-in eager providers
//! - Memoized module values with an O(1) slug cache
//! - Mocks and call-scoped overrides that invalidate dependent caches
//! - `reset()` to rebuild the whole graph between test cases
//! - Async commands dispatched by name

mod artisan;
mod command;
mod config;
mod error;
mod module;
mod provider;
mod scope;
mod slug;
mod source;
mod value;

pub mod prelude;

// Re-export core types
pub use artisan::{Artisan, ArtisanBuilder};
pub use command::{handler_fn, Command, CommandFactory, CommandSpec, FnHandler, Handler};
pub use config::{ArtisanConfig, Config, OverridePolicy};
pub use error::{ArtisanError, ArtisanResult, SourceError, SourceResult};
pub use module::{Factory, Module, ModuleSpec, ModuleState};
pub use provider::{Context, LoadState, Provider, ProviderDef, RegisterFn};
pub use scope::Scope;
pub use source::{normalize, Discovery, FsDiscovery, Target, UnitLoader, UnitTable};
pub use value::{Deps, Overrides, Value};

// Re-export async-trait for convenience
pub use async_trait::async_trait;
