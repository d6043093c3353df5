//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits
//! from Artisan for convenient glob imports.
//!
//! # Example
//!
//! ```rust
//! use artisan::prelude::*;
//! ```

// Configuration
pub use crate::config::{ArtisanConfig, Config, OverridePolicy};

// Container
pub use crate::artisan::{Artisan, ArtisanBuilder};
pub use crate::scope::Scope;

// Modules, providers and commands
pub use crate::command::{handler_fn, CommandSpec, Handler};
pub use crate::module::{ModuleSpec, ModuleState};
pub use crate::provider::ProviderDef;

// Unit sources
pub use crate::source::{Discovery, FsDiscovery, UnitLoader, UnitTable};

// Values
pub use crate::value::{Deps, Overrides, Value};

// Errors
pub use crate::error::{ArtisanError, ArtisanResult, SourceError};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
