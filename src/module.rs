//! Lazily evaluated, memoized dependency nodes.
//!
//! A [`Module`] pairs a slug with a [`ModuleSpec`]. The spec is either a
//! plain factory or an ordered list of dependency slugs followed by a
//! factory receiving the resolved dependencies positionally.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::ArtisanResult;
use crate::slug;
use crate::value::{Deps, Overrides, Value};

/// Factory invoked with the resolved dependencies of a module.
pub type Factory = Rc<dyn Fn(&Deps) -> ArtisanResult<Value>>;

/// How a module computes its value.
///
/// # Example
///
/// ```rust
/// use artisan::ModuleSpec;
///
/// let a = ModuleSpec::direct(|| "moduleA.a loaded".to_string());
/// let b = ModuleSpec::injected(["moduleA.a"], |deps| {
///     Ok(format!("moduleA.b loaded with {}", deps.get::<String>(0)?))
/// });
///
/// assert!(a.dependencies().is_empty());
/// assert_eq!(b.dependencies(), ["moduleA.a"]);
/// ```
#[derive(Clone)]
pub enum ModuleSpec {
    /// A factory without dependencies.
    Direct(Factory),
    /// Named dependencies resolved in order, then passed to the factory.
    Injected { deps: Vec<String>, factory: Factory },
}

impl ModuleSpec {
    /// Spec from a dependency-free constructor.
    pub fn direct<T, F>(f: F) -> Self
    where
        T: Any,
        F: Fn() -> T + 'static,
    {
        ModuleSpec::Direct(Rc::new(move |_: &Deps| Ok(Value::new(f()))))
    }

    /// Spec from a fallible dependency-free constructor.
    pub fn try_direct<T, F>(f: F) -> Self
    where
        T: Any,
        F: Fn() -> ArtisanResult<T> + 'static,
    {
        ModuleSpec::Direct(Rc::new(move |_: &Deps| f().map(Value::new)))
    }

    /// Spec that always yields `value`.
    pub fn value<T: Any + Clone>(value: T) -> Self {
        Self::direct(move || value.clone())
    }

    /// Spec with named dependencies.
    pub fn injected<I, S, T, F>(deps: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        T: Any,
        F: Fn(&Deps) -> ArtisanResult<T> + 'static,
    {
        ModuleSpec::Injected {
            deps: deps.into_iter().map(Into::into).collect(),
            factory: Rc::new(move |deps: &Deps| f(deps).map(Value::new)),
        }
    }

    /// Declared dependency slugs, in positional order.
    pub fn dependencies(&self) -> &[String] {
        match self {
            ModuleSpec::Direct(_) => &[],
            ModuleSpec::Injected { deps, .. } => deps,
        }
    }

    /// Rewrites relative dependency names against `namespace`.
    pub(crate) fn qualified(self, namespace: &str) -> Self {
        match self {
            ModuleSpec::Direct(factory) => ModuleSpec::Direct(factory),
            ModuleSpec::Injected { deps, factory } => ModuleSpec::Injected {
                deps: deps
                    .iter()
                    .map(|dep| slug::qualify(namespace, dep))
                    .collect(),
                factory,
            },
        }
    }

    /// Assembles the arguments and invokes the factory.
    ///
    /// Dependencies named in `overrides` take the override value; every other
    /// dependency goes through `resolve`. Positions are kept as declared.
    pub(crate) fn evaluate<R>(
        &self,
        overrides: Option<&Overrides>,
        mut resolve: R,
    ) -> ArtisanResult<Value>
    where
        R: FnMut(&str) -> ArtisanResult<Value>,
    {
        match self {
            ModuleSpec::Direct(factory) => factory(&Deps::default()),
            ModuleSpec::Injected { deps, factory } => {
                let mut values = Vec::with_capacity(deps.len());
                for dep in deps {
                    let value = match overrides.and_then(|o| o.get(dep)) {
                        Some(value) => value.clone(),
                        None => resolve(dep)?,
                    };
                    values.push(value);
                }
                factory(&Deps::new(deps.clone(), values))
            }
        }
    }
}

impl fmt::Debug for ModuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSpec::Direct(_) => f.write_str("Direct"),
            ModuleSpec::Injected { deps, .. } => {
                f.debug_struct("Injected").field("deps", deps).finish()
            }
        }
    }
}

/// Evaluation state of a slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// No module carries the slug.
    Unregistered,
    /// Registered but never evaluated, or reset since.
    Unevaluated,
    /// Holds a memoized value.
    Evaluated,
}

/// A named module and its memoized value.
#[derive(Debug)]
pub struct Module {
    slug: String,
    spec: ModuleSpec,
    value: Option<Value>,
    mock: bool,
}

impl Module {
    /// Create a module; relative dependencies are resolved against the slug's namespace.
    pub fn new(slug: impl Into<String>, spec: ModuleSpec) -> Self {
        let slug = slug.into();
        let spec = spec.qualified(slug::parent(&slug));
        Self {
            slug,
            spec,
            value: None,
            mock: false,
        }
    }

    /// Create a module that overlays another one with the same slug.
    pub fn mock(slug: impl Into<String>, spec: ModuleSpec) -> Self {
        Self {
            mock: true,
            ..Self::new(slug, spec)
        }
    }

    /// Get the module slug.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Get the module spec.
    pub fn spec(&self) -> &ModuleSpec {
        &self.spec
    }

    /// Check whether the module overlays another one.
    pub fn is_mock(&self) -> bool {
        self.mock
    }

    /// The memoized value, if evaluated.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Get the evaluation state.
    pub fn state(&self) -> ModuleState {
        if self.value.is_some() {
            ModuleState::Evaluated
        } else {
            ModuleState::Unevaluated
        }
    }

    pub(crate) fn store(&mut self, value: Value) {
        self.value = Some(value);
    }

    /// Drop the memoized value. Idempotent.
    pub fn reset(&mut self) {
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn describe(deps: &Deps) -> ArtisanResult<String> {
        let parts: ArtisanResult<Vec<&str>> = (0..deps.len())
            .map(|i| deps.get::<String>(i).map(String::as_str))
            .collect();
        Ok(parts?.join(","))
    }

    #[test]
    fn test_direct_spec_ignores_resolver() {
        let spec = ModuleSpec::direct(|| 7u8);
        let value = spec
            .evaluate(None, |name| panic!("unexpected resolution of {name}"))
            .unwrap();
        assert_eq!(value.downcast_ref::<u8>(), Some(&7));
    }

    #[test]
    fn test_injected_spec_resolves_in_order() {
        let spec = ModuleSpec::injected(["svc.x", "svc.y", "svc.z"], describe);
        let seen = RefCell::new(Vec::new());

        let value = spec
            .evaluate(None, |name| {
                seen.borrow_mut().push(name.to_string());
                Ok(Value::new(name.to_string()))
            })
            .unwrap();

        assert_eq!(value.downcast_ref::<String>().unwrap(), "svc.x,svc.y,svc.z");
        assert_eq!(*seen.borrow(), vec!["svc.x", "svc.y", "svc.z"]);
    }

    #[test]
    fn test_overrides_keep_positions() {
        let spec = ModuleSpec::injected(["svc.x", "svc.y", "svc.z"], describe);
        let overrides = Overrides::new()
            .with("svc.y", "Y".to_string())
            .with("svc.unrelated", "U".to_string());
        let seen = RefCell::new(Vec::new());

        let value = spec
            .evaluate(Some(&overrides), |name| {
                seen.borrow_mut().push(name.to_string());
                Ok(Value::new(name.to_string()))
            })
            .unwrap();

        assert_eq!(value.downcast_ref::<String>().unwrap(), "svc.x,Y,svc.z");
        assert_eq!(*seen.borrow(), vec!["svc.x", "svc.z"]);
    }

    #[test]
    fn test_resolution_error_propagates() {
        let spec = ModuleSpec::injected(["svc.missing"], describe);
        let result = spec.evaluate(None, |name| {
            Err(crate::ArtisanError::ModuleNotFound(name.to_string()))
        });
        assert!(matches!(result, Err(crate::ArtisanError::ModuleNotFound(n)) if n == "svc.missing"));
    }

    #[test]
    fn test_relative_dependencies_are_qualified() {
        let module = Module::new(
            "moduleA.b",
            ModuleSpec::injected(["./a", "other.c"], describe),
        );
        assert_eq!(module.spec().dependencies(), ["moduleA.a", "other.c"]);
    }

    #[test]
    fn test_module_state_and_reset() {
        let mut module = Module::new("moduleA.a", ModuleSpec::value(1u8));
        assert_eq!(module.state(), ModuleState::Unevaluated);
        assert!(!module.is_mock());

        module.store(Value::new(1u8));
        assert_eq!(module.state(), ModuleState::Evaluated);

        module.reset();
        module.reset();
        assert_eq!(module.state(), ModuleState::Unevaluated);
        assert!(module.value().is_none());

        assert!(Module::mock("moduleA.a", ModuleSpec::value(2u8)).is_mock());
    }
}
