//! Type-erased values handed between modules.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{ArtisanError, ArtisanResult};

/// A shared, type-erased value produced by a module factory.
///
/// Cloning a `Value` is cheap and yields a handle to the same allocation,
/// which is how memoized modules hand out "the same" value on every
/// resolution.
///
/// # Example
///
/// ```rust
/// use artisan::Value;
///
/// let value = Value::new("moduleA.a loaded".to_string());
/// assert_eq!(value.downcast_ref::<String>().unwrap(), "moduleA.a loaded");
/// assert!(Value::ptr_eq(&value, &value.clone()));
/// ```
#[derive(Clone)]
pub struct Value {
    inner: Rc<dyn Any>,
    type_name: &'static str,
}

impl Value {
    /// Wrap a value.
    pub fn new<T: Any>(value: T) -> Self {
        Self::from_rc(Rc::new(value))
    }

    /// Wrap an already shared value without copying it.
    pub fn from_rc<T: Any>(value: Rc<T>) -> Self {
        Self {
            inner: value,
            type_name: type_name::<T>(),
        }
    }

    /// Borrow the value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Get a shared handle to the value as `T`.
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Check whether the value holds a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Name of the wrapped type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True when both handles point at the same allocation.
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    pub(crate) fn expect_type<T: Any>(&self, name: &str) -> ArtisanResult<Rc<T>> {
        self.downcast::<T>()
            .ok_or_else(|| ArtisanError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
                found: self.type_name,
            })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>", self.type_name)
    }
}

/// Resolved dependencies, in the order the module declared them.
#[derive(Debug, Clone, Default)]
pub struct Deps {
    names: Vec<String>,
    values: Vec<Value>,
}

impl Deps {
    pub(crate) fn new(names: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    /// Borrow the dependency at `index` as `T`.
    pub fn get<T: Any>(&self, index: usize) -> ArtisanResult<&T> {
        let value = self.value_at(index)?;
        value
            .downcast_ref::<T>()
            .ok_or_else(|| ArtisanError::TypeMismatch {
                name: self.names[index].clone(),
                expected: type_name::<T>(),
                found: value.type_name(),
            })
    }

    /// Shared handle to the dependency at `index` as `T`.
    pub fn shared<T: Any>(&self, index: usize) -> ArtisanResult<Rc<T>> {
        self.value_at(index)?.expect_type::<T>(&self.names[index])
    }

    /// The untyped dependency at `index`.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Slugs of the dependencies.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Get the number of dependencies.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether there are no dependencies.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn value_at(&self, index: usize) -> ArtisanResult<&Value> {
        self.values.get(index).ok_or_else(|| {
            ArtisanError::other(format!(
                "no dependency at position {index} ({} declared)",
                self.values.len()
            ))
        })
    }
}

/// Call-scoped replacements for direct dependencies, keyed by slug.
///
/// ```rust
/// use artisan::Overrides;
///
/// let overrides = Overrides::new().with("moduleA.a", "mockd!".to_string());
/// assert!(overrides.contains("moduleA.a"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    values: HashMap<String, Value>,
}

impl Overrides {
    /// Create an empty override map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override for `name`.
    pub fn with<T: Any>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, Value::new(value));
        self
    }

    /// Add an already wrapped override for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Get the override for `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Check whether `name` is overridden.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Get the number of overrides.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether there are no overrides.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
