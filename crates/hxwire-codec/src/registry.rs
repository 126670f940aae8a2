//! Class name to factory table consulted by the decoder.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use crate::class::{DynamicClass, InstanceRef, Serializable};
use crate::error::{CodecError, Result};

/// Produces an empty instance of a class.
pub type ClassFactory = Arc<dyn Fn() -> InstanceRef + Send + Sync>;

/// Names that can never be registered.
const RESERVED_NAMES: [&str; 3] = ["", "null", "undefined"];

/// Maps a class name to a fresh, empty instance.
pub trait ClassResolver {
    fn resolve(&self, name: &str) -> Option<InstanceRef>;
}

/// Caller-owned class registry.
#[derive(Clone, Default)]
pub struct ClassRegistry {
    factories: HashMap<String, ClassFactory>,
}

impl ClassRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn() -> InstanceRef + Send + Sync + 'static,
    {
        let name = name.into();
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(CodecError::InvalidClassName(name));
        }

        if self.factories.insert(name.clone(), Arc::new(factory)).is_some() {
            debug!(class = %name, "replaced registered class");
        } else {
            debug!(class = %name, "registered class");
        }
        Ok(())
    }

    /// Register `T` under the class name of its default instance.
    pub fn register_class<T>(&mut self) -> Result<()>
    where
        T: Serializable + Default,
    {
        let name = T::default().class_name().to_string();
        self.register(name, || Rc::new(RefCell::new(T::default())) as InstanceRef)
    }

    /// Register `name` as a [`DynamicClass`].
    pub fn register_dynamic(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let class_name = name.clone();
        self.register(name, move || {
            Rc::new(RefCell::new(DynamicClass::new(class_name.clone()))) as InstanceRef
        })
    }

    /// Register several factories at once.
    pub fn from_factories<F>(factories: impl IntoIterator<Item = (String, F)>) -> Result<Self>
    where
        F: Fn() -> InstanceRef + Send + Sync + 'static,
    {
        let mut registry = Self::new();
        for (name, factory) in factories {
            registry.register(name, factory)?;
        }
        Ok(registry)
    }

    /// Remove a class; returns true if it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.factories.remove(name).is_some()
    }

    /// Check if a class name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered class names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Create an empty instance of `name`.
    pub fn instantiate(&self, name: &str) -> Option<InstanceRef> {
        self.factories.get(name).map(|factory| factory())
    }

    fn factory(&self, name: &str) -> Option<ClassFactory> {
        self.factories.get(name).cloned()
    }
}

impl ClassResolver for ClassRegistry {
    fn resolve(&self, name: &str) -> Option<InstanceRef> {
        self.instantiate(name)
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.names())
            .finish()
    }
}

fn global() -> &'static RwLock<ClassRegistry> {
    static GLOBAL: OnceLock<RwLock<ClassRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(ClassRegistry::new()))
}

/// Run `f` with write access to the process-wide default registry.
///
/// Meant to be populated once at startup; decoders built with
/// [`Decoder::new`](crate::decoder::Decoder::new) resolve against it.
pub fn with_global_registry<R>(f: impl FnOnce(&mut ClassRegistry) -> R) -> R {
    let mut registry = global().write().unwrap_or_else(PoisonError::into_inner);
    f(&mut registry)
}

/// Register `T` in the process-wide default registry.
pub fn register_global_class<T>() -> Result<()>
where
    T: Serializable + Default,
{
    with_global_registry(|registry| registry.register_class::<T>())
}

/// Resolves against the process-wide default registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalResolver;

impl ClassResolver for GlobalResolver {
    fn resolve(&self, name: &str) -> Option<InstanceRef> {
        // The factory runs outside the lock so it may touch the registry itself.
        let factory = global()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .factory(name)?;
        Some(factory())
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::value::Value;

    #[derive(Default)]
    struct Marker;

    impl Serializable for Marker {
        fn class_name(&self) -> &str {
            "registry.Marker"
        }

        fn field_names(&self) -> Vec<&str> {
            Vec::new()
        }

        fn get_field(&self, _name: &str) -> Option<Value> {
            None
        }

        fn set_field(&mut self, name: &str, _value: Value) -> Result<()> {
            Err(crate::class::unknown_field(self.class_name(), name))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn register_and_resolve() {
        let mut registry = ClassRegistry::new();
        registry.register_class::<Marker>().unwrap();

        assert!(registry.contains("registry.Marker"));
        let instance = registry.resolve("registry.Marker").unwrap();
        assert_eq!(instance.borrow().class_name(), "registry.Marker");
        assert!(registry.resolve("Missing").is_none());
    }

    #[test]
    fn reserved_names_are_rejected() {
        let mut registry = ClassRegistry::new();
        for name in ["", "null", "undefined"] {
            assert!(matches!(
                registry.register_dynamic(name),
                Err(CodecError::InvalidClassName(_))
            ));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn reregistration_overwrites() {
        let mut registry = ClassRegistry::new();
        registry.register_dynamic("Thing").unwrap();
        registry
            .register("Thing", || {
                Rc::new(RefCell::new(DynamicClass::new("Other"))) as InstanceRef
            })
            .unwrap();

        assert_eq!(registry.len(), 1);
        let instance = registry.instantiate("Thing").unwrap();
        assert_eq!(instance.borrow().class_name(), "Other");
    }

    #[test]
    fn names_are_sorted_and_unregister_works() {
        let mut registry = ClassRegistry::new();
        registry.register_dynamic("b.B").unwrap();
        registry.register_dynamic("a.A").unwrap();
        assert_eq!(registry.names(), vec!["a.A", "b.B"]);

        assert!(registry.unregister("a.A"));
        assert!(!registry.unregister("a.A"));
        assert_eq!(registry.names(), vec!["b.B"]);
    }

    #[test]
    fn each_resolution_is_a_fresh_instance() {
        let mut registry = ClassRegistry::new();
        registry.register_dynamic("Fresh").unwrap();
        let a = registry.instantiate("Fresh").unwrap();
        let b = registry.instantiate("Fresh").unwrap();
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn from_factories_registers_all() {
        let registry = ClassRegistry::from_factories([
            ("One".to_string(), || {
                Rc::new(RefCell::new(DynamicClass::new("One"))) as InstanceRef
            }),
        ])
        .unwrap();
        assert!(registry.contains("One"));
    }

    #[test]
    fn global_registry_resolves() {
        register_global_class::<Marker>().unwrap();
        let instance = GlobalResolver.resolve("registry.Marker").unwrap();
        assert_eq!(instance.borrow().class_name(), "registry.Marker");
        assert!(with_global_registry(|registry| registry.contains("registry.Marker")));
    }
}
