//! Process-wide factory registry.
//!
//! Every final wrapper type registers one factory under its interface name.
//! Looking a factory up by repository id and asking it to wrap an object is
//! how a queried capability becomes a local wrapper.

use crate::error::AdapterError;
use crate::foreign::{ForeignObject, HostingContext};
use crate::wrapper::{FinalWrapper, Wrapper};
use ccigen_tree::ScopedName;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Builds wrappers for one interface.
pub trait Factory: Send + Sync {
    /// Interface name the factory is registered under.
    fn name(&self) -> &str;

    /// Wraps `object`, or returns `None` if it does not implement the
    /// factory's interface.
    ///
    /// # Errors
    /// Returns `AdapterError` if the wrapper could not be constructed.
    fn make(
        &self,
        object: &Rc<dyn ForeignObject>,
        context: &HostingContext,
    ) -> Result<Option<Box<dyn Wrapper>>, AdapterError>;
}

/// Factory producing [`FinalWrapper`]s for a single interface.
#[derive(Debug)]
pub struct InterfaceFactory {
    interface: ScopedName,
    name: String,
    closure: Vec<ScopedName>,
    made: AtomicUsize,
}

impl InterfaceFactory {
    /// Creates a factory for `interface` whose wrappers answer downcasts for
    /// every interface in `closure`.
    #[must_use]
    pub fn new(interface: ScopedName, closure: Vec<ScopedName>) -> Self {
        let name = interface.cxx();
        Self {
            interface,
            name,
            closure,
            made: AtomicUsize::new(0),
        }
    }

    /// Number of wrappers made so far.
    pub fn made(&self) -> usize {
        self.made.load(Ordering::Relaxed)
    }
}

impl Factory for InterfaceFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn make(
        &self,
        object: &Rc<dyn ForeignObject>,
        context: &HostingContext,
    ) -> Result<Option<Box<dyn Wrapper>>, AdapterError> {
        if !object.narrow(&self.interface) {
            tracing::debug!(
                factory = %self.name,
                repository_id = object.repository_id(),
                "object does not narrow to factory interface"
            );
            return Ok(None);
        }
        let wrapper = FinalWrapper::new(
            self.interface.clone(),
            self.closure.clone(),
            object,
            context.clone(),
        )?;
        self.made.fetch_add(1, Ordering::Relaxed);
        Ok(Some(Box::new(wrapper)))
    }
}

/// Name-to-factory table.
pub struct WrapperRegistry {
    factories: RwLock<HashMap<String, Arc<dyn Factory>>>,
    lookups: AtomicUsize,
}

impl WrapperRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Returns the process-wide registry generated factories register with.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<WrapperRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Registers `factory` under its name, returning any factory it replaced.
    pub fn register(&self, factory: Arc<dyn Factory>) -> Option<Arc<dyn Factory>> {
        let name = factory.name().to_string();
        let previous = self.factories.write().insert(name.clone(), factory);
        if previous.is_some() {
            tracing::warn!(factory = %name, "factory registered twice, replacing");
        } else {
            tracing::debug!(factory = %name, "factory registered");
        }
        previous
    }

    /// Removes the factory registered under `name`.
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Factory>> {
        self.factories.write().remove(name)
    }

    /// Looks up a factory by name.
    pub fn factory(&self, name: &str) -> Option<Arc<dyn Factory>> {
        self.factories.read().get(name).cloned()
    }

    /// Wraps `object` with the factory registered under `id`.
    ///
    /// Returns `None` when no factory is registered or the object does not
    /// implement the interface.
    ///
    /// # Errors
    /// Returns `AdapterError` if the factory fails.
    pub fn wrap(
        &self,
        id: &str,
        object: &Rc<dyn ForeignObject>,
        context: &HostingContext,
    ) -> Result<Option<Box<dyn Wrapper>>, AdapterError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        // The lock is released before the factory runs.
        let Some(factory) = self.factory(id) else {
            tracing::warn!(id, "no factory registered");
            return Ok(None);
        };
        factory.make(object, context)
    }

    /// Number of `wrap` calls served.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }
}

impl Default for WrapperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WrapperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrapperRegistry")
            .field("factories", &self.names())
            .finish()
    }
}
