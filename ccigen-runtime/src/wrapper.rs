//! Wrapper objects of the simplified representation.

use crate::error::AdapterError;
use crate::foreign::{ForeignObject, HostingContext};
use crate::registry::WrapperRegistry;
use ccigen_tree::ScopedName;
use std::cell::Cell;
use std::rc::Rc;

/// A local wrapper around one distributed object.
pub trait Wrapper {
    /// Interface this wrapper was made for.
    fn interface(&self) -> &ScopedName;

    /// Current local reference count.
    fn ref_count(&self) -> u32;

    /// Increments the local reference count.
    fn add_ref(&self);

    /// Decrements the local reference count and returns true once it
    /// reaches zero, at which point the owner must destroy the wrapper.
    fn release_ref(&self) -> bool;

    /// Returns the foreign reference serving `interface`, if the wrapper
    /// implements it.
    fn downcast(&self, interface: &ScopedName) -> Option<Rc<dyn ForeignObject>>;

    /// Hosting context recorded at construction.
    fn context(&self) -> &HostingContext;
}

/// The concrete wrapper: owns exactly one foreign reference for its whole
/// lifetime and answers every downcast with it.
pub struct FinalWrapper {
    interface: ScopedName,
    closure: Vec<ScopedName>,
    objref: Rc<dyn ForeignObject>,
    context: HostingContext,
    refcount: Cell<u32>,
}

impl FinalWrapper {
    /// Wraps `objref`, duplicating it and taking one application-level
    /// reference.
    ///
    /// `closure` lists every interface the wrapper answers downcasts for.
    ///
    /// # Errors
    /// Returns `AdapterError` if the foreign object refuses the reference.
    pub fn new(
        interface: ScopedName,
        closure: Vec<ScopedName>,
        objref: &Rc<dyn ForeignObject>,
        context: HostingContext,
    ) -> Result<Self, AdapterError> {
        let objref = Rc::clone(objref);
        objref.add_ref()?;
        tracing::trace!(interface = %interface, "wrapper constructed");
        Ok(Self {
            interface,
            closure,
            objref,
            context,
            refcount: Cell::new(1),
        })
    }
}

impl Wrapper for FinalWrapper {
    fn interface(&self) -> &ScopedName {
        &self.interface
    }

    fn ref_count(&self) -> u32 {
        self.refcount.get()
    }

    fn add_ref(&self) {
        self.refcount.set(self.refcount.get() + 1);
    }

    fn release_ref(&self) -> bool {
        let count = self.refcount.get().saturating_sub(1);
        self.refcount.set(count);
        count == 0
    }

    fn downcast(&self, interface: &ScopedName) -> Option<Rc<dyn ForeignObject>> {
        (*interface == self.interface || self.closure.contains(interface))
            .then(|| Rc::clone(&self.objref))
    }

    fn context(&self) -> &HostingContext {
        &self.context
    }
}

impl Drop for FinalWrapper {
    fn drop(&mut self) {
        // Destruction failures are never observable by the caller.
        if let Err(error) = self.objref.release_ref() {
            tracing::warn!(interface = %self.interface, %error, "release during destruction failed");
        }
    }
}

impl std::fmt::Debug for FinalWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinalWrapper")
            .field("interface", &self.interface)
            .field("repository_id", &self.objref.repository_id())
            .field("refcount", &self.refcount.get())
            .finish()
    }
}

/// Drops one local reference, destroying the wrapper when it was the last.
///
/// Returns the wrapper while references remain.
pub fn release(wrapper: Box<dyn Wrapper>) -> Option<Box<dyn Wrapper>> {
    if wrapper.release_ref() {
        drop(wrapper);
        None
    } else {
        Some(wrapper)
    }
}

/// Hands out the foreign reference for `interface` with one extra
/// application-level reference owned by the caller.
///
/// # Errors
/// Returns `AdapterError` if the foreign object refuses the reference.
pub fn unwrap(
    wrapper: &dyn Wrapper,
    interface: &ScopedName,
) -> Result<Option<Rc<dyn ForeignObject>>, AdapterError> {
    let Some(objref) = wrapper.downcast(interface) else {
        return Ok(None);
    };
    objref.add_ref()?;
    Ok(Some(objref))
}

/// Asks the wrapped object for another capability and wraps the answer.
///
/// A refused capability yields `None` without consulting `registry`. A
/// granted one is wrapped through the registry, after which the
/// intermediate foreign reference is released.
///
/// # Errors
/// Returns `AdapterError` if the wrapping factory fails.
pub fn query_interface(
    wrapper: &dyn Wrapper,
    root: &ScopedName,
    id: &str,
    registry: &WrapperRegistry,
) -> Result<Option<Box<dyn Wrapper>>, AdapterError> {
    let Some(held) = wrapper.downcast(root) else {
        return Ok(None);
    };
    let Some(granted) = held.query_interface(id) else {
        tracing::trace!(id, "capability refused");
        return Ok(None);
    };
    let wrapped = registry.wrap(id, &granted, wrapper.context());
    if let Err(error) = granted.release_ref() {
        tracing::warn!(id, %error, "releasing queried capability failed");
    }
    wrapped
}
