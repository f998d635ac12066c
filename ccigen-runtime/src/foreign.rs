//! The distributed-object side of the adapter.

use crate::error::ForeignError;
use ccigen_tree::ScopedName;
use std::rc::Rc;

/// A reference-counted, remotely invocable object.
///
/// Cloning the `Rc` is the equivalent of duplicating an object reference;
/// `add_ref`/`release_ref` manage the separate application-level count.
pub trait ForeignObject {
    /// Repository id of the most derived interface.
    fn repository_id(&self) -> &str;

    /// Increments the application-level reference count.
    ///
    /// # Errors
    /// Returns the exception raised by the remote side.
    fn add_ref(&self) -> Result<(), ForeignError>;

    /// Decrements the application-level reference count.
    ///
    /// # Errors
    /// Returns the exception raised by the remote side.
    fn release_ref(&self) -> Result<(), ForeignError>;

    /// Returns true if the object implements `interface`.
    fn narrow(&self, interface: &ScopedName) -> bool;

    /// Asks the object for another capability.
    ///
    /// A granted capability carries one application-level reference that the
    /// caller must release.
    fn query_interface(&self, id: &str) -> Option<Rc<dyn ForeignObject>>;
}

/// Opaque handle to the portable object adapter hosting local servants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostingContext {
    name: Rc<str>,
}

impl HostingContext {
    /// Creates a hosting context.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self { name: Rc::from(name) }
    }

    /// Returns the adapter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for HostingContext {
    fn default() -> Self {
        Self::new("RootPOA")
    }
}
