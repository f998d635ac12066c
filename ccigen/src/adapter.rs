//! Binds the runtime model to a loaded tree.
//!
//! Registering one factory per local interface mirrors the global factory
//! instances the definition file creates.

use ccigen_codegen::linearize;
use ccigen_runtime::{InterfaceFactory, WrapperRegistry};
use ccigen_tree::{NodeId, ScopedName, Tree};
use std::sync::Arc;

/// Returns the interfaces a wrapper for `interface` answers downcasts for.
#[must_use]
pub fn interface_closure(tree: &Tree, interface: NodeId) -> Vec<ScopedName> {
    linearize(tree, interface)
        .into_iter()
        .map(|id| tree.node(id).scoped_name.clone())
        .collect()
}

/// Registers a factory for every interface defined in the tree's main file.
///
/// Returns how many factories were registered.
pub fn register_factories(tree: &Tree, registry: &WrapperRegistry) -> usize {
    let mut registered = 0;
    for (id, node) in tree.iter() {
        if node.as_interface().is_none() || node.file != tree.file {
            continue;
        }
        let factory = InterfaceFactory::new(node.scoped_name.clone(), interface_closure(tree, id));
        registry.register(Arc::new(factory));
        registered += 1;
    }
    tracing::debug!(file = %tree.file, registered, "registered wrapper factories");
    registered
}
