//! Inheritance linearizer.
//!
//! The base graph is walked over canonical interface ids: every base is
//! resolved through typedef aliases and forward declarations before it is
//! checked against the seen-set, so a diamond reached through different
//! spellings of the same base still yields one entry.

use crate::config::GeneratorConfig;
use ccigen_tree::{NodeId, Tree};
use std::collections::HashSet;

/// How a wrapper inherits one of its bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inheritance {
    /// `public virtual`.
    Virtual,
    /// `public`.
    Plain,
}

impl Inheritance {
    /// Returns the C++ access-specifier text.
    #[must_use]
    pub const fn specifier(self) -> &'static str {
        match self {
            Self::Virtual => "public virtual",
            Self::Plain => "public",
        }
    }
}

/// A direct base of an interface with its inheritance mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseEdge {
    /// Canonical base interface.
    pub base: NodeId,
    /// Selected inheritance.
    pub inheritance: Inheritance,
}

/// Returns `interface` followed by every distinct transitive base, in the
/// order their downcast accessors are emitted.
///
/// The walk pops a work stack and visits each popped node's direct bases in
/// declaration order, so later bases of a popped node are explored first.
#[must_use]
pub fn linearize(tree: &Tree, interface: NodeId) -> Vec<NodeId> {
    let Some(start) = tree.resolve_interface(interface) else {
        return Vec::new();
    };
    let mut order = vec![start];
    let mut seen: HashSet<NodeId> = HashSet::from([start]);
    let mut stack = vec![start];

    while let Some(current) = stack.pop() {
        let Some(def) = tree.interface(current) else {
            continue;
        };
        for &base in &def.bases {
            let Some(canonical) = tree.resolve_interface(base) else {
                tracing::warn!(
                    interface = %tree.node(current).scoped_name,
                    base = %tree.node(base).scoped_name,
                    "base does not resolve to an interface definition"
                );
                continue;
            };
            if seen.insert(canonical) {
                stack.push(canonical);
                order.push(canonical);
            }
        }
    }
    order
}

/// Returns the direct bases of `interface` with virtual-or-plain inheritance.
///
/// A base is inherited virtually when an `ambiguous-inheritance` pragma names
/// it, either as written or by its canonical name, or when it is the root
/// capability interface.
#[must_use]
pub fn inheritance_edges(tree: &Tree, interface: NodeId, config: &GeneratorConfig) -> Vec<BaseEdge> {
    let Some(def) = tree.interface(interface) else {
        return Vec::new();
    };
    def.bases
        .iter()
        .filter_map(|&written| {
            let base = tree.resolve_interface(written)?;
            let canonical = &tree.node(base).scoped_name;
            let ambiguous = def.marks_ambiguous(canonical)
                || def.marks_ambiguous(&tree.node(written).scoped_name);
            let inheritance = if ambiguous || config.is_root(canonical) {
                Inheritance::Virtual
            } else {
                Inheritance::Plain
            };
            Some(BaseEdge { base, inheritance })
        })
        .collect()
}

/// Inheritance of the simplified interface an abstract wrapper implements.
///
/// Terminal interfaces implement it plainly, since nothing derives from them.
#[must_use]
pub fn simple_inheritance(tree: &Tree, interface: NodeId) -> Inheritance {
    match tree.interface(interface) {
        Some(def) if def.is_terminal() => Inheritance::Plain,
        _ => Inheritance::Virtual,
    }
}
