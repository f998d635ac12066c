//! Lazy namespace-block management and include deduplication.

use crate::output::Stream;
use std::collections::HashSet;

/// Tracks the logical scope stack and which of its levels have real
/// `namespace` blocks open in the output.
///
/// Blocks are opened only by [`ScopeManager::materialize`], so a scope whose
/// declarations all live in other files never gets a block.
#[derive(Debug, Clone)]
pub struct ScopeManager {
    stack: Vec<String>,
    entry_depth: usize,
    opened: usize,
    closed: usize,
}

impl ScopeManager {
    /// Creates a manager whose outermost scope is `root`.
    #[must_use]
    pub fn new(root: &str) -> Self {
        Self {
            stack: vec![root.to_string()],
            entry_depth: 0,
            opened: 0,
            closed: 0,
        }
    }

    /// Pushes a logical scope.
    pub fn enter(&mut self, name: &str) {
        tracing::trace!(scope = name, depth = self.stack.len(), "enter scope");
        self.stack.push(name.to_string());
    }

    /// Pops a logical scope, closing its block if one was opened.
    pub fn leave(&mut self, out: &mut Stream) {
        self.stack.pop();
        if self.entry_depth > self.stack.len() {
            self.entry_depth = self.stack.len();
            self.close_block(out);
        }
    }

    /// Opens blocks for every level not yet materialized.
    pub fn materialize(&mut self, out: &mut Stream) {
        for name in &self.stack[self.entry_depth..] {
            out.write_line(&format!("namespace {name}"));
            out.write_line("{");
            out.indent();
            self.opened += 1;
        }
        self.entry_depth = self.stack.len();
    }

    /// Closes every open block.
    pub fn escape_all(&mut self, out: &mut Stream) {
        for _ in 0..self.entry_depth {
            self.close_block(out);
        }
        self.entry_depth = 0;
    }

    fn close_block(&mut self, out: &mut Stream) {
        out.dedent();
        out.write_line("};");
        self.closed += 1;
    }

    /// Returns the number of levels with an open block.
    #[must_use]
    pub fn materialized_depth(&self) -> usize {
        self.entry_depth
    }

    /// Returns the number of blocks opened so far.
    #[must_use]
    pub fn opened(&self) -> usize {
        self.opened
    }

    /// Returns the number of blocks closed so far.
    #[must_use]
    pub fn closed(&self) -> usize {
        self.closed
    }
}

/// Files already turned into include directives.
#[derive(Debug, Clone, Default)]
pub struct IncludeSet {
    seen: HashSet<String>,
}

impl IncludeSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `file`, returning true only the first time it is seen.
    pub fn first_time(&mut self, file: &str) -> bool {
        self.seen.insert(file.to_string())
    }

    /// Returns the number of distinct files recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if no file was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_materialize_lazily() {
        let mut out = Stream::new(2);
        let mut scopes = ScopeManager::new("CCI");
        scopes.enter("dom");
        assert_eq!(scopes.opened(), 0);
        scopes.materialize(&mut out);
        scopes.materialize(&mut out);
        assert_eq!(scopes.opened(), 2);
        scopes.leave(&mut out);
        scopes.escape_all(&mut out);
        assert_eq!(scopes.closed(), 2);
        assert_eq!(
            out.into_string(),
            "namespace CCI\n{\n  namespace dom\n  {\n  };\n};\n"
        );
    }

    #[test]
    fn test_scope_leave_without_block() {
        let mut out = Stream::new(2);
        let mut scopes = ScopeManager::new("CCI");
        scopes.enter("ext");
        scopes.leave(&mut out);
        assert_eq!(scopes.closed(), 0);
        assert!(out.as_str().is_empty());
    }

    #[test]
    fn test_escape_then_reopen() {
        let mut out = Stream::new(2);
        let mut scopes = ScopeManager::new("CCI");
        scopes.enter("m");
        scopes.materialize(&mut out);
        scopes.escape_all(&mut out);
        assert_eq!(scopes.materialized_depth(), 0);
        scopes.materialize(&mut out);
        scopes.leave(&mut out);
        scopes.escape_all(&mut out);
        assert_eq!(scopes.opened(), scopes.closed());
        assert_eq!(out.level(), 0);
    }

    #[test]
    fn test_include_set_first_time() {
        let mut includes = IncludeSet::new();
        assert!(includes.first_time("xpcom.idl"));
        assert!(!includes.first_time("xpcom.idl"));
        assert!(includes.first_time("events.idl"));
        assert_eq!(includes.len(), 2);
    }
}
