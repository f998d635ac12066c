//! Generator configuration.

use ccigen_tree::ScopedName;

/// Default outer namespace of the generated wrappers.
pub const DEFAULT_NAMESPACE: &str = "CCI";

/// Default prefix of generated file and include names.
pub const DEFAULT_HEADER_PREFIX: &str = "CCI";

/// Default universal root capability interface.
pub const DEFAULT_ROOT_INTERFACE: &str = "XPCOM::IObject";

/// Configuration shared by both generation passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Outer namespace of every generated wrapper.
    pub namespace: String,
    /// The interface every other interface derives from.
    pub root_interface: ScopedName,
    /// Prefix of generated file and include names.
    pub header_prefix: String,
    /// Spaces per indentation level.
    pub indent_width: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            root_interface: ScopedName::parse(DEFAULT_ROOT_INTERFACE),
            header_prefix: DEFAULT_HEADER_PREFIX.to_string(),
            indent_width: 2,
        }
    }

    /// Sets the outer namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the root capability interface.
    #[must_use]
    pub fn root_interface(mut self, name: &str) -> Self {
        self.root_interface = ScopedName::parse(name);
        self
    }

    /// Sets the generated file prefix.
    #[must_use]
    pub fn header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.header_prefix = prefix.into();
        self
    }

    /// Sets the indentation width.
    #[must_use]
    pub fn indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// Returns true if `name` is the root capability interface.
    #[must_use]
    pub fn is_root(&self, name: &ScopedName) -> bool {
        *name == self.root_interface
    }

    /// Qualifies a scoped name with the wrapper namespace.
    #[must_use]
    pub fn wrapper_scoped(&self, name: &ScopedName) -> String {
        format!("{}::{}", self.namespace, name.cxx())
    }
}
