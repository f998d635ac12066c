//! Interface annotations.

use crate::types::ScopedName;

/// A pragma attached to an interface, decoded once when the tree is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pragma {
    /// The interface will not be derived from again.
    TerminalInterface,
    /// Other modules inherit from this interface.
    CrossModuleInheritance,
    /// Other modules take this interface as an argument.
    CrossModuleArgument,
    /// Inheritance of the named base must be virtual.
    AmbiguousInheritance(ScopedName),
    /// Any text this generator does not act on.
    Other(String),
}

impl Pragma {
    /// Decodes pragma text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text {
            "terminal-interface" => Self::TerminalInterface,
            "cross-module-inheritance" => Self::CrossModuleInheritance,
            "cross-module-argument" => Self::CrossModuleArgument,
            _ => text
                .strip_prefix("ambiguous-inheritance(")
                .and_then(|rest| rest.strip_suffix(')'))
                .map(|base| Self::AmbiguousInheritance(ScopedName::parse(base)))
                .unwrap_or_else(|| Self::Other(text.to_string())),
        }
    }

    /// Returns true if the interface must be exported from its module.
    #[must_use]
    pub const fn requires_export(&self) -> bool {
        matches!(
            self,
            Self::CrossModuleInheritance | Self::CrossModuleArgument
        )
    }

    /// Returns true if this pragma marks `base` as ambiguous.
    #[must_use]
    pub fn names_ambiguous_base(&self, base: &ScopedName) -> bool {
        matches!(self, Self::AmbiguousInheritance(name) if name == base)
    }
}
