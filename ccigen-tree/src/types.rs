//! Type descriptors and scoped names.
//!
//! This module contains the data structures describing the types that flow
//! through operations and attributes, and the scoped names that identify
//! declarations in the interface-definition tree.

use std::fmt;

/// A fully scoped name such as `dom::Node`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ScopedName(Vec<String>);

impl ScopedName {
    /// Creates a scoped name from its components.
    #[must_use]
    pub fn new(parts: Vec<String>) -> Self {
        Self(parts)
    }

    /// Parses a `a::b::c` style name. A leading `::` is accepted and ignored.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        Self(
            s.split("::")
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Returns a new name with `name` appended.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut parts = self.0.clone();
        parts.push(name.to_string());
        Self(parts)
    }

    /// Returns the enclosing scope, or `None` for the global scope.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Returns the name components.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Returns the last component.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Renders as a C++ scoped name (`a::b::c`).
    #[must_use]
    pub fn cxx(&self) -> String {
        self.0.join("::")
    }

    /// Renders as an underscore-joined name (`a_b_c`).
    #[must_use]
    pub fn joined(&self) -> String {
        self.0.join("_")
    }

    /// Returns the number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the global scope.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Candidate absolute names for `relative` looked up from this scope,
    /// innermost scope first.
    #[must_use]
    pub fn lookup_candidates(&self, relative: &str) -> Vec<ScopedName> {
        let target = ScopedName::parse(relative);
        if relative.trim_start().starts_with("::") {
            return vec![target];
        }

        let mut candidates = Vec::with_capacity(self.0.len() + 1);
        for depth in (0..=self.0.len()).rev() {
            let mut parts = self.0[..depth].to_vec();
            parts.extend(target.0.iter().cloned());
            candidates.push(ScopedName(parts));
        }
        candidates
    }
}

impl fmt::Display for ScopedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cxx())
    }
}

impl From<&str> for ScopedName {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// Type descriptor for parameters, return values and attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    /// No value (operation return only).
    Void,
    /// IDL `boolean`.
    Boolean,
    /// IDL `octet`.
    Octet,
    /// IDL `short`.
    Short,
    /// IDL `unsigned short`.
    UShort,
    /// IDL `long`.
    Long,
    /// IDL `unsigned long`.
    ULong,
    /// IDL `long long`.
    LongLong,
    /// IDL `unsigned long long`.
    ULongLong,
    /// IDL `float`.
    Float,
    /// IDL `double`.
    Double,
    /// IDL `char`.
    Char,
    /// IDL `wchar`.
    WChar,
    /// IDL `string`.
    String,
    /// IDL `wstring`.
    WString,
    /// Enumeration declared at the given name.
    Enum(ScopedName),
    /// Object reference to the interface at the given name.
    Interface(ScopedName),
    /// Named sequence typedef.
    Sequence {
        /// Scoped name of the typedef declaring the sequence.
        name: ScopedName,
        /// Element type.
        element: Box<TypeDesc>,
    },
}

impl TypeDesc {
    /// Parses a basic type keyword (`long`, `unsigned short`, `wstring`, ...).
    #[must_use]
    pub fn from_keyword(s: &str) -> Option<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.as_str() {
            "void" => Some(Self::Void),
            "boolean" => Some(Self::Boolean),
            "octet" => Some(Self::Octet),
            "short" => Some(Self::Short),
            "unsigned short" => Some(Self::UShort),
            "long" => Some(Self::Long),
            "unsigned long" => Some(Self::ULong),
            "long long" => Some(Self::LongLong),
            "unsigned long long" => Some(Self::ULongLong),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "char" => Some(Self::Char),
            "wchar" => Some(Self::WChar),
            "string" => Some(Self::String),
            "wstring" => Some(Self::WString),
            _ => None,
        }
    }

    /// Returns true if values of this type travel with a paired element count.
    #[must_use]
    pub const fn is_length_bearing(&self) -> bool {
        matches!(self, Self::Sequence { .. })
    }

    /// Returns true for `void`.
    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Returns true for object references.
    #[must_use]
    pub const fn is_interface(&self) -> bool {
        matches!(self, Self::Interface(_))
    }

    /// Returns the IDL spelling of the type.
    #[must_use]
    pub fn idl_name(&self) -> String {
        match self {
            Self::Void => "void".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Octet => "octet".to_string(),
            Self::Short => "short".to_string(),
            Self::UShort => "unsigned short".to_string(),
            Self::Long => "long".to_string(),
            Self::ULong => "unsigned long".to_string(),
            Self::LongLong => "long long".to_string(),
            Self::ULongLong => "unsigned long long".to_string(),
            Self::Float => "float".to_string(),
            Self::Double => "double".to_string(),
            Self::Char => "char".to_string(),
            Self::WChar => "wchar".to_string(),
            Self::String => "string".to_string(),
            Self::WString => "wstring".to_string(),
            Self::Enum(name) | Self::Interface(name) | Self::Sequence { name, .. } => name.cxx(),
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.idl_name())
    }
}
