//! Type-to-text mapping tables.
//!
//! Pure functions from a [`TypeDesc`] to the C++ spelling of the type in the
//! simplified representation and in the distributed-object representation.

use crate::types::TypeDesc;

/// Namespace holding the simplified interfaces.
pub const SIMPLE_NAMESPACE: &str = "iface";

/// Shape adjustments applied to a simplified type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimpleForm {
    /// Add one pointer level (out and inout parameters).
    pub extra_pointer: bool,
    /// Pointer-like types are pointers to const (in parameters).
    pub is_const: bool,
}

impl SimpleForm {
    /// The plain value form.
    pub const VALUE: Self = Self {
        extra_pointer: false,
        is_const: false,
    };

    /// The form of an incoming argument.
    pub const IN: Self = Self {
        extra_pointer: false,
        is_const: true,
    };

    /// The form of an outgoing argument.
    pub const OUT: Self = Self {
        extra_pointer: true,
        is_const: false,
    };
}

/// Returns true if the type is spelled as a pointer in the simplified form.
#[must_use]
pub fn is_pointer_like(ty: &TypeDesc) -> bool {
    matches!(
        ty,
        TypeDesc::String | TypeDesc::WString | TypeDesc::Interface(_) | TypeDesc::Sequence { .. }
    )
}

/// Returns the simplified C++ type.
#[must_use]
pub fn simple_type(ty: &TypeDesc, form: SimpleForm) -> String {
    let mut text = match ty {
        TypeDesc::Sequence { element, .. } => {
            let element_type = simple_type(element, SimpleForm::VALUE);
            if form.is_const && is_pointer_like(element) {
                format!("{element_type} const*")
            } else if form.is_const {
                format!("const {element_type}*")
            } else {
                format!("{element_type}*")
            }
        }
        TypeDesc::String | TypeDesc::WString if form.is_const => {
            format!("const {}", simple_base(ty))
        }
        _ => simple_base(ty),
    };
    if form.extra_pointer {
        text.push('*');
    }
    text
}

fn simple_base(ty: &TypeDesc) -> String {
    match ty {
        TypeDesc::Void => "void".to_string(),
        TypeDesc::Boolean => "bool".to_string(),
        TypeDesc::Octet => "uint8_t".to_string(),
        TypeDesc::Short => "int16_t".to_string(),
        TypeDesc::UShort => "uint16_t".to_string(),
        TypeDesc::Long => "int32_t".to_string(),
        TypeDesc::ULong => "uint32_t".to_string(),
        TypeDesc::LongLong => "int64_t".to_string(),
        TypeDesc::ULongLong => "uint64_t".to_string(),
        TypeDesc::Float => "float".to_string(),
        TypeDesc::Double => "double".to_string(),
        TypeDesc::Char => "char".to_string(),
        TypeDesc::WChar => "wchar_t".to_string(),
        TypeDesc::String => "char*".to_string(),
        TypeDesc::WString => "wchar_t*".to_string(),
        TypeDesc::Enum(name) => format!("{SIMPLE_NAMESPACE}::{}", name.cxx()),
        TypeDesc::Interface(name) => format!("{SIMPLE_NAMESPACE}::{}*", name.cxx()),
        TypeDesc::Sequence { element, .. } => format!("{}*", simple_base(element)),
    }
}

/// Returns the distributed-object storage type for a local variable.
#[must_use]
pub fn corba_var_type(ty: &TypeDesc) -> String {
    match ty {
        TypeDesc::Void => "void".to_string(),
        TypeDesc::Boolean => "CORBA::Boolean".to_string(),
        TypeDesc::Octet => "CORBA::Octet".to_string(),
        TypeDesc::Short => "CORBA::Short".to_string(),
        TypeDesc::UShort => "CORBA::UShort".to_string(),
        TypeDesc::Long => "CORBA::Long".to_string(),
        TypeDesc::ULong => "CORBA::ULong".to_string(),
        TypeDesc::LongLong => "CORBA::LongLong".to_string(),
        TypeDesc::ULongLong => "CORBA::ULongLong".to_string(),
        TypeDesc::Float => "CORBA::Float".to_string(),
        TypeDesc::Double => "CORBA::Double".to_string(),
        TypeDesc::Char => "CORBA::Char".to_string(),
        TypeDesc::WChar => "CORBA::WChar".to_string(),
        TypeDesc::String => "CORBA::String_var".to_string(),
        TypeDesc::WString => "CORBA::WString_var".to_string(),
        TypeDesc::Enum(name) => format!("::{}", name.cxx()),
        TypeDesc::Interface(name) | TypeDesc::Sequence { name, .. } => {
            format!("::{}_var", name.cxx())
        }
    }
}

/// Returns the distributed-object type name without the `_var` holder.
#[must_use]
pub fn corba_type(ty: &TypeDesc) -> String {
    match ty {
        TypeDesc::Interface(name) | TypeDesc::Sequence { name, .. } | TypeDesc::Enum(name) => {
            format!("::{}", name.cxx())
        }
        _ => corba_var_type(ty),
    }
}

/// Returns true if a simplified value of this type owns memory or a reference.
#[must_use]
pub fn needs_destroy_local(ty: &TypeDesc) -> bool {
    is_pointer_like(ty)
}

/// Returns true if a distributed-object value of this type holds an
/// application-level reference that must be released explicitly.
#[must_use]
pub fn needs_destroy_foreign(ty: &TypeDesc) -> bool {
    match ty {
        TypeDesc::Interface(_) => true,
        TypeDesc::Sequence { element, .. } => needs_destroy_foreign(element),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScopedName;

    fn node() -> TypeDesc {
        TypeDesc::Interface(ScopedName::parse("dom::Node"))
    }

    fn node_list() -> TypeDesc {
        TypeDesc::Sequence {
            name: ScopedName::parse("dom::NodeSeq"),
            element: Box::new(node()),
        }
    }

    #[test]
    fn test_simple_numeric_types() {
        assert_eq!(simple_type(&TypeDesc::Long, SimpleForm::VALUE), "int32_t");
        assert_eq!(simple_type(&TypeDesc::ULongLong, SimpleForm::IN), "uint64_t");
        assert_eq!(simple_type(&TypeDesc::Boolean, SimpleForm::OUT), "bool*");
    }

    #[test]
    fn test_simple_strings_respect_const() {
        assert_eq!(simple_type(&TypeDesc::WString, SimpleForm::IN), "const wchar_t*");
        assert_eq!(simple_type(&TypeDesc::WString, SimpleForm::VALUE), "wchar_t*");
        assert_eq!(simple_type(&TypeDesc::String, SimpleForm::OUT), "char**");
    }

    #[test]
    fn test_simple_interface_ignores_const() {
        assert_eq!(simple_type(&node(), SimpleForm::IN), "iface::dom::Node*");
        assert_eq!(simple_type(&node(), SimpleForm::OUT), "iface::dom::Node**");
    }

    #[test]
    fn test_simple_sequences() {
        assert_eq!(simple_type(&node_list(), SimpleForm::VALUE), "iface::dom::Node**");
        assert_eq!(simple_type(&node_list(), SimpleForm::IN), "iface::dom::Node* const*");
        let longs = TypeDesc::Sequence {
            name: ScopedName::parse("m::LongSeq"),
            element: Box::new(TypeDesc::Long),
        };
        assert_eq!(simple_type(&longs, SimpleForm::IN), "const int32_t*");
        assert_eq!(simple_type(&longs, SimpleForm::OUT), "int32_t**");
    }

    #[test]
    fn test_corba_var_types() {
        assert_eq!(corba_var_type(&TypeDesc::Short), "CORBA::Short");
        assert_eq!(corba_var_type(&TypeDesc::WString), "CORBA::WString_var");
        assert_eq!(corba_var_type(&node()), "::dom::Node_var");
        assert_eq!(corba_var_type(&node_list()), "::dom::NodeSeq_var");
        assert_eq!(
            corba_var_type(&TypeDesc::Enum(ScopedName::parse("dom::Kind"))),
            "::dom::Kind"
        );
        assert_eq!(corba_type(&node_list()), "::dom::NodeSeq");
    }

    #[test]
    fn test_destroy_requirements() {
        assert!(needs_destroy_local(&TypeDesc::String));
        assert!(!needs_destroy_local(&TypeDesc::Double));
        assert!(needs_destroy_foreign(&node_list()));
        assert!(!needs_destroy_foreign(&TypeDesc::WString));
    }
}
