//! Type conversion engine.
//!
//! Emits the statements that declare, convert and destroy values crossing
//! between the distributed-object representation (the "foreign" side) and
//! the simplified representation (the "local" side). Length-bearing types
//! are routed to the sequence forms and need the name of their paired
//! element count.

use crate::error::CodegenError;
use crate::output::Stream;
use ccigen_tree::mapping::needs_destroy_foreign;
use ccigen_tree::{ScopedName, SimpleForm, TypeDesc, corba_type, corba_var_type, simple_type};

/// Emits conversion statements for one generated method.
#[derive(Debug, Clone, Copy)]
pub struct Converter<'a> {
    root: &'a ScopedName,
}

impl<'a> Converter<'a> {
    /// Creates a converter; `root` is the universal root capability interface.
    #[must_use]
    pub fn new(root: &'a ScopedName) -> Self {
        Self { root }
    }

    /// Declares a foreign-representation local variable.
    pub fn declare_foreign(&self, out: &mut Stream, ty: &TypeDesc, name: &str) {
        out.write_line(&format!("{} {name};", corba_var_type(ty)));
    }

    /// Declares a local-representation variable.
    pub fn declare_local(&self, out: &mut Stream, ty: &TypeDesc, name: &str) {
        out.write_line(&format!("{} {name};", simple_type(ty, SimpleForm::VALUE)));
    }

    /// Converts a foreign value into the local representation.
    ///
    /// For sequences `length` names the local element count, which is
    /// assigned, and `allocate` requests a fresh destination buffer.
    ///
    /// # Errors
    /// Returns an error if `ty` is length-bearing and no length is given.
    pub fn foreign_to_local(
        &self,
        out: &mut Stream,
        ty: &TypeDesc,
        cname: &str,
        sname: &str,
        length: Option<&str>,
        allocate: bool,
    ) -> Result<(), CodegenError> {
        match ty {
            TypeDesc::Sequence { name, element } => {
                let length = require_length(name, length)?;
                if element.is_length_bearing() {
                    nested_sequence(out, name);
                    return Ok(());
                }
                out.write_line(&format!("{length} = {cname}->length();"));
                if allocate {
                    out.write_line(&format!(
                        "{sname} = new {}[{length}];",
                        simple_type(element, SimpleForm::VALUE)
                    ));
                }
                let var = out.next_loop_var();
                open_loop(out, &var, length);
                self.value_to_local(
                    out,
                    element,
                    &format!("{cname}[{var}]"),
                    &format!("{sname}[{var}]"),
                    true,
                );
                close_loop(out);
            }
            _ => self.value_to_local(out, ty, cname, sname, false),
        }
        Ok(())
    }

    /// Converts a local value into the foreign representation.
    ///
    /// # Errors
    /// Returns an error if `ty` is length-bearing and no length is given.
    pub fn local_to_foreign(
        &self,
        out: &mut Stream,
        ty: &TypeDesc,
        sname: &str,
        cname: &str,
        length: Option<&str>,
    ) -> Result<(), CodegenError> {
        match ty {
            TypeDesc::Sequence { name, element } => {
                let length = require_length(name, length)?;
                if element.is_length_bearing() {
                    nested_sequence(out, name);
                    return Ok(());
                }
                out.write_line(&format!("{cname} = new {}();", corba_type(ty)));
                out.write_line(&format!("{cname}->length({length});"));
                let var = out.next_loop_var();
                open_loop(out, &var, length);
                self.value_to_foreign(
                    out,
                    element,
                    &format!("{sname}[{var}]"),
                    &format!("{cname}[{var}]"),
                );
                close_loop(out);
            }
            _ => self.value_to_foreign(out, ty, sname, cname),
        }
        Ok(())
    }

    /// Releases what a local value owns.
    ///
    /// # Errors
    /// Returns an error if `ty` is length-bearing and no length is given.
    pub fn destroy_local(
        &self,
        out: &mut Stream,
        ty: &TypeDesc,
        sname: &str,
        length: Option<&str>,
    ) -> Result<(), CodegenError> {
        match ty {
            TypeDesc::Sequence { name, element } => {
                let length = require_length(name, length)?;
                if element.is_length_bearing() {
                    nested_sequence(out, name);
                    return Ok(());
                }
                if ccigen_tree::mapping::needs_destroy_local(element) {
                    let var = out.next_loop_var();
                    open_loop(out, &var, length);
                    destroy_local_value(out, element, &format!("{sname}[{var}]"));
                    close_loop(out);
                }
                out.write_line(&format!("delete [] {sname};"));
            }
            _ => destroy_local_value(out, ty, sname),
        }
        Ok(())
    }

    /// Releases the application-level references a foreign value holds.
    pub fn destroy_foreign(&self, out: &mut Stream, ty: &TypeDesc, cname: &str) {
        if !needs_destroy_foreign(ty) {
            return;
        }
        match ty {
            TypeDesc::Interface(_) => release_foreign(out, cname),
            TypeDesc::Sequence { element, .. } if element.is_interface() => {
                let var = out.next_loop_var();
                open_loop(out, &var, &format!("{cname}->length()"));
                release_foreign(out, &format!("{cname}[{var}]"));
                close_loop(out);
            }
            _ => {}
        }
    }

    fn value_to_local(
        &self,
        out: &mut Stream,
        ty: &TypeDesc,
        cname: &str,
        sname: &str,
        element: bool,
    ) {
        let held = if element {
            cname.to_string()
        } else {
            format!("{cname}.in()")
        };
        match ty {
            TypeDesc::String => out.write_line(&format!("{sname} = CDA_strdup({held});")),
            TypeDesc::WString => out.write_line(&format!("{sname} = CDA_wcsdup({held});")),
            TypeDesc::Enum(_) => out.write_line(&format!(
                "{sname} = static_cast<{}>({cname});",
                simple_type(ty, SimpleForm::VALUE)
            )),
            TypeDesc::Interface(name) => {
                out.write_line(&format!("if (CORBA::is_nil({cname}))"));
                out.indent();
                out.write_line(&format!("{sname} = NULL;"));
                out.dedent();
                out.write_line("else");
                out.indent();
                out.write_line(&format!(
                    "{sname} = static_cast<{}>(gWrapperRepository().NewCCI(\"{}\", {cname}, _getPOA()));",
                    simple_type(ty, SimpleForm::VALUE),
                    name.cxx()
                ));
                out.dedent();
            }
            _ => out.write_line(&format!("{sname} = {cname};")),
        }
    }

    fn value_to_foreign(&self, out: &mut Stream, ty: &TypeDesc, sname: &str, cname: &str) {
        match ty {
            TypeDesc::String => out.write_line(&format!("{cname} = CORBA::string_dup({sname});")),
            TypeDesc::WString => {
                out.write_line(&format!("{cname} = CORBA::wstring_dup({sname});"));
            }
            TypeDesc::Enum(name) => {
                out.write_line(&format!("{cname} = static_cast<::{}>({sname});", name.cxx()));
            }
            TypeDesc::Interface(name) => {
                let foreign = name.cxx();
                out.write_line(&format!("if ({sname} == NULL)"));
                out.indent();
                out.write_line(&format!("{cname} = ::{foreign}::_nil();"));
                out.dedent();
                out.write_line("else");
                out.write_line("{");
                out.indent();
                out.write_line(&format!(
                    "::{}_var _sci = gWrapperRepository().NewSCI(\"{foreign}\", {sname}, _getPOA());",
                    self.root.cxx()
                ));
                out.write_line(&format!("{cname} = ::{foreign}::_narrow(_sci);"));
                out.dedent();
                out.write_line("}");
            }
            _ => out.write_line(&format!("{cname} = {sname};")),
        }
    }
}

fn require_length<'l>(name: &ScopedName, length: Option<&'l str>) -> Result<&'l str, CodegenError> {
    length.ok_or_else(|| {
        CodegenError::generation(format!("sequence '{name}' converted without a length"))
    })
}

fn nested_sequence(out: &mut Stream, name: &ScopedName) {
    tracing::warn!(sequence = %name, "sequence of sequences cannot be converted");
    out.write_line(&format!(
        "#error sequence {} has a sequence element type, which cannot be converted",
        name.cxx()
    ));
}

fn open_loop(out: &mut Stream, var: &str, bound: &str) {
    out.write_line(&format!("for (uint32_t {var} = 0; {var} < {bound}; {var}++)"));
    out.write_line("{");
    out.indent();
}

fn close_loop(out: &mut Stream) {
    out.dedent();
    out.write_line("}");
}

fn destroy_local_value(out: &mut Stream, ty: &TypeDesc, sname: &str) {
    match ty {
        TypeDesc::String | TypeDesc::WString => out.write_line(&format!("free({sname});")),
        TypeDesc::Interface(_) => {
            out.write_line(&format!("if ({sname} != NULL)"));
            out.indent();
            out.write_line(&format!("{sname}->release_ref();"));
            out.dedent();
        }
        _ => {}
    }
}

fn release_foreign(out: &mut Stream, cname: &str) {
    out.write_line(&format!("if (!CORBA::is_nil({cname}))"));
    out.indent();
    out.write_line(&format!("{cname}->release_ref();"));
    out.dedent();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> ScopedName {
        ScopedName::parse("XPCOM::IObject")
    }

    fn node() -> TypeDesc {
        TypeDesc::Interface(ScopedName::parse("dom::Node"))
    }

    fn node_seq() -> TypeDesc {
        TypeDesc::Sequence {
            name: ScopedName::parse("dom::NodeSeq"),
            element: Box::new(node()),
        }
    }

    fn long_seq() -> TypeDesc {
        TypeDesc::Sequence {
            name: ScopedName::parse("m::LongSeq"),
            element: Box::new(TypeDesc::Long),
        }
    }

    #[test]
    fn test_declare_storage() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        conv.declare_foreign(&mut out, &TypeDesc::WString, "_corba_name");
        conv.declare_local(&mut out, &node_seq(), "_simple_return");
        assert_eq!(
            out.into_string(),
            "CORBA::WString_var _corba_name;\niface::dom::Node** _simple_return;\n"
        );
    }

    #[test]
    fn test_scalar_round_trip_text() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        conv.local_to_foreign(&mut out, &TypeDesc::Long, "x", "_corba_x", None)
            .unwrap();
        conv.foreign_to_local(&mut out, &TypeDesc::Long, "_corba_x", "(*x)", None, true)
            .unwrap();
        assert_eq!(out.into_string(), "_corba_x = x;\n(*x) = _corba_x;\n");
    }

    #[test]
    fn test_string_conversions() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        conv.local_to_foreign(&mut out, &TypeDesc::String, "s", "_corba_s", None)
            .unwrap();
        conv.foreign_to_local(&mut out, &TypeDesc::WString, "_corba_w", "w", None, false)
            .unwrap();
        let text = out.into_string();
        assert!(text.contains("_corba_s = CORBA::string_dup(s);"));
        assert!(text.contains("w = CDA_wcsdup(_corba_w.in());"));
    }

    #[test]
    fn test_interface_to_local_wraps() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        conv.foreign_to_local(&mut out, &node(), "_corba_return", "_simple_return", None, true)
            .unwrap();
        let text = out.into_string();
        assert!(text.contains("if (CORBA::is_nil(_corba_return))"));
        assert!(text.contains(
            "_simple_return = static_cast<iface::dom::Node*>(gWrapperRepository().NewCCI(\"dom::Node\", _corba_return, _getPOA()));"
        ));
    }

    #[test]
    fn test_interface_to_foreign_narrows() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        conv.local_to_foreign(&mut out, &node(), "n", "_corba_n", None)
            .unwrap();
        let text = out.into_string();
        assert!(text.contains("_corba_n = ::dom::Node::_nil();"));
        assert!(text.contains("::XPCOM::IObject_var _sci = gWrapperRepository().NewSCI(\"dom::Node\", n, _getPOA());"));
        assert!(text.contains("_corba_n = ::dom::Node::_narrow(_sci);"));
    }

    #[test]
    fn test_sequence_to_local_allocates() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        conv.foreign_to_local(
            &mut out,
            &long_seq(),
            "_corba_return",
            "_simple_return",
            Some("(*_length__return)"),
            true,
        )
        .unwrap();
        assert_eq!(
            out.into_string(),
            "(*_length__return) = _corba_return->length();\n\
             _simple_return = new int32_t[(*_length__return)];\n\
             for (uint32_t _ci0 = 0; _ci0 < (*_length__return); _ci0++)\n\
             {\n  _simple_return[_ci0] = _corba_return[_ci0];\n}\n"
        );
    }

    #[test]
    fn test_sequence_to_foreign() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        conv.local_to_foreign(&mut out, &long_seq(), "v", "_corba_v", Some("_length_v"))
            .unwrap();
        let text = out.into_string();
        assert!(text.starts_with("_corba_v = new ::m::LongSeq();\n_corba_v->length(_length_v);\n"));
        assert!(text.contains("_corba_v[_ci0] = v[_ci0];"));
    }

    #[test]
    fn test_sequence_requires_length() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        let err = conv
            .local_to_foreign(&mut out, &long_seq(), "v", "_corba_v", None)
            .unwrap_err();
        assert!(matches!(err, CodegenError::Generation { .. }));
    }

    #[test]
    fn test_loop_vars_are_distinct() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        conv.local_to_foreign(&mut out, &long_seq(), "a", "_corba_a", Some("_length_a"))
            .unwrap();
        conv.local_to_foreign(&mut out, &long_seq(), "b", "_corba_b", Some("_length_b"))
            .unwrap();
        let text = out.into_string();
        assert!(text.contains("_ci0"));
        assert!(text.contains("_ci1"));
    }

    #[test]
    fn test_destroy_local_sequence_of_interfaces() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        conv.destroy_local(&mut out, &node_seq(), "(*n)", Some("(*_length_n)"))
            .unwrap();
        let text = out.into_string();
        assert!(text.contains("if ((*n)[_ci0] != NULL)"));
        assert!(text.contains("(*n)[_ci0]->release_ref();"));
        assert!(text.ends_with("delete [] (*n);\n"));
    }

    #[test]
    fn test_destroy_local_plain_sequence() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        conv.destroy_local(&mut out, &long_seq(), "v", Some("n")).unwrap();
        assert_eq!(out.into_string(), "delete [] v;\n");
    }

    #[test]
    fn test_destroy_foreign() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        conv.destroy_foreign(&mut out, &TypeDesc::Double, "_corba_d");
        assert!(out.as_str().is_empty());
        conv.destroy_foreign(&mut out, &node(), "_corba_n");
        assert_eq!(
            out.as_str(),
            "if (!CORBA::is_nil(_corba_n))\n  _corba_n->release_ref();\n"
        );
    }

    #[test]
    fn test_destroy_foreign_skips_unowned_values() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        conv.destroy_foreign(&mut out, &TypeDesc::WString, "_corba_s");
        conv.destroy_foreign(&mut out, &long_seq(), "_corba_l");
        assert!(out.as_str().is_empty());
        assert_eq!(out.next_loop_var(), "_ci0");
    }

    #[test]
    fn test_nested_sequence_emits_error_directive() {
        let root = root();
        let conv = Converter::new(&root);
        let mut out = Stream::new(2);
        let nested = TypeDesc::Sequence {
            name: ScopedName::parse("m::Grid"),
            element: Box::new(long_seq()),
        };
        conv.local_to_foreign(&mut out, &nested, "g", "_corba_g", Some("_length_g"))
            .unwrap();
        assert!(out.as_str().starts_with("#error sequence m::Grid"));
    }
}
