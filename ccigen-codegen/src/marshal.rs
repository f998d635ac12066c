//! Operation and attribute marshalling.
//!
//! Each callable of the active interface becomes one wrapper method (two for
//! a writable attribute). Declaration mode writes the terminated signature;
//! definition mode writes the qualified signature and a body that converts
//! arguments, calls through the interface's own downcast inside a guarded
//! region, converts results back and releases temporaries.

use crate::OutputMode;
use crate::config::GeneratorConfig;
use crate::convert::Converter;
use crate::error::CodegenError;
use crate::naming;
use crate::output::Stream;
use ccigen_tree::{AttributeDef, OperationDef, ParameterDef, ScopedName, SimpleForm, TypeDesc, simple_type};

const THROW_SPEC: &str = "throw(std::exception&)";

/// Emits the wrapper methods of one interface's callables.
#[derive(Debug, Clone, Copy)]
pub struct CallableEmitter<'a> {
    config: &'a GeneratorConfig,
    mode: OutputMode,
    active: &'a ScopedName,
}

impl<'a> CallableEmitter<'a> {
    /// Creates an emitter for the callables of `active`.
    #[must_use]
    pub fn new(config: &'a GeneratorConfig, mode: OutputMode, active: &'a ScopedName) -> Self {
        Self {
            config,
            mode,
            active,
        }
    }

    fn converter(&self) -> Converter<'a> {
        Converter::new(&self.config.root_interface)
    }

    fn qualifier(&self) -> String {
        match self.mode {
            OutputMode::Declaration => String::new(),
            OutputMode::Definition => format!("{}::", self.config.wrapper_scoped(self.active)),
        }
    }

    fn terminator(&self) -> &'static str {
        match self.mode {
            OutputMode::Declaration => ";",
            OutputMode::Definition => "",
        }
    }

    fn downcast_call(&self) -> String {
        format!("{}()", naming::downcast(self.active))
    }

    fn is_root(&self) -> bool {
        self.config.is_root(self.active)
    }

    /// Emits one operation.
    ///
    /// # Errors
    /// Returns an error if a conversion cannot be generated.
    pub fn emit_operation(
        &self,
        out: &mut Stream,
        name: &str,
        op: &OperationDef,
    ) -> Result<(), CodegenError> {
        let special = self.is_root() && matches!(name, "add_ref" | "release_ref" | "query_interface");
        let return_type = if special && name == "query_interface" {
            "void*".to_string()
        } else {
            simple_type(&op.return_type, SimpleForm::VALUE)
        };

        out.write_line(&format!(
            "{return_type} {}{name}({}) {THROW_SPEC}{}",
            self.qualifier(),
            parameter_list(op),
            self.terminator()
        ));
        if self.mode == OutputMode::Declaration {
            return Ok(());
        }

        out.reset_loop_vars();
        match name {
            "add_ref" if special => self.write_add_ref(out),
            "release_ref" if special => self.write_release_ref(out),
            "query_interface" if special => self.write_query_interface(out, op),
            _ => self.write_operation_body(out, name, op)?,
        }
        Ok(())
    }

    fn write_operation_body(
        &self,
        out: &mut Stream,
        name: &str,
        op: &OperationDef,
    ) -> Result<(), CodegenError> {
        let conv = self.converter();
        out.write_line("{");
        out.indent();

        let mut args = Vec::with_capacity(op.parameters.len());
        for p in &op.parameters {
            let cname = foreign_name(p);
            conv.declare_foreign(out, &p.ty, &cname);
            if p.direction.is_in() {
                let (sname, slength) = local_names(p);
                conv.local_to_foreign(out, &p.ty, &sname, &cname, slength.as_deref())?;
            }
            args.push(cname);
        }

        let returns = !op.return_type.is_void();
        let assign = if returns {
            conv.declare_foreign(out, &op.return_type, "_corba_return");
            "_corba_return = "
        } else {
            ""
        };

        out.write_line("try");
        out.write_line("{");
        out.indent();
        out.write_line(&format!(
            "{assign}{}->{name}({});",
            self.downcast_call(),
            args.join(",")
        ));

        for p in &op.parameters {
            let cname = foreign_name(p);
            if p.direction.is_out() {
                let sname = format!("(*{})", p.name);
                let slength = length_name(p).map(|l| format!("(*{l})"));
                if p.direction.is_in() {
                    conv.destroy_local(out, &p.ty, &sname, slength.as_deref())?;
                }
                conv.foreign_to_local(out, &p.ty, &cname, &sname, slength.as_deref(), true)?;
            }
            if p.direction.is_in() {
                conv.destroy_foreign(out, &p.ty, &cname);
            }
        }

        if returns {
            let rt = &op.return_type;
            conv.declare_local(out, rt, "_simple_return");
            let length = rt.is_length_bearing().then_some("(*_length__return)");
            conv.foreign_to_local(out, rt, "_corba_return", "_simple_return", length, true)?;
            conv.destroy_foreign(out, rt, "_corba_return");
            out.write_line("return _simple_return;");
        }

        out.dedent();
        out.write_line("}");
        write_catch(out, "e", "A CORBA exception occurred.");
        out.dedent();
        out.write_line("}");
        Ok(())
    }

    fn write_add_ref(&self, out: &mut Stream) {
        out.write_line("{");
        out.indent();
        out.write_line("_refcount++;");
        out.dedent();
        out.write_line("}");
    }

    /// Destruction errors are swallowed, so a failed teardown is never
    /// observable by the caller.
    fn write_release_ref(&self, out: &mut Stream) {
        out.write_line("{");
        out.indent();
        out.write_line("_refcount--;");
        out.write_line("if (_refcount == 0)");
        out.write_line("{");
        out.indent();
        out.write_line("try");
        out.write_line("{");
        out.indent();
        out.write_line("delete this;");
        out.dedent();
        out.write_line("}");
        out.write_line("catch (CORBA::Exception& e)");
        out.write_line("{");
        out.write_line("}");
        out.dedent();
        out.write_line("}");
        out.dedent();
        out.write_line("}");
    }

    /// A nil answer returns NULL without consulting the registry; otherwise
    /// the intermediate reference is released once the wrap was attempted.
    fn write_query_interface(&self, out: &mut Stream, op: &OperationDef) {
        let id = op
            .parameters
            .first()
            .map_or("id", |p| p.name.as_str());
        out.write_line("{");
        out.indent();
        out.write_line(&format!(
            "::{}_var cobj = {}->query_interface({id});",
            self.active.cxx(),
            self.downcast_call()
        ));
        out.write_line("if (CORBA::is_nil(cobj))");
        out.indent();
        out.write_line("return NULL;");
        out.dedent();
        out.write_line(&format!(
            "void* sobj = gWrapperRepository().NewCCI({id}, cobj, _getPOA());"
        ));
        out.write_line("cobj->release_ref();");
        out.write_line("return sobj;");
        out.dedent();
        out.write_line("}");
    }

    /// Emits the getter of every declarator, and the setter unless readonly.
    ///
    /// # Errors
    /// Returns an error if a conversion cannot be generated.
    pub fn emit_attribute(&self, out: &mut Stream, attr: &AttributeDef) -> Result<(), CodegenError> {
        let ty = &attr.ty;
        let value_type = simple_type(ty, SimpleForm::VALUE);
        let const_type = simple_type(ty, SimpleForm {
            extra_pointer: false,
            is_const: true,
        });
        let (getter_extra, setter_extra) = if ty.is_length_bearing() {
            ("uint32_t* _length_attr", ", uint32_t _length_attr")
        } else {
            ("", "")
        };

        for name in &attr.declarators {
            out.write_line(&format!(
                "{value_type} {}{name}({getter_extra}) {THROW_SPEC}{}",
                self.qualifier(),
                self.terminator()
            ));
            if self.mode == OutputMode::Definition {
                self.write_getter_body(out, name, ty)?;
            }

            if attr.readonly {
                continue;
            }
            out.write_line(&format!(
                "void {}{name}({const_type} attr{setter_extra}) {THROW_SPEC}{}",
                self.qualifier(),
                self.terminator()
            ));
            if self.mode == OutputMode::Definition {
                self.write_setter_body(out, name, ty)?;
            }
        }
        Ok(())
    }

    fn write_getter_body(&self, out: &mut Stream, name: &str, ty: &TypeDesc) -> Result<(), CodegenError> {
        let conv = self.converter();
        out.reset_loop_vars();
        out.write_line("{");
        out.indent();
        out.write_line("try");
        out.write_line("{");
        out.indent();
        conv.declare_foreign(out, ty, "_corba_value");
        out.write_line(&format!("_corba_value = {}->{name}();", self.downcast_call()));
        conv.declare_local(out, ty, "_simple_value");
        let length = ty.is_length_bearing().then_some("(*_length_attr)");
        conv.foreign_to_local(out, ty, "_corba_value", "_simple_value", length, true)?;
        conv.destroy_foreign(out, ty, "_corba_value");
        out.write_line("return _simple_value;");
        out.dedent();
        out.write_line("}");
        write_catch(out, "cce", "A CORBA error occurred");
        out.dedent();
        out.write_line("}");
        Ok(())
    }

    fn write_setter_body(&self, out: &mut Stream, name: &str, ty: &TypeDesc) -> Result<(), CodegenError> {
        let conv = self.converter();
        out.reset_loop_vars();
        out.write_line("{");
        out.indent();
        out.write_line("try");
        out.write_line("{");
        out.indent();
        conv.declare_foreign(out, ty, "_corba_value");
        let length = ty.is_length_bearing().then_some("_length_attr");
        conv.local_to_foreign(out, ty, "attr", "_corba_value", length)?;
        out.write_line(&format!("{}->{name}(_corba_value);", self.downcast_call()));
        conv.destroy_foreign(out, ty, "_corba_value");
        out.dedent();
        out.write_line("}");
        write_catch(out, "cce", "A CORBA error occurred");
        out.dedent();
        out.write_line("}");
        Ok(())
    }
}

/// Emits a handler translating any foreign exception into the single local
/// exception kind. The caught exception is discarded; `message` survives
/// only as a comment, since the local kind carries no payload.
fn write_catch(out: &mut Stream, var: &str, message: &str) {
    out.write_line(&format!("catch (CORBA::Exception& {var})"));
    out.write_line("{");
    out.indent();
    out.write_line(&format!("throw std::exception(/*\"{message}\"*/);"));
    out.dedent();
    out.write_line("}");
}

fn foreign_name(p: &ParameterDef) -> String {
    format!("_corba_{}", p.name)
}

fn length_name(p: &ParameterDef) -> Option<String> {
    p.ty.is_length_bearing().then(|| format!("_length_{}", p.name))
}

/// Local value and length expressions of an incoming argument.
fn local_names(p: &ParameterDef) -> (String, Option<String>) {
    let length = length_name(p);
    if p.direction.is_out() {
        (
            format!("(*{})", p.name),
            length.map(|l| format!("(*{l})")),
        )
    } else {
        (p.name.clone(), length)
    }
}

/// Builds the wrapper parameter list of an operation.
#[must_use]
pub fn parameter_list(op: &OperationDef) -> String {
    let mut parts = Vec::with_capacity(op.parameters.len() + 1);
    for p in &op.parameters {
        let out = p.direction.is_out();
        let mut text = String::new();
        if p.ty.is_length_bearing() {
            text.push_str(&format!(
                "uint32_t{} _length_{}, ",
                if out { "*" } else { "" },
                p.name
            ));
        }
        let form = if out { SimpleForm::OUT } else { SimpleForm::IN };
        text.push_str(&format!("{} {}", simple_type(&p.ty, form), p.name));
        parts.push(text);
    }
    if op.return_type.is_length_bearing() {
        parts.push("uint32_t* _length__return".to_string());
    }
    parts.join(", ")
}
