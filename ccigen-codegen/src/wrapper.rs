//! Wrapper synthesis.
//!
//! Every interface yields, in order: the abstract wrapper, the concrete
//! `_final_` wrapper, the `_factory_` type, and the global factory instance
//! with its `prod` registration hook.

use crate::OutputMode;
use crate::bases;
use crate::config::GeneratorConfig;
use crate::error::CodegenError;
use crate::marshal::CallableEmitter;
use crate::naming;
use crate::output::Stream;
use crate::scope::ScopeManager;
use ccigen_tree::{NodeId, NodeKind, ScopedName, Tree};

/// Emits the generated types of one interface.
#[derive(Debug, Clone, Copy)]
pub struct WrapperEmitter<'a> {
    tree: &'a Tree,
    config: &'a GeneratorConfig,
    mode: OutputMode,
    guard: &'a str,
}

impl<'a> WrapperEmitter<'a> {
    /// Creates a wrapper emitter.
    #[must_use]
    pub fn new(tree: &'a Tree, config: &'a GeneratorConfig, mode: OutputMode, guard: &'a str) -> Self {
        Self {
            tree,
            config,
            mode,
            guard,
        }
    }

    fn pre(&self) -> String {
        naming::public_pre(self.guard)
    }

    fn post(&self) -> String {
        naming::public_post(self.guard)
    }

    /// Emits all four artifacts for `id`.
    ///
    /// # Errors
    /// Returns an error if `id` is not an interface or a callable cannot be
    /// generated.
    pub fn emit(&self, out: &mut Stream, scopes: &mut ScopeManager, id: NodeId) -> Result<(), CodegenError> {
        let node = self.tree.node(id);
        if node.as_interface().is_none() {
            return Err(CodegenError::UnknownInterface {
                name: node.scoped_name.cxx(),
            });
        }
        let name = &node.scoped_name;
        tracing::debug!(interface = %name, mode = ?self.mode, "synthesizing wrapper");

        match self.mode {
            OutputMode::Declaration => {
                self.declare_abstract(out, id)?;
                self.declare_final(out, id);
                self.declare_factory(out, name);
            }
            OutputMode::Definition => {
                self.define_abstract(out, id)?;
                self.define_final(out, id);
                self.define_factory(out, scopes, name);
            }
        }
        Ok(())
    }

    fn emit_callables(&self, out: &mut Stream, id: NodeId) -> Result<(), CodegenError> {
        let name = &self.tree.node(id).scoped_name;
        let emitter = CallableEmitter::new(self.config, self.mode, name);
        let Some(def) = self.tree.interface(id) else {
            return Ok(());
        };
        for &callable in &def.callables {
            let node = self.tree.node(callable);
            match &node.kind {
                NodeKind::Operation(op) => emitter.emit_operation(out, &node.name, op)?,
                NodeKind::Attribute(attr) => emitter.emit_attribute(out, attr)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn declare_abstract(&self, out: &mut Stream, id: NodeId) -> Result<(), CodegenError> {
        let node = self.tree.node(id);
        let name = &node.scoped_name;
        let exported = node.as_interface().is_some_and(|def| def.requires_export());

        if exported {
            out.write_line(&format!("{} ", self.pre()));
            out.write_line(&format!("class {} {}", self.post(), node.name));
        } else {
            out.write_line(&format!("class {}", node.name));
        }

        let mut heads = vec![format!(
            "{} {}",
            bases::simple_inheritance(self.tree, id).specifier(),
            naming::simple_scoped(name)
        )];
        for edge in bases::inheritance_edges(self.tree, id, self.config) {
            let base = &self.tree.node(edge.base).scoped_name;
            heads.push(format!(
                "{} {}",
                edge.inheritance.specifier(),
                self.config.wrapper_scoped(base)
            ));
        }
        out.write_line(&format!("  : {}", heads.join(", ")));
        out.write_line("{");

        if self.config.is_root(name) {
            self.declare_root_specials(out, &node.name);
        }
        out.write_line("public:");
        out.indent();
        out.write_line(&format!("virtual ~{}(){{}}", node.name));
        self.write_unwrap(out, name);
        self.emit_callables(out, id)?;
        out.dedent();
        out.write_line("};");
        Ok(())
    }

    /// The root wrapper holds the reference count and the hosting context.
    fn declare_root_specials(&self, out: &mut Stream, simple: &str) {
        out.write_line("public:");
        out.indent();
        out.write_line(&format!("{simple}();"));
        out.dedent();
        out.write_line("protected:");
        out.indent();
        out.write_line("::PortableServer::POA_ptr _getPOA();");
        out.write_line("void _setPOA(::PortableServer::POA_ptr aPOA);");
        out.dedent();
        out.write_line("private:");
        out.indent();
        out.write_line("::PortableServer::POA_var _poa;");
        out.write_line("uint32_t _refcount;");
        out.dedent();
    }

    fn define_root_specials(&self, out: &mut Stream, name: &ScopedName) {
        let class = self.config.wrapper_scoped(name);
        let simple = name.simple_name();
        out.write_line(&format!("{class}::{simple}() : _refcount(1) {{}};"));
        out.write_line(&format!("void {class}::_setPOA(::PortableServer::POA_ptr aPOA)"));
        out.write_line("{");
        out.indent();
        out.write_line("_poa = aPOA;");
        out.dedent();
        out.write_line("}");
        out.write_line(&format!("::PortableServer::POA_ptr {class}::_getPOA()"));
        out.write_line("{");
        out.indent();
        out.write_line("return _poa;");
        out.dedent();
        out.write_line("}");
    }

    fn write_unwrap(&self, out: &mut Stream, name: &ScopedName) {
        let foreign = name.cxx();
        let unwrap = naming::unwrap(name);
        let downcast = naming::downcast(name);
        match self.mode {
            OutputMode::Declaration => {
                out.write_line(&format!(
                    "{} ::{foreign}_ptr {unwrap}() {};",
                    self.pre(),
                    self.post()
                ));
                out.write_line(&format!("virtual ::{foreign}_ptr {downcast}() = 0;"));
            }
            OutputMode::Definition => {
                out.write_line(&format!(
                    "::{foreign}_ptr {}::{unwrap}()",
                    self.config.wrapper_scoped(name)
                ));
                out.write_line("{");
                out.indent();
                out.write_line(&format!("::{foreign}_ptr tmp = {downcast}();"));
                out.write_line("if (!CORBA::is_nil(tmp))");
                out.indent();
                out.write_line("tmp->add_ref();");
                out.dedent();
                out.write_line(&format!("return ::{foreign}::_duplicate(tmp);"));
                out.dedent();
                out.write_line("}");
            }
        }
    }

    fn define_abstract(&self, out: &mut Stream, id: NodeId) -> Result<(), CodegenError> {
        let name = &self.tree.node(id).scoped_name;
        if self.config.is_root(name) {
            self.define_root_specials(out, name);
        }
        self.write_unwrap(out, name);
        self.emit_callables(out, id)
    }

    fn declare_final(&self, out: &mut Stream, id: NodeId) {
        let node = self.tree.node(id);
        let foreign = node.scoped_name.cxx();
        let class = naming::final_class(&node.name);

        out.write_line(&format!("class {class}"));
        out.write_line(&format!("  : public {}", node.name));
        out.write_line("{");
        out.write_line("private:");
        out.indent();
        out.write_line(&format!("::{foreign}_var _objref;"));
        out.dedent();
        out.write_line("public:");
        out.indent();
        out.write_line(&format!(
            "{} {class}(::{foreign}_ptr _aobjref, ::PortableServer::POA_ptr aPp) {};",
            self.pre(),
            self.post()
        ));
        out.write_line(&format!("virtual ~{class}()"));
        out.write_line("{");
        out.indent();
        out.write_line("if (!CORBA::is_nil(_objref))");
        out.indent();
        out.write_line("_objref->release_ref();");
        out.dedent();
        out.dedent();
        out.write_line("}");
        self.write_downcasts(out, id);
        out.dedent();
        out.write_line("};");
    }

    fn define_final(&self, out: &mut Stream, id: NodeId) {
        let node = self.tree.node(id);
        let foreign = node.scoped_name.cxx();
        let class = naming::final_class(&node.name);
        let qualified = format!(
            "{}::{}",
            self.config.namespace,
            naming::sibling(&node.scoped_name, &class)
        );

        out.write_line(&format!(
            "{qualified}::{class}(::{foreign}_ptr _aobjref,::PortableServer::POA_ptr aPp)"
        ));
        out.write_line("{");
        out.indent();
        out.write_line(&format!("_objref = ::{foreign}::_duplicate(_aobjref);"));
        out.write_line("_objref->add_ref();");
        out.write_line("_setPOA(::PortableServer::POA::_duplicate(aPp));");
        out.dedent();
        out.write_line("}");
        self.write_downcasts(out, id);
    }

    /// One downcast per distinct interface in the closure, each answering
    /// with the single held reference.
    fn write_downcasts(&self, out: &mut Stream, id: NodeId) {
        let node = self.tree.node(id);
        let qualifier = match self.mode {
            OutputMode::Declaration => String::new(),
            OutputMode::Definition => format!(
                "{}::{}::",
                self.config.namespace,
                naming::sibling(&node.scoped_name, &naming::final_class(&node.name))
            ),
        };
        for base in bases::linearize(self.tree, id) {
            let base_name = &self.tree.node(base).scoped_name;
            let signature = format!(
                "::{}_ptr {qualifier}{}()",
                base_name.cxx(),
                naming::downcast(base_name)
            );
            match self.mode {
                OutputMode::Declaration => out.write_line(&format!("{signature};")),
                OutputMode::Definition => {
                    out.write_line(&signature);
                    out.write_line("{");
                    out.indent();
                    out.write_line("return _objref;");
                    out.dedent();
                    out.write_line("}");
                }
            }
        }
    }

    fn declare_factory(&self, out: &mut Stream, name: &ScopedName) {
        let simple = name.simple_name();
        let foreign = name.cxx();
        let factory = naming::factory_class(simple);
        let final_scoped = naming::sibling(name, &naming::final_class(simple));

        out.write_line(&format!("class {factory}"));
        out.write_line("  : public ::CCIFactory");
        out.write_line("{");
        out.write_line("public:");
        out.indent();
        out.write_line(&format!("{factory}();"));
        out.write_line(&format!("const char* Name() const {{ return \"{foreign}\"; }}"));
        out.write_line(&format!(
            "void* MakeCCI(::{}_ptr aObj, ::PortableServer::POA_ptr aPp) const",
            self.config.root_interface.cxx()
        ));
        out.write_line("{");
        out.indent();
        out.write_line(&format!("::{foreign}_var obj = ::{foreign}::_narrow(aObj);"));
        out.write_line("if (CORBA::is_nil(obj)) return NULL;");
        out.write_line(&format!(
            "return static_cast< {}* >(new ::{}::{final_scoped}(obj, aPp));",
            naming::simple_scoped(name),
            self.config.namespace
        ));
        out.dedent();
        out.write_line("}");
        out.dedent();
        out.write_line("};");
        out.write_line(&format!(
            "{} void {}() {};",
            self.pre(),
            naming::hook(simple),
            self.post()
        ));
    }

    /// The hook lives inside the interface's namespace so callers can name it
    /// next to the wrapper; everything else is written fully qualified.
    fn define_factory(&self, out: &mut Stream, scopes: &mut ScopeManager, name: &ScopedName) {
        let simple = name.simple_name();
        let factory = naming::factory_class(simple);
        let factory_scoped = format!(
            "::{}::{}",
            self.config.namespace,
            naming::sibling(name, &factory)
        );
        let instance = naming::factory_instance(name);

        out.write_line(&format!("{factory_scoped}::{factory}()"));
        out.write_line("{");
        out.indent();
        out.write_line("gWrapperRepository().RegisterCCIFactory(this);");
        out.dedent();
        out.write_line("}");
        out.write_line(&format!("{factory_scoped} {instance};"));
        scopes.materialize(out);
        out.write_line(&format!(
            "void {}() {{ {instance}.Name(); }}",
            naming::hook(simple)
        ));
        scopes.escape_all(out);
    }
}
