//! Tree walker.
//!
//! One [`Walker`] performs one complete pass over the tree in a fixed output
//! mode. Local declarations are visited depth-first in declaration order;
//! each externally defined declaration turns into an include directive in
//! declaration mode and is skipped in definition mode. Namespace blocks are
//! opened only right before an interface is written.

use crate::OutputMode;
use crate::config::GeneratorConfig;
use crate::error::CodegenError;
use crate::naming;
use crate::output::Stream;
use crate::scope::{IncludeSet, ScopeManager};
use crate::wrapper::WrapperEmitter;
use ccigen_tree::{NodeId, NodeKind, Tree};

/// Single-pass generation context.
pub struct Walker<'a> {
    tree: &'a Tree,
    config: &'a GeneratorConfig,
    mode: OutputMode,
    guard: String,
    out: Stream,
    scopes: ScopeManager,
    includes: IncludeSet,
}

impl<'a> Walker<'a> {
    /// Creates a fresh context for one pass.
    #[must_use]
    pub fn new(tree: &'a Tree, config: &'a GeneratorConfig, mode: OutputMode) -> Self {
        Self {
            tree,
            config,
            mode,
            guard: naming::guard(&tree.filebase),
            out: Stream::new(config.indent_width),
            scopes: ScopeManager::new(&config.namespace),
            includes: IncludeSet::new(),
        }
    }

    /// Runs the pass and returns the generated file.
    ///
    /// # Errors
    /// Returns an error if a declaration cannot be generated.
    pub fn run(mut self) -> Result<String, CodegenError> {
        tracing::debug!(file = %self.tree.file, mode = ?self.mode, "generation pass started");
        self.write_preamble();

        let tree = self.tree;
        for &id in &tree.declarations {
            if self.is_local(id) {
                self.visit(id)?;
            } else if self.mode == OutputMode::Declaration {
                self.consider_including(id);
            }
        }

        if self.mode == OutputMode::Declaration {
            self.scopes.escape_all(&mut self.out);
            self.write_epilogue();
        }

        tracing::debug!(
            mode = ?self.mode,
            opened = self.scopes.opened(),
            closed = self.scopes.closed(),
            includes = self.includes.len(),
            "generation pass finished"
        );
        Ok(self.out.into_string())
    }

    fn is_local(&self, id: NodeId) -> bool {
        self.tree.node(id).file == self.tree.file
    }

    fn visit(&mut self, id: NodeId) -> Result<(), CodegenError> {
        let tree = self.tree;
        let node = tree.node(id);
        match &node.kind {
            NodeKind::Module { definitions } => {
                self.scopes.enter(&node.name);
                for &child in definitions {
                    if self.is_local(child) {
                        self.visit(child)?;
                    } else if self.mode == OutputMode::Declaration {
                        self.consider_including(child);
                    }
                }
                self.scopes.leave(&mut self.out);
            }
            NodeKind::Interface(_) => {
                if self.mode == OutputMode::Declaration {
                    self.scopes.materialize(&mut self.out);
                }
                let emitter = WrapperEmitter::new(tree, self.config, self.mode, &self.guard);
                emitter.emit(&mut self.out, &mut self.scopes, id)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Includes must sit outside every namespace block.
    fn consider_including(&mut self, id: NodeId) {
        let tree = self.tree;
        let file = &tree.node(id).file;
        if !self.includes.first_time(file) {
            return;
        }
        tracing::debug!(file = %file, "including declarations of external file");
        self.scopes.escape_all(&mut self.out);
        self.out.write_line(&format!(
            "#include \"{}\"",
            naming::include_for(&self.config.header_prefix, file)
        ));
    }

    fn write_preamble(&mut self) {
        let tree = self.tree;
        let guard = self.guard.clone();
        let prefix = &self.config.header_prefix;
        let out = &mut self.out;

        out.write_line(&format!(
            "/* This file is automatically generated from {}\n * DO NOT EDIT DIRECTLY OR CHANGES WILL BE LOST!\n */",
            tree.filename
        ));
        match self.mode {
            OutputMode::Definition => {
                out.blank();
                for include in [
                    "<omniORB4/CORBA.h>",
                    "\"cda_compiler_support.h\"",
                    "<strings.h>",
                    "<wchar.h>",
                    "<exception>",
                    "\"corba_support/WrapperRepository.hxx\"",
                ] {
                    out.write_line(&format!("#include {include}"));
                }
                out.blank();
                out.write_line(&format!("#ifndef MODULE_CONTAINS_{guard}"));
                out.write_line(&format!("#define MODULE_CONTAINS_{guard}"));
                out.write_line("#endif");
                out.write_line(&format!(
                    "#include \"{}\"",
                    naming::header_file(prefix, &tree.filebase)
                ));
                out.write_line(&format!("#include \"SCI{}.hxx\"", tree.filebase));
            }
            OutputMode::Declaration => {
                out.write_line("#include \"cda_compiler_support.h\"");
                out.write_line(&format!("#ifndef _{prefix}{guard}_hxx"));
                out.write_line(&format!("#define _{prefix}{guard}_hxx"));
                out.blank();
                out.write_line(&format!("#include \"Iface{}.hxx\"", tree.filebase));
                out.write_line(&format!("#include \"{}.hh\"", tree.filebase));
                out.write_line(&format!("#ifdef MODULE_CONTAINS_{guard}"));
                out.write_line(&format!("#define PUBLIC_{guard}_PRE CDA_EXPORT_PRE"));
                out.write_line(&format!("#define PUBLIC_{guard}_POST CDA_EXPORT_POST"));
                out.write_line("#else");
                out.write_line(&format!("#define PUBLIC_{guard}_PRE CDA_IMPORT_PRE"));
                out.write_line(&format!("#define PUBLIC_{guard}_POST CDA_IMPORT_POST"));
                out.write_line("#endif");
            }
        }
    }

    fn write_epilogue(&mut self) {
        let guard = &self.guard;
        let prefix = &self.config.header_prefix;
        self.out.write_line(&format!("#undef PUBLIC_{guard}_PRE"));
        self.out.write_line(&format!("#undef PUBLIC_{guard}_POST"));
        self.out.write_line(&format!("#endif // _{prefix}{guard}_hxx"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccigen_tree::{TreeBuilder, TypeDesc};

    /// `dom` is opened once in `events.idl` and reopened in the main file,
    /// where it mixes local and external declarations.
    fn mixed_tree() -> Tree {
        let mut b = TreeBuilder::new("dom.idl");
        b.set_file("xpcom.idl");
        let xpcom = b.add_module(None, "XPCOM");
        let root = b.add_interface(Some(xpcom), "IObject");
        b.set_file("events.idl");
        let events = b.add_module(None, "dom");
        b.add_interface(Some(events), "EventTarget");
        b.set_file("dom.idl");
        let dom = b.add_module(None, "dom");
        let node = b.add_interface(Some(dom), "Node");
        b.add_base(node, root);
        b.add_attribute(node, &["nodeType"], TypeDesc::UShort, true);
        b.set_file("events.idl");
        b.add_interface(Some(dom), "Event");
        b.build()
    }

    #[test]
    fn test_header_preamble_and_epilogue() {
        let tree = mixed_tree();
        let config = GeneratorConfig::default();
        let text = Walker::new(&tree, &config, OutputMode::Declaration).run().unwrap();
        assert!(text.starts_with("/* This file is automatically generated from dom.idl\n"));
        assert!(text.contains("#ifndef _CCIdom_hxx\n#define _CCIdom_hxx\n"));
        assert!(text.contains("#include \"Ifacedom.hxx\"\n#include \"dom.hh\"\n"));
        assert!(text.contains("#define PUBLIC_dom_PRE CDA_EXPORT_PRE\n"));
        assert!(text.ends_with("#undef PUBLIC_dom_PRE\n#undef PUBLIC_dom_POST\n#endif // _CCIdom_hxx\n"));
    }

    #[test]
    fn test_includes_once_outside_namespaces() {
        let tree = mixed_tree();
        let config = GeneratorConfig::default();
        let text = Walker::new(&tree, &config, OutputMode::Declaration).run().unwrap();
        assert_eq!(text.matches("#include \"CCIxpcom.hxx\"").count(), 1);
        assert_eq!(text.matches("#include \"CCIevents.hxx\"").count(), 1);
        for line in text.lines().filter(|l| l.contains("#include \"CCI")) {
            assert!(!line.starts_with(' '), "indented include: {line}");
        }
    }

    #[test]
    fn test_header_scopes_balance() {
        let tree = mixed_tree();
        let config = GeneratorConfig::default();
        let text = Walker::new(&tree, &config, OutputMode::Declaration).run().unwrap();
        let opened = text.matches("namespace ").count();
        assert_eq!(opened, 2);
        assert!(!text.contains("namespace XPCOM"));
        let node = text.find("class Node").unwrap();
        let events = text.find("#include \"CCIevents.hxx\"").unwrap();
        assert!(events < node);
    }

    #[test]
    fn test_no_block_for_external_only_scope() {
        let mut b = TreeBuilder::new("main.idl");
        let m = b.add_module(None, "m");
        b.set_file("other.idl");
        b.add_interface(Some(m), "Elsewhere");
        let tree = b.build();
        let config = GeneratorConfig::default();
        let text = Walker::new(&tree, &config, OutputMode::Declaration).run().unwrap();
        assert!(!text.contains("namespace"));
        assert!(text.contains("#include \"CCIother.hxx\"\n"));
    }

    #[test]
    fn test_source_skips_external_declarations() {
        let tree = mixed_tree();
        let config = GeneratorConfig::default();
        let text = Walker::new(&tree, &config, OutputMode::Definition).run().unwrap();
        assert!(text.contains("#include <omniORB4/CORBA.h>\n"));
        assert!(text.contains("#ifndef MODULE_CONTAINS_dom\n#define MODULE_CONTAINS_dom\n#endif\n"));
        assert!(text.contains("#include \"CCIdom.hxx\"\n#include \"SCIdom.hxx\"\n"));
        assert!(!text.contains("CCIxpcom.hxx"));
        assert!(!text.contains("EventTarget"));
        assert!(text.contains("uint16_t CCI::dom::Node::nodeType() throw(std::exception&)"));
    }

    #[test]
    fn test_top_level_interface_enters_namespace() {
        let mut b = TreeBuilder::new("top.idl");
        b.add_interface(None, "Top");
        let tree = b.build();
        let config = GeneratorConfig::default();
        let text = Walker::new(&tree, &config, OutputMode::Declaration).run().unwrap();
        let ns = text.find("namespace CCI\n{\n").unwrap();
        let class = text.find("  class Top\n").unwrap();
        assert!(ns < class);
    }

    #[test]
    fn test_custom_namespace_and_indent() {
        let mut b = TreeBuilder::new("x.idl");
        let m = b.add_module(None, "m");
        b.add_interface(Some(m), "I");
        let tree = b.build();
        let config = GeneratorConfig::new().namespace("Adapt").indent_width(4);
        let text = Walker::new(&tree, &config, OutputMode::Declaration).run().unwrap();
        assert!(text.contains("namespace Adapt\n{\n    namespace m\n    {\n        class I\n"));
    }
}
