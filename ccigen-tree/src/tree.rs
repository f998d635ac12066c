//! The interface-definition tree.
//!
//! Nodes live in an arena owned by [`Tree`] and refer to each other through
//! [`NodeId`]s. Children, bases and alias targets are all ids, so the base
//! graph can be a diamond without any shared ownership. The tree is built
//! once by [`TreeBuilder`] and never mutated afterwards.

use crate::pragma::Pragma;
use crate::types::{ScopedName, TypeDesc};
use std::collections::HashMap;

/// Index of a node in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A declaration in the tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Simple name.
    pub name: String,
    /// Fully scoped name.
    pub scoped_name: ScopedName,
    /// Identifier of the file that defines this declaration.
    pub file: String,
    /// Kind-specific data.
    pub kind: NodeKind,
}

impl Node {
    /// Returns the interface data if this node is an interface.
    #[must_use]
    pub fn as_interface(&self) -> Option<&InterfaceDef> {
        match &self.kind {
            NodeKind::Interface(def) => Some(def),
            _ => None,
        }
    }
}

/// Node kind.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A module and its definitions in declaration order.
    Module {
        /// Contained definitions.
        definitions: Vec<NodeId>,
    },
    /// A full interface definition.
    Interface(InterfaceDef),
    /// A forward declaration of an interface.
    Forward {
        /// The full definition, when the tree contains it.
        target: Option<NodeId>,
    },
    /// A typedef and the declarators it introduces.
    Typedef {
        /// The aliased type.
        aliased: TypeDesc,
        /// Declarator nodes.
        declarators: Vec<NodeId>,
    },
    /// A single typedef declarator.
    Declarator {
        /// The declaration this name aliases, when it aliases one.
        alias: Option<NodeId>,
    },
    /// An enumeration.
    Enum {
        /// Enumerator names.
        enumerators: Vec<String>,
    },
    /// An operation of an interface.
    Operation(OperationDef),
    /// An attribute of an interface.
    Attribute(AttributeDef),
}

/// Interface data.
#[derive(Debug, Clone, Default)]
pub struct InterfaceDef {
    /// Direct bases in declaration order. Entries may be aliases or forwards.
    pub bases: Vec<NodeId>,
    /// Operations and attributes in declaration order.
    pub callables: Vec<NodeId>,
    /// Nested declarations (typedefs, enums).
    pub contents: Vec<NodeId>,
    /// Decoded pragmas.
    pub pragmas: Vec<Pragma>,
}

impl InterfaceDef {
    /// Returns true if the interface carries `pragma`.
    #[must_use]
    pub fn has_pragma(&self, pragma: &Pragma) -> bool {
        self.pragmas.contains(pragma)
    }

    /// Returns true if the interface is marked `terminal-interface`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.has_pragma(&Pragma::TerminalInterface)
    }

    /// Returns true if the interface must be exported from its module.
    #[must_use]
    pub fn requires_export(&self) -> bool {
        self.pragmas.iter().any(Pragma::requires_export)
    }

    /// Returns true if an `ambiguous-inheritance` pragma names `base`.
    #[must_use]
    pub fn marks_ambiguous(&self, base: &ScopedName) -> bool {
        self.pragmas.iter().any(|p| p.names_ambiguous_base(base))
    }
}

/// Parameter passing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Caller to callee.
    In,
    /// Callee to caller.
    Out,
    /// Both ways.
    InOut,
}

impl Direction {
    /// Parses `in`, `out` or `inout`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            "inout" => Some(Self::InOut),
            _ => None,
        }
    }

    /// Returns true for `in` and `inout`.
    #[must_use]
    pub const fn is_in(self) -> bool {
        matches!(self, Self::In | Self::InOut)
    }

    /// Returns true for `out` and `inout`.
    #[must_use]
    pub const fn is_out(self) -> bool {
        matches!(self, Self::Out | Self::InOut)
    }
}

/// A parameter of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDef {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub ty: TypeDesc,
    /// Passing direction.
    pub direction: Direction,
}

impl ParameterDef {
    /// Creates a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeDesc, direction: Direction) -> Self {
        Self {
            name: name.into(),
            ty,
            direction,
        }
    }
}

/// Operation data.
#[derive(Debug, Clone)]
pub struct OperationDef {
    /// Return type.
    pub return_type: TypeDesc,
    /// Parameters in declaration order.
    pub parameters: Vec<ParameterDef>,
}

/// Attribute data.
#[derive(Debug, Clone)]
pub struct AttributeDef {
    /// Attribute type.
    pub ty: TypeDesc,
    /// Whether the attribute has no setter.
    pub readonly: bool,
    /// Declarator names sharing the type.
    pub declarators: Vec<String>,
}

/// A complete, resolved interface-definition tree for one input file.
#[derive(Debug, Clone)]
pub struct Tree {
    /// Identifier of the main file.
    pub file: String,
    /// File name as given to the front end.
    pub filename: String,
    /// Main file name without directory and extension.
    pub filebase: String,
    /// Top-level declarations in order.
    pub declarations: Vec<NodeId>,
    nodes: Vec<Node>,
    names: HashMap<ScopedName, NodeId>,
}

impl Tree {
    /// Returns the node for `id`.
    ///
    /// # Panics
    /// Panics if `id` belongs to a different tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns the node for `id`, if it exists.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Returns the interface data for `id` if it is an interface.
    #[must_use]
    pub fn interface(&self, id: NodeId) -> Option<&InterfaceDef> {
        self.get(id).and_then(Node::as_interface)
    }

    /// Looks up a declaration by scoped name. Interfaces shadow their forwards.
    #[must_use]
    pub fn find(&self, name: &ScopedName) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Follows alias and forward indirection to the interface definition.
    ///
    /// Returns `None` if the chain ends anywhere other than an interface.
    #[must_use]
    pub fn resolve_interface(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        // A chain longer than the arena must loop.
        for _ in 0..=self.nodes.len() {
            match &self.get(current)?.kind {
                NodeKind::Interface(_) => return Some(current),
                NodeKind::Declarator { alias } | NodeKind::Forward { target: alias } => {
                    current = (*alias)?;
                }
                _ => return None,
            }
        }
        None
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all nodes with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }
}

/// Strips directory and extension from a file name.
#[must_use]
pub fn file_base(file: &str) -> String {
    let name = file.rsplit(['/', '\\']).next().unwrap_or(file);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[..dot].to_string(),
        _ => name.to_string(),
    }
}

/// Builds a [`Tree`].
///
/// New nodes are attributed to the current file, which starts as the main
/// file and can be switched with [`TreeBuilder::set_file`] to model
/// declarations that arrive through includes.
#[derive(Debug)]
pub struct TreeBuilder {
    file: String,
    current_file: String,
    filename: String,
    nodes: Vec<Node>,
    declarations: Vec<NodeId>,
    names: HashMap<ScopedName, NodeId>,
}

impl TreeBuilder {
    /// Creates a builder for the given main file.
    #[must_use]
    pub fn new(file: impl Into<String>) -> Self {
        let file = file.into();
        Self {
            current_file: file.clone(),
            filename: file.clone(),
            file,
            nodes: Vec::new(),
            declarations: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Sets the file name recorded in the generated banner.
    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }

    /// Attributes subsequently added nodes to `file`.
    pub fn set_file(&mut self, file: impl Into<String>) {
        self.current_file = file.into();
    }

    /// Returns the file new nodes are attributed to.
    #[must_use]
    pub fn current_file(&self) -> &str {
        &self.current_file
    }

    /// Returns a node added earlier.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Looks up a declaration added earlier.
    #[must_use]
    pub fn find(&self, name: &ScopedName) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Adds a module.
    pub fn add_module(&mut self, parent: Option<NodeId>, name: &str) -> NodeId {
        self.push(parent, name, NodeKind::Module {
            definitions: Vec::new(),
        })
    }

    /// Adds an interface definition.
    pub fn add_interface(&mut self, parent: Option<NodeId>, name: &str) -> NodeId {
        let id = self.push(parent, name, NodeKind::Interface(InterfaceDef::default()));
        let scoped = self.nodes[id.0].scoped_name.clone();
        for node in &mut self.nodes {
            if node.scoped_name != scoped {
                continue;
            }
            if let NodeKind::Forward { target: target @ None } = &mut node.kind {
                *target = Some(id);
            }
        }
        id
    }

    /// Adds a forward declaration.
    pub fn add_forward(&mut self, parent: Option<NodeId>, name: &str) -> NodeId {
        let id = self.push(parent, name, NodeKind::Forward { target: None });
        let target = self
            .find(&self.nodes[id.0].scoped_name)
            .filter(|t| matches!(self.nodes[t.0].kind, NodeKind::Interface(_)));
        self.nodes[id.0].kind = NodeKind::Forward { target };
        id
    }

    /// Adds a single-declarator typedef and returns the declarator.
    pub fn add_typedef(&mut self, parent: Option<NodeId>, name: &str, aliased: TypeDesc) -> NodeId {
        let alias = match &aliased {
            TypeDesc::Interface(target) => self.find(target),
            _ => None,
        };
        let typedef = self.attach(
            parent,
            name,
            NodeKind::Typedef {
                aliased,
                declarators: Vec::new(),
            },
            true,
        );
        let declarator = self.attach(parent, name, NodeKind::Declarator { alias }, false);
        self.index(declarator);
        if let NodeKind::Typedef { declarators, .. } = &mut self.nodes[typedef.0].kind {
            declarators.push(declarator);
        }
        declarator
    }

    /// Points a declarator at the declaration it aliases.
    pub fn set_alias(&mut self, declarator: NodeId, target: NodeId) {
        if let NodeKind::Declarator { alias } = &mut self.nodes[declarator.0].kind {
            *alias = Some(target);
        }
    }

    /// Replaces the aliased type of the typedef owning `declarator`.
    pub fn set_aliased_type(&mut self, declarator: NodeId, ty: TypeDesc) {
        for node in &mut self.nodes {
            if let NodeKind::Typedef {
                aliased,
                declarators,
            } = &mut node.kind
            {
                if declarators.contains(&declarator) {
                    *aliased = ty;
                    return;
                }
            }
        }
    }

    /// Adds an enumeration.
    pub fn add_enum(&mut self, parent: Option<NodeId>, name: &str, enumerators: Vec<String>) -> NodeId {
        self.push(parent, name, NodeKind::Enum { enumerators })
    }

    /// Appends a direct base to an interface.
    pub fn add_base(&mut self, interface: NodeId, base: NodeId) {
        if let NodeKind::Interface(def) = &mut self.nodes[interface.0].kind {
            def.bases.push(base);
        }
    }

    /// Attaches a pragma to an interface.
    pub fn add_pragma(&mut self, interface: NodeId, pragma: Pragma) {
        if let NodeKind::Interface(def) = &mut self.nodes[interface.0].kind {
            def.pragmas.push(pragma);
        }
    }

    /// Adds an operation to an interface.
    pub fn add_operation(
        &mut self,
        interface: NodeId,
        name: &str,
        return_type: TypeDesc,
        parameters: Vec<ParameterDef>,
    ) -> NodeId {
        self.push(
            Some(interface),
            name,
            NodeKind::Operation(OperationDef {
                return_type,
                parameters,
            }),
        )
    }

    /// Replaces the signature types of an operation.
    pub fn set_operation(&mut self, operation: NodeId, def: OperationDef) {
        if let NodeKind::Operation(op) = &mut self.nodes[operation.0].kind {
            *op = def;
        }
    }

    /// Adds an attribute to an interface.
    pub fn add_attribute(
        &mut self,
        interface: NodeId,
        declarators: &[&str],
        ty: TypeDesc,
        readonly: bool,
    ) -> NodeId {
        let name = declarators.first().copied().unwrap_or_default();
        self.push(
            Some(interface),
            name,
            NodeKind::Attribute(AttributeDef {
                ty,
                readonly,
                declarators: declarators.iter().map(|d| (*d).to_string()).collect(),
            }),
        )
    }

    /// Replaces the type of an attribute.
    pub fn set_attribute_type(&mut self, attribute: NodeId, ty: TypeDesc) {
        if let NodeKind::Attribute(def) = &mut self.nodes[attribute.0].kind {
            def.ty = ty;
        }
    }

    /// Finishes the tree.
    #[must_use]
    pub fn build(self) -> Tree {
        Tree {
            filebase: file_base(&self.file),
            file: self.file,
            filename: self.filename,
            declarations: self.declarations,
            nodes: self.nodes,
            names: self.names,
        }
    }

    fn push(&mut self, parent: Option<NodeId>, name: &str, kind: NodeKind) -> NodeId {
        let id = self.attach(parent, name, kind, true);
        self.index(id)
    }

    fn index(&mut self, id: NodeId) -> NodeId {
        let node = &self.nodes[id.0];
        let indexed = matches!(
            node.kind,
            NodeKind::Interface(_)
                | NodeKind::Forward { .. }
                | NodeKind::Declarator { .. }
                | NodeKind::Enum { .. }
        );
        if !indexed {
            return id;
        }
        let shadows = matches!(node.kind, NodeKind::Interface(_));
        if shadows || !self.names.contains_key(&node.scoped_name) {
            self.names.insert(node.scoped_name.clone(), id);
        }
        id
    }

    fn attach(&mut self, parent: Option<NodeId>, name: &str, kind: NodeKind, listed: bool) -> NodeId {
        let scoped_name = match parent {
            Some(p) => self.nodes[p.0].scoped_name.child(name),
            None => ScopedName::new(vec![name.to_string()]),
        };
        let is_callable = matches!(kind, NodeKind::Operation(_) | NodeKind::Attribute(_));
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            scoped_name,
            file: self.current_file.clone(),
            kind,
        });
        if !listed {
            return id;
        }

        match parent.map(|p| &mut self.nodes[p.0].kind) {
            None => self.declarations.push(id),
            Some(NodeKind::Module { definitions }) => definitions.push(id),
            Some(NodeKind::Interface(def)) if is_callable => def.callables.push(id),
            Some(NodeKind::Interface(def)) => def.contents.push(id),
            Some(_) => {}
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> (Tree, [NodeId; 4]) {
        let mut b = TreeBuilder::new("idl/diamond.idl");
        let m = b.add_module(None, "m");
        let root = b.add_interface(Some(m), "Root");
        let a = b.add_interface(Some(m), "A");
        b.add_base(a, root);
        let bb = b.add_interface(Some(m), "B");
        b.add_base(bb, root);
        let c = b.add_interface(Some(m), "C");
        b.add_base(c, a);
        b.add_base(c, bb);
        (b.build(), [root, a, bb, c])
    }

    #[test]
    fn test_builder_scoped_names() {
        let (tree, [root, _, _, c]) = diamond();
        assert_eq!(tree.node(root).scoped_name.cxx(), "m::Root");
        assert_eq!(tree.node(c).name, "C");
        assert_eq!(tree.filebase, "diamond");
        assert_eq!(tree.declarations.len(), 1);
    }

    #[test]
    fn test_builder_links_bases() {
        let (tree, [root, a, b, c]) = diamond();
        assert_eq!(tree.interface(c).unwrap().bases, vec![a, b]);
        assert_eq!(tree.interface(a).unwrap().bases, vec![root]);
        assert_eq!(tree.find(&ScopedName::parse("m::B")), Some(b));
    }

    #[test]
    fn test_resolve_through_alias_and_forward() {
        let mut b = TreeBuilder::new("x.idl");
        let m = b.add_module(None, "m");
        let fwd = b.add_forward(Some(m), "Node");
        let alias = b.add_typedef(
            Some(m),
            "NodeAlias",
            TypeDesc::Interface(ScopedName::parse("m::Node")),
        );
        b.set_alias(alias, fwd);
        let node = b.add_interface(Some(m), "Node");
        let tree = b.build();

        assert_eq!(tree.resolve_interface(alias), Some(node));
        assert_eq!(tree.resolve_interface(fwd), Some(node));
        assert_eq!(tree.find(&ScopedName::parse("m::Node")), Some(node));
    }

    #[test]
    fn test_resolve_dangling_alias() {
        let mut b = TreeBuilder::new("x.idl");
        let alias = b.add_typedef(None, "Nothing", TypeDesc::Long);
        let tree = b.build();
        assert_eq!(tree.resolve_interface(alias), None);
    }

    #[test]
    fn test_callables_keep_order() {
        let mut b = TreeBuilder::new("x.idl");
        let i = b.add_interface(None, "I");
        let op = b.add_operation(i, "go", TypeDesc::Void, Vec::new());
        let at = b.add_attribute(i, &["size"], TypeDesc::ULong, true);
        let tree = b.build();
        assert_eq!(tree.interface(i).unwrap().callables, vec![op, at]);
        assert_eq!(tree.node(op).scoped_name.cxx(), "I::go");
    }

    #[test]
    fn test_files_follow_builder() {
        let mut b = TreeBuilder::new("main.idl");
        b.set_file("other.idl");
        let ext = b.add_module(None, "ext");
        b.set_file("main.idl");
        let local = b.add_module(None, "local");
        let tree = b.build();
        assert_eq!(tree.node(ext).file, "other.idl");
        assert_eq!(tree.node(local).file, "main.idl");
    }

    #[test]
    fn test_file_base() {
        assert_eq!(file_base("interfaces/DOM-APISPEC.idl"), "DOM-APISPEC");
        assert_eq!(file_base("xpcom"), "xpcom");
        assert_eq!(file_base("C:\\idl\\x.y.idl"), "x.y");
    }

    #[test]
    fn test_direction() {
        assert!(Direction::InOut.is_in() && Direction::InOut.is_out());
        assert!(!Direction::In.is_out());
        assert_eq!(Direction::parse("out"), Some(Direction::Out));
        assert_eq!(Direction::parse("sideways"), None);
    }
}
