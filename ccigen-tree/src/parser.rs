//! Interface-definition tree loader.
//!
//! Reads the XML serialization of an already parsed and resolved tree, as
//! written by an upstream front end, into a [`Tree`]. Loading is two-phase:
//! the whole document is read first, then every type and base reference is
//! resolved against the complete name index, so declarations may refer to
//! names that appear later in the document.

use crate::error::ParseError;
use crate::pragma::Pragma;
use crate::tree::{Direction, NodeId, NodeKind, OperationDef, ParameterDef, Tree, TreeBuilder};
use crate::types::{ScopedName, TypeDesc};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

/// Parses a serialized tree from a string.
///
/// # Arguments
/// * `xml` - XML tree content
///
/// # Returns
/// The loaded tree or a parse error.
///
/// # Errors
/// Returns `ParseError` if the XML is malformed, an element or attribute is
/// invalid, or a type or base reference cannot be resolved.
pub fn parse_tree(xml: &str) -> Result<Tree, ParseError> {
    let root = read_document(xml)?;
    if root.name != "tree" {
        return Err(ParseError::structure(format!(
            "expected <tree> root element, found <{}>",
            root.name
        )));
    }

    let file = root.required("file")?.to_string();
    let mut loader = Loader::new(&file);
    if let Some(filename) = root.attr("filename") {
        loader.builder.set_filename(filename);
    }
    loader.load_definitions(&root, None, &file)?;
    let tree = loader.finish()?;
    tracing::debug!(
        file = %tree.file,
        nodes = tree.len(),
        "loaded interface-definition tree"
    );
    Ok(tree)
}

/// Parses a serialized tree from a file.
///
/// # Errors
/// Returns `ParseError` if the file cannot be read or does not hold a valid tree.
pub fn parse_tree_file(path: &std::path::Path) -> Result<Tree, ParseError> {
    let xml = std::fs::read_to_string(path)?;
    parse_tree(&xml)
}

/// A generic XML element.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn from_start(e: &BytesStart<'_>) -> Result<Self, ParseError> {
        let name = std::str::from_utf8(e.name().as_ref())?.to_string();
        let mut attrs = Vec::new();
        for attr in e.attributes().flatten() {
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let value = std::str::from_utf8(&attr.value)?;
            let value = unescape(value).map_err(|_| ParseError::invalid_attr(&name, key, value))?;
            attrs.push((key.to_string(), value.into_owned()));
        }
        Ok(Self {
            name,
            attrs,
            ..Self::default()
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn required(&self, key: &str) -> Result<&str, ParseError> {
        self.attr(key)
            .ok_or_else(|| ParseError::missing_attr(&self.name, key))
    }

    fn flag(&self, key: &str) -> Result<bool, ParseError> {
        match self.attr(key) {
            None | Some("false") | Some("0") => Ok(false),
            Some("true") | Some("1") => Ok(true),
            Some(other) => Err(ParseError::invalid_attr(&self.name, key, other)),
        }
    }
}

/// Reads the document into an element tree.
fn read_document(xml: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => stack.push(Element::from_start(e)?),
            Ok(Event::Empty(ref e)) => {
                let element = Element::from_start(e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::structure("unbalanced end tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(ref t)) => {
                let text = std::str::from_utf8(t)?.trim();
                if let Some(top) = stack.last_mut() {
                    let text = unescape(text)
                        .map_err(|_| ParseError::structure(format!("bad text '{text}'")))?;
                    top.text.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ParseError::structure("unterminated element at end of input"));
    }
    root.ok_or_else(|| ParseError::structure("no <tree> element found"))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ParseError::structure("more than one root element")),
    }
    Ok(())
}

/// Where a pending type reference lands once resolved.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Return,
    Param(usize),
    Attribute,
}

#[derive(Debug)]
struct PendingType {
    node: NodeId,
    slot: Slot,
    expr: String,
    scope: ScopedName,
}

#[derive(Debug)]
struct PendingBase {
    interface: NodeId,
    expr: String,
    scope: ScopedName,
}

#[derive(Debug)]
struct PendingTypedef {
    expr: String,
    scope: ScopedName,
}

struct Loader {
    builder: TreeBuilder,
    types: Vec<PendingType>,
    bases: Vec<PendingBase>,
    typedef_order: Vec<NodeId>,
    typedefs: HashMap<NodeId, PendingTypedef>,
    resolved: HashMap<NodeId, TypeDesc>,
}

impl Loader {
    fn new(file: &str) -> Self {
        Self {
            builder: TreeBuilder::new(file),
            types: Vec::new(),
            bases: Vec::new(),
            typedef_order: Vec::new(),
            typedefs: HashMap::new(),
            resolved: HashMap::new(),
        }
    }

    fn scope_of(&self, parent: Option<NodeId>) -> ScopedName {
        parent.map_or_else(ScopedName::default, |p| {
            self.builder.node(p).scoped_name.clone()
        })
    }

    fn load_definitions(
        &mut self,
        element: &Element,
        parent: Option<NodeId>,
        file: &str,
    ) -> Result<(), ParseError> {
        for child in &element.children {
            let file = child.attr("file").unwrap_or(file).to_string();
            self.builder.set_file(&file);
            match child.name.as_str() {
                "module" => {
                    let id = self.builder.add_module(parent, child.required("name")?);
                    self.load_definitions(child, Some(id), &file)?;
                }
                "interface" => self.load_interface(child, parent, &file)?,
                "forward" => {
                    self.builder.add_forward(parent, child.required("name")?);
                }
                "typedef" => self.load_typedef(child, parent)?,
                "enum" => self.load_enum(child, parent)?,
                other => return Err(ParseError::unknown_element(other, &element.name)),
            }
        }
        Ok(())
    }

    fn load_interface(
        &mut self,
        element: &Element,
        parent: Option<NodeId>,
        file: &str,
    ) -> Result<(), ParseError> {
        let id = self.builder.add_interface(parent, element.required("name")?);
        let enclosing = self.scope_of(parent);
        let scope = self.scope_of(Some(id));

        for child in &element.children {
            self.builder.set_file(child.attr("file").unwrap_or(file));
            match child.name.as_str() {
                "pragma" => self.builder.add_pragma(id, Pragma::parse(&child.text)),
                "inherits" => self.bases.push(PendingBase {
                    interface: id,
                    expr: child.required("ref")?.to_string(),
                    scope: enclosing.clone(),
                }),
                "operation" => self.load_operation(child, id, &scope)?,
                "attribute" => self.load_attribute(child, id, &scope)?,
                "typedef" => self.load_typedef(child, Some(id))?,
                "enum" => self.load_enum(child, Some(id))?,
                other => return Err(ParseError::unknown_element(other, "interface")),
            }
        }
        Ok(())
    }

    fn load_operation(
        &mut self,
        element: &Element,
        interface: NodeId,
        scope: &ScopedName,
    ) -> Result<(), ParseError> {
        let name = element.required("name")?;
        let mut parameters = Vec::new();
        let mut pending = Vec::new();

        for (index, child) in element.children.iter().enumerate() {
            if child.name != "param" {
                return Err(ParseError::unknown_element(&child.name, "operation"));
            }
            let direction_text = child.required("direction")?;
            let direction = Direction::parse(direction_text)
                .ok_or_else(|| ParseError::invalid_attr("param", "direction", direction_text))?;
            parameters.push(ParameterDef::new(
                child.required("name")?,
                TypeDesc::Void,
                direction,
            ));
            pending.push((Slot::Param(index), child.required("type")?.to_string()));
        }

        let op = self
            .builder
            .add_operation(interface, name, TypeDesc::Void, parameters);
        let returns = element.attr("returns").unwrap_or("void").to_string();
        pending.insert(0, (Slot::Return, returns));
        for (slot, expr) in pending {
            self.types.push(PendingType {
                node: op,
                slot,
                expr,
                scope: scope.clone(),
            });
        }
        Ok(())
    }

    fn load_attribute(
        &mut self,
        element: &Element,
        interface: NodeId,
        scope: &ScopedName,
    ) -> Result<(), ParseError> {
        let names = element
            .attr("names")
            .or_else(|| element.attr("name"))
            .ok_or_else(|| ParseError::missing_attr("attribute", "names"))?;
        let declarators: Vec<&str> = names.split_whitespace().collect();
        if declarators.is_empty() {
            return Err(ParseError::invalid_attr("attribute", "names", names));
        }

        let readonly = element.flag("readonly")?;
        let attribute = self
            .builder
            .add_attribute(interface, &declarators, TypeDesc::Void, readonly);
        self.types.push(PendingType {
            node: attribute,
            slot: Slot::Attribute,
            expr: element.required("type")?.to_string(),
            scope: scope.clone(),
        });
        Ok(())
    }

    fn load_typedef(&mut self, element: &Element, parent: Option<NodeId>) -> Result<(), ParseError> {
        let declarator = self
            .builder
            .add_typedef(parent, element.required("name")?, TypeDesc::Void);
        let pending = PendingTypedef {
            expr: element.required("type")?.to_string(),
            scope: self.scope_of(parent),
        };
        self.typedef_order.push(declarator);
        self.typedefs.insert(declarator, pending);
        Ok(())
    }

    fn load_enum(&mut self, element: &Element, parent: Option<NodeId>) -> Result<(), ParseError> {
        let mut enumerators = Vec::new();
        for child in &element.children {
            if child.name != "enumerator" {
                return Err(ParseError::unknown_element(&child.name, "enum"));
            }
            enumerators.push(child.required("name")?.to_string());
        }
        self.builder
            .add_enum(parent, element.required("name")?, enumerators);
        Ok(())
    }

    fn finish(mut self) -> Result<Tree, ParseError> {
        for declarator in self.typedef_order.clone() {
            self.typedef_type(declarator, &mut Vec::new())?;
        }

        for pending in std::mem::take(&mut self.types) {
            let context = self.builder.node(pending.node).scoped_name.cxx();
            let ty = self.resolve_type(&pending.expr, &pending.scope, &context, &mut Vec::new())?;
            self.apply(pending.node, pending.slot, ty);
        }

        for pending in std::mem::take(&mut self.bases) {
            let target = pending
                .scope
                .lookup_candidates(&pending.expr)
                .iter()
                .find_map(|candidate| self.builder.find(candidate))
                .ok_or_else(|| ParseError::UnknownBase {
                    base: pending.expr.clone(),
                    interface: self.builder.node(pending.interface).scoped_name.cxx(),
                })?;
            self.builder.add_base(pending.interface, target);
        }

        Ok(self.builder.build())
    }

    fn apply(&mut self, node: NodeId, slot: Slot, ty: TypeDesc) {
        match (slot, &self.builder.node(node).kind) {
            (Slot::Attribute, _) => self.builder.set_attribute_type(node, ty),
            (Slot::Return, NodeKind::Operation(op)) => {
                let def = OperationDef {
                    return_type: ty,
                    parameters: op.parameters.clone(),
                };
                self.builder.set_operation(node, def);
            }
            (Slot::Param(index), NodeKind::Operation(op)) => {
                let mut def = op.clone();
                if let Some(param) = def.parameters.get_mut(index) {
                    param.ty = ty;
                }
                self.builder.set_operation(node, def);
            }
            _ => {}
        }
    }

    /// Resolves the aliased type of a typedef declarator.
    fn typedef_type(
        &mut self,
        declarator: NodeId,
        visiting: &mut Vec<NodeId>,
    ) -> Result<TypeDesc, ParseError> {
        if let Some(ty) = self.resolved.get(&declarator) {
            return Ok(ty.clone());
        }
        let name = self.builder.node(declarator).scoped_name.clone();
        if visiting.contains(&declarator) {
            return Err(ParseError::AliasCycle { name: name.cxx() });
        }
        let Some(pending) = self.typedefs.get(&declarator) else {
            return Err(ParseError::structure(format!("'{name}' is not a typedef")));
        };
        let (expr, scope) = (pending.expr.clone(), pending.scope.clone());

        visiting.push(declarator);
        let ty = match sequence_element(&expr) {
            Some(inner) => {
                let element = self.resolve_type(inner, &scope, &name.cxx(), visiting)?;
                if element.is_length_bearing() {
                    return Err(ParseError::structure(format!(
                        "sequence '{name}' has a sequence element type"
                    )));
                }
                TypeDesc::Sequence {
                    name: name.clone(),
                    element: Box::new(element),
                }
            }
            None => self.resolve_type(&expr, &scope, &name.cxx(), visiting)?,
        };
        visiting.pop();

        if let TypeDesc::Interface(target) = &ty {
            if let Some(target) = self.builder.find(target) {
                self.builder.set_alias(declarator, target);
            }
        }
        self.builder.set_aliased_type(declarator, ty.clone());
        self.resolved.insert(declarator, ty.clone());
        Ok(ty)
    }

    /// Resolves a type expression seen from `scope`.
    fn resolve_type(
        &mut self,
        expr: &str,
        scope: &ScopedName,
        context: &str,
        visiting: &mut Vec<NodeId>,
    ) -> Result<TypeDesc, ParseError> {
        if let Some(basic) = TypeDesc::from_keyword(expr) {
            return Ok(basic);
        }
        if sequence_element(expr).is_some() {
            return Err(ParseError::structure(format!(
                "anonymous sequence '{expr}' in '{context}'; sequences must be named by a typedef"
            )));
        }

        let found = scope.lookup_candidates(expr).into_iter().find_map(|candidate| {
            self.builder.find(&candidate).map(|id| (candidate, id))
        });
        let Some((name, id)) = found else {
            return Err(ParseError::UnknownType {
                type_name: expr.to_string(),
                context: context.to_string(),
            });
        };

        match &self.builder.node(id).kind {
            NodeKind::Interface(_) | NodeKind::Forward { .. } => Ok(TypeDesc::Interface(name)),
            NodeKind::Enum { .. } => Ok(TypeDesc::Enum(name)),
            NodeKind::Declarator { .. } => self.typedef_type(id, visiting),
            _ => Err(ParseError::UnknownType {
                type_name: expr.to_string(),
                context: context.to_string(),
            }),
        }
    }
}

/// Returns the element expression of `sequence<T>`.
fn sequence_element(expr: &str) -> Option<&str> {
    expr.trim()
        .strip_prefix("sequence")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('<'))
        .and_then(|rest| rest.strip_suffix('>'))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    const DOM_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tree file="DOM-APISPEC.idl" filename="interfaces/DOM-APISPEC.idl">
    <module name="XPCOM" file="xpcom.idl">
        <interface name="IObject">
            <operation name="add_ref"/>
            <operation name="release_ref"/>
            <operation name="query_interface" returns="IObject">
                <param name="id" direction="in" type="string"/>
            </operation>
        </interface>
    </module>
    <module name="dom">
        <forward name="Node"/>
        <typedef name="NodeSeq" type="sequence&lt;Node&gt;"/>
        <typedef name="DOMString" type="wstring"/>
        <interface name="Node">
            <inherits ref="XPCOM::IObject"/>
            <pragma>cross-module-argument</pragma>
            <attribute names="nodeName nodeValue" type="DOMString" readonly="true"/>
            <operation name="childNodes" returns="NodeSeq">
                <param name="deep" direction="in" type="boolean"/>
                <param name="count" direction="out" type="unsigned long"/>
            </operation>
        </interface>
        <typedef name="NodeAlias" type="Node"/>
        <interface name="Element">
            <inherits ref="NodeAlias"/>
            <pragma>terminal-interface</pragma>
        </interface>
    </module>
</tree>"#;

    fn find(tree: &Tree, name: &str) -> NodeId {
        tree.find(&ScopedName::parse(name)).expect("declaration")
    }

    #[test]
    fn test_parse_tree_basic() {
        let tree = parse_tree(DOM_XML).expect("Failed to parse");
        assert_eq!(tree.file, "DOM-APISPEC.idl");
        assert_eq!(tree.filename, "interfaces/DOM-APISPEC.idl");
        assert_eq!(tree.filebase, "DOM-APISPEC");
        assert_eq!(tree.declarations.len(), 2);
    }

    #[test]
    fn test_parse_files_inherit() {
        let tree = parse_tree(DOM_XML).expect("Failed to parse");
        let iobject = find(&tree, "XPCOM::IObject");
        let node = find(&tree, "dom::Node");
        assert_eq!(tree.node(iobject).file, "xpcom.idl");
        assert_eq!(tree.node(node).file, "DOM-APISPEC.idl");
    }

    #[test]
    fn test_parse_pragmas_decoded() {
        let tree = parse_tree(DOM_XML).expect("Failed to parse");
        let node = tree.interface(find(&tree, "dom::Node")).unwrap();
        assert!(node.requires_export());
        let element = tree.interface(find(&tree, "dom::Element")).unwrap();
        assert!(element.is_terminal());
    }

    #[test]
    fn test_parse_resolves_sequence_typedef() {
        let tree = parse_tree(DOM_XML).expect("Failed to parse");
        let node = tree.interface(find(&tree, "dom::Node")).unwrap();
        let NodeKind::Operation(op) = &tree.node(node.callables[1]).kind else {
            panic!("expected operation");
        };
        assert_eq!(
            op.return_type,
            TypeDesc::Sequence {
                name: ScopedName::parse("dom::NodeSeq"),
                element: Box::new(TypeDesc::Interface(ScopedName::parse("dom::Node"))),
            }
        );
        assert_eq!(op.parameters[0].ty, TypeDesc::Boolean);
        assert_eq!(op.parameters[1].ty, TypeDesc::ULong);
        assert_eq!(op.parameters[1].direction, Direction::Out);
    }

    #[test]
    fn test_parse_attribute_through_typedef() {
        let tree = parse_tree(DOM_XML).expect("Failed to parse");
        let node = tree.interface(find(&tree, "dom::Node")).unwrap();
        let NodeKind::Attribute(attr) = &tree.node(node.callables[0]).kind else {
            panic!("expected attribute");
        };
        assert_eq!(attr.ty, TypeDesc::WString);
        assert!(attr.readonly);
        assert_eq!(attr.declarators, vec!["nodeName", "nodeValue"]);
    }

    #[test]
    fn test_parse_base_through_alias() {
        let tree = parse_tree(DOM_XML).expect("Failed to parse");
        let element = tree.interface(find(&tree, "dom::Element")).unwrap();
        let base = element.bases[0];
        assert!(matches!(tree.node(base).kind, NodeKind::Declarator { .. }));
        assert_eq!(tree.resolve_interface(base), Some(find(&tree, "dom::Node")));
    }

    #[test]
    fn test_parse_query_interface_returns_root() {
        let tree = parse_tree(DOM_XML).expect("Failed to parse");
        let root = tree.interface(find(&tree, "XPCOM::IObject")).unwrap();
        let NodeKind::Operation(op) = &tree.node(root.callables[2]).kind else {
            panic!("expected operation");
        };
        assert_eq!(
            op.return_type,
            TypeDesc::Interface(ScopedName::parse("XPCOM::IObject"))
        );
    }

    #[test]
    fn test_parse_unknown_type() {
        let xml = r#"<tree file="a.idl">
            <interface name="I">
                <attribute names="x" type="Missing"/>
            </interface>
        </tree>"#;
        let err = parse_tree(xml).unwrap_err();
        assert!(matches!(err, ParseError::UnknownType { .. }));
    }

    #[test]
    fn test_parse_unknown_base() {
        let xml = r#"<tree file="a.idl">
            <interface name="I"><inherits ref="Nowhere"/></interface>
        </tree>"#;
        let err = parse_tree(xml).unwrap_err();
        assert!(matches!(err, ParseError::UnknownBase { .. }));
    }

    #[test]
    fn test_parse_alias_cycle() {
        let xml = r#"<tree file="a.idl">
            <typedef name="A" type="B"/>
            <typedef name="B" type="A"/>
        </tree>"#;
        let err = parse_tree(xml).unwrap_err();
        assert!(matches!(err, ParseError::AliasCycle { .. }));
    }

    #[test]
    fn test_parse_anonymous_sequence_rejected() {
        let xml = r#"<tree file="a.idl">
            <interface name="I">
                <attribute names="x" type="sequence&lt;long&gt;"/>
            </interface>
        </tree>"#;
        let err = parse_tree(xml).unwrap_err();
        assert!(matches!(err, ParseError::InvalidStructure { .. }));
    }

    #[test]
    fn test_parse_missing_attribute() {
        let xml = r#"<tree file="a.idl"><module/></tree>"#;
        let err = parse_tree(xml).unwrap_err();
        assert!(matches!(err, ParseError::MissingAttribute { .. }));
    }

    #[test]
    fn test_parse_invalid_direction() {
        let xml = r#"<tree file="a.idl">
            <interface name="I">
                <operation name="f"><param name="p" direction="both" type="long"/></operation>
            </interface>
        </tree>"#;
        let err = parse_tree(xml).unwrap_err();
        assert!(matches!(err, ParseError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_parse_wrong_root() {
        let err = parse_tree("<schema/>").unwrap_err();
        assert!(matches!(err, ParseError::InvalidStructure { .. }));
    }

    #[test]
    fn test_parse_enum_type() {
        let xml = r#"<tree file="a.idl">
            <module name="m">
                <enum name="Color"><enumerator name="RED"/><enumerator name="GREEN"/></enum>
                <interface name="I"><attribute names="c" type="Color"/></interface>
            </module>
        </tree>"#;
        let tree = parse_tree(xml).expect("Failed to parse");
        let iface = tree.interface(find(&tree, "m::I")).unwrap();
        let NodeKind::Attribute(attr) = &tree.node(iface.callables[0]).kind else {
            panic!("expected attribute");
        };
        assert_eq!(attr.ty, TypeDesc::Enum(ScopedName::parse("m::Color")));
    }

    #[test]
    fn test_parse_tree_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dom.xml");
        std::fs::write(&path, DOM_XML).expect("write");
        let tree = parse_tree_file(&path).expect("Failed to parse");
        assert_eq!(tree.filebase, "DOM-APISPEC");
    }
}
