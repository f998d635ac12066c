//! # ccigen tree
//!
//! Interface-definition tree model for the ccigen adapter generator.
//!
//! This crate provides:
//! - An arena tree of modules, interfaces, typedefs and callables
//! - Type descriptors and the C++ spelling tables for both representations
//! - Decoded interface pragmas
//! - A loader for the XML serialization of a resolved tree

pub mod error;
pub mod mapping;
pub mod parser;
pub mod pragma;
pub mod tree;
pub mod types;

pub use error::ParseError;
pub use mapping::{SIMPLE_NAMESPACE, SimpleForm, corba_type, corba_var_type, simple_type};
pub use parser::{parse_tree, parse_tree_file};
pub use pragma::Pragma;
pub use tree::{
    AttributeDef, Direction, InterfaceDef, Node, NodeId, NodeKind, OperationDef, ParameterDef,
    Tree, TreeBuilder, file_base,
};
pub use types::{ScopedName, TypeDesc};
