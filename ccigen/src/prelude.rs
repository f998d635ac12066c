//! Prelude module for convenient imports.
//!
//! ```ignore
//! use ccigen::prelude::*;
//! ```

// Tree
pub use ccigen_tree::{
    Direction, Node, NodeId, NodeKind, ParseError, Pragma, ScopedName, Tree, TreeBuilder,
    TypeDesc, parse_tree, parse_tree_file,
};

// Generation
pub use ccigen_codegen::{
    CodegenError, GeneratedPair, Generator, GeneratorConfig, Inheritance, OutputMode, linearize,
    write_pair,
};

// Runtime
pub use ccigen_runtime::{
    AdapterError, Factory, FinalWrapper, ForeignError, ForeignObject, HostingContext,
    InterfaceFactory, Wrapper, WrapperRegistry, query_interface, release,
};

pub use crate::adapter::{interface_closure, register_factories};
