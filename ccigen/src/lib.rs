//! # ccigen
//!
//! Generates the C++ adapter layer that lets code written against a
//! simplified interface binding call objects exposed through a
//! distributed-object binding of the same IDL.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ccigen::prelude::*;
//! use std::path::Path;
//!
//! let tree = parse_tree_file(Path::new("dom.xml"))?;
//! let pair = Generator::new(&tree, GeneratorConfig::default()).generate_pair()?;
//! write_pair(&pair, Path::new("out"))?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`tree`] - Interface-definition tree and its XML loader
//! - [`codegen`] - Two-pass C++ generation
//! - [`runtime`] - Executable model of the generated wrappers

pub mod adapter;
pub mod prelude;

/// Interface-definition tree.
pub mod tree {
    pub use ccigen_tree::*;
}

/// Adapter code generation.
pub mod codegen {
    pub use ccigen_codegen::*;
}

/// Runtime model of generated wrappers.
pub mod runtime {
    pub use ccigen_runtime::*;
}

pub use adapter::{interface_closure, register_factories};
pub use ccigen_codegen::{
    CodegenError, GeneratedPair, Generator, GeneratorConfig, OutputMode, generate_from_file,
    generate_from_xml, write_pair,
};
pub use ccigen_tree::{ParseError, Tree, parse_tree, parse_tree_file};
