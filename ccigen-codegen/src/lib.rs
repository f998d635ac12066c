//! # ccigen codegen
//!
//! C++ adapter-layer generation from interface-definition trees.
//!
//! This crate provides:
//! - The dual-mode tree walker emitting a declaration and a definition file
//! - Lazy namespace-block management and include deduplication
//! - Bidirectional type conversion with ownership-correct cleanup
//! - Inheritance linearization over diamond-shaped base graphs
//! - Synthesis of the abstract, concrete, factory and hook artifacts

pub mod bases;
pub mod config;
pub mod convert;
pub mod error;
pub mod generator;
pub mod marshal;
pub mod naming;
pub mod output;
pub mod scope;
pub mod walker;
pub mod wrapper;

pub use bases::{BaseEdge, Inheritance, inheritance_edges, linearize};
pub use config::GeneratorConfig;
pub use error::CodegenError;
pub use generator::{GeneratedPair, Generator};
pub use output::Stream;

/// Which of the two files a pass emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// The declaration (`.hxx`) file.
    Declaration,
    /// The definition (`.cxx`) file.
    Definition,
}

/// Generates both adapter files from a serialized tree.
///
/// # Arguments
/// * `xml` - Serialized interface-definition tree
/// * `config` - Generator configuration
///
/// # Returns
/// The generated declaration and definition files.
///
/// # Errors
/// Returns `CodegenError` if loading or generation fails.
pub fn generate_from_xml(xml: &str, config: GeneratorConfig) -> Result<GeneratedPair, CodegenError> {
    let tree = ccigen_tree::parse_tree(xml)?;
    Generator::new(&tree, config).generate_pair()
}

/// Generates both adapter files from a serialized tree file.
///
/// # Errors
/// Returns `CodegenError` if reading, loading, or generation fails.
pub fn generate_from_file(
    path: &std::path::Path,
    config: GeneratorConfig,
) -> Result<GeneratedPair, CodegenError> {
    let xml = std::fs::read_to_string(path)?;
    generate_from_xml(&xml, config)
}

/// Writes a generated pair into `dir` under its file names.
///
/// # Errors
/// Returns `CodegenError` if a file cannot be written.
pub fn write_pair(pair: &GeneratedPair, dir: &std::path::Path) -> Result<(), CodegenError> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(&pair.source_name), &pair.source)?;
    std::fs::write(dir.join(&pair.header_name), &pair.header)?;
    tracing::debug!(dir = %dir.display(), "wrote adapter files");
    Ok(())
}
