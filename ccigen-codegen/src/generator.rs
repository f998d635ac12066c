//! Main code generator.

use crate::OutputMode;
use crate::config::GeneratorConfig;
use crate::error::CodegenError;
use crate::naming;
use crate::walker::Walker;
use ccigen_tree::Tree;

/// The two files generated for one tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPair {
    /// Declaration file contents.
    pub header: String,
    /// Definition file contents.
    pub source: String,
    /// Declaration file name.
    pub header_name: String,
    /// Definition file name.
    pub source_name: String,
}

/// Adapter-layer generator for one interface-definition tree.
pub struct Generator<'a> {
    tree: &'a Tree,
    config: GeneratorConfig,
}

impl<'a> Generator<'a> {
    /// Creates a new generator for the given tree.
    #[must_use]
    pub fn new(tree: &'a Tree, config: GeneratorConfig) -> Self {
        Self { tree, config }
    }

    /// Generates one complete file.
    ///
    /// Every call runs an independent pass with a fresh context.
    ///
    /// # Errors
    /// Returns `CodegenError` if a declaration cannot be generated.
    pub fn generate(&self, mode: OutputMode) -> Result<String, CodegenError> {
        Walker::new(self.tree, &self.config, mode).run()
    }

    /// Generates the definition file, then the declaration file.
    ///
    /// # Errors
    /// Returns `CodegenError` if either pass fails.
    pub fn generate_pair(&self) -> Result<GeneratedPair, CodegenError> {
        let source = self.generate(OutputMode::Definition)?;
        let header = self.generate(OutputMode::Declaration)?;
        let prefix = &self.config.header_prefix;
        let pair = GeneratedPair {
            header,
            source,
            header_name: naming::header_file(prefix, &self.tree.filebase),
            source_name: naming::source_file(prefix, &self.tree.filebase),
        };
        tracing::info!(
            header = %pair.header_name,
            source = %pair.source_name,
            "generated adapter files"
        );
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccigen_tree::{TreeBuilder, TypeDesc};

    fn tree() -> Tree {
        let mut b = TreeBuilder::new("idl/geom-2.idl");
        let m = b.add_module(None, "geom");
        let shape = b.add_interface(Some(m), "Shape");
        b.add_attribute(shape, &["area"], TypeDesc::Double, true);
        b.build()
    }

    #[test]
    fn test_generate_pair_names() {
        let tree = tree();
        let pair = Generator::new(&tree, GeneratorConfig::default())
            .generate_pair()
            .unwrap();
        assert_eq!(pair.header_name, "CCIgeom-2.hxx");
        assert_eq!(pair.source_name, "CCIgeom-2.cxx");
        assert!(pair.header.contains("#ifndef _CCIgeom_hxx"));
        assert!(pair.source.contains("#include \"CCIgeom-2.hxx\""));
    }

    #[test]
    fn test_passes_are_independent() {
        let tree = tree();
        let generator = Generator::new(&tree, GeneratorConfig::default());
        let first = generator.generate(OutputMode::Declaration).unwrap();
        generator.generate(OutputMode::Definition).unwrap();
        let second = generator.generate(OutputMode::Declaration).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_prefix() {
        let tree = tree();
        let config = GeneratorConfig::new().header_prefix("AD");
        let pair = Generator::new(&tree, config).generate_pair().unwrap();
        assert_eq!(pair.header_name, "ADgeom-2.hxx");
        assert!(pair.header.contains("#define _ADgeom_hxx"));
    }
}
