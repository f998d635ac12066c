//! `ccigen` command-line entry point.

use anyhow::{Context, Result};
use ccigen::{Generator, GeneratorConfig, OutputMode, parse_tree_file, write_pair};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Which files to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    Both,
    Header,
    Source,
}

#[derive(Parser)]
#[command(name = "ccigen")]
#[command(version, about = "Generate C++ adapter wrappers from an IDL tree", long_about = None)]
struct Cli {
    /// Serialized interface-definition tree(s)
    #[arg(required = true)]
    trees: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Outer namespace of the generated wrappers
    #[arg(long, default_value = ccigen_codegen::config::DEFAULT_NAMESPACE)]
    namespace: String,

    /// Root capability interface
    #[arg(long, default_value = ccigen_codegen::config::DEFAULT_ROOT_INTERFACE)]
    root_interface: String,

    /// Prefix of generated file names
    #[arg(long, default_value = ccigen_codegen::config::DEFAULT_HEADER_PREFIX)]
    prefix: String,

    /// Spaces per indentation level
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// Files to write
    #[arg(long, value_enum, default_value_t = Emit::Both)]
    emit: Emit,

    /// Load the trees without generating anything
    #[arg(long)]
    check: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = GeneratorConfig::new()
        .namespace(cli.namespace.as_str())
        .root_interface(&cli.root_interface)
        .header_prefix(cli.prefix.as_str())
        .indent_width(cli.indent);

    for path in &cli.trees {
        let tree = parse_tree_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        tracing::info!(tree = %path.display(), file = %tree.file, nodes = tree.len(), "tree loaded");
        if cli.check {
            continue;
        }

        let generator = Generator::new(&tree, config.clone());
        match cli.emit {
            Emit::Both => {
                let pair = generator.generate_pair()?;
                write_pair(&pair, &cli.output)
                    .with_context(|| format!("failed to write into {}", cli.output.display()))?;
            }
            Emit::Header | Emit::Source => {
                let (mode, name) = if cli.emit == Emit::Header {
                    (
                        OutputMode::Declaration,
                        ccigen_codegen::naming::header_file(&config.header_prefix, &tree.filebase),
                    )
                } else {
                    (
                        OutputMode::Definition,
                        ccigen_codegen::naming::source_file(&config.header_prefix, &tree.filebase),
                    )
                };
                let text = generator.generate(mode)?;
                fs::create_dir_all(&cli.output)?;
                let target = cli.output.join(name);
                fs::write(&target, text)
                    .with_context(|| format!("failed to write {}", target.display()))?;
            }
        }
        tracing::info!(tree = %path.display(), output = %cli.output.display(), "adapter generated");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccigen_codegen::config::{DEFAULT_HEADER_PREFIX, DEFAULT_NAMESPACE};

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["ccigen", "dom.xml"]);
        assert_eq!(cli.namespace, DEFAULT_NAMESPACE);
        assert_eq!(cli.prefix, DEFAULT_HEADER_PREFIX);
        assert_eq!(cli.indent, 2);
        assert_eq!(cli.emit, Emit::Both);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_namespace_leaves_prefix() {
        let cli = Cli::parse_from(["ccigen", "dom.xml", "--namespace", "Adapt", "-vv"]);
        assert_eq!(cli.namespace, "Adapt");
        assert_eq!(cli.prefix, DEFAULT_HEADER_PREFIX);
        assert_eq!(cli.verbose, 2);
    }
}
