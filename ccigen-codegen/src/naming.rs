//! Deterministic names of generated identifiers and files.

use ccigen_tree::{SIMPLE_NAMESPACE, ScopedName, file_base};

/// Include guard stem: the file base stripped to ASCII letters.
#[must_use]
pub fn guard(filebase: &str) -> String {
    filebase.chars().filter(char::is_ascii_alphabetic).collect()
}

/// `PUBLIC_<guard>_PRE`.
#[must_use]
pub fn public_pre(guard: &str) -> String {
    format!("PUBLIC_{guard}_PRE")
}

/// `PUBLIC_<guard>_POST`.
#[must_use]
pub fn public_post(guard: &str) -> String {
    format!("PUBLIC_{guard}_POST")
}

/// Downcast accessor for `name`.
#[must_use]
pub fn downcast(name: &ScopedName) -> String {
    format!("_downcast_{}", name.joined())
}

/// Unwrap accessor for `name`.
#[must_use]
pub fn unwrap(name: &ScopedName) -> String {
    format!("_unwrap_{}", name.joined())
}

/// Concrete wrapper class.
#[must_use]
pub fn final_class(simple: &str) -> String {
    format!("_final_{simple}")
}

/// Factory class.
#[must_use]
pub fn factory_class(simple: &str) -> String {
    format!("_factory_{simple}")
}

/// Registration hook function.
#[must_use]
pub fn hook(simple: &str) -> String {
    format!("prod{simple}")
}

/// Global factory instance.
#[must_use]
pub fn factory_instance(name: &ScopedName) -> String {
    format!("gCCIFactory{}", name.joined())
}

/// Scoped name of a sibling class of `name` (`m::_final_X` for `m::X`).
#[must_use]
pub fn sibling(name: &ScopedName, class: &str) -> String {
    match name.parent() {
        Some(parent) if !parent.is_empty() => format!("{}::{class}", parent.cxx()),
        _ => class.to_string(),
    }
}

/// The simplified interface type, `iface::m::X`.
#[must_use]
pub fn simple_scoped(name: &ScopedName) -> String {
    format!("{SIMPLE_NAMESPACE}::{}", name.cxx())
}

/// Declaration file name for a tree.
#[must_use]
pub fn header_file(prefix: &str, filebase: &str) -> String {
    format!("{prefix}{filebase}.hxx")
}

/// Definition file name for a tree.
#[must_use]
pub fn source_file(prefix: &str, filebase: &str) -> String {
    format!("{prefix}{filebase}.cxx")
}

/// The declaration file generated for another input file.
#[must_use]
pub fn include_for(prefix: &str, file: &str) -> String {
    header_file(prefix, &file_base(file))
}
