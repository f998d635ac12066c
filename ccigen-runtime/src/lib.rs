//! # ccigen runtime
//!
//! Executable model of the objects generated adapters create at run time.
//!
//! This crate provides:
//! - The [`ForeignObject`] view of the distributed-object layer
//! - Reference-counted wrappers that hold exactly one foreign reference
//! - The factory registry used to wrap queried capabilities
//! - Value conversions between the two representations
//!
//! Wrappers are single-threaded, like the objects they model. The registry
//! is shared process-wide.

pub mod error;
pub mod foreign;
pub mod marshal;
pub mod registry;
pub mod wrapper;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{AdapterError, ForeignError, MarshalError};
pub use foreign::{ForeignObject, HostingContext};
pub use marshal::{ForeignValue, LocalValue, Scalar, foreign_to_local, local_to_foreign};
pub use registry::{Factory, InterfaceFactory, WrapperRegistry};
pub use wrapper::{FinalWrapper, Wrapper, query_interface, release, unwrap};
