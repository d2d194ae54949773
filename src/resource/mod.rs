//! Resource abstraction layer
//!
//! Descriptors name a resource as a path of classes from the API root. The
//! class table is loaded from JSON at compile time, so a new Crossbar
//! endpoint only needs a registry entry.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches class definitions from embedded JSON
//! - [`descriptor`] - Builder for the segment path of an operation
//! - [`compiler`] - Resolves defaults and addressing into a call chain
//! - [`executor`] - Runs a call chain against the transport
//!
//! # Class Definitions
//!
//! Classes are defined in `src/resources/crossbar.json`, each with its URL
//! segment and accessor kind.

pub mod compiler;
pub mod descriptor;
pub mod executor;
pub mod registry;

pub use compiler::{compile, format_filters, Chain, Mode, FILTER_PREFIX};
pub use descriptor::{Descriptor, Segment};
pub use executor::{Executor, Link};
pub use registry::{class_def, get_registry, AccessorKind, ClassDef, ResourceClass};
