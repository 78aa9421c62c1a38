//! The dynamic data model exposed by modules and the bindings read from it.

pub mod binding;
pub mod model;
pub mod module;
pub mod path;
pub mod registry;

pub use binding::*;
pub use model::*;
pub use module::*;
pub use path::*;
pub use registry::*;
