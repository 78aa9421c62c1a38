pub mod cell;
pub mod coercion;
pub mod kind;

pub use cell::*;
pub use coercion::*;
pub use kind::*;
