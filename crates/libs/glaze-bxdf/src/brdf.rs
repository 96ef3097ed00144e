//! Reflection models.

mod lambert;
mod layer;
mod mix;

pub use lambert::*;
pub use layer::*;
pub use mix::*;
