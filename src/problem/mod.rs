//! Conic linear programs of the minimum enclosing ball.

mod ball;
mod norm;

#[cfg(test)]
mod operator_ref;

pub use ball::*;
pub use norm::*;
