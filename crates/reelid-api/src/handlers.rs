//! Request handlers.

pub mod health;
pub mod identify;

pub use health::*;
pub use identify::*;
