//! Key and mouse button codes shared by every backend.

mod codes;

pub use codes::*;
