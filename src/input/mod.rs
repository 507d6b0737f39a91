//! Platform-independent input vocabulary and the per-backend translators
//! which resolve native codes into it.

pub mod keyboard;
pub mod translate;
