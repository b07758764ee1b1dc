//! Request handlers.

pub mod health;
pub mod predict;
pub mod result_image;
pub mod root;

pub use health::*;
pub use predict::*;
pub use result_image::*;
pub use root::*;
