mod common;
pub mod conversion;
pub mod event;
pub mod note;

pub use common::*;
pub use conversion::*;
