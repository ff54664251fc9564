//! Data models for the Farm Visit Management System.
//!
//! Record fields use the snake_case names the form client already sends; envelopes use camelCase.

mod crop_stage;
mod dashboard;
mod session;
mod visit;

pub use crop_stage::*;
pub use dashboard::*;
pub use session::*;
pub use visit::*;
