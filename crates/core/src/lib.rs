//! Core business logic for Brototype Connect.
//!
//! Every service operation takes an explicit [`Viewer`] describing who is
//! acting; there is no ambient session.

pub mod services;
pub mod viewer;

pub use services::*;
pub use viewer::Viewer;
