//! HTTP route modules.

pub mod apps;
pub mod preview;
pub mod sys;
pub mod ui;
