//! Data models for Hostwatch

mod alert;
mod reading;

pub use alert::*;
pub use reading::*;
