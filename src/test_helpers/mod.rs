//! A set of helpers for testing

mod alert;

pub use alert::{AlertBuilder, RawAlertBuilder, content_hash};
