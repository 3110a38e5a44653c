#![allow(clippy::must_use_candidate)]

//! Types shared by every gateway crate

pub mod context;
pub mod error;

pub use context::{Alias, RequestContext};
pub use error::{ErrorBody, ErrorDetail, HttpError};
