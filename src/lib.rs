pub mod adler32;
pub mod api;
pub mod batch;
pub mod common;
pub mod decompress;
pub mod error;
pub mod notices;

pub use adler32::{Adler32, adler32};
pub use api::Decompressor;
pub use error::{ErrorClass, InflateError, InflateResult};
