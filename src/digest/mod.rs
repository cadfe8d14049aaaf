//! SHA-256 digest resolution for repository artifacts.
//!
//! # Sub-modules
//!
//! - [`download`] - Artifact source trait and HTTP implementation.
//! - [`error`] - Download, integrity, and resolution error types.
//! - [`resolver`] - Fetch-with-fallback protocol (`DigestResolver`).
//! - [`sha256_digest`] - SHA-256 digest newtype (`Sha256Digest`).

pub mod download;
pub mod error;
pub mod resolver;
pub mod sha256_digest;
