//! The SHA-256 value recorded for an artifact.
//!
//! A [`Sha256Digest`] can only come from the three places a digest enters a
//! run: a repository's published `.sha256` file, the output of a local
//! hashing pass, or an in-memory buffer. Each constructor enforces the
//! integrity rules for its source, so a held value is always 64 lowercase
//! hex characters.

use std::fmt;

use sha2::digest::Output;
use sha2::{Digest, Sha256};

use super::error::IntegrityError;

/// Length in bytes of a raw SHA-256 digest.
pub const DIGEST_LEN_BYTES: usize = 32;

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = DIGEST_LEN_BYTES * 2;

/// A hex-encoded SHA-256 digest, always lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Hash `bytes` in one shot.
    ///
    /// # Examples
    ///
    /// ```
    /// use verigen::digest::sha256_digest::Sha256Digest;
    ///
    /// let digest = Sha256Digest::of(b"hello");
    /// assert_eq!(
    ///     digest.as_str(),
    ///     "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    /// );
    /// ```
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self::encode(&Sha256::digest(bytes))
    }

    /// Take the body of a published digest file as the digest, unchanged.
    ///
    /// The body must be exactly 64 ASCII hex characters with nothing around
    /// them. Uppercase hex is accepted and lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::DigestFileLength`] for any other length and
    /// [`IntegrityError::MalformedDigestFile`] for a non-hex byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use verigen::digest::sha256_digest::Sha256Digest;
    ///
    /// let url = "https://repo.example.com/a.jar.sha256";
    /// let digest = Sha256Digest::from_published(url, "AB".repeat(32).as_bytes()).unwrap();
    /// assert_eq!(digest.as_str(), "ab".repeat(32));
    /// assert!(Sha256Digest::from_published(url, b"abc\n").is_err());
    /// ```
    pub fn from_published(digest_url: &str, body: &[u8]) -> Result<Self, IntegrityError> {
        if body.len() != DIGEST_HEX_LEN {
            return Err(IntegrityError::DigestFileLength {
                url: digest_url.to_owned(),
                expected: DIGEST_HEX_LEN,
                actual: body.len(),
            });
        }
        if let Some(bad) = body.iter().find(|b| !b.is_ascii_hexdigit()) {
            return Err(IntegrityError::MalformedDigestFile {
                url: digest_url.to_owned(),
                reason: format!("non-hex byte 0x{bad:02x}"),
            });
        }
        Ok(Self(
            body.iter()
                .map(|b| char::from(b.to_ascii_lowercase()))
                .collect(),
        ))
    }

    /// Encode the raw output of a hashing pass over `artifact_url`.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::ComputedDigestLength`] unless `raw` is
    /// exactly 32 bytes.
    pub fn from_raw(artifact_url: &str, raw: &[u8]) -> Result<Self, IntegrityError> {
        if raw.len() != DIGEST_LEN_BYTES {
            return Err(IntegrityError::ComputedDigestLength {
                url: artifact_url.to_owned(),
                expected: DIGEST_LEN_BYTES,
                actual: raw.len(),
            });
        }
        Ok(Self::encode(Output::<Sha256>::from_slice(raw)))
    }

    fn encode(output: &Output<Sha256>) -> Self {
        Self(format!("{output:x}"))
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
