//! Canonical Serialization
//!
//! Produces a deterministic byte form of a bundle document:
//!
//! - object keys sorted lexically (by UTF-8 bytes) at every level
//! - no whitespace between tokens
//! - strings escaped the way `serde_json` escapes them
//! - integral floats written as integers (`16.0` and `1e3` become `16` and
//!   `1000`), other numbers in `serde_json`'s shortest round-trip form
//!
//! Two documents with the same values in any key order canonicalize to the
//! same bytes, and therefore the same SHA-256 digest.

use std::io::Write;

use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

use super::ScanBundle;
use crate::domain::ContentDigest;
use crate::error::Result;

/// Canonical serializer and content hasher. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct Canonicalizer;

impl Canonicalizer {
    pub fn new() -> Self {
        Self
    }

    /// Canonical bytes of an arbitrary JSON value.
    pub fn canonical_bytes(&self, value: &Value) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(1024);
        write_canonical(&mut out, value)?;
        Ok(out)
    }

    /// Digest of an arbitrary JSON value.
    pub fn digest_value(&self, value: &Value) -> Result<ContentDigest> {
        let bytes = self.canonical_bytes(value)?;
        Ok(ContentDigest::from_bytes(&Sha256::digest(&bytes)))
    }

    /// Digest of a validated bundle, covering the complete document.
    pub fn digest(&self, bundle: &ScanBundle) -> Result<ContentDigest> {
        self.digest_value(&bundle.document)
    }
}

fn write_canonical<W: Write>(out: &mut W, value: &Value) -> Result<()> {
    match value {
        Value::Null => out.write_all(b"null")?,
        Value::Bool(true) => out.write_all(b"true")?,
        Value::Bool(false) => out.write_all(b"false")?,
        Value::Number(n) => write_number(out, n)?,
        Value::String(s) => serde_json::to_writer(&mut *out, s)?,
        Value::Array(items) => {
            out.write_all(b"[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_all(b",")?;
                }
                write_canonical(out, item)?;
            }
            out.write_all(b"]")?;
        }
        Value::Object(map) => {
            // Map iteration order depends on serde_json features; sort here.
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            out.write_all(b"{")?;
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.write_all(b",")?;
                }
                serde_json::to_writer(&mut *out, key)?;
                out.write_all(b":")?;
                write_canonical(out, item)?;
            }
            out.write_all(b"}")?;
        }
    }
    Ok(())
}

/// Largest magnitude at which an integral `f64` still fits an `i64`.
const I64_FLOAT_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn write_number<W: Write>(out: &mut W, n: &Number) -> Result<()> {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.is_finite() && f.fract() == 0.0 && f >= -I64_FLOAT_BOUND && f < I64_FLOAT_BOUND {
                // -0.0 lands here too and is written as 0
                write!(out, "{}", f as i64)?;
                return Ok(());
            }
        }
    }
    write!(out, "{}", n)?;
    Ok(())
}
