//! Content hashing and archive-path sanitization.
//!
//! Every path segment that ends up inside an export or backup archive goes
//! through [`sanitize_segment`], so the layout is identical and extractable
//! on every platform. Hashes fingerprint uploads, exports, and backups for
//! corruption detection.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  hex::encode(hasher.finalize())
}

/// Reduce `text` to a filesystem-safe token: lowercased, every run of
/// non-ASCII-alphanumeric characters collapsed to a single `_`, leading and
/// trailing `_` trimmed. Empty results fall back to `"item"`.
///
/// Idempotent: sanitizing a sanitized token returns it unchanged.
pub fn sanitize_segment(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut pending_sep = false;
  for ch in text.trim().to_lowercase().chars() {
    if ch.is_ascii_alphanumeric() {
      if pending_sep && !out.is_empty() {
        out.push('_');
      }
      out.push(ch);
      pending_sep = false;
    } else {
      pending_sep = true;
    }
  }
  if out.is_empty() { "item".to_string() } else { out }
}

/// Archive folder name for one worker's documents:
/// `{family}_{given}_{natural_id}`, each part sanitized.
pub fn worker_folder(family: &str, given: &str, natural_id: &str) -> String {
  format!(
    "{}_{}_{}",
    sanitize_segment(family),
    sanitize_segment(given),
    sanitize_segment(natural_id)
  )
}
