//! Expression hashing for cache keys.

use sha2::{Digest, Sha256};

use crate::sqexpr::{SQExpr, SQExprShortSerializer};

/// SHA-256 of the expression's short serialization, as 64 lowercase hex
/// characters. Semantically equal trees hash the same regardless of entity
/// variables or node identity.
pub fn expr_hash(expr: &SQExpr) -> String {
    let mut hasher = Sha256::new();
    hasher.update(SQExprShortSerializer::serialize(expr).as_bytes());
    format!("{:x}", hasher.finalize())
}
