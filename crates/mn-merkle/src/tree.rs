use mn_digest::digest;

use crate::MerkleError;

/// Compute the root of a binary digest tree over `leaves`.
///
/// The tree is built by recursive midpoint split: a single leaf is its own
/// root; otherwise the range `[start, end]` divides at `(start + end) / 2`,
/// left covering `[start, mid]` and right `[mid + 1, end]`, and a parent's
/// digest is `digest(left || right)`. A missing right half is stood in for
/// by a twin of the left child so every parent hashes two children.
///
/// Three leaves therefore reduce to `digest(digest(l0 || l1) || l2)` — the
/// odd leaf is promoted, not paired with a duplicate of itself. Callers that
/// compare roots across processes depend on this exact shape.
///
/// Tree nodes are transient; only the root digest survives the call.
pub fn merkle_root(leaves: &[String]) -> Result<String, MerkleError> {
    if leaves.is_empty() {
        return Err(MerkleError::Empty);
    }
    Ok(build(leaves, 0, leaves.len() - 1))
}

fn build(leaves: &[String], start: usize, end: usize) -> String {
    if start == end {
        return leaves[start].clone();
    }

    let mid = (start + end) / 2;
    let left = build(leaves, start, mid);
    let right = if mid + 1 <= end {
        build(leaves, mid + 1, end)
    } else {
        left.clone()
    };

    let mut combined = String::with_capacity(left.len() + right.len());
    combined.push_str(&left);
    combined.push_str(&right);
    digest(combined.as_bytes())
}
