//! # Hashing Utilities
//!
//! Cryptographic hash functions used throughout the consensus core. We
//! support two primary hash functions and refuse to support more without a
//! very good reason:
//!
//! - **BLAKE3** — Our default. Fast on every platform, parallelizable,
//!   and provably secure under standard assumptions. Used for block IDs,
//!   Merkle roots, and address derivation — anywhere performance matters
//!   (which is everywhere).
//!
//! - **SHA-256** — For interoperability with the rest of the
//!   "we chose SHA-256 in 2009 and now we're stuck with it" ecosystem.
//!   Also used in `double_sha256` for transaction ID compatibility.
//!
//! ## On hash function choice
//!
//! BLAKE3 is ~5x faster than SHA-256 on x86-64 and ~3x faster on ARM.
//! Both provide 128-bit collision resistance (256-bit output). There's no
//! security reason to prefer SHA-256 — only compatibility. Prefer BLAKE3
//! for protocol-native data structures; use SHA-256 only when talking to
//! external systems that expect it.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// Returns a 32-byte digest as a `Vec<u8>`. Used primarily for cross-chain
/// compatibility and double-hashing constructions. For protocol-internal hashing,
/// prefer `blake3_hash()`.
///
/// Why `Vec<u8>` and not `[u8; 32]`? Because half the callers immediately
/// pass it to functions that want `&[u8]`, and the other half want to
/// chain it into `double_sha256`. The heap allocation is noise compared
/// to the cost of the hash itself.
///
/// # Example
///
/// ```
/// use quorum_protocol::crypto::sha256;
///
/// let hash = sha256(b"QUORUM consensus");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Compute the SHA-256 hash and return a fixed-size array.
///
/// Same as `sha256()` but returns `[u8; 32]` for callers that want
/// a fixed-size type without the heap allocation. Use this in hot paths
/// where the array type propagates naturally.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the BLAKE3 hash of the input data.
///
/// Returns a 32-byte digest as a fixed-size array. This is the workhorse
/// hash function of the protocol — fast, secure, and elegant. Uses the `blake3`
/// crate which automatically takes advantage of SIMD instructions on
/// supported platforms.
///
/// BLAKE3 is a Merkle-tree-based hash that can hash large inputs in parallel
/// across multiple cores. For typical transaction data (<1KB), the single-threaded
/// performance is what matters, and it's still ~5x faster than SHA-256.
///
/// # Example
///
/// ```
/// use quorum_protocol::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"QUORUM consensus");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute BLAKE3 and return the digest as a `Vec<u8>`.
///
/// Use [`blake3_hash`] when you want a fixed-size array. This variant
/// exists for call sites that need a heap-allocated result (e.g., when
/// storing hashes in a `HashMap<Vec<u8>, _>` or passing to APIs that
/// want owned data).
pub fn blake3_hash_vec(data: &[u8]) -> Vec<u8> {
    blake3::hash(data).as_bytes().to_vec()
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
///
/// This construction is used for transaction IDs in Bitcoin and many other
/// protocols. The double-hash provides protection against length extension
/// attacks (which SHA-256 alone is vulnerable to, though in practice this
/// matters less than people think).
///
/// We include it primarily for cross-chain transaction references. For
/// protocol-native transaction IDs, we use BLAKE3 (which doesn't need double-
/// hashing because it's already resistant to length extension attacks —
/// it's based on a wide-pipe Merkle-Damgard variant that truncates output).
///
/// # Example
///
/// ```
/// use quorum_protocol::crypto::double_sha256;
///
/// let tx_id = double_sha256(b"raw transaction bytes");
/// assert_eq!(tx_id.len(), 32);
/// ```
pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256(&sha256(data))
}

/// Compute a domain-separated hash using BLAKE3 with a context string.
///
/// Domain separation prevents hash collisions across different protocol contexts.
/// For example, `domain_separated_hash("tx-id", data)` and
/// `domain_separated_hash("block-hash", data)` will never collide even if
/// `data` is the same, because the domain tag is mixed into the hash.
///
/// This uses BLAKE3's built-in `derive_key` mode, which is the proper way
/// to do domain separation with BLAKE3. Don't try to prepend a tag manually —
/// that's what amateurs do. BLAKE3's `derive_key` uses a different internal
/// IV derived from the context string, making cross-context collisions
/// impossible by construction.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Hash multiple byte slices together without concatenation overhead.
///
/// Instead of allocating a buffer to concatenate inputs, we feed them
/// sequentially into the hasher. Same result, less allocation. Particularly
/// useful for hashing composite structures like `(sender || receiver || amount)`
/// without the temporary buffer.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Compute a Merkle root from a list of leaf hashes using BLAKE3.
///
/// This is a simple binary Merkle tree — nothing fancy like sparse Merkle
/// trees or Merkle Mountain Ranges. For our use case (transaction sets in a
/// block), a basic binary tree is sufficient and easier to reason about.
///
/// If the number of leaves is odd, the last leaf is duplicated. This is
/// the same approach Bitcoin uses, and while it has some known issues with
/// duplicated transactions, we handle that at a higher layer by enforcing
/// transaction uniqueness before building the tree.
///
/// Returns the 32-byte root hash. If the input is empty, returns all zeros
/// (the "empty tree" sentinel).
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut current_level: Vec<[u8; 32]> = leaves.to_vec();

    // A single leaf is paired with itself, matching Bitcoin's Merkle tree
    // behavior. This ensures the root is always the output of a hash
    // operation (never a raw leaf), which simplifies proof verification.
    if current_level.len() == 1 {
        return blake3_hash_multi(&[current_level[0].as_slice(), current_level[0].as_slice()]);
    }

    while current_level.len() > 1 {
        let mut next_level = Vec::with_capacity((current_level.len() + 1) / 2);

        for chunk in current_level.chunks(2) {
            let left = &chunk[0];
            let right = if chunk.len() == 2 {
                &chunk[1]
            } else {
                // Odd number of elements — duplicate the last one.
                // Bitcoin does this too, and yes, we know about CVE-2012-2459.
                // We prevent it by enforcing unique transaction IDs at the
                // mempool layer.
                &chunk[0]
            };

            let parent = blake3_hash_multi(&[left.as_slice(), right.as_slice()]);
            next_level.push(parent);
        }

        current_level = next_level;
    }

    current_level[0]
}
