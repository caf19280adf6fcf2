//! Joining per-item blocks into the raw price document

/// Placed between consecutive item blocks
pub const SEPARATOR: &str = "\n\n---\n\n";

/// Join blocks in order; `K` blocks always yield `K - 1` separators,
/// empty blocks included
pub fn join_blocks<S: AsRef<str>>(blocks: &[S]) -> String {
    blocks.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(SEPARATOR)
}
