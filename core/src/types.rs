//! Shared primitive types used across the entire checker.

/// A count of resource units. Signed so that a malformed state
/// (max below allocation) or an over-sized request is representable.
pub type Units = i64;

/// Index of a process in [0, P).
pub type ProcessId = usize;

/// One entry per resource type: available units, a request,
/// or a per-process allocation/max/need row.
pub type ResourceVector = Vec<Units>;

/// P rows of R columns, row i belonging to process i.
pub type Matrix = Vec<ResourceVector>;

/// Componentwise `a <= b` over two vectors of equal length.
pub fn dominated_by(a: &[Units], b: &[Units]) -> bool {
    a.iter().zip(b).all(|(x, y)| x <= y)
}

/// Componentwise `a - b`, or None if any entry overflows.
pub fn checked_sub(a: &[Units], b: &[Units]) -> Option<ResourceVector> {
    a.iter().zip(b).map(|(x, y)| x.checked_sub(*y)).collect()
}

/// Componentwise `a + b`, or None if any entry overflows.
pub fn checked_add(a: &[Units], b: &[Units]) -> Option<ResourceVector> {
    a.iter().zip(b).map(|(x, y)| x.checked_add(*y)).collect()
}
