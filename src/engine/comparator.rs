//! Key ordering and caller-supplied lookups
//!
//! Neither can be expressed as data, so neither crosses the remote boundary.

use std::cmp::Ordering;
use std::fmt;

/// Total order over index keys
pub trait ByteRangeComparator: Send + Sync + fmt::Debug {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;

    /// Smallest key strictly greater than every key starting with `prefix`,
    /// `None` when no such bound exists.
    fn prefix_end(&self, prefix: &[u8]) -> Option<Vec<u8>>;
}

/// Unsigned lexicographic byte order
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultComparator;

impl ByteRangeComparator for DefaultComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    fn prefix_end(&self, prefix: &[u8]) -> Option<Vec<u8>> {
        let mut end = prefix.to_vec();
        while let Some(last) = end.pop() {
            if last < u8::MAX {
                end.push(last + 1);
                return Some(end);
            }
        }
        None
    }
}

/// Read access to one consistent snapshot of a local database
pub trait SnapshotView {
    fn get(&self, index_id: u32, key: &[u8]) -> Option<Vec<u8>>;
}

/// Caller code run against a local snapshot
pub trait UserDefinedLookup: Send + Sync {
    fn execute(&self, view: &dyn SnapshotView) -> Option<Vec<u8>>;
}
