//! Memory layout and storage identity

/// Memory order of a dense buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StorageOrder {
    /// Consecutive elements of a row are adjacent
    #[default]
    RowMajor,
    /// Consecutive elements of a column are adjacent
    ColumnMajor,
}

impl StorageOrder {
    /// The order seen through a transpose
    #[inline]
    pub fn transposed(self) -> Self {
        match self {
            StorageOrder::RowMajor => StorageOrder::ColumnMajor,
            StorageOrder::ColumnMajor => StorageOrder::RowMajor,
        }
    }

    /// Linear offset of `(row, col)` in an `nrows x ncols` buffer
    #[inline(always)]
    pub fn offset(self, row: usize, col: usize, nrows: usize, ncols: usize) -> usize {
        match self {
            StorageOrder::RowMajor => row * ncols + col,
            StorageOrder::ColumnMajor => col * nrows + row,
        }
    }

    /// Number of contiguous runs (rows or columns) in an `nrows x ncols` buffer
    #[inline]
    pub fn run_count(self, nrows: usize, ncols: usize) -> usize {
        match self {
            StorageOrder::RowMajor => nrows,
            StorageOrder::ColumnMajor => ncols,
        }
    }

    /// Length of one contiguous run
    #[inline]
    pub fn run_len(self, nrows: usize, ncols: usize) -> usize {
        match self {
            StorageOrder::RowMajor => ncols,
            StorageOrder::ColumnMajor => nrows,
        }
    }

    /// Matrix position of element `minor` inside run `major`
    #[inline(always)]
    pub fn position(self, major: usize, minor: usize) -> (usize, usize) {
        match self {
            StorageOrder::RowMajor => (major, minor),
            StorageOrder::ColumnMajor => (minor, major),
        }
    }
}

/// Identity of a storage allocation, used by alias analysis
///
/// Two ids compare equal exactly when they were taken from the same storage
/// object. Ids stay meaningful only while the storage is borrowed, which is
/// the whole lifetime of any expression that refers to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageId(usize);

impl StorageId {
    /// Identity of the object behind `storage`
    #[inline]
    pub fn of<S: ?Sized>(storage: &S) -> Self {
        StorageId(storage as *const S as *const () as usize)
    }

    /// Whether two storage identities refer to overlapping memory
    #[inline]
    pub fn overlaps(self, other: StorageId) -> bool {
        self == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        assert_eq!(StorageOrder::RowMajor.offset(1, 2, 3, 4), 6);
        assert_eq!(StorageOrder::ColumnMajor.offset(1, 2, 3, 4), 7);
    }

    #[test]
    fn test_runs_follow_order() {
        assert_eq!(StorageOrder::RowMajor.run_count(3, 4), 3);
        assert_eq!(StorageOrder::RowMajor.run_len(3, 4), 4);
        assert_eq!(StorageOrder::ColumnMajor.run_count(3, 4), 4);
        assert_eq!(StorageOrder::ColumnMajor.position(2, 1), (1, 2));
        assert_eq!(StorageOrder::RowMajor.transposed(), StorageOrder::ColumnMajor);
    }

    #[test]
    fn test_storage_identity() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0];
        assert!(StorageId::of(&a).overlaps(StorageId::of(&a)));
        assert!(!StorageId::of(&a).overlaps(StorageId::of(&b)));
    }
}
