//! Work partitioning for the 2-D histogram dispatch.
//!
//! Axis order is (rows, columns): `get_global_id(0)` is the row and
//! `get_global_id(1)` the column in the kernel. Extents are padded up to
//! whole workgroups; work-items mapped past the image bounds perform no
//! accumulation.

/// Minimum effective row extent for a dispatch.
const MIN_ROWS: usize = 3;

/// Minimum effective column extent. Guarantees each dispatch has enough
/// work-items available for the cooperative 256-bin local-histogram clear
/// and merge loops even on very narrow images.
const MIN_COLS: usize = 256;

/// How an image is split into workgroups for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPartition {
    /// Work-items per group along each axis (rows, columns).
    pub local: [usize; 2],
    /// Number of groups along each axis.
    pub groups: [usize; 2],
    /// Padded global extent: `groups * local` per axis.
    pub global: [usize; 2],
}

impl WorkPartition {
    /// Partition a `width` x `height` image into square workgroups of
    /// `group_dim` work-items per edge, padding each axis up to a whole
    /// number of groups.
    ///
    /// Pure integer arithmetic, no failure modes; `group_dim` must be
    /// positive.
    pub fn for_image(width: u32, height: u32, group_dim: usize) -> Self {
        debug_assert!(group_dim > 0);
        let local = [group_dim, group_dim];
        let rows = (height as usize).max(MIN_ROWS);
        let cols = (width as usize).max(MIN_COLS);
        let groups = [rows.div_ceil(group_dim), cols.div_ceil(group_dim)];
        let global = [groups[0] * local[0], groups[1] * local[1]];
        Self {
            local,
            groups,
            global,
        }
    }

    /// Total work-items in the dispatch, padding included.
    pub fn total_items(&self) -> usize {
        self.global[0] * self.global[1]
    }

    /// Total number of workgroups.
    pub fn group_count(&self) -> usize {
        self.groups[0] * self.groups[1]
    }
}
