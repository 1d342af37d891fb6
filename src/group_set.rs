use libc::gid_t;

use crate::error::{Error, Result};
use crate::system::System;

/// The process's supplemental groups, read from the kernel and staged for writing back.
///
/// The list never grows past the `NGROUPS_MAX` capacity it was fetched with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplementalGroups {
    gids: Vec<gid_t>,
    capacity: usize,
}

/// Outcome of [`SupplementalGroups::ensure_contains`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    AlreadyPresent,
    Appended,
}

impl SupplementalGroups {
    /// Build a group list directly, with room for at most `capacity` entries.
    pub fn new(gids: Vec<gid_t>, capacity: usize) -> SupplementalGroups {
        SupplementalGroups { gids, capacity }
    }

    /// Fetch the calling process's supplemental groups.
    pub fn current(sys: &impl System) -> Result<SupplementalGroups> {
        let capacity = sys.ngroups_max().map_err(Error::CapacityQuery)?;

        // Reserve the whole capacity up front so a later append never reallocates.
        let mut gids = Vec::new();
        gids.try_reserve_exact(capacity)?;
        gids.resize(capacity, 0);

        let count = sys.getgroups(&mut gids).map_err(Error::Fetch)?;
        gids.truncate(count);

        Ok(SupplementalGroups { gids, capacity })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[gid_t] {
        &self.gids
    }

    pub fn contains(&self, gid: gid_t) -> bool {
        self.gids.contains(&gid)
    }

    /// Rewrite every occurrence of `effective_gid` to `real_gid`, if the two differ.
    ///
    /// Whether `getgroups(2)` reports the effective GID is unspecified. Under setgid the
    /// effective GID is the privileged one, and supplemental groups survive the later drop,
    /// so it must not be written back. Entries are rewritten in place rather than removed;
    /// `setgroups(2)` accepts duplicates.
    pub fn neutralize_egid_spillover(&mut self, real_gid: gid_t, effective_gid: gid_t) {
        if real_gid == effective_gid {
            return;
        }
        for gid in self.gids.iter_mut().filter(|gid| **gid == effective_gid) {
            *gid = real_gid;
        }
    }

    /// Append `target_gid` unless it is already present.
    pub fn ensure_contains(&mut self, target_gid: gid_t, capacity: usize) -> Result<Insertion> {
        if self.contains(target_gid) {
            return Ok(Insertion::AlreadyPresent);
        }
        if self.gids.len() >= capacity {
            return Err(Error::CapacityExceeded { capacity });
        }
        self.gids.push(target_gid);
        Ok(Insertion::Appended)
    }

    /// Install this list as the process's supplemental groups.
    pub fn commit(self, sys: &mut impl System) -> Result<()> {
        sys.setgroups(&self.gids).map_err(Error::Commit)
    }
}
