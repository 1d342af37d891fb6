//! The privilege transition: join the restriction group, then give up setuid/setgid privilege.
//!
//! The steps run in a fixed order and the first failure aborts the run:
//!
//! 1. capture the starting [`Identity`],
//! 2. resolve the restriction group,
//! 3. fetch the supplemental groups,
//! 4. rewrite any leaked effective GID to the real GID,
//! 5. add the restriction group,
//! 6. commit the supplemental groups,
//! 7. drop the GID, then
//! 8. drop the UID (after the GID, since dropping root first forbids the GID change),
//! 9. verify the effective IDs now equal the real ones.
//!
//! Only a successful run yields a [`Confined`], which the launcher requires.

use tracing::{debug, span, Level};

use crate::error::{Error, Result};
use crate::group_set::SupplementalGroups;
use crate::identity::Identity;
use crate::restriction::{self, RestrictionGroup, RestrictionMode};
use crate::system::System;

/// Proof that the process has joined its restriction group and holds no elevated IDs.
#[derive(Debug)]
pub struct Confined {
    identity: Identity,
    group: RestrictionGroup,
}

impl Confined {
    /// The identity the process was started with, whose real IDs it now runs as.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn group(&self) -> RestrictionGroup {
        self.group
    }

    #[cfg(test)]
    pub(crate) fn assume(identity: Identity, group: RestrictionGroup) -> Confined {
        Confined { identity, group }
    }
}

/// Run the full transition for `mode`.
pub fn confine(sys: &mut impl System, mode: RestrictionMode) -> Result<Confined> {
    let span = span!(Level::DEBUG, "confine", %mode);
    let _span_guard = span.enter();

    let identity = sys.identity();
    debug!(%identity, "captured identity");

    let group = restriction::resolve(sys, mode)?;
    debug!(group = group.name, gid = group.gid, "resolved restriction group");

    let mut groups = SupplementalGroups::current(sys)?;
    debug!(groups = ?groups.as_slice(), capacity = groups.capacity(), "fetched supplemental groups");

    // Must happen before the commit, or the leaked GID outlives the drop below.
    groups.neutralize_egid_spillover(identity.gid, identity.egid);

    let capacity = groups.capacity();
    let insertion = groups.ensure_contains(group.gid, capacity)?;
    debug!(?insertion, groups = ?groups.as_slice(), "committing supplemental groups");

    // Committed even when unchanged.
    groups.commit(sys)?;

    if identity.has_elevated_gid() {
        sys.drop_gid(identity.gid).map_err(|errno| Error::DropGid {
            gid: identity.gid,
            errno,
        })?;
        debug!(gid = identity.gid, "dropped gid");
    }

    if identity.has_elevated_uid() {
        sys.drop_uid(identity.uid).map_err(|errno| Error::DropUid {
            uid: identity.uid,
            errno,
        })?;
        debug!(uid = identity.uid, "dropped uid");
    }

    verify(sys, &identity)?;

    Ok(Confined { identity, group })
}

/// Check that the process now runs purely as the real IDs it started with.
fn verify(sys: &impl System, started: &Identity) -> Result<()> {
    let now = sys.identity();
    debug!(identity = %now, "verifying identity");

    let dropped = now.uid == started.uid
        && now.euid == started.uid
        && now.gid == started.gid
        && now.egid == started.gid;
    if !dropped {
        return Err(Error::Verification {
            uid: started.uid,
            gid: started.gid,
            euid: now.euid,
            egid: now.egid,
        });
    }
    Ok(())
}
