use std::ffi::CStr;

use libc::{gid_t, uid_t};

use crate::error::Errno;
use crate::identity::Identity;
use crate::libc_util;

/// The process credentials and group database, as seen by the privilege transition.
///
/// Every call is a plain blocking system call; nothing here retries.
pub trait System {
    /// Read the current real and effective IDs.
    fn identity(&self) -> Identity;

    /// Look up a group by name. `Ok(None)` means the database has no such group.
    fn group_by_name(&self, name: &CStr) -> Result<Option<gid_t>, Errno>;

    /// The maximum number of supplemental groups a process may hold.
    fn ngroups_max(&self) -> Result<usize, Errno>;

    /// Read the supplemental groups into `buf`, returning how many were written.
    fn getgroups(&self, buf: &mut [gid_t]) -> Result<usize, Errno>;

    /// Replace the supplemental groups.
    fn setgroups(&mut self, groups: &[gid_t]) -> Result<(), Errno>;

    /// Set the real, effective, and saved group IDs to `gid`.
    fn drop_gid(&mut self, gid: gid_t) -> Result<(), Errno>;

    /// Set the real, effective, and saved user IDs to `uid`.
    fn drop_uid(&mut self, uid: uid_t) -> Result<(), Errno>;
}

/// The running process.
#[derive(Debug, Default)]
pub struct Host;

impl System for Host {
    fn identity(&self) -> Identity {
        Identity::current()
    }

    fn group_by_name(&self, name: &CStr) -> Result<Option<gid_t>, Errno> {
        libc_util::group_id_by_name(name)
    }

    fn ngroups_max(&self) -> Result<usize, Errno> {
        match libc_util::sysconf(libc::_SC_NGROUPS_MAX)? {
            Some(max) => usize::try_from(max).map_err(|_| Errno(libc::EOVERFLOW)),
            None => Err(Errno(libc::EINVAL)),
        }
    }

    fn getgroups(&self, buf: &mut [gid_t]) -> Result<usize, Errno> {
        libc_util::getgroups(buf)
    }

    fn setgroups(&mut self, groups: &[gid_t]) -> Result<(), Errno> {
        libc_util::setgroups(groups)
    }

    fn drop_gid(&mut self, gid: gid_t) -> Result<(), Errno> {
        libc_util::setresgid(gid)
    }

    fn drop_uid(&mut self, uid: uid_t) -> Result<(), Errno> {
        libc_util::setresuid(uid)
    }
}
