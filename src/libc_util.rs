use std::ffi::{c_char, c_int, c_long, CStr};
use std::mem;
use std::ptr;

use libc::{gid_t, uid_t};

use crate::error::{bail_errno, Errno};

/// Fallback buffer size for `getgrnam_r(3)` when `_SC_GETGR_R_SIZE_MAX` is indeterminate.
const GETGR_BUF_DEFAULT: usize = 1024;

/// Largest buffer we'll grow to before giving up on a group entry.
const GETGR_BUF_MAX: usize = 1024 * 1024;

/// Query a system limit. Returns `None` if the limit is indeterminate.
pub fn sysconf(name: c_int) -> Result<Option<c_long>, Errno> {
    // sysconf(3) returns -1 both for "no limit" and for errors; only errno tells them apart.
    Errno::clear();
    let value = unsafe { libc::sysconf(name) };
    if value == -1 {
        return match Errno::last() {
            Errno(0) => Ok(None),
            errno => Err(errno),
        };
    }
    Ok(Some(value))
}

/// Read the calling process's supplemental groups into `buf`, returning how many were written.
pub fn getgroups(buf: &mut [gid_t]) -> Result<usize, Errno> {
    let len = c_int::try_from(buf.len()).unwrap_or(c_int::MAX);
    let count @ 0.. = (unsafe { libc::getgroups(len, buf.as_mut_ptr()) }) else {
        bail_errno!();
    };
    Ok(count as usize)
}

/// Replace the calling process's supplemental groups.
pub fn setgroups(groups: &[gid_t]) -> Result<(), Errno> {
    let 0 = (unsafe { libc::setgroups(groups.len(), groups.as_ptr()) }) else {
        bail_errno!();
    };
    Ok(())
}

/// Set the real, effective, and saved group IDs to `gid`.
pub fn setresgid(gid: gid_t) -> Result<(), Errno> {
    let 0 = (unsafe { libc::setresgid(gid, gid, gid) }) else {
        bail_errno!();
    };
    Ok(())
}

/// Set the real, effective, and saved user IDs to `uid`.
pub fn setresuid(uid: uid_t) -> Result<(), Errno> {
    let 0 = (unsafe { libc::setresuid(uid, uid, uid) }) else {
        bail_errno!();
    };
    Ok(())
}

/// Look up a group's numeric ID by name with `getgrnam_r(3)`.
///
/// Returns `Ok(None)` if the group database has no entry for `name`.
pub fn group_id_by_name(name: &CStr) -> Result<Option<gid_t>, Errno> {
    let mut buf_len = match sysconf(libc::_SC_GETGR_R_SIZE_MAX) {
        Ok(Some(len)) if len > 0 => len as usize,
        _ => GETGR_BUF_DEFAULT,
    };

    loop {
        let mut buf: Vec<c_char> = vec![0; buf_len];
        let mut group = mem::MaybeUninit::<libc::group>::uninit();
        let mut result: *mut libc::group = ptr::null_mut();

        let rc = unsafe {
            libc::getgrnam_r(
                name.as_ptr(),
                group.as_mut_ptr(),
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };

        match rc {
            0 if result.is_null() => return Ok(None),
            0 => return Ok(Some(unsafe { (*result).gr_gid })),
            // Some NSS backends report a missing entry this way.
            libc::ENOENT => return Ok(None),
            libc::ERANGE if buf_len < GETGR_BUF_MAX => buf_len *= 2,
            errno => return Err(Errno(errno)),
        }
    }
}
