use std::collections::TryReserveError;
use std::ffi::{c_int, CStr};

use libc::{gid_t, uid_t};

/// Result type for our error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A raw `errno` value captured right after a failing libc call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Errno(pub c_int);

impl Errno {
    /// Capture the calling thread's last OS error.
    pub fn last() -> Errno {
        Errno(unsafe { *libc::__errno_location() })
    }

    /// Reset the calling thread's errno to zero, for calls which only signal failure through it.
    pub fn clear() {
        unsafe { *libc::__errno_location() = 0 };
    }
}

impl std::fmt::Display for Errno {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        // Get the error message from errno.
        let error_msg = unsafe { libc::strerror(self.0) };
        if error_msg.is_null() {
            return write!(f, "errno {}", self.0);
        }
        let error_msg = unsafe { CStr::from_ptr(error_msg) };
        write!(f, "{}", error_msg.to_string_lossy())
    }
}

impl std::error::Error for Errno {}

/// Everything which can abort a run before the target command is launched.
///
/// The messages are meant to follow the program name on a single diagnostic line.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The restriction group has no entry in the group database.
    #[error("{group}: group does not exist")]
    GroupNotFound { group: String },

    /// The group database could not be queried.
    #[error("getgrnam_r: {group}: {errno}")]
    Lookup { group: String, errno: Errno },

    #[error("sysconf: _SC_NGROUPS_MAX: {0}")]
    CapacityQuery(Errno),

    #[error("failed to allocate supplemental group list: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("getgroups: {0}")]
    Fetch(Errno),

    /// The supplemental group list is full and does not contain the restriction group.
    #[error("maximum number of groups reached ({capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("setgroups: {0}")]
    Commit(Errno),

    #[error("setresgid: {gid}: {errno}")]
    DropGid { gid: gid_t, errno: Errno },

    #[error("setresuid: {uid}: {errno}")]
    DropUid { uid: uid_t, errno: Errno },

    /// A drop was reported as successful but the effective IDs still differ from the real ones.
    #[error(
        "privileges were not dropped: expected uid={uid} gid={gid}, \
         found euid={euid} egid={egid}"
    )]
    Verification {
        uid: uid_t,
        gid: gid_t,
        euid: uid_t,
        egid: gid_t,
    },
}

// Define a macro, bail_errno!, which returns the last OS error from a low-level wrapper.
macro_rules! bail_errno {
    () => {
        return Err($crate::error::Errno::last())
    };
}
pub(crate) use bail_errno;
