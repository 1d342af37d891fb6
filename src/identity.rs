use libc::{gid_t, uid_t};

/// The real and effective user and group IDs of the process at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub uid: uid_t,
    pub euid: uid_t,
    pub gid: gid_t,
    pub egid: gid_t,
}

impl Identity {
    /// Read the calling process's IDs.
    pub fn current() -> Identity {
        unsafe {
            Identity {
                uid: libc::getuid(),
                euid: libc::geteuid(),
                gid: libc::getgid(),
                egid: libc::getegid(),
            }
        }
    }

    /// Whether the effective user ID differs from the real one, as under a setuid binary.
    pub fn has_elevated_uid(&self) -> bool {
        self.uid != self.euid
    }

    /// Whether the effective group ID differs from the real one, as under a setgid binary.
    pub fn has_elevated_gid(&self) -> bool {
        self.gid != self.egid
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "uid={} euid={} gid={} egid={}",
            self.uid, self.euid, self.gid, self.egid
        )
    }
}
