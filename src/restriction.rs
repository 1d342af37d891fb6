use std::ffi::CString;

use libc::gid_t;

use crate::error::{Error, Result};
use crate::system::System;

/// Group whose members may not open any network connection.
pub const NO_NETWORKING_GROUP: &str = match option_env!("NO_NETWORKING_GROUP") {
    Some(name) => name,
    None => "no-networking",
};

/// Group whose members may only connect to loopback addresses.
pub const LOOPBACK_NETWORKING_GROUP: &str = match option_env!("LOOPBACK_NETWORKING_GROUP") {
    Some(name) => name,
    None => "loopback-networking",
};

/// Group whose members may only connect to private addresses.
pub const PRIVATE_NETWORKING_GROUP: &str = match option_env!("PRIVATE_NETWORKING_GROUP") {
    Some(name) => name,
    None => "private-networking",
};

/// How much network access the launched command keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestrictionMode {
    /// Block all network access.
    #[default]
    NoNetworking,
    /// Allow connections to loopback addresses.
    LoopbackOnly,
    /// Allow connections to private addresses.
    PrivateOnly,
}

impl RestrictionMode {
    pub const ALL: [RestrictionMode; 3] = [
        RestrictionMode::NoNetworking,
        RestrictionMode::LoopbackOnly,
        RestrictionMode::PrivateOnly,
    ];

    /// The name of the group which the administrator has bound to this mode's policy.
    pub fn group_name(self) -> &'static str {
        match self {
            RestrictionMode::NoNetworking => NO_NETWORKING_GROUP,
            RestrictionMode::LoopbackOnly => LOOPBACK_NETWORKING_GROUP,
            RestrictionMode::PrivateOnly => PRIVATE_NETWORKING_GROUP,
        }
    }
}

impl std::fmt::Display for RestrictionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(match self {
            RestrictionMode::NoNetworking => "no-networking",
            RestrictionMode::LoopbackOnly => "loopback-only",
            RestrictionMode::PrivateOnly => "private-only",
        })
    }
}

/// A restriction group resolved from the group database for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestrictionGroup {
    pub name: &'static str,
    pub gid: gid_t,
}

/// Resolve the group for `mode` through the group database.
pub fn resolve(sys: &impl System, mode: RestrictionMode) -> Result<RestrictionGroup> {
    lookup(sys, mode.group_name())
}

fn lookup(sys: &impl System, name: &'static str) -> Result<RestrictionGroup> {
    // No group database entry can hold a NUL.
    let Ok(c_name) = CString::new(name) else {
        return Err(Error::GroupNotFound {
            group: name.to_owned(),
        });
    };

    match sys.group_by_name(&c_name) {
        Ok(Some(gid)) => Ok(RestrictionGroup { name, gid }),
        Ok(None) => Err(Error::GroupNotFound {
            group: name.to_owned(),
        }),
        Err(errno) => Err(Error::Lookup {
            group: name.to_owned(),
            errno,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Errno;
    use crate::system::fake::FakeSystem;

    #[test]
    fn every_mode_has_a_distinct_group() {
        let names: Vec<_> = RestrictionMode::ALL.iter().map(|m| m.group_name()).collect();
        for (i, name) in names.iter().enumerate() {
            assert!(!name.is_empty());
            assert!(!names[i + 1..].contains(name), "{name} bound to two modes");
        }
    }

    #[test]
    fn default_mode_forbids_all_networking() {
        assert_eq!(RestrictionMode::default(), RestrictionMode::NoNetworking);
    }

    #[test]
    fn resolves_each_mode() {
        let sys = FakeSystem::plain(1000, 1000)
            .with_group(NO_NETWORKING_GROUP, 50)
            .with_group(LOOPBACK_NETWORKING_GROUP, 51)
            .with_group(PRIVATE_NETWORKING_GROUP, 52);

        let group = resolve(&sys, RestrictionMode::LoopbackOnly).unwrap();
        assert_eq!(
            group,
            RestrictionGroup {
                name: LOOPBACK_NETWORKING_GROUP,
                gid: 51
            }
        );
        assert_eq!(resolve(&sys, RestrictionMode::PrivateOnly).unwrap().gid, 52);
        assert_eq!(resolve(&sys, RestrictionMode::NoNetworking).unwrap().gid, 50);
    }

    #[test]
    fn missing_group_is_not_found() {
        let sys = FakeSystem::plain(1000, 1000);
        let err = resolve(&sys, RestrictionMode::NoNetworking).unwrap_err();
        assert!(matches!(err, Error::GroupNotFound { ref group } if group == NO_NETWORKING_GROUP));
    }

    #[test]
    fn name_with_nul_is_not_found() {
        let sys = FakeSystem::plain(1000, 1000).with_group("no", 50);
        let err = lookup(&sys, "no\0networking").unwrap_err();
        assert!(matches!(err, Error::GroupNotFound { ref group } if group == "no\0networking"));
    }

    #[test]
    fn database_failure_is_a_lookup_error() {
        let mut sys = FakeSystem::plain(1000, 1000).with_group(NO_NETWORKING_GROUP, 50);
        sys.lookup_errno = Some(Errno(libc::EMFILE));
        let err = resolve(&sys, RestrictionMode::NoNetworking).unwrap_err();
        assert!(matches!(
            err,
            Error::Lookup {
                errno: Errno(libc::EMFILE),
                ..
            }
        ));
    }
}
