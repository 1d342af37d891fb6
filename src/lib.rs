mod error;
mod libc_util;

pub mod cli;
pub mod group_set;
pub mod identity;
pub mod launch;
pub mod logging;
pub mod restriction;
pub mod system;
pub mod transition;

pub use error::{Errno, Error, Result};
pub use group_set::{Insertion, SupplementalGroups};
pub use identity::Identity;
pub use launch::{LaunchError, EXIT_COMMAND_NOT_FOUND, EXIT_EXEC_FAILURE};
pub use restriction::{RestrictionGroup, RestrictionMode};
pub use system::{Host, System};
pub use transition::{confine, Confined};
