use std::ffi::{c_char, CString, OsString};
use std::os::unix::ffi::OsStrExt;
use std::ptr;

use tracing::debug;

use crate::error::Errno;
use crate::transition::Confined;

/// Exit status when the command could not be found.
pub const EXIT_COMMAND_NOT_FOUND: u8 = 127;

/// Exit status when the command was found but could not be executed.
pub const EXIT_EXEC_FAILURE: u8 = 126;

/// The reason the target command could not replace this process.
#[derive(Debug, thiserror::Error)]
#[error("{program}: {errno}")]
pub struct LaunchError {
    pub program: String,
    pub errno: Errno,
}

impl LaunchError {
    /// Whether the command does not exist, as opposed to existing but failing to execute.
    pub fn is_not_found(&self) -> bool {
        self.errno == Errno(libc::ENOENT)
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_not_found() {
            EXIT_COMMAND_NOT_FOUND
        } else {
            EXIT_EXEC_FAILURE
        }
    }
}

/// Replace the process image with `command`, searching `PATH` like `execvp(3)`.
///
/// `command[0]` is both the program and its `argv[0]`. Only returns on failure.
pub fn exec(_confined: &Confined, command: &[OsString]) -> LaunchError {
    let Some(program) = command.first() else {
        return LaunchError {
            program: String::new(),
            errno: Errno(libc::ENOENT),
        };
    };
    let program_display = program.to_string_lossy().into_owned();

    // Null-terminate the arguments.
    let Ok(args_buf) = command
        .iter()
        .map(|arg| CString::new(arg.as_bytes()))
        .collect::<Result<Vec<_>, _>>()
    else {
        return LaunchError {
            program: program_display,
            errno: Errno(libc::EINVAL),
        };
    };
    let mut args: Vec<*const c_char> = args_buf.iter().map(|a| a.as_ptr()).collect();
    args.push(ptr::null());

    debug!(program = %program_display, argc = args_buf.len(), "executing command");

    unsafe { libc::execvp(args[0], args.as_ptr()) };

    LaunchError {
        program: program_display,
        errno: Errno::last(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::restriction::RestrictionGroup;

    fn confined() -> Confined {
        Confined::assume(
            Identity::current(),
            RestrictionGroup {
                name: "no-networking",
                gid: 50,
            },
        )
    }

    #[test]
    fn missing_command_is_not_found() {
        let err = exec(
            &confined(),
            &["/nonexistent/no-networking-test-command".into()],
        );
        assert!(err.is_not_found());
        assert_eq!(err.exit_code(), EXIT_COMMAND_NOT_FOUND);
        assert_eq!(
            err.to_string(),
            "/nonexistent/no-networking-test-command: No such file or directory"
        );
    }

    #[test]
    fn missing_command_on_path_is_not_found() {
        let err = exec(&confined(), &["no-networking-test-command-on-path".into()]);
        assert_eq!(err.exit_code(), EXIT_COMMAND_NOT_FOUND);
    }

    #[test]
    fn non_executable_file_is_exec_failure() {
        // A directory is never executable, even for root.
        let err = exec(&confined(), &["/".into()]);
        assert!(!err.is_not_found());
        assert_eq!(err.exit_code(), EXIT_EXEC_FAILURE);
    }

    #[test]
    fn interior_nul_is_exec_failure() {
        let err = exec(&confined(), &["/bin/true".into(), "a\0b".into()]);
        assert_eq!(err.errno, Errno(libc::EINVAL));
        assert_eq!(err.exit_code(), EXIT_EXEC_FAILURE);
    }

    #[test]
    fn empty_command_is_not_found() {
        assert_eq!(exec(&confined(), &[]).exit_code(), EXIT_COMMAND_NOT_FOUND);
    }
}
