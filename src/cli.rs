use std::ffi::OsString;
use std::path::Path;

use clap::error::ErrorKind;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::restriction::RestrictionMode;

/// Name to report in diagnostics when `argv[0]` is missing.
pub const DEFAULT_PROGRAM_NAME: &str = "no-networking";

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Print usage and exit successfully.
    Help,
    /// Run `command` (program followed by its arguments) under `mode`.
    Run {
        mode: RestrictionMode,
        command: Vec<OsString>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("no command specified to execute")]
    MissingCommand,

    #[error(transparent)]
    Clap(#[from] clap::Error),
}

/// The basename of `argv[0]`.
pub fn program_name(args: &[OsString]) -> String {
    args.first()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_PROGRAM_NAME.to_owned())
}

pub fn usage(program: &str) -> String {
    format!(
        "\
Usage: {program} [-lnp] COMMAND [ARGUMENT]...
       {program} -h
       {program} -V
       {program} --help

Options:
  -h, -V, --help
        Show this documentation and exit.
  -l    Allow connections to loopback addresses.
  -n    Forbid all connections. This is the default behavior.
  -p    Allow connections to private addresses.
"
    )
}

fn command(program: &str) -> Command {
    Command::new(DEFAULT_PROGRAM_NAME)
        .bin_name(program.to_owned())
        .override_usage(format!("{program} [-lnp] COMMAND [ARGUMENT]..."))
        .disable_help_flag(true)
        .disable_version_flag(true)
        .args_override_self(true)
        .arg(
            Arg::new("help")
                .short('h')
                .short_alias('V')
                .long("help")
                .action(ArgAction::Help),
        )
        .arg(
            Arg::new("loopback")
                .short('l')
                .action(ArgAction::SetTrue)
                .overrides_with_all(["no-networking", "private"]),
        )
        .arg(
            Arg::new("no-networking")
                .short('n')
                .action(ArgAction::SetTrue)
                .overrides_with_all(["loopback", "private"]),
        )
        .arg(
            Arg::new("private")
                .short('p')
                .action(ArgAction::SetTrue)
                .overrides_with_all(["loopback", "no-networking"]),
        )
        .arg(
            // Everything from the first operand on belongs to the command.
            Arg::new("command")
                .value_name("COMMAND")
                .num_args(1..)
                .trailing_var_arg(true)
                .value_parser(value_parser!(OsString)),
        )
}

/// Whether `--help` appears anywhere before a `--`, including among the command's arguments.
fn wants_help(args: &[OsString]) -> bool {
    args.iter()
        .skip(1)
        .take_while(|arg| arg.as_os_str() != "--")
        .any(|arg| arg.as_os_str() == "--help")
}

fn mode(matches: &ArgMatches) -> RestrictionMode {
    if matches.get_flag("loopback") {
        RestrictionMode::LoopbackOnly
    } else if matches.get_flag("private") {
        RestrictionMode::PrivateOnly
    } else {
        RestrictionMode::NoNetworking
    }
}

/// Parse a full argument vector, `argv[0]` included.
pub fn parse(args: &[OsString]) -> Result<Invocation, UsageError> {
    if wants_help(args) {
        return Ok(Invocation::Help);
    }

    // Help stops parsing where it appears, so later bad options are never reached.
    let matches = match command(&program_name(args)).try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(err) if err.kind() == ErrorKind::DisplayHelp => return Ok(Invocation::Help),
        Err(err) => return Err(err.into()),
    };

    let command: Vec<OsString> = matches
        .get_many::<OsString>("command")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    if command.is_empty() {
        return Err(UsageError::MissingCommand);
    }

    Ok(Invocation::Run {
        mode: mode(&matches),
        command,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    fn run(mode: RestrictionMode, command: &[&str]) -> Invocation {
        Invocation::Run {
            mode,
            command: argv(command),
        }
    }

    #[test]
    fn default_mode_is_no_networking() {
        let parsed = parse(&argv(&["no-networking", "curl", "example.com"])).unwrap();
        assert_eq!(
            parsed,
            run(RestrictionMode::NoNetworking, &["curl", "example.com"])
        );
    }

    #[test]
    fn last_mode_flag_wins() {
        let cases: &[(&[&str], RestrictionMode)] = &[
            (&["nn", "-l", "cmd"], RestrictionMode::LoopbackOnly),
            (&["nn", "-p", "cmd"], RestrictionMode::PrivateOnly),
            (&["nn", "-l", "-p", "cmd"], RestrictionMode::PrivateOnly),
            (&["nn", "-p", "-l", "cmd"], RestrictionMode::LoopbackOnly),
            (&["nn", "-lpn", "cmd"], RestrictionMode::NoNetworking),
            (&["nn", "-l", "-l", "cmd"], RestrictionMode::LoopbackOnly),
        ];
        for (args, expected) in cases {
            let parsed = parse(&argv(args)).unwrap();
            assert_eq!(parsed, run(*expected, &["cmd"]), "{args:?}");
        }
    }

    #[test]
    fn command_flags_are_passed_through() {
        let parsed = parse(&argv(&["nn", "-l", "ls", "-l", "-n", "/tmp"])).unwrap();
        assert_eq!(
            parsed,
            run(RestrictionMode::LoopbackOnly, &["ls", "-l", "-n", "/tmp"])
        );
    }

    #[test]
    fn double_dash_ends_options() {
        let parsed = parse(&argv(&["nn", "-p", "--", "-weird-name", "--help"])).unwrap();
        assert_eq!(
            parsed,
            run(RestrictionMode::PrivateOnly, &["-weird-name", "--help"])
        );
    }

    #[test]
    fn help_flags() {
        for args in [
            &["nn", "-h"][..],
            &["nn", "-V"],
            &["nn", "--help"],
            &["nn", "-lh"],
            &["nn", "-h", "cmd"],
            &["nn", "-hx"],
            &["nn", "-h", "-x"],
            &["nn", "-V", "--bogus"],
        ] {
            assert_eq!(parse(&argv(args)).unwrap(), Invocation::Help, "{args:?}");
        }
    }

    #[test]
    fn long_help_anywhere_before_double_dash() {
        let parsed = parse(&argv(&["nn", "ls", "--help"])).unwrap();
        assert_eq!(parsed, Invocation::Help);
    }

    #[test]
    fn missing_command_is_a_usage_error() {
        assert!(matches!(
            parse(&argv(&["nn", "-l"])),
            Err(UsageError::MissingCommand)
        ));
        assert!(matches!(
            parse(&argv(&["nn"])),
            Err(UsageError::MissingCommand)
        ));
    }

    #[test]
    fn unknown_flag_is_a_usage_error() {
        assert!(matches!(
            parse(&argv(&["nn", "-x", "cmd"])),
            Err(UsageError::Clap(_))
        ));
    }

    #[test]
    fn unknown_flag_before_help_is_a_usage_error() {
        let Err(UsageError::Clap(err)) = parse(&argv(&["nn", "-x", "-h"])) else {
            panic!("expected a usage error");
        };
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn program_name_is_basename() {
        assert_eq!(program_name(&argv(&["/usr/local/bin/nonet"])), "nonet");
        assert_eq!(program_name(&[]), DEFAULT_PROGRAM_NAME);
    }

    #[test]
    fn usage_names_the_program() {
        let text = usage("nonet");
        assert!(text.starts_with("Usage: nonet [-lnp] COMMAND [ARGUMENT]...\n"));
        assert!(text.contains("  -p    Allow connections to private addresses.\n"));
    }
}
