use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::Uptime;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Warnings and above are shown by default; `RUST_LOG=debug` traces each step of the
/// transition. Output goes to stderr so the launched command's stdout stays clean.
pub fn configure() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(Uptime::default())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
