use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs the global `tracing` subscriber: INFO and above, with file and
/// line numbers.
pub fn init_logging() -> anyhow::Result<()> {
    init_logging_with_level(Level::INFO)
}

pub fn init_logging_with_level(level: Level) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
