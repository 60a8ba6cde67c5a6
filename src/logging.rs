use log::*;

pub use log::LevelFilter::*;

/// Route `log` output to stdout as `(LEVEL) target: message`.
pub fn setup_logging(verbosity: LevelFilter) -> Result<(), String> {
    fern::Dispatch::new()
        .level(verbosity)
        .format(|out, message, record| out.finish(format_args!("({}) {}: {}", record.level(), record.target(), message)))
        .chain(std::io::stdout())
        .apply()
        .map_err(|err| format!("Logging already initialized: {}", err))?;

    debug!("[Logging] Initialized at {}", verbosity);

    Ok(())
}
