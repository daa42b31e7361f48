/// Initialize the logger with the specified verbosity level
///
/// `RUST_LOG` takes precedence over the verbosity-derived filter. Calling this
/// more than once is harmless; later calls leave the first logger in place.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=warn, 1=info, 2=debug, 3+=trace)
pub fn setup_logger(verbose: u8) {
    let env_filter = filter_for_verbosity(verbose);

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(env_filter))
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .try_init();
}

fn filter_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "semaphore_emulator=warn",
        1 => "semaphore_emulator=info",
        2 => "semaphore_emulator=debug",
        _ => "semaphore_emulator=trace",
    }
}
