use sfetch_core::logging;

mod cli;

fn main() {
    // Initialize logging as early as possible; fall back to stderr when the
    // state dir is unavailable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = cli::run_from_args() {
        eprintln!("sfetch error: {:#}", err);
        std::process::exit(1);
    }
}
