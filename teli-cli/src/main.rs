//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = teli_cli::run() {
        eprintln!("teli: {err}");
        std::process::exit(1);
    }
}
