//! smelt entry point.

fn main() {
    if let Err(e) = smelt::cli::run_cli() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
