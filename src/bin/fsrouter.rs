fn main() {
    if let Err(err) = fsrouter::cli::run_cli() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
