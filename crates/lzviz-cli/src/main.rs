#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = lzviz_cli::run_from_env() {
        eprintln!("lzviz: {error}");
        std::process::exit(error.exit_code());
    }
}
