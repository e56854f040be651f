fn main() {
    if let Err(e) = assetres_cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
