fn main() {
    if let Err(err) = basket_builder::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
