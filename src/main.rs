fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    if let Err(e) = techhire_lib::run() {
        eprintln!("Error running interview: {:#}", e);
        std::process::exit(1);
    }
}
