fn main() {
    let args = std::env::args();

    if let Err(err) = pgincr::run(args) {
        eprintln!("pgincr error: {err}");
        std::process::exit(1);
    }
}
