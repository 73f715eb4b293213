fn main() {
    lbir::cli::run();
}
