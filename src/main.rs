fn main() {
    tobii_split::cli::run();
}
