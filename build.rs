fn main() {
    // ESP-IDF link arguments are only needed for the firmware binary; host
    // test builds run with `--no-default-features` and skip embuild.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
