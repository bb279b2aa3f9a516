fn main() {
    // Host builds (tests) have no ESP-IDF environment to propagate
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
