fn main() {
    // ESP-IDF environment (linker args, sdkconfig) is only needed for the
    // device build; host test builds have nothing to emit.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
