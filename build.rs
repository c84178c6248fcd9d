fn main() {
    // Only on-device builds need the ESP-IDF environment propagated;
    // host builds (tests, simulation) have nothing to do here.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
