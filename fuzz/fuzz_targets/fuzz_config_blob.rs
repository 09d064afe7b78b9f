//! Fuzz target: persisted configuration blob
//!
//! Feeds arbitrary bytes into the simulated NVS slot and loads them.  A
//! load either fails cleanly or yields a configuration that passes
//! validation; `load_or_default` always yields a valid one.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use floower::adapters::nvs::NvsAdapter;
use floower::app::ports::ConfigPort;
use floower::config;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(nvs) = NvsAdapter::new() else {
        return;
    };
    nvs.sim_set_raw(data);

    if let Ok(cfg) = nvs.load() {
        assert!(config::validate(&cfg).is_ok());
    }
    assert!(config::validate(&nvs.load_or_default()).is_ok());
});
