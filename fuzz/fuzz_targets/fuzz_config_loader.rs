#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and validation must reject bad input with an error, never a panic.
    if let Ok(cfg) = checkpoint_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A valid config must also be accepted by the runtime conversions
            let _: checkpoint_core::RangingCfg = (&cfg.ranging).into();
            let _: checkpoint_core::WeighingCfg = (&cfg.weighing).into();
            let _: checkpoint_core::PinCfg = (&cfg.pins).into();
        }
    }
});
