#![cfg(feature = "hardware-errors")]

use checkpoint_core::error::MonitorError;
use checkpoint_core::hw_error::map_hw_error;
use checkpoint_hardware::error::HwError;
use rstest::rstest;

#[rstest]
#[case(HwError::EchoTimeout, "Timeout")]
#[case(HwError::UnknownChannel(9), "Config")]
#[case(HwError::UnknownPin(40), "Config")]
#[case(HwError::TimerAlreadyStarted, "State")]
#[case(HwError::HandlerAlreadyRegistered, "State")]
#[case(HwError::Gpio("bus fault".into()), "HardwareFault")]
fn typed_hardware_errors_map_by_kind(#[case] hw: HwError, #[case] want: &str) {
    let got = map_hw_error(&hw);
    let kind = match got {
        MonitorError::Timeout => "Timeout",
        MonitorError::Config(_) => "Config",
        MonitorError::State(_) => "State",
        MonitorError::HardwareFault(_) => "HardwareFault",
        MonitorError::Hardware(_) => "Hardware",
        MonitorError::Init(_) => "Init",
    };
    assert_eq!(kind, want, "{hw}");
}

#[test]
fn untyped_errors_fall_back_to_message() {
    let e = std::io::Error::other("sensor Timeout after 50 ms");
    assert!(matches!(map_hw_error(&e), MonitorError::Timeout));

    let e = std::io::Error::other("bus collision");
    match map_hw_error(&e) {
        MonitorError::Hardware(msg) => assert_eq!(msg, "bus collision"),
        other => panic!("expected Hardware, got {other:?}"),
    }
}
