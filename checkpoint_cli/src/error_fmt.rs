//! Human-readable error descriptions and structured JSON error formatting.

use checkpoint_core::error::{BuildError, MonitorError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingRanger => {
                "What happened: No range finder was provided to the monitor.\nLikely causes: The ultrasonic driver failed to initialize or was not wired into the builder.\nHow to fix: Ensure the ranger is created successfully and passed via with_ranger(...).".to_string()
            }
            BuildError::MissingAnalog => {
                "What happened: No analog input was provided to the monitor.\nLikely causes: The load-cell ADC failed to initialize.\nHow to fix: Ensure the ADC driver is created successfully and passed via with_analog(...).".to_string()
            }
            BuildError::MissingIndicator | BuildError::MissingBarrierOutput => format!(
                "What happened: {be}.\nLikely causes: GPIO outputs failed to initialize or were not wired into the builder.\nHow to fix: Check the [pins] section and GPIO permissions."
            ),
            BuildError::MissingSerial | BuildError::MissingTimer => format!(
                "What happened: {be}.\nLikely causes: The serial link or periodic timer was not wired into the builder.\nHow to fix: Pass both via with_serial(...) and with_timer(...)."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/checkpoint.toml for a sample."
            ),
        };
    }

    if let Some(me) = err.downcast_ref::<MonitorError>() {
        return match me {
            MonitorError::Timeout => "What happened: A sensor read timed out.\nLikely causes: Ultrasonic sensor not wired correctly, no power, or timeout too low.\nHow to fix: Verify the trigger/echo pins and power, and consider increasing hardware.sensor_read_timeout_ms in the config.".to_string(),
            MonitorError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: Missing file, unknown keys, or out-of-range values.\nHow to fix: Edit the TOML config and try again."
            ),
            MonitorError::Init(msg) => format!(
                "What happened: Failed to initialize hardware ({msg}).\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO."
            ),
            // Fallback to generic for other domain errors
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML ({}).\nLikely causes: Syntax error, unknown key or wrong value type.\nHow to fix: Compare with etc/checkpoint.toml and fix the reported line.",
            te.message()
        );
    }

    // String-based heuristics for errors coming from init
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("open ranger pins") || lower.contains("open indicator pins") {
        return "What happened: Failed to initialize hardware pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable machine name for the error class.
pub fn error_kind(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(_) => "Config",
            _ => "Build",
        };
    }
    if let Some(me) = err.downcast_ref::<MonitorError>() {
        return match me {
            MonitorError::Hardware(_) | MonitorError::HardwareFault(_) => "Hardware",
            MonitorError::Config(_) => "Config",
            MonitorError::Timeout => "Timeout",
            MonitorError::Init(_) => "Init",
            MonitorError::State(_) => "State",
        };
    }
    if err.downcast_ref::<toml::de::Error>().is_some() {
        return "Config";
    }
    "Error"
}

/// Exit codes: 2 for configuration problems, 3 for startup/driver failures,
/// 4 for sensor timeouts, 1 for everything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match error_kind(err) {
        "Config" => 2,
        "Build" | "Init" => 3,
        "Timeout" => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "reason": error_kind(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
        "error": format!("{err:#}"),
    })
    .to_string()
}
