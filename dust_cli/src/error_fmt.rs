//! Human-readable error descriptions and structured JSON error formatting.

use dust_core::DustError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(de) = err.downcast_ref::<DustError>() {
        return match de {
            DustError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file (see etc/dust_config.toml), then rerun."
            ),
            DustError::Hardware(msg) => format!(
                "What happened: Could not open the sensor pin ({msg}).\nLikely causes: Wrong [sensor].pin, missing GPIO permissions, or a build without the `hardware` feature.\nHow to fix: Check the wiring and pin number, run with access to /dev/gpiomem, or pass --simulate."
            ),
            DustError::Store(msg) => format!(
                "What happened: Writing the sample store failed ({msg}).\nLikely causes: Read-only filesystem, full disk, or a directory in place of the file.\nHow to fix: Check [store].path and its permissions."
            ),
            DustError::Sampler(msg) => format!(
                "What happened: The sensor stopped delivering readings ({msg}).\nLikely causes: Intermittent wiring or sampling.on_read_error = \"stop\".\nHow to fix: Check the sensor connection; consider on_read_error = \"hold_last\"."
            ),
            DustError::Io(msg) => format!(
                "What happened: I/O error ({msg}).\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per error class; anything unclassified returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<DustError>() {
        Some(DustError::Config(_)) => 2,
        Some(DustError::Hardware(_)) => 3,
        Some(DustError::Store(_)) => 4,
        Some(DustError::Sampler(_)) => 5,
        Some(DustError::Io(_)) | None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<DustError>() {
        Some(DustError::Config(_)) => "Config",
        Some(DustError::Hardware(_)) => "Hardware",
        Some(DustError::Store(_)) => "Store",
        Some(DustError::Sampler(_)) => "Sampler",
        Some(DustError::Io(_)) => "Io",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "message": humanize(err),
        "exit_code": exit_code_for_error(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_with_two() {
        let err: eyre::Report = DustError::Config("sampling.queue_capacity must be >= 1".into()).into();
        assert_eq!(exit_code_for_error(&err), 2);
        assert!(humanize(&err).contains("queue_capacity"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Config");
        assert_eq!(v["exit_code"], 2);
    }

    #[test]
    fn hardware_errors_mention_the_pin() {
        let err: eyre::Report = DustError::Hardware("no gpio".into()).into();
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("sensor pin"));
    }

    #[test]
    fn untyped_errors_fall_back() {
        let err = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).contains("boom"));
        assert!(format_error_json(&err).contains("\"reason\":\"Error\""));
    }
}
