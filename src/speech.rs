//! Best-effort local text-to-speech
//!
//! Greets the operator through `espeak` when the server starts on a local
//! machine. Hosted deployments set the `QRFORGE_HOSTED` marker (or the
//! `hosted` config flag) and skip this entirely. Failure to speak is never
//! an error; most machines simply won't have a synthesizer installed.

use std::process::{Command, Stdio};

/// Speak a phrase through the local synthesizer, if one is available.
///
/// Returns `true` when the synthesizer ran to completion.
pub fn speak(text: &str, hosted: bool) -> bool {
    if hosted {
        tracing::debug!("Hosted context, skipping local speech");
        return false;
    }

    match Command::new("espeak")
        .arg(text)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => true,
        Ok(status) => {
            tracing::debug!(code = ?status.code(), "espeak exited unsuccessfully");
            false
        }
        Err(err) => {
            tracing::debug!(error = %err, "No local speech synthesizer available");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosted_context_never_speaks() {
        assert!(!speak("welcome", true));
    }
}
