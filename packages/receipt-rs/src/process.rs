//! Running external tools to completion and collecting their output.
use tokio::process::Command;
use tracing::debug;

use crate::error::{ReceiptError, Result};

fn describe(cmd: &Command) -> String {
    let std = cmd.as_std();
    let mut parts = vec![std.get_program().to_string_lossy().into_owned()];
    parts.extend(std.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Runs `cmd`, returning stdout followed by stderr. A non-zero exit status
/// becomes [`ReceiptError::Process`] carrying the same combined output.
pub async fn run(cmd: &mut Command) -> Result<String> {
    let command = describe(cmd);
    debug!(%command, "running");

    let output = cmd.output().await.map_err(|e| ReceiptError::Process {
        command: command.clone(),
        output: format!("failed to start: {}", e),
    })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(ReceiptError::Process {
            command,
            output: combined,
        });
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program() {
        let mut cmd = Command::new("receipt-rs-no-such-program");
        cmd.arg("--flag");
        match run(&mut cmd).await {
            Err(ReceiptError::Process { command, output }) => {
                assert_eq!(command, "receipt-rs-no-such-program --flag");
                assert!(output.starts_with("failed to start"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_collects_output_and_status() {
        let mut ok = Command::new("sh");
        ok.args(["-c", "echo out; echo err >&2"]);
        assert_eq!(run(&mut ok).await.unwrap(), "out\nerr\n");

        let mut bad = Command::new("sh");
        bad.args(["-c", "echo boom; exit 3"]);
        match run(&mut bad).await {
            Err(ReceiptError::Process { output, .. }) => assert_eq!(output, "boom\n"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
