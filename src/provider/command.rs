use super::LlmClient;
use crate::error::ProviderError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout as tokio_timeout;
use tracing::debug;

/// Runs a local command, writes the prompt to its stdin and returns stdout
pub struct CommandClient {
    pub command: String,
    pub args: Vec<String>,
}

#[async_trait]
impl LlmClient for CommandClient {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, ProviderError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(ProviderError::Io)?;

        // Feed stdin while the child runs so neither side stalls on a full
        // pipe; both halves share one deadline.
        let stdin = child.stdin.take();
        let writer = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(prompt.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };

        let (written, output) = tokio_timeout(timeout, async {
            tokio::join!(writer, child.wait_with_output())
        })
        .await
        .map_err(|_| ProviderError::Timeout(timeout))?;

        let output = output.map_err(ProviderError::Io)?;
        match written {
            Ok(()) => {}
            // the child finished without reading all of its input
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                debug!(command = %self.command, "Provider closed stdin early");
            }
            Err(e) => return Err(ProviderError::Io(e)),
        }

        debug!(
            command = %self.command,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Provider command finished"
        );

        if !output.status.success() {
            return Err(ProviderError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if stdout.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn client(command: &str, args: &[&str]) -> CommandClient {
        CommandClient {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_echoes_stdin() {
        let out = client("cat", &[])
            .complete("QUALITY SCORE: 7", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out, "QUALITY SCORE: 7");
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let err = client("sh", &["-c", "echo boom >&2; exit 3"])
            .complete("", Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            ProviderError::NonZeroExit { code, stderr } => {
                assert_eq!(code, 3);
                assert!(stderr.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_output() {
        let err = client("sh", &["-c", "cat > /dev/null"])
            .complete("prompt", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_large_prompt_round_trip() {
        let prompt = "x".repeat(1 << 20);
        let out = client("cat", &[])
            .complete(&prompt, Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(out.len(), prompt.len());
    }

    #[tokio::test]
    async fn test_timeout_covers_stdin_write() {
        let start = Instant::now();
        let err = client("sleep", &["3"])
            .complete(&"x".repeat(1 << 20), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)), "got {err}");
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = client("sleep", &["5"])
            .complete("", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }
}
