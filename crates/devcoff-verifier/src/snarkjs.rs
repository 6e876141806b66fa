use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{Result, VerifierError};
use crate::ProofVerifier;

#[derive(Clone, Debug)]
pub struct SnarkjsConfig {
    /// Executable to run, `snarkjs` unless overridden.
    pub program: String,
    /// Arguments placed before `groth16 verify ...`, e.g. a script path when `program` is `node`.
    pub args: Vec<String>,
    pub verification_key: PathBuf,
    /// Directory that holds the per-call proof and public output files.
    pub scratch_dir: PathBuf,
    pub timeout: Duration,
}

impl Default for SnarkjsConfig {
    fn default() -> Self {
        Self {
            program: "snarkjs".to_string(),
            args: Vec::new(),
            verification_key: PathBuf::from("public/verification_key.json"),
            scratch_dir: std::env::temp_dir(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
pub struct SnarkjsVerifier {
    config: SnarkjsConfig,
}

impl SnarkjsVerifier {
    pub fn new(config: SnarkjsConfig) -> Self {
        Self { config }
    }

    /// Write `value` as JSON into a uniquely named file; the file is removed when dropped.
    async fn write_artifact(&self, prefix: &'static str, value: &Value) -> Result<NamedTempFile> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| VerifierError::SerializationError(e.to_string()))?;
        let scratch_dir = self.config.scratch_dir.clone();
        tokio::task::spawn_blocking(move || {
            let mut file = tempfile::Builder::new()
                .prefix(prefix)
                .suffix(".json")
                .rand_bytes(16)
                .tempfile_in(scratch_dir)?;
            file.write_all(&bytes)?;
            file.flush()?;
            Ok::<_, std::io::Error>(file)
        })
        .await
        .map_err(|e| VerifierError::ScratchError(e.to_string()))?
        .map_err(|e| VerifierError::ScratchError(e.to_string()))
    }

    fn command(&self, public_path: &Path, proof_path: &Path) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .arg("groth16")
            .arg("verify")
            .arg(&self.config.verification_key)
            .arg(public_path)
            .arg(proof_path)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl ProofVerifier for SnarkjsVerifier {
    async fn verify(&self, proof: &Value, public_output: &Value) -> Result<bool> {
        let public_file = self.write_artifact("public-", public_output).await?;
        let proof_file = self.write_artifact("proof-", proof).await?;

        let output = timeout(
            self.config.timeout,
            self.command(public_file.path(), proof_file.path()).output(),
        )
        .await
        .map_err(|_| {
            tracing::warn!(timeout = ?self.config.timeout, "snarkjs verification timed out");
            VerifierError::Timeout(self.config.timeout)
        })?
        .map_err(|e| VerifierError::ExecutionFailed(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            public_file.close()?;
            proof_file.close()
        })
        .await
        .map_err(|e| VerifierError::ScratchError(e.to_string()))?
        .map_err(|e| VerifierError::ScratchError(e.to_string()))?;

        if !output.status.success() {
            tracing::debug!(
                status = ?output.status,
                stdout = %String::from_utf8_lossy(&output.stdout),
                stderr = %String::from_utf8_lossy(&output.stderr),
                "snarkjs rejected proof"
            );
        }
        Ok(output.status.success())
    }
}
