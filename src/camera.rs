use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::SystemTime,
};

use crate::{Error, Result};

/// Still-image capture at a `WxH` resolution.
pub trait Camera: Send + Sync {
    fn capture(&self, resolution: &str) -> Result<PathBuf>;
}

/// Captures through `fswebcam`, writing to a fixed "latest" path.
#[derive(Debug, Clone)]
pub struct Fswebcam {
    program: String,
    output: PathBuf,
}

impl Fswebcam {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            program: "fswebcam".into(),
            output: output.into(),
        }
    }

    /// Override the capture program (used to point at a stub in tests).
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }
}

impl Camera for Fswebcam {
    fn capture(&self, resolution: &str) -> Result<PathBuf> {
        parse_resolution(resolution)?;
        if let Some(parent) = self.output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let status = Command::new(&self.program)
            .arg("-r")
            .arg(resolution)
            .arg(&self.output)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::Hardware(format!("failed to run {}: {e}", self.program)))?;
        if !status.success() {
            return Err(Error::Hardware(format!(
                "{} exited with {status}",
                self.program
            )));
        }
        Ok(self.output.clone())
    }
}

/// Validate a `WxH` resolution string.
pub fn parse_resolution(raw: &str) -> Result<(u32, u32)> {
    let invalid = || Error::InvalidArgs(format!("resolution must look like 1280x720, got '{raw}'"));
    let (w, h) = raw.split_once('x').ok_or_else(invalid)?;
    let w: u32 = w.parse().map_err(|_| invalid())?;
    let h: u32 = h.parse().map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok((w, h))
}

/// Copy the latest picture into `archive_dir` under an RFC3339 timestamp name.
pub fn archive_picture(latest: &Path, archive_dir: &Path, taken_at: SystemTime) -> Result<PathBuf> {
    fs::create_dir_all(archive_dir)?;
    let stamp = humantime::format_rfc3339_seconds(taken_at).to_string();
    let name = format!("{}.jpg", stamp.trim_end_matches('Z'));
    let dest = archive_dir.join(name);
    fs::copy(latest, &dest)?;
    Ok(dest)
}
