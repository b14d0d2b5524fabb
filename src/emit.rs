//! Compile the contract and write `approval.teal` / `clear.teal`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::compile::{compile_teal, Mode};
use crate::contract;
use crate::error::{Error, Result};

/// Version the contract is compiled for
pub const TEAL_VERSION: u64 = 5;

/// Where and how to emit
#[derive(Debug, Clone)]
pub struct EmitConfig {
    pub out_dir: PathBuf,
    pub approval_file: String,
    pub clear_file: String,
    pub version: u64,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            approval_file: "approval.teal".to_string(),
            clear_file: "clear.teal".to_string(),
            version: TEAL_VERSION,
        }
    }
}

impl EmitConfig {
    pub fn out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn approval_path(&self) -> PathBuf {
        self.out_dir.join(&self.approval_file)
    }

    pub fn clear_path(&self) -> PathBuf {
        self.out_dir.join(&self.clear_file)
    }
}

/// Compiled approval and clear-state programs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub approval: String,
    pub clear: String,
}

impl Artifacts {
    pub fn compile(version: u64) -> Result<Self> {
        Ok(Self {
            approval: compile_teal(&contract::approval(), Mode::Application, version)?,
            clear: compile_teal(&contract::clear(), Mode::Application, version)?,
        })
    }
}

/// Paths written by [`emit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitReport {
    pub approval: PathBuf,
    pub clear: PathBuf,
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Remove `path` if it exists
fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale output");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(path)(e)),
    }
}

fn write_program(path: &Path, teal: &str) -> Result<()> {
    fs::write(path, teal).map_err(io_err(path))?;
    info!(path = %path.display(), bytes = teal.len(), "wrote program");
    Ok(())
}

/// Compile both programs and write them, replacing any previous output.
///
/// Both paths are cleared before anything is compiled, so a compile failure
/// leaves no stale program behind.
pub fn emit(config: &EmitConfig) -> Result<EmitReport> {
    let approval = config.approval_path();
    let clear = config.clear_path();

    remove_stale(&approval)?;
    remove_stale(&clear)?;

    let artifacts = Artifacts::compile(config.version)?;

    write_program(&approval, &artifacts.approval)?;
    write_program(&clear, &artifacts.clear)?;

    Ok(EmitReport { approval, clear })
}
