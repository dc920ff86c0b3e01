use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use rowforge_exec::{ExecutionOptions, OutputMode, SequenceMode, StopPolicy};

use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    Count,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Execute,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    NewPerExecution,
    NewPerRow,
    Constant,
}

/// Run configuration read from a TOML file. Every field is optional in the
/// file; missing ones take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub stop: StopKind,
    pub target: u64,
    pub duration_secs: u64,
    pub max_threads: usize,
    pub output: OutputKind,
    pub folder: Option<PathBuf>,
    pub sequence: SequenceKind,
    pub constant_sequence: u64,
    pub seed: u64,
    pub base_query: String,
    pub log_dir: PathBuf,
    pub connection: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            stop: StopKind::Count,
            target: 100,
            duration_secs: 60,
            max_threads: 1,
            output: OutputKind::File,
            folder: Some(PathBuf::from("scripts")),
            sequence: SequenceKind::NewPerExecution,
            constant_sequence: 1,
            seed: 0,
            base_query: String::new(),
            log_dir: PathBuf::from("logs"),
            connection: None,
        }
    }
}

impl RunConfig {
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Read `path`, or fall back to the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Self::from_toml(&content)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn to_options(&self) -> ExecutionOptions {
        let stop = match self.stop {
            StopKind::Count => StopPolicy::Count {
                target: self.target,
            },
            StopKind::Duration => StopPolicy::Duration(Duration::from_secs(self.duration_secs)),
        };
        let output = match self.output {
            OutputKind::Execute => OutputMode::Execute,
            OutputKind::File => OutputMode::WriteToFile {
                folder: self.folder.clone(),
            },
        };

        ExecutionOptions {
            stop,
            max_threads: self.max_threads,
            output,
            sequence: self.sequence_mode(),
            log_dir: Some(self.log_dir.clone()),
        }
    }

    pub fn sequence_mode(&self) -> SequenceMode {
        match self.sequence {
            SequenceKind::NewPerExecution => SequenceMode::NewPerExecution,
            SequenceKind::NewPerRow => SequenceMode::NewPerRow,
            SequenceKind::Constant => SequenceMode::Constant(self.constant_sequence),
        }
    }
}
