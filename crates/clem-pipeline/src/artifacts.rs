//! Output file naming.
//!
//! The output directory is keyed by date and files by time of day, so two
//! runs finishing within the same second overwrite each other's output.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDateTime};

use crate::config::AlignMode;

/// Paths written by one run, all derived from a single timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArtifacts {
    output_dir: PathBuf,
    time: String,
}

impl RunArtifacts {
    /// Artifacts for a run started at `timestamp`.
    pub fn at(working_directory: &Path, timestamp: NaiveDateTime) -> Self {
        let dir = format!("{}_clem_output", timestamp.format("%Y-%m-%d"));
        Self {
            output_dir: working_directory.join(dir),
            time: timestamp.format("%H-%M-%S").to_string(),
        }
    }

    /// Artifacts for a run starting now, in local time.
    pub fn now(working_directory: &Path) -> Self {
        Self::at(working_directory, Local::now().naive_local())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Composite image path for `mode`.
    pub fn composite_path(&self, mode: &AlignMode) -> PathBuf {
        let name = match mode {
            AlignMode::Register(method) => format!("{}-clem_registration-{}.tiff", self.time, method.metric),
            AlignMode::Transform { .. } => format!("{}-clem_transform.tiff", self.time),
        };
        self.output_dir.join(name)
    }

    /// Path of the estimated transform in register mode.
    pub fn transform_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_transform.txt", self.time))
    }

    /// Create the output directory if needed.
    pub fn create_output_dir(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create output directory {}", self.output_dir.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clem_registration::{MethodConfig, MetricKind};

    fn artifacts() -> RunArtifacts {
        let timestamp = NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(14, 7, 9))
            .unwrap();
        RunArtifacts::at(Path::new("/data/run"), timestamp)
    }

    #[test]
    fn test_names_share_one_timestamp() {
        let artifacts = artifacts();
        assert_eq!(artifacts.output_dir(), Path::new("/data/run/2024-03-05_clem_output"));
        assert_eq!(
            artifacts.transform_path(),
            Path::new("/data/run/2024-03-05_clem_output/14-07-09_transform.txt")
        );

        let register = AlignMode::Register(MethodConfig::default());
        assert_eq!(
            artifacts.composite_path(&register),
            Path::new("/data/run/2024-03-05_clem_output/14-07-09-clem_registration-correlation.tiff")
        );

        let register = AlignMode::Register(MethodConfig::new().with_metric(MetricKind::MeanSquares));
        assert!(artifacts
            .composite_path(&register)
            .ends_with("14-07-09-clem_registration-mean-squared-difference.tiff"));

        let transform = AlignMode::Transform { path: "t.txt".into() };
        assert!(artifacts.composite_path(&transform).ends_with("14-07-09-clem_transform.tiff"));
    }

    #[test]
    fn test_create_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = RunArtifacts::now(dir.path());
        artifacts.create_output_dir().unwrap();
        assert!(artifacts.output_dir().is_dir());
        // Idempotent.
        artifacts.create_output_dir().unwrap();
    }
}
