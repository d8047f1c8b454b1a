//! Configuration types for batch processing.
//!
//! All behaviour is controlled through [`ProcessConfig`], built via its
//! [`ProcessConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to thread the configuration through the batch loop and to log
//! exactly what a run was asked to do.
//!
//! The destructive/non-destructive decision is an explicit [`RunMode`]
//! resolved **before** any processing begins — never an interactive branch
//! inside the pipeline.

use crate::error::RubystripError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Which of the two workflows a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Rebuild each PDF image-only, overlay the furigana-filtered invisible
    /// text layer, and write the RAG JSON. Requires a font.
    FullRewrite,
    /// Only derive RAG JSON from the OCR paragraphs; original PDFs are not
    /// touched and no calibration runs. (default)
    #[default]
    TextOnly,
}

/// Configuration for one batch run.
///
/// Built via [`ProcessConfig::builder()`].
///
/// # Example
/// ```rust
/// use rubystrip::{ProcessConfig, RunMode};
///
/// let config = ProcessConfig::builder()
///     .input_dir("scans")
///     .output_dir("out")
///     .mode(RunMode::TextOnly)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ProcessConfig {
    /// Directory scanned for `*.pdf` + `*.json` pairs. Default: `.`.
    pub input_dir: PathBuf,

    /// Directory receiving rebuilt PDFs and RAG JSON files. Default:
    /// `output`. Created if absent.
    pub output_dir: PathBuf,

    /// Destructive rewrite vs. text-only extraction. Default:
    /// [`RunMode::TextOnly`].
    pub mode: RunMode,

    /// TrueType font embedded for the invisible text layer. Required in
    /// [`RunMode::FullRewrite`]; ignored otherwise.
    pub font_path: Option<PathBuf>,

    /// Logical PDF resource name for the embedded font. Default: `UserFont`.
    pub font_name: String,

    /// Per-document progress events for UIs; `None` for silent operation.
    pub progress: Option<ProgressCallback>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("output"),
            mode: RunMode::default(),
            font_path: None,
            font_name: "UserFont".to_string(),
            progress: None,
        }
    }
}

impl fmt::Debug for ProcessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("mode", &self.mode)
            .field("font_path", &self.font_path)
            .field("font_name", &self.font_name)
            .field(
                "progress",
                &self.progress.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ProcessConfig {
    /// Create a new builder for `ProcessConfig`.
    pub fn builder() -> ProcessConfigBuilder {
        ProcessConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ProcessConfig`].
#[derive(Debug)]
pub struct ProcessConfigBuilder {
    config: ProcessConfig,
}

impl ProcessConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.font_path = Some(path.into());
        self
    }

    pub fn font_name(mut self, name: impl Into<String>) -> Self {
        self.config.font_name = name.into();
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessConfig, RubystripError> {
        let c = &self.config;
        if c.mode == RunMode::FullRewrite && c.font_path.is_none() {
            return Err(RubystripError::InvalidConfig(
                "FullRewrite mode requires a font_path".into(),
            ));
        }
        if c.font_name.trim().is_empty() {
            return Err(RubystripError::InvalidConfig(
                "font_name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let config = ProcessConfig::default();
        assert_eq!(config.input_dir, PathBuf::from("."));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.mode, RunMode::TextOnly);
        assert_eq!(config.font_name, "UserFont");
    }

    #[test]
    fn full_rewrite_without_font_is_rejected() {
        let err = ProcessConfig::builder()
            .mode(RunMode::FullRewrite)
            .build()
            .unwrap_err();
        assert!(matches!(err, RubystripError::InvalidConfig(_)));
    }

    #[test]
    fn full_rewrite_with_font_builds() {
        let config = ProcessConfig::builder()
            .mode(RunMode::FullRewrite)
            .font_path("font.ttf")
            .build()
            .unwrap();
        assert_eq!(config.font_path, Some(PathBuf::from("font.ttf")));
    }
}
