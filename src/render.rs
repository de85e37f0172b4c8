// src/render.rs
//! Writes the merged resume to disk and hands it to RenderCV

use anyhow::Context;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempPath;

use crate::app_log;
use crate::config::CustomizerConfig;
use crate::error::CustomizeError;
use crate::fs_ops::FsOps;
use crate::types::Resume;

const ARTIFACT_EXTENSION: &str = "pdf";
const TEMP_PREFIX: &str = "resume-customizer-";
const TEMP_SUFFIX: &str = ".yaml";
const PREVIOUS_SUFFIX: &str = ".previous";

#[derive(Debug)]
pub struct RenderOutcome {
    pub artifact: PathBuf,
    /// Set when the intermediate YAML was retained.
    pub intermediate: Option<PathBuf>,
    pub renderer_output: String,
}

enum Intermediate {
    Temporary(TempPath),
    Named(PathBuf),
}

impl Intermediate {
    fn path(&self) -> &Path {
        match self {
            Self::Temporary(path) => &**path,
            Self::Named(path) => path.as_path(),
        }
    }

    fn retain(self) -> Result<PathBuf, CustomizeError> {
        match self {
            Self::Temporary(path) => path
                .keep()
                .map_err(|e| CustomizeError::Io(anyhow::Error::new(e.error))),
            Self::Named(path) => Ok(path),
        }
    }

    async fn discard(self) -> Result<(), CustomizeError> {
        match self {
            Self::Temporary(path) => match path.close() {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(CustomizeError::Io(anyhow::Error::new(e))),
            },
            Self::Named(path) => FsOps::remove_file_if_exists(&path)
                .await
                .map(|_| ())
                .map_err(CustomizeError::Io),
        }
    }
}

/// `<stem>.pdf`, unless the stem already ends in `.pdf`.
pub fn artifact_path(output_stem: &Path) -> PathBuf {
    let has_extension = output_stem
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ARTIFACT_EXTENSION));
    if has_extension {
        return output_stem.to_path_buf();
    }

    let mut path = output_stem.as_os_str().to_owned();
    path.push(".");
    path.push(ARTIFACT_EXTENSION);
    PathBuf::from(path)
}

pub struct RendererInvoker<'a> {
    config: &'a CustomizerConfig,
}

impl<'a> RendererInvoker<'a> {
    pub fn new(config: &'a CustomizerConfig) -> Self {
        Self { config }
    }

    /// Render `resume` to `<output_stem>.pdf`.
    ///
    /// On failure the intermediate YAML is always kept for inspection, any
    /// artifact this run created is removed and a previous artifact is restored.
    pub async fn render(
        &self,
        resume: &Resume,
        output_stem: &Path,
    ) -> Result<RenderOutcome, CustomizeError> {
        let artifact = absolute(&artifact_path(output_stem))?;
        let intermediate = self.create_intermediate()?;

        FsOps::write_file_safe(intermediate.path(), resume.as_yaml())
            .await
            .map_err(CustomizeError::Io)?;
        app_log!(
            info,
            "Wrote intermediate resume to {}",
            intermediate.path().display()
        );

        if let Some(parent) = artifact.parent() {
            FsOps::ensure_dir_exists(parent)
                .await
                .map_err(CustomizeError::Io)?;
        }
        let previous = set_aside(&artifact).await?;

        match self.run_renderer(intermediate.path(), &artifact) {
            Ok(renderer_output) => {
                if let Some(previous) = &previous {
                    if let Err(e) = FsOps::remove_file_if_exists(previous).await {
                        app_log!(warn, "Failed to remove previous artifact: {:#}", e);
                    }
                }
                let intermediate = if self.config.retains_intermediate() {
                    Some(intermediate.retain()?)
                } else {
                    intermediate.discard().await?;
                    None
                };

                app_log!(info, "Rendered {}", artifact.display());
                Ok(RenderOutcome {
                    artifact,
                    intermediate,
                    renderer_output,
                })
            }
            Err(err) => {
                if let Err(e) = FsOps::remove_file_if_exists(&artifact).await {
                    app_log!(warn, "Failed to remove partial artifact: {:#}", e);
                }
                if let Some(previous) = &previous {
                    if let Err(e) = tokio::fs::rename(previous, &artifact).await {
                        app_log!(warn, "Failed to restore {}: {}", artifact.display(), e);
                    }
                }
                let kept = intermediate.retain()?;
                app_log!(warn, "Render failed, intermediate resume kept at {}", kept.display());

                Err(match err {
                    CustomizeError::Render { message, output } => CustomizeError::Render {
                        message: format!(
                            "{} (intermediate resume kept at {})",
                            message,
                            kept.display()
                        ),
                        output,
                    },
                    other => other,
                })
            }
        }
    }

    fn create_intermediate(&self) -> Result<Intermediate, CustomizeError> {
        if let Some(path) = &self.config.intermediate_path {
            return Ok(Intermediate::Named(path.clone()));
        }

        let file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile()
            .map_err(|e| CustomizeError::Io(anyhow::Error::new(e)))?;
        Ok(Intermediate::Temporary(file.into_temp_path()))
    }

    /// Runs `<renderer> render <intermediate> --pdf-path <artifact>` and
    /// returns the captured output.
    fn run_renderer(&self, intermediate: &Path, artifact: &Path) -> Result<String, CustomizeError> {
        let renderer = &self.config.renderer;

        let mut cmd = Command::new(renderer);
        cmd.arg("render")
            .arg(intermediate)
            .arg("--pdf-path")
            .arg(artifact);

        app_log!(info, "Running renderer: {:?}", cmd);

        let output = cmd.output().map_err(|e| match e.kind() {
            ErrorKind::NotFound => CustomizeError::render(
                format!(
                    "`{}` command not found. Please ensure RenderCV is installed.",
                    renderer
                ),
                String::new(),
            ),
            _ => CustomizeError::render(
                format!("failed to execute `{}`: {}", renderer, e),
                String::new(),
            ),
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let captured = format!("{}{}", stdout, stderr).trim().to_string();

        if !output.status.success() {
            app_log!(error, "Renderer failed: stderr={}, stdout={}", stderr, stdout);
            return Err(CustomizeError::render(
                format!("`{}` exited with {}", renderer, output.status),
                captured,
            ));
        }

        if !artifact.exists() {
            return Err(CustomizeError::render(
                format!(
                    "`{}` exited successfully but did not produce {}",
                    renderer,
                    artifact.display()
                ),
                captured,
            ));
        }

        app_log!(debug, "Renderer output: {}", captured);
        Ok(captured)
    }
}

/// Move an existing artifact out of the way so only a fresh write counts as success.
async fn set_aside(artifact: &Path) -> Result<Option<PathBuf>, CustomizeError> {
    if !artifact.exists() {
        return Ok(None);
    }

    let mut previous = artifact.as_os_str().to_owned();
    previous.push(PREVIOUS_SUFFIX);
    let previous = PathBuf::from(previous);

    tokio::fs::rename(artifact, &previous)
        .await
        .with_context(|| format!("Failed to move aside {}", artifact.display()))
        .map_err(CustomizeError::Io)?;
    app_log!(debug, "Moved previous artifact to {}", previous.display());
    Ok(Some(previous))
}

fn absolute(path: &Path) -> Result<PathBuf, CustomizeError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let current_dir = std::env::current_dir()
        .map_err(|e| CustomizeError::Io(anyhow::Error::new(e)))?;
    Ok(current_dir.join(path))
}
