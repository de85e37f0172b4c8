use std::path::{Path, PathBuf};

pub mod completion;
pub mod config;
pub mod error;
pub mod fs_ops;
pub mod merge;
pub mod prompt;
pub mod render;
pub mod schema;
pub mod types;

use crate::completion::CompletionBackend;
use crate::config::CustomizerConfig;
use crate::error::CustomizeError;
use crate::fs_ops::FsOps;
use crate::render::RendererInvoker;
use crate::types::Resume;

/// Log through `tracing` at the given level: `app_log!(info, "Rendered {}", path)`.
#[macro_export]
macro_rules! app_log {
    ($level:ident, $($arg:tt)+) => {
        ::tracing::$level!($($arg)+)
    };
}

/// Info-level span: `app_span!("customize", resume = %path.display())`.
#[macro_export]
macro_rules! app_span {
    ($($arg:tt)+) => {
        ::tracing::info_span!($($arg)+)
    };
}

/// Inputs of one customization run
#[derive(Debug, Clone)]
pub struct CustomizeRequest {
    pub resume_path: PathBuf,
    pub job_posting_path: PathBuf,
    pub output_stem: PathBuf,
}

#[derive(Debug)]
pub struct CustomizeOutcome {
    pub resume: Resume,
    pub artifact: PathBuf,
    pub intermediate: Option<PathBuf>,
    pub renderer_output: String,
}

/// Validator → prompt → completion → merge → render, strictly in that order.
pub struct ResumeCustomizer<'a, B: CompletionBackend> {
    config: &'a CustomizerConfig,
    backend: B,
}

impl<'a, B: CompletionBackend> ResumeCustomizer<'a, B> {
    pub fn new(config: &'a CustomizerConfig, backend: B) -> Self {
        Self { config, backend }
    }

    pub async fn customize(
        &self,
        request: &CustomizeRequest,
    ) -> Result<CustomizeOutcome, CustomizeError> {
        let resume = load_resume(&request.resume_path).await?;
        let job_posting = FsOps::read_file_safe(&request.job_posting_path)
            .await
            .map_err(CustomizeError::Io)?;
        app_log!(
            debug,
            "Job posting {} has {} characters",
            request.job_posting_path.display(),
            job_posting.len()
        );

        let prompt = prompt::build_prompt(&resume, &job_posting);
        app_log!(debug, "Prompt has {} characters", prompt.len());

        let response = self.backend.complete(&prompt).await?;
        let customized = merge::merge(&resume, &response)?;

        let rendered = RendererInvoker::new(self.config)
            .render(&customized, &request.output_stem)
            .await?;

        app_log!(
            info,
            "✅ Customized resume for {} rendered to {}",
            customized.name(),
            rendered.artifact.display()
        );

        Ok(CustomizeOutcome {
            resume: customized,
            artifact: rendered.artifact,
            intermediate: rendered.intermediate,
            renderer_output: rendered.renderer_output,
        })
    }
}

/// Read and validate a resume file.
pub async fn load_resume(path: &Path) -> Result<Resume, CustomizeError> {
    let content = FsOps::read_file_safe(path)
        .await
        .map_err(CustomizeError::Io)?;
    let resume = Resume::from_yaml(&content)?;

    app_log!(
        info,
        "Loaded resume for {}: {} experience entries, {} technology categories",
        resume.name(),
        resume.experiences().len(),
        resume.technologies().len()
    );
    Ok(resume)
}
