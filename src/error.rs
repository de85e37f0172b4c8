// src/error.rs
//! Error taxonomy for a customization run, with exit codes and remediation hints

use thiserror::Error;

use crate::config::API_KEY_VAR;

#[derive(Debug, Error)]
pub enum CustomizeError {
    #[error("File system error: {0:#}")]
    Io(anyhow::Error),

    #[error("Invalid configuration: {0:#}")]
    Config(anyhow::Error),

    #[error("Resume schema error at `{field}`: {message}")]
    Schema { field: String, message: String },

    #[error("{0}")]
    Auth(String),

    #[error("Could not reach the AI service: {0}")]
    Network(#[from] reqwest::Error),

    #[error("AI service returned status {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("AI response could not be used: {message}")]
    Format { message: String, raw: String },

    #[error("Rendering failed: {message}")]
    Render { message: String, output: String },
}

impl CustomizeError {
    pub fn schema(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn format(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
            raw: raw.into(),
        }
    }

    pub fn render(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
            output: output.into(),
        }
    }

    /// Process exit code, distinct per failure kind. Clap keeps 2 for usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io(_) => 3,
            Self::Config(_) => 4,
            Self::Schema { .. } => 10,
            Self::Auth(_) => 11,
            Self::Network(_) => 12,
            Self::Remote { .. } => 13,
            Self::Format { .. } => 14,
            Self::Render { .. } => 15,
        }
    }

    /// Short machine-friendly name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Config(_) => "config",
            Self::Schema { .. } => "schema",
            Self::Auth(_) => "auth",
            Self::Network(_) => "network",
            Self::Remote { .. } => "remote",
            Self::Format { .. } => "format",
            Self::Render { .. } => "render",
        }
    }

    pub fn hint(&self) -> String {
        match self {
            Self::Io(_) => "Check that the input paths exist and are readable.".to_string(),
            Self::Config(_) => {
                "Fix the configuration file or remove it to use the defaults.".to_string()
            }
            Self::Schema { .. } => "The resume must follow the RenderCV layout: `cv.name`, \
                 `cv.sections.experience[*].highlights` and \
                 `cv.sections.technologies[*].details`."
                .to_string(),
            Self::Auth(_) => format!(
                "Set {API_KEY_VAR} in your environment or in a .env file, e.g.\n{API_KEY_VAR}=sk-or-v1-your-key-here"
            ),
            Self::Network(_) => {
                "Check your network connection and the configured base URL.".to_string()
            }
            Self::Remote { status, .. } if *status == 401 || *status == 403 => {
                format!("The AI service rejected the credentials; verify {API_KEY_VAR}.")
            }
            Self::Remote { .. } => {
                "Check the model identifier and your account limits, then try again.".to_string()
            }
            Self::Format { .. } => "The model did not return a clean reordering. Run again, \
                 or try a different model with --model."
                .to_string(),
            Self::Render { .. } => "Ensure RenderCV is installed (`pip install rendercv`) and \
                 inspect the retained YAML file."
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            CustomizeError::Io(anyhow::anyhow!("missing")),
            CustomizeError::Config(anyhow::anyhow!("bad")),
            CustomizeError::schema("cv", "missing"),
            CustomizeError::Auth("no key".to_string()),
            CustomizeError::Remote {
                status: 500,
                message: "boom".to_string(),
            },
            CustomizeError::format("bad yaml", "raw"),
            CustomizeError::render("missing", ""),
        ];

        let mut codes: Vec<u8> = errors.iter().map(|e| e.exit_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|c| *c != 0 && *c != 1 && *c != 2));
    }

    #[test]
    fn test_schema_error_names_field() {
        let err = CustomizeError::schema("cv.sections.experience[0].highlights", "is missing");
        assert_eq!(
            err.to_string(),
            "Resume schema error at `cv.sections.experience[0].highlights`: is missing"
        );
    }

    #[test]
    fn test_auth_hint_mentions_variable() {
        let err = CustomizeError::Auth("missing".to_string());
        assert!(err.hint().contains(API_KEY_VAR));
    }
}
