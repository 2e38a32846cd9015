//! CLI error type with exit code handling (§6/§7).

use miette::Diagnostic;
use thiserror::Error;

pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 2;
    pub const FORMAT_ERROR: i32 = 3;
    pub const PREFLIGHT_DECLINED: i32 = 4;
    pub const API_ERROR: i32 = 5;
    pub const INTERNAL_ERROR: i32 = 64;
}

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("{message}")]
    #[diagnostic(code(ctp_migrate::validation))]
    Validation { message: String },

    #[error("archive is malformed: {0}")]
    #[diagnostic(code(ctp_migrate::format))]
    Format(#[from] migrator_core::CoreError),

    #[error("preflight declined by operator")]
    #[diagnostic(code(ctp_migrate::preflight_declined))]
    PreflightDeclined,

    #[error(transparent)]
    #[diagnostic(code(ctp_migrate::api))]
    Api(#[from] migrator_kube::KubeError),

    #[error("could not load kubeconfig: {0}")]
    #[diagnostic(code(ctp_migrate::kubeconfig))]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error(transparent)]
    #[diagnostic(code(ctp_migrate::config))]
    InferConfig(#[from] kube::config::InferConfigError),

    #[error(transparent)]
    #[diagnostic(code(ctp_migrate::client))]
    Client(#[from] kube::Error),

    #[error("{0}")]
    #[diagnostic(code(ctp_migrate::io))]
    Io(#[from] std::io::Error),

    #[error("internal error: {message}")]
    #[diagnostic(code(ctp_migrate::internal))]
    Internal { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Format(_) => exit_codes::FORMAT_ERROR,
            CliError::PreflightDeclined => exit_codes::PREFLIGHT_DECLINED,
            CliError::Api(_) | CliError::Client(_) => exit_codes::API_ERROR,
            CliError::Kubeconfig(_) | CliError::InferConfig(_) | CliError::Io(_) => exit_codes::VALIDATION_ERROR,
            CliError::Internal { .. } => exit_codes::INTERNAL_ERROR,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
