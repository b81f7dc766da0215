use std::fmt;

use crate::shader::ShaderStage;

/// Upper bound on the length of a compiler or linker log kept in a diagnostic.
pub const INFO_LOG_LIMIT: usize = 512;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while bringing the viewer up.
///
/// Configuration, window and context failures are always fatal. Shader
/// failures are only fatal when the caller asks for it, see
/// [`crate::config::Config::strict_shaders`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to create window: {0}")]
    WindowCreation(#[from] winit::error::OsError),

    #[error("failed to initialize graphics context: {0}")]
    GraphicsContextInit(String),

    #[error("{stage} shader compilation failed:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: InfoLog },

    #[error("shader program linking failed:\n{log}")]
    ShaderLink { log: InfoLog },
}

impl Error {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ShaderCompile { .. } | Self::ShaderLink { .. })
    }
}

impl From<wgpu::CreateSurfaceError> for Error {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        Self::GraphicsContextInit(format!("surface creation failed: {err}"))
    }
}

impl From<wgpu::RequestDeviceError> for Error {
    fn from(err: wgpu::RequestDeviceError) -> Self {
        Self::GraphicsContextInit(format!("device request failed: {err}"))
    }
}

/// Compiler or linker output, truncated to [`INFO_LOG_LIMIT`] bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoLog(String);

impl InfoLog {
    pub fn new(text: impl Into<String>) -> Self {
        let mut text = text.into();
        if text.len() > INFO_LOG_LIMIT {
            let mut end = INFO_LOG_LIMIT;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
        }
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InfoLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_logs_are_kept_whole() {
        let log = InfoLog::new("expected `fn`");
        assert_eq!(log.as_str(), "expected `fn`");
    }

    #[test]
    fn long_logs_are_truncated() {
        let log = InfoLog::new("x".repeat(INFO_LOG_LIMIT * 2));
        assert_eq!(log.as_str().len(), INFO_LOG_LIMIT);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes, so an odd limit would split it.
        let text = format!("a{}", "é".repeat(INFO_LOG_LIMIT));
        let log = InfoLog::new(text);
        assert!(log.as_str().len() <= INFO_LOG_LIMIT);
        assert!(log.as_str().len() >= INFO_LOG_LIMIT - 1);
        assert!(log.as_str().starts_with('a'));
    }

    #[test]
    fn shader_failures_are_not_fatal() {
        assert!(Error::GraphicsContextInit("no adapter".into()).is_fatal());
        assert!(Error::Config("zero-sized field".into()).is_fatal());
        assert!(!Error::ShaderLink {
            log: InfoLog::new("missing vertex stage")
        }
        .is_fatal());
        assert!(!Error::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: InfoLog::new("")
        }
        .is_fatal());
    }
}
