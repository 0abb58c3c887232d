use rmcp::model::{ErrorCode, ErrorData};

/// All error types produced by the mr-confluence-mcp server.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Could not resolve project '{0}' by ID or by path")]
    Resolution(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Remote call failed: {0}")]
    Remote(String),

    #[error("Failed to retrieve {state} merge requests for project {project}: {source}")]
    MergeRequestList {
        project: String,
        state: String,
        #[source]
        source: Box<ReportError>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Other(#[from] anyhow::Error),
}

impl ReportError {
    /// True for 404-class failures, which trigger the path-encoded project lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReportError::NotFound(_))
    }

    /// MCP error code. Context wrappers report the code of their cause.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ReportError::Config(_)
            | ReportError::NotFound(_)
            | ReportError::Resolution(_)
            | ReportError::Auth(_) => ErrorCode::INVALID_PARAMS,
            ReportError::MergeRequestList { source, .. } => source.error_code(),
            _ => ErrorCode::INTERNAL_ERROR,
        }
    }
}

impl From<ReportError> for ErrorData {
    fn from(err: ReportError) -> Self {
        ErrorData::new(err.error_code(), err.to_string(), None)
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_failure_carries_project_and_state() {
        let err = ReportError::MergeRequestList {
            project: "group/repo".to_string(),
            state: "opened".to_string(),
            source: Box::new(ReportError::Resolution("group/repo".to_string())),
        };
        let msg = err.to_string();
        assert!(msg.contains("group/repo"));
        assert!(msg.contains("opened"));
        assert!(msg.contains("by path"));
    }

    #[test]
    fn config_error_maps_to_invalid_params() {
        let data = ErrorData::from(ReportError::Config("no wiki".to_string()));
        assert_eq!(data.code.0, ErrorCode::INVALID_PARAMS.0);

        let data = ErrorData::from(ReportError::Remote("HTTP 500".to_string()));
        assert_eq!(data.code.0, ErrorCode::INTERNAL_ERROR.0);
    }

    #[test]
    fn list_failure_takes_code_from_cause() {
        let wrap = |source: ReportError| ReportError::MergeRequestList {
            project: "group/repo".to_string(),
            state: "opened".to_string(),
            source: Box::new(source),
        };

        let data = ErrorData::from(wrap(ReportError::Resolution("group/repo".to_string())));
        assert_eq!(data.code.0, ErrorCode::INVALID_PARAMS.0);
        assert!(data.message.contains("group/repo"));

        let data = ErrorData::from(wrap(ReportError::Auth("bad token".to_string())));
        assert_eq!(data.code.0, ErrorCode::INVALID_PARAMS.0);

        let data = ErrorData::from(wrap(ReportError::Remote("HTTP 502".to_string())));
        assert_eq!(data.code.0, ErrorCode::INTERNAL_ERROR.0);
    }
}
