//! Tipos de erro para o cliente da API do Reddit.
//!
//! [`RedditError::signal`] produz o texto livre que o rastreador de itens
//! classifica em retentável ou descartável.

use thiserror::Error;

use super::types::ApiErrorEntry;

/// Erros que podem ocorrer ao interagir com a API do Reddit.
#[derive(Debug, Error)]
pub enum RedditError {
    /// O servidor retornou HTTP 429.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// A API aceitou a requisição mas reportou erros em `json.errors`.
    #[error("API rejected request: {}", render_entries(.errors))]
    Api { errors: Vec<ApiErrorEntry> },

    /// Qualquer outro status HTTP de erro.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Falha ao obter o token OAuth.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Falha de rede subjacente.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

fn render_entries(errors: &[ApiErrorEntry]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl RedditError {
    /// Texto livre com os códigos de erro, usado para classificação.
    ///
    /// HTTP 429 sempre contém `RATELIMIT`.
    pub fn signal(&self) -> String {
        match self {
            RedditError::RateLimited { .. } => "RATELIMIT".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_lists_codes() {
        let err = RedditError::Api {
            errors: vec![
                ApiErrorEntry {
                    code: "THREAD_LOCKED".into(),
                    message: "comments are locked".into(),
                },
                ApiErrorEntry {
                    code: "TOO_OLD".into(),
                    message: "archived".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "API rejected request: THREAD_LOCKED: comments are locked; TOO_OLD: archived"
        );
    }

    #[test]
    fn rate_limited_signal_contains_marker() {
        let err = RedditError::RateLimited {
            retry_after_secs: 60,
        };
        assert_eq!(err.signal(), "RATELIMIT");
    }

    #[test]
    fn status_signal_is_display() {
        let err = RedditError::Status {
            status: 403,
            message: "Forbidden".into(),
        };
        assert_eq!(err.signal(), "HTTP 403: Forbidden");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RedditError>();
    }
}
