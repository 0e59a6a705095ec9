//! Tipos de erro para o cliente da API Gemini.

use thiserror::Error;

/// Erros que podem ocorrer ao gerar texto com a API Gemini.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// O servidor retornou HTTP 429 (cota excedida).
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Qualquer outro erro HTTP (chave inválida, modelo inexistente, 5xx).
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A resposta não continha texto (bloqueio de segurança, saída vazia).
    #[error("no text generated (reason: {})", reason_or_unspecified(.finish_reason))]
    NoText { finish_reason: Option<String> },

    /// Falha de rede subjacente.
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

fn reason_or_unspecified(reason: &Option<String>) -> &str {
    reason.as_deref().unwrap_or("unspecified")
}
