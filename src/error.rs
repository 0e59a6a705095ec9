use thiserror::Error;

use crate::gemini::GeminiError;
use crate::reddit::RedditError;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Reddit API error: {0}")]
    Reddit(#[from] RedditError),

    #[error("Gemini API error: {0}")]
    Gemini(#[from] GeminiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = BotError::Config("no subreddits configured".into());
        assert_eq!(err.to_string(), "Config error: no subreddits configured");
    }

    #[test]
    fn reddit_error_converts() {
        let err: BotError = RedditError::Auth("invalid_grant".into()).into();
        assert_eq!(
            err.to_string(),
            "Reddit API error: authentication failed: invalid_grant"
        );
    }
}
