//! Configuração do bot carregada a partir de `gasbot.toml`.
//!
//! A struct [`BotConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! Variáveis de ambiente (também lidas de `.env`) têm precedência sobre o
//! arquivo para as credenciais.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::BotError;
use crate::prompt::{DEFAULT_REJECT_MARKERS, Persona};
use crate::reddit::{Listing, RedditCredentials};

/// Nome padrão do arquivo de configuração.
pub const DEFAULT_CONFIG_FILE: &str = "gasbot.toml";

/// Valores de exemplo que indicam credenciais não preenchidas.
const PLACEHOLDERS: &[&str] = &[
    "YOUR_BOT_USERNAME_HERE",
    "YOUR_BOT_PASSWORD_HERE",
    "YOUR_CLIENT_ID",
    "YOUR_CLIENT_SECRET",
    "YOUR_GEMINI_API_KEY_HERE",
];

/// Como o subreddit de cada ciclo é escolhido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Um subreddit aleatório por ciclo.
    #[default]
    Random,
    /// Percorre a lista em ordem, um por ciclo.
    RoundRobin,
}

/// Credenciais da conta do bot (app do tipo "script").
#[derive(Debug, Clone, Deserialize)]
pub struct RedditSection {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Parâmetros do gerador de texto.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSection {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

/// Filtro opcional por sentimento.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentimentSection {
    #[serde(default)]
    pub enabled: bool,
    /// Itens com pontuação abaixo deste valor são ignorados no ciclo.
    #[serde(default)]
    pub min_score: Option<i32>,
}

/// Configuração de nível superior carregada de `gasbot.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub reddit: RedditSection,

    #[serde(default)]
    pub gemini: GeminiSection,

    #[serde(default)]
    pub sentiment: SentimentSection,

    /// Subreddits monitorados.
    #[serde(default = "default_subreddits")]
    pub subreddits: Vec<String>,

    #[serde(default)]
    pub selection: Selection,

    #[serde(default)]
    pub listing: Listing,

    /// Máximo de itens lidos por ciclo.
    #[serde(default = "default_item_limit")]
    pub item_limit: u32,

    /// Intervalo entre ciclos, em segundos.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Pausa após um rate limit antes de seguir para o próximo ciclo.
    #[serde(default = "default_ratelimit_backoff_secs")]
    pub ratelimit_backoff_secs: u64,

    /// Pausa após falha ao buscar a listagem.
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,

    /// Pausa após uma resposta publicada com sucesso.
    #[serde(default = "default_post_reply_pause_secs")]
    pub post_reply_pause_secs: u64,

    /// Pausa entre candidatos que chegaram à geração.
    #[serde(default = "default_candidate_pause_secs")]
    pub candidate_pause_secs: u64,

    /// Arquivo com os IDs já processados.
    #[serde(default = "default_processed_file")]
    pub processed_file: PathBuf,

    /// Diretório dos logs em arquivo.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default)]
    pub persona: Persona,

    /// Texto anexado a cada resposta gerada.
    #[serde(default = "default_disclaimer")]
    pub disclaimer: String,

    /// Resposta fixa; quando definida, o gerador de texto não é usado.
    #[serde(default)]
    pub fixed_reply: Option<String>,

    /// Marcadores que invalidam um texto gerado.
    #[serde(default = "default_reject_markers")]
    pub reject_markers: Vec<String>,

    /// Dá upvote no item após responder. Com isso o ciclo faz duas escritas
    /// remotas (resposta e voto) em vez de uma; desligado por padrão.
    #[serde(default)]
    pub upvote: bool,
}

fn default_user_agent() -> String {
    concat!("gasbot/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_max_output_tokens() -> u32 {
    512
}

fn default_subreddits() -> Vec<String> {
    vec!["testingground4bots".to_string()]
}

fn default_item_limit() -> u32 {
    10
}

// 15 minutos.
fn default_poll_interval_secs() -> u64 {
    15 * 60
}

fn default_ratelimit_backoff_secs() -> u64 {
    60
}

fn default_error_backoff_secs() -> u64 {
    60
}

fn default_post_reply_pause_secs() -> u64 {
    5
}

fn default_candidate_pause_secs() -> u64 {
    2
}

fn default_processed_file() -> PathBuf {
    PathBuf::from("processed_posts.txt")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_disclaimer() -> String {
    "\n\n---\n\n*I am a bot. This reply is automated. Please use your discretion.*".to_string()
}

fn default_reject_markers() -> Vec<String> {
    DEFAULT_REJECT_MARKERS.iter().map(|m| m.to_string()).collect()
}

impl Default for RedditSection {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for GeminiSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            reddit: RedditSection::default(),
            gemini: GeminiSection::default(),
            sentiment: SentimentSection::default(),
            subreddits: default_subreddits(),
            selection: Selection::default(),
            listing: Listing::default(),
            item_limit: default_item_limit(),
            poll_interval_secs: default_poll_interval_secs(),
            ratelimit_backoff_secs: default_ratelimit_backoff_secs(),
            error_backoff_secs: default_error_backoff_secs(),
            post_reply_pause_secs: default_post_reply_pause_secs(),
            candidate_pause_secs: default_candidate_pause_secs(),
            processed_file: default_processed_file(),
            log_dir: default_log_dir(),
            persona: Persona::default(),
            disclaimer: default_disclaimer(),
            fixed_reply: None,
            reject_markers: default_reject_markers(),
            upvote: false,
        }
    }
}

/// Ignora só a ausência do `.env`; erros de leitura ou sintaxe são reportados.
fn check_dotenv<T>(result: Result<T, dotenvy::Error>) -> Result<(), BotError> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(BotError::Config(format!("failed to load .env: {e}"))),
    }
}

impl BotConfig {
    /// Carrega a configuração de `path`, aplicando `.env` e variáveis de ambiente.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load(path: &Path) -> Result<Self, BotError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<BotConfig>(&contents)?
        } else {
            Self::default()
        };

        // `.env` é opcional, mas um arquivo malformado é erro.
        check_dotenv(dotenvy::dotenv())?;
        config.apply_env(|name| std::env::var(name).ok());

        Ok(config)
    }

    /// Sobrescreve credenciais com valores não vazios retornados por `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |names: &[&str]| {
            names
                .iter()
                .filter_map(|n| lookup(*n))
                .find(|v| !v.trim().is_empty())
        };

        if let Some(v) = get(&["REDDIT_CLIENT_ID"]) {
            self.reddit.client_id = v;
        }
        if let Some(v) = get(&["REDDIT_CLIENT_SECRET", "REDDIT_SECRET"]) {
            self.reddit.client_secret = v;
        }
        if let Some(v) = get(&["REDDIT_USERNAME"]) {
            self.reddit.username = v;
        }
        if let Some(v) = get(&["REDDIT_PASSWORD"]) {
            self.reddit.password = v;
        }
        if let Some(v) = get(&["REDDIT_USER_AGENT"]) {
            self.reddit.user_agent = v;
        }
        if let Some(v) = get(&["GEMINI_API_KEY"]) {
            self.gemini.api_key = v;
        }
    }

    /// Verifica se a configuração permite rodar o bot.
    pub fn validate(&self) -> Result<(), BotError> {
        let required = [
            ("reddit.client_id", &self.reddit.client_id),
            ("reddit.client_secret", &self.reddit.client_secret),
            ("reddit.username", &self.reddit.username),
            ("reddit.password", &self.reddit.password),
            ("reddit.user_agent", &self.reddit.user_agent),
        ];
        for (name, value) in required {
            check_credential(name, value)?;
        }
        if self.fixed_reply.is_none() {
            check_credential("gemini.api_key", &self.gemini.api_key)?;
        }

        if self.subreddits.iter().all(|s| s.trim().is_empty()) {
            return Err(BotError::Config("no subreddits configured".into()));
        }
        if self.item_limit == 0 {
            return Err(BotError::Config("item_limit must be at least 1".into()));
        }
        if let Some(reply) = &self.fixed_reply {
            if reply.trim().is_empty() {
                return Err(BotError::Config("fixed_reply must not be empty".into()));
            }
        }
        Ok(())
    }

    pub fn credentials(&self) -> RedditCredentials {
        RedditCredentials {
            client_id: self.reddit.client_id.clone(),
            client_secret: self.reddit.client_secret.clone(),
            username: self.reddit.username.clone(),
            password: self.reddit.password.clone(),
            user_agent: self.reddit.user_agent.clone(),
        }
    }
}

fn check_credential(name: &str, value: &str) -> Result<(), BotError> {
    if value.trim().is_empty() {
        return Err(BotError::Config(format!("{name} is not set")));
    }
    if PLACEHOLDERS.contains(&value) {
        return Err(BotError::Config(format!(
            "{name} still holds the placeholder value {value:?}"
        )));
    }
    Ok(())
}
