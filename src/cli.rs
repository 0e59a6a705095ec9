//! Interface de linha de comando do bot baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, once, status,
//! mark, classify) e flags globais (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_FILE;

/// gasbot — bot de respostas para o Reddit.
#[derive(Debug, Parser)]
#[command(name = "gasbot", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração TOML.
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa o loop de polling até receber Ctrl-C.
    Run,

    /// Executa um único ciclo e imprime o relatório.
    Once,

    /// Mostra o arquivo de itens processados e a contagem.
    Status,

    /// Marca IDs como processados manualmente.
    Mark {
        /// IDs de posts ou comentários (ex.: abc123).
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Mostra como um sinal de erro seria classificado.
    Classify {
        /// Texto do erro (ex.: "RATELIMIT: you are doing that too much").
        signal: String,
    },
}
