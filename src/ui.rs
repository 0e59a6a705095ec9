//! Interface de terminal do bot: spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner de progresso e `console` para
//! estilização com cores. Usada pelos subcomandos `once`, `status` e `classify`.

use std::path::Path;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::report::{CycleOutcome, CycleReport};
use crate::tracker::FailureClassification;

/// Indicador visual de progresso para um ciclo executado no terminal.
pub struct CycleProgress {
    // Spinner do indicatif.
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl CycleProgress {
    /// Inicia o spinner e retorna a instância de progresso.
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Finaliza o spinner e exibe o resultado do ciclo.
    ///
    /// Resposta publicada em verde, rate limit em amarelo, falha de busca em
    /// vermelho.
    pub fn complete(&self, report: &CycleReport) {
        self.pb.finish_and_clear();
        let style = outcome_style(report.outcome, &self.green, &self.red, &self.yellow);
        let line = match &report.replied_to {
            Some(id) => format!("r/{}: {} ({id})", report.subreddit, report.outcome),
            None => format!("r/{}: {}", report.subreddit, report.outcome),
        };
        println!("  {}", style.apply_to(line));
    }

    /// Imprime o relatório do ciclo em JSON.
    pub fn print_report(&self, report: &CycleReport) {
        let style = outcome_style(report.outcome, &self.green, &self.red, &self.yellow);
        println!();
        println!("{}", style.apply_to("─── Cycle Report ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(report).unwrap_or_default()
        );
    }
}

fn outcome_style<'a>(
    outcome: CycleOutcome,
    green: &'a Style,
    red: &'a Style,
    yellow: &'a Style,
) -> &'a Style {
    match outcome {
        CycleOutcome::Replied => green,
        CycleOutcome::FetchFailed => red,
        CycleOutcome::RateLimited | CycleOutcome::NoReply => yellow,
    }
}

/// Exibe o caminho do arquivo de itens processados e a contagem atual.
pub fn print_status(path: &Path, processed: usize, subreddits: &[String]) {
    let bold = Style::new().bold();
    println!("{}", bold.apply_to("gasbot status"));
    println!("  store:      {}", path.display());
    println!("  processed:  {processed}");
    println!("  subreddits: {}", subreddits.join(", "));
}

/// Exibe a classificação de um sinal de erro.
pub fn print_classification(signal: &str, class: FailureClassification) {
    let style = match class {
        FailureClassification::Retryable => Style::new().yellow(),
        FailureClassification::PermanentSkip => Style::new().red(),
        FailureClassification::Unknown => Style::new().dim(),
    };
    let note = if class.marks_processed() {
        "item will be marked processed"
    } else {
        "item stays eligible"
    };
    println!("{signal:?} → {} ({note})", style.apply_to(class));
}
