//! Terminal and JSON output.

use std::time::Duration;

use console::{measure_text_width, pad_str, style, Alignment};
use indicatif::{ProgressBar, ProgressStyle};
use turbo_commerce::reconcile::GiftDecision;

#[derive(Clone, Copy)]
enum Tone {
    Info,
    Success,
    Warn,
}

/// Output handler for CLI messages.
///
/// In JSON mode only [`Output::json`] and errors are printed, so stdout
/// stays machine-readable.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    fn say(&self, tone: Tone, msg: &str) {
        if self.json {
            return;
        }
        match tone {
            Tone::Info => println!("{} {}", style("ℹ").blue(), msg),
            Tone::Success => println!("{} {}", style("✓").green(), msg),
            Tone::Warn => eprintln!("{} {}", style("⚠").yellow(), msg),
        }
    }

    pub fn info(&self, msg: &str) {
        self.say(Tone::Info, msg);
    }

    pub fn success(&self, msg: &str) {
        self.say(Tone::Success, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.say(Tone::Warn, msg);
    }

    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        } else {
            eprintln!("{} {}", style("✗").red(), style(msg).red());
        }
    }

    /// Only shown with `--verbose`.
    pub fn debug(&self, msg: &str) {
        if self.verbose && !self.json {
            eprintln!("{}", style(msg).dim());
        }
    }

    pub fn header(&self, title: &str) {
        if !self.json {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if !self.json {
            println!("  {:<22}{}", style(format!("{key}:")).dim(), value);
        }
    }

    pub fn list_item(&self, item: &str) {
        if !self.json {
            println!("    {} {}", style("-").dim(), item);
        }
    }

    /// Print rows under a header, each column as wide as its widest cell.
    pub fn table(&self, columns: &[&str], rows: &[Vec<String>]) {
        if self.json {
            return;
        }
        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, title)| {
                rows.iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| measure_text_width(cell))
                    .chain([title.len()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: Vec<&str>| {
            let padded: Vec<String> = cells
                .into_iter()
                .zip(&widths)
                .map(|(cell, &width)| pad_str(cell, width, Alignment::Left, None).into_owned())
                .collect();
            println!("  {}", padded.join("  ").trim_end());
        };

        line(columns.iter().map(|c| &**c).collect());
        for row in rows {
            line(row.iter().map(String::as_str).collect());
        }
    }

    pub fn json<T: serde::Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => self.error(&format!("could not encode output: {e}")),
        }
    }

    /// Spinner shown while a platform call is in flight. Hidden in JSON mode.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    pub fn is_json(&self) -> bool {
        self.json
    }
}

pub fn decision_badge(decision: GiftDecision) -> String {
    match decision {
        GiftDecision::Keep => style("keep").green().to_string(),
        GiftDecision::RemoveExcess => style("remove (excess)").yellow().to_string(),
        GiftDecision::RemoveUnentitled => style("remove (unentitled)").red().to_string(),
    }
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
