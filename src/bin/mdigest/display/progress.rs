use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

pub struct BarProgress {
    bar: ProgressBar,
    start: Instant,
}

impl BarProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("  {spinner:.cyan} [{bar:32.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .progress_chars("━╸ ");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        Self {
            bar,
            start: Instant::now(),
        }
    }

    pub fn start(&mut self, name: &str) {
        self.bar.set_message(format!("Digesting {name}"));
    }

    pub fn advance(&mut self) {
        self.bar.inc(1);
    }

    pub fn finish(self) {
        self.bar.finish_and_clear();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Digested {} molecules {:>28}",
            self.bar.position(),
            format!("Total: {:.2}s", self.start.elapsed().as_secs_f64())
        );
    }
}

pub enum MoleculeProgress {
    Interactive(BarProgress),
    Silent,
}

impl MoleculeProgress {
    pub fn new(interactive: bool, total: usize) -> Self {
        if interactive {
            Self::Interactive(BarProgress::new(total))
        } else {
            Self::Silent
        }
    }

    pub fn start(&mut self, name: &str) {
        if let Self::Interactive(p) = self {
            p.start(name);
        }
    }

    pub fn advance(&mut self) {
        if let Self::Interactive(p) = self {
            p.advance();
        }
    }

    pub fn finish(self) {
        if let Self::Interactive(p) = self {
            p.finish();
        }
    }
}
