use std::io::{self, Write};

use mol_digest::{Digester, EmbeddingKernel};

use super::text::truncate;

const INDENT: &str = "  ";
const NAME_WIDTH: usize = 28;

/// Cases produced from one molecule.
pub struct MoleculeSummary {
    pub name: String,
    pub atoms: usize,
    pub cases: usize,
}

pub fn print_summary<K: EmbeddingKernel>(digester: &Digester<K>, summaries: &[MoleculeSummary]) {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let _ = writeln!(
        out,
        "{INDENT}{:<NAME_WIDTH$} {:>8} {:>8}",
        "Molecule", "Atoms", "Cases"
    );
    let _ = writeln!(out, "{INDENT}{}", "─".repeat(NAME_WIDTH + 18));
    for s in summaries {
        let _ = writeln!(
            out,
            "{INDENT}{:<NAME_WIDTH$} {:>8} {:>8}",
            truncate(&s.name, NAME_WIDTH),
            s.atoms,
            s.cases
        );
    }
    let total: usize = summaries.iter().map(|s| s.cases).sum();
    let _ = writeln!(out, "{INDENT}{}", "─".repeat(NAME_WIDTH + 18));
    let _ = writeln!(out, "{INDENT}{:<NAME_WIDTH$} {:>8} {:>8}", "Total", "", total);
    let _ = writeln!(out);

    let config = digester.config();
    let _ = writeln!(out, "{INDENT}Embedding   {}", config.embedding);
    let _ = writeln!(out, "{INDENT}Output      {}", config.output);
    match digester.shapes() {
        Some(shapes) => {
            let _ = writeln!(out, "{INDENT}Input shape {:?}", shapes.embedding);
            let _ = writeln!(out, "{INDENT}Label shape {:?}", shapes.label);
        }
        None => {
            let _ = writeln!(out, "{INDENT}Shapes      not discovered");
        }
    }
}
