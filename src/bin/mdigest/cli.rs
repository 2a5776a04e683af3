use std::path::PathBuf;

use clap::Parser;
use mol_digest::Element;

#[derive(Parser)]
#[command(
    name = "mdigest",
    about = "Digest molecules into fixed-shape embeddings and training labels",
    version,
    author
)]
pub struct Cli {
    /// Molecule files (multi-frame XYZ)
    #[arg(value_name = "FILE", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Digester configuration (TOML); built-in defaults if omitted
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Digest only atoms of this element (every configured element if omitted)
    #[arg(short, long, value_name = "SYM")]
    pub element: Option<Element>,

    /// Digest every atom of a molecule in one call
    #[arg(long, conflicts_with = "element")]
    pub molwise: bool,

    /// Random displacement amplitude (Å) applied to each molecule first
    #[arg(long, value_name = "Å", default_value = "0.0")]
    pub distort: f64,

    /// Seed of the random stream
    #[arg(long, value_name = "N", default_value = "0")]
    pub seed: u64,

    /// Suppress progress output and lower logging to warnings
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command_line() {
        let cli = Cli::try_parse_from([
            "mdigest", "--config", "digest.toml", "--element", "H", "--seed", "42", "a.xyz",
            "b.xyz",
        ])
        .unwrap();
        assert_eq!(cli.inputs.len(), 2);
        assert_eq!(cli.element, Some(Element::H));
        assert_eq!(cli.seed, 42);
        assert!(!cli.molwise);
        assert!(!cli.quiet);
    }

    #[test]
    fn rejects_unknown_element_and_conflicts() {
        assert!(Cli::try_parse_from(["mdigest", "--element", "Xq", "a.xyz"]).is_err());
        assert!(Cli::try_parse_from(["mdigest", "--element", "H", "--molwise", "a.xyz"]).is_err());
        assert!(Cli::try_parse_from(["mdigest"]).is_err());
    }
}
