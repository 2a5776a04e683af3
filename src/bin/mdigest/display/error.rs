use std::io::{self, Write};

use anyhow::Error;
use mol_digest::DigestError;

use super::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    for cause in err.chain().skip(1) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
    }

    let hints = collect_hints(err);
    if !hints.is_empty() {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

fn collect_hints(err: &Error) -> Vec<&'static str> {
    use mol_digest::io::error::Error as IoError;

    let mut hints = Vec::new();
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<DigestError>() {
            hints.extend(digest_hints(e));
        } else if let Some(e) = cause.downcast_ref::<IoError>() {
            hints.extend(match e {
                IoError::Io { .. } => {
                    &["Check the path spelling and file permissions"][..]
                }
                IoError::Parse { .. } => &[
                    "XYZ frames start with an atom count and a comment line",
                    "Atom lines are `Sym x y z` with optional `fx fy fz` columns",
                ][..],
            });
        }
    }
    hints
}

fn digest_hints(err: &DigestError) -> &'static [&'static str] {
    match err {
        DigestError::UnknownEmbedding(_) => &[
            "Embeddings: Coulomb, GauSH, GauInv, RDF, SensoryBasis, SymFunc, PGaussian",
        ],
        DigestError::UnknownOutput(_) => &[
            "Outputs: HardP, SmoothP, StoP, Disp, GoForce, GoForceSphere, Force, Energy, AtomizationEnergy, CalcEnergy",
        ],
        DigestError::ConfigParse(_) | DigestError::InvalidConfig(_) => &[
            "Check the configuration keys and value ranges",
        ],
        DigestError::MissingProperty(_) => &[
            "Add `energy=` or `atomization=` to the XYZ comment line, or force columns to atom lines",
        ],
        DigestError::UnsupportedCombination { .. } => &[
            "Whole-molecule digestion needs GauSH or GauInv with GoForce, GoForceSphere or Force",
        ],
        DigestError::ShapeMismatch { .. } => &[
            "Every molecule must produce the shapes discovered on the first one",
        ],
        _ => &[],
    }
}
