use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, bail};
use mol_digest::{Digester, DigesterConfig, Molecule, MoleculeView};
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::cli::Cli;
use crate::display::{Context as DisplayContext, MoleculeProgress, MoleculeSummary, print_summary};

pub fn run(cli: Cli, ctx: DisplayContext) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let digester = Digester::new(config).context("Invalid digester configuration")?;
    let mut rng = Pcg64::seed_from_u64(cli.seed);

    let molecules = read_molecules(&cli.inputs)?;
    if molecules.is_empty() {
        bail!("No molecules found in the input files");
    }

    let elements = match cli.element {
        Some(element) => vec![element],
        None => digester.elements().to_vec(),
    };

    let mut progress = MoleculeProgress::new(ctx.interactive, molecules.len());
    let mut summaries = Vec::with_capacity(molecules.len());
    for (name, mut molecule) in molecules {
        progress.start(&name);
        if cli.distort > 0.0 {
            molecule.distort(&mut rng, cli.distort);
        }

        let cases = if cli.molwise {
            digester
                .train_digest_molwise(&molecule, &mut rng)
                .with_context(|| format!("Failed to digest {name}"))?
                .len()
        } else {
            let mut cases = 0;
            for &element in &elements {
                cases += digester
                    .train_digest(&molecule, element, &mut rng)
                    .with_context(|| format!("Failed to digest {element} atoms of {name}"))?
                    .len();
            }
            cases
        };

        summaries.push(MoleculeSummary {
            name,
            atoms: molecule.atom_count(),
            cases,
        });
        progress.advance();
    }
    progress.finish();

    print_summary(&digester, &summaries);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<DigesterConfig> {
    let Some(path) = path else {
        return Ok(DigesterConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration '{}'", path.display()))?;
    DigesterConfig::from_toml(&text)
        .with_context(|| format!("Failed to load configuration '{}'", path.display()))
}

/// Reads every frame of every input, naming frames `file#index`.
fn read_molecules(paths: &[impl AsRef<Path>]) -> Result<Vec<(String, Molecule)>> {
    let mut molecules = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file '{}'", path.display()))?;
        let frames = mol_digest::io::xyz::read(BufReader::new(file))
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let stem = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        molecules.extend(
            frames
                .into_iter()
                .enumerate()
                .map(|(i, m)| (format!("{stem}#{i}"), m)),
        );
    }
    Ok(molecules)
}
