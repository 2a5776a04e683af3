use crate::io::{Format, error::Error};
use crate::model::molecule::Molecule;
use crate::model::types::Element;
use std::io::BufRead;

/// Reads every frame of a multi-frame XYZ stream.
///
/// The comment line of a frame may carry `energy=<value>` and
/// `atomization=<value>`. Atom lines are `Sym x y z`, optionally followed by
/// `fx fy fz`; the species may be a symbol or an atomic number. Forces are
/// kept only when every atom line of the frame carries them.
pub fn read<R: BufRead>(reader: R) -> Result<Vec<Molecule>, Error> {
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(i, line)| line.map(|content| (i + 1, content)));
    let mut molecules = Vec::new();

    while let Some(header) = lines.next() {
        let (ln, header) = header?;
        if header.trim().is_empty() {
            continue;
        }
        let count = header
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::parse(Format::Xyz, ln, "invalid atom count"))?;

        let (comment_ln, comment) = lines
            .next()
            .transpose()?
            .ok_or_else(|| Error::parse(Format::Xyz, ln, "frame ended before comment line"))?;
        let (energy, atomization) = parse_comment(&comment, comment_ln)?;

        let mut atoms = Vec::with_capacity(count);
        let mut coords = Vec::with_capacity(count);
        let mut forces = Vec::with_capacity(count);
        let mut last_ln = comment_ln;
        for _ in 0..count {
            let (ln, raw) = lines.next().transpose()?.ok_or_else(|| {
                Error::parse(Format::Xyz, last_ln, "frame ended before all atoms were read")
            })?;
            let (element, xyz, force) = parse_atom(&raw, ln)?;
            atoms.push(element);
            coords.push(xyz);
            if let Some(f) = force {
                forces.push(f);
            }
            last_ln = ln;
        }

        let mut molecule = Molecule::new(atoms, coords);
        if count > 0 && forces.len() == count {
            molecule = molecule.with_forces(forces);
        }
        if let Some(e) = energy {
            molecule = molecule.with_energy(e);
        }
        if let Some(e) = atomization {
            molecule = molecule.with_atomization(e);
        }
        molecules.push(molecule);
    }

    Ok(molecules)
}

fn parse_comment(line: &str, line_no: usize) -> Result<(Option<f64>, Option<f64>), Error> {
    let mut energy = None;
    let mut atomization = None;
    for token in line.split_whitespace() {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        let slot = match key.to_ascii_lowercase().as_str() {
            "energy" => &mut energy,
            "atomization" => &mut atomization,
            _ => continue,
        };
        let value = value.parse::<f64>().map_err(|_| {
            Error::parse(Format::Xyz, line_no, format!("invalid value for '{key}'"))
        })?;
        *slot = Some(value);
    }
    Ok((energy, atomization))
}

fn parse_element(token: &str) -> Option<Element> {
    token.parse::<Element>().ok().or_else(|| {
        token
            .parse::<u8>()
            .ok()
            .and_then(Element::from_atomic_number)
    })
}

type AtomLine = (Element, [f64; 3], Option<[f64; 3]>);

fn parse_atom(line: &str, line_no: usize) -> Result<AtomLine, Error> {
    let tokens: Vec<_> = line.split_whitespace().collect();
    if tokens.len() != 4 && tokens.len() != 7 {
        return Err(Error::parse(
            Format::Xyz,
            line_no,
            "atom line must have 4 or 7 columns",
        ));
    }

    let element = parse_element(tokens[0])
        .ok_or_else(|| Error::parse(Format::Xyz, line_no, "unknown element"))?;
    let mut values = [0.0; 6];
    for (slot, token) in values.iter_mut().zip(&tokens[1..]) {
        *slot = token
            .parse::<f64>()
            .map_err(|_| Error::parse(Format::Xyz, line_no, "invalid numeric column"))?;
    }

    let xyz = [values[0], values[1], values[2]];
    let force = (tokens.len() == 7).then(|| [values[3], values[4], values[5]]);
    Ok((element, xyz, force))
}
