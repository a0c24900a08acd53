//! Minimal readers for the structure formats the docking pipeline produces:
//! PDB/PDBQT (receptor and poses) and V2000 SDF (ligand topology).
//!
//! Only what the viewer needs is kept: atoms with element, residue and
//! coordinates, bonds for SDF, and one frame per `MODEL` / mol block.

use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureFormat {
    Pdb,
    Pdbqt,
    Sdf,
}

impl StructureFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureFormat::Pdb => "pdb",
            StructureFormat::Pdbqt => "pdbqt",
            StructureFormat::Sdf => "sdf",
        }
    }

    /// Guess from the file name; `x_ligand.pdbqt.sdf` is SDF.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "pdb" | "ent" => Some(StructureFormat::Pdb),
            "pdbqt" => Some(StructureFormat::Pdbqt),
            "sdf" | "mol" => Some(StructureFormat::Sdf),
            _ => None,
        }
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StructureError {
    #[error("no atoms found in {0} data")]
    Empty(StructureFormat),
    #[error("malformed {format} data at line {line}: {reason}")]
    Malformed { format: StructureFormat, line: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub serial: u32,
    pub name: String,
    pub element: String,
    pub residue: String,
    pub residue_seq: i32,
    pub chain: char,
    pub position: [f32; 3],
    pub hetero: bool,
}

impl Atom {
    pub fn is_hydrogen(&self) -> bool {
        self.element.eq_ignore_ascii_case("H")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub atoms: Vec<Atom>,
    /// Zero-based atom index pairs (SDF only).
    pub bonds: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub format: StructureFormat,
    pub frames: Vec<Frame>,
}

impl Structure {
    pub fn parse(text: &str, format: StructureFormat) -> Result<Self, StructureError> {
        let frames = match format {
            StructureFormat::Pdb | StructureFormat::Pdbqt => parse_pdb_records(text, format),
            StructureFormat::Sdf => parse_sdf(text)?,
        };
        let frames: Vec<Frame> = frames.into_iter().filter(|f| !f.atoms.is_empty()).collect();
        if frames.is_empty() {
            return Err(StructureError::Empty(format));
        }
        Ok(Self { format, frames })
    }

    /// Atoms of the first frame.
    pub fn atoms(&self) -> &[Atom] {
        &self.frames[0].atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms().len()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Lowest and highest residue number, for sequence-position colouring.
    pub fn residue_span(&self) -> (i32, i32) {
        let seqs = self.atoms().iter().map(|a| a.residue_seq);
        let lo = seqs.clone().min().unwrap_or(0);
        let hi = seqs.max().unwrap_or(0);
        (lo, hi)
    }
}

// ── PDB / PDBQT ───────────────────────────────────────────────────────────────

fn column(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("").trim()
}

/// AutoDock atom types that are not plain element symbols.
fn element_from_autodock_type(ad_type: &str) -> Option<&'static str> {
    match ad_type {
        "A" => Some("C"),
        "OA" | "OS" => Some("O"),
        "NA" | "NS" => Some("N"),
        "HD" | "HS" => Some("H"),
        "SA" => Some("S"),
        _ => None,
    }
}

fn element_for(line: &str, name: &str, format: StructureFormat) -> String {
    if format == StructureFormat::Pdbqt {
        let ad_type = column(line, 77, 79);
        if let Some(el) = element_from_autodock_type(ad_type) {
            return el.to_string();
        }
        if !ad_type.is_empty() {
            return ad_type.to_string();
        }
    } else {
        let el = column(line, 76, 78);
        if !el.is_empty() {
            return el.to_string();
        }
    }
    name.chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}

fn parse_pdb_records(text: &str, format: StructureFormat) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut current = Frame::default();

    for line in text.lines() {
        let record = column(line, 0, 6);
        match record {
            "MODEL" => {
                if !current.atoms.is_empty() {
                    frames.push(std::mem::take(&mut current));
                }
            }
            "ENDMDL" => frames.push(std::mem::take(&mut current)),
            "ATOM" | "HETATM" => {
                let coords = (
                    column(line, 30, 38).parse::<f32>(),
                    column(line, 38, 46).parse::<f32>(),
                    column(line, 46, 54).parse::<f32>(),
                );
                let (Ok(x), Ok(y), Ok(z)) = coords else {
                    tracing::debug!(line, "skipping atom record with unreadable coordinates");
                    continue;
                };
                let name = column(line, 12, 16).to_string();
                current.atoms.push(Atom {
                    serial: column(line, 6, 11).parse().unwrap_or(0),
                    element: element_for(line, &name, format),
                    name,
                    residue: column(line, 17, 20).to_string(),
                    residue_seq: column(line, 22, 26).parse().unwrap_or(0),
                    chain: column(line, 21, 22).chars().next().unwrap_or(' '),
                    position: [x, y, z],
                    hetero: record == "HETATM",
                });
            }
            _ => {}
        }
    }
    if !current.atoms.is_empty() {
        frames.push(current);
    }
    frames
}

// ── SDF ───────────────────────────────────────────────────────────────────────

fn parse_sdf(text: &str) -> Result<Vec<Frame>, StructureError> {
    let mut frames = Vec::new();
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        if lines[i..].iter().all(|l| l.trim().is_empty()) {
            break;
        }
        let counts_idx = i + 3;
        let Some(counts) = lines.get(counts_idx) else { break };
        let malformed = |reason: &str| StructureError::Malformed {
            format: StructureFormat::Sdf,
            line: counts_idx + 1,
            reason: reason.to_string(),
        };

        let n_atoms: usize = column(counts, 0, 3).parse().map_err(|_| malformed("bad atom count"))?;
        let n_bonds: usize = column(counts, 3, 6).parse().map_err(|_| malformed("bad bond count"))?;

        let mut frame = Frame::default();
        for (k, line) in lines.iter().skip(counts_idx + 1).take(n_atoms).enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(StructureError::Malformed {
                    format: StructureFormat::Sdf,
                    line: counts_idx + 2 + k,
                    reason: "short atom line".to_string(),
                });
            }
            let coord = |s: &str| s.parse::<f32>().unwrap_or(0.0);
            frame.atoms.push(Atom {
                serial: k as u32 + 1,
                name: fields[3].to_string(),
                element: fields[3].to_string(),
                residue: "LIG".to_string(),
                residue_seq: 1,
                chain: ' ',
                position: [coord(fields[0]), coord(fields[1]), coord(fields[2])],
                hetero: true,
            });
        }

        let bond_start = counts_idx + 1 + n_atoms;
        for line in lines.iter().skip(bond_start).take(n_bonds) {
            let a = column(line, 0, 3).parse::<usize>();
            let b = column(line, 3, 6).parse::<usize>();
            if let (Ok(a), Ok(b)) = (a, b) {
                if a >= 1 && b >= 1 && a <= n_atoms && b <= n_atoms {
                    frame.bonds.push((a - 1, b - 1));
                }
            }
        }
        frames.push(frame);

        // Advance past the record terminator.
        let mut j = bond_start + n_bonds;
        while j < lines.len() && lines[j].trim() != "$$$$" {
            j += 1;
        }
        i = j + 1;
    }

    Ok(frames)
}
