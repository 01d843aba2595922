//! Fixed-width tables and file exports

use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use crate::error::{DockError, Result};
use crate::ligand::Ligand;
use crate::molecule::Residue;
use crate::pockets::Pocket;
use crate::poses::PoseRecord;

/// Hydrogen-bonded residues of one pose
pub type PoseResidues = (usize, BTreeSet<Residue>);

fn csv_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    csv::Writer::from_path(path).map_err(|e| DockError::Io(e.into()))
}

fn csv_error(err: csv::Error) -> DockError {
    DockError::Io(err.into())
}

pub fn write_ligand(out: &mut dyn Write, ligand: &Ligand) -> Result<()> {
    write!(out, "{}", ligand)?;
    Ok(())
}

pub fn pocket_header() -> String {
    format!("{:<10} {:>10} {:>10} {:>10}", "Pocket ID", "SASA (A^2)", "GRAVY", "Charge")
}

pub fn pocket_row(pocket: &Pocket) -> String {
    let d = &pocket.descriptors;
    format!("{:<10} {:>10.2} {:>10.2} {:>10}", pocket.id, d.sasa, d.gravy, d.charge)
}

pub fn write_pockets<'a>(
    out: &mut dyn Write,
    pockets: impl IntoIterator<Item = &'a Pocket>,
) -> Result<()> {
    let header = pocket_header();
    writeln!(out, "{}", header)?;
    writeln!(out, "{}", "-".repeat(header.len()))?;
    for pocket in pockets {
        writeln!(out, "{}", pocket_row(pocket))?;
    }
    Ok(())
}

pub fn pose_header() -> String {
    format!(
        "{:<6} {:<8} {:<10} {:<8} {:<15} {:<25} {:<15}",
        "Pose", "Score", "Pocket", "HBonds", "GRAVY/LogP", "SASA(P/L/R)", "Charge(P/L)"
    )
}

/// One table row; pocket-derived parts of an unassigned pose show as `-`
pub fn pose_row(record: &PoseRecord) -> String {
    let pocket = record.pocket.as_deref().unwrap_or("unassigned");
    let two = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));

    let gravy = format!("{}/{:.2}", two(record.pocket_gravy), record.ligand_logp);
    let sasa = format!(
        "{}/{:.2}/{}",
        two(record.pocket_sasa),
        record.ligand_sasa,
        two(record.sasa_ratio)
    );
    let charge = format!(
        "{}/{}",
        record.pocket_charge.map_or_else(|| "-".to_string(), |c| c.to_string()),
        record.ligand_charge
    );

    format!(
        "{:<6} {:<8.1} {:<10} {:<8} {:<15} {:<25} {:<15}",
        record.pose_id, record.score, pocket, record.hbond_count, gravy, sasa, charge
    )
}

pub fn write_poses(out: &mut dyn Write, records: &[PoseRecord]) -> Result<()> {
    let header = pose_header();
    writeln!(out, "{}", header)?;
    writeln!(out, "{}", "-".repeat(header.len()))?;
    for record in records {
        writeln!(out, "{}", pose_row(record))?;
    }
    Ok(())
}

/// The `--res` view
pub fn write_pose_residues(out: &mut dyn Write, poses: &[PoseResidues]) -> Result<()> {
    writeln!(out, "\nHydrogen-bonding residues per pose:\n")?;
    for (pose_id, residues) in poses {
        if residues.is_empty() {
            writeln!(out, "Pose {:>2}: No hydrogen bonds.", pose_id)?;
        } else {
            let names: Vec<String> = residues.iter().map(|r| r.to_string()).collect();
            writeln!(out, "Pose {:>2}: {}", pose_id, names.join(", "))?;
        }
    }
    writeln!(out)?;
    Ok(())
}

pub fn export_ligand_csv(path: &Path, ligand: &Ligand) -> Result<()> {
    let mut writer = csv_writer(path)?;
    let rows = [
        ("Property", "Value".to_string()),
        ("SMILES", ligand.smiles.clone()),
        ("logP", format!("{:.2}", ligand.logp)),
        ("SASA", format!("{:.2}", ligand.sasa)),
        ("TPSA", format!("{:.2}", ligand.tpsa)),
        ("Volume", format!("{:.2}", ligand.volume)),
        ("Charge", ligand.charge.to_string()),
    ];
    for (property, value) in &rows {
        writer.write_record([*property, value.as_str()]).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_pockets_csv(path: &Path, pockets: &[Pocket]) -> Result<()> {
    let mut writer = csv_writer(path)?;
    writer
        .write_record(["Pocket_ID", "SASA", "GRAVY", "Charge"])
        .map_err(csv_error)?;
    for pocket in pockets {
        let d = &pocket.descriptors;
        writer
            .write_record([
                pocket.id.clone(),
                format!("{:.2}", d.sasa),
                format!("{:.2}", d.gravy),
                d.charge.to_string(),
            ])
            .map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

/// Every record field, one row per pose; unassigned fields are left empty
pub fn export_poses_csv(path: &Path, records: &[PoseRecord]) -> Result<()> {
    let mut writer = csv_writer(path)?;
    for record in records {
        writer.serialize(record).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_hbond_residues_csv(path: &Path, poses: &[PoseResidues]) -> Result<()> {
    let mut writer = csv_writer(path)?;
    writer.write_record(["Pose", "Residue"]).map_err(csv_error)?;
    for (pose_id, residues) in poses {
        for residue in residues {
            writer
                .write_record([pose_id.to_string(), residue.to_string()])
                .map_err(csv_error)?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
