//! Tabulated amino-acid properties

/// Kyte-Doolittle hydropathy index
pub fn hydropathy(residue_name: &str) -> Option<f64> {
    let value = match residue_name.trim().to_ascii_uppercase().as_str() {
        "ALA" => 1.8,
        "ARG" => -4.5,
        "ASN" => -3.5,
        "ASP" => -3.5,
        "CYS" => 2.5,
        "GLN" => -3.5,
        "GLU" => -3.5,
        "GLY" => -0.4,
        "HIS" => -3.2,
        "ILE" => 4.5,
        "LEU" => 3.8,
        "LYS" => -3.9,
        "MET" => 1.9,
        "PHE" => 2.8,
        "PRO" => -1.6,
        "SER" => -0.8,
        "THR" => -0.7,
        "TRP" => -0.9,
        "TYR" => -1.3,
        "VAL" => 4.2,
        _ => return None,
    };
    Some(value)
}

/// Formal side-chain charge at neutral pH (histidine counted as protonated)
pub fn charge(residue_name: &str) -> i32 {
    match residue_name.trim().to_ascii_uppercase().as_str() {
        "ARG" | "LYS" | "HIS" => 1,
        "ASP" | "GLU" => -1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hydropathy_scale() {
        assert_eq!(hydropathy("ILE"), Some(4.5));
        assert_eq!(hydropathy("arg"), Some(-4.5));
        assert_eq!(hydropathy("HOH"), None);
    }

    #[test]
    fn test_charges() {
        assert_eq!(charge("LYS"), 1);
        assert_eq!(charge("HIS"), 1);
        assert_eq!(charge("GLU"), -1);
        assert_eq!(charge("SER"), 0);
    }
}
