use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{EXTRA_CONFIGURATION, EXTRA_ELEMENT, Extras, ModelError, ModelResult};

/// Atom of a crystal structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Chemical symbol (e.g. `"O"`).
    pub symbol: String,
    /// Cartesian position in Å.
    pub position: [f64; 3],
}

impl Site {
    pub fn new(symbol: impl Into<String>, position: [f64; 3]) -> Self {
        Self {
            symbol: symbol.into(),
            position,
        }
    }
}

/// Periodic crystal structure.
///
/// `cell` rows are the lattice vectors in Å.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub cell: [[f64; 3]; 3],
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default, skip_serializing_if = "Extras::is_empty")]
    pub extras: Extras,
}

impl Structure {
    pub fn new(cell: [[f64; 3]; 3], sites: Vec<Site>) -> Self {
        Self {
            cell,
            sites,
            extras: Extras::new(),
        }
    }

    pub fn natoms(&self) -> usize {
        self.sites.len()
    }

    /// Cell volume in Å³.
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.cell;
        let det = a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0]);
        det.abs()
    }

    /// Return a copy scaled isotropically to `target` volume.
    ///
    /// Atoms move with the cell, so fractional coordinates are unchanged.
    /// Extras are copied.
    pub fn rescaled(&self, target: f64) -> ModelResult<Structure> {
        if !target.is_finite() || target <= 0.0 {
            return Err(ModelError::InvalidVolume(target));
        }
        let current = self.volume();
        if !current.is_finite() || current <= 0.0 {
            return Err(ModelError::DegenerateCell(current));
        }

        let linscale = (target / current).cbrt();
        let scale = |v: [f64; 3]| v.map(|x| x * linscale);

        Ok(Structure {
            cell: self.cell.map(scale),
            sites: self
                .sites
                .iter()
                .map(|s| Site::new(s.symbol.clone(), scale(s.position)))
                .collect(),
            extras: self.extras.clone(),
        })
    }

    /// Chemical formula in Hill order.
    ///
    /// Carbon first and hydrogen second when carbon is present, everything else
    /// alphabetically. Counts of one are omitted (`"HO3"`, `"CH4"`, `"Al2O3"`).
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for site in &self.sites {
            *counts.entry(site.symbol.as_str()).or_default() += 1;
        }

        let mut order: Vec<&str> = Vec::with_capacity(counts.len());
        if counts.contains_key("C") {
            order.push("C");
            if counts.contains_key("H") {
                order.push("H");
            }
            order.extend(counts.keys().copied().filter(|s| *s != "C" && *s != "H"));
        } else {
            order.extend(counts.keys().copied());
        }

        let mut out = String::new();
        for symbol in order {
            out.push_str(symbol);
            match counts[symbol] {
                1 => {}
                n => out.push_str(&n.to_string()),
            }
        }
        out
    }

    pub fn element(&self) -> Option<&str> {
        self.extras.get(EXTRA_ELEMENT)
    }

    pub fn configuration(&self) -> Option<&str> {
        self.extras.get(EXTRA_CONFIGURATION)
    }

    /// `<element>-<configuration>` key (e.g. `"H-XO3"`), if both extras are set.
    pub fn formula_key(&self) -> Option<String> {
        Some(format!("{}-{}", self.element()?, self.configuration()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic(a: f64, sites: Vec<Site>) -> Structure {
        Structure::new([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]], sites)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn volume_of_cubic_and_triclinic_cells() {
        assert!(approx(cubic(2.0, vec![]).volume(), 8.0));

        let tri = Structure::new([[2.0, 0.0, 0.0], [1.0, 2.0, 0.0], [0.5, 0.5, 3.0]], vec![]);
        assert!(approx(tri.volume(), 12.0));
    }

    #[test]
    fn rescale_hits_target_and_keeps_fractional_positions() {
        let mut s = cubic(2.0, vec![Site::new("H", [1.0, 1.0, 1.0]), Site::new("O", [0.0; 3])]);
        s.extras.insert("element", "H").insert("configuration", "XO3");

        let out = s.rescaled(64.0).unwrap();
        assert!(approx(out.volume(), 64.0));
        assert!(approx(out.cell[0][0], 4.0));
        assert_eq!(out.sites[0].position.map(|x| (x * 1e9).round()), [2e9; 3]);
        assert_eq!(out.extras, s.extras);
        assert_eq!(out.natoms(), 2);
    }

    #[test]
    fn rescale_rejects_bad_targets_and_flat_cells() {
        let s = cubic(2.0, vec![]);
        assert!(matches!(s.rescaled(0.0), Err(ModelError::InvalidVolume(_))));
        assert!(matches!(s.rescaled(-1.0), Err(ModelError::InvalidVolume(_))));
        assert!(matches!(s.rescaled(f64::NAN), Err(ModelError::InvalidVolume(_))));

        let flat = Structure::new([[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]], vec![]);
        assert!(matches!(flat.rescaled(10.0), Err(ModelError::DegenerateCell(_))));
    }

    #[test]
    fn hill_formula() {
        let sites = |syms: &[&str]| -> Vec<Site> {
            syms.iter().map(|s| Site::new(*s, [0.0; 3])).collect()
        };

        assert_eq!(cubic(1.0, sites(&["O", "H", "O", "O"])).formula(), "HO3");
        assert_eq!(cubic(1.0, sites(&["H", "C", "H", "H", "H"])).formula(), "CH4");
        assert_eq!(cubic(1.0, sites(&["O", "Al", "O", "Al", "O"])).formula(), "Al2O3");
        assert_eq!(cubic(1.0, sites(&["O", "C", "O"])).formula(), "CO2");
        assert_eq!(cubic(1.0, vec![]).formula(), "");
    }

    #[test]
    fn formula_key_needs_both_extras() {
        let mut s = cubic(1.0, vec![]);
        assert_eq!(s.formula_key(), None);

        s.extras.insert("element", "H");
        assert_eq!(s.formula_key(), None);

        s.extras.insert("configuration", "XO3");
        assert_eq!(s.formula_key().as_deref(), Some("H-XO3"));
    }
}
