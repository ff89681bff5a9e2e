//! Classification of Ct matrix columns into housekeeping and target genes

use crate::error::{QpcrError, Result};

/// Gene identity of a `gene_replicate` column: the text before the first `_`
pub fn gene_of(column_id: &str) -> &str {
    column_id.split('_').next().unwrap_or(column_id)
}

/// Housekeeping and target columns of a Ct matrix
///
/// Housekeeping columns are matched by substring containment, so a
/// housekeeping name that occurs inside a target gene name captures that
/// gene's columns as well.
#[derive(Debug, Clone)]
pub struct GenePanel {
    housekeeping: String,
    housekeeping_columns: Vec<usize>,
    target_columns: Vec<usize>,
    genes: Vec<String>,
}

impl GenePanel {
    /// Split `column_ids` by the housekeeping substring and collect the sorted target genes
    pub fn discover(column_ids: &[String], housekeeping: &str) -> Result<Self> {
        if housekeeping.trim().is_empty() {
            return Err(QpcrError::InvalidInput {
                reason: "Housekeeping gene name must not be empty".to_string(),
            });
        }

        let (housekeeping_columns, target_columns): (Vec<usize>, Vec<usize>) =
            (0..column_ids.len()).partition(|&j| column_ids[j].contains(housekeeping));

        if housekeeping_columns.is_empty() {
            return Err(QpcrError::UnknownHousekeeping {
                name: housekeeping.to_string(),
            });
        }

        let mut genes: Vec<String> = target_columns
            .iter()
            .map(|&j| gene_of(&column_ids[j]).to_string())
            .collect();
        genes.sort();
        genes.dedup();

        log::debug!(
            "Housekeeping '{}' matched {} column(s); {} target gene(s)",
            housekeeping,
            housekeeping_columns.len(),
            genes.len()
        );

        Ok(Self {
            housekeeping: housekeeping.to_string(),
            housekeeping_columns,
            target_columns,
            genes,
        })
    }

    pub fn housekeeping(&self) -> &str {
        &self.housekeeping
    }

    /// Column indices of the housekeeping gene
    pub fn housekeeping_columns(&self) -> &[usize] {
        &self.housekeeping_columns
    }

    /// Distinct target genes, sorted ascending
    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    /// Column indices of one target gene's replicates
    pub fn target_columns_for(&self, gene: &str, column_ids: &[String]) -> Vec<usize> {
        self.target_columns
            .iter()
            .copied()
            .filter(|&j| gene_of(&column_ids[j]) == gene)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_gene_of() {
        assert_eq!(gene_of("GeneA_1"), "GeneA");
        assert_eq!(gene_of("Il6_2_extra"), "Il6");
        assert_eq!(gene_of("NoSuffix"), "NoSuffix");
    }

    #[test]
    fn test_discover_panel() {
        let columns = ids(&["Il6_1", "Gapdh_1", "Tnf_1", "Gapdh_2", "Il6_2"]);
        let panel = GenePanel::discover(&columns, "Gapdh").unwrap();
        assert_eq!(panel.housekeeping_columns(), &[1, 3]);
        assert_eq!(panel.genes(), &["Il6", "Tnf"]);
        assert_eq!(panel.target_columns_for("Il6", &columns), vec![0, 4]);
        assert_eq!(panel.target_columns_for("Tnf", &columns), vec![2]);
    }

    #[test]
    fn test_housekeeping_matches_substring() {
        let columns = ids(&["Actb_1", "bActb_1", "Il6_1"]);
        let panel = GenePanel::discover(&columns, "Actb").unwrap();
        assert_eq!(panel.housekeeping_columns(), &[0, 1]);
        assert_eq!(panel.genes(), &["Il6"]);
    }

    #[test]
    fn test_unknown_housekeeping() {
        let columns = ids(&["Il6_1"]);
        let result = GenePanel::discover(&columns, "Gapdh");
        assert!(matches!(result, Err(QpcrError::UnknownHousekeeping { name }) if name == "Gapdh"));
    }

    #[test]
    fn test_empty_housekeeping_rejected() {
        let columns = ids(&["Il6_1"]);
        assert!(GenePanel::discover(&columns, " ").is_err());
    }
}
