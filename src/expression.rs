//! The tissue-expression table.
//!
//! Open Targets reports one row per tissue; the charts consume the top ten
//! by RNA value and by protein level. Sorting is stable and puts missing
//! values last, so tissues without a measurement never displace measured
//! ones.

/// One flattened tissue-expression row.
#[derive(Debug, Clone, PartialEq)]
pub struct TissueExpression {
    pub tissue: String,
    pub organs: Vec<String>,
    pub rna_value: Option<f64>,
    pub rna_unit: String,
    pub protein_reliability: Option<bool>,
    pub protein_level: Option<i64>,
}

impl TissueExpression {
    /// Protein level shifted by one so that level 0 still draws a bar.
    pub fn adjusted_protein_level(&self) -> Option<i64> {
        self.protein_level.map(|level| level + 1)
    }
}

/// Top `n` rows by RNA value, descending, missing values last.
pub fn top_by_rna(rows: &[TissueExpression], n: usize) -> Vec<TissueExpression> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| desc_f64(a.rna_value, b.rna_value));
    sorted.truncate(n);
    sorted
}

/// Top `n` rows by protein level, descending, missing values last.
pub fn top_by_protein(rows: &[TissueExpression], n: usize) -> Vec<TissueExpression> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| desc_i64(a.protein_level, b.protein_level));
    sorted.truncate(n);
    sorted
}

fn desc_f64(a: Option<f64>, b: Option<f64>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn desc_i64(a: Option<i64>, b: Option<i64>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn row(tissue: &str, rna: Option<f64>, protein: Option<i64>) -> TissueExpression {
        TissueExpression {
            tissue: tissue.to_string(),
            organs: vec![],
            rna_value: rna,
            rna_unit: String::new(),
            protein_reliability: None,
            protein_level: protein,
        }
    }

    #[test]
    fn test_top_by_rna_orders_descending() {
        let rows = vec![
            row("liver", Some(10.0), None),
            row("brain", Some(80.0), None),
            row("testis", None, None),
            row("kidney", Some(40.0), None),
        ];
        let top = top_by_rna(&rows, 3);
        let tissues: Vec<&str> = top.iter().map(|r| r.tissue.as_str()).collect();
        assert_eq!(tissues, vec!["brain", "kidney", "liver"]);
    }

    #[test]
    fn test_missing_rna_sorts_last() {
        let rows = vec![
            row("testis", None, None),
            row("liver", Some(1.0), None),
        ];
        let top = top_by_rna(&rows, 10);
        assert_eq!(top[0].tissue, "liver");
        assert_eq!(top[1].tissue, "testis");
    }

    #[test]
    fn test_top_by_protein_and_adjustment() {
        let rows = vec![
            row("skin", None, Some(0)),
            row("lung", None, Some(3)),
            row("heart", None, None),
        ];
        let top = top_by_protein(&rows, 2);
        assert_eq!(top[0].tissue, "lung");
        assert_eq!(top[1].tissue, "skin");
        assert_eq!(top[0].adjusted_protein_level(), Some(4));
        assert_eq!(top[1].adjusted_protein_level(), Some(1));
        assert_eq!(rows[2].adjusted_protein_level(), None);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let rows = vec![
            row("first", Some(5.0), None),
            row("second", Some(5.0), None),
        ];
        let top = top_by_rna(&rows, 2);
        assert_eq!(top[0].tissue, "first");
        assert_eq!(top[1].tissue, "second");
    }
}
