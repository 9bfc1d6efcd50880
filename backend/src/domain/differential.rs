//! Normalisation of vendor scores into canonical confidences.

use std::collections::BTreeMap;

use super::diagnosis::{Confidence, DifferentialEntry};

/// One vendor differential entry before normalisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDifferential {
    pub condition: String,
    pub probability: Option<f64>,
    pub score: Option<f64>,
    pub rationale: Option<String>,
    pub codes: BTreeMap<String, String>,
}

impl RawDifferential {
    fn weight(&self) -> f64 {
        let raw = self.probability.or(self.score).unwrap_or(0.0);
        if raw.is_finite() { raw.max(0.0) } else { 0.0 }
    }
}

/// Convert vendor scores into confidences summing to at most one.
///
/// Each entry weighs `max(probability, 0)` when a probability is present,
/// else `max(score, 0)`, else zero. Non-finite values weigh zero. When the
/// total weight is zero no entry receives a confidence. Order, names and
/// codes are preserved.
///
/// # Examples
/// ```
/// use ddx_gateway::domain::{normalize_differential, RawDifferential};
///
/// let entries = normalize_differential(vec![
///     RawDifferential { condition: "A".into(), score: Some(3.0), ..Default::default() },
///     RawDifferential { condition: "B".into(), score: Some(1.0), ..Default::default() },
/// ]);
/// let confidences: Vec<f64> = entries
///     .iter()
///     .filter_map(|e| e.confidence.map(|c| c.value()))
///     .collect();
/// assert_eq!(confidences, vec![0.75, 0.25]);
/// ```
#[must_use]
pub fn normalize_differential(entries: Vec<RawDifferential>) -> Vec<DifferentialEntry> {
    let weights: Vec<f64> = entries.iter().map(RawDifferential::weight).collect();
    let sum: f64 = weights.iter().sum();

    entries
        .into_iter()
        .zip(weights)
        .map(|(raw, weight)| {
            let confidence = if sum > 0.0 {
                Confidence::new((weight / sum).min(1.0)).ok()
            } else {
                None
            };
            DifferentialEntry {
                condition: raw.condition,
                confidence,
                rationale: raw.rationale,
                codes: raw.codes,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn raw(condition: &str, probability: Option<f64>, score: Option<f64>) -> RawDifferential {
        RawDifferential {
            condition: condition.to_owned(),
            probability,
            score,
            ..RawDifferential::default()
        }
    }

    fn confidences(entries: &[DifferentialEntry]) -> Vec<Option<f64>> {
        entries
            .iter()
            .map(|entry| entry.confidence.map(Confidence::value))
            .collect()
    }

    #[rstest]
    fn probability_preferred_over_score() {
        let entries = normalize_differential(vec![
            raw("A", Some(0.2), Some(100.0)),
            raw("B", Some(0.2), None),
        ]);
        assert_eq!(confidences(&entries), vec![Some(0.5), Some(0.5)]);
    }

    #[rstest]
    fn negative_values_weigh_zero() {
        let entries = normalize_differential(vec![raw("A", None, Some(-4.0)), raw("B", None, Some(2.0))]);
        assert_eq!(confidences(&entries), vec![Some(0.0), Some(1.0)]);
    }

    #[rstest]
    fn non_finite_values_weigh_zero() {
        let entries = normalize_differential(vec![
            raw("A", Some(f64::NAN), None),
            raw("B", None, Some(f64::INFINITY)),
            raw("C", Some(0.3), None),
        ]);
        assert_eq!(confidences(&entries), vec![Some(0.0), Some(0.0), Some(1.0)]);
    }

    #[rstest]
    #[case(vec![raw("A", None, None), raw("B", None, None)])]
    #[case(vec![raw("A", Some(0.0), None), raw("B", None, Some(-1.0))])]
    fn all_zero_omits_confidence(#[case] entries: Vec<RawDifferential>) {
        let normalised = normalize_differential(entries);
        assert!(normalised.iter().all(|entry| entry.confidence.is_none()));
    }

    #[rstest]
    fn empty_input_yields_empty_output() {
        assert!(normalize_differential(Vec::new()).is_empty());
    }

    #[rstest]
    fn preserves_order_and_codes() {
        let mut first = raw("Pneumonia", None, Some(8.0));
        first.codes.insert("icd10".to_owned(), "J18.9".to_owned());
        let entries = normalize_differential(vec![first, raw("Bronchitis", None, Some(2.0))]);

        assert_eq!(entries[0].condition, "Pneumonia");
        assert_eq!(entries[0].codes.get("icd10").map(String::as_str), Some("J18.9"));
        assert_eq!(entries[1].condition, "Bronchitis");
    }

    #[rstest]
    fn confidences_sum_to_at_most_one() {
        let entries = normalize_differential(vec![
            raw("A", None, Some(0.1)),
            raw("B", None, Some(0.2)),
            raw("C", None, Some(0.7)),
        ]);
        let total: f64 = confidences(&entries).into_iter().flatten().sum();
        assert!(total <= 1.0 + f64::EPSILON);
    }
}
