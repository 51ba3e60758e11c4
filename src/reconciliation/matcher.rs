//! Value matching between a searched amount and unmatched bank entries

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::BankEntry;

/// How a candidate relates to the searched value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Approximate,
}

/// A bank entry that could satisfy a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub entry: BankEntry,
    pub kind: MatchKind,
    /// Absolute distance from the searched value, in cents
    pub difference: u64,
}

/// Result of picking the single best match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Exact { entry_id: String },
    Approximate { entry_id: String, difference: u64 },
    NoMatchFound,
}

impl MatchOutcome {
    pub fn entry_id(&self) -> Option<&str> {
        match self {
            MatchOutcome::Exact { entry_id } | MatchOutcome::Approximate { entry_id, .. } => {
                Some(entry_id)
            }
            MatchOutcome::NoMatchFound => None,
        }
    }
}

/// Stateless matcher over an ordered slice of bank entries
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    tolerance_cents: u64,
}

impl Matcher {
    /// Exact-only matcher
    pub fn exact() -> Self {
        Self::default()
    }

    pub fn with_tolerance(tolerance_cents: u64) -> Self {
        Self { tolerance_cents }
    }

    pub fn tolerance(&self) -> u64 {
        self.tolerance_cents
    }

    /// Pick the best match in a single pass
    ///
    /// The earliest exact match wins; otherwise the closest approximate
    /// match within tolerance, ties going to the earliest entry. `entries`
    /// must be in insertion order.
    pub fn find<'a, I>(&self, target: Money, entries: I) -> MatchOutcome
    where
        I: IntoIterator<Item = &'a BankEntry>,
    {
        let mut best_approximate: Option<(&BankEntry, u64)> = None;

        for entry in entries {
            let difference = entry.value.abs_diff(target);
            if difference == 0 {
                return MatchOutcome::Exact {
                    entry_id: entry.id.clone(),
                };
            }
            if difference <= self.tolerance_cents
                && best_approximate.is_none_or(|(_, best)| difference < best)
            {
                best_approximate = Some((entry, difference));
            }
        }

        match best_approximate {
            Some((entry, difference)) => MatchOutcome::Approximate {
                entry_id: entry.id.clone(),
                difference,
            },
            None => MatchOutcome::NoMatchFound,
        }
    }

    /// All acceptable candidates, best first
    ///
    /// Ordered by distance from the target, then insertion order, so the
    /// head of the list is always what [`Matcher::find`] picks.
    pub fn rank<'a, I>(&self, target: Money, entries: I) -> Vec<MatchCandidate>
    where
        I: IntoIterator<Item = &'a BankEntry>,
    {
        let mut candidates: Vec<(usize, MatchCandidate)> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(order, entry)| {
                let difference = entry.value.abs_diff(target);
                if difference > self.tolerance_cents {
                    return None;
                }
                let kind = if difference == 0 {
                    MatchKind::Exact
                } else {
                    MatchKind::Approximate
                };
                Some((
                    order,
                    MatchCandidate {
                        entry: entry.clone(),
                        kind,
                        difference,
                    },
                ))
            })
            .collect();

        candidates.sort_by_key(|(order, candidate)| (candidate.difference, *order));
        candidates.into_iter().map(|(_, c)| c).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entries(values: &[(&str, i64)]) -> Vec<BankEntry> {
        values
            .iter()
            .map(|(id, cents)| {
                BankEntry::new(
                    id.to_string(),
                    NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                    Money::from_cents(*cents),
                    "PIX RECEBIDO".to_string(),
                    String::new(),
                )
            })
            .collect()
    }

    #[test]
    fn test_exact_match_prefers_earliest() {
        let bank = entries(&[("x", 500), ("1", 10050), ("2", 10050)]);
        let outcome = Matcher::exact().find(Money::from_cents(10050), &bank);
        assert_eq!(
            outcome,
            MatchOutcome::Exact {
                entry_id: "1".to_string()
            }
        );
    }

    #[test]
    fn test_exact_beats_earlier_approximate() {
        let bank = entries(&[("near", 10049), ("exact", 10050)]);
        let outcome = Matcher::with_tolerance(5).find(Money::from_cents(10050), &bank);
        assert_eq!(outcome.entry_id(), Some("exact"));
    }

    #[test]
    fn test_approximate_closest_then_earliest() {
        let bank = entries(&[("far", 10080), ("a", 10010), ("b", 9990), ("c", 10005)]);
        let matcher = Matcher::with_tolerance(100);

        assert_eq!(
            matcher.find(Money::from_cents(10000), &bank),
            MatchOutcome::Approximate {
                entry_id: "c".to_string(),
                difference: 5
            }
        );

        let tied = entries(&[("a", 10010), ("b", 9990)]);
        assert_eq!(
            matcher.find(Money::from_cents(10000), &tied).entry_id(),
            Some("a")
        );
    }

    #[test]
    fn test_no_match_outside_tolerance() {
        let bank = entries(&[("1", 10000)]);
        assert_eq!(
            Matcher::exact().find(Money::from_cents(99999), &bank),
            MatchOutcome::NoMatchFound
        );
        assert_eq!(
            Matcher::with_tolerance(10).find(Money::from_cents(10011), &bank),
            MatchOutcome::NoMatchFound
        );
        assert_eq!(
            Matcher::exact().find(Money::from_cents(1), &Vec::<BankEntry>::new()),
            MatchOutcome::NoMatchFound
        );
    }

    #[test]
    fn test_sign_matters() {
        let bank = entries(&[("out", -5000)]);
        assert_eq!(
            Matcher::exact().find(Money::from_cents(5000), &bank),
            MatchOutcome::NoMatchFound
        );
        assert_eq!(
            Matcher::exact()
                .find(Money::from_cents(-5000), &bank)
                .entry_id(),
            Some("out")
        );
    }

    #[test]
    fn test_rank_orders_candidates() {
        let bank = entries(&[("a", 10020), ("b", 10000), ("c", 9980), ("d", 10000), ("e", 20000)]);
        let ranked = Matcher::with_tolerance(50).rank(Money::from_cents(10000), &bank);
        let ids: Vec<&str> = ranked.iter().map(|c| c.entry.id.as_str()).collect();

        assert_eq!(ids, vec!["b", "d", "a", "c"]);
        assert_eq!(ranked[0].kind, MatchKind::Exact);
        assert_eq!(ranked[2].kind, MatchKind::Approximate);
        assert_eq!(ranked[2].difference, 20);

        let best = Matcher::with_tolerance(50).find(Money::from_cents(10000), &bank);
        assert_eq!(best.entry_id(), Some(ids[0]));
    }
}
