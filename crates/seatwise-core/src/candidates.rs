//! # Candidate Generator
//!
//! Enumerates single tables and valid multi-table combinations able to seat
//! a party, independent of time. Probing against the interval index happens
//! afterwards, per slot.
//!
//! ## Enumeration Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Candidate Enumeration                               │
//! │                                                                         │
//! │  Singles:  every active table with                                     │
//! │            capacity_min <= party_size <= capacity_max                  │
//! │                                                                         │
//! │  Pairs /   members form a clique in the combinability graph, and       │
//! │  Triples:  party_size <= combined <= party_size * max_oversize_ratio   │
//! │                                                                         │
//! │  Never 4+ tables (combinatorial growth, no real-world benefit)         │
//! │                                                                         │
//! │  Ordering: wasted capacity asc                                         │
//! │            → fewest tables (single > pair > triple)                    │
//! │            → caller type-preference rank                               │
//! │            → table ids (determinism)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::catalog::TableCatalog;
use crate::types::{Candidate, Table, TableId, TableType};
use crate::DEFAULT_MAX_OVERSIZE_RATIO;

// =============================================================================
// Options
// =============================================================================

/// Knobs for candidate enumeration.
#[derive(Debug, Clone)]
pub struct CandidateOptions {
    /// Upper bound on combination size relative to the party:
    /// `combined <= party_size * max_oversize_ratio`.
    pub max_oversize_ratio: f64,

    /// Caller-supplied table-type preference, best first. Tables whose type
    /// is absent rank after every listed type. Empty = no preference.
    pub type_preference: Vec<TableType>,
}

impl Default for CandidateOptions {
    fn default() -> Self {
        CandidateOptions {
            max_oversize_ratio: DEFAULT_MAX_OVERSIZE_RATIO,
            type_preference: Vec::new(),
        }
    }
}

// =============================================================================
// Generation
// =============================================================================

/// Enumerates all candidates for `party_size`, ordered best-first.
///
/// Returns an empty vec when nothing in the catalog can seat the party -
/// a normal empty result, never an error.
pub fn generate(
    catalog: &TableCatalog,
    party_size: u32,
    options: &CandidateOptions,
) -> Vec<Candidate> {
    if party_size == 0 {
        return Vec::new();
    }

    let tables = catalog.active_tables();
    let max_combined = combined_cap_limit(party_size, options.max_oversize_ratio);
    let mut candidates: Vec<Candidate> = Vec::new();

    // Singles: per-table capacity range decides, no oversize ratio.
    for table in &tables {
        if table.fits_party(party_size) {
            candidates.push(Candidate::new(
                vec![table.id.clone()],
                table.capacity_max,
            ));
        }
    }

    // Pairs and triples. A triple can only form around a joinable pair, so
    // the missing a-b edge prunes both at once.
    for (i, a) in tables.iter().enumerate() {
        for (j, b) in tables.iter().enumerate().skip(i + 1) {
            if !catalog.joinable(&a.id, &b.id) {
                continue;
            }
            push_combination(
                catalog,
                vec![a.id.clone(), b.id.clone()],
                party_size,
                max_combined,
                &mut candidates,
            );
            for c in &tables[j + 1..] {
                push_combination(
                    catalog,
                    vec![a.id.clone(), b.id.clone(), c.id.clone()],
                    party_size,
                    max_combined,
                    &mut candidates,
                );
            }
        }
    }

    sort_candidates(&mut candidates, catalog, party_size, &options.type_preference);
    candidates
}

/// Appends `ids` as a combination candidate if its members form a clique
/// and the combined capacity lands inside the party's bounds.
fn push_combination(
    catalog: &TableCatalog,
    ids: Vec<TableId>,
    party_size: u32,
    max_combined: u32,
    out: &mut Vec<Candidate>,
) {
    if !catalog.is_clique(&ids) {
        return;
    }
    let Some(combined) = catalog.combined_capacity(&ids) else {
        return;
    };
    if combined >= party_size && combined <= max_combined {
        out.push(Candidate::new(ids, combined));
    }
}

/// Largest combined capacity a combination may have for this party.
fn combined_cap_limit(party_size: u32, ratio: f64) -> u32 {
    (f64::from(party_size) * ratio).floor() as u32
}

/// Preference rank of a candidate: best rank among member tables.
fn preference_rank(
    candidate: &Candidate,
    catalog: &TableCatalog,
    preference: &[TableType],
) -> usize {
    candidate
        .table_ids
        .iter()
        .filter_map(|id| catalog.table(id))
        .map(|t: &Table| {
            preference
                .iter()
                .position(|p| *p == t.table_type)
                .unwrap_or(preference.len())
        })
        .min()
        .unwrap_or(preference.len())
}

fn sort_candidates(
    candidates: &mut [Candidate],
    catalog: &TableCatalog,
    party_size: u32,
    preference: &[TableType],
) {
    candidates.sort_by(|a, b| {
        a.wasted_capacity(party_size)
            .cmp(&b.wasted_capacity(party_size))
            .then_with(|| a.table_ids.len().cmp(&b.table_ids.len()))
            .then_with(|| {
                preference_rank(a, catalog, preference)
                    .cmp(&preference_rank(b, catalog, preference))
            })
            .then_with(|| a.table_ids.cmp(&b.table_ids))
    });
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn table(id: &str, min: u32, max: u32, table_type: TableType) -> crate::types::Table {
        crate::types::Table {
            id: id.to_string(),
            venue_id: "v-1".to_string(),
            table_number: id.to_uppercase(),
            capacity_min: min,
            capacity_max: max,
            table_type,
            is_active: true,
        }
    }

    #[test]
    fn test_singles_respect_capacity_range() {
        let catalog = TableCatalog::new(
            vec![
                table("t1", 2, 4, TableType::Standard),
                table("t2", 5, 8, TableType::Standard),
            ],
            vec![],
        );

        // party of 2 fits t1 only; t2's minimum is 5
        let found = generate(&catalog, 2, &CandidateOptions::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].table_ids, vec!["t1".to_string()]);
        assert!(!found[0].requires_combination);

        // party of 6 fits t2 only
        let found = generate(&catalog, 6, &CandidateOptions::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].table_ids, vec!["t2".to_string()]);
    }

    #[test]
    fn test_pair_combination_when_no_single_fits() {
        // Scenario: party of 6, two combinable 4-tops, no single table >= 6.
        let catalog = TableCatalog::new(
            vec![
                table("t2", 1, 4, TableType::Standard),
                table("t3", 1, 4, TableType::Standard),
            ],
            vec![("t2".into(), "t3".into())],
        );

        let found = generate(&catalog, 6, &CandidateOptions::default());
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].table_ids,
            vec!["t2".to_string(), "t3".to_string()]
        );
        assert!(found[0].requires_combination);
        assert_eq!(found[0].wasted_capacity(6), 2);
    }

    #[test]
    fn test_non_clique_pairs_excluded() {
        let catalog = TableCatalog::new(
            vec![
                table("t1", 1, 4, TableType::Standard),
                table("t2", 1, 4, TableType::Standard),
            ],
            vec![], // no edges at all
        );
        assert!(generate(&catalog, 6, &CandidateOptions::default()).is_empty());
    }

    #[test]
    fn test_triple_requires_full_clique() {
        let tables = vec![
            table("t1", 1, 4, TableType::Standard),
            table("t2", 1, 4, TableType::Standard),
            table("t3", 1, 4, TableType::Standard),
        ];

        // path t1-t2-t3 only: the t1-t3 edge is missing
        let path = TableCatalog::new(
            tables.clone(),
            vec![("t1".into(), "t2".into()), ("t2".into(), "t3".into())],
        );
        let found = generate(&path, 10, &CandidateOptions::default());
        assert!(found.is_empty());

        // full triangle
        let triangle = TableCatalog::new(
            tables,
            vec![
                ("t1".into(), "t2".into()),
                ("t2".into(), "t3".into()),
                ("t1".into(), "t3".into()),
            ],
        );
        let found = generate(&triangle, 10, &CandidateOptions::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].table_ids.len(), 3);
        assert_eq!(found[0].combined_capacity, 12);
    }

    #[test]
    fn test_oversize_ratio_bounds_combinations() {
        let catalog = TableCatalog::new(
            vec![
                table("t1", 1, 8, TableType::Standard),
                table("t2", 1, 8, TableType::Standard),
            ],
            vec![("t1".into(), "t2".into())],
        );

        // party of 4: pair capacity 16 > 4 * 2.0 = 8, excluded; both singles fit
        let found = generate(&catalog, 4, &CandidateOptions::default());
        assert!(found.iter().all(|c| !c.requires_combination));

        // relaxed ratio admits the pair
        let relaxed = CandidateOptions {
            max_oversize_ratio: 4.0,
            ..Default::default()
        };
        let found = generate(&catalog, 4, &relaxed);
        assert!(found.iter().any(|c| c.requires_combination));
    }

    #[test]
    fn test_never_more_than_three_tables() {
        // Four 2-tops forming a complete graph; party of 10 needs all four,
        // which is beyond the combination limit: nothing qualifies.
        let ids = ["t1", "t2", "t3", "t4"];
        let tables = ids
            .iter()
            .map(|id| table(id, 1, 2, TableType::Standard))
            .collect();
        let mut edges = Vec::new();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                edges.push((a.to_string(), b.to_string()));
            }
        }
        let catalog = TableCatalog::new(tables, edges);
        assert!(generate(&catalog, 10, &CandidateOptions::default()).is_empty());
    }

    #[test]
    fn test_every_candidate_seats_the_party() {
        let catalog = TableCatalog::new(
            vec![
                table("t1", 1, 4, TableType::Booth),
                table("t2", 1, 4, TableType::Standard),
                table("t3", 1, 6, TableType::Standard),
            ],
            vec![("t1".into(), "t2".into()), ("t2".into(), "t3".into())],
        );
        for party in 1..=10 {
            for candidate in generate(&catalog, party, &CandidateOptions::default()) {
                assert!(candidate.combined_capacity >= party);
                assert_eq!(
                    candidate.requires_combination,
                    candidate.table_ids.len() > 1
                );
                assert!(candidate.table_ids.len() <= crate::MAX_COMBINATION_TABLES);
            }
        }
    }

    #[test]
    fn test_ordering_wasted_then_fewest_tables() {
        let catalog = TableCatalog::new(
            vec![
                table("t1", 1, 6, TableType::Standard), // single, waste 2
                table("t2", 1, 4, TableType::Standard),
                table("t3", 1, 2, TableType::Standard), // pair t2+t3, waste 2
                table("t4", 1, 4, TableType::Standard), // single, waste 0
            ],
            vec![("t2".into(), "t3".into())],
        );

        let found = generate(&catalog, 4, &CandidateOptions::default());
        // t4 first (waste 0), then t1 (waste 2, single) before t2+t3 (waste 2, pair)
        assert_eq!(found[0].table_ids, vec!["t4".to_string()]);
        assert_eq!(found[1].table_ids, vec!["t1".to_string()]);
        assert_eq!(
            found[2].table_ids,
            vec!["t2".to_string(), "t3".to_string()]
        );
    }

    #[test]
    fn test_type_preference_breaks_ties() {
        let catalog = TableCatalog::new(
            vec![
                table("t1", 1, 4, TableType::Standard),
                table("t2", 1, 4, TableType::Booth),
            ],
            vec![],
        );

        let booth_first = CandidateOptions {
            type_preference: vec![TableType::Booth],
            ..Default::default()
        };
        let found = generate(&catalog, 4, &booth_first);
        assert_eq!(found[0].table_ids, vec!["t2".to_string()]);

        // no preference: id order decides
        let found = generate(&catalog, 4, &CandidateOptions::default());
        assert_eq!(found[0].table_ids, vec!["t1".to_string()]);
    }

    #[test]
    fn test_inactive_tables_never_offered() {
        let mut dark = table("t9", 1, 4, TableType::Standard);
        dark.is_active = false;
        let catalog = TableCatalog::new(vec![dark], vec![]);
        assert!(generate(&catalog, 2, &CandidateOptions::default()).is_empty());
    }
}
