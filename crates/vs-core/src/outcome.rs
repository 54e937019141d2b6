use serde::{Deserialize, Serialize};

/// Attitude a voter holds toward one entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Favorable,
    Neutral,
    Unfavorable,
    Unknown,
}

impl Category {
    /// All categories in marginal order.
    pub const ALL: [Category; 4] = [
        Category::Favorable,
        Category::Neutral,
        Category::Unfavorable,
        Category::Unknown,
    ];

    /// Position of this category inside a marginal and the outcome table.
    pub fn index(self) -> usize {
        match self {
            Category::Favorable => 0,
            Category::Neutral => 1,
            Category::Unfavorable => 2,
            Category::Unknown => 3,
        }
    }
}

/// Outcome of one (A attitude, B attitude) pairing: probability that the
/// voter picks A, picks B, or stays home. The three weights sum to 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeWeight {
    pub a: f64,
    pub b: f64,
    pub abstain: f64,
}

impl OutcomeWeight {
    const fn new(a: f64, b: f64, abstain: f64) -> Self {
        Self { a, b, abstain }
    }

    /// The same outcome seen from the other entity's side.
    pub fn swapped(self) -> Self {
        Self {
            a: self.b,
            b: self.a,
            abstain: self.abstain,
        }
    }
}

const THIRD: f64 = 1.0 / 3.0;

/// Rows are A's attitude, columns are B's attitude, both in
/// [`Category::ALL`] order. Favorable beats anything, dislike against
/// dislike abstains, unknowns mostly abstain.
pub const OUTCOME_MATRIX: [[OutcomeWeight; 4]; 4] = [
    // A favorable
    [
        OutcomeWeight::new(0.5, 0.5, 0.0),
        OutcomeWeight::new(1.0, 0.0, 0.0),
        OutcomeWeight::new(1.0, 0.0, 0.0),
        OutcomeWeight::new(1.0, 0.0, 0.0),
    ],
    // A neutral
    [
        OutcomeWeight::new(0.0, 1.0, 0.0),
        OutcomeWeight::new(THIRD, THIRD, THIRD),
        OutcomeWeight::new(1.0, 0.0, 0.0),
        OutcomeWeight::new(0.5, 0.0, 0.5),
    ],
    // A unfavorable
    [
        OutcomeWeight::new(0.0, 1.0, 0.0),
        OutcomeWeight::new(0.0, 1.0, 0.0),
        OutcomeWeight::new(0.0, 0.0, 1.0),
        OutcomeWeight::new(0.0, 0.5, 0.5),
    ],
    // A unknown
    [
        OutcomeWeight::new(0.0, 1.0, 0.0),
        OutcomeWeight::new(0.0, 0.5, 0.5),
        OutcomeWeight::new(0.5, 0.0, 0.5),
        OutcomeWeight::new(0.0, 0.0, 1.0),
    ],
];

/// Look up the outcome for a pair of attitudes.
pub fn outcome(cat_a: Category, cat_b: Category) -> OutcomeWeight {
    OUTCOME_MATRIX[cat_a.index()][cat_b.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_cell_sums_to_one() {
        for a in Category::ALL {
            for b in Category::ALL {
                let w = outcome(a, b);
                let total = w.a + w.b + w.abstain;
                assert!(
                    (total - 1.0).abs() < 1e-12,
                    "{a:?} vs {b:?} sums to {total}"
                );
                assert!(w.a >= 0.0 && w.b >= 0.0 && w.abstain >= 0.0);
            }
        }
    }

    #[test]
    fn test_role_swap_is_exact() {
        for a in Category::ALL {
            for b in Category::ALL {
                assert_eq!(
                    outcome(a, b),
                    outcome(b, a).swapped(),
                    "table not antisymmetric at {a:?}/{b:?}"
                );
            }
        }
    }

    #[test]
    fn test_diagonal_is_neutral() {
        for c in Category::ALL {
            let w = outcome(c, c);
            assert_eq!(w.a, w.b, "{c:?} vs itself must not favor either side");
        }
    }

    #[test]
    fn test_policy_cells() {
        let fav_vs_dislike = outcome(Category::Favorable, Category::Unfavorable);
        assert_eq!(fav_vs_dislike, OutcomeWeight::new(1.0, 0.0, 0.0));

        let dislike_both = outcome(Category::Unfavorable, Category::Unfavorable);
        assert_eq!(dislike_both.abstain, 1.0);

        let unknown_both = outcome(Category::Unknown, Category::Unknown);
        assert_eq!(unknown_both.abstain, 1.0);

        let neutral_vs_unknown = outcome(Category::Neutral, Category::Unknown);
        assert_eq!(neutral_vs_unknown, OutcomeWeight::new(0.5, 0.0, 0.5));
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, c) in Category::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }
}
