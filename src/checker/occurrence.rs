//! Occurrence algebra: the consumption-log monoid.
//!
//! A writer-monoid over name sets: `seq`/`alt` combine the occurrence
//! records two sub-expressions produce, the way a small pointwise-combined
//! tag would, but carrying full observed/consumed name sets instead of a
//! single flag.

use std::collections::BTreeSet;

use crate::ir::VName;

pub type Names = BTreeSet<VName>;

/// `(observed, consumed)` — the effect of an already-checked subterm on a
/// single name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Occurrence {
    pub observed: Names,
    pub consumed: Names,
}

impl Occurrence {
    pub fn observed(names: Names) -> Self {
        Self {
            observed: names,
            consumed: Names::new(),
        }
    }

    pub fn consumed(names: Names) -> Self {
        Self {
            observed: Names::new(),
            consumed: names,
        }
    }

    pub fn is_null(&self) -> bool {
        self.observed.is_empty() && self.consumed.is_empty()
    }
}

/// The consumption log: either a list of occurrences or a terminal error
/// state. An error state absorbs any further composition and is retained.
/// The error carries the name that was referenced after being consumed, so
/// callers can surface it as `ErrorCase::UseAfterConsume` without
/// re-parsing a message string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Occurrences {
    List(Vec<Occurrence>),
    Error(VName),
}

impl Default for Occurrences {
    /// The monoid identity.
    fn default() -> Self {
        Occurrences::List(Vec::new())
    }
}

fn drop_nulls(list: Vec<Occurrence>) -> Vec<Occurrence> {
    list.into_iter().filter(|o| !o.is_null()).collect()
}

fn consumed_names(list: &[Occurrence]) -> Names {
    list.iter().flat_map(|o| o.consumed.iter().cloned()).collect()
}

fn referenced_names(list: &[Occurrence]) -> Names {
    list.iter()
        .flat_map(|o| o.observed.iter().chain(o.consumed.iter()).cloned())
        .collect()
}

impl Occurrences {
    pub fn single(o: Occurrence) -> Self {
        if o.is_null() {
            Occurrences::List(Vec::new())
        } else {
            Occurrences::List(vec![o])
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Occurrences::Error(_))
    }

    /// Sequential composition, the monoid's `combine` operation.
    pub fn seq(self, other: Self) -> Self {
        let (a, b) = match (self, other) {
            (Occurrences::Error(e), _) | (_, Occurrences::Error(e)) => {
                return Occurrences::Error(e);
            }
            (Occurrences::List(a), Occurrences::List(b)) => (a, b),
        };

        let consumed_in_a = consumed_names(&a);
        let referenced_in_b = referenced_names(&b);
        if let Some(name) = consumed_in_a.intersection(&referenced_in_b).next() {
            return Occurrences::Error(name.clone());
        }

        let consumed_in_b = consumed_names(&b);
        let a_adjusted: Vec<Occurrence> = a
            .into_iter()
            .map(|o| Occurrence {
                observed: o
                    .observed
                    .difference(&consumed_in_b)
                    .cloned()
                    .collect(),
                consumed: o.consumed,
            })
            .collect();

        let mut combined = drop_nulls(a_adjusted);
        combined.extend(b);
        Occurrences::List(combined)
    }

    /// Alternative composition, used to combine the two arms of an `if`.
    pub fn alt(self, other: Self) -> Self {
        let (a, b) = match (self, other) {
            (Occurrences::Error(e), _) | (_, Occurrences::Error(e)) => {
                return Occurrences::Error(e);
            }
            (Occurrences::List(a), Occurrences::List(b)) => (a, b),
        };

        let consumed_in_b = consumed_names(&b);
        let a_adjusted: Vec<Occurrence> = a
            .into_iter()
            .map(|o| Occurrence {
                observed: o.observed.difference(&consumed_in_b).cloned().collect(),
                consumed: o.consumed.difference(&consumed_in_b).cloned().collect(),
            })
            .collect();

        let mut combined = drop_nulls(a_adjusted);
        combined.extend(b);
        Occurrences::List(combined)
    }

    /// Remove `names` from both fields of every occurrence, as happens when
    /// a let-bound name goes out of scope at the end of its body.
    pub fn unoccur(self, names: &Names) -> Self {
        match self {
            Occurrences::Error(e) => Occurrences::Error(e),
            Occurrences::List(list) => {
                let stripped = list.into_iter().map(|o| Occurrence {
                    observed: o.observed.difference(names).cloned().collect(),
                    consumed: o.consumed.difference(names).cloned().collect(),
                });
                Occurrences::List(drop_nulls(stripped.collect()))
            }
        }
    }

    pub fn all_consumed(&self) -> Names {
        match self {
            Occurrences::Error(_) => Names::new(),
            Occurrences::List(list) => consumed_names(list),
        }
    }

    pub fn as_list(&self) -> Option<&[Occurrence]> {
        match self {
            Occurrences::List(list) => Some(list),
            Occurrences::Error(_) => None,
        }
    }

    /// Raise the error state as a proper `TypeError`, if any. A `List` state is always accepted. When
    /// `env.check_occurrences` is false, a consumption error is downgraded
    /// to silently-ignored.
    pub fn into_checked<L: crate::ir::Lore>(
        self,
        env: &super::context::Env<L>,
    ) -> crate::diagnostics::CheckResult<Vec<Occurrence>> {
        match self {
            Occurrences::List(list) => Ok(list),
            Occurrences::Error(name) => {
                if env.check_occurrences {
                    Err(env.bad(crate::diagnostics::ErrorCase::UseAfterConsume(name)))
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }
}

#[cfg(test)]
mod occurrence_tests {
    use super::*;

    fn names(xs: &[&str]) -> Names {
        xs.iter().map(|x| VName::new(*x)).collect()
    }

    #[test]
    fn seq_with_identity_is_identity() {
        let a = Occurrences::single(Occurrence::observed(names(&["x"])));
        let result = a.clone().seq(Occurrences::default());
        assert_eq!(result, a);
    }

    #[test]
    fn identity_seq_a_is_a() {
        let a = Occurrences::single(Occurrence::observed(names(&["x"])));
        let result = Occurrences::default().seq(a.clone());
        assert_eq!(result, a);
    }

    #[test]
    fn seq_detects_use_after_consume() {
        let a = Occurrences::single(Occurrence::consumed(names(&["x"])));
        let b = Occurrences::single(Occurrence::observed(names(&["x"])));
        assert!(a.seq(b).is_error());
    }

    #[test]
    fn seq_strips_redundant_observation_of_later_consumed_name() {
        let a = Occurrences::single(Occurrence::observed(names(&["x", "y"])));
        let b = Occurrences::single(Occurrence::consumed(names(&["y"])));
        let result = a.seq(b);
        match result {
            Occurrences::List(list) => {
                assert_eq!(list[0].observed, names(&["x"]));
            }
            Occurrences::Error(_) => panic!("expected list"),
        }
    }

    #[test]
    fn alt_strips_consumed_names_from_both_fields() {
        let a = Occurrences::single(Occurrence {
            observed: names(&["x"]),
            consumed: names(&["x"]),
        });
        let b = Occurrences::single(Occurrence::consumed(names(&["x"])));
        let result = a.alt(b);
        match result {
            Occurrences::List(list) => {
                // `a`'s occurrence is stripped to null and dropped, leaving
                // only `b`'s.
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].consumed, names(&["x"]));
            }
            Occurrences::Error(_) => panic!("expected list"),
        }
    }

    #[test]
    fn unoccur_removes_names_and_drops_nulls() {
        let a = Occurrences::single(Occurrence::observed(names(&["x"])));
        let result = a.unoccur(&names(&["x"]));
        assert_eq!(result, Occurrences::List(Vec::new()));
    }

    #[test]
    fn error_absorbs_further_composition() {
        let err = Occurrences::Error(VName::new("x"));
        let other = Occurrences::single(Occurrence::observed(names(&["x"])));
        assert!(err.clone().seq(other.clone()).is_error());
        assert!(other.seq(err).is_error());
    }
}
