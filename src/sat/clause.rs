use crate::sat::literal::Literal;

/// 0-based position of a clause in the formula.
pub type ClauseId = usize;

/// One entry of the variable occurrence index: the variable appears in
/// `clause` with the given polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Occurrence {
    pub clause: ClauseId,
    pub polarity: bool,
}

impl Occurrence {
    #[must_use]
    pub const fn new(clause: ClauseId, literal: Literal) -> Self {
        Self {
            clause,
            polarity: literal.polarity(),
        }
    }

    /// Whether this occurrence is a true literal when its variable takes `value`.
    #[must_use]
    pub const fn is_true_under(self, value: bool) -> bool {
        self.polarity == value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurrence_polarity() {
        let occ = Occurrence::new(4, Literal::from_i32(-2));
        assert_eq!(occ.clause, 4);
        assert!(!occ.polarity);
        assert!(occ.is_true_under(false));
        assert!(!occ.is_true_under(true));
    }
}
