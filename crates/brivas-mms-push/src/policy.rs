//! Retrieval decision for incoming notifications

use serde::{Deserialize, Serialize};

/// Inputs to the retrieval decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalContext {
    pub duplicate: bool,
    pub auto_retrieve: bool,
    pub mobile_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrievalDecision {
    Drop,
    PersistOnly,
    PersistAndRetrieve,
}

/// Total over its inputs
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrievalPolicy;

impl RetrievalPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Either auto-retrieve or mobile data is enough to start retrieval
    pub fn decide(&self, ctx: RetrievalContext) -> RetrievalDecision {
        if ctx.duplicate {
            RetrievalDecision::Drop
        } else if ctx.auto_retrieve || ctx.mobile_data {
            RetrievalDecision::PersistAndRetrieve
        } else {
            RetrievalDecision::PersistOnly
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truth_table() {
        use RetrievalDecision::*;
        let rows = [
            (false, false, false, PersistOnly),
            (false, false, true, PersistAndRetrieve),
            (false, true, false, PersistAndRetrieve),
            (false, true, true, PersistAndRetrieve),
            (true, false, false, Drop),
            (true, false, true, Drop),
            (true, true, false, Drop),
            (true, true, true, Drop),
        ];

        let policy = RetrievalPolicy::new();
        for (duplicate, auto_retrieve, mobile_data, expected) in rows {
            let ctx = RetrievalContext {
                duplicate,
                auto_retrieve,
                mobile_data,
            };
            assert_eq!(policy.decide(ctx), expected, "{ctx:?}");
        }
    }
}
