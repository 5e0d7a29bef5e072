use thiserror::Error;

/// Contract violations the engines refuse to paper over.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("no input: the match ledger is empty")]
    EmptyLedger,

    #[error("match {match_id}: model probabilities are not a distribution ({reason})")]
    InvalidDistribution { match_id: u64, reason: String },

    #[error("inference rows supply {supplied} of {expected} schema features")]
    SchemaCoverage { supplied: usize, expected: usize },
}
