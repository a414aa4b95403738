use thiserror::Error;

/// Ways a traversal can give up before answering.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalError {
    #[error("traversal stack overflow: more than {capacity} pending nodes")]
    StackOverflow { capacity: usize },

    #[error("traversal visited more than {budget} nodes")]
    VisitBudgetExceeded { budget: usize },
}

pub type Result<T> = std::result::Result<T, TraversalError>;
