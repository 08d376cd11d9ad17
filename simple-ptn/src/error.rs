use crate::net::{NodeKind, PetriNetConfigBuilderError};

/// Errors of net construction, cascades and merging.
///
/// Ids are stored in their `Debug` form, since `NodeId` does not require `Display`. String ids
/// therefore show up quoted (`Duplicate place id: "a"`), while fieldless enum ids show their
/// variant name (`Cycle detected at place Crane`).
#[derive(thiserror::Error, Debug)]
pub enum PetriError {
    #[error("Duplicate {0} id: {1}")]
    DuplicateIdentity(NodeKind, String),
    #[error("Unknown {0} id: {1}")]
    UnknownIdentity(NodeKind, String),
    #[error("Cycle detected at place {0}")]
    CycleDetected(String),
    #[error("Cannot merge a net into itself")]
    SelfMerge(),
    #[error("Configuration error: {0}")]
    NetConfigError(#[from] PetriNetConfigBuilderError),
}

pub type Result<T> = std::result::Result<T, PetriError>;

/// Render an id for error messages, using its `Debug` form.
pub(crate) fn id_string<D: std::fmt::Debug + ?Sized>(id: &D) -> String {
    format!("{id:?}")
}
