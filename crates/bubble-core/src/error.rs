use thiserror::Error;

/// Failures surfaced by bubble generation.
///
/// Content bookkeeping itself never errors (see `ContentTracker`); these only
/// describe why the simulator could not produce a new bubble this frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BubbleError {
    #[error("catalogue has no instances for any bubble type")]
    CatalogueEmpty,
    #[error("no catalogue item can be displayed right now")]
    ContentExhausted,
    #[error("content {0} cannot be displayed: already visible or display set full")]
    DisplayCapacity(String),
}

pub type Result<T> = std::result::Result<T, BubbleError>;

/// A name that does not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what} '{name}'")]
pub struct UnknownName {
    pub what: &'static str,
    pub name: String,
}

impl UnknownName {
    pub(crate) fn new(what: &'static str, name: &str) -> Self {
        Self {
            what,
            name: name.to_owned(),
        }
    }
}
