/// Errors raised synchronously while constructing names, descriptors, or
/// registrations. None of them is recoverable by the dispatch engine; they
/// go straight back to the caller that attempted the construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("expected a resource name")]
    MissingResourceName,

    #[error("invalid resource name {name:?}: segments must be non-empty")]
    InvalidResourceName { name: String },

    #[error("too many IDs provided for resource {resource}: expected at most {expected}, got {provided}")]
    TooManyIdentifiers {
        resource: String,
        expected: usize,
        provided: usize,
    },

    #[error("too few IDs provided for resource {resource}: expected at least {expected}, got {provided}")]
    TooFewIdentifiers {
        resource: String,
        expected: usize,
        provided: usize,
    },

    #[error("expected a non-empty map of handlers for resource {resource}")]
    EmptyHandlerSet { resource: String },

    #[error("resource {resource} is already registered")]
    DuplicateResource { resource: String },

    #[error("streaming handler {key} on resource {resource} is not supported")]
    StreamingUnsupported { resource: String, key: String },
}
