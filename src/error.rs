//! Error types shared by the engine core.
//!
//! Every variant of [`EngineError`] is recovered where it happens: the
//! operation that hit it logs the error and leaves the engine in a usable
//! state. Functions still return them so callers (and tests) can react.

use thiserror::Error;

/// Recoverable engine failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A factory was asked for a type name nobody registered.
    #[error("unknown type `{0}`")]
    UnknownType(String),

    /// A different component is already registered under this id.
    #[error("entity `{entity}` already has a different component with id `{component}`")]
    DuplicateId { entity: String, component: String },

    /// A component kept failing its `init` call.
    #[error("failed initializing component `{component}` of entity `{entity}` after {attempts} attempts")]
    InitRetryExhausted {
        entity: String,
        component: String,
        attempts: u32,
    },

    /// `release` was called on an entity that was already released.
    #[error("entity `{0}` released more than once")]
    DoubleRelease(String),

    /// A scene id was used that is not in the scene table.
    #[error("unknown scene `{0}`")]
    UnknownScene(String),

    /// No entity with this id in the active scene.
    #[error("unknown entity `{0}`")]
    UnknownEntity(String),

    /// The scene is active and cannot be replaced.
    #[error("scene `{0}` is active")]
    SceneActive(String),

    /// Name resolves to neither a property nor a component id.
    #[error("entity `{entity}` does not have a `{name}` attribute. Properties are: {available:?}")]
    AttributeNotFound {
        entity: String,
        name: String,
        available: Vec<String>,
    },

    /// A component refused a property value.
    #[error("property `{name}` rejected: {reason}")]
    InvalidProperty { name: String, reason: String },

    /// A scene or entity description has the wrong shape.
    #[error("invalid description: {0}")]
    InvalidDescription(String),
}

/// Failures raised by component constructors and `init`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComponentError {
    /// The component depends on something that is not available yet.
    /// `init` failing with this is retried.
    #[error("not ready: {0}")]
    NotReady(String),

    /// A descriptor field is missing or has the wrong type.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ComponentError {
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ComponentError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failures while reading configuration or scene files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    Load(String),

    #[error("failed to save config file: {0}")]
    Save(String),

    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse `{path}`: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
