pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operation needs chart state that has not been established yet.
    #[error("chart not ready: {message}")]
    Configuration { message: String },

    #[error("invalid chart config `{field}`: {message}")]
    InvalidConfig { field: &'static str, message: String },

    /// A record rejected before any chart state was touched.
    #[error("invalid event record #{index} (`{field}`): {message}")]
    Validation {
        index: usize,
        field: &'static str,
        message: String,
    },

    #[error(
        "annotation `{label}` falls on cycle {cycle_index}, outside the rendered range 0..={max_cycle_index}"
    )]
    AnnotationOutOfRange {
        label: String,
        cycle_index: i64,
        max_cycle_index: i64,
    },

    /// Layer ids become element ids in rendered output, so they must be unique.
    #[error("layer id `{id}` is already in use")]
    DuplicateLayer { id: String },

    #[error("chart config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
