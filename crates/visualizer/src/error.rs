use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum VisualizerError {
    #[error("invalid draw parameters: {0}")]
    Params(#[from] serde_yaml::Error),
    #[error("invalid visualizer configuration: {0}")]
    Config(String),
    #[error("no panel with id `{0}`")]
    UnknownPanel(String),
    #[error("no array `{0}` in plotted data")]
    MissingField(String),
    #[error("`{x}` has {x_len} values but `{y}` has {y_len}")]
    LengthMismatch {
        x: String,
        x_len: usize,
        y: String,
        y_len: usize,
    },
    #[error("bad template `{template}`: {message}")]
    Template { template: String, message: String },
    #[error("drawing failed: {0}")]
    Draw(String),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
