use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Index {index} invalid")]
    IndexOutOfRange { index: i64, len: usize },

    /// Wrong argument count or shape; the caller shows the command's help.
    #[error("malformed invocation of /{0}")]
    MalformedInvocation(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("preference store error: {0}")]
    Store(#[from] std::io::Error),

    #[error("invalid preference file: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("cannot serialize preferences: {0}")]
    TomlSer(#[from] toml::ser::Error),
}
