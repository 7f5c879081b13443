use hearth_store::StoreError;
use hearth_view::ViewError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unable to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Http(#[from] hearth_http::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
