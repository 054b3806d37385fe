use std::path::PathBuf;

/// Errors from a single weather request.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("No OpenWeather API key configured.\nHint: run `tempo configure` and enter your API key.")]
    MissingApiKey,
    #[error("Failed to send request to OpenWeather: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("OpenWeather request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Failed to parse OpenWeather JSON: {source}\nreceived: {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

/// Errors from the shared app-group bucket.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Shared bucket unavailable at {}: {source}", .path.display())]
    BucketUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Shared bucket I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode weather snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Failed to decode weather snapshot: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Reasons a location could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    Denied,
    #[error("Location access restricted")]
    Restricted,
    #[error("Location service unavailable: {0}")]
    Unavailable(String),
}
