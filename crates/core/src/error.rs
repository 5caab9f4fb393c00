/// Errors surfaced to the shells over FFI.
///
/// Bridge failures the page can observe (policy rejections, scan conflicts,
/// capability failures) are not represented here; those travel back into the
/// page as result events per the bridge contract. Bootstrap and persistence
/// problems are logged and swallowed. What remains is API misuse caught at
/// construction time.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ShellError {
    #[error("Invalid URL - {error}")]
    InvalidUrl { error: String },

    #[error("Scheme not supported for shell pages! {scheme}")]
    SchemeNotSupported { scheme: String },

    #[error("Failed to get the host from the URL!")]
    NoHostInUrl,

    #[error("Serde - {error}")]
    Serde { error: String },
}

// These are manually implemented and turned into a string because uniffi
// doesn't support exported error types in the generations.
impl From<url::ParseError> for ShellError {
    fn from(value: url::ParseError) -> Self {
        Self::InvalidUrl {
            error: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for ShellError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde {
            error: value.to_string(),
        }
    }
}
