//! The server's resource directory: a name → URL mapping fetched
//! once and memoized for the life of the engine.

use serde_json::{Map, Value};

use super::errors::Error;

const LETSENCRYPT_URL: &str = "https://acme-v02.api.letsencrypt.org/directory";
const LETSENCRYPT_STAGING_URL: &str = "https://acme-staging-v02.api.letsencrypt.org/directory";

/// Reserved resource name under which a caller-supplied absolute URL
/// is stashed for a single request.
pub(crate) const TMP_RESOURCE: &str = "_tmp";

/// Enumeration of known ACME API directories.
#[derive(Debug, Clone)]
pub enum DirectoryUrl<'a> {
    /// The main Let's Encrypt directory. Not appropriate for testing
    /// or development.
    LetsEncrypt,

    /// The staging Let's Encrypt directory. Issues certificates whose
    /// root is not in any trust chain; relaxed rate limits.
    LetsEncryptStaging,

    /// An arbitrary directory URL, e.g. a local Pebble instance.
    Other(&'a str),
}

impl DirectoryUrl<'_> {
    pub(crate) fn to_url(&self) -> &str {
        match self {
            DirectoryUrl::LetsEncrypt => LETSENCRYPT_URL,
            DirectoryUrl::LetsEncryptStaging => LETSENCRYPT_STAGING_URL,
            DirectoryUrl::Other(url) => url,
        }
    }
}

/// The fetched directory object.
///
/// Held as the raw JSON object rather than a fixed struct: the engine
/// is name-addressed, and unknown resources simply resolve for
/// callers that know them.
#[derive(Debug, Clone)]
pub(crate) struct Directory {
    resources: Map<String, Value>,
}

impl Directory {
    pub(crate) fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(resources) => Ok(Directory { resources }),
            _ => Err(Error::Directory(
                "directory response is not a JSON object".to_owned(),
            )),
        }
    }

    /// URL mapped to `name`, or a directory error naming the miss.
    pub(crate) fn resolve(&self, name: &str) -> Result<&str, Error> {
        self.resources
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Directory(format!("no URL for resource {name:?}")))
    }

    /// Stash an absolute URL under [`TMP_RESOURCE`] for one call.
    pub(crate) fn stash_url(&mut self, url: &str) {
        self.resources
            .insert(TMP_RESOURCE.to_owned(), Value::String(url.to_owned()));
    }
}
