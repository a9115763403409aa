pub mod slack;
pub mod travisci;
pub mod userlike;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::message::CanonicalMessage;

pub use slack::Slack;
pub use travisci::TravisCi;
pub use userlike::Userlike;

/// Why a request body could not be turned into a message.
/// Always a client-input problem, never a server fault.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unsupported event: {0}")]
    UnsupportedEvent(String),
    #[error("malformed payload: {0}")]
    Invalid(String),
}

/// Converts one vendor's raw webhook body into a canonical message.
///
/// Implementations are pure: the same bytes always produce an equal message
/// and nothing outside the return value is touched.
pub trait Normalizer: Send + Sync {
    /// Human-readable vendor name, e.g. "Travis CI"
    fn display_name(&self) -> &str;

    fn normalize(&self, body: &[u8]) -> Result<CanonicalMessage, NormalizeError>;
}

/// Vendors send `null` for values they don't have; read it like a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
