//! Invocation surfaces. Each one only extracts a [`DispatchRequest`] from its
//! native request and turns the [`DispatchOutcome`] back into its native
//! response; all decisions live in the dispatcher.
//!
//! [`DispatchRequest`]: crate::dispatch::DispatchRequest

pub mod event;
pub mod http;

use crate::dispatch::DispatchOutcome;

/// HTTP-style status for an outcome.
pub fn status_code(outcome: &DispatchOutcome) -> u16 {
    match outcome {
        DispatchOutcome::Rejected { code, .. } => *code,
        DispatchOutcome::NormalizeFailed { .. } => 400,
        DispatchOutcome::DeliveryFailed { .. } => 502,
        DispatchOutcome::Delivered { .. } => 200,
    }
}

/// Token from an `Authorization: Bearer <token>` value.
pub(crate) fn bearer_token(authorization: &str) -> Option<&str> {
    let (scheme, token) = authorization.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim()).filter(|t| !t.is_empty())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DeliveryReceipt;

    #[test]
    fn test_status_codes() {
        let rejected = DispatchOutcome::Rejected {
            code: 401,
            reason: String::new(),
        };
        let malformed = DispatchOutcome::NormalizeFailed {
            reason: String::new(),
        };
        let failed = DispatchOutcome::DeliveryFailed {
            remote_status: Some(500),
            body: String::new(),
        };
        let delivered = DispatchOutcome::Delivered {
            receipt: DeliveryReceipt {
                status: 204,
                body: String::new(),
            },
        };

        assert_eq!(status_code(&rejected), 401);
        assert_eq!(status_code(&malformed), 400);
        assert_eq!(status_code(&failed), 502);
        assert_eq!(status_code(&delivered), 200);
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("bearer  abc123 "), Some("abc123"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc123"), None);
    }
}
