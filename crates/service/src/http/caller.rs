use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use http::request::Parts;

use common::access::Principal;

use crate::ServiceState;

/// Who is asking, as vouched for by the authenticating proxy.
///
/// Only the configured principal header is consulted. Query strings, paths
///  and bodies never contribute to identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Principal(Principal),
    /// No principal header, and anonymous access is enabled
    Anonymous,
    /// No principal header, and anonymous access is disabled
    Unidentified,
}

impl Caller {
    /// The principal to authorize as, if the caller may be authorized at all.
    pub fn identity(&self) -> Option<Option<&Principal>> {
        match self {
            Caller::Principal(principal) => Some(Some(principal)),
            Caller::Anonymous => Some(None),
            Caller::Unidentified => None,
        }
    }

    fn from_parts(parts: &Parts, state: &ServiceState) -> Self {
        let principal = parts
            .headers
            .get(state.principal_header())
            .and_then(|value| value.to_str().ok())
            .and_then(Principal::new);

        match principal {
            Some(principal) => Caller::Principal(principal),
            None if state.allow_anonymous() => Caller::Anonymous,
            None => Caller::Unidentified,
        }
    }
}

#[async_trait]
impl FromRequestParts<ServiceState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Caller::from_parts(parts, state))
    }
}
