//! Meeting credentials supplied by the hosting environment.
//!
//! Both values are opaque; they are only checked for presence.

use std::fmt;

use convene_common::helpers::redact_token;
use convene_common::{Error, Result};
use url::Url;

pub const MEETING_ID_PARAM: &str = "meetingId";
pub const TOKEN_PARAM: &str = "token";

#[derive(Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    meeting_id: String,
    token: String,
}

impl SessionIdentity {
    pub fn new(meeting_id: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let meeting_id = meeting_id.into();
        let token = token.into();
        if meeting_id.is_empty() {
            return Err(Error::Missing("meeting ID"));
        }
        if token.is_empty() {
            return Err(Error::Missing("token"));
        }
        Ok(Self { meeting_id, token })
    }

    /// Reads `meetingId` and `token` from a meeting link.
    ///
    /// A non-empty fragment is parsed as a query string and wins over the
    /// regular query.
    pub fn from_url(link: &str) -> Result<Self> {
        let url = Url::parse(link).map_err(Error::config)?;
        let params = match url.fragment() {
            Some(fragment) if !fragment.is_empty() => fragment.to_string(),
            _ => url.query().unwrap_or_default().to_string(),
        };

        let mut meeting_id = None;
        let mut token = None;
        for (key, value) in url::form_urlencoded::parse(params.as_bytes()) {
            match key.as_ref() {
                MEETING_ID_PARAM => meeting_id = Some(value.into_owned()),
                TOKEN_PARAM => token = Some(value.into_owned()),
                _ => {}
            }
        }
        Self::new(meeting_id.unwrap_or_default(), token.unwrap_or_default())
    }

    /// Explicit values take precedence; a link is consulted only when either
    /// explicit value is missing.
    pub fn resolve(
        meeting_id: Option<String>,
        token: Option<String>,
        link: Option<&str>,
    ) -> Result<Self> {
        match (meeting_id, token, link) {
            (Some(meeting_id), Some(token), _) => Self::new(meeting_id, token),
            (_, _, Some(link)) => Self::from_url(link),
            (meeting_id, token, None) => {
                Self::new(meeting_id.unwrap_or_default(), token.unwrap_or_default())
            }
        }
    }

    pub fn meeting_id(&self) -> &str {
        &self.meeting_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn redacted_token(&self) -> String {
        redact_token(&self.token)
    }
}

impl fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("meeting_id", &self.meeting_id)
            .field("token", &self.redacted_token())
            .finish()
    }
}
