//! Messages live at the provider; these types are only the proxy shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tenantchat_core::{DomainError, DomainResult, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub user_id: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// A message about to be sent on behalf of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub text: String,
    pub user_id: UserId,
}

impl NewMessage {
    pub fn new(text: &str, user_id: UserId) -> DomainResult<Self> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("text is required"));
        }
        Ok(Self {
            text: text.to_string(),
            user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_whitespace_text() {
        assert!(NewMessage::new(" \n", UserId::new()).is_err());
    }

    #[test]
    fn keeps_text_verbatim() {
        let msg = NewMessage::new("  hi ", UserId::new()).unwrap();
        assert_eq!(msg.text, "  hi ");
    }
}
