use chrono::{DateTime, Utc};

/// Server-side session row. The raw token only ever lives in the client's
/// cookie; storage keeps an HMAC of it (`token_hash`).
#[derive(Debug, Clone)]
pub struct Session {
    pub token_hash: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Session {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }
}
