use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use base64::Engine;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::principal::Principal;

pub type SessionToken = String;

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub token: SessionToken,
    pub principal: Principal,
    pub issued_at: Instant,
    pub expires_at: Instant,
}

fn gen_id() -> String {
    // 256-bit random token, base64url without padding
    let mut buf = [0u8; 32];
    let _ = getrandom::getrandom(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// In-memory session table backing cookie-session auth.
#[derive(Debug)]
pub struct SessionManager {
    pub ttl: Duration,
    sessions: RwLock<HashMap<SessionToken, Session>>,
    user_index: RwLock<HashMap<String, HashSet<SessionToken>>>,
    revoked: RwLock<HashSet<SessionToken>>,
}

impl Default for SessionManager {
    fn default() -> Self { Self::new(Duration::from_secs(60 * 60)) }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
            user_index: RwLock::new(HashMap::new()),
            revoked: RwLock::new(HashSet::new()),
        }
    }

    pub fn issue(&self, mut principal: Principal) -> Session {
        let now = Instant::now();
        let sid = gen_id();
        let token = gen_id();
        principal.attrs.session_id = Some(sid.clone());
        let sess = Session {
            session_id: sid.clone(),
            token: token.clone(),
            principal: principal.clone(),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions.write().insert(token.clone(), sess.clone());
        self.user_index.write().entry(principal.user_id.clone()).or_default().insert(token);
        info!(user = %principal.user_id, sid = %sid, ttl_secs = self.ttl.as_secs(), "session.issue");
        sess
    }

    pub fn validate(&self, token: &str) -> Option<Principal> {
        if self.revoked.read().contains(token) { return None; }
        let now = Instant::now();
        let mut expired = false;
        let out = {
            let map = self.sessions.read();
            match map.get(token) {
                Some(s) if s.expires_at > now => Some(s.principal.clone()),
                Some(_) => { expired = true; None }
                None => None,
            }
        };
        if expired {
            debug!("session.expired");
            self.remove(token);
        }
        out
    }

    pub fn logout(&self, token: &str) -> bool {
        let removed = self.remove(token);
        if removed { self.revoked.write().insert(token.to_string()); }
        removed
    }

    pub fn revoke_user(&self, user_id: &str) -> usize {
        let mut count = 0usize;
        if let Some(tokens) = self.user_index.write().remove(user_id) {
            let mut s = self.sessions.write();
            let mut r = self.revoked.write();
            for t in tokens {
                if s.remove(&t).is_some() { count += 1; }
                r.insert(t);
            }
        }
        info!(user = %user_id, count, "session.revoke");
        count
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.read().len()
    }

    fn remove(&self, token: &str) -> bool {
        let Some(sess) = self.sessions.write().remove(token) else { return false; };
        let mut idx = self.user_index.write();
        if let Some(set) = idx.get_mut(&sess.principal.user_id) {
            set.remove(token);
            if set.is_empty() { idx.remove(&sess.principal.user_id); }
        }
        true
    }
}
