use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// An authenticated back-office session, carried in a signed bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    pub role: &'static str,
    pub expires_at: DateTime<Utc>,
}

fn sign(secret: &str, payload: &[u8]) -> Option<HmacSha1> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(mac)
}

/// Token layout: `base64(username|expiry).base64(hmac)`.
pub fn issue_token(
    secret: &str,
    username: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Option<String> {
    let expires_at = (now + ttl).timestamp();
    let payload = format!("{username}|{expires_at}");
    let signature = sign(secret, payload.as_bytes())?.finalize().into_bytes();
    Some(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(payload),
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Returns the session if the signature matches and the token has not expired.
pub fn verify_token(secret: &str, token: &str, now: DateTime<Utc>) -> Option<Session> {
    let (payload_b64, signature_b64) = token.split_once('.')?;
    let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
    let signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;

    sign(secret, &payload)?.verify_slice(&signature).ok()?;

    let payload = String::from_utf8(payload).ok()?;
    let (username, expiry) = payload.rsplit_once('|')?;
    let expires_at = Utc.timestamp_opt(expiry.parse().ok()?, 0).single()?;
    if expires_at <= now {
        return None;
    }

    Some(Session {
        username: username.to_string(),
        role: "admin",
        expires_at,
    })
}

/// The single back-office account. Unknown usernames are still checked
/// against a throwaway hash so both failure paths cost one bcrypt round.
pub struct AdminCredentials {
    username: String,
    password_hash: String,
    dummy_hash: String,
}

impl AdminCredentials {
    pub fn new(username: &str, password_hash: &str, cost: u32) -> anyhow::Result<Self> {
        Ok(Self {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            dummy_hash: bcrypt::hash("rentacar-unknown-user", cost)?,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password_hash.is_empty()
    }

    /// Blocking: run off the async executor.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        if !self.is_configured() || username != self.username {
            let _ = bcrypt::verify(password, &self.dummy_hash);
            return false;
        }
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}
