use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// HMAC primitives
// =============================================================================

/// Compute a hex-encoded HMAC-SHA256 of `data` under `secret`
pub fn sign(data: &str, secret: &str) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC key of any length is valid"));
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify HMAC-SHA256 signature
///
/// # Arguments
/// * `data` - The data that was signed
/// * `signature` - The hex-encoded HMAC signature
/// * `secret` - The shared secret key (from environment)
///
/// Comparison is constant-time (delegated to `Mac::verify_slice`).
pub fn verify_hmac(data: &str, signature: &str, secret: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data.as_bytes());

    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    mac.verify_slice(&sig_bytes).is_ok()
}

// =============================================================================
// Bearer session tokens
// =============================================================================

/// Issue a bearer token of the form `<user_id>.<expires_at>.<signature>`
///
/// Tokens are normally minted by the authentication provider sharing
/// `AUTH_SECRET` with this server.
pub fn issue_session_token(user_id: &str, expires_at: i64, secret: &str) -> String {
    let payload = format!("{}.{}", user_id, expires_at);
    let signature = sign(&payload, secret);
    format!("{}.{}", payload, signature)
}

/// Verify a bearer token and return the user id it was issued for
///
/// Returns `None` for malformed, tampered or expired tokens, and for tokens
/// whose expiry lies more than `max_ttl_secs` in the future.
pub fn verify_session_token(token: &str, secret: &str, now: i64, max_ttl_secs: i64) -> Option<String> {
    let (payload, signature) = token.rsplit_once('.')?;

    if !verify_hmac(payload, signature, secret) {
        tracing::warn!("Session token with invalid signature");
        return None;
    }

    verify_expiring_payload(payload, now, max_ttl_secs)
}

/// Split `<user_id>.<expires_at>` and check the expiry window
fn verify_expiring_payload(payload: &str, now: i64, max_ttl_secs: i64) -> Option<String> {
    let (user_id, expires_at) = payload.rsplit_once('.')?;

    if user_id.is_empty() || user_id.contains('/') {
        return None;
    }

    let expires_at: i64 = expires_at.parse().ok()?;

    if expires_at < now {
        tracing::debug!("Token expired at {}", expires_at);
        return None;
    }

    if expires_at - now > max_ttl_secs {
        tracing::warn!("Token for {} outlives the allowed lifetime", user_id);
        return None;
    }

    Some(user_id.to_string())
}

// =============================================================================
// OAuth state
// =============================================================================

fn oauth_state_payload(payload: &str) -> String {
    format!("oauth-state:{}", payload)
}

/// Issue the `state` parameter binding a Google authorization to `user_id`
///
/// Signed over a payload distinct from session tokens.
pub fn issue_oauth_state(user_id: &str, expires_at: i64, secret: &str) -> String {
    let payload = format!("{}.{}", user_id, expires_at);
    let signature = sign(&oauth_state_payload(&payload), secret);
    format!("{}.{}", payload, signature)
}

/// Verify an OAuth `state` and return the user id it was issued for
pub fn verify_oauth_state(state: &str, secret: &str, now: i64, max_ttl_secs: i64) -> Option<String> {
    let (payload, signature) = state.rsplit_once('.')?;

    if !verify_hmac(&oauth_state_payload(payload), signature, secret) {
        tracing::warn!("OAuth state with invalid signature");
        return None;
    }

    verify_expiring_payload(payload, now, max_ttl_secs)
}

// =============================================================================
// Signed download links
// =============================================================================

fn download_payload(path: &str, expires_at: i64) -> String {
    format!("download:{}:{}", path, expires_at)
}

/// Sign a blob path for temporary, unauthenticated download
pub fn sign_download(path: &str, expires_at: i64, secret: &str) -> String {
    sign(&download_payload(path, expires_at), secret)
}

/// Check a download signature and its expiry
pub fn verify_download(path: &str, expires_at: i64, signature: &str, secret: &str, now: i64) -> bool {
    if expires_at < now {
        tracing::warn!("Download link for {} expired at {}", path, expires_at);
        return false;
    }

    verify_hmac(&download_payload(path, expires_at), signature, secret)
}
