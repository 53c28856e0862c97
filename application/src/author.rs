use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

use capture_domain::{AuthPort, AuthenticatedUser};

pub const UNKNOWN_AUTHOR: &str = "Unknown User";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub name: String,
    pub id: Option<String>,
}

pub async fn resolve_author(auth: &dyn AuthPort) -> AuthorIdentity {
    let claims = match auth.bearer_token().await {
        Some(token) => decode_claims(&token),
        None => None,
    };
    let user = auth.current_user().await;

    let name = claims
        .as_ref()
        .and_then(claim_display_name)
        .or_else(|| user.as_ref().and_then(user_display_name))
        .or_else(|| {
            user.as_ref()
                .and_then(|u| u.email.clone())
                .filter(|email| !email.trim().is_empty())
        })
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    let id = user.map(|u| u.id).or_else(|| {
        claims
            .as_ref()
            .and_then(|c| c.get("sub"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    if name == UNKNOWN_AUTHOR {
        tracing::debug!("no author identity available; falling back to the anonymous label");
    }

    AuthorIdentity { name, id }
}

/// No signature check; the claims only feed display metadata.
fn decode_claims(token: &str) -> Option<Value> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn claim_display_name(claims: &Value) -> Option<String> {
    if let Some(name) = claims.get("name").and_then(Value::as_str) {
        let name = name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    let given = claims.get("given_name").and_then(Value::as_str).unwrap_or("");
    let family = claims.get("family_name").and_then(Value::as_str).unwrap_or("");
    compose_name(given, family)
}

fn user_display_name(user: &AuthenticatedUser) -> Option<String> {
    compose_name(
        user.first_name.as_deref().unwrap_or(""),
        user.last_name.as_deref().unwrap_or(""),
    )
}

fn compose_name(first: &str, last: &str) -> Option<String> {
    let first = first.trim();
    let last = last.trim();
    match (first.is_empty(), last.is_empty()) {
        (true, true) => None,
        (false, true) => Some(first.to_string()),
        (true, false) => Some(last.to_string()),
        (false, false) => Some(format!("{first} {last}")),
    }
}
