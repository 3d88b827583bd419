//! Preview mode
//!
//! Editors open drafts through `/api/preview?token=..&documentId=..`. The
//! token is a content ref that makes unpublished revisions visible. Once it
//! is validated against the content source it is stored in a signed cookie,
//! and every later request carrying that cookie reads content at that ref.

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::config::PreviewConfig;
use crate::error::PreviewError;
use crate::helpers::post_path;
use crate::source::{ContentSource, Document, Query};

type HmacSha256 = Hmac<Sha256>;

/// Which revision of the content a request is allowed to see
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreviewSession {
    pub active: bool,
    #[serde(rename = "ref")]
    pub content_ref: Option<String>,
}

impl PreviewSession {
    /// Published content only
    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn active(content_ref: &str) -> Self {
        Self {
            active: true,
            content_ref: Some(content_ref.to_string()),
        }
    }

    /// Ref every content query must carry, `None` outside preview
    pub fn content_ref(&self) -> Option<&str> {
        if self.active {
            self.content_ref.as_deref()
        } else {
            None
        }
    }
}

/// Reads and writes the preview cookie
#[derive(Debug, Clone)]
pub struct PreviewGate {
    cookie_name: String,
    secret: String,
}

impl PreviewGate {
    pub fn new(config: &PreviewConfig) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            secret: config.secret.clone(),
        }
    }

    /// Decide from the request's `Cookie` header whether it is in preview mode.
    ///
    /// Missing, malformed or tampered cookies yield an inactive session.
    pub fn is_preview(&self, cookie_header: Option<&str>) -> PreviewSession {
        let Some(value) = cookie_header.and_then(|h| self.find_cookie(h)) else {
            return PreviewSession::inactive();
        };

        let Some((encoded_ref, signature)) = value.rsplit_once('.') else {
            tracing::debug!("Ignoring unsigned preview cookie");
            return PreviewSession::inactive();
        };

        let content_ref = match percent_decode_str(encoded_ref).decode_utf8() {
            Ok(r) if !r.is_empty() => r.into_owned(),
            _ => return PreviewSession::inactive(),
        };

        if !self.verify(&content_ref, signature) {
            tracing::warn!("Preview cookie signature mismatch");
            return PreviewSession::inactive();
        }

        PreviewSession::active(&content_ref)
    }

    /// `Set-Cookie` value entering preview at `content_ref`
    pub fn session_cookie(&self, content_ref: &str) -> Result<String, PreviewError> {
        Ok(format!(
            "{}={}.{}; Path=/; HttpOnly; SameSite=Lax",
            self.cookie_name,
            utf8_percent_encode(content_ref, NON_ALPHANUMERIC),
            self.sign(content_ref)?
        ))
    }

    /// `Set-Cookie` value leaving preview
    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            self.cookie_name
        )
    }

    fn find_cookie<'a>(&self, header: &'a str) -> Option<&'a str> {
        header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == self.cookie_name).then_some(value)
        })
    }

    fn mac(&self, content_ref: &str) -> Result<HmacSha256, PreviewError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| PreviewError::Signing(e.to_string()))?;
        mac.update(content_ref.as_bytes());
        Ok(mac)
    }

    fn sign(&self, content_ref: &str) -> Result<String, PreviewError> {
        Ok(hex::encode(self.mac(content_ref)?.finalize().into_bytes()))
    }

    /// Constant-time check of a hex signature
    fn verify(&self, content_ref: &str, signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        match self.mac(content_ref) {
            Ok(mac) => mac.verify_slice(&expected).is_ok(),
            Err(e) => {
                tracing::error!("{}", e);
                false
            }
        }
    }
}

/// Site path of a document
pub fn link_resolver(doc: &Document) -> String {
    match (doc.doc_type.as_str(), doc.uid.as_deref()) {
        ("post", Some(uid)) => post_path(uid),
        _ => "/".to_string(),
    }
}

/// Validate a preview token and resolve where the editor should land.
///
/// With a document id the token must expose that document; without one it
/// must at least be a ref the content source accepts. Any failure is an
/// invalid token.
pub async fn exchange(
    source: &dyn ContentSource,
    token: Option<&str>,
    document_id: Option<&str>,
    doc_type: &str,
) -> Result<String, PreviewError> {
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or(PreviewError::InvalidToken)?;

    match document_id.filter(|id| !id.is_empty()) {
        Some(id) => match source.get_by_id(id, Some(token)).await {
            Ok(doc) => Ok(link_resolver(&doc)),
            Err(e) => {
                tracing::warn!("Preview token rejected for document {}: {}", id, e);
                Err(PreviewError::InvalidToken)
            }
        },
        None => {
            let check = Query::by_type(doc_type, 1).with_ref(Some(token));
            match source.query(&check).await {
                Ok(_) => Ok("/".to_string()),
                Err(e) => {
                    tracing::warn!("Preview token rejected: {}", e);
                    Err(PreviewError::InvalidToken)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{post_doc, sample_source};

    fn gate() -> PreviewGate {
        PreviewGate::new(&PreviewConfig {
            cookie_name: "preview".to_string(),
            secret: "s3cret".to_string(),
        })
    }

    fn cookie_value(set_cookie: &str) -> &str {
        set_cookie.split(';').next().unwrap()
    }

    #[test]
    fn test_no_cookie_is_inactive() {
        let session = gate().is_preview(None);
        assert!(!session.active);
        assert_eq!(session.content_ref(), None);
        assert!(!gate().is_preview(Some("other=1")).active);
    }

    #[test]
    fn test_cookie_round_trip() {
        let gate = gate();
        let set_cookie = gate.session_cookie("YF9x~preview.ref=").unwrap();
        let header = format!("theme=dark; {}", cookie_value(&set_cookie));

        let session = gate.is_preview(Some(&header));
        assert!(session.active);
        assert_eq!(session.content_ref(), Some("YF9x~preview.ref="));
    }

    #[test]
    fn test_tampered_cookie_is_inactive() {
        let gate = gate();
        let forged = format!("preview=other-ref.{}", gate.sign("real-ref").unwrap());
        assert!(!gate.is_preview(Some(&forged)).active);

        let other_gate = PreviewGate::new(&PreviewConfig {
            cookie_name: "preview".to_string(),
            secret: "different".to_string(),
        });
        let set_cookie = other_gate.session_cookie("real-ref").unwrap();
        assert!(!gate.is_preview(Some(cookie_value(&set_cookie))).active);

        assert!(!gate.is_preview(Some("preview=unsigned")).active);
    }

    #[test]
    fn test_signature_is_hmac_sha256_hex() {
        let gate = gate();
        let signature = gate.sign("real-ref").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));

        let mut mac = HmacSha256::new_from_slice(b"s3cret").unwrap();
        mac.update(b"real-ref");
        assert_eq!(signature, hex::encode(mac.finalize().into_bytes()));
    }

    #[test]
    fn test_malformed_signatures_are_rejected() {
        let gate = gate();
        let signature = gate.sign("real-ref").unwrap();

        // Truncated, non-hex and empty signatures
        let truncated = format!("preview=real-ref.{}", &signature[..32]);
        assert!(!gate.is_preview(Some(&truncated)).active);
        assert!(!gate.is_preview(Some("preview=real-ref.zz")).active);
        assert!(!gate.is_preview(Some("preview=real-ref.")).active);

        let upper = format!("preview=real-ref.{}", signature.to_uppercase());
        assert!(gate.is_preview(Some(&upper)).active);
    }

    #[test]
    fn test_clear_cookie_expires() {
        let cleared = gate().clear_cookie();
        assert!(cleared.starts_with("preview=;"));
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn test_inactive_session_hides_ref() {
        let session = PreviewSession {
            active: false,
            content_ref: Some("leftover".to_string()),
        };
        assert_eq!(session.content_ref(), None);
    }

    #[test]
    fn test_link_resolver() {
        let doc = post_doc("id-a", "a", "A", "2021-01-01T00:00:00Z");
        assert_eq!(link_resolver(&doc), "/post/a");

        let mut page = doc.clone();
        page.doc_type = "page".to_string();
        assert_eq!(link_resolver(&page), "/");
    }

    #[tokio::test]
    async fn test_exchange_resolves_document() {
        let draft = post_doc("id-d", "draft-post", "Draft", "2021-04-01T00:00:00Z");
        let source = sample_source().with_preview("preview-ref", vec![draft]);

        let target = exchange(&source, Some("preview-ref"), Some("id-d"), "post").await;
        assert_eq!(target, Ok("/post/draft-post".to_string()));

        let home = exchange(&source, Some("preview-ref"), None, "post").await;
        assert_eq!(home, Ok("/".to_string()));
    }

    #[tokio::test]
    async fn test_exchange_rejects_bad_tokens() {
        let source = sample_source().with_preview("preview-ref", Vec::new());

        assert_eq!(
            exchange(&source, Some("bogus"), Some("id-a"), "post").await,
            Err(PreviewError::InvalidToken)
        );
        assert_eq!(
            exchange(&source, Some("bogus"), None, "post").await,
            Err(PreviewError::InvalidToken)
        );
        assert_eq!(
            exchange(&source, None, Some("id-a"), "post").await,
            Err(PreviewError::InvalidToken)
        );
        assert_eq!(
            exchange(&source, Some("preview-ref"), Some("missing"), "post").await,
            Err(PreviewError::InvalidToken)
        );
    }
}
