use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// `SameSite` attribute applied to emitted cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// Attributes used when writing a cookie.
///
/// `max_age_ms` is kept in milliseconds to match the expiry unit of the
/// authentication data it mirrors; it is converted to whole seconds when the
/// `Set-Cookie` header is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub max_age_ms: Option<i64>,
    pub http_only: bool,
    pub same_site: SameSite,
    pub secure: bool,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            max_age_ms: None,
            http_only: false,
            same_site: SameSite::Lax,
            secure: false,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingCookie {
    name: String,
    /// `None` means the cookie is being cleared.
    value: Option<String>,
    attributes: CookieAttributes,
}

impl PendingCookie {
    fn render(&self) -> String {
        let mut header = match &self.value {
            Some(value) => format!("{}={}", self.name, value),
            None => format!("{}=; Max-Age=0", self.name),
        };
        if self.value.is_some() {
            if let Some(ms) = self.attributes.max_age_ms {
                header.push_str(&format!("; Max-Age={}", ms / 1000));
            }
        }
        header.push_str("; Path=/");
        header.push_str(&format!("; SameSite={}", self.attributes.same_site));
        if self.attributes.http_only {
            header.push_str("; HttpOnly");
        }
        if self.attributes.secure {
            header.push_str("; Secure");
        }
        header
    }
}

/// Per-context cookie jar.
///
/// On the server the jar is seeded from the incoming request's `Cookie`
/// header; on the client it models the cookies readable by the page. Writes
/// update the readable value and record a `Set-Cookie` header for the
/// outgoing response in the same call, so a reader on the same context never
/// observes the two disagreeing.
#[derive(Debug, Default)]
pub struct CookieJar {
    values: RwLock<HashMap<String, String>>,
    pending: RwLock<Vec<PendingCookie>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a jar from a raw `Cookie` request header. Malformed segments
    /// are skipped.
    pub fn from_header(header: &str) -> Self {
        let mut values = HashMap::new();
        for segment in header.split(';') {
            let segment = segment.trim();
            if let Some((name, value)) = segment.split_once('=') {
                if !name.is_empty() {
                    values.insert(name.to_string(), value.to_string());
                }
            }
        }
        Self {
            values: RwLock::new(values),
            pending: RwLock::new(Vec::new()),
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Write a cookie value and record the matching `Set-Cookie` header.
    pub fn set(&self, name: &str, value: &str, attributes: &CookieAttributes) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
        self.push_pending(PendingCookie {
            name: name.to_string(),
            value: Some(value.to_string()),
            attributes: attributes.clone(),
        });
    }

    /// Remove a cookie and record an expired `Set-Cookie` header.
    pub fn clear(&self, name: &str, attributes: &CookieAttributes) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        self.push_pending(PendingCookie {
            name: name.to_string(),
            value: None,
            attributes: attributes.clone(),
        });
    }

    /// Rendered `Set-Cookie` header values for every mutation made through
    /// this jar, one per cookie name (the latest write wins).
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.pending
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(PendingCookie::render)
            .collect()
    }

    /// Max-Age (in milliseconds) recorded for a pending cookie write, if any.
    pub fn pending_max_age_ms(&self, name: &str) -> Option<i64> {
        self.pending
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.name == name && c.value.is_some())
            .and_then(|c| c.attributes.max_age_ms)
    }

    fn push_pending(&self, cookie: PendingCookie) {
        let mut pending = self.pending.write().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|c| c.name != cookie.name);
        pending.push(cookie);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_header() {
        let jar = CookieJar::from_header("a=1; session=abc123; empty=");
        assert_eq!(jar.get("a"), Some("1".to_string()));
        assert_eq!(jar.get("session"), Some("abc123".to_string()));
        assert_eq!(jar.get("empty"), Some(String::new()));
        assert_eq!(jar.get("missing"), None);
    }

    #[test]
    fn test_parse_skips_malformed_segments() {
        let jar = CookieJar::from_header("junk; =nameless; ok=yes");
        assert_eq!(jar.get("ok"), Some("yes".to_string()));
        assert_eq!(jar.get("junk"), None);
    }

    #[test]
    fn test_set_updates_value_and_header_together() {
        let jar = CookieJar::new();
        jar.set(
            "rt",
            "tok",
            &CookieAttributes {
                max_age_ms: Some(900_000),
                http_only: true,
                same_site: SameSite::Strict,
                secure: true,
            },
        );

        assert_eq!(jar.get("rt"), Some("tok".to_string()));
        let headers = jar.set_cookie_headers();
        assert_eq!(headers.len(), 1);
        assert!(headers[0].starts_with("rt=tok"));
        assert!(headers[0].contains("Max-Age=900"));
        assert!(headers[0].contains("SameSite=Strict"));
        assert!(headers[0].contains("HttpOnly"));
        assert!(headers[0].contains("Secure"));
        assert_eq!(jar.pending_max_age_ms("rt"), Some(900_000));
    }

    #[test]
    fn test_clear_emits_expired_cookie() {
        let jar = CookieJar::from_header("rt=old");
        jar.clear("rt", &CookieAttributes::default());

        assert_eq!(jar.get("rt"), None);
        let headers = jar.set_cookie_headers();
        assert_eq!(headers.len(), 1);
        assert!(headers[0].starts_with("rt=; Max-Age=0"));
    }

    #[test]
    fn test_latest_write_wins() {
        let jar = CookieJar::new();
        jar.set("rt", "first", &CookieAttributes::default());
        jar.set("rt", "second", &CookieAttributes::default());

        assert_eq!(jar.get("rt"), Some("second".to_string()));
        let headers = jar.set_cookie_headers();
        assert_eq!(headers.len(), 1);
        assert!(headers[0].starts_with("rt=second"));
    }
}
