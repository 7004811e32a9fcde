use crate::url::domain::extract_domain;
use crate::{UrlError, UrlResult};
use url::Url;

/// Turns raw hrefs and srcs into canonical, domain-scoped URLs
///
/// A canonicalizer is a pure function of its domain: the same
/// `(base, reference)` pair always yields the same result.
///
/// # Normalization Steps
///
/// 1. Resolve the reference against the base (standard URL joining)
/// 2. Reject schemes other than `http` and `https`
/// 3. Reject hosts outside the crawl domain, once one is set
/// 4. Remove the fragment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Canonicalizer {
    domain: Option<String>,
}

impl Canonicalizer {
    /// Creates a canonicalizer without domain scoping
    pub fn new() -> Self {
        Self { domain: None }
    }

    /// Creates a canonicalizer scoped to `domain` (host, plus `:port` if any)
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
        }
    }

    /// Creates a canonicalizer scoped to the domain of the crawl's start URL
    pub fn from_start_url(start: &Url) -> UrlResult<Self> {
        check_scheme(start)?;
        let domain = extract_domain(start).ok_or(UrlError::MissingDomain)?;
        Ok(Self::for_domain(domain))
    }

    /// Returns the crawl domain, if one is set
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Canonicalizes `reference` against `base`, reporting why it was rejected
    ///
    /// # Examples
    ///
    /// ```
    /// use md_crawler::url::Canonicalizer;
    /// use url::Url;
    ///
    /// let canon = Canonicalizer::for_domain("ex.com");
    /// let base = Url::parse("https://ex.com/a/").unwrap();
    /// let url = canon.try_normalize(&base, "../b?x=1#top").unwrap();
    /// assert_eq!(url.as_str(), "https://ex.com/b?x=1");
    ///
    /// assert!(canon.try_normalize(&base, "https://other.com/").is_err());
    /// ```
    pub fn try_normalize(&self, base: &Url, reference: &str) -> UrlResult<Url> {
        let mut url = base
            .join(reference.trim())
            .map_err(|e| UrlError::Parse(format!("{}: {}", reference, e)))?;

        check_scheme(&url)?;

        if let Some(domain) = &self.domain {
            let host = extract_domain(&url).ok_or(UrlError::MissingDomain)?;
            if &host != domain {
                return Err(UrlError::OutOfDomain {
                    host,
                    domain: domain.clone(),
                });
            }
        }

        url.set_fragment(None);
        Ok(url)
    }

    /// Canonicalizes `reference` against `base`
    ///
    /// Returns `None` for malformed references, non-HTTP(S) schemes and
    /// hosts outside the crawl domain.
    pub fn normalize(&self, base: &Url, reference: &str) -> Option<Url> {
        match self.try_normalize(base, reference) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::trace!("Rejected reference {:?} on {}: {}", reference, base, e);
                None
            }
        }
    }
}

/// Resolves a reference to an absolute URL without any scoping
///
/// Used where the live URL must be kept (images on a CDN, external links),
/// so the fragment is preserved.
pub fn resolve_reference(base: &Url, reference: &str) -> Option<Url> {
    base.join(reference.trim()).ok()
}

fn check_scheme(url: &Url) -> UrlResult<()> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            other
        ))),
    }
}
