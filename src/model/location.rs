//! Client-side location state.
//!
//! The OAuth redirect reaches the client as a deep-link activation (loopback
//! redirect URL). We keep the path and query as structured state so the
//! session core can inspect it for callback markers and strip transient OAuth
//! artifacts without a navigation.

/// Query parameters that identify an in-flight OAuth exchange. They are
/// stripped once the callback resolves so a later evaluation cannot bounce
/// back into the callback screen.
const OAUTH_ARTIFACTS: &[&str] = &["code", "error", "state"];

/// A path plus ordered query parameters, e.g. `/auth/callback?code=abc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    path: String,
    query: Vec<(String, String)>,
}

impl Location {
    /// Parse from a `path?key=value&...` string. Keys without `=` get an
    /// empty value. Anything before `?` is taken verbatim as the path.
    pub fn parse(raw: &str) -> Self {
        let (path, query_str) = match raw.split_once('?') {
            Some((p, q)) => (p, q),
            None => (raw, ""),
        };

        let query = query_str
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect();

        Self {
            path: if path.is_empty() { "/" } else { path }.to_string(),
            query,
        }
    }

    /// The root location with no query.
    pub fn root() -> Self {
        Self::parse("/")
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value for `key`, if present.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_query_param(&self, key: &str) -> bool {
        self.query.iter().any(|(k, _)| k == key)
    }

    /// True when this location must be handled by the callback screen: the
    /// path is the OAuth return path, or the query carries an authorization
    /// code or an error parameter. The decision is independent of any
    /// session facts.
    pub fn is_oauth_callback(&self, return_path: &str) -> bool {
        self.path == return_path
            || self.has_query_param("code")
            || self.has_query_param("error")
    }

    /// Remove OAuth artifacts from the query in place. Returns true when
    /// anything was removed (the "replace history" moment).
    pub fn strip_oauth_artifacts(&mut self) -> bool {
        let before = self.query.len();
        self.query.retain(|(k, _)| !OAUTH_ARTIFACTS.contains(&k.as_str()));
        self.query.len() != before
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::root()
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)?;
        for (i, (k, v)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            if v.is_empty() {
                write!(f, "{sep}{k}")?;
            } else {
                write!(f, "{sep}{k}={v}")?;
            }
        }
        Ok(())
    }
}
