use std::collections::HashSet;

/// Tokens allowed to post webhooks.
///
/// An empty table means access control is off and every request is accepted.
/// This is the documented default; the server logs a warning at startup when
/// it runs that way.
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    tokens: HashSet<String>,
}

impl AccessControl {
    /// Blank entries are ignored, so `tokens = [""]` still means open mode.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(Into::into)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn authorize(&self, token: Option<&str>) -> bool {
        if self.is_open() {
            return true;
        }
        match token {
            Some(t) if !t.is_empty() => self.tokens.contains(t),
            _ => false,
        }
    }
}
