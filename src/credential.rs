use std::fmt;

/// Organization secret used to authenticate against the replica API.
///
/// Never printed in full by `Debug`; use [`Credential::expose`] when the raw
/// value is needed for a request header.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    /// Build a credential from user or config input. Blank input yields `None`.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Show the last four characters only.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Display state of the credential entry in the interactive front end.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialPanel {
    visible: bool,
}

impl CredentialPanel {
    pub fn new(visible: bool) -> Self {
        Self { visible }
    }

    /// Flip visibility and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    pub fn render(&self, credential: Option<&Credential>) -> String {
        match credential {
            None => "(not set)".to_string(),
            Some(c) if self.visible => c.expose().to_string(),
            Some(c) => c.masked(),
        }
    }
}
