//! Resolution of variable requests against a file's variable names
//!
//! A request token selects the key it equals exactly; failing that, every key
//! that contains it as a substring, in key order. Tokens that select nothing are
//! reported as [`Diagnostic::UnmatchedToken`] and do not stop resolution.

use crate::errors::{Result, ToolboxError};
use std::fmt;
use std::path::PathBuf;

/// A variable request: one token or an ordered collection of tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarRequest {
    Single(String),
    Many(Vec<String>),
}

impl VarRequest {
    /// The request tokens, in order
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        match self {
            Self::Single(token) => std::slice::from_ref(token),
            Self::Many(tokens) => tokens,
        }
    }

    /// Checks the request once at the boundary.
    ///
    /// # Errors
    ///
    /// An empty collection is a missing request ([`ToolboxError::VariableError`]);
    /// an empty token is [`ToolboxError::InvalidArgument`], since it would match
    /// every key.
    pub fn validate(&self) -> Result<()> {
        if self.tokens().is_empty() {
            return Err(ToolboxError::VariableError("varlist not supplied".to_string()));
        }
        if let Some(position) = self.tokens().iter().position(|t| t.is_empty()) {
            return Err(ToolboxError::invalid_argument(
                format!("token #{position}"),
                "variable tokens must be non-empty strings",
            ));
        }
        Ok(())
    }
}

impl From<&str> for VarRequest {
    fn from(token: &str) -> Self {
        Self::Single(token.to_string())
    }
}

impl From<String> for VarRequest {
    fn from(token: String) -> Self {
        Self::Single(token)
    }
}

impl From<Vec<String>> for VarRequest {
    fn from(tokens: Vec<String>) -> Self {
        Self::Many(tokens)
    }
}

impl From<&[&str]> for VarRequest {
    fn from(tokens: &[&str]) -> Self {
        Self::Many(tokens.iter().map(|t| (*t).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for VarRequest {
    fn from(tokens: [&str; N]) -> Self {
        Self::Many(tokens.iter().map(|t| (*t).to_string()).collect())
    }
}

/// A non-fatal finding reported alongside a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A request token matched no variable
    UnmatchedToken { token: String },
    /// A file was left out by the include filter
    SkippedFile { path: PathBuf },
    /// A file produced no result because none of its variables matched
    EmptyResult { path: PathBuf },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedToken { token } => write!(f, "{token} not found in varlist"),
            Self::SkippedFile { path } => write!(f, "{} skipped by include filter", path.display()),
            Self::EmptyResult { path } => write!(f, "{} has no matching variables", path.display()),
        }
    }
}

/// Outcome of resolving a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// At least one key matched
    Matched {
        names: Vec<String>,
        diagnostics: Vec<Diagnostic>,
    },
    /// Nothing matched and emptiness was tolerated
    Empty { diagnostics: Vec<Diagnostic> },
}

impl Resolution {
    /// The matched names; empty for [`Resolution::Empty`]
    #[must_use]
    pub fn names(&self) -> &[String] {
        match self {
            Self::Matched { names, .. } => names,
            Self::Empty { .. } => &[],
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Matched { diagnostics, .. } | Self::Empty { diagnostics } => diagnostics,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }
}

/// Resolves `request` against `keys` (the file's sorted variable names).
///
/// # Errors
///
/// Returns the errors of [`VarRequest::validate`], and
/// [`ToolboxError::NoMatch`] when nothing matched and `tolerate_empty` is false.
pub fn resolve(request: &VarRequest, keys: &[String], tolerate_empty: bool) -> Result<Resolution> {
    request.validate()?;

    let mut names: Vec<String> = Vec::new();
    let mut diagnostics = Vec::new();

    for token in request.tokens() {
        if keys.contains(token) {
            if !names.contains(token) {
                names.push(token.clone());
            }
            continue;
        }

        let mut matched = false;
        for key in keys.iter().filter(|k| k.contains(token.as_str())) {
            matched = true;
            if !names.contains(key) {
                names.push(key.clone());
            }
        }

        if !matched {
            tracing::warn!(token = %token, "Warning: {token} not found in varlist");
            diagnostics.push(Diagnostic::UnmatchedToken {
                token: token.clone(),
            });
        }
    }

    if !names.is_empty() {
        return Ok(Resolution::Matched { names, diagnostics });
    }

    if tolerate_empty {
        Ok(Resolution::Empty { diagnostics })
    } else {
        Err(ToolboxError::NoMatch {
            tokens: request.tokens().to_vec(),
        })
    }
}
