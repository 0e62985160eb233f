//! The result of looking up a field on a mapping node.

use std::{fmt, rc::Rc};

use crate::{
    error::{Error, Result},
    source::SourceContext,
};

/// Where a lookup happened: the mapping's path plus the key that was asked for.
#[derive(Debug, Clone)]
pub struct Origin {
    source: Rc<SourceContext>,
    path: Vec<String>,
    key: String,
}

impl Origin {
    pub(crate) fn new(source: Rc<SourceContext>, path: &[String], key: &str) -> Self {
        Self {
            source,
            path: path.to_vec(),
            key: key.to_string(),
        }
    }

    fn key_path(&self) -> Vec<String> {
        let mut path = self.path.clone();
        path.push(self.key.clone());
        path
    }
}

#[derive(Debug, Clone)]
enum Reason {
    /// The key is absent (or `null`); `keys` lists what the mapping does have.
    Absent { keys: Vec<String> },
    /// The value was present but rejected by a filter.
    Rejected(String),
}

#[derive(Debug, Clone)]
enum State<T> {
    Present(T),
    Missing(Reason),
}

/// Either a present value or the reason it is missing.
///
/// A missing lookup is not an error by itself; callers pick a default with
/// [`Lookup::unwrap_or`] or turn it into a located error with
/// [`Lookup::required`].
#[derive(Debug, Clone)]
pub struct Lookup<T> {
    state: State<T>,
    origin: Option<Origin>,
}

impl<T> Lookup<T> {
    /// A present value without an origin.
    pub fn present(value: T) -> Self {
        Self {
            state: State::Present(value),
            origin: None,
        }
    }

    /// A missing value carrying only a message.
    pub fn missing(message: impl Into<String>) -> Self {
        Self {
            state: State::Missing(Reason::Rejected(message.into())),
            origin: None,
        }
    }

    pub(crate) fn found(value: T, origin: Origin) -> Self {
        Self {
            state: State::Present(value),
            origin: Some(origin),
        }
    }

    pub(crate) fn absent(origin: Origin, keys: Vec<String>) -> Self {
        Self {
            state: State::Missing(Reason::Absent { keys }),
            origin: Some(origin),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self.state, State::Present(_))
    }

    pub fn is_missing(&self) -> bool {
        !self.is_present()
    }

    /// The value, or a located error explaining why it is missing.
    pub fn required(self) -> Result<T> {
        match self.state {
            State::Present(value) => Ok(value),
            State::Missing(reason) => Err(missing_error(self.origin.as_ref(), reason)),
        }
    }

    /// The value, if present.
    pub fn optional(self) -> Option<T> {
        match self.state {
            State::Present(value) => Some(value),
            State::Missing(_) => None,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.optional().unwrap_or(default)
    }

    pub fn unwrap_or_else(self, default: impl FnOnce() -> T) -> T {
        self.optional().unwrap_or_else(default)
    }

    pub fn as_ref(&self) -> Lookup<&T> {
        Lookup {
            state: match &self.state {
                State::Present(value) => State::Present(value),
                State::Missing(reason) => State::Missing(reason.clone()),
            },
            origin: self.origin.clone(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        Lookup {
            state: match self.state {
                State::Present(value) => State::Present(f(value)),
                State::Missing(reason) => State::Missing(reason),
            },
            origin: self.origin,
        }
    }

    /// Keep a present value only if `predicate` accepts it.
    pub fn filter(self, predicate: impl FnOnce(&T) -> bool, message: impl Into<String>) -> Self {
        let state = match self.state {
            State::Present(value) => {
                if predicate(&value) {
                    State::Present(value)
                } else {
                    State::Missing(Reason::Rejected(message.into()))
                }
            }
            missing => missing,
        };
        Self {
            state,
            origin: self.origin,
        }
    }

    /// Narrow a present value to one of its variants; anything else becomes missing.
    pub fn filter_map<U>(self, f: impl FnOnce(T) -> Option<U>, message: impl Into<String>) -> Lookup<U> {
        let state = match self.state {
            State::Present(value) => match f(value) {
                Some(narrowed) => State::Present(narrowed),
                None => State::Missing(Reason::Rejected(message.into())),
            },
            State::Missing(reason) => State::Missing(reason),
        };
        Lookup {
            state,
            origin: self.origin,
        }
    }

    /// Human-readable reason for a missing value.
    pub fn message(&self) -> Option<String> {
        match &self.state {
            State::Present(_) => None,
            State::Missing(reason) => Some(missing_error(self.origin.as_ref(), reason.clone()).to_string()),
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::present(value),
            None => Lookup::missing("value is missing"),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Lookup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            State::Present(value) => write!(f, "Present({value})"),
            State::Missing(_) => write!(f, "Missing({})", self.message().unwrap_or_default()),
        }
    }
}

fn missing_error(origin: Option<&Origin>, reason: Reason) -> Box<Error> {
    match (origin, reason) {
        (Some(origin), Reason::Absent { keys }) => {
            origin.source.missing_field(&origin.path, &origin.key, keys)
        }
        (Some(origin), Reason::Rejected(message)) => {
            origin.source.invalid_value(&origin.key_path(), message)
        }
        (None, Reason::Absent { .. }) => Box::new(Error::InvalidValue {
            src: None,
            span: None,
            message: "value is missing".to_string(),
            location: None,
        }),
        (None, Reason::Rejected(message)) => Box::new(Error::InvalidValue {
            src: None,
            span: None,
            message,
            location: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        let source = Rc::new(SourceContext::new("info:\n  title: Pets\n", "api.yaml"));
        Origin::new(source, &["info".to_string()], "version")
    }

    #[test]
    fn test_present_combinators() {
        let lookup = Lookup::present(3);
        assert!(lookup.is_present());
        assert_eq!(lookup.clone().map(|n| n * 2).required().unwrap(), 6);
        assert_eq!(lookup.clone().filter(|n| *n > 5, "too small").optional(), None);
        assert_eq!(lookup.unwrap_or(0), 3);
    }

    #[test]
    fn test_absent_required_is_located() {
        let lookup: Lookup<String> = Lookup::absent(origin(), vec!["title".into()]);
        assert!(lookup.is_missing());
        let error = lookup.required().unwrap_err();
        assert_eq!(
            error.to_string(),
            "missing required key 'version' (keys: [title]) at api.yaml#/info (api.yaml:1)"
        );
    }

    #[test]
    fn test_rejected_keeps_origin() {
        let lookup = Lookup::found("abc".to_string(), origin());
        let error = lookup
            .filter(|s| s.starts_with('1'), "version must start with 1")
            .required()
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "version must start with 1 at api.yaml#/info/version (api.yaml:1)"
        );
    }

    #[test]
    fn test_filter_map_narrows() {
        let lookup = Lookup::present("12".to_string());
        assert_eq!(
            lookup.clone().filter_map(|s| s.parse::<u8>().ok(), "not a number").optional(),
            Some(12)
        );
        let error = Lookup::present("x".to_string())
            .filter_map(|s| s.parse::<u8>().ok(), "not a number")
            .required()
            .unwrap_err();
        assert_eq!(error.to_string(), "not a number");
    }

    #[test]
    fn test_defaults() {
        let lookup: Lookup<bool> = Lookup::absent(origin(), vec![]);
        assert!(lookup.clone().unwrap_or(true));
        assert_eq!(lookup.optional(), None);
    }
}
