//! Charm URL parsing, used as the default charm reference validator.
//!
//! Accepted form: `[schema:][~user/][series/]name[-revision]`, where the
//! schema defaults to `cs`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::names::is_valid_series;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CharmUrlError {
    #[error("charm URL has invalid schema: {0:?}")]
    Schema(String),
    #[error("charm URL has invalid user name: {0:?}")]
    User(String),
    #[error("charm URL has invalid series: {0:?}")]
    Series(String),
    #[error("charm URL has invalid charm name: {0:?}")]
    Name(String),
    #[error("charm URL has invalid form: {0:?}")]
    Form(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharmSchema {
    Store,
    Local,
}

impl CharmSchema {
    pub fn as_str(self) -> &'static str {
        match self {
            CharmSchema::Store => "cs",
            CharmSchema::Local => "local",
        }
    }
}

/// A parsed charm reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharmUrl {
    pub schema: CharmSchema,
    pub user: Option<String>,
    pub series: Option<String>,
    pub name: String,
    pub revision: Option<u32>,
}

impl CharmUrl {
    pub fn parse(url: &str) -> Result<Self, CharmUrlError> {
        let (schema, rest) = match url.split_once(':') {
            Some(("cs", rest)) => (CharmSchema::Store, rest),
            Some(("local", rest)) => (CharmSchema::Local, rest),
            Some(_) => return Err(CharmUrlError::Schema(url.to_string())),
            None => (CharmSchema::Store, url),
        };

        let mut parts: Vec<&str> = rest.split('/').collect();

        let user = match parts.first().copied() {
            Some(first) if first.starts_with('~') => {
                let user = &first[1..];
                if schema != CharmSchema::Store || !is_valid_user(user) {
                    return Err(CharmUrlError::User(url.to_string()));
                }
                parts.remove(0);
                Some(user.to_string())
            }
            _ => None,
        };

        let (series, name_part) = match parts.as_slice() {
            [name] => (None, *name),
            [series, name] => {
                if !is_valid_series(series) {
                    return Err(CharmUrlError::Series(url.to_string()));
                }
                (Some(series.to_string()), *name)
            }
            _ => return Err(CharmUrlError::Form(url.to_string())),
        };

        let (name, revision) = split_revision(name_part);
        if !is_valid_charm_name(name) {
            return Err(CharmUrlError::Name(url.to_string()));
        }

        Ok(CharmUrl {
            schema,
            user,
            series,
            name: name.to_string(),
            revision,
        })
    }
}

impl FromStr for CharmUrl {
    type Err = CharmUrlError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CharmUrl::parse(value)
    }
}

impl fmt::Display for CharmUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.schema.as_str())?;
        if let Some(user) = &self.user {
            write!(f, "~{user}/")?;
        }
        if let Some(series) = &self.series {
            write!(f, "{series}/")?;
        }
        f.write_str(&self.name)?;
        if let Some(revision) = self.revision {
            write!(f, "-{revision}")?;
        }
        Ok(())
    }
}

/// Collaborator form of [`CharmUrl::parse`] for [`crate::verify`].
pub fn validate_charm_url(url: &str) -> Result<(), CharmUrlError> {
    CharmUrl::parse(url).map(|_| ())
}

/// Splits a trailing `-<digits>` revision off a charm name.
fn split_revision(value: &str) -> (&str, Option<u32>) {
    if let Some((name, revision)) = value.rsplit_once('-')
        && !revision.is_empty()
        && revision.bytes().all(|byte| byte.is_ascii_digit())
        && let Ok(revision) = revision.parse()
    {
        return (name, Some(revision));
    }
    (value, None)
}

/// `[a-z][a-z0-9]*` followed by `-` segments that each contain a letter.
fn is_valid_charm_name(name: &str) -> bool {
    let mut segments = name.split('-');
    let Some(first) = segments.next() else {
        return false;
    };
    let first_ok = first.bytes().next().is_some_and(|byte| byte.is_ascii_lowercase())
        && first
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit());
    first_ok
        && segments.all(|segment| {
            segment.bytes().any(|byte| byte.is_ascii_lowercase())
                && segment
                    .bytes()
                    .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit())
        })
}

fn is_valid_user(user: &str) -> bool {
    user.bytes().next().is_some_and(|byte| byte.is_ascii_alphanumeric())
        && user
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'+' | b'-'))
}
