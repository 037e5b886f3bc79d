use crate::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use regex::Regex;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::{Arc, LazyLock},
};
use thiserror::Error;

#[derive(Clone, Debug, Eq, Default)]
pub struct Labels(Arc<Map>);

pub type Map = BTreeMap<String, String>;

/// A validated label selector: a conjunction of requirements.
///
/// Selectors are only built from a [`LabelSelector`] through `TryFrom`, so an
/// invalid selector is rejected at construction and [`Selector::matches`]
/// cannot fail.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct Selector(Vec<Requirement>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requirement {
    key: String,
    operator: Operator,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    Equals(String),
    In(BTreeSet<String>),
    NotIn(BTreeSet<String>),
    Exists,
    DoesNotExist,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("invalid label key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("invalid label value {value:?} for key {key:?}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: &'static str,
    },

    #[error("{operator:?} is not a valid label selector operator")]
    InvalidOperator { operator: String },

    #[error("operator {operator} on key {key:?} requires at least one value")]
    MissingValues { key: String, operator: &'static str },

    #[error("operator {operator} on key {key:?} must not have values")]
    UnexpectedValues { key: String, operator: &'static str },
}

const MAX_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$")
        .expect("label name regex must compile")
});

static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("label prefix regex must compile")
});

// === Selector ===

impl Selector {
    /// Returns true when every requirement is satisfied by `labels`.
    ///
    /// The empty selector matches everything.
    pub fn matches(&self, labels: &Labels) -> bool {
        self.0.iter().all(|req| req.matches(labels.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.0
    }
}

impl TryFrom<&LabelSelector> for Selector {
    type Error = SelectorError;

    fn try_from(selector: &LabelSelector) -> Result<Self, Self::Error> {
        let mut reqs = Vec::new();

        for (key, value) in selector.match_labels.iter().flatten() {
            validate_key(key)?;
            validate_value(key, value)?;
            reqs.push(Requirement {
                key: key.clone(),
                operator: Operator::Equals(value.clone()),
            });
        }

        for expr in selector.match_expressions.iter().flatten() {
            reqs.push(Requirement::try_from(expr)?);
        }

        Ok(Self(reqs))
    }
}

impl TryFrom<LabelSelector> for Selector {
    type Error = SelectorError;

    #[inline]
    fn try_from(selector: LabelSelector) -> Result<Self, Self::Error> {
        Self::try_from(&selector)
    }
}

impl std::iter::FromIterator<Requirement> for Selector {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, req) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            req.fmt(f)?;
        }
        Ok(())
    }
}

// === Requirement ===

impl Requirement {
    fn matches(&self, labels: &Map) -> bool {
        let value = labels.get(&self.key);
        match &self.operator {
            Operator::Equals(v) => value == Some(v),
            Operator::In(values) => value.is_some_and(|v| values.contains(v)),
            Operator::NotIn(values) => value.is_none_or(|v| !values.contains(v)),
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }
}

impl TryFrom<&LabelSelectorRequirement> for Requirement {
    type Error = SelectorError;

    fn try_from(expr: &LabelSelectorRequirement) -> Result<Self, Self::Error> {
        let LabelSelectorRequirement {
            key,
            operator,
            values,
        } = expr;
        validate_key(key)?;

        let values = values.as_deref().unwrap_or_default();
        let operator = match operator.as_str() {
            "In" => Operator::In(value_set(key, "In", values)?),
            "NotIn" => Operator::NotIn(value_set(key, "NotIn", values)?),
            "Exists" => {
                no_values(key, "Exists", values)?;
                Operator::Exists
            }
            "DoesNotExist" => {
                no_values(key, "DoesNotExist", values)?;
                Operator::DoesNotExist
            }
            op => {
                return Err(SelectorError::InvalidOperator {
                    operator: op.to_string(),
                })
            }
        };

        Ok(Self {
            key: key.clone(),
            operator,
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(values: &BTreeSet<String>) -> String {
            values.iter().cloned().collect::<Vec<_>>().join(",")
        }

        match &self.operator {
            Operator::Equals(v) => write!(f, "{}={}", self.key, v),
            Operator::In(vs) => write!(f, "{} in ({})", self.key, join(vs)),
            Operator::NotIn(vs) => write!(f, "{} notin ({})", self.key, join(vs)),
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
        }
    }
}

fn value_set(
    key: &str,
    operator: &'static str,
    values: &[String],
) -> Result<BTreeSet<String>, SelectorError> {
    if values.is_empty() {
        return Err(SelectorError::MissingValues {
            key: key.to_string(),
            operator,
        });
    }
    for value in values {
        validate_value(key, value)?;
    }
    Ok(values.iter().cloned().collect())
}

fn no_values(key: &str, operator: &'static str, values: &[String]) -> Result<(), SelectorError> {
    if values.is_empty() {
        return Ok(());
    }
    Err(SelectorError::UnexpectedValues {
        key: key.to_string(),
        operator,
    })
}

fn validate_key(key: &str) -> Result<(), SelectorError> {
    let invalid = |reason| SelectorError::InvalidKey {
        key: key.to_string(),
        reason,
    };

    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            if prefix.is_empty() {
                return Err(invalid("prefix must not be empty"));
            }
            if prefix.len() > MAX_PREFIX_LEN {
                return Err(invalid("prefix must be no more than 253 characters"));
            }
            if !PREFIX_RE.is_match(prefix) {
                return Err(invalid("prefix must be a lowercase DNS subdomain"));
            }
            name
        }
        None => key,
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("name must be no more than 63 characters"));
    }
    if !NAME_RE.is_match(name) {
        return Err(invalid(
            "name must consist of alphanumerics, '-', '_' or '.', and begin and end with an alphanumeric",
        ));
    }
    Ok(())
}

fn validate_value(key: &str, value: &str) -> Result<(), SelectorError> {
    let invalid = |reason| SelectorError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    };

    if value.is_empty() {
        return Ok(());
    }
    if value.len() > MAX_NAME_LEN {
        return Err(invalid("must be no more than 63 characters"));
    }
    if !NAME_RE.is_match(value) {
        return Err(invalid(
            "must consist of alphanumerics, '-', '_' or '.', and begin and end with an alphanumeric",
        ));
    }
    Ok(())
}

// === Labels ===

impl Labels {
    /// Reads the labels of any resource's metadata.
    pub fn of<T: kube::ResourceExt>(resource: &T) -> Self {
        resource.labels().clone().into()
    }
}

impl From<Map> for Labels {
    #[inline]
    fn from(labels: Map) -> Self {
        Self(Arc::new(labels))
    }
}

impl From<Option<Map>> for Labels {
    #[inline]
    fn from(labels: Option<Map>) -> Self {
        labels.unwrap_or_default().into()
    }
}

impl AsRef<Map> for Labels {
    #[inline]
    fn as_ref(&self) -> &Map {
        self.0.as_ref()
    }
}

impl<T: AsRef<Map>> std::cmp::PartialEq<T> for Labels {
    #[inline]
    fn eq(&self, t: &T) -> bool {
        self.0.as_ref().eq(t.as_ref())
    }
}

impl std::iter::FromIterator<(String, String)> for Labels {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for Labels {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
