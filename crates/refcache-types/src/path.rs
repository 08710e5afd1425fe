//! Paths inside a value tree, and the accessor that reads and deletes at them.
//!
//! A [`Path`] is a sequence of record-key and list-index steps. Its textual
//! form joins the steps with dots, writing list indices inline:
//! `children.0.item`. Segments made only of digits parse as indices.
//!
//! An index step applied to a record looks up the decimal key, so
//! `items.0` addresses both `{"items": [x]}` and `{"items": {"0": x}}`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::value::Value;

/// One step of a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(k) => f.write_str(k),
            PathStep::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Location of a value relative to some root value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path(Vec<PathStep>);

impl Path {
    /// The empty path, addressing the root itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from its steps.
    pub fn from_steps(steps: Vec<PathStep>) -> Self {
        Self(steps)
    }

    /// The steps, outermost first.
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// This path extended by a record key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Key(key.into()));
        Self(steps)
    }

    /// This path extended by a list index.
    pub fn index(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Index(index));
        Self(steps)
    }

    /// Parse the dotted textual form.
    pub fn parse(text: &str) -> Result<Self, TypeError> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        text.split('.')
            .map(|segment| {
                if segment.is_empty() {
                    return Err(TypeError::InvalidPath {
                        path: text.to_string(),
                        reason: "empty segment".into(),
                    });
                }
                if segment.bytes().all(|b| b.is_ascii_digit()) {
                    segment
                        .parse::<usize>()
                        .map(PathStep::Index)
                        .map_err(|e| TypeError::InvalidPath {
                            path: text.to_string(),
                            reason: e.to_string(),
                        })
                } else {
                    Ok(PathStep::Key(segment.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn step_into<'a>(value: &'a Value, step: &PathStep) -> Option<&'a Value> {
    match (value, step) {
        (Value::Record(rec), PathStep::Key(k)) => rec.get(k),
        (Value::Record(rec), PathStep::Index(i)) => rec.get(&i.to_string()),
        (Value::List(items), PathStep::Index(i)) => items.get(*i),
        _ => None,
    }
}

/// The value at `path` inside `root`, if the path resolves.
pub fn get<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    path.steps()
        .iter()
        .try_fold(root, |value, step| step_into(value, step))
}

/// A copy of `root` with the value at `path` removed.
///
/// Record keys are removed and list elements are spliced out. Untouched
/// branches stay shared with `root`. If the path does not resolve, or is the
/// empty path, `root` is returned unchanged.
pub fn delete(root: &Value, path: &Path) -> Value {
    delete_steps(root, path.steps()).unwrap_or_else(|| root.clone())
}

/// Delete several paths from one root.
///
/// Paths are applied in descending order so that splicing a list element
/// never shifts the index of a path still waiting to be deleted.
pub fn delete_all<'p, I>(root: &Value, paths: I) -> Value
where
    I: IntoIterator<Item = &'p Path>,
{
    let mut ordered: Vec<&Path> = paths.into_iter().collect();
    ordered.sort();
    ordered.dedup();
    ordered
        .into_iter()
        .rev()
        .fold(root.clone(), |value, path| delete(&value, path))
}

fn delete_steps(value: &Value, steps: &[PathStep]) -> Option<Value> {
    let (step, rest) = steps.split_first()?;
    match value {
        Value::Record(rec) => {
            let key = match step {
                PathStep::Key(k) => k.clone(),
                PathStep::Index(i) => i.to_string(),
            };
            let child = rec.get(&key)?;
            let mut next = (**rec).clone();
            if rest.is_empty() {
                next.remove(&key);
            } else {
                next.insert(key, delete_steps(child, rest)?);
            }
            Some(Value::from_record(next))
        }
        Value::List(items) => {
            let PathStep::Index(i) = step else {
                return None;
            };
            let child = items.get(*i)?;
            let mut next = (**items).clone();
            if rest.is_empty() {
                next.remove(*i);
            } else {
                next[*i] = delete_steps(child, rest)?;
            }
            Some(Value::from_list(next))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tree() -> Value {
        Value::record([
            ("uid", Value::from(1)),
            (
                "children",
                Value::list([
                    Value::record([("item", Value::from("a"))]),
                    Value::record([("item", Value::from("b"))]),
                    Value::record([("item", Value::from("c"))]),
                ]),
            ),
            ("meta", Value::record([("0", Value::from("zero"))])),
        ])
    }

    // -----------------------------------------------------------------------
    // Parsing and display
    // -----------------------------------------------------------------------

    #[test]
    fn parse_mixed_steps() {
        let path = Path::parse("children.0.item").unwrap();
        assert_eq!(
            path.steps(),
            &[
                PathStep::Key("children".into()),
                PathStep::Index(0),
                PathStep::Key("item".into()),
            ]
        );
        assert_eq!(path.to_string(), "children.0.item");
    }

    #[test]
    fn parse_empty_is_root() {
        assert!(Path::parse("").unwrap().is_empty());
    }

    #[test]
    fn reject_empty_segment() {
        assert!(Path::parse("a..b").is_err());
        assert!(Path::parse(".a").is_err());
        assert!("a.".parse::<Path>().is_err());
    }

    #[test]
    fn builders_extend_without_mutating() {
        let base = Path::root().key("children");
        let child = base.index(2);
        assert_eq!(base.len(), 1);
        assert_eq!(child.to_string(), "children.2");
    }

    // -----------------------------------------------------------------------
    // Accessor
    // -----------------------------------------------------------------------

    #[test]
    fn get_resolves_nested_values() {
        let t = tree();
        let p = Path::parse("children.1.item").unwrap();
        assert_eq!(get(&t, &p), Some(&Value::from("b")));
        assert!(get(&t, &Path::root()).unwrap().same(&t));
    }

    #[test]
    fn index_step_on_record_uses_decimal_key() {
        let t = tree();
        assert_eq!(get(&t, &Path::parse("meta.0").unwrap()), Some(&Value::from("zero")));
    }

    #[test]
    fn get_missing_path() {
        let t = tree();
        assert!(get(&t, &Path::parse("children.5").unwrap()).is_none());
        assert!(get(&t, &Path::parse("uid.x").unwrap()).is_none());
    }

    #[test]
    fn delete_record_key_copies_on_write() {
        let t = tree();
        let out = delete(&t, &Path::parse("meta").unwrap());
        assert!(out.field("meta").is_none());
        assert!(t.field("meta").is_some());
        // Untouched branches are shared.
        assert!(out.field("children").unwrap().same(t.field("children").unwrap()));
    }

    #[test]
    fn delete_list_element_splices() {
        let t = tree();
        let out = delete(&t, &Path::parse("children.0").unwrap());
        let children = out.field("children").and_then(Value::as_list).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].field("item"), Some(&Value::from("b")));
    }

    #[test]
    fn delete_missing_path_is_identity() {
        let t = tree();
        let out = delete(&t, &Path::parse("nope.1").unwrap());
        assert!(out.same(&t));
        assert!(delete(&t, &Path::root()).same(&t));
    }

    #[test]
    fn delete_all_applies_in_descending_order() {
        let t = tree();
        let a = Path::parse("children.0").unwrap();
        let c = Path::parse("children.2").unwrap();
        let out = delete_all(&t, [&a, &c]);
        let children = out.field("children").and_then(Value::as_list).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].field("item"), Some(&Value::from("b")));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    fn arb_step() -> impl Strategy<Value = PathStep> {
        prop_oneof![
            "[a-z_][a-z0-9_]{0,6}".prop_map(PathStep::Key),
            (0usize..1000).prop_map(PathStep::Index),
        ]
    }

    proptest! {
        #[test]
        fn display_then_parse_is_lossless(steps in prop::collection::vec(arb_step(), 0..6)) {
            let path = Path::from_steps(steps);
            let parsed = Path::parse(&path.to_string()).unwrap();
            prop_assert_eq!(parsed, path);
        }
    }
}
