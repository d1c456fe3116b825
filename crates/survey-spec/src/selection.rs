use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Chosen labels of one multi-select question, kept in selection order so
/// the submitted label and id lists line up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SelectionSet(Vec<String>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Vec::new();
        for label in labels {
            let label = label.into();
            if !out.contains(&label) {
                out.push(label);
            }
        }
        Self(out)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|existing| existing == label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Toggle `label`, honouring exclusive sentinels.
    ///
    /// A sentinel either deselects (when any sentinel is already chosen) or
    /// replaces the whole set. Any other label first drops the sentinels and
    /// is then added or removed.
    pub fn toggle(&self, label: &str, is_sentinel: impl Fn(&str) -> bool) -> SelectionSet {
        if is_sentinel(label) {
            if self.iter().any(&is_sentinel) {
                return SelectionSet::new();
            }
            return SelectionSet(vec![label.to_string()]);
        }

        let mut next: Vec<String> = self
            .0
            .iter()
            .filter(|existing| !is_sentinel(existing))
            .cloned()
            .collect();
        if let Some(pos) = next.iter().position(|existing| existing == label) {
            next.remove(pos);
        } else {
            next.push(label.to_string());
        }
        SelectionSet(next)
    }

    /// Plain multi-select toggle.
    pub fn toggle_free(&self, label: &str) -> SelectionSet {
        self.toggle(label, |_| false)
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
