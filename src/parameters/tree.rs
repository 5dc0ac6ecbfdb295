//! The ordered parameter hierarchy
//!
//! [`ParameterTree`] maps main category → sub-category → item → [`Parameter`].
//! Insertion order is kept at every level so collaborators can display the
//! tree the way the snapshot declared it.

use crate::error::{ParamError, Result, SerializationError};
use crate::parameters::parameter::Parameter;
use crate::parameters::path::{validate_segment, ParamPath};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Items of one sub-category, in declaration order
pub type ItemMap = IndexMap<String, Parameter>;

/// Sub-categories of one main category, in declaration order
pub type SubCategoryMap = IndexMap<String, ItemMap>;

/// Hierarchical set of parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterTree {
    categories: IndexMap<String, SubCategoryMap>,
}

/// Aggregate view of one main category
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    /// Number of items across all sub-categories
    pub items: usize,
    pub literals: usize,
    pub derived: usize,
    /// Mean lower bound over literal items, `None` without literals
    pub mean_lower: Option<f64>,
    /// Mean upper bound over literal items, `None` without literals
    pub mean_upper: Option<f64>,
}

impl ParameterTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON snapshot
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtree::parameters::{ParamPath, ParameterTree};
    ///
    /// let tree = ParameterTree::from_json(
    ///     r#"{"Env":{"Temp":{"A":{"value":10,"lower":0,"upper":100,"unit":1}}}}"#,
    /// )
    /// .unwrap();
    /// assert!(tree.get(&ParamPath::new("Env", "Temp", "A")).is_some());
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let tree: ParameterTree =
            serde_json::from_str(json).map_err(|e| ParamError::malformed(e.to_string()))?;
        tree.validate()?;
        Ok(tree)
    }

    /// Build a tree from an already parsed JSON document
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let tree: ParameterTree =
            serde_json::from_value(value).map_err(|e| ParamError::malformed(e.to_string()))?;
        tree.validate()?;
        Ok(tree)
    }

    /// Serialize to pretty-printed JSON in the persisted layout
    pub fn to_json(&self) -> std::result::Result<String, SerializationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every category and item name
    pub fn validate(&self) -> Result<()> {
        for (main, subs) in &self.categories {
            validate_segment(main)?;
            for (sub, items) in subs {
                validate_segment(sub)?;
                for item in items.keys() {
                    validate_segment(item).map_err(|e| {
                        ParamError::malformed(format!("{}: {}", ParamPath::new(main, sub, item), e))
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Insert a parameter, creating categories as needed
    ///
    /// # Returns
    ///
    /// The parameter previously stored at `path`, if any
    pub fn insert(
        &mut self,
        path: ParamPath,
        param: impl Into<Parameter>,
    ) -> Result<Option<Parameter>> {
        for segment in path.segments() {
            validate_segment(segment)?;
        }
        let ParamPath { main, sub, item } = path;
        Ok(self
            .categories
            .entry(main)
            .or_default()
            .entry(sub)
            .or_default()
            .insert(item, param.into()))
    }

    pub fn get(&self, path: &ParamPath) -> Option<&Parameter> {
        self.categories
            .get(&path.main)?
            .get(&path.sub)?
            .get(&path.item)
    }

    pub(crate) fn get_mut(&mut self, path: &ParamPath) -> Option<&mut Parameter> {
        self.categories
            .get_mut(&path.main)?
            .get_mut(&path.sub)?
            .get_mut(&path.item)
    }

    pub fn contains(&self, path: &ParamPath) -> bool {
        self.get(path).is_some()
    }

    /// Main category names in declaration order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Sub-category names of `main`, or `None` if `main` is unknown
    pub fn sub_categories(&self, main: &str) -> Option<impl Iterator<Item = &str>> {
        self.categories
            .get(main)
            .map(|subs| subs.keys().map(String::as_str))
    }

    /// Items of `main`/`sub`, or `None` if either is unknown
    pub fn items(&self, main: &str, sub: &str) -> Option<&ItemMap> {
        self.categories.get(main)?.get(sub)
    }

    /// Every parameter with its path, in display order
    pub fn iter(&self) -> impl Iterator<Item = (ParamPath, &Parameter)> {
        self.categories.iter().flat_map(|(main, subs)| {
            subs.iter().flat_map(move |(sub, items)| {
                items
                    .iter()
                    .map(move |(item, param)| (ParamPath::new(main, sub, item), param))
            })
        })
    }

    /// Paths of every parameter, in display order
    pub fn paths(&self) -> Vec<ParamPath> {
        self.iter().map(|(path, _)| path).collect()
    }

    pub fn len(&self) -> usize {
        self.categories
            .values()
            .flat_map(|subs| subs.values())
            .map(|items| items.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paths whose segments contain `term`, ignoring case
    ///
    /// An empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<ParamPath> {
        let needle = term.to_lowercase();
        self.iter()
            .filter(|(path, _)| {
                path.segments()
                    .iter()
                    .any(|segment| segment.to_lowercase().contains(&needle))
            })
            .map(|(path, _)| path)
            .collect()
    }

    /// Counts and mean bounds for one main category
    pub fn summarize(&self, main: &str) -> Option<CategorySummary> {
        let subs = self.categories.get(main)?;

        let mut summary = CategorySummary {
            items: 0,
            literals: 0,
            derived: 0,
            mean_lower: None,
            mean_upper: None,
        };
        let mut lower_sum = 0.0;
        let mut upper_sum = 0.0;

        for param in subs.values().flat_map(|items| items.values()) {
            summary.items += 1;
            match param {
                Parameter::Literal(literal) => {
                    summary.literals += 1;
                    lower_sum += literal.lower();
                    upper_sum += literal.upper();
                }
                Parameter::Derived(_) => summary.derived += 1,
            }
        }

        if summary.literals > 0 {
            let n = summary.literals as f64;
            summary.mean_lower = Some(lower_sum / n);
            summary.mean_upper = Some(upper_sum / n);
        }

        Some(summary)
    }
}
