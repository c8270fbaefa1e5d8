use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use apicmp_types::{
    full_match_regex, glob_match, CodePattern, CompatibilityType, Criticality, Difference,
    DifferenceSeverity, ElementInfo,
};

use crate::error::{TransformError, TransformResult};
use crate::transform::{DifferenceTransform, TransformOutcome};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration of a [`DifferencesTransform`].
///
/// The top-level `ignore`, `justification`, `classify`, `attachments` and
/// `criticality` are defaults for every recipe that does not set them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DifferencesConfig {
    pub ignore: Option<bool>,
    pub justification: Option<String>,
    pub classify: BTreeMap<CompatibilityType, DifferenceSeverity>,
    pub attachments: BTreeMap<String, String>,
    pub criticality: Option<String>,
    pub differences: Vec<DifferenceRecipe>,
}

/// Which differences a recipe applies to and what it does with them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DifferenceRecipe {
    /// Exact code, or a glob if it contains `*` or `?`.
    pub code: String,
    /// Read `code`, `old`, `new` and `matching` as regular expressions
    /// that must match the whole text.
    pub regex: bool,
    /// Glob the old element's path must match.
    pub old: Option<String>,
    /// Glob the new element's path must match.
    pub new: Option<String>,
    /// Globs that attachments of the difference must match.
    pub matching: BTreeMap<String, String>,
    /// Drop matching differences.
    pub ignore: Option<bool>,
    pub justification: Option<String>,
    /// Severities to set, per compatibility type.
    pub classify: BTreeMap<CompatibilityType, DifferenceSeverity>,
    /// Attachments to add.
    pub attachments: BTreeMap<String, String>,
    /// Name of a known criticality to assign.
    pub criticality: Option<String>,
}

impl DifferenceRecipe {
    /// A recipe for differences with the given code, doing nothing yet.
    pub fn for_code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Compiled recipes
// ---------------------------------------------------------------------------

/// A path or attachment matcher.
#[derive(Debug)]
enum TextMatcher {
    Glob(String),
    Regex(Regex),
}

impl TextMatcher {
    fn compile(pattern: String, regex: bool) -> TransformResult<Self> {
        if !regex {
            return Ok(Self::Glob(pattern));
        }
        full_match_regex(&pattern)
            .map(Self::Regex)
            .map_err(|e| TransformError::Config(e.to_string()))
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            Self::Glob(glob) => glob_match(glob, text),
            Self::Regex(regex) => regex.is_match(text),
        }
    }
}

#[derive(Debug)]
struct Recipe {
    old: Option<TextMatcher>,
    new: Option<TextMatcher>,
    matching: BTreeMap<String, TextMatcher>,
    ignore: bool,
    justification: Option<String>,
    classify: BTreeMap<CompatibilityType, DifferenceSeverity>,
    attachments: BTreeMap<String, String>,
    criticality: Option<Criticality>,
}

impl Recipe {
    fn compile(
        recipe: DifferenceRecipe,
        defaults: &DifferencesConfig,
        known: &[Criticality],
    ) -> TransformResult<(CodePattern, Self)> {
        let code = if recipe.regex {
            CodePattern::regex(&recipe.code).map_err(|e| TransformError::Config(e.to_string()))?
        } else {
            CodePattern::parse(&recipe.code)?
        };
        let regex = recipe.regex;
        let matcher = |pattern: Option<String>| pattern.map(|p| TextMatcher::compile(p, regex)).transpose();
        let old = matcher(recipe.old)?;
        let new = matcher(recipe.new)?;
        let matching = recipe
            .matching
            .into_iter()
            .map(|(key, pattern)| TextMatcher::compile(pattern, regex).map(|m| (key, m)))
            .collect::<TransformResult<BTreeMap<_, _>>>()?;

        let mut classify = defaults.classify.clone();
        classify.extend(recipe.classify);
        let mut attachments = defaults.attachments.clone();
        attachments.extend(recipe.attachments);

        let criticality = match recipe.criticality.or_else(|| defaults.criticality.clone()) {
            Some(name) => Some(Criticality::by_name(known, &name)?.clone()),
            None => None,
        };

        Ok((
            code,
            Self {
                old,
                new,
                matching,
                ignore: recipe.ignore.or(defaults.ignore).unwrap_or(false),
                justification: recipe.justification.or_else(|| defaults.justification.clone()),
                classify,
                attachments,
                criticality,
            },
        ))
    }

    fn matches(&self, old: Option<&ElementInfo>, new: Option<&ElementInfo>, difference: &Difference) -> bool {
        let path_matches = |matcher: &Option<TextMatcher>, element: Option<&ElementInfo>| match matcher {
            Some(matcher) => element.is_some_and(|e| matcher.matches(&e.path)),
            None => true,
        };

        path_matches(&self.old, old)
            && path_matches(&self.new, new)
            && self.matching.iter().all(|(key, matcher)| {
                difference
                    .attachment(key)
                    .is_some_and(|value| matcher.matches(value))
            })
    }

    fn apply(&self, difference: &Difference) -> TransformResult<TransformOutcome> {
        if self.ignore {
            return Ok(TransformOutcome::Discard);
        }
        if self.justification.is_none()
            && self.criticality.is_none()
            && self.classify.is_empty()
            && self.attachments.is_empty()
        {
            return Ok(TransformOutcome::Keep);
        }

        let mut builder = difference
            .to_builder()
            .classifications(self.classify.clone())
            .attachments(self.attachments.clone());
        if let Some(justification) = &self.justification {
            builder = builder.justification(justification.clone());
        }
        if let Some(criticality) = &self.criticality {
            builder = builder.criticality(criticality.clone());
        }
        Ok(TransformOutcome::Replace(builder.build()?))
    }
}

// ---------------------------------------------------------------------------
// DifferencesTransform
// ---------------------------------------------------------------------------

/// Reclassifies, annotates or ignores differences matched by configured
/// recipes. The first matching recipe wins.
#[derive(Debug)]
pub struct DifferencesTransform {
    id: String,
    patterns: Vec<CodePattern>,
    recipes: Vec<Recipe>,
}

impl DifferencesTransform {
    /// Id used when none is given.
    pub const DEFAULT_ID: &'static str = "apicmp.differences";

    /// Compile `config`, resolving criticality names against `known`.
    pub fn new(id: impl Into<String>, config: DifferencesConfig, known: &[Criticality]) -> TransformResult<Self> {
        let mut defaults = config;
        let recipes = std::mem::take(&mut defaults.differences);

        let mut patterns = Vec::with_capacity(recipes.len());
        let mut compiled = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            let (pattern, recipe) = Recipe::compile(recipe, &defaults, known)?;
            patterns.push(pattern);
            compiled.push(recipe);
        }

        Ok(Self {
            id: id.into(),
            patterns,
            recipes: compiled,
        })
    }

    /// Compile a JSON configuration.
    pub fn from_json(id: impl Into<String>, config: serde_json::Value, known: &[Criticality]) -> TransformResult<Self> {
        let config: DifferencesConfig =
            serde_json::from_value(config).map_err(|e| TransformError::Config(e.to_string()))?;
        Self::new(id, config, known)
    }
}

impl DifferenceTransform for DifferencesTransform {
    fn id(&self) -> &str {
        &self.id
    }

    fn code_patterns(&self) -> &[CodePattern] {
        &self.patterns
    }

    fn transform(
        &mut self,
        old: Option<&ElementInfo>,
        new: Option<&ElementInfo>,
        difference: &Difference,
    ) -> TransformResult<TransformOutcome> {
        let recipe = self
            .patterns
            .iter()
            .zip(&self.recipes)
            .find(|(pattern, recipe)| pattern.matches(difference.code()) && recipe.matches(old, new, difference));

        match recipe {
            Some((_, recipe)) => recipe.apply(difference),
            None => Ok(TransformOutcome::Keep),
        }
    }
}
