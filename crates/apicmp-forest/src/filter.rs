//! Tree filters decide which discovered elements make it into a forest.
//!
//! Filtering runs while a forest is built: [`TreeFilter::start`] is called
//! when an element is discovered, [`TreeFilter::finish`] after all its
//! children were processed, and [`TreeFilter::finish_all`] once the whole
//! forest was walked so that filters can settle elements they could not
//! decide earlier. Results are ternary; an element that stays
//! [`FilterMatch::Undecided`] is kept.

use std::collections::BTreeMap;

use regex::Regex;

use apicmp_types::{full_match_regex, glob_match, Element, TypeError};

use crate::forest::{ElementId, ElementRef};

/// A ternary filter verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterMatch {
    Matches,
    DoesntMatch,
    Undecided,
}

impl FilterMatch {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::Matches
        } else {
            Self::DoesntMatch
        }
    }

    /// Collapse to a boolean, resolving `Undecided` to `undecided`.
    pub fn to_bool(self, undecided: bool) -> bool {
        match self {
            Self::Matches => true,
            Self::DoesntMatch => false,
            Self::Undecided => undecided,
        }
    }

    pub fn and(self, other: Self) -> Self {
        match self {
            Self::Matches => other,
            Self::DoesntMatch => self,
            Self::Undecided if other == Self::DoesntMatch => other,
            Self::Undecided => self,
        }
    }

    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Matches => self,
            Self::DoesntMatch => other,
            Self::Undecided if other == Self::Matches => other,
            Self::Undecided => self,
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Self::Matches => Self::DoesntMatch,
            Self::DoesntMatch => Self::Matches,
            Self::Undecided => Self::Undecided,
        }
    }
}

/// The `inherited` flag of `a AND b`, taken from the side that decides the match.
fn and_inherited(a: FilterMatch, a_inherited: bool, b: FilterMatch, b_inherited: bool) -> bool {
    match (a, b) {
        (FilterMatch::Matches, FilterMatch::Matches) => a_inherited || b_inherited,
        (FilterMatch::Matches, _) => b_inherited,
        (FilterMatch::DoesntMatch, _) => a_inherited,
        (FilterMatch::Undecided, FilterMatch::DoesntMatch) => a_inherited,
        (FilterMatch::Undecided, _) => b_inherited,
    }
}

/// The `inherited` flag of `a OR b`.
fn or_inherited(a: FilterMatch, a_inherited: bool, b: FilterMatch, b_inherited: bool) -> bool {
    match (a, b) {
        (FilterMatch::Matches, FilterMatch::Matches) => a_inherited || b_inherited,
        (FilterMatch::Matches, _) => a_inherited,
        (FilterMatch::DoesntMatch, _) => b_inherited,
        (FilterMatch::Undecided, FilterMatch::Matches) => b_inherited,
        (FilterMatch::Undecided, _) => a_inherited,
    }
}

/// Result of [`TreeFilter::start`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FilterStartResult {
    pub matched: FilterMatch,
    /// Whether the children of the element should be discovered.
    pub descend: bool,
    /// Whether the verdict was inherited from the parent rather than decided
    /// for this element.
    pub inherited: bool,
}

impl FilterStartResult {
    pub fn new(matched: FilterMatch, descend: bool, inherited: bool) -> Self {
        Self {
            matched,
            descend,
            inherited,
        }
    }

    pub fn direct(matched: FilterMatch, descend: bool) -> Self {
        Self::new(matched, descend, false)
    }

    pub fn match_and_descend() -> Self {
        Self::direct(FilterMatch::Matches, true)
    }

    pub fn doesnt_match() -> Self {
        Self::direct(FilterMatch::DoesntMatch, false)
    }

    pub fn doesnt_match_and_descend() -> Self {
        Self::direct(FilterMatch::DoesntMatch, true)
    }

    pub fn undecided_and_descend() -> Self {
        Self::direct(FilterMatch::Undecided, true)
    }

    /// The same verdict, marked as inherited.
    pub fn inherit(parent: Self) -> Self {
        Self::new(parent.matched, parent.descend, true)
    }

    pub fn from_finish(result: FilterFinishResult, descend: bool) -> Self {
        Self::new(result.matched, descend, result.inherited)
    }

    pub fn and(self, other: Self) -> Self {
        Self::new(
            self.matched.and(other.matched),
            self.descend && other.descend,
            and_inherited(self.matched, self.inherited, other.matched, other.inherited),
        )
    }

    pub fn or(self, other: Self) -> Self {
        Self::new(
            self.matched.or(other.matched),
            self.descend || other.descend,
            or_inherited(self.matched, self.inherited, other.matched, other.inherited),
        )
    }

    pub fn negate_match(self) -> Self {
        Self::new(self.matched.negate(), self.descend, self.inherited)
    }

    pub fn with_match(self, matched: FilterMatch) -> Self {
        Self::new(matched, self.descend, self.inherited)
    }

    pub fn with_inherited(self, inherited: bool) -> Self {
        Self::new(self.matched, self.descend, inherited)
    }
}

/// Result of [`TreeFilter::finish`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FilterFinishResult {
    pub matched: FilterMatch,
    pub inherited: bool,
}

impl FilterFinishResult {
    pub fn new(matched: FilterMatch, inherited: bool) -> Self {
        Self { matched, inherited }
    }

    pub fn matches() -> Self {
        Self::new(FilterMatch::Matches, false)
    }

    pub fn doesnt_match() -> Self {
        Self::new(FilterMatch::DoesntMatch, false)
    }

    pub fn direct(matched: FilterMatch) -> Self {
        Self::new(matched, false)
    }

    pub fn from_start(result: FilterStartResult) -> Self {
        Self::new(result.matched, result.inherited)
    }

    pub fn and(self, other: Self) -> Self {
        Self::new(
            self.matched.and(other.matched),
            and_inherited(self.matched, self.inherited, other.matched, other.inherited),
        )
    }

    pub fn or(self, other: Self) -> Self {
        Self::new(
            self.matched.or(other.matched),
            or_inherited(self.matched, self.inherited, other.matched, other.inherited),
        )
    }

    pub fn negate_match(self) -> Self {
        Self::new(self.matched.negate(), self.inherited)
    }
}

/// Decides which discovered elements are kept in a forest.
pub trait TreeFilter<E>: Send {
    /// Called when `element` is discovered, before its children.
    fn start(&mut self, element: ElementRef<'_, E>) -> FilterStartResult;

    /// Called after all children of `element` were processed.
    fn finish(&mut self, element: ElementRef<'_, E>) -> FilterFinishResult;

    /// Final verdicts for elements whose result changed after the walk.
    fn finish_all(&mut self) -> Vec<(ElementId, FilterFinishResult)> {
        Vec::new()
    }
}

/// Keeps everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchAll;

impl<E> TreeFilter<E> for MatchAll {
    fn start(&mut self, _element: ElementRef<'_, E>) -> FilterStartResult {
        FilterStartResult::match_and_descend()
    }

    fn finish(&mut self, _element: ElementRef<'_, E>) -> FilterFinishResult {
        FilterFinishResult::matches()
    }
}

/// Combines filters so an element is kept only if every filter keeps it.
///
/// With no filters, everything is started but nothing finishes as a match.
pub struct UnionFilter<E> {
    filters: Vec<Box<dyn TreeFilter<E>>>,
}

impl<E> UnionFilter<E> {
    pub fn new(filters: Vec<Box<dyn TreeFilter<E>>>) -> Self {
        Self { filters }
    }
}

impl<E> TreeFilter<E> for UnionFilter<E> {
    fn start(&mut self, element: ElementRef<'_, E>) -> FilterStartResult {
        self.filters
            .iter_mut()
            .map(|f| f.start(element))
            .reduce(FilterStartResult::and)
            .unwrap_or_else(FilterStartResult::match_and_descend)
    }

    fn finish(&mut self, element: ElementRef<'_, E>) -> FilterFinishResult {
        self.filters
            .iter_mut()
            .map(|f| f.finish(element))
            .reduce(FilterFinishResult::and)
            .unwrap_or_else(FilterFinishResult::doesnt_match)
    }

    fn finish_all(&mut self) -> Vec<(ElementId, FilterFinishResult)> {
        let mut merged = BTreeMap::new();
        for filter in &mut self.filters {
            merged.extend(filter.finish_all());
        }
        merged.into_iter().collect()
    }
}

/// Matches elements whose `/`-joined path matches any of the globs.
///
/// Always descends, so nested elements get a verdict of their own.
#[derive(Clone, Debug)]
pub struct GlobPathFilter {
    patterns: Vec<String>,
}

impl GlobPathFilter {
    pub fn new(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    fn matches(&self, path: &str) -> FilterMatch {
        FilterMatch::from_bool(self.patterns.iter().any(|p| glob_match(p, path)))
    }
}

impl<E: Element> TreeFilter<E> for GlobPathFilter {
    fn start(&mut self, element: ElementRef<'_, E>) -> FilterStartResult {
        FilterStartResult::direct(self.matches(&element.path()), true)
    }

    fn finish(&mut self, element: ElementRef<'_, E>) -> FilterFinishResult {
        FilterFinishResult::direct(self.matches(&element.path()))
    }
}

/// Matches elements whose `/`-joined path fully matches any of the
/// regular expressions. Always descends.
#[derive(Clone, Debug)]
pub struct RegexPathFilter {
    patterns: Vec<Regex>,
}

impl RegexPathFilter {
    pub fn new<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<Self, TypeError> {
        Ok(Self {
            patterns: patterns.into_iter().map(full_match_regex).collect::<Result<_, _>>()?,
        })
    }

    fn matches(&self, path: &str) -> FilterMatch {
        FilterMatch::from_bool(self.patterns.iter().any(|p| p.is_match(path)))
    }
}

impl<E: Element> TreeFilter<E> for RegexPathFilter {
    fn start(&mut self, element: ElementRef<'_, E>) -> FilterStartResult {
        FilterStartResult::direct(self.matches(&element.path()), true)
    }

    fn finish(&mut self, element: ElementRef<'_, E>) -> FilterFinishResult {
        FilterFinishResult::direct(self.matches(&element.path()))
    }
}

#[derive(Clone, Copy, Debug)]
struct Progress {
    include: Option<FilterStartResult>,
    exclude: Option<FilterStartResult>,
    parent: Option<ElementId>,
}

/// Composes an include filter and an exclude filter.
///
/// Without an include filter everything not excluded is kept. A parent's
/// inclusion is inherited by its children unless they are excluded
/// explicitly, and an explicit include can pull a child of an excluded
/// parent back in.
pub struct IncludeExcludeFilter<E> {
    include: Option<Box<dyn TreeFilter<E>>>,
    exclude: Option<Box<dyn TreeFilter<E>>>,
    progress: BTreeMap<ElementId, Progress>,
}

impl<E> IncludeExcludeFilter<E> {
    pub fn new(
        include: Option<Box<dyn TreeFilter<E>>>,
        exclude: Option<Box<dyn TreeFilter<E>>>,
    ) -> Self {
        Self {
            include,
            exclude,
            progress: BTreeMap::new(),
        }
    }

    fn compute(&self, id: ElementId) -> FilterStartResult {
        let Some(progress) = self.progress.get(&id) else {
            return Self::default_result();
        };
        let parent = progress
            .parent
            .filter(|p| self.progress.contains_key(p))
            .map(|p| self.compute(p));

        match (parent, progress.include, progress.exclude) {
            (None, None, None) => Self::default_result(),
            // exclude is never authoritative
            (None, None, Some(exclude)) => exclude.negate_match().with_inherited(true),
            (None, Some(include), None) => include,
            (None, Some(include), Some(exclude)) => include.and(exclude.negate_match()),
            (Some(parent), None, None) => FilterStartResult::inherit(parent),
            (Some(parent), None, Some(exclude)) => {
                FilterStartResult::inherit(parent).and(exclude.negate_match())
            }
            (Some(parent), Some(include), None) => FilterStartResult::inherit(parent).or(include),
            (Some(parent), Some(include), Some(exclude)) => {
                if parent.matched.to_bool(true) {
                    FilterStartResult::inherit(parent).and(exclude.negate_match())
                } else {
                    include.and(exclude.negate_match())
                }
            }
        }
    }

    fn default_result() -> FilterStartResult {
        FilterStartResult::new(FilterMatch::Matches, true, true)
    }
}

impl<E> TreeFilter<E> for IncludeExcludeFilter<E> {
    fn start(&mut self, element: ElementRef<'_, E>) -> FilterStartResult {
        let include = self.include.as_mut().map(|f| f.start(element));
        let exclude = self.exclude.as_mut().map(|f| f.start(element));
        self.progress.insert(
            element.id(),
            Progress {
                include,
                exclude,
                parent: element.parent_id(),
            },
        );
        self.compute(element.id())
    }

    fn finish(&mut self, element: ElementRef<'_, E>) -> FilterFinishResult {
        let include = self.include.as_mut().map(|f| f.finish(element));
        let exclude = self.exclude.as_mut().map(|f| f.finish(element));

        if let Some(progress) = self.progress.get_mut(&element.id()) {
            if let Some(include) = include {
                progress.include = Some(match progress.include {
                    Some(started) => started.with_match(include.matched),
                    None => FilterStartResult::from_finish(include, true),
                });
            }
            if let Some(exclude) = exclude {
                progress.exclude = Some(match progress.exclude {
                    Some(started) => started.with_match(exclude.matched),
                    None => FilterStartResult::from_finish(exclude, true),
                });
            }
        }

        FilterFinishResult::from_start(self.compute(element.id()))
    }

    fn finish_all(&mut self) -> Vec<(ElementId, FilterFinishResult)> {
        let includes: BTreeMap<_, _> = self
            .include
            .as_mut()
            .map(|f| f.finish_all())
            .unwrap_or_default()
            .into_iter()
            .collect();
        let excludes: BTreeMap<_, _> = self
            .exclude
            .as_mut()
            .map(|f| f.finish_all())
            .unwrap_or_default()
            .into_iter()
            .collect();

        for (id, progress) in self.progress.iter_mut() {
            if let Some(include) = includes.get(id) {
                progress.include = Some(FilterStartResult::from_finish(*include, true));
            }
            if let Some(exclude) = excludes.get(id) {
                progress.exclude = Some(FilterStartResult::from_finish(*exclude, true));
            }
        }

        let results = self
            .progress
            .keys()
            .map(|id| (*id, FilterFinishResult::from_start(self.compute(*id))))
            .collect();
        self.progress.clear();
        results
    }
}
