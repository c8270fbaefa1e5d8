//! Paired depth-first traversal of an old and a new forest.
//!
//! [`walk`] co-iterates the roots of both forests, then the children of every
//! matched pair, and lets a [`DifferenceAnalyzer`] compare each pairing. For
//! every pairing the analyzer sees `begin`, then the pairings of the
//! children (if it asked to descend), then `end`, which may produce a
//! [`Report`]. Non-empty reports are handed to a [`PairingSink`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use apicmp_forest::{ElementRef, Forest};
use apicmp_types::{Element, Report};

use crate::co_iter::CoIter;
use crate::error::{DiffError, DiffResult};

/// Compares paired elements of an old and a new forest.
///
/// For every analyzer the engine guarantees the call sequence
/// `open, (begin, [children], end)*, close`, with begin and end calls
/// balanced and properly nested.
pub trait DifferenceAnalyzer<E>: Send {
    /// Called once before the first pairing.
    fn open(&mut self) -> DiffResult<()> {
        Ok(())
    }

    /// Start comparing a pairing. At least one side is present.
    fn begin(&mut self, old: Option<ElementRef<'_, E>>, new: Option<ElementRef<'_, E>>)
        -> DiffResult<()>;

    /// Whether the children of a matched pair should be compared.
    fn is_descend_required(&self, _old: ElementRef<'_, E>, _new: ElementRef<'_, E>) -> bool {
        true
    }

    /// Finish a pairing, after all of its children.
    fn end(
        &mut self,
        old: Option<ElementRef<'_, E>>,
        new: Option<ElementRef<'_, E>>,
    ) -> DiffResult<Option<Report>>;

    /// Called once after the last pairing.
    fn close(&mut self) -> DiffResult<()> {
        Ok(())
    }
}

/// Receives pairing notifications and the reports produced for them.
pub trait PairingSink<E> {
    type Error: From<DiffError>;

    /// A pairing is about to be analyzed.
    fn begin(
        &mut self,
        _old: Option<ElementRef<'_, E>>,
        _new: Option<ElementRef<'_, E>>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// A non-empty report for the current pairing.
    fn accept(&mut self, report: Report) -> Result<(), Self::Error>;

    /// The pairing and all its children are done.
    fn end(
        &mut self,
        _old: Option<ElementRef<'_, E>>,
        _new: Option<ElementRef<'_, E>>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Counters collected by one [`walk`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkStats {
    /// Pairings visited, including one-sided ones.
    pub pairs: usize,
    /// Pairings where both sides were present.
    pub matched: usize,
    /// Non-empty reports handed to the sink.
    pub reports: usize,
    /// Differences in those reports, before any transform ran.
    pub differences: usize,
}

/// Walk two forests in lock-step.
///
/// The analyzer is opened before and closed after the walk. If the walk
/// fails the analyzer is still closed and the walk error is returned.
pub fn walk<'f, E, A, S>(
    old: &'f Forest<E>,
    new: &'f Forest<E>,
    analyzer: &mut A,
    sink: &mut S,
) -> Result<WalkStats, S::Error>
where
    E: Element,
    A: DifferenceAnalyzer<E> + ?Sized,
    S: PairingSink<E> + ?Sized,
{
    analyzer.open()?;

    let mut walker = Walker {
        stats: WalkStats::default(),
        depth: 0,
    };
    let result = walker.level(
        old.root_refs().collect(),
        new.root_refs().collect(),
        analyzer,
        sink,
    );
    debug_assert!(result.is_err() || walker.depth == 0, "unbalanced begin/end");

    let closed = analyzer.close();
    match (result, closed) {
        (Err(e), Err(close_error)) => {
            warn!(error = %close_error, "difference analyzer failed to close after an error");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), Err(close_error)) => Err(close_error.into()),
        (Ok(()), Ok(())) => {
            debug!(
                pairs = walker.stats.pairs,
                reports = walker.stats.reports,
                "walk finished"
            );
            Ok(walker.stats)
        }
    }
}

struct Walker {
    stats: WalkStats,
    depth: usize,
}

impl Walker {
    fn level<'f, E, A, S>(
        &mut self,
        old: Vec<ElementRef<'f, E>>,
        new: Vec<ElementRef<'f, E>>,
        analyzer: &mut A,
        sink: &mut S,
    ) -> Result<(), S::Error>
    where
        E: Element,
        A: DifferenceAnalyzer<E> + ?Sized,
        S: PairingSink<E> + ?Sized,
    {
        let pairs = CoIter::with_comparator(old, new, |a: &ElementRef<'f, E>, b: &ElementRef<'f, E>| {
            a.element().cmp(b.element())
        });

        for pair in pairs {
            let (a, b) = pair?.into_options();
            self.stats.pairs += 1;

            sink.begin(a, b)?;
            analyzer.begin(a, b)?;
            self.depth += 1;

            if let (Some(a), Some(b)) = (a, b) {
                self.stats.matched += 1;
                if analyzer.is_descend_required(a, b) {
                    self.level(a.children().collect(), b.children().collect(), analyzer, sink)?;
                }
            }

            let report = analyzer.end(a, b)?;
            self.depth -= 1;

            if let Some(report) = report.filter(|r| !r.is_empty()) {
                debug!(pairing = %report, "pairing produced differences");
                self.stats.reports += 1;
                self.stats.differences += report.differences().len();
                sink.accept(report)?;
            }

            sink.end(a, b)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicmp_types::{Difference, ElementInfo};

    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    struct Node(&'static str);

    impl Element for Node {
        fn kind(&self) -> &str {
            "node"
        }

        fn name(&self) -> String {
            self.0.to_string()
        }
    }

    /// Records every call and reports one-sided pairings.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        descend: bool,
        open_pairings: usize,
        max_open: usize,
    }

    fn label(e: Option<ElementRef<'_, Node>>) -> String {
        e.map_or_else(|| "-".to_string(), |e| e.path())
    }

    impl DifferenceAnalyzer<Node> for Recorder {
        fn open(&mut self) -> DiffResult<()> {
            self.calls.push("open".into());
            Ok(())
        }

        fn begin(
            &mut self,
            old: Option<ElementRef<'_, Node>>,
            new: Option<ElementRef<'_, Node>>,
        ) -> DiffResult<()> {
            self.open_pairings += 1;
            self.max_open = self.max_open.max(self.open_pairings);
            self.calls.push(format!("begin {} {}", label(old), label(new)));
            Ok(())
        }

        fn is_descend_required(&self, _old: ElementRef<'_, Node>, _new: ElementRef<'_, Node>) -> bool {
            self.descend
        }

        fn end(
            &mut self,
            old: Option<ElementRef<'_, Node>>,
            new: Option<ElementRef<'_, Node>>,
        ) -> DiffResult<Option<Report>> {
            self.open_pairings -= 1;
            self.calls.push(format!("end {} {}", label(old), label(new)));
            let code = match (old, new) {
                (Some(_), None) => "removed",
                (None, Some(_)) => "added",
                _ => return Ok(None),
            };
            let diff = Difference::builder(code).build()?;
            Ok(Some(Report::new(
                old.map(|e| e.info()),
                new.map(|e| e.info()),
                vec![diff],
            )?))
        }

        fn close(&mut self) -> DiffResult<()> {
            self.calls.push("close".into());
            Ok(())
        }
    }

    #[derive(Default)]
    struct Collect {
        reports: Vec<Report>,
        begun: usize,
        ended: usize,
    }

    impl PairingSink<Node> for Collect {
        type Error = DiffError;

        fn begin(
            &mut self,
            _old: Option<ElementRef<'_, Node>>,
            _new: Option<ElementRef<'_, Node>>,
        ) -> DiffResult<()> {
            self.begun += 1;
            Ok(())
        }

        fn accept(&mut self, report: Report) -> DiffResult<()> {
            self.reports.push(report);
            Ok(())
        }

        fn end(
            &mut self,
            _old: Option<ElementRef<'_, Node>>,
            _new: Option<ElementRef<'_, Node>>,
        ) -> DiffResult<()> {
            self.ended += 1;
            Ok(())
        }
    }

    fn forest(spec: &[(&'static str, &[&'static str])]) -> Forest<Node> {
        let mut forest = Forest::new();
        for &(root, children) in spec {
            let id = forest.insert_root(Node(root)).unwrap();
            for &child in children {
                let _ = forest.insert_child(id, Node(child)).unwrap();
            }
        }
        forest
    }

    #[test]
    fn pre_order_with_balanced_calls() {
        let old = forest(&[("a", &["x"]), ("b", &[])]);
        let new = forest(&[("a", &["x", "y"]), ("c", &[])]);
        let mut analyzer = Recorder {
            descend: true,
            ..Recorder::default()
        };
        let mut sink = Collect::default();

        let stats = walk(&old, &new, &mut analyzer, &mut sink).unwrap();

        assert_eq!(
            analyzer.calls,
            vec![
                "open",
                "begin a a",
                "begin a/x a/x",
                "end a/x a/x",
                "begin - a/y",
                "end - a/y",
                "end a a",
                "begin b -",
                "end b -",
                "begin - c",
                "end - c",
                "close",
            ]
        );
        assert_eq!(analyzer.open_pairings, 0);
        assert_eq!(analyzer.max_open, 2);
        assert_eq!(stats.pairs, 5);
        assert_eq!(stats.matched, 2);
        assert_eq!(stats.reports, 3);
        assert_eq!(sink.begun, sink.ended);
        assert_eq!(sink.reports.len(), 3);
        assert_eq!(
            sink.reports[0].new_element(),
            Some(&ElementInfo::new("node", "y", "a/y"))
        );
    }

    #[test]
    fn children_are_skipped_when_descend_not_required() {
        let old = forest(&[("a", &["x"])]);
        let new = forest(&[("a", &["y"])]);
        let mut analyzer = Recorder::default();
        let mut sink = Collect::default();

        let stats = walk(&old, &new, &mut analyzer, &mut sink).unwrap();
        assert_eq!(stats.pairs, 1);
        assert!(sink.reports.is_empty());
    }

    #[test]
    fn identical_forests_pair_everything() {
        let old = forest(&[("a", &["x", "y"]), ("b", &["z"])]);
        let new = old.clone();
        let mut analyzer = Recorder {
            descend: true,
            ..Recorder::default()
        };
        let mut sink = Collect::default();

        let stats = walk(&old, &new, &mut analyzer, &mut sink).unwrap();
        assert_eq!(stats.pairs, 5);
        assert_eq!(stats.matched, 5);
        assert!(sink.reports.is_empty());
    }

    struct Failing;

    impl DifferenceAnalyzer<Node> for Failing {
        fn begin(
            &mut self,
            _old: Option<ElementRef<'_, Node>>,
            _new: Option<ElementRef<'_, Node>>,
        ) -> DiffResult<()> {
            Err(DiffError::Analyzer("boom".into()))
        }

        fn end(
            &mut self,
            _old: Option<ElementRef<'_, Node>>,
            _new: Option<ElementRef<'_, Node>>,
        ) -> DiffResult<Option<Report>> {
            Ok(None)
        }
    }

    #[test]
    fn analyzer_errors_abort_the_walk() {
        let old = forest(&[("a", &[])]);
        let new = forest(&[("a", &[])]);
        let err = walk(&old, &new, &mut Failing, &mut Collect::default()).unwrap_err();
        assert_eq!(err, DiffError::Analyzer("boom".into()));
    }
}
