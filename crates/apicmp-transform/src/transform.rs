use apicmp_types::{CodePattern, Difference, ElementInfo};

use crate::error::TransformResult;

/// What a transform decided for one difference.
#[derive(Clone, Debug, PartialEq)]
pub enum TransformOutcome {
    /// Leave the difference as it is.
    Keep,
    /// Put this difference in its place.
    Replace(Difference),
    /// Drop the difference from the report.
    Discard,
}

/// A plugin that rewrites or suppresses differences.
///
/// The pipeline only offers a transform the differences whose code matches
/// one of its [`code_patterns`](Self::code_patterns). Transforms must be
/// stable: applied to their own output they should eventually return
/// [`TransformOutcome::Keep`], otherwise the pipeline gives up on the
/// pairing after the configured number of rounds.
pub trait DifferenceTransform: Send {
    /// Extension id, used in logs and errors.
    fn id(&self) -> &str;

    /// Codes of the differences this transform wants to see.
    fn code_patterns(&self) -> &[CodePattern];

    /// A pairing is about to be analyzed.
    fn start_traversal(&mut self, _old: Option<&ElementInfo>, _new: Option<&ElementInfo>) -> TransformResult<()> {
        Ok(())
    }

    /// Decide what happens to `difference`, found between `old` and `new`.
    fn transform(
        &mut self,
        old: Option<&ElementInfo>,
        new: Option<&ElementInfo>,
        difference: &Difference,
    ) -> TransformResult<TransformOutcome>;

    /// The pairing and all of its children have been analyzed.
    fn end_traversal(&mut self, _old: Option<&ElementInfo>, _new: Option<&ElementInfo>) -> TransformResult<()> {
        Ok(())
    }

    /// Whether any of the code patterns matches `code`.
    fn is_interested_in(&self, code: &str) -> bool {
        self.code_patterns().iter().any(|p| p.matches(code))
    }
}
