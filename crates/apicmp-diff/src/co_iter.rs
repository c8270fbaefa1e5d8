//! Merge-join of two sorted sequences.
//!
//! [`CoIter`] walks two strictly increasing inputs in lock-step and yields
//! each item exactly once, paired with its equal on the other side when
//! there is one. Inputs are checked as they are consumed: the first item
//! that is not greater than its predecessor on the same side ends the
//! iteration with [`DiffError::UnsortedInput`].

use std::cmp::Ordering;

use crate::error::{DiffError, Side};

/// One step of a co-iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pair<T> {
    /// Only the left input has this item.
    Left(T),
    /// Only the right input has this item.
    Right(T),
    /// Both inputs have an equal item.
    Both(T, T),
}

impl<T> Pair<T> {
    pub fn left(&self) -> Option<&T> {
        match self {
            Self::Left(l) | Self::Both(l, _) => Some(l),
            Self::Right(_) => None,
        }
    }

    pub fn right(&self) -> Option<&T> {
        match self {
            Self::Right(r) | Self::Both(_, r) => Some(r),
            Self::Left(_) => None,
        }
    }

    pub fn into_options(self) -> (Option<T>, Option<T>) {
        match self {
            Self::Left(l) => (Some(l), None),
            Self::Right(r) => (None, Some(r)),
            Self::Both(l, r) => (Some(l), Some(r)),
        }
    }
}

/// Comparator type used by [`CoIter::new`].
pub type OrdComparator<T> = fn(&T, &T) -> Ordering;

/// Iterator over [`Pair`]s of two sorted inputs.
pub struct CoIter<T, L, R, F> {
    left: L,
    right: R,
    left_head: Option<T>,
    right_head: Option<T>,
    left_position: usize,
    right_position: usize,
    cmp: F,
    started: bool,
    failed: bool,
}

impl<T, L, R> CoIter<T, L, R, OrdComparator<T>>
where
    T: Ord,
    L: Iterator<Item = T>,
    R: Iterator<Item = T>,
{
    /// Co-iterate two inputs sorted by their natural order.
    pub fn new<IL, IR>(left: IL, right: IR) -> Self
    where
        IL: IntoIterator<Item = T, IntoIter = L>,
        IR: IntoIterator<Item = T, IntoIter = R>,
    {
        Self::with_comparator(left, right, T::cmp)
    }
}

impl<T, L, R, F> CoIter<T, L, R, F>
where
    L: Iterator<Item = T>,
    R: Iterator<Item = T>,
    F: FnMut(&T, &T) -> Ordering,
{
    /// Co-iterate two inputs sorted by `cmp`.
    pub fn with_comparator<IL, IR>(left: IL, right: IR, cmp: F) -> Self
    where
        IL: IntoIterator<Item = T, IntoIter = L>,
        IR: IntoIterator<Item = T, IntoIter = R>,
    {
        Self {
            left: left.into_iter(),
            right: right.into_iter(),
            left_head: None,
            right_head: None,
            left_position: 0,
            right_position: 0,
            cmp,
            started: false,
            failed: false,
        }
    }

    /// Replace the consumed heads and check the new ones against them.
    fn refill(&mut self, pair: &Pair<T>) -> Result<(), DiffError> {
        if let Some(consumed) = pair.left() {
            self.left_head = self.left.next();
            self.left_position += 1;
            if let Some(next) = &self.left_head {
                if (self.cmp)(consumed, next) != Ordering::Less {
                    return Err(DiffError::UnsortedInput {
                        side: Side::Left,
                        position: self.left_position,
                    });
                }
            }
        }
        if let Some(consumed) = pair.right() {
            self.right_head = self.right.next();
            self.right_position += 1;
            if let Some(next) = &self.right_head {
                if (self.cmp)(consumed, next) != Ordering::Less {
                    return Err(DiffError::UnsortedInput {
                        side: Side::Right,
                        position: self.right_position,
                    });
                }
            }
        }
        Ok(())
    }
}

impl<T, L, R, F> Iterator for CoIter<T, L, R, F>
where
    L: Iterator<Item = T>,
    R: Iterator<Item = T>,
    F: FnMut(&T, &T) -> Ordering,
{
    type Item = Result<Pair<T>, DiffError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if !self.started {
            self.started = true;
            self.left_head = self.left.next();
            self.right_head = self.right.next();
        }

        let pair = match (self.left_head.take(), self.right_head.take()) {
            (None, None) => return None,
            (Some(l), None) => Pair::Left(l),
            (None, Some(r)) => Pair::Right(r),
            (Some(l), Some(r)) => match (self.cmp)(&l, &r) {
                Ordering::Less => {
                    self.right_head = Some(r);
                    Pair::Left(l)
                }
                Ordering::Greater => {
                    self.left_head = Some(l);
                    Pair::Right(r)
                }
                Ordering::Equal => Pair::Both(l, r),
            },
        };

        match self.refill(&pair) {
            Ok(()) => Some(Ok(pair)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
