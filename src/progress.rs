//! Progress reporting and cancellation plumbing.
//!
//! Every batch operation accepts an optional callback taking the current
//! progress fraction in `[0.0, 1.0]` and returning `true` to request
//! cancellation. Internally the boolean is lifted into [`Flow`] so that
//! "keep going" and "stop" read as what they are, and nested operations
//! compose their sub-ranges through [`Scaled`] without touching enclosing
//! mutable state.
//!
//! Scaling is per-item, not per-byte: a directory with one huge file and one
//! tiny file gives each a 50% share. That weighting is deliberate, so
//! reported progress is not linear in wall-clock time when file sizes vary
//! widely.

/// Outcome of a single progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep processing.
    Continue,
    /// The callback asked the enclosing operation to stop.
    Cancel,
}

impl Flow {
    pub fn is_cancel(self) -> bool {
        matches!(self, Flow::Cancel)
    }
}

/// Receiver for progress fractions.
///
/// Implemented by the boolean-callback adapter at the public boundary and by
/// [`Scaled`] for nested sub-operations, so a sink three directory levels
/// deep still reports proportionally against the whole operation.
pub trait ProgressSink {
    /// Report a fraction in `[0.0, 1.0]` of the current unit of work.
    ///
    /// `1.0` is reported at most once per unit. Values are non-decreasing
    /// within a unit, though nested scaling may produce tiny floating-point
    /// regressions that consumers must tolerate.
    fn report(&mut self, fraction: f64) -> Flow;
}

/// Remaps a child operation's `[0, 1]` progress into the `[lo, hi)`
/// sub-range of a parent sink.
///
/// A `Scaled` is itself a `ProgressSink`, so recursion just stacks one of
/// these per directory level: each sibling gets an equal share of the
/// parent's range regardless of its size.
pub struct Scaled<'p> {
    parent: &'p mut dyn ProgressSink,
    lo: f64,
    span: f64,
}

impl<'p> Scaled<'p> {
    pub fn new(parent: &'p mut dyn ProgressSink, lo: f64, hi: f64) -> Self {
        Self { parent, lo, span: hi - lo }
    }
}

impl ProgressSink for Scaled<'_> {
    fn report(&mut self, fraction: f64) -> Flow {
        self.parent.report(self.lo + fraction * self.span)
    }
}

/// Adapts the public `FnMut(f64) -> bool` callback (`true` = cancel) into a
/// [`ProgressSink`].
pub(crate) struct BoolSink<'a> {
    callback: &'a mut dyn FnMut(f64) -> bool,
}

impl<'a> BoolSink<'a> {
    pub(crate) fn new(callback: &'a mut dyn FnMut(f64) -> bool) -> Self {
        Self { callback }
    }
}

impl ProgressSink for BoolSink<'_> {
    fn report(&mut self, fraction: f64) -> Flow {
        if (self.callback)(fraction) {
            Flow::Cancel
        } else {
            Flow::Continue
        }
    }
}

/// Reports `fraction` if a sink is present; absent sinks never cancel.
pub(crate) fn report(sink: &mut Option<&mut dyn ProgressSink>, fraction: f64) -> Flow {
    match sink {
        Some(s) => s.report(fraction),
        None => Flow::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Vec<f64>);

    impl ProgressSink for Recorder {
        fn report(&mut self, fraction: f64) -> Flow {
            self.0.push(fraction);
            Flow::Continue
        }
    }

    #[test]
    fn scaled_remaps_into_subrange() {
        let mut rec = Recorder(Vec::new());
        {
            let mut half = Scaled::new(&mut rec, 0.5, 1.0);
            half.report(0.0);
            half.report(0.5);
            half.report(1.0);
        }
        assert_eq!(rec.0, vec![0.5, 0.75, 1.0]);
    }

    #[test]
    fn scaled_composes_recursively() {
        // Two nested levels: outer child owns [0.5, 1.0], inner child owns
        // the second half of that, i.e. [0.75, 1.0] of the whole.
        let mut rec = Recorder(Vec::new());
        {
            let mut outer = Scaled::new(&mut rec, 0.5, 1.0);
            let mut inner = Scaled::new(&mut outer, 0.5, 1.0);
            inner.report(0.0);
            inner.report(1.0);
        }
        assert_eq!(rec.0, vec![0.75, 1.0]);
    }

    #[test]
    fn bool_sink_maps_true_to_cancel() {
        let mut cancel_after = 1;
        let mut cb = |_f: f64| {
            if cancel_after == 0 {
                true
            } else {
                cancel_after -= 1;
                false
            }
        };
        let mut sink = BoolSink::new(&mut cb);
        assert_eq!(sink.report(0.3), Flow::Continue);
        assert_eq!(sink.report(0.6), Flow::Cancel);
    }

    #[test]
    fn absent_sink_never_cancels() {
        let mut none: Option<&mut dyn ProgressSink> = None;
        assert_eq!(report(&mut none, 1.0), Flow::Continue);
    }
}
