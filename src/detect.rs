use std::fmt;

use csvio_core::RowEnding as CoreRowEnding;

/// The line ending a dialect uses, mirroring [`csvio_core::RowEnding`] at
/// the public API boundary so this crate can evolve its own documentation
/// and `Display` behavior independently of the core crate's internal type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RowEnding {
    Cr,
    Lf,
    CrLf,
    /// Adopt whichever of `Cr`, `Lf`, or `CrLf` the first record uses, then
    /// require every later record to agree.
    Detect,
}

impl Default for RowEnding {
    fn default() -> RowEnding {
        RowEnding::CrLf
    }
}

impl fmt::Display for RowEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RowEnding::Cr => "CR",
            RowEnding::Lf => "LF",
            RowEnding::CrLf => "CRLF",
            RowEnding::Detect => "detect",
        };
        f.write_str(s)
    }
}

impl From<RowEnding> for CoreRowEnding {
    fn from(r: RowEnding) -> CoreRowEnding {
        match r {
            RowEnding::Cr => CoreRowEnding::Cr,
            RowEnding::Lf => CoreRowEnding::Lf,
            RowEnding::CrLf => CoreRowEnding::CrLf,
            RowEnding::Detect => CoreRowEnding::Detect,
        }
    }
}

impl From<CoreRowEnding> for RowEnding {
    fn from(r: CoreRowEnding) -> RowEnding {
        match r {
            CoreRowEnding::Cr => RowEnding::Cr,
            CoreRowEnding::Lf => RowEnding::Lf,
            CoreRowEnding::CrLf => RowEnding::CrLf,
            CoreRowEnding::Detect => RowEnding::Detect,
        }
    }
}

/// Reports which concrete row ending a `RowEnding::Detect` dialect settled
/// on, once the scanner has seen its first terminator. The scanner itself
/// (`csvio_core::Scanner`) performs the actual detection character by
/// character, as required so that a stray disagreement can still be caught
/// mid-stream; this type exists purely to surface that result through the
/// public `Reader`/`AsyncReader` API.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Detected(pub(crate) Option<RowEnding>);

impl Detected {
    pub(crate) fn pending() -> Detected {
        Detected(None)
    }

    pub(crate) fn observe(&mut self, resolved: CoreRowEnding) {
        if resolved != CoreRowEnding::Detect {
            self.0 = Some(resolved.into());
        }
    }

    /// The row ending locked in so far, or `None` if detection is configured
    /// but no terminator has been observed yet (e.g. an empty input).
    pub fn resolved(&self) -> Option<RowEnding> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detected_starts_pending() {
        assert_eq!(Detected::pending().resolved(), None);
    }

    #[test]
    fn detected_observes_concrete_ending() {
        let mut d = Detected::pending();
        d.observe(CoreRowEnding::Lf);
        assert_eq!(d.resolved(), Some(RowEnding::Lf));
    }

    #[test]
    fn detected_ignores_still_unresolved() {
        let mut d = Detected::pending();
        d.observe(CoreRowEnding::Detect);
        assert_eq!(d.resolved(), None);
    }
}
