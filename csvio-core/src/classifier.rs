use crate::dialect::Dialect;

/// The small alphabet of roles a character can play under a fixed dialect.
///
/// CR and LF are always classified as themselves, independent of the
/// configured `RowEnding` — it's the state machine, not the classifier,
/// that decides whether a given role is legal in a given state. That's what
/// lets a strict `RowEnding::Lf` dialect *reject* a stray CR instead of
/// silently treating it as ordinary content.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Separator,
    EscapeStart,
    /// Only produced for a character distinct from `EscapeStart` (the usual
    /// doubled-quote scheme reuses `EscapeStart` for both roles, so this
    /// role is only reachable with an explicit, different escape char).
    EscapeChar,
    CommentStart,
    Cr,
    Lf,
    Whitespace,
    Other,
}

const ASCII_LEN: usize = 128;

/// A pure function `char -> Role`, built once per `Dialect`.
///
/// The common case (ASCII) is a flat 128-entry lookup table, matching the
/// "flat table keyed by the low byte" the design calls for; code points
/// beyond ASCII fall through to a short equality chain, since dialect
/// characters are almost always ASCII punctuation and whitespace is the
/// only role likely to be hit by a non-ASCII code point (e.g. U+00A0).
#[derive(Clone, Debug)]
pub struct Classifier {
    ascii: [Role; ASCII_LEN],
    dialect: Dialect,
}

impl Classifier {
    pub fn new(dialect: Dialect) -> Classifier {
        let mut ascii = [Role::Other; ASCII_LEN];
        for (byte, role) in ascii.iter_mut().enumerate() {
            *role = classify_slow(dialect, byte as u8 as char);
        }
        Classifier { ascii, dialect }
    }

    #[inline]
    pub fn classify(&self, c: char) -> Role {
        if (c as u32) < ASCII_LEN as u32 {
            self.ascii[c as usize]
        } else {
            classify_slow(self.dialect, c)
        }
    }
}

fn classify_slow(dialect: Dialect, c: char) -> Role {
    if c == '\r' {
        Role::Cr
    } else if c == '\n' {
        Role::Lf
    } else if c == dialect.value_separator {
        Role::Separator
    } else if Some(c) == dialect.escaped_value_start_and_end {
        Role::EscapeStart
    } else if dialect.escaped_value_escape_character.is_some()
        && Some(c) == dialect.escaped_value_escape_character
    {
        Role::EscapeChar
    } else if Some(c) == dialect.comment_character {
        Role::CommentStart
    } else if c.is_whitespace() {
        Role::Whitespace
    } else {
        Role::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::RowEnding;

    fn dialect() -> Dialect {
        Dialect {
            comment_character: Some('#'),
            row_ending: RowEnding::CrLf,
            ..Dialect::default()
        }
    }

    #[test]
    fn classifies_ascii_roles() {
        let c = Classifier::new(dialect());
        assert_eq!(c.classify(','), Role::Separator);
        assert_eq!(c.classify('"'), Role::EscapeStart);
        assert_eq!(c.classify('#'), Role::CommentStart);
        assert_eq!(c.classify('\r'), Role::Cr);
        assert_eq!(c.classify('\n'), Role::Lf);
        assert_eq!(c.classify(' '), Role::Whitespace);
        assert_eq!(c.classify('a'), Role::Other);
    }

    #[test]
    fn cr_lf_always_distinct_regardless_of_row_ending() {
        let mut d = dialect();
        d.row_ending = RowEnding::Lf;
        let c = Classifier::new(d);
        assert_eq!(c.classify('\r'), Role::Cr);
        assert_eq!(c.classify('\n'), Role::Lf);
    }

    #[test]
    fn non_ascii_whitespace_falls_through() {
        let c = Classifier::new(dialect());
        assert_eq!(c.classify('\u{00A0}'), Role::Whitespace);
        assert_eq!(c.classify('é'), Role::Other);
    }
}
