//! Option flags that change how a pattern is compiled and matched

/// Options for compiling a regex
///
/// Each flag is independent. The flag letters accepted by
/// [`RegexOptions::from_flags`] and by inline `(?imnsx-imnsx)` groups are:
///
/// - `i`: case insensitive matching
/// - `m`: multiline, `^` and `$` match at line boundaries
/// - `s`: singleline, `.` matches `\n`
/// - `n`: explicit capture, unnamed groups do not capture
/// - `x`: ignore unescaped whitespace and `#` comments in the pattern
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegexOptions {
    /// Case insensitive matching (i)
    pub case_insensitive: bool,
    /// `^` and `$` match at line boundaries (m)
    pub multiline: bool,
    /// `.` matches `\n` (s)
    pub singleline: bool,
    /// Only named groups capture (n)
    pub explicit_capture: bool,
    /// Whitespace and `#` comments in the pattern are ignored (x)
    pub ignore_pattern_whitespace: bool,
    /// Performance hint. Accepted for compatibility; matching is unaffected.
    pub compiled: bool,
}

impl RegexOptions {
    /// No options set
    pub const NONE: RegexOptions = RegexOptions {
        case_insensitive: false,
        multiline: false,
        singleline: false,
        explicit_capture: false,
        ignore_pattern_whitespace: false,
        compiled: false,
    };

    /// Parse option letters like "imsx". Unknown letters are ignored.
    pub fn from_flags(flags: &str) -> Self {
        let mut options = RegexOptions::default();
        for c in flags.chars() {
            options.set_flag(c, true);
        }
        options
    }

    /// Set or clear the option named by `flag`
    ///
    /// Returns `false` when `flag` is not an option letter.
    pub fn set_flag(&mut self, flag: char, value: bool) -> bool {
        match flag.to_ascii_lowercase() {
            'i' => self.case_insensitive = value,
            'm' => self.multiline = value,
            's' => self.singleline = value,
            'n' => self.explicit_capture = value,
            'x' => self.ignore_pattern_whitespace = value,
            _ => return false,
        }
        true
    }

    /// Render the set flags as letters, in `imnsx` order
    pub fn to_flags(&self) -> String {
        let mut flags = String::new();
        for (set, c) in [
            (self.case_insensitive, 'i'),
            (self.multiline, 'm'),
            (self.explicit_capture, 'n'),
            (self.singleline, 's'),
            (self.ignore_pattern_whitespace, 'x'),
        ] {
            if set {
                flags.push(c);
            }
        }
        flags
    }
}
