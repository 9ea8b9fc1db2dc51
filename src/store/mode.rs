//! Open-mode capability set
//!
//! A store is opened with a fixed set of capabilities that every later
//! operation is checked against:
//! - read: entries may be read back
//! - write: the store is truncated and rewritten from entry 0
//! - append: new entries extend the existing store
//! - create_exclusive: the store directory must not exist yet
//! - text: line-oriented helpers and text decoding are allowed
//!
//! The compact flag-string form (`"r"`, `"w+"`, `"ab"`, `"x"`) is kept
//! for the CLI and for callers porting over directories written by
//! other tooling. It is parsed and validated exactly once, at open;
//! nothing scans mode strings at operation time.

use std::fmt;
use std::str::FromStr;

use super::errors::StoreError;

/// Capabilities a store handle is opened with.
///
/// Constructed via the named constructors, refined with the
/// combinators, or parsed from a compact flag string:
///
/// ```
/// use recstore::store::Mode;
///
/// let m = Mode::write().and_read();
/// assert_eq!(m, "w+".parse().unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    read: bool,
    write: bool,
    append: bool,
    create_exclusive: bool,
    text: bool,
}

impl Mode {
    /// Read existing entries only. Text helpers enabled.
    pub fn read_only() -> Self {
        Self {
            read: true,
            write: false,
            append: false,
            create_exclusive: false,
            text: true,
        }
    }

    /// Start the store empty and write entries from index 0.
    ///
    /// Truncates both store files if the directory already holds data.
    pub fn write() -> Self {
        Self {
            read: false,
            write: true,
            append: false,
            create_exclusive: false,
            text: true,
        }
    }

    /// Extend an existing store; prior entries keep their indices.
    pub fn append() -> Self {
        Self {
            read: false,
            write: false,
            append: true,
            create_exclusive: false,
            text: true,
        }
    }

    /// Create a brand-new store; fails if the directory exists.
    pub fn create_new() -> Self {
        Self {
            read: false,
            write: false,
            append: false,
            create_exclusive: true,
            text: true,
        }
    }

    /// Add read capability to a write-capable mode.
    pub fn and_read(mut self) -> Self {
        self.read = true;
        self
    }

    /// Add non-destructive write capability to a read-only mode.
    pub fn and_write(mut self) -> Self {
        if !self.is_write_capable() {
            self.append = true;
        }
        self
    }

    /// Disable the text helpers; entries are raw bytes only.
    pub fn binary(mut self) -> Self {
        self.text = false;
        self
    }

    /// Whether entries may be read back through this handle.
    pub fn can_read(&self) -> bool {
        self.read
    }

    /// Whether this handle may commit new entries.
    pub fn is_write_capable(&self) -> bool {
        self.write || self.append || self.create_exclusive
    }

    /// Whether opening discards any existing store contents.
    pub fn truncates(&self) -> bool {
        self.write
    }

    /// Whether the directory must not exist at open.
    pub fn is_create_exclusive(&self) -> bool {
        self.create_exclusive
    }

    /// Whether text decoding and line-entry helpers are allowed.
    pub fn is_text(&self) -> bool {
        self.text
    }

    fn invalid(flags: &str, reason: impl Into<String>) -> StoreError {
        StoreError::InvalidMode {
            flags: flags.to_string(),
            reason: reason.into(),
        }
    }
}

impl FromStr for Mode {
    type Err = StoreError;

    /// Parses the compact flag form.
    ///
    /// Exactly one primary flag of `r`, `w`, `a`, `x`; an optional `+`
    /// adds the complementary capability (read for the write modes,
    /// write for `r`); an optional `b` or `t` selects binary or text
    /// (text is the default).
    fn from_str(flags: &str) -> Result<Self, Self::Err> {
        let mut primary: Option<char> = None;
        let mut plus = false;
        let mut binary = false;
        let mut text = false;

        for c in flags.chars() {
            match c {
                'r' | 'w' | 'a' | 'x' => {
                    if let Some(prev) = primary {
                        return Err(Mode::invalid(
                            flags,
                            format!("'{}' conflicts with '{}'", c, prev),
                        ));
                    }
                    primary = Some(c);
                }
                '+' => plus = true,
                'b' => binary = true,
                't' => text = true,
                other => {
                    return Err(Mode::invalid(flags, format!("unrecognized flag '{}'", other)));
                }
            }
        }

        if binary && text {
            return Err(Mode::invalid(flags, "'b' conflicts with 't'"));
        }

        let mut mode = match primary {
            Some('r') => Mode::read_only(),
            Some('w') => Mode::write(),
            Some('a') => Mode::append(),
            Some('x') => Mode::create_new(),
            _ => return Err(Mode::invalid(flags, "one of 'r', 'w', 'a', 'x' is required")),
        };

        if plus {
            mode = mode.and_read().and_write();
        }
        if binary {
            mode = mode.binary();
        }

        Ok(mode)
    }
}

impl fmt::Display for Mode {
    /// Renders the canonical flag form, e.g. `w+` or `rb`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.create_exclusive {
            write!(f, "x")?;
        } else if self.write {
            write!(f, "w")?;
        } else if self.append {
            write!(f, "a")?;
        } else {
            write!(f, "r")?;
        }
        if self.read && self.is_write_capable() {
            write!(f, "+")?;
        }
        if !self.text {
            write!(f, "b")?;
        }
        Ok(())
    }
}
