/// Ordered log severity. Lower ordinal means higher severity.
///
/// `Severity::None` is reserved for "do not log" and is never attached to an emitted message by
/// this core (the front-end surface is expected to skip the call entirely); it exists so callers
/// have a sentinel value to configure a module off without a separate on/off flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Severity {
    /// Do not log.
    None = 0,
    /// Unrecoverable or user-visible failure.
    Error = 1,
    /// Recoverable but noteworthy condition.
    Warning = 2,
    /// Routine operational message.
    Info = 3,
    /// Verbose, developer-facing detail.
    Debug = 4,
}

impl Severity {
    /// The short tag used by the augmented format convention (`"ERR"`, `"WRN"`, ...).
    pub const fn tag(self) -> &'static str {
        match self {
            Severity::None => "",
            Severity::Error => "ERR",
            Severity::Warning => "WRN",
            Severity::Info => "INF",
            Severity::Debug => "DBG",
        }
    }

    /// The ANSI color escape associated with this severity by the augmented format convention.
    pub const fn ansi_color(self) -> &'static str {
        match self {
            Severity::None => "",
            Severity::Error => "\u{1b}[31m",
            Severity::Warning => "\u{1b}[33m",
            Severity::Info => "\u{1b}[37m",
            Severity::Debug => "\u{1b}[34m",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Severity;

    #[test]
    fn ordered_by_severity() {
        assert!(Severity::Error < Severity::Warning);
        assert!(Severity::Warning < Severity::Info);
        assert!(Severity::Info < Severity::Debug);
        assert!(Severity::None < Severity::Error);
    }
}
