/// How much detail a publish run reports.
///
/// Parsed once from the command line and handed to every component that logs,
/// instead of living in a process-wide flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flag(verbose: bool) -> Self {
        if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    pub fn is_verbose(self) -> bool {
        self == Self::Verbose
    }

    /// Default `tracing` filter directive for this level.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Normal => "publisher=info",
            Self::Verbose => "publisher=debug",
        }
    }
}
