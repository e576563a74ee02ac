//! Compile-time flags and resource limits.

/// Matching flags applied when a pattern is compiled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags {
    /// Case-insensitive matching.
    pub case_insensitive: bool,
    /// Dotall mode: `.` matches newline.
    pub dotall: bool,
    /// Multiline mode: `^` and `$` match at line boundaries.
    pub multiline: bool,
}

/// Deepest group nesting the parser accepts unless configured otherwise.
pub(crate) const DEFAULT_NEST_LIMIT: u32 = 250;

/// Limits on the size of a compiled program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompileLimits {
    /// Largest counted repetition bound accepted (default: 1,000).
    pub(crate) max_repetition: u32,
    /// Largest program accepted, in instructions (default: 1,000,000).
    pub(crate) max_instructions: usize,
    /// Deepest group nesting accepted (default: 250).
    pub(crate) nest_limit: u32,
}

impl Default for CompileLimits {
    fn default() -> Self {
        Self {
            max_repetition: 1_000,
            max_instructions: 1_000_000,
            nest_limit: DEFAULT_NEST_LIMIT,
        }
    }
}

impl CompileLimits {
    /// Create new compile limits with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the largest accepted `{n}` / `{n,m}` bound.
    pub fn max_repetition(mut self, limit: u32) -> Self {
        self.max_repetition = limit;
        self
    }

    /// Set the largest accepted program size.
    pub fn max_instructions(mut self, limit: usize) -> Self {
        self.max_instructions = limit;
        self
    }

    /// Set the deepest accepted group nesting.
    ///
    /// Parsing and compiling recurse once per level, so this bounds the
    /// stack used for a pattern.
    pub fn nest_limit(mut self, limit: u32) -> Self {
        self.nest_limit = limit;
        self
    }
}

/// Optional caps on the work done by a single search.
///
/// Searches are already bounded by program size times input length; these
/// caps exist for callers that run patterns they do not control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecLimits {
    /// Maximum instructions visited across the whole search.
    pub(crate) max_steps: Option<u64>,
    /// Maximum capture-history records kept alive by the search.
    pub(crate) max_history: Option<usize>,
}

impl ExecLimits {
    /// Create limits with no caps set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the step cap.
    pub fn max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Set the capture-history cap.
    pub fn max_history(mut self, records: usize) -> Self {
        self.max_history = Some(records);
        self
    }
}
