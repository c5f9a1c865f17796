use std::fmt;

/// How a command is presented to the user while it runs.
///
/// - `TerminalSession`: foreground, terminal-like (sets `TERM`/`COLORTERM`).
/// - `AppShell`: background, no terminal variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runner {
    TerminalSession,
    AppShell,
}

impl Runner {
    pub fn name(self) -> &'static str {
        match self {
            Runner::TerminalSession => "terminal-session",
            Runner::AppShell => "app-shell",
        }
    }

    pub fn is_background(self) -> bool {
        matches!(self, Runner::AppShell)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Runner::TerminalSession
    }
}

impl fmt::Display for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional numeric identity of a command, e.g. assigned by a session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandId(pub u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
