use serde::Serialize;

/// The group of subscribers an event is broadcast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Audience {
    /// Public display screens.
    Display,
    /// Counter terminals.
    Counter,
    /// Remote print agents.
    PrintAgent,
}

impl Audience {
    pub const ALL: [Audience; 3] = [Audience::Display, Audience::Counter, Audience::PrintAgent];

    pub fn as_str(self) -> &'static str {
        match self {
            Audience::Display => "display",
            Audience::Counter => "counter",
            Audience::PrintAgent => "print-agent",
        }
    }
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
