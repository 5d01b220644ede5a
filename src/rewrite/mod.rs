pub mod convert;
pub mod locals;
pub mod self_assign;

/// Result of running one pass over a document.
pub struct Rewritten {
    pub text: String,
    pub count: usize,
}

/// The rewriting passes, in the order they were applied during the
/// th-set migration. Each is a pure transform over the raw text; file
/// I/O and backups are the caller's problem.
#[derive(Clone, Copy)]
pub enum Pass {
    /// `<<set $var ...>>` → `<<th-set '$var' ...>>`
    ConvertSet,
    /// `<<th-set '$var' to $var = v>>` → `<<th-set '$var' to v>>`
    SelfAssign,
    /// `<<th-set '$var' to _tmp>>` → `<<sendAction "$var" _tmp>>`
    Locals,
}

impl Pass {
    pub fn apply(self, content: &str) -> Rewritten {
        match self {
            Pass::ConvertSet => convert::convert_set_macros(content),
            Pass::SelfAssign => self_assign::strip_self_assign(content),
            Pass::Locals => locals::reroute_local_refs(content),
        }
    }

    /// Noun for summary lines ("converted 3 macros", "fixed 2 calls").
    pub fn noun(self) -> &'static str {
        match self {
            Pass::ConvertSet => "macros",
            Pass::SelfAssign | Pass::Locals => "calls",
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Pass::ConvertSet => "Converted",
            Pass::SelfAssign | Pass::Locals => "Fixed",
        }
    }
}
