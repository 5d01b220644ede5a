use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Rewritten;

static THSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<<th-set\s+'([^']+)'\s+(?:to|[+\-*/]=)\s+([^>]+)>>").unwrap()
});
// A temporary reference is `_name` at the start of the expression, after
// whitespace, or after a path separator. `$my_var` is not one.
static LOCAL_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)_[A-Za-z]|/_").unwrap());

/// Reroute `<<th-set>>` calls whose value references a temporary variable
/// through `<<sendAction>>`:
///
/// `<<th-set '$hp' to _bonus>>` → `<<sendAction "$hp" _bonus>>`
///
/// th-set defers evaluation of its value expression, and temporaries are
/// gone by then; sendAction takes the already-evaluated value as a
/// positional argument instead. Calls without a temporary reference are
/// left unchanged.
pub fn reroute_local_refs(content: &str) -> Rewritten {
    let mut count = 0;

    let text = THSET_RE.replace_all(content, |caps: &Captures| {
        let expr = caps[2].trim();
        if LOCAL_REF_RE.is_match(expr) {
            count += 1;
            format!("<<sendAction \"{}\" {}>>", &caps[1], expr)
        } else {
            caps[0].to_string()
        }
    });

    Rewritten {
        text: text.into_owned(),
        count,
    }
}

// ── Tests ──
