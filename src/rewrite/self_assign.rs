use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Rewritten;

static THSET_TO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<<th-set\s+'([^']+)'\s+to\s+([^>]+)>>").unwrap());

/// Drop redundant self-assignments left behind by the original conversion:
///
/// `<<th-set '$gold' to $gold = 5>>` → `<<th-set '$gold' to 5>>`
///
/// The value expression must start with the call's own variable path,
/// textually, followed by a single `=`. Comparisons (`==`) and values
/// naming any other variable are left byte-for-byte unchanged.
pub fn strip_self_assign(content: &str) -> Rewritten {
    let mut count = 0;

    let text = THSET_TO_RE.replace_all(content, |caps: &Captures| {
        let var_path = &caps[1];
        match inner_value(var_path, caps[2].trim()) {
            Some(inner) => {
                count += 1;
                format!("<<th-set '{var_path}' to {inner}>>")
            }
            None => caps[0].to_string(),
        }
    });

    Rewritten {
        text: text.into_owned(),
        count,
    }
}

/// If `expr` is `<var_path> = <inner>`, return the inner value.
fn inner_value<'a>(var_path: &str, expr: &'a str) -> Option<&'a str> {
    let rest = expr.strip_prefix(var_path)?.trim_start();
    let rest = rest.strip_prefix('=')?;
    if rest.starts_with('=') {
        return None; // comparison, not an assignment
    }
    let inner = rest.trim();
    (!inner.is_empty()).then_some(inner)
}

// ── Tests ──
