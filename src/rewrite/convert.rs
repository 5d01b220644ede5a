use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

use super::Rewritten;

// Single-line calls only: the argument may not contain another angle
// bracket, so nested macros never match.
static SET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<<set\s+([^<>]+)>>").unwrap());
static COMPOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\$[^\s=]+)\s*([+\-*/])=\s*(.+?)\s*$").unwrap());
static ASSIGN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\$[^\s=]+)\s*=\s*(.+?)\s*$").unwrap());

/// Convert `<<set $var ...>>` macros to the server-authoritative
/// `<<th-set '$var' ...>>` form.
///
/// - `<<set $var = value>>`  → `<<th-set '$var' to value>>`
/// - `<<set $var += value>>` → `<<th-set '$var' += value>>` (same for -= *= /=)
/// - `<<set _tmp = value>>` is a temporary-variable binding and stays as is
/// - bracketed paths like `$users[$role]["stats"]["Strength"]` pass through intact
///
/// Compound operators are tried before plain assignment; the first pattern
/// that matches wins. Arguments neither pattern understands are left
/// byte-for-byte unchanged with a warning.
pub fn convert_set_macros(content: &str) -> Rewritten {
    let mut count = 0;

    let text = SET_RE.replace_all(content, |caps: &Captures| {
        let full = &caps[0];
        let inner = &caps[1];
        let trimmed = inner.trim();

        // Temporaries are evaluated client-side and never synced.
        if trimmed.starts_with('_') {
            return full.to_string();
        }
        // No story variable at all: nothing to convert.
        if !trimmed.contains('$') {
            return full.to_string();
        }

        if let Some(c) = COMPOUND_RE.captures(inner) {
            count += 1;
            return format!("<<th-set '{}' {}= {}>>", &c[1], &c[2], &c[3]);
        }

        if let Some(c) = ASSIGN_RE.captures(inner) {
            count += 1;
            return format!("<<th-set '{}' to {}>>", &c[1], &c[2]);
        }

        warn!("could not parse, leaving unchanged: {full}");
        full.to_string()
    });

    Rewritten {
        text: text.into_owned(),
        count,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_assignment() {
        let r = convert_set_macros("<<set $hp = 10>>");
        assert_eq!(r.text, "<<th-set '$hp' to 10>>");
        assert_eq!(r.count, 1);
    }

    #[test]
    fn compound_operators() {
        for op in ["+", "-", "*", "/"] {
            let r = convert_set_macros(&format!("<<set $hp {op}= 5>>"));
            assert_eq!(r.text, format!("<<th-set '$hp' {op}= 5>>"));
            assert_eq!(r.count, 1);
        }
    }

    #[test]
    fn bracketed_path() {
        let r = convert_set_macros(r#"<<set $users[$role]["stats"]["Strength"] += 1>>"#);
        assert_eq!(r.text, r#"<<th-set '$users[$role]["stats"]["Strength"]' += 1>>"#);
        assert_eq!(r.count, 1);
    }

    #[test]
    fn temporary_variable_untouched() {
        let src = "<<set _bonus = 3>>";
        let r = convert_set_macros(src);
        assert_eq!(r.text, src);
        assert_eq!(r.count, 0);
    }

    #[test]
    fn local_value_still_converted() {
        // Story variable assigned from a temporary: converted here, routed
        // through sendAction by the locals pass afterwards.
        let r = convert_set_macros("<<set $hp += _bonus>>");
        assert_eq!(r.text, "<<th-set '$hp' += _bonus>>");
        assert_eq!(r.count, 1);
    }

    #[test]
    fn unparseable_argument_preserved() {
        let src = "<<set $hp>>";
        let r = convert_set_macros(src);
        assert_eq!(r.text, src);
        assert_eq!(r.count, 0);
    }

    #[test]
    fn no_story_variable_preserved() {
        let src = "<<set to 5>>";
        let r = convert_set_macros(src);
        assert_eq!(r.text, src);
        assert_eq!(r.count, 0);
    }

    #[test]
    fn comparison_in_value_not_matched() {
        // The > inside the argument ends the candidate span, so the call
        // falls outside the single-line pattern and stays untouched.
        let src = "<<set $won = $score > 100>>";
        let r = convert_set_macros(src);
        assert_eq!(r.text, src);
        assert_eq!(r.count, 0);
    }

    #[test]
    fn surrounding_text_intact() {
        let src = "The fleet arrives.\n<<set $ships = 11>>\nEleven sails on the horizon.";
        let r = convert_set_macros(src);
        assert_eq!(
            r.text,
            "The fleet arrives.\n<<th-set '$ships' to 11>>\nEleven sails on the horizon."
        );
        assert_eq!(r.count, 1);
    }

    #[test]
    fn multiple_macros_counted() {
        let src = "<<set $a = 1>> and <<set $b -= 2>> and <<set _c = 3>>";
        let r = convert_set_macros(src);
        assert_eq!(r.count, 2);
        assert!(r.text.contains("<<th-set '$a' to 1>>"));
        assert!(r.text.contains("<<th-set '$b' -= 2>>"));
        assert!(r.text.contains("<<set _c = 3>>"));
    }

    #[test]
    fn idempotent() {
        let once = convert_set_macros("<<set $hp = 10>>\n<<set $gold += 5>>");
        let twice = convert_set_macros(&once.text);
        assert_eq!(twice.count, 0);
        assert_eq!(twice.text, once.text);
    }

    #[test]
    fn fixture_conversion() {
        let src = std::fs::read_to_string("tests/fixtures/demo.twee").unwrap();
        let r = convert_set_macros(&src);
        assert_eq!(r.count, 4);
        assert!(!r.text.contains("<<set $"));
        assert!(r.text.contains("<<set _scratch = 0>>"));
    }
}
