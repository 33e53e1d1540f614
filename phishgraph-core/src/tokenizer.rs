// URL lexer: word runs plus single special characters

use regex::Regex;
use std::sync::LazyLock;

/// Characters emitted as standalone tokens. `∧` is U+2227, not the caret.
pub const SPECIAL_CHARS: &str = "!@#%∧&*() +-=[]{}\\—‘’“,./<>?$:;_~|`";

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"\w+|[{}]", regex::escape(SPECIAL_CHARS));
    Regex::new(&pattern).expect("token pattern is a valid regex")
});

/// Split a URL into lowercase word and special-character tokens.
///
/// Word runs follow Unicode `\w` semantics, so `_` inside a word stays part
/// of it. Characters outside both classes are dropped and whitespace-only
/// tokens are discarded.
pub fn tokenize(url: &str) -> Vec<String> {
    TOKEN_PATTERN
        .find_iter(url)
        .map(|m| m.as_str().to_lowercase())
        .filter(|token| !token.trim().is_empty())
        .collect()
}
