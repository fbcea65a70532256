use regex::Regex;

use std::sync::LazyLock;

// literal pattern; compiled by every test in this module
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*?\}").expect("placeholder pattern"));

/// Token → original placeholder, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMap {
    pairs: Vec<(String, String)>,
}

impl TokenMap {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, p)| p.as_str())
    }
}

pub fn token(n: usize) -> String {
    format!("__TOKEN{n}__")
}

/// Replaces every `{...}` span with `__TOKEN<n>__`, counting occurrences
/// from 1 (repeats get their own token).
pub fn tokenize(text: &str) -> (String, TokenMap) {
    let mut map = TokenMap::default();
    let tokenized = PLACEHOLDER.replace_all(text, |caps: &regex::Captures| {
        let t = token(map.pairs.len() + 1);
        map.pairs.push((t.clone(), caps[0].to_string()));
        t
    });
    (tokenized.into_owned(), map)
}

pub fn detokenize(text: &str, map: &TokenMap) -> String {
    let mut out = text.to_string();
    for (t, original) in &map.pairs {
        if out.contains(t.as_str()) {
            out = out.replace(t.as_str(), original);
        }
    }
    out
}

/// Placeholders of `source` that do not appear in `translated`.
pub fn missing_placeholders<'a>(source: &'a str, translated: &str) -> Vec<&'a str> {
    let mut missing = Vec::new();
    for m in PLACEHOLDER.find_iter(source) {
        let p = m.as_str();
        let wanted = PLACEHOLDER
            .find_iter(source)
            .filter(|x| x.as_str() == p)
            .count();
        let found = translated.matches(p).count();
        if found < wanted && !missing.contains(&p) {
            missing.push(p);
        }
    }
    missing
}

/// Placeholders of `translated` that the source never had.
pub fn extra_placeholders<'a>(source: &str, translated: &'a str) -> Vec<&'a str> {
    let mut extra = Vec::new();
    for m in PLACEHOLDER.find_iter(translated) {
        let p = m.as_str();
        if !source.contains(p) && !extra.contains(&p) {
            extra.push(p);
        }
    }
    extra
}

/// Decodes the HTML character references providers tend to return
/// (`&amp;`, `&#39;`, `&#x27;` and friends). Unknown references are kept.
pub fn unescape_html(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&tail[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_pattern_compiles() {
        assert!(PLACEHOLDER.is_match("{x}"));
        assert!(!PLACEHOLDER.is_match("no braces"));
    }

    #[test]
    fn repeated_placeholders_get_their_own_tokens() {
        let (text, map) = tokenize("Hi {name}, {name}!");
        assert_eq!(text, "Hi __TOKEN1__, __TOKEN2__!");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("__TOKEN1__"), Some("{name}"));
        assert_eq!(map.get("__TOKEN2__"), Some("{name}"));
        assert_eq!(detokenize(&text, &map), "Hi {name}, {name}!");
    }

    #[test]
    fn detokenize_inverts_tokenize() {
        let samples = [
            "",
            "no placeholders",
            "{a}{b}{}",
            "{count} items in {place} for {user.name}",
            "{a}{b}{c}{d}{e}{f}{g}{h}{i}{j}{k}",
            "unbalanced { brace and } {ok}",
        ];
        for s in samples {
            let (t, map) = tokenize(s);
            assert_eq!(detokenize(&t, &map), s, "sample {s:?}");
        }
    }

    #[test]
    fn nested_braces_match_innermost() {
        let (text, map) = tokenize("{{inner}}");
        assert_eq!(text, "{__TOKEN1__}");
        assert_eq!(map.get("__TOKEN1__"), Some("{inner}"));
    }

    #[test]
    fn stripped_and_unknown_tokens() {
        let (_, map) = tokenize("Hello {name}");
        assert_eq!(detokenize("Hola", &map), "Hola");
        assert_eq!(detokenize("Hola __TOKEN9__", &map), "Hola __TOKEN9__");
    }

    #[test]
    fn placeholder_diffs() {
        assert_eq!(missing_placeholders("Hi {a} {a} {b}", "Hola {a}"), vec!["{a}", "{b}"]);
        assert!(missing_placeholders("Hi {a}", "Hola {a}").is_empty());
        assert_eq!(extra_placeholders("Hi", "Hola {x}"), vec!["{x}"]);
    }

    #[test]
    fn html_references() {
        assert_eq!(unescape_html("Tom &amp; Jerry&#39;s &lt;b&gt;"), "Tom & Jerry's <b>");
        assert_eq!(unescape_html("&#x27;x&#X27;"), "'x'");
        assert_eq!(unescape_html("AT&T & co &bogus;"), "AT&T & co &bogus;");
    }
}
