//! Prompt construction and response parsing for the generation backends.

use promptdir_core::defaults::{FALLBACK_TAGS, MAX_GENERATED_TAGS};
use promptdir_core::normalize_tags;
use regex::Regex;
use serde_json::Value;

const IMAGE_PROMPT_PREFIX: &str = "Generate a high-quality visual based on these specifications: ";

/// Flatten a JSON prompt body into descriptive text.
///
/// Objects become `key: value` pairs joined with `". "`; arrays inside are
/// joined with `", "`. Anything that is not a JSON object is used verbatim.
pub fn prompt_text_from_body(body: &str) -> String {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    map.iter()
        .map(|(key, value)| format!("{}: {}", key, render_value(value)))
        .collect::<Vec<_>>()
        .join(". ")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Text sent to the image model.
pub fn image_prompt(body: &str) -> String {
    format!("{}{}", IMAGE_PROMPT_PREFIX, prompt_text_from_body(body))
}

/// Text sent to the tag model.
pub fn tag_prompt(body: &str) -> String {
    format!(
        "Suggest up to {} short, lowercase tags describing the image this prompt \
         would produce. Reply with a JSON array of strings only.\n\n{}",
        MAX_GENERATED_TAGS,
        prompt_text_from_body(body)
    )
}

/// The fixed tag pair used whenever tag generation yields nothing.
pub fn fallback_tags() -> Vec<String> {
    FALLBACK_TAGS.iter().map(|t| t.to_string()).collect()
}

/// Extract tags from a model response.
///
/// Prefers the first JSON string array in the text; otherwise splits on
/// commas and newlines. Returns the fallback pair when nothing usable is found.
pub fn parse_tags(response: &str) -> Vec<String> {
    let candidates = json_array_tags(response).unwrap_or_else(|| {
        response
            .split([',', '\n'])
            .map(strip_list_marker)
            .collect()
    });

    let cleaned = candidates.iter().map(|t| {
        t.trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '*')
            .to_string()
    });
    let mut tags = normalize_tags(cleaned);
    tags.truncate(MAX_GENERATED_TAGS);

    if tags.is_empty() {
        fallback_tags()
    } else {
        tags
    }
}

fn json_array_tags(response: &str) -> Option<Vec<String>> {
    let re = Regex::new(r"\[[^\[\]]*\]").ok()?;
    let found = re
        .find_iter(response)
        .find_map(|m| serde_json::from_str::<Vec<String>>(m.as_str()).ok());
    found
}

fn strip_list_marker(line: &str) -> String {
    match Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+") {
        Ok(re) => re.replace(line, "").into_owned(),
        Err(_) => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_text_flattens_object_in_order() {
        let body = r#"{"subject": "owl", "details": ["glowing eyes", "mist"], "seed": 42}"#;
        assert_eq!(
            prompt_text_from_body(body),
            "subject: owl. details: glowing eyes, mist. seed: 42"
        );
    }

    #[test]
    fn test_prompt_text_non_object_is_verbatim() {
        assert_eq!(prompt_text_from_body("a red fox"), "a red fox");
        assert_eq!(prompt_text_from_body("[1, 2]"), "[1, 2]");
    }

    #[test]
    fn test_image_prompt_prefix() {
        assert_eq!(
            image_prompt(r#"{"style": "cinematic"}"#),
            "Generate a high-quality visual based on these specifications: style: cinematic"
        );
    }

    #[test]
    fn test_parse_tags_from_json_array() {
        let response = "Sure! Here you go:\n```json\n[\"Owl\", \"night\", \"owl\", \"#Mist\"]\n```";
        assert_eq!(parse_tags(response), vec!["owl", "night", "mist"]);
    }

    #[test]
    fn test_parse_tags_from_list() {
        let response = "- Fantasy\n- Forest\n2. glow, magic";
        assert_eq!(parse_tags(response), vec!["fantasy", "forest", "glow", "magic"]);
    }

    #[test]
    fn test_parse_tags_caps_at_five() {
        let tags = parse_tags(r#"["a","b","c","d","e","f","g"]"#);
        assert_eq!(tags, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_parse_tags_fallback() {
        assert_eq!(parse_tags(""), vec!["creative", "ai-art"]);
        assert_eq!(parse_tags("  ,\n , "), vec!["creative", "ai-art"]);
    }
}
