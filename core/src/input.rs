use std::collections::HashMap;
use anyhow::{anyhow, Result};

use crate::model::form::TaskForm;
use crate::model::task::Priority;
use crate::time::parse_human_date;

/// Metadata keys accepted by `add` and `edit`, expandable by prefix.
pub const FORM_KEYS: [&str; 4] = ["description", "start", "due", "priority"];

#[derive(Debug, PartialEq)]
pub struct ParsedInput {
    pub name: String,
    pub metadata: HashMap<String, String>,
}

pub fn parse_args(args: &[String]) -> ParsedInput {
    let mut name_parts = Vec::new();
    let mut metadata = HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once(':') {
            if !key.is_empty() && !key.contains(' ') {
                metadata.insert(key.to_string(), value.to_string());
                continue;
            }
        }
        name_parts.push(arg.as_str());
    }

    ParsedInput {
        name: name_parts.join(" "),
        metadata,
    }
}

/// Splits a typed line on whitespace, keeping double-quoted runs together:
/// `Fix login desc:"session expires early"`.
pub fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

pub fn expand_key(key: &str, candidates: &[&str]) -> Result<String> {
    // 1. Exact match
    if candidates.contains(&key) {
        return Ok(key.to_string());
    }

    // 2. Prefix match
    let matches: Vec<&str> = candidates
        .iter()
        .filter(|&&c| c.starts_with(key))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(anyhow!("Unknown key: '{}'", key)),
        _ => Err(anyhow!("Ambiguous key: '{}' matches {:?}", key, matches)),
    }
}

pub fn parse_priority(pri_str: &str) -> Priority {
    match pri_str.to_lowercase().as_str() {
        "h" | "high" => Priority::High,
        "m" | "medium" | "med" => Priority::Medium,
        "l" | "low" => Priority::Low,
        _ => Priority::Medium,
    }
}

/// Writes parsed input into `form`. Free text, when present, becomes the
/// title. Returns warnings for keys or values that were skipped.
pub fn apply_to_form(parsed: &ParsedInput, form: &mut TaskForm) -> Vec<String> {
    let mut warnings = Vec::new();

    if !parsed.name.is_empty() {
        form.title = parsed.name.clone();
    }

    let mut keys: Vec<&String> = parsed.metadata.keys().collect();
    keys.sort();

    for key in keys {
        let value = &parsed.metadata[key];
        let full_key = match expand_key(key, &FORM_KEYS) {
            Ok(k) => k,
            Err(e) => {
                warnings.push(e.to_string());
                continue;
            }
        };

        match full_key.as_str() {
            "description" => form.description = value.clone(),
            "priority" => form.priority = parse_priority(value),
            "start" | "due" => {
                let date = if value.is_empty() || value == "-" {
                    Ok(None)
                } else {
                    parse_human_date(value).map(Some)
                };
                match date {
                    Ok(d) if full_key == "start" => form.start_date = d,
                    Ok(d) => form.due_date = d,
                    Err(e) => warnings.push(format!("Invalid {} date '{}': {}", full_key, value, e)),
                }
            }
            _ => {}
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple() {
        let args = strings(&["Buy", "milk", "due:tomorrow", "pri:H"]);
        let parsed = parse_args(&args);
        assert_eq!(parsed.name, "Buy milk");
        assert_eq!(parsed.metadata.get("due"), Some(&"tomorrow".to_string()));
        assert_eq!(parsed.metadata.get("pri"), Some(&"H".to_string()));
    }

    #[test]
    fn test_split_words_keeps_quotes() {
        assert_eq!(
            split_words(r#"Fix login desc:"session expires early"  pri:h"#),
            strings(&["Fix", "login", "desc:session expires early", "pri:h"])
        );
        assert!(split_words("   ").is_empty());
    }

    #[test]
    fn test_expand_key() {
        assert_eq!(expand_key("d", &["due", "priority"]).unwrap(), "due");
        assert_eq!(expand_key("du", &FORM_KEYS).unwrap(), "due");
        assert_eq!(expand_key("desc", &FORM_KEYS).unwrap(), "description");
        assert_eq!(expand_key("p", &FORM_KEYS).unwrap(), "priority");
        assert_eq!(expand_key("s", &FORM_KEYS).unwrap(), "start");

        // Ambiguous
        assert!(expand_key("d", &FORM_KEYS).is_err()); // due, description

        // Unknown
        assert!(expand_key("x", &FORM_KEYS).is_err());
    }

    #[test]
    fn test_apply_to_form() {
        let parsed = parse_args(&strings(&[
            "Quarterly",
            "review",
            "desc:numbers",
            "start:2025-03-01",
            "due:2025-03-14",
            "p:high",
            "project:ops",
        ]));
        let mut form = TaskForm::default();
        let warnings = apply_to_form(&parsed, &mut form);

        assert_eq!(form.title, "Quarterly review");
        assert_eq!(form.description, "numbers");
        assert_eq!(form.start_date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(form.due_date, NaiveDate::from_ymd_opt(2025, 3, 14));
        assert_eq!(form.priority, Priority::High);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("project"));
    }

    #[test]
    fn test_apply_to_form_keeps_title_and_clears_dates() {
        let mut form = TaskForm::new("Keep me");
        form.due_date = NaiveDate::from_ymd_opt(2025, 1, 1);

        let parsed = parse_args(&strings(&["due:-", "start:whenever"]));
        let warnings = apply_to_form(&parsed, &mut form);

        assert_eq!(form.title, "Keep me");
        assert_eq!(form.due_date, None);
        assert_eq!(warnings.len(), 1);
    }
}
