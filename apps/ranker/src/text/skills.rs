//! Skill keyword extraction against a fixed dictionary.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical spellings of every skill the extractor recognises.
pub const SKILL_DICTIONARY: &[&str] = &[
    "Python",
    "Java",
    "JavaScript",
    "TypeScript",
    "C++",
    "C#",
    "Go",
    "Rust",
    "HTML",
    "CSS",
    "React",
    "Angular",
    "Vue.js",
    "Next.js",
    "Node.js",
    "Django",
    "Flask",
    "FastAPI",
    "Spring",
    "ASP.NET",
    "SQL",
    "MySQL",
    "PostgreSQL",
    "MongoDB",
    "Redis",
    "Oracle",
    "AWS",
    "Azure",
    "GCP",
    "Docker",
    "Kubernetes",
    "Jenkins",
    "Git",
    "Machine Learning",
    "Deep Learning",
    "TensorFlow",
    "PyTorch",
    "Pandas",
    "NumPy",
    "Linux",
    "Agile",
    "Scrum",
    "DevOps",
    "CI/CD",
    "REST API",
    "GraphQL",
];

/// One alternation over the whole dictionary, longest first so `JavaScript`
/// wins over `Java` at the same position. Only the leading word boundary is
/// in the pattern; the trailing one is checked in `extract_skills` because
/// `C++` and `C#` end in non-word characters.
static SKILL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let mut skills: Vec<&str> = SKILL_DICTIONARY.to_vec();
    skills.sort_by_key(|s| std::cmp::Reverse(s.len()));
    let alternation = skills
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})")).unwrap()
});

/// Returns the sorted, de-duplicated canonical skills mentioned in `text`.
pub fn extract_skills(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut found = BTreeSet::new();
    for m in SKILL_PATTERN.find_iter(text) {
        let ends_in_word_char = m.as_str().chars().last().is_some_and(is_word_char);
        let followed_by_word_char = text[m.end()..].chars().next().is_some_and(is_word_char);
        if ends_in_word_char && followed_by_word_char {
            continue;
        }
        found.insert(normalize_skill(m.as_str()));
    }
    found.into_iter().collect()
}

/// Maps a raw mention onto its dictionary spelling.
///
/// `react.js` falls back to `React` by dropping the `.js` suffix; unknown
/// terms are title-cased.
pub fn normalize_skill(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(canonical) = lookup(trimmed) {
        return canonical.to_string();
    }

    let without_js = trimmed.replace(".js", "").replace(".JS", "");
    if let Some(canonical) = lookup(&without_js) {
        return canonical.to_string();
    }
    title_case(&without_js)
}

fn lookup(candidate: &str) -> Option<&'static str> {
    SKILL_DICTIONARY
        .iter()
        .copied()
        .find(|skill| skill.eq_ignore_ascii_case(candidate))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_has_no_skills() {
        assert!(extract_skills("").is_empty());
        assert!(extract_skills("   \n").is_empty());
    }

    #[test]
    fn test_case_insensitive_and_canonicalised() {
        let skills = extract_skills("experienced in python, DOCKER and kubernetes");
        assert_eq!(skills, vec!["Docker", "Kubernetes", "Python"]);
    }

    #[test]
    fn test_results_sorted_and_deduplicated() {
        let skills = extract_skills("SQL sql Sql and AWS aws");
        assert_eq!(skills, vec!["AWS", "SQL"]);
    }

    #[test]
    fn test_longest_alternative_wins() {
        let skills = extract_skills("Frontend work in JavaScript and TypeScript");
        assert_eq!(skills, vec!["JavaScript", "TypeScript"]);
    }

    #[test]
    fn test_word_boundaries_respected() {
        // "Go" inside "Google", "Git" inside "GitHub", "Java" inside "Javanese"
        assert!(extract_skills("Google GitHub Javanese cuisine").is_empty());
    }

    #[test]
    fn test_symbol_terminated_skills_match_before_spaces() {
        let skills = extract_skills("c++ c# and rust");
        assert_eq!(skills, vec!["C#", "C++", "Rust"]);
    }

    #[test]
    fn test_multi_word_and_slash_skills() {
        let skills = extract_skills("machine learning, deep learning, CI/CD and a REST API");
        assert_eq!(
            skills,
            vec!["CI/CD", "Deep Learning", "Machine Learning", "REST API"]
        );
    }

    #[test]
    fn test_dotted_framework_names() {
        let skills = extract_skills("built with node.js, next.js and asp.net");
        assert_eq!(skills, vec!["ASP.NET", "Next.js", "Node.js"]);
    }

    #[test]
    fn test_normalize_prefers_dictionary_spelling() {
        assert_eq!(normalize_skill("  vue.js "), "Vue.js");
        assert_eq!(normalize_skill("postgresql"), "PostgreSQL");
    }

    #[test]
    fn test_normalize_strips_js_suffix() {
        assert_eq!(normalize_skill("react.js"), "React");
        assert_eq!(normalize_skill("ANGULAR.JS"), "Angular");
    }

    #[test]
    fn test_normalize_title_cases_unknown_terms() {
        assert_eq!(normalize_skill("apache kafka"), "Apache Kafka");
    }

    #[test]
    fn test_preprocessed_resume_text() {
        let text = crate::text::preprocess("Skills:\tPython • Django • PostgreSQL • Docker");
        assert_eq!(
            extract_skills(&text),
            vec!["Django", "Docker", "PostgreSQL", "Python"]
        );
    }
}
