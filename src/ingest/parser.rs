//! Résumé field extraction.
//!
//! Best-effort and infallible: every extractor falls back to a placeholder
//! when nothing matches. Extraction runs on an NFKC-normalized copy of the
//! text (so full-width digits and ligatures match the patterns); the stored
//! `full_text` is always the original input.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// Placeholder name when no name line is found.
pub const UNKNOWN_NAME: &str = "Unknown";
/// Placeholder education when no degree or institution line is found.
pub const EDUCATION_NOT_FOUND: &str = "Not found";
/// Placeholder for an empty skill list.
pub const SKILLS_NOT_SPECIFIED: &str = "Not specified";

// =============================================================================
// PATTERNS
// =============================================================================

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});

/// International (`+44 20 7946 0958`), `(555) 123-4567` or `555-123-4567`.
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\+\d{1,3}[ \-]?\d{1,4}(?:[ \-]?\d{2,4}){1,3}|\(\d{3}\)[ \-]?\d{3}[ \-]?\d{4}|\d{3}[ \-]?\d{3}[ \-]?\d{4}",
    )
    .expect("valid phone regex")
});

static EXPERIENCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // "5 years experience", "3+ years of experience"
        Regex::new(r"(\d+)\+?\s*years?\s*(?:of\s*)?experience").expect("valid experience regex"),
        // "experience: 7 years"
        Regex::new(r"experience\s*:?\s*(\d+)\+?\s*years?").expect("valid experience regex"),
    ]
});

const EDUCATION_KEYWORDS: &[&str] = &[
    "bachelor",
    "master",
    "phd",
    "b.sc",
    "m.sc",
    "mba",
    "university",
    "college",
    "institute",
    "degree",
];

const SKILL_VOCABULARY: &[&str] = &[
    "python",
    "java",
    "javascript",
    "sql",
    "machine learning",
    "data analysis",
    "docker",
    "kubernetes",
    "aws",
    "azure",
    "react",
    "angular",
    "node.js",
    "tensorflow",
    "pytorch",
    "git",
    "agile",
    "scrum",
    "project management",
    "c++",
    "c#",
    "ruby",
    "php",
    "swift",
    "kotlin",
    "go",
    "rust",
    "scala",
    "tableau",
    "power bi",
    "excel",
    "powerpoint",
    "word",
    "jira",
    "confluence",
    "slack",
    "teams",
    "salesforce",
    "oracle",
    "mongodb",
    "postgresql",
    "mysql",
    "redis",
    "spark",
    "hadoop",
    "kafka",
    "airflow",
    "jenkins",
    "ci/cd",
    "devops",
    "linux",
    "windows",
    "macos",
    "rest api",
    "graphql",
    "microservices",
    "html",
    "css",
];

/// Only the head of the résumé is searched for a name.
const NAME_SEARCH_CHARS: usize = 500;

// =============================================================================
// PARSED RÉSUMÉ
// =============================================================================

/// Fields extracted from one résumé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedResume {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub education: String,
    pub skills: Vec<String>,
    pub experience_years: u32,
    pub category: Option<String>,
    pub full_text: String,
}

impl ParsedResume {
    /// Skills joined by `", "`, or the "Not specified" placeholder.
    #[must_use]
    pub fn skills_display(&self) -> String {
        if self.skills.is_empty() {
            SKILLS_NOT_SPECIFIED.to_string()
        } else {
            self.skills.join(", ")
        }
    }
}

/// Extract every field from `text`.
#[must_use]
pub fn parse_resume(text: &str, category: Option<&str>) -> ParsedResume {
    let normalized: String = text.nfkc().collect();

    ParsedResume {
        name: extract_name(&normalized),
        email: extract_email(&normalized),
        phone: extract_phone(&normalized),
        education: extract_education(&normalized),
        skills: extract_skills(&normalized),
        experience_years: extract_experience_years(&normalized),
        category: category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(ToString::to_string),
        full_text: text.to_string(),
    }
}

// =============================================================================
// EXTRACTORS
// =============================================================================

/// First line in the résumé head made of 2-4 capitalized words.
#[must_use]
pub fn extract_name(text: &str) -> String {
    let head: String = text.chars().take(NAME_SEARCH_CHARS).collect();

    head.lines()
        .map(str::trim)
        .find(|line| looks_like_name(line))
        .map_or_else(|| UNKNOWN_NAME.to_string(), ToString::to_string)
}

fn looks_like_name(line: &str) -> bool {
    if line.is_empty() || line.len() > 60 {
        return false;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    if !(2..=4).contains(&words.len()) {
        return false;
    }
    words.iter().all(|word| is_capitalized_word(word))
}

fn is_capitalized_word(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_uppercase() {
        return false;
    }
    let rest: Vec<char> = chars.collect();
    // all-caps headings such as "WORK EXPERIENCE" are not names
    rest.iter().any(|c| c.is_lowercase())
        && rest
            .iter()
            .all(|c| c.is_alphabetic() || matches!(c, '-' | '\'' | '.'))
}

#[must_use]
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_REGEX.find(text).map(|m| m.as_str().to_string())
}

#[must_use]
pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_REGEX.find(text).map(|m| m.as_str().trim().to_string())
}

/// Lines mentioning a degree or institution, with one line of context
/// before and two after, joined by spaces.
#[must_use]
pub fn extract_education(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut selected = BTreeSet::new();

    for (idx, line) in lines.iter().enumerate() {
        let lowered = line.to_lowercase();
        if EDUCATION_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
            let start = idx.saturating_sub(1);
            let end = (idx + 3).min(lines.len());
            selected.extend(start..end);
        }
    }

    if selected.is_empty() {
        return EDUCATION_NOT_FOUND.to_string();
    }

    selected
        .into_iter()
        .map(|idx| lines[idx].trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Vocabulary skills mentioned as whole words, in vocabulary order.
#[must_use]
pub fn extract_skills(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    SKILL_VOCABULARY
        .iter()
        .filter(|skill| contains_word(&lowered, skill))
        .map(ToString::to_string)
        .collect()
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    let is_word_char = |c: char| c.is_alphanumeric();

    haystack.match_indices(needle).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !is_word_char(c));
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !is_word_char(c));
        before_ok && after_ok
    })
}

/// Years of experience stated in the text, `0` if none.
#[must_use]
pub fn extract_experience_years(text: &str) -> u32 {
    let lowered = text.to_lowercase();
    EXPERIENCE_PATTERNS
        .iter()
        .find_map(|pattern| {
            pattern
                .captures(&lowered)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Jane Doe\n\
        jane.doe@example.com | +1 555-123-4567\n\
        Senior Software Engineer\n\
        7+ years of experience building Python and AWS services.\n\
        \n\
        Education\n\
        Bachelor of Science in Computer Science\n\
        Stanford University\n\
        2010 - 2014\n\
        \n\
        Skills: Docker, Kubernetes, SQL, Git";

    // =========================================================================
    // Whole-résumé parsing
    // =========================================================================

    #[test]
    fn parses_all_fields() {
        let parsed = parse_resume(SAMPLE, Some("ENGINEERING"));

        assert_eq!(parsed.name, "Jane Doe");
        assert_eq!(parsed.email.as_deref(), Some("jane.doe@example.com"));
        assert!(parsed.phone.is_some());
        assert!(parsed.education.contains("Bachelor of Science"));
        assert!(parsed.education.contains("Stanford University"));
        assert_eq!(parsed.experience_years, 7);
        assert_eq!(parsed.category.as_deref(), Some("ENGINEERING"));
        assert_eq!(parsed.full_text, SAMPLE);
        for skill in ["python", "docker", "kubernetes", "aws", "sql", "git"] {
            assert!(parsed.skills.iter().any(|s| s == skill), "missing {skill}");
        }
    }

    #[test]
    fn placeholders_for_empty_text() {
        let parsed = parse_resume("", None);
        assert_eq!(parsed.name, UNKNOWN_NAME);
        assert_eq!(parsed.email, None);
        assert_eq!(parsed.phone, None);
        assert_eq!(parsed.education, EDUCATION_NOT_FOUND);
        assert!(parsed.skills.is_empty());
        assert_eq!(parsed.skills_display(), SKILLS_NOT_SPECIFIED);
        assert_eq!(parsed.experience_years, 0);
        assert_eq!(parsed.category, None);
    }

    #[test]
    fn blank_category_is_dropped() {
        let parsed = parse_resume("text", Some("   "));
        assert_eq!(parsed.category, None);
    }

    // =========================================================================
    // Individual extractors
    // =========================================================================

    #[test]
    fn name_skips_all_caps_headings() {
        let text = "HR ADMINISTRATOR\nMaria Lopez Garcia\nSummary";
        assert_eq!(extract_name(text), "Maria Lopez Garcia");
    }

    #[test]
    fn name_unknown_when_head_has_no_name_line() {
        assert_eq!(extract_name("summary of qualifications\nmanaged teams"), UNKNOWN_NAME);
    }

    #[test]
    fn phone_formats() {
        assert_eq!(
            extract_phone("call (555) 123-4567 today").as_deref(),
            Some("(555) 123-4567")
        );
        assert_eq!(
            extract_phone("tel 555-123-4567").as_deref(),
            Some("555-123-4567")
        );
        assert!(extract_phone("+44 20 7946 0958").is_some());
        assert_eq!(extract_phone("no digits here"), None);
    }

    #[test]
    fn full_width_digits_are_normalized() {
        let parsed = parse_resume("Tel: ５５５-１２３-４５６７", None);
        assert_eq!(parsed.phone.as_deref(), Some("555-123-4567"));
    }

    #[test]
    fn experience_patterns() {
        assert_eq!(extract_experience_years("5 years experience"), 5);
        assert_eq!(extract_experience_years("3+ years of experience"), 3);
        assert_eq!(extract_experience_years("Experience: 12 years"), 12);
        assert_eq!(extract_experience_years("experienced engineer"), 0);
    }

    #[test]
    fn education_includes_context_lines_once() {
        let text = "Education\nMaster of Arts\nOxford University\n2012";
        let education = extract_education(text);
        assert_eq!(education, "Education Master of Arts Oxford University 2012");
    }

    #[test]
    fn skills_match_whole_words_only() {
        let skills = extract_skills("Good at Golang? No. Strong in Go and C++, some Excel.");
        assert!(skills.contains(&"go".to_string()));
        assert!(skills.contains(&"c++".to_string()));
        assert!(skills.contains(&"excel".to_string()));
        assert!(!skills.contains(&"java".to_string()));
    }

    #[test]
    fn skills_do_not_match_inside_other_words() {
        let skills = extract_skills("a good javascript wordsmith");
        assert_eq!(skills, vec!["javascript".to_string()]);
    }
}
