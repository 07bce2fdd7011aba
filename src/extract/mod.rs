//! Response SQL Extractor
//!
//! Finds the SQL an assistant proposed inside its free-form reply.
//!
//! Only the first fenced block tagged `sql` is used. Replies that contain
//! several blocks keep the first one as the current query; later blocks are
//! ignored. A missing block is a normal outcome, not an error.

use regex::Regex;
use std::sync::OnceLock;

/// First ```sql fenced block, non-greedy, across lines. `\b` rejects tags
/// such as `sqlite` that merely start with "sql". A multi-line block skips the
/// rest of its fence line (`sql title=x.sql`); a one-line block keeps the text
/// after the tag.
const SQL_BLOCK_PATTERN: &str = r"(?is)```[ \t]*sql\b(?:[^`\n]*\n(.*?)|[ \t]*([^\n]*?))```";

fn sql_block() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(SQL_BLOCK_PATTERN).expect("SQL block pattern is valid"))
}

/// Extract the first fenced SQL block from `text`, trimmed
///
/// Returns `None` when there is no such block or its body is blank.
#[must_use]
pub fn extract_sql(text: &str) -> Option<String> {
    let captures = sql_block().captures(text)?;
    let body = captures.get(1).or_else(|| captures.get(2))?.as_str().trim();
    (!body.is_empty()).then(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_block() {
        let text = "Here you go:\n```sql\nSELECT id, name\nFROM public.users\nWHERE active;\n```\nEnjoy.";
        assert_eq!(
            extract_sql(text).as_deref(),
            Some("SELECT id, name\nFROM public.users\nWHERE active;")
        );
    }

    #[test]
    fn test_no_block() {
        assert_eq!(extract_sql("I am not sure which table holds that."), None);
        assert_eq!(extract_sql(""), None);
    }

    #[test]
    fn test_only_first_block_is_kept() {
        let text = "First:\n```sql\nSELECT 1;\n```\nOr:\n```sql\nSELECT 2;\n```";
        assert_eq!(extract_sql(text).as_deref(), Some("SELECT 1;"));
    }

    #[test]
    fn test_other_languages_are_ignored() {
        let text = "```python\nprint('hi')\n```\n```sqlite\nSELECT 3;\n```";
        assert_eq!(extract_sql(text), None);

        let text = "```python\nprint('hi')\n```\nthen\n```sql\nSELECT 4;\n```";
        assert_eq!(extract_sql(text).as_deref(), Some("SELECT 4;"));
    }

    #[test]
    fn test_untagged_block_is_ignored() {
        assert_eq!(extract_sql("```\nSELECT 5;\n```"), None);
    }

    #[test]
    fn test_tag_is_case_insensitive() {
        assert_eq!(extract_sql("```SQL\nselect now()\n```").as_deref(), Some("select now()"));
    }

    #[test]
    fn test_inline_block() {
        assert_eq!(extract_sql("```sql SELECT 6```").as_deref(), Some("SELECT 6"));
    }

    #[test]
    fn test_fence_info_string_is_dropped() {
        let text = "```sql title=report.sql\nSELECT 1;\n```";
        assert_eq!(extract_sql(text).as_deref(), Some("SELECT 1;"));
    }

    #[test]
    fn test_inline_block_before_later_text() {
        let text = "Try ```sql SELECT 8``` first.\nOr:\n```sql\nSELECT 9;\n```";
        assert_eq!(extract_sql(text).as_deref(), Some("SELECT 8"));
    }

    #[test]
    fn test_blank_block() {
        assert_eq!(extract_sql("```sql\n   \n```"), None);
    }

    #[test]
    fn test_unterminated_block() {
        assert_eq!(extract_sql("```sql\nSELECT 7;"), None);
    }
}
