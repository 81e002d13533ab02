//! Change-log synthesis — a line-level diff of the source résumé against the tailored one.
//!
//! Only used when the rewrite response left its "What changed" section empty.

use std::collections::HashSet;

/// Maximum number of synthesized change entries.
pub const CHANGE_CAP: usize = 6;

/// Beyond this many LCS cells the diff degrades to set membership.
const MAX_LCS_CELLS: usize = 250_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineChange {
    Added(String),
    Removed(String),
}

impl LineChange {
    pub fn describe(&self) -> String {
        match self {
            LineChange::Added(line) => format!("Added: {line}"),
            LineChange::Removed(line) => format!("Removed: {line}"),
        }
    }
}

fn content_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Diffs trimmed non-empty lines, in document order, up to [`CHANGE_CAP`] entries.
/// Identical documents produce an empty list.
pub fn synthesize_changes(before: &str, after: &str) -> Vec<LineChange> {
    let before = content_lines(before);
    let after = content_lines(after);

    // Common prefix and suffix never show up in the diff.
    let prefix = before
        .iter()
        .zip(&after)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = before[prefix..]
        .iter()
        .rev()
        .zip(after[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old = &before[prefix..before.len() - suffix];
    let new = &after[prefix..after.len() - suffix];

    let mut changes = if old.len().saturating_mul(new.len()) <= MAX_LCS_CELLS {
        lcs_diff(old, new)
    } else {
        membership_diff(old, new)
    };
    changes.truncate(CHANGE_CAP);
    changes
}

fn lcs_diff(old: &[&str], new: &[&str]) -> Vec<LineChange> {
    let (n, m) = (old.len(), new.len());
    // table[i][j] = LCS length of old[i..] and new[j..]
    let mut table = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if old[i] == new[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut changes = Vec::new();
    let (mut i, mut j) = (0, 0);
    while (i < n || j < m) && changes.len() < CHANGE_CAP {
        if i < n && j < m && old[i] == new[j] {
            i += 1;
            j += 1;
        } else if j == m || (i < n && table[i + 1][j] >= table[i][j + 1]) {
            changes.push(LineChange::Removed(old[i].to_string()));
            i += 1;
        } else {
            changes.push(LineChange::Added(new[j].to_string()));
            j += 1;
        }
    }
    changes
}

fn membership_diff(old: &[&str], new: &[&str]) -> Vec<LineChange> {
    let old_set: HashSet<&str> = old.iter().copied().collect();
    let new_set: HashSet<&str> = new.iter().copied().collect();

    old.iter()
        .filter(|l| !new_set.contains(*l))
        .map(|l| LineChange::Removed(l.to_string()))
        .chain(
            new.iter()
                .filter(|l| !old_set.contains(*l))
                .map(|l| LineChange::Added(l.to_string())),
        )
        .take(CHANGE_CAP)
        .collect()
}

/// Renders changes as a Markdown bullet list.
pub fn to_markup(changes: &[LineChange]) -> String {
    changes
        .iter()
        .map(|c| format!("- {}", c.describe()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_documents_have_no_changes() {
        let text = "Jane Doe\n- Answered phones\n- Filed reports";
        assert!(synthesize_changes(text, text).is_empty());
    }

    #[test]
    fn test_whitespace_only_differences_are_ignored() {
        let before = "Jane Doe\n\n  - Answered phones  ";
        let after = "Jane Doe\n- Answered phones";
        assert!(synthesize_changes(before, after).is_empty());
    }

    #[test]
    fn test_replaced_line_is_removed_then_added() {
        let before = "Jane Doe\n- Answered phones\n- Filed reports";
        let after = "Jane Doe\n- Answered a 6-line phone system\n- Filed reports";
        assert_eq!(
            synthesize_changes(before, after),
            vec![
                LineChange::Removed("- Answered phones".to_string()),
                LineChange::Added("- Answered a 6-line phone system".to_string()),
            ]
        );
    }

    #[test]
    fn test_inserted_summary_is_added() {
        let before = "Jane Doe\n- Filed reports";
        let after = "**Summary**\nOrganized office professional.\nJane Doe\n- Filed reports";
        assert_eq!(
            synthesize_changes(before, after),
            vec![
                LineChange::Added("**Summary**".to_string()),
                LineChange::Added("Organized office professional.".to_string()),
            ]
        );
    }

    #[test]
    fn test_changes_are_capped() {
        let before = (0..10).map(|i| format!("old {i}")).collect::<Vec<_>>().join("\n");
        let after = (0..10).map(|i| format!("new {i}")).collect::<Vec<_>>().join("\n");
        assert_eq!(synthesize_changes(&before, &after).len(), CHANGE_CAP);
    }

    #[test]
    fn test_membership_diff_keeps_order() {
        let changes = membership_diff(&["a", "b", "c"], &["b", "d"]);
        assert_eq!(
            changes,
            vec![
                LineChange::Removed("a".to_string()),
                LineChange::Removed("c".to_string()),
                LineChange::Added("d".to_string()),
            ]
        );
    }

    #[test]
    fn test_to_markup_renders_bullets() {
        let changes = vec![
            LineChange::Removed("- Filed reports".to_string()),
            LineChange::Added("- Filed weekly reports".to_string()),
        ];
        assert_eq!(
            to_markup(&changes),
            "- Removed: - Filed reports\n- Added: - Filed weekly reports"
        );
    }
}
