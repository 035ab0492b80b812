//! ui::pr_footer
//!
//! The PR dependency tree appended to pull request descriptions.
//!
//! The footer lists every PR in the branch's stack as a nested bullet list,
//! starting from the stack's root (the branch directly on trunk), with the
//! branch the footer is for marked. It sits between HTML comment markers so
//! it can be regenerated without touching the rest of the description.
//!
//! ```markdown
//! <!-- trellis:pr-tree:start -->
//! #### PR Dependency Tree
//!
//! * **PR #10**
//!   * **PR #11** 👈
//!   * **PR #12**
//!
//! This tree was auto-generated by trellis.
//! <!-- trellis:pr-tree:end -->
//! ```

use thiserror::Error;

use crate::core::types::BranchName;
use crate::engine::StackEngine;

pub const FOOTER_MARKER_START: &str = "<!-- trellis:pr-tree:start -->";
pub const FOOTER_MARKER_END: &str = "<!-- trellis:pr-tree:end -->";
pub const FOOTER_HEADING: &str = "#### PR Dependency Tree";
pub const FOOTER_ATTRIBUTION: &str = "This tree was auto-generated by trellis.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FooterError {
    #[error("branch '{0}' has no PR number")]
    MissingPrNumber(BranchName),

    #[error("branch '{0}' is not stacked on trunk")]
    NotInStack(BranchName),
}

/// Render the footer for `branch`.
///
/// `pr_number` stands in for `branch`'s own number when its PR has just been
/// created and the number is not stored yet. Every other branch in the
/// stack must already have one.
pub fn generate_footer(
    engine: &StackEngine,
    branch: &BranchName,
    pr_number: Option<u64>,
    attribution: bool,
) -> Result<String, FooterError> {
    let root = engine
        .stack_root(branch)
        .ok_or_else(|| FooterError::NotInStack(branch.clone()))?;

    let mut lines = vec![
        FOOTER_MARKER_START.to_string(),
        FOOTER_HEADING.to_string(),
        String::new(),
    ];

    for (depth, current) in engine.graph().walk(&root) {
        let stored = engine.get_pr_info(&current).and_then(|pr| pr.number);
        let number = match stored {
            Some(number) => number,
            None if &current == branch => {
                pr_number.ok_or_else(|| FooterError::MissingPrNumber(current.clone()))?
            }
            None => return Err(FooterError::MissingPrNumber(current)),
        };
        let marker = if &current == branch { " 👈" } else { "" };
        lines.push(format!("{}* **PR #{number}**{marker}", "  ".repeat(depth)));
    }

    if attribution {
        lines.push(String::new());
        lines.push(FOOTER_ATTRIBUTION.to_string());
    }
    lines.push(FOOTER_MARKER_END.to_string());

    Ok(lines.join("\n"))
}

/// Put `footer` into a PR description.
///
/// An existing marked section is replaced in place; otherwise the footer is
/// appended after a blank line. Markers inside fenced code blocks are
/// ignored.
///
/// ```
/// use trellis::ui::pr_footer::merge_footer;
///
/// let merged = merge_footer(Some("Adds widgets."), "FOOTER");
/// assert_eq!(merged, "Adds widgets.\n\nFOOTER");
/// assert_eq!(merge_footer(None, "FOOTER"), "FOOTER");
/// ```
pub fn merge_footer(existing_body: Option<&str>, footer: &str) -> String {
    let body = existing_body.unwrap_or("");
    if body.trim().is_empty() {
        return footer.to_string();
    }

    let Some((before, after)) = marker_bounds(body) else {
        return format!("{}\n\n{}", body.trim_end(), footer);
    };

    let before = before.trim_end();
    let after = after.trim_start();
    match (before.is_empty(), after.is_empty()) {
        (true, true) => footer.to_string(),
        (true, false) => format!("{footer}\n\n{after}"),
        (false, true) => format!("{before}\n\n{footer}"),
        (false, false) => format!("{before}\n\n{footer}\n\n{after}"),
    }
}

/// Text before the start marker and after the end marker.
fn marker_bounds(body: &str) -> Option<(&str, &str)> {
    let start = find_outside_fences(body, FOOTER_MARKER_START, 0)?;
    let end = find_outside_fences(body, FOOTER_MARKER_END, start + FOOTER_MARKER_START.len())?;
    Some((&body[..start], &body[end + FOOTER_MARKER_END.len()..]))
}

/// Byte offset of the first `marker` at or after `from` that is not inside
/// a fenced code block.
fn find_outside_fences(text: &str, marker: &str, from: usize) -> Option<usize> {
    let mut in_fence = false;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || offset <= from {
            continue;
        }

        let skip = from.saturating_sub(line_start);
        if let Some(found) = line.get(skip..).and_then(|rest| rest.find(marker)) {
            return Some(line_start + skip + found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ancestry::CommitGraph;
    use crate::core::metadata::{BranchMetadata, InMemoryMetadataStore, PrInfo};
    use crate::core::types::Oid;
    use crate::engine::CacheSeed;

    fn name(s: &str) -> BranchName {
        BranchName::new(s).unwrap()
    }

    fn rev(n: u32) -> Oid {
        Oid::new(format!("{n:040x}")).unwrap()
    }

    fn pr(number: u64) -> Option<PrInfo> {
        Some(PrInfo {
            number: Some(number),
            ..Default::default()
        })
    }

    /// main(1) <- a(2) <- {b(3), c(4)}; x(5) on main without a PR.
    fn engine() -> StackEngine {
        let mut dag = CommitGraph::new();
        dag.add_commit(rev(1), &[]);
        dag.add_commit(rev(2), &[rev(1)]);
        dag.add_commit(rev(3), &[rev(2)]);
        dag.add_commit(rev(4), &[rev(2)]);
        dag.add_commit(rev(5), &[rev(1)]);

        let on = |parent: &str, at: u32| BranchMetadata::default().with_parent(&name(parent), &rev(at));
        let mut store = InMemoryMetadataStore::new();
        store.insert(name("a"), on("main", 1).with_pr_info(pr(10)));
        store.insert(name("b"), on("a", 2).with_pr_info(pr(11)));
        store.insert(name("c"), on("a", 2).with_pr_info(pr(12)));
        store.insert(name("x"), on("main", 1));

        let seed = CacheSeed::new(name("main"))
            .with_branch(name("main"), rev(1))
            .with_branch(name("a"), rev(2))
            .with_branch(name("c"), rev(4))
            .with_branch(name("b"), rev(3))
            .with_branch(name("x"), rev(5));
        StackEngine::load(&seed, &mut store, &dag, None).unwrap()
    }

    #[test]
    fn renders_nested_tree_from_stack_root() {
        let footer = generate_footer(&engine(), &name("b"), None, false).unwrap();
        let expected = [
            FOOTER_MARKER_START,
            FOOTER_HEADING,
            "",
            "* **PR #10**",
            "  * **PR #11** 👈",
            "  * **PR #12**",
            FOOTER_MARKER_END,
        ]
        .join("\n");
        assert_eq!(footer, expected);
    }

    #[test]
    fn attribution_line_is_optional() {
        let footer = generate_footer(&engine(), &name("a"), None, true).unwrap();
        assert!(footer.contains(FOOTER_ATTRIBUTION));
        assert!(footer.contains("* **PR #10** 👈"));
        assert!(footer.ends_with(FOOTER_MARKER_END));
    }

    #[test]
    fn override_fills_only_the_target_branch() {
        let engine = engine();
        let footer = generate_footer(&engine, &name("x"), Some(99), false).unwrap();
        assert!(footer.contains("* **PR #99** 👈"));

        assert_eq!(
            generate_footer(&engine, &name("x"), None, false),
            Err(FooterError::MissingPrNumber(name("x")))
        );
    }

    #[test]
    fn trunk_has_no_stack() {
        assert_eq!(
            generate_footer(&engine(), &name("main"), None, false),
            Err(FooterError::NotInStack(name("main")))
        );
    }

    #[test]
    fn merge_into_empty_body() {
        assert_eq!(merge_footer(Some("  \n"), "F"), "F");
    }

    #[test]
    fn merge_replaces_existing_section() {
        let old = format!("Intro\n\n{FOOTER_MARKER_START}\nold tree\n{FOOTER_MARKER_END}\n\nOutro");
        let new = format!("{FOOTER_MARKER_START}\nnew\n{FOOTER_MARKER_END}");
        assert_eq!(merge_footer(Some(&old), &new), format!("Intro\n\n{new}\n\nOutro"));
    }

    #[test]
    fn merge_replaces_section_at_start() {
        let old = format!("{FOOTER_MARKER_START}\nold\n{FOOTER_MARKER_END}\nAfter");
        assert_eq!(merge_footer(Some(&old), "NEW"), "NEW\n\nAfter");
    }

    #[test]
    fn markers_in_code_fences_are_ignored() {
        let old = format!("Docs:\n```\n{FOOTER_MARKER_START}\n{FOOTER_MARKER_END}\n```");
        let merged = merge_footer(Some(&old), "NEW");
        assert_eq!(merged, format!("{old}\n\nNEW"));
    }

    #[test]
    fn unterminated_section_appends() {
        let old = format!("Body\n{FOOTER_MARKER_START}\nno end");
        assert_eq!(merge_footer(Some(&old), "NEW"), format!("{old}\n\nNEW"));
    }
}
