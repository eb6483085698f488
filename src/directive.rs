//! Extraction of structured blocks from free-form assistant text.
//!
//! The assistant signals transitions with `<transition>name</transition>`
//! tags, describes follow-up work items in tagged list blocks, and supplies
//! commit messages in `<commit-message>` blocks. The root work item carries
//! its plan in a `## Plan` markdown section. All of this is plain line-based
//! parsing; the engine consumes the results and never touches raw text.

/// A work item parsed from a plan or findings list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItemSpec {
    pub title: String,
    pub description: String,
    /// Whether the item should be implemented test-first. Defaults to true.
    pub tdd: bool,
}

/// The last `<transition>…</transition>` tag in the text, if any.
///
/// Later tags win: earlier occurrences are frequently quotes or examples in
/// the surrounding prose.
pub fn last_directive(text: &str) -> Option<String> {
    blocks(text, "transition")
        .last()
        .map(|body| body.trim().to_string())
}

/// Parse the item list inside the last `<tag>…</tag>` block.
///
/// Returns `Ok(None)` when no such block exists, `Err` with a line-numbered
/// message when the block is malformed.
pub fn parse_item_block(text: &str, tag: &str) -> Result<Option<Vec<WorkItemSpec>>, String> {
    match blocks(text, tag).last() {
        Some(body) => parse_items(body).map(Some),
        None => Ok(None),
    }
}

/// Parse the work-item list under the `## Plan` heading of the root item body.
///
/// A missing section or a section with no list parses as an empty list; the
/// caller decides whether that is acceptable for the current state.
pub fn parse_plan_section(root_text: &str) -> Result<Vec<WorkItemSpec>, String> {
    let mut section = String::new();
    let mut in_plan = false;
    for line in root_text.lines() {
        let heading = line.trim_start();
        if heading.starts_with("## ") {
            in_plan = heading.trim_start_matches("## ").trim() == "Plan";
            continue;
        }
        if in_plan {
            section.push_str(line);
            section.push('\n');
        }
    }

    // Prose is allowed around the list: it starts at the first "- " line and
    // ends at the first unindented line that is not an item (e.g. a trailing
    // "Fixes:" line). The list itself must be well-formed.
    let list_start = match section.lines().position(|l| l.trim_start().starts_with("- ")) {
        Some(pos) => pos,
        None => return Ok(Vec::new()),
    };
    let mut list = String::new();
    for line in section.lines().skip(list_start) {
        let in_list =
            line.trim().is_empty() || line.trim_start().starts_with("- ") || line.starts_with("  ");
        if !in_list {
            break;
        }
        list.push_str(line);
        list.push('\n');
    }
    parse_items(&list)
}

/// The commit message from the last `<commit-message>` block, if present and
/// non-empty.
pub fn commit_message(text: &str) -> Option<String> {
    blocks(text, "commit-message")
        .last()
        .map(|body| body.trim().to_string())
        .filter(|m| !m.is_empty())
}

/// The `Fixes:` trailer line from the root item body, if present.
pub fn fixes_trailer(root_text: &str) -> Option<String> {
    root_text
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("Fixes:") && !l.trim_start_matches("Fixes:").trim().is_empty())
        .next_back()
        .map(str::to_string)
}

/// All `<tag>…</tag>` block bodies in order of appearance.
fn blocks<'a>(text: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(&open) {
        let after_open = &rest[start + open.len()..];
        match after_open.find(&close) {
            Some(end) => {
                found.push(&after_open[..end]);
                rest = &after_open[end + close.len()..];
            }
            None => break, // unterminated block: ignore
        }
    }
    found
}

/// Parse a YAML-style item list:
///
/// ```text
/// - title: Extract the parser
///   description: Pull parsing out of main
///   tdd: false
/// - title: Wire up the CLI
/// ```
///
/// `title` is required and non-empty; `description` defaults to empty and
/// `tdd` to true. Unknown keys and stray lines are errors so malformed blocks
/// fail loudly instead of silently dropping content.
fn parse_items(body: &str) -> Result<Vec<WorkItemSpec>, String> {
    let mut items: Vec<WorkItemSpec> = Vec::new();

    for (idx, raw) in body.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        if let Some(rest) = line.trim_start().strip_prefix("- ") {
            let title = rest
                .strip_prefix("title:")
                .ok_or_else(|| format!("line {lineno}: work item must start with 'title:'"))?
                .trim();
            if title.is_empty() {
                return Err(format!("line {lineno}: work item title must not be empty"));
            }
            items.push(WorkItemSpec {
                title: title.to_string(),
                description: String::new(),
                tdd: true,
            });
            continue;
        }

        // Indented key line attaching to the current item.
        let current = items
            .last_mut()
            .ok_or_else(|| format!("line {lineno}: expected '- title:' item"))?;
        let (key, value) = line
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("line {lineno}: expected 'key: value'"))?;
        let value = value.trim();
        match key.trim() {
            "description" => current.description = value.to_string(),
            "tdd" => {
                current.tdd = value
                    .parse::<bool>()
                    .map_err(|_| format!("line {lineno}: tdd must be 'true' or 'false'"))?;
            }
            other => return Err(format!("line {lineno}: unknown work item key '{other}'")),
        }
    }

    Ok(items)
}
