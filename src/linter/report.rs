//! Plain-text report rendering
//!
//! Truncation only shortens what is printed; it never looks at or changes a status.

use crate::checks::{Check, Status};

use super::ReportHeader;

/// Counts of final statuses across one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusSummary {
    pub green: usize,
    pub yellow: usize,
    pub red: usize,
    pub gray: usize,
}

impl StatusSummary {
    pub fn from_checks(checks: &[Box<dyn Check>]) -> Self {
        let mut summary = Self::default();
        for check in checks {
            match check.status() {
                Status::Green => summary.green += 1,
                Status::Yellow => summary.yellow += 1,
                Status::Red => summary.red += 1,
                Status::Gray => summary.gray += 1,
            }
        }
        summary
    }
}

impl std::fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Summary: {} {} passed, {} {} with warnings, {} {} failed",
            Status::Green.icon(),
            self.green,
            Status::Yellow.icon(),
            self.yellow,
            Status::Red.icon(),
            self.red
        )
    }
}

/// Keep `max_lines` lines of `block` around an elision marker: the head gets the
/// odd line, so the check's name line always survives
pub fn truncate_block(block: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = block.lines().collect();
    if max_lines == 0 || lines.len() <= max_lines {
        return block.to_string();
    }

    let head = max_lines.div_ceil(2);
    let tail = max_lines / 2;
    let hidden = lines.len() - head - tail;

    let mut kept: Vec<String> = lines[..head].iter().map(|line| line.to_string()).collect();
    kept.push(format!("... {hidden} lines hidden ..."));
    kept.extend(lines[lines.len() - tail..].iter().map(|line| line.to_string()));
    kept.join("\n")
}

pub fn render(header: &ReportHeader, checks: &[Box<dyn Check>], max_lines: Option<usize>) -> String {
    let mut sections = vec![header.to_string()];

    for check in checks {
        let block = check.render();
        sections.push(match max_lines {
            Some(limit) => truncate_block(&block, limit),
            None => block,
        });
    }

    sections.push(StatusSummary::from_checks(checks).to_string());
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_block_is_untouched() {
        let block = "one\ntwo\nthree";
        assert_eq!(truncate_block(block, 10), block);
        assert_eq!(truncate_block(block, 3), block);
    }

    #[test]
    fn test_long_block_keeps_head_and_tail() {
        let block: String = (1..=20).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n");

        let truncated = truncate_block(&block, 10);
        let lines: Vec<&str> = truncated.lines().collect();

        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "line 1");
        assert_eq!(lines[4], "line 5");
        assert_eq!(lines[5], "... 10 lines hidden ...");
        assert_eq!(lines[6], "line 16");
        assert_eq!(lines[10], "line 20");
    }

    #[test]
    fn test_odd_limit_gives_head_the_extra_line() {
        let block: String = (1..=9).map(|n| n.to_string()).collect::<Vec<_>>().join("\n");
        assert_eq!(truncate_block(&block, 5), "1\n2\n3\n... 4 lines hidden ...\n8\n9");
    }

    #[test]
    fn test_limit_of_one_keeps_name_line() {
        let block = "✅   README exists\ndetail one\ndetail two";
        assert_eq!(truncate_block(block, 1), "✅   README exists\n... 2 lines hidden ...");
    }

    #[test]
    fn test_zero_limit_disables_truncation() {
        let block = "a\nb\nc";
        assert_eq!(truncate_block(block, 0), block);
    }
}
