use std::{fs, path::Path};

use anyhow::{Context, Result};

/// Load a newline-separated label file. Missing or unreadable files are
/// startup failures; a model without its labels is useless.
pub(crate) fn read_labels(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read labels file {}", path.display()))?;
    Ok(parse_labels(&contents))
}

pub(crate) fn parse_labels(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_labels;

    #[test]
    fn parses_one_label_per_line() {
        let labels = parse_labels("person\nbicycle\ncar\n");
        assert_eq!(labels, vec!["person", "bicycle", "car"]);
    }

    #[test]
    fn keeps_blank_lines_as_placeholder_entries() {
        // Detection label files index by class id; a gap in the file is a
        // real (unnamed) class slot and must not shift later ids.
        let labels = parse_labels("person\n\ncar");
        assert_eq!(labels, vec!["person", "", "car"]);
    }

    #[test]
    fn strips_carriage_returns() {
        let labels = parse_labels("person\r\ncar\r\n");
        assert_eq!(labels, vec!["person", "car"]);
    }
}
