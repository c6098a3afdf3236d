//! Shared CLI helpers.

pub mod logging;

use std::path::PathBuf;

/// Split a comma-separated path argument into individual paths.
#[must_use]
pub fn split_input_paths(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_commas_and_trims() {
        let paths = split_input_paths("a.md, docs/b.md ,c.md");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("a.md"),
                PathBuf::from("docs/b.md"),
                PathBuf::from("c.md"),
            ]
        );
    }

    #[test]
    fn single_path_passes_through() {
        assert_eq!(split_input_paths("README.md"), vec![PathBuf::from("README.md")]);
    }

    #[test]
    fn empty_segments_are_dropped() {
        assert_eq!(split_input_paths("a.md,,b.md,"), vec![
            PathBuf::from("a.md"),
            PathBuf::from("b.md"),
        ]);
    }
}
