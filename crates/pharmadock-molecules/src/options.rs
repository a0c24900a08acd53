//! Vina command-line options chosen in conversation.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockingOptions {
    #[serde(default)]
    pub box_enveloping: bool,
    pub box_size: Option<String>,
    pub box_center: Option<String>,
    pub padding: Option<String>,
    pub exhaustiveness: Option<String>,
    pub scoring: Option<String>,
}

/// `"10, 20,15"` → `"10 20 15"`.
fn normalize_vector(raw: &str) -> String {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl DockingOptions {
    pub fn enveloping() -> Self {
        Self { box_enveloping: true, ..Self::default() }
    }

    /// Arguments appended after `vina <receptor> <ligand>`.
    ///
    /// `--box_enveloping` alone when requested. Otherwise the given values in
    /// a fixed order, with `--box_enveloping` added whenever no box centre
    /// was given.
    pub fn to_args(&self) -> Vec<String> {
        if self.box_enveloping {
            return vec!["--box_enveloping".to_string()];
        }

        let mut args = Vec::new();
        if let Some(size) = present(&self.box_size) {
            args.push("--box_size".to_string());
            args.extend(normalize_vector(size).split(' ').map(str::to_string));
        }
        let center = present(&self.box_center);
        if let Some(center) = center {
            args.push("--box_center".to_string());
            args.extend(normalize_vector(center).split(' ').map(str::to_string));
        }
        for (flag, value) in [
            ("--padding", &self.padding),
            ("--exhaustiveness", &self.exhaustiveness),
            ("--scoring", &self.scoring),
        ] {
            if let Some(v) = present(value) {
                args.push(flag.to_string());
                args.push(v.to_string());
            }
        }
        if center.is_none() {
            args.push("--box_enveloping".to_string());
        }
        args
    }

    pub fn as_command_string(&self) -> String {
        self.to_args().join(" ")
    }

    /// Suffix distinguishing result files of different option sets:
    /// spaces become `_`, `-` is dropped and `=` becomes `_`.
    pub fn result_suffix(&self) -> String {
        let options = self.as_command_string();
        if options.is_empty() {
            return String::new();
        }
        format!("_{}", options.replace(' ', "_").replace('-', "").replace('=', "_"))
    }
}

impl fmt::Display for DockingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_command_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn opt(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_enveloping_wins_alone() {
        let o = DockingOptions {
            box_enveloping: true,
            box_size: opt("10 10 10"),
            padding: opt("4"),
            ..Default::default()
        };
        assert_eq!(o.to_args(), vec!["--box_enveloping"]);
    }

    #[test]
    fn test_fixed_order_with_center() {
        let o = DockingOptions {
            scoring: opt("vina"),
            exhaustiveness: opt("8"),
            box_center: opt("5.2, -3.1, 8.7"),
            box_size: opt("10,20,15"),
            ..Default::default()
        };
        assert_eq!(
            o.as_command_string(),
            "--box_size 10 20 15 --box_center 5.2 -3.1 8.7 --exhaustiveness 8 --scoring vina"
        );
    }

    #[test]
    fn test_enveloping_appended_without_center() {
        let o = DockingOptions { padding: opt("4.0"), ..Default::default() };
        assert_eq!(o.to_args(), vec!["--padding", "4.0", "--box_enveloping"]);
        assert_eq!(DockingOptions::default().to_args(), vec!["--box_enveloping"]);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let o = DockingOptions { scoring: opt("  "), box_center: opt(""), ..Default::default() };
        assert_eq!(o.as_command_string(), "--box_enveloping");
    }

    #[test]
    fn test_result_suffix() {
        let o = DockingOptions { padding: opt("4.0"), scoring: opt("ad4"), ..Default::default() };
        assert_eq!(o.result_suffix(), "_padding_4.0_scoring_ad4_box_enveloping");
        assert_eq!(DockingOptions::enveloping().result_suffix(), "_box_enveloping");
    }
}
