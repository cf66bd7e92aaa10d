//! Helpers for pulling typed state out of free-form CLI output.
//!
//! Everything here is pure and never panics on odd input: a layout that does
//! not fit simply yields `None` and the next one is tried.

use std::fmt::Debug;
use std::str::FromStr;

use log::trace;
use regex::Regex;

/// One known shape of command output and how to extract a value from it.
pub struct Layout<T> {
    pub name: &'static str,
    pub extract: fn(output: &str, port: &str) -> Option<T>,
}

/// Tries `layouts` in order and returns the first value extracted.
pub fn first_match<T: Debug>(layouts: &[Layout<T>], output: &str, port: &str) -> Option<T> {
    layouts.iter().find_map(|layout| {
        let value = (layout.extract)(output, port)?;
        trace!("Layout '{}' matched port {}: {:?}", layout.name, port, value);
        Some(value)
    })
}

/// Whitespace-separated tokens of the first line whose first token is
/// `port`.
pub fn port_row<'t>(output: &'t str, port: &str) -> Option<Vec<&'t str>> {
    output
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .find(|tokens| tokens.first() == Some(&port))
}

/// Token of a table cell, located by the column header's position.
///
/// Only usable when every column before `header` is a single token wide in
/// both the header line and the row.
pub fn column<'t>(output: &'t str, port: &str, header: &str) -> Option<&'t str> {
    let index = output.lines().find_map(|line| {
        let tokens: Vec<_> = line.split_whitespace().collect();
        if tokens.first()?.eq_ignore_ascii_case("port") {
            tokens.iter().position(|t| t.eq_ignore_ascii_case(header))
        } else {
            None
        }
    })?;

    port_row(output, port)?.get(index).copied()
}

/// The block of lines describing `port` when `output` holds one
/// `Port <id> ...` section per port, otherwise the whole output.
///
/// Returns an empty slice when sections exist but none is for `port`.
pub fn port_section<'t>(output: &'t str, port: &str) -> &'t str {
    let is_header = |line: &str| {
        let mut tokens = line.split_whitespace();
        tokens.next() == Some("Port")
            && tokens
                .next()
                .is_some_and(|id| id.starts_with(|c: char| c.is_ascii_digit()))
    };
    let is_ours = |line: &str| {
        let mut tokens = line.split_whitespace();
        tokens.next() == Some("Port") && tokens.next() == Some(port)
    };

    let mut start = None;
    let mut offset = 0;

    for line in output.split_inclusive('\n') {
        match start {
            None if is_ours(line) => start = Some(offset),
            Some(begin) if is_header(line) && !is_ours(line) => {
                return &output[begin..offset];
            }
            _ => {}
        }
        offset += line.len();
    }

    match start {
        Some(begin) => &output[begin..],
        None if output.lines().any(is_header) => "",
        None => output,
    }
}

/// First capture group of `re` in `output`, parsed as `T`.
pub fn capture<T: FromStr>(re: &Regex, output: &str) -> Option<T> {
    re.captures(output)?.get(1)?.as_str().parse().ok()
}

/// Group `value` of the first match of `re` whose group `port` is `port`,
/// parsed as `T`.
pub fn capture_for_port<T: FromStr>(re: &Regex, output: &str, port: &str) -> Option<T> {
    re.captures_iter(output)
        .find(|caps| caps.name("port").is_some_and(|m| m.as_str() == port))?
        .name("value")?
        .as_str()
        .parse()
        .ok()
}

/// Case-insensitive check for any of `markers` in `output`.
pub fn contains_any(output: &str, markers: &[&str]) -> bool {
    let output = output.to_ascii_lowercase();
    markers
        .iter()
        .any(|marker| output.contains(&marker.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRIEF: &str = "\
Port       Link    State   Dupl Speed Trunk Tag Pvid Pri MAC             Name
1/1/1      Up      Forward Full 1G    None  No  100  0   cc4e.246d.7a10
1/1/10     Disable None    None None  None  No  1    0   cc4e.246d.7a19
";

    #[test]
    fn test_port_row_exact_token() {
        let row = port_row(BRIEF, "1/1/1").unwrap();
        assert_eq!(row[1], "Up");

        let row = port_row(BRIEF, "1/1/10").unwrap();
        assert_eq!(row[1], "Disable");

        assert!(port_row(BRIEF, "1/1/9").is_none());
    }

    #[test]
    fn test_column_by_header() {
        assert_eq!(column(BRIEF, "1/1/1", "Pvid"), Some("100"));
        assert_eq!(column(BRIEF, "1/1/10", "pvid"), Some("1"));
        assert_eq!(column(BRIEF, "1/1/1", "Nope"), None);
        assert_eq!(column("no table here", "1/1/1", "Pvid"), None);
    }

    #[test]
    fn test_port_section() {
        let output = "\
Port 1/1/1 is a member of 1 VLANs
Untagged VLAN : 100
Port 1/1/2 is a member of 1 VLANs
Untagged VLAN : 200
";
        assert_eq!(
            port_section(output, "1/1/2"),
            "Port 1/1/2 is a member of 1 VLANs\nUntagged VLAN : 200\n"
        );
        assert!(port_section(output, "1/1/1").contains("100"));
        assert!(!port_section(output, "1/1/1").contains("200"));
        assert_eq!(port_section(output, "1/1/3"), "");
        assert_eq!(port_section("Untagged VLAN : 5", "1/1/1"), "Untagged VLAN : 5");
    }

    #[test]
    fn test_first_match_priority() {
        let layouts = [
            Layout {
                name: "never",
                extract: |_, _| None::<u16>,
            },
            Layout {
                name: "first",
                extract: |_, _| Some(1),
            },
            Layout {
                name: "second",
                extract: |_, _| Some(2),
            },
        ];

        assert_eq!(first_match(&layouts, "", "1/1/1"), Some(1));
        assert_eq!(first_match(&layouts[..1], "", "1/1/1"), None);
    }

    #[test]
    fn test_capture_and_markers() {
        let re = Regex::new(r"VLAN (\d+)").unwrap();
        assert_eq!(capture::<u16>(&re, "in VLAN 42"), Some(42));
        assert_eq!(capture::<u16>(&re, "in VLAN 99999"), None);

        assert!(contains_any("% INVALID INPUT -> foo", &["Invalid input"]));
        assert!(!contains_any("all good", &["Invalid input"]));
    }

    #[test]
    fn test_capture_for_port() {
        let re = Regex::new(r"Port (?P<port>\S+) Link: (?P<value>\S+)").unwrap();
        let output = "Port 1/1/10 Link: Down\nPort 1/1/1 Link: Up\n";

        assert_eq!(capture_for_port::<String>(&re, output, "1/1/1").as_deref(), Some("Up"));
        assert_eq!(capture_for_port::<String>(&re, output, "1/1/10").as_deref(), Some("Down"));
        assert_eq!(capture_for_port::<String>(&re, output, "1/1/2"), None);
    }
}
