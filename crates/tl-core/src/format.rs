//! Plain-text rendering of status reports and news, and packing of that text
//! into transport-sized segments.

use std::fmt::Write;

use crate::scrape::{Article, Region, RegionSnapshot, ServerStatus, StatusReport};

/// Per-message limit of the notification transport, in characters.
pub const MAX_SEGMENT_LEN: usize = 2000;

const OPERATIONAL_HEADER: &str = "🟢 **Operational**";
const MAINTENANCE_HEADER: &str = "🔵 **Maintenance**";
const OTHER_HEADER: &str = "⚪ **Other (Busy, Full, Unknown)**";

pub fn format_status(report: &StatusReport) -> String {
    if report.is_empty() {
        return "No server status data available.".to_string();
    }
    report
        .iter()
        .map(|(region, snapshot)| format_region(*region, snapshot))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One region: header, then operational / maintenance / other buckets.
/// Empty buckets are left out.
pub fn format_region(region: Region, snapshot: &RegionSnapshot) -> String {
    let mut out = format!("**Region:** {}\n", region.key().to_uppercase());
    if snapshot.servers.is_empty() {
        out.push_str("\nNo servers listed.");
        return out;
    }

    let buckets: [(&str, fn(ServerStatus) -> bool); 3] = [
        (OPERATIONAL_HEADER, |s: ServerStatus| s == ServerStatus::Good),
        (MAINTENANCE_HEADER, |s: ServerStatus| s == ServerStatus::InMaintenance),
        (OTHER_HEADER, |s: ServerStatus| {
            !matches!(s, ServerStatus::Good | ServerStatus::InMaintenance)
        }),
    ];

    for (header, belongs) in buckets {
        let mut servers = snapshot.servers.iter().filter(|s| belongs(s.status)).peekable();
        if servers.peek().is_none() {
            continue;
        }
        let _ = write!(out, "\n{}", header);
        for server in servers {
            let _ = write!(out, "\n- **{}**: {}", server.name, server.status);
        }
    }

    out
}

/// Message sent by the monitor after a scheduled check.
pub fn format_check(region: Region, snapshot: &RegionSnapshot) -> String {
    let mut out = format!("**Region:** {}\n", region.key().to_uppercase());

    for server in &snapshot.servers {
        let line = match server.status {
            ServerStatus::Good => format!("___{}___: {}.", server.name, server.status),
            ServerStatus::InMaintenance => format!("___{}___: {}", server.name, server.status),
            other => format!("___{}___ is experiencing issues. Status: {}", server.name, other),
        };
        let _ = write!(out, "\n{}", line);
    }

    if snapshot.all_good() {
        out.push_str("\n\n✅ All servers are in good condition.");
    } else {
        out.push_str("\n\n⚠️ Some servers are not in good condition. Monitoring continues.");
    }
    out
}

pub fn format_articles(articles: &[Article]) -> String {
    if articles.is_empty() {
        return "No articles found.".to_string();
    }
    articles
        .iter()
        .enumerate()
        .map(|(i, a)| {
            format!(
                "{}. **{}** [{}]\n{}\n{}",
                i + 1,
                a.title,
                a.category,
                a.description,
                a.link
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Greedy word packer.
///
/// Words are appended to the running segment while it stays within
/// `max_len` characters (counting the joining separator); an overflowing word
/// opens a new segment. A separator is a newline when the source had a line
/// break there and a single space otherwise, so joining the segments with
/// single spaces yields the source's word sequence. A word longer than
/// `max_len` on its own is cut into `max_len`-sized pieces.
pub fn split_for_transport(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for (line_break, word) in words(text) {
        for piece in chunk_word(word, max_len) {
            let piece_len = piece.chars().count();
            if current.is_empty() {
                current.push_str(piece);
                current_len = piece_len;
            } else if current_len + 1 + piece_len <= max_len {
                current.push(if line_break { '\n' } else { ' ' });
                current.push_str(piece);
                current_len += 1 + piece_len;
            } else {
                segments.push(std::mem::take(&mut current));
                current.push_str(piece);
                current_len = piece_len;
            }
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Whitespace-delimited words, each flagged when a line break precedes it.
fn words(text: &str) -> impl Iterator<Item = (bool, &str)> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .flat_map(|(line_no, line)| {
            line.split_whitespace()
                .enumerate()
                .map(move |(i, word)| (line_no > 0 && i == 0, word))
        })
}

fn chunk_word(word: &str, max_len: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (count, (idx, _)) in word.char_indices().enumerate() {
        if count > 0 && count % max_len == 0 {
            pieces.push(&word[start..idx]);
            start = idx;
        }
    }
    pieces.push(&word[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::scrape::ServerEntry;

    fn snapshot(servers: &[(&str, ServerStatus)]) -> RegionSnapshot {
        RegionSnapshot {
            servers: servers
                .iter()
                .map(|(name, status)| ServerEntry {
                    name: name.to_string(),
                    status: *status,
                })
                .collect(),
            observed_at: Utc::now(),
        }
    }

    fn words_of(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    #[test]
    fn region_groups_into_buckets() {
        let snap = snapshot(&[
            ("Server-A", ServerStatus::Good),
            ("Server-B", ServerStatus::InMaintenance),
            ("Server-C", ServerStatus::Full),
        ]);
        let text = format_region(Region::Europe, &snap);
        assert_eq!(
            text,
            "**Region:** EUROPE\n\
             \n🟢 **Operational**\n- **Server-A**: 🟢 Good\
             \n🔵 **Maintenance**\n- **Server-B**: 🔵 In Maintenance\
             \n⚪ **Other (Busy, Full, Unknown)**\n- **Server-C**: 🔴 Full"
        );
    }

    #[test]
    fn empty_buckets_are_omitted() {
        let snap = snapshot(&[("Only", ServerStatus::Good)]);
        let text = format_region(Region::Asia, &snap);
        assert!(text.contains(OPERATIONAL_HEADER));
        assert!(!text.contains(MAINTENANCE_HEADER));
        assert!(!text.contains(OTHER_HEADER));
    }

    #[test]
    fn other_bucket_collects_busy_full_unknown() {
        let snap = snapshot(&[
            ("B", ServerStatus::Busy),
            ("F", ServerStatus::Full),
            ("U", ServerStatus::Unknown),
        ]);
        let text = format_region(Region::Japan, &snap);
        let other = text.split(OTHER_HEADER).nth(1).unwrap();
        assert!(other.contains("**B**") && other.contains("**F**") && other.contains("**U**"));
        assert!(!text.contains(OPERATIONAL_HEADER));
    }

    #[test]
    fn status_joins_regions_in_order() {
        let mut report = StatusReport::new();
        report.insert(Region::Japan, snapshot(&[("J", ServerStatus::Good)]));
        report.insert(Region::Europe, snapshot(&[("E", ServerStatus::Good)]));
        let text = format_status(&report);
        let europe = text.find("EUROPE").unwrap();
        let japan = text.find("JAPAN").unwrap();
        assert!(europe < japan);
    }

    #[test]
    fn empty_report_has_fallback() {
        assert_eq!(format_status(&StatusReport::new()), "No server status data available.");
    }

    #[test]
    fn check_message_all_clear() {
        let snap = snapshot(&[("A", ServerStatus::Good), ("B", ServerStatus::Good)]);
        let text = format_check(Region::Europe, &snap);
        assert!(text.contains("___A___: 🟢 Good."));
        assert!(text.ends_with("✅ All servers are in good condition."));
    }

    #[test]
    fn check_message_reports_problems() {
        let snap = snapshot(&[
            ("A", ServerStatus::Good),
            ("B", ServerStatus::InMaintenance),
            ("C", ServerStatus::Full),
        ]);
        let text = format_check(Region::Europe, &snap);
        assert!(text.contains("___A___: 🟢 Good."));
        assert!(text.contains("___B___: 🔵 In Maintenance"));
        assert!(text.contains("___C___ is experiencing issues. Status: 🔴 Full"));
        assert!(text.contains("⚠️ Some servers are not in good condition."));
    }

    #[test]
    fn articles_are_numbered() {
        let articles = vec![Article {
            link: "https://example.com/a".into(),
            title: "Patch".into(),
            category: "Updates".into(),
            description: "Fixes".into(),
        }];
        assert_eq!(
            format_articles(&articles),
            "1. **Patch** [Updates]\nFixes\nhttps://example.com/a"
        );
        assert_eq!(format_articles(&[]), "No articles found.");
    }

    #[test]
    fn short_text_is_one_segment() {
        assert_eq!(split_for_transport("hello  world", 2000), vec!["hello world"]);
    }

    #[test]
    fn empty_text_has_no_segments() {
        assert!(split_for_transport("   \n ", 10).is_empty());
    }

    #[test]
    fn segments_respect_limit_and_keep_words() {
        let text = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod tempor";
        for max_len in [11, 12, 20, 33] {
            let segments = split_for_transport(text, max_len);
            assert!(segments.iter().all(|s| s.chars().count() <= max_len), "{max_len}: {segments:?}");
            assert_eq!(words_of(&segments.join(" ")), words_of(text));
        }
    }

    #[test]
    fn exact_fit_stays_in_one_segment() {
        // "aaaa bbbb" is exactly 9 characters.
        assert_eq!(split_for_transport("aaaa bbbb cc", 9), vec!["aaaa bbbb", "cc"]);
    }

    #[test]
    fn line_breaks_survive_inside_a_segment() {
        let segments = split_for_transport("**Region:** EUROPE\n\n- a\n- b", 2000);
        assert_eq!(segments, vec!["**Region:** EUROPE\n- a\n- b"]);
    }

    #[test]
    fn multibyte_characters_count_once() {
        let text = "🟢 🟢 🟢";
        assert_eq!(split_for_transport(text, 5), vec!["🟢 🟢 🟢"]);
        assert_eq!(split_for_transport(text, 3), vec!["🟢 🟢", "🟢"]);
    }

    #[test]
    fn oversized_word_is_cut() {
        let segments = split_for_transport("abcdefghij xy", 4);
        assert_eq!(segments, vec!["abcd", "efgh", "ij", "xy"]);
        assert!(segments.iter().all(|s| s.chars().count() <= 4));
    }

    #[test]
    fn long_report_splits_under_transport_limit() {
        let snap = RegionSnapshot {
            servers: (0..400)
                .map(|i| ServerEntry {
                    name: format!("Server-{i:03}"),
                    status: ServerStatus::Busy,
                })
                .collect(),
            observed_at: Utc::now(),
        };
        let text = format_region(Region::America, &snap);
        let segments = split_for_transport(&text, MAX_SEGMENT_LEN);
        assert!(segments.len() > 1);
        assert!(segments.iter().all(|s| s.chars().count() <= MAX_SEGMENT_LEN));
        assert_eq!(words_of(&segments.join(" ")), words_of(&text));
    }
}
