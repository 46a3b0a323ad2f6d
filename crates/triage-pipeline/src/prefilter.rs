//! Log pre-filter
//!
//! Reduces a raw log blob to an error-dense excerpt before it is handed to
//! the reasoning engine. Every line within `context_lines` of a signal
//! keyword is retained; runs of dropped lines collapse into a single gap
//! marker. Short inputs pass through untouched, and inputs with no signal
//! at all degrade to a head/tail summary.

use once_cell::sync::Lazy;
use regex::Regex;

/// Inputs below this line count are returned unchanged
pub const MIN_FILTER_LINES: usize = 20;

/// Marker inserted where non-error lines were dropped
pub const GAP_MARKER: &str = "... [filtered non-error logs] ...";

/// Marker separating head and tail in the no-signal summary
pub const SNIP_MARKER: &str = "...[snip]...";

static SIGNAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(error|exception|stacktrace|fatal|panic|traceback|warn)")
        .expect("signal keyword pattern is valid")
});

/// Filter a log blob down to signal lines plus surrounding context
#[must_use]
pub fn filter_log_text(text: &str, context_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < MIN_FILTER_LINES {
        return text.to_string();
    }

    let mut keep = vec![false; lines.len()];
    let mut matched = false;
    for (idx, line) in lines.iter().enumerate() {
        if SIGNAL_PATTERN.is_match(line) {
            matched = true;
            let start = idx.saturating_sub(context_lines);
            let end = (idx + context_lines + 1).min(lines.len());
            for flag in &mut keep[start..end] {
                *flag = true;
            }
        }
    }

    if !matched {
        let mut summary: Vec<&str> = lines[..10].to_vec();
        summary.push(SNIP_MARKER);
        summary.extend_from_slice(&lines[lines.len() - 10..]);
        return summary.join("\n");
    }

    // Adjacent and overlapping windows merge implicitly: a marker appears
    // only where a real gap exists between retained indices.
    let mut out: Vec<&str> = Vec::new();
    let mut last_kept: Option<usize> = None;
    for (idx, line) in lines.iter().enumerate() {
        if !keep[idx] {
            continue;
        }
        if let Some(prev) = last_kept {
            if idx > prev + 1 {
                out.push(GAP_MARKER);
            }
        }
        out.push(line);
        last_kept = Some(idx);
    }

    let filtered = out.join("\n");
    tracing::debug!(
        original_chars = text.len(),
        filtered_chars = filtered.len(),
        "log pre-filtering reduced payload"
    );
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbered_lines(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("line {i} all quiet")).collect()
    }

    #[test]
    fn short_input_passes_through() {
        let text = numbered_lines(19).join("\n");
        assert_eq!(filter_log_text(&text, 5), text);
    }

    #[test]
    fn single_signal_keeps_contiguous_window() {
        let mut lines = numbered_lines(30);
        lines[15] = "ERROR: db connection refused".to_string();
        let filtered = filter_log_text(&lines.join("\n"), 5);

        let expected: Vec<&str> = lines[10..21].iter().map(String::as_str).collect();
        assert_eq!(filtered, expected.join("\n"));
        assert!(!filtered.contains(GAP_MARKER));
    }

    #[test]
    fn disjoint_windows_get_one_marker() {
        let mut lines = numbered_lines(40);
        lines[5] = "ERROR: first failure".to_string();
        lines[30] = "ERROR: second failure".to_string();
        let filtered = filter_log_text(&lines.join("\n"), 5);

        assert_eq!(filtered.matches(GAP_MARKER).count(), 1);
        assert!(filtered.contains("first failure"));
        assert!(filtered.contains("second failure"));
        // Lines in the gap are gone.
        assert!(!filtered.contains("line 20 all quiet"));
    }

    #[test]
    fn overlapping_windows_merge_without_marker() {
        let mut lines = numbered_lines(30);
        lines[10] = "ERROR: one".to_string();
        lines[14] = "ERROR: two".to_string();
        let filtered = filter_log_text(&lines.join("\n"), 5);

        assert!(!filtered.contains(GAP_MARKER));
        let expected: Vec<&str> = lines[5..20].iter().map(String::as_str).collect();
        assert_eq!(filtered, expected.join("\n"));
    }

    #[test]
    fn no_signal_yields_head_tail_summary() {
        let lines = numbered_lines(40);
        let filtered = filter_log_text(&lines.join("\n"), 5);

        let out: Vec<&str> = filtered.lines().collect();
        assert_eq!(out.len(), 21);
        assert_eq!(out[0], "line 0 all quiet");
        assert_eq!(out[10], SNIP_MARKER);
        assert_eq!(out[20], "line 39 all quiet");
    }

    #[test]
    fn keywords_match_case_insensitively() {
        let mut lines = numbered_lines(25);
        lines[12] = "thread 'main' PANICKED at src/main.rs".to_string();
        let filtered = filter_log_text(&lines.join("\n"), 2);

        assert!(filtered.contains("PANICKED"));
        assert!(filtered.contains("line 10 all quiet"));
        assert!(!filtered.contains("line 0 all quiet"));
    }

    #[test]
    fn signal_at_boundary_clamps_window() {
        let mut lines = numbered_lines(25);
        lines[0] = "fatal: cannot open repository".to_string();
        let filtered = filter_log_text(&lines.join("\n"), 5);

        assert!(filtered.starts_with("fatal:"));
        assert_eq!(filtered.matches(GAP_MARKER).count(), 0);
        let out: Vec<&str> = filtered.lines().collect();
        assert_eq!(out.len(), 6);
    }
}
