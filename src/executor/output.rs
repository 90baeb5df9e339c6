//! Output trimming for operator messages.

/// Shorten command output for inclusion in a report line.
///
/// Keeps the last `max_lines` non-empty lines (certbot puts the reason for
/// a failure at the end), truncating long lines.
pub fn sanitize_output(output: &str, max_lines: usize) -> String {
    const MAX_LINE_LENGTH: usize = 200;

    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    let skipped = lines.len().saturating_sub(max_lines);

    let mut result = String::new();
    if skipped > 0 {
        result.push_str("...[earlier output truncated]");
    }

    for line in &lines[skipped..] {
        let line = line.trim_end();
        let truncated = match line.char_indices().nth(MAX_LINE_LENGTH) {
            Some((idx, _)) => format!("{}...", &line[..idx]),
            None => line.to_string(),
        };

        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&truncated);
    }

    result
}
