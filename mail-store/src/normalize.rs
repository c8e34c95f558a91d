//! Text normalization applied to chunk text before embedding.

/// Normalizes mail/attachment text with minimal layout disruption.
///
/// - Collapses runs of spaces and tabs inside a line.
/// - Collapses multiple blank lines into a single one.
/// - Trims leading and trailing blank lines.
/// - Stops at `max_chars` characters (never splits a character).
pub fn normalize_text(s: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max_chars));
    let mut used = 0usize;
    let mut blank_run = 0usize;

    for raw in s.lines() {
        let line = raw.split_whitespace().collect::<Vec<_>>().join(" ");

        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }

        let sep = usize::from(!out.is_empty());
        let len = line.chars().count();
        if used + sep + len > max_chars {
            let room = max_chars.saturating_sub(used + sep);
            if room > 0 {
                if sep == 1 {
                    out.push('\n');
                }
                out.extend(line.chars().take(room));
            }
            break;
        }

        if sep == 1 {
            out.push('\n');
        }
        out.push_str(&line);
        used += sep + len;
    }

    out.trim_end().to_string()
}
