//! Parsers for yt-dlp's line-oriented stdout.

use std::path::PathBuf;

/// Parses a line produced by our `--progress-template`, which emits raw
/// byte counts as `progress:<downloaded>/<total>`. The total may be a
/// float estimate, or `NA` when yt-dlp does not know it yet.
pub fn parse_progress_line(line: &str) -> Option<(u64, u64)> {
    let rest = line.strip_prefix("progress:")?;
    let (downloaded, total) = rest.trim().split_once('/')?;
    let downloaded = downloaded.trim().parse::<f64>().ok()?;
    let total = total.trim().parse::<f64>().ok()?;
    if !downloaded.is_finite() || !total.is_finite() || downloaded < 0.0 || total <= 0.0 {
        return None;
    }
    Some((downloaded as u64, total as u64))
}

/// Recognizes the lines in which yt-dlp reports the output file path.
pub fn parse_destination_line(line: &str) -> Option<PathBuf> {
    if let Some(path) = line.strip_prefix("[download] Destination: ") {
        return Some(PathBuf::from(path.trim()));
    }
    if let Some(rest) = line.strip_prefix("[Merger] Merging formats into \"") {
        return Some(PathBuf::from(rest.trim_end().trim_end_matches('"')));
    }
    line.strip_prefix("[download] ")?
        .strip_suffix(" has already been downloaded")
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_byte_counts() {
        assert_eq!(parse_progress_line("progress:1024/4096"), Some((1024, 4096)));
        assert_eq!(parse_progress_line("progress: 512 / 2048 "), Some((512, 2048)));
    }

    #[test]
    fn parses_float_estimates() {
        assert_eq!(parse_progress_line("progress:1536.0/10240.5"), Some((1536, 10240)));
    }

    #[test]
    fn rejects_unknown_or_malformed_totals() {
        assert_eq!(parse_progress_line("progress:1024/NA"), None);
        assert_eq!(parse_progress_line("progress:NA/NA"), None);
        assert_eq!(parse_progress_line("progress:1024"), None);
        assert_eq!(parse_progress_line("progress:1024/0"), None);
        assert_eq!(parse_progress_line("[download]  12.0% of 10.00MiB"), None);
    }

    #[test]
    fn recognizes_destination_lines() {
        assert_eq!(
            parse_destination_line("[download] Destination: /tmp/My-Video-2024.mp4"),
            Some(PathBuf::from("/tmp/My-Video-2024.mp4"))
        );
        assert_eq!(
            parse_destination_line("[Merger] Merging formats into \"/tmp/My-Video-2024.mkv\""),
            Some(PathBuf::from("/tmp/My-Video-2024.mkv"))
        );
        assert_eq!(
            parse_destination_line("[download] /tmp/clip.mp4 has already been downloaded"),
            Some(PathBuf::from("/tmp/clip.mp4"))
        );
        assert_eq!(parse_destination_line("[youtube] abc123: Downloading webpage"), None);
    }
}
