//! Fence stripping for model output.
//!
//! Models sometimes wrap their JSON answer in Markdown code fences even when
//! told not to. The stripper is applied before every JSON decode attempt.

/// Remove Markdown code fences if present.
///
/// Input that does not start with a fence, or that has no closing fence, is
/// returned trimmed but otherwise unchanged. A leading language tag line
/// (e.g. "json") inside the fence is dropped. Idempotent.
pub fn strip_code_fences(text: &str) -> String {
    let stripped = text.trim();
    if !stripped.starts_with("```") {
        return stripped.to_string();
    }

    let parts: Vec<&str> = stripped.split("```").collect();
    if parts.len() < 3 {
        return stripped.to_string();
    }

    // The content is expected to be the middle part. Drop an optional
    // language hint on its first line.
    let mut lines: Vec<&str> = parts[1].lines().collect();
    if let Some(first) = lines.first() {
        let tag = first.trim();
        if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphabetic()) {
            lines.remove(0);
        }
    }
    lines.join("\n").trim().to_string()
}
