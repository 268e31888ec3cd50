//! Candidate extraction from free-form model responses.

/// Fence tag marking scenario documents.
pub const SCENARIO_FENCE_TAG: &str = "yaml";

const FENCE: &str = "```";

/// Language tags longer than this are treated as content
const MAX_TAG_LINE: usize = 10;

/// Pull the candidate document out of a model response.
///
/// Tries, in order: the first fence tagged with `tag`, the first fence of any
/// kind (skipping a short language tag line), and finally the whole response.
/// A closed tagged fence wins even when its body is empty. Always returns
/// trimmed text.
pub fn extract_candidate(response: &str, tag: &str) -> String {
    let opening = format!("{}{}", FENCE, tag);
    if let Some(pos) = response.find(&opening) {
        let start = pos + opening.len();
        if let Some(len) = response[start..].find(FENCE) {
            return response[start..start + len].trim().to_string();
        }
    }

    if let Some(pos) = response.find(FENCE) {
        let mut start = pos + FENCE.len();
        if let Some(newline) = response[start..].find('\n') {
            if newline < MAX_TAG_LINE {
                start += newline + 1;
            }
        }
        if let Some(len) = response[start..].find(FENCE) {
            if len > 0 {
                return response[start..start + len].trim().to_string();
            }
        }
    }

    response.trim().to_string()
}
