use crate::event::{DomMutation, ResourceLoad, TextCapture, TextSource};

/// Class substring that marks hot-module-replacement churn
const HOT_UPDATE_MARKER: &str = "hot-update";

const SCRIPT_EXTENSIONS: [&str; 6] = [".js", ".mjs", ".jsx", ".ts", ".tsx", ".css"];

const CODE_KEYWORDS: [&str; 7] = ["function", "const ", "=>", "if (", "class ", "import ", "return "];

/// Minimum selected-text length before the code heuristic applies
const SELECTED_MIN_CHARS: usize = 50;
/// Pasted text is noisier, so the bar is higher
const PASTED_MIN_CHARS: usize = 100;

/// Whether a DOM mutation is development-relevant.
///
/// Matches added script/link nodes, added nodes tagged as hot updates, and
/// src/href attribute swaps; everything else is page noise.
pub fn is_relevant_mutation(mutation: &DomMutation) -> bool {
	if mutation.added_tags.iter().any(|tag| tag == "script" || tag == "link") {
		return true;
	}
	if mutation.added_classes.iter().any(|class| class.contains(HOT_UPDATE_MARKER)) {
		return true;
	}
	matches!(mutation.changed_attribute.as_deref(), Some("src" | "href"))
}

/// Whether a resource load looks like reloaded code rather than page assets
pub fn is_relevant_resource(resource: &ResourceLoad) -> bool {
	let name = resource.name.split('?').next().unwrap_or(&resource.name);
	if SCRIPT_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
		return true;
	}
	resource.name.contains(HOT_UPDATE_MARKER) || resource.name.contains("hmr")
}

/// Heuristic for "this captured text is source code worth analyzing"
pub fn is_code_capture(capture: &TextCapture) -> bool {
	let min_chars = match capture.source {
		TextSource::Selected => SELECTED_MIN_CHARS,
		TextSource::Pasted => PASTED_MIN_CHARS,
	};
	if capture.text.chars().count() <= min_chars {
		return false;
	}
	CODE_KEYWORDS.iter().any(|keyword| capture.text.contains(keyword))
}
