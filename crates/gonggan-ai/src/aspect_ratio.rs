//! Aspect ratios accepted by the image backend.

pub const SUPPORTED_ASPECT_RATIOS: [&str; 5] = ["1:1", "3:4", "4:3", "9:16", "16:9"];

const FALLBACK_RATIO: &str = "1:1";

/// Map a UI ratio onto the nearest ratio the backend supports.
pub fn normalize_aspect_ratio(ratio: &str) -> &'static str {
    let ratio = ratio.trim();
    if let Some(supported) = SUPPORTED_ASPECT_RATIOS.iter().find(|r| **r == ratio) {
        return supported;
    }

    match ratio {
        "21:9" => "16:9",
        "5:4" | "3:2" => "4:3",
        _ => FALLBACK_RATIO,
    }
}
