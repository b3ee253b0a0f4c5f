/// The three steps shown above the capture panels.
pub const GUIDE_STEPS: [(&str, &str); 3] = [
    (
        "Upload ID Photo",
        "Take or upload a clear photo of your ID document",
    ),
    (
        "Take Selfie",
        "Ensure good lighting and face the camera directly",
    ),
    (
        "Verify Match",
        "Our AI will compare both photos for verification",
    ),
];

pub fn render_guide() -> String {
    GUIDE_STEPS
        .iter()
        .enumerate()
        .map(|(i, (title, description))| format!("{}. {}\n   {}", i + 1, title, description))
        .collect::<Vec<_>>()
        .join("\n")
}
