use crate::client::ViewState;

/// Confidence as a percentage with exactly two decimals: `0.8734` → `"87.34%"`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.2}%", confidence * 100.0)
}

/// Status banner: loading indicator, error banner, or the match badge.
pub fn render_status(view: &ViewState) -> Option<String> {
    if view.loading {
        return Some("Verifying faces...".to_string());
    }

    if let Some(error) = &view.error {
        return Some(format!("✗ {}", error));
    }

    let outcome = view.result.as_ref()?;
    let badge = if outcome.verified {
        "✓ Face Match Verified"
    } else {
        "✗ No Face Match"
    };

    let mut lines = vec![
        badge.to_string(),
        format!("Confidence Score: {}", format_confidence(outcome.confidence)),
    ];
    if !outcome.message.is_empty() {
        lines.push(outcome.message.clone());
    }

    Some(lines.join("\n"))
}
