use crate::client::ViewState;

/// Elapsed-time readout for the last submission.
pub fn render_timer(view: &ViewState) -> Option<String> {
    if view.loading {
        return Some("Processing...".to_string());
    }

    view.elapsed.map(|elapsed| {
        format!(
            "Verification completed in: {:.2} seconds",
            elapsed.as_secs_f64()
        )
    })
}
