use super::{PublishRule, RuleContext};
use pagecraft_model::{BlockNode, BlockProps, ValidationError};

/// Images with a source must describe it for screen readers
pub struct ImageAltTextRule;

impl PublishRule for ImageAltTextRule {
    fn name(&self) -> &'static str {
        "a11y-img-alt"
    }

    fn description(&self) -> &'static str {
        "Images must have alternative text for screen readers"
    }

    fn check_node(&self, node: &BlockNode, _ctx: &RuleContext<'_>) -> Vec<ValidationError> {
        match &node.props {
            BlockProps::Image(image)
                if !image.src.trim().is_empty() && image.alt_text.trim().is_empty() =>
            {
                vec![ValidationError::content_rule(
                    &node.id,
                    "Image has a source but no accessible text",
                )]
            }
            _ => Vec::new(),
        }
    }
}

/// Buttons must have a visible label
pub struct ButtonLabelRule;

impl PublishRule for ButtonLabelRule {
    fn name(&self) -> &'static str {
        "a11y-button-text"
    }

    fn description(&self) -> &'static str {
        "Buttons must have accessible text content"
    }

    fn check_node(&self, node: &BlockNode, _ctx: &RuleContext<'_>) -> Vec<ValidationError> {
        let label = match &node.props {
            BlockProps::Button(button) => &button.label,
            BlockProps::PaymentButton(button) => &button.label,
            _ => return Vec::new(),
        };

        if label.trim().is_empty() {
            vec![ValidationError::content_rule(&node.id, "Button has no label")]
        } else {
            Vec::new()
        }
    }
}
