use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::labels::AttributeSet;
use crate::llm::{ValidationProvider, ValidationResponse};

use super::types::{AttributeValidation, ValidationStatus};

/// Checks one class's required conditions through a [`ValidationProvider`].
///
/// Never fails: a class without conditions passes trivially, and any provider problem
/// yields a passing score of 1.0 with the problem in the explanation.
pub struct AttributeValidator {
    provider: Arc<dyn ValidationProvider>,
    timeout: Duration,
}

impl std::fmt::Debug for AttributeValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeValidator")
            .field("available", &self.provider.is_available())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AttributeValidator {
    pub fn new(provider: Arc<dyn ValidationProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn validate(
        &self,
        text: &str,
        class_name: &str,
        attributes: &AttributeSet,
    ) -> AttributeValidation {
        let Some(spec) = attributes.get(class_name) else {
            debug!(class = class_name, "No attributes declared, trivial pass");
            return AttributeValidation::no_attributes();
        };

        if !self.provider.is_available() {
            debug!(class = class_name, "Validator unavailable, failing open");
            return AttributeValidation::failed_open("Attribute validation unavailable; skipped");
        }

        let call = self.provider.validate(text, class_name, spec);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(ValidationResponse::Assessed(assessment))) => {
                let score = assessment.score.unwrap_or(1.0);
                debug!(class = class_name, score, is_valid = assessment.is_valid, "Attributes evaluated");
                AttributeValidation {
                    status: ValidationStatus::Evaluated,
                    is_valid: assessment.is_valid,
                    score,
                    conditions_met: assessment.conditions_met,
                    conditions_not_met: assessment.conditions_not_met,
                    explanation: assessment.explanation,
                }
            }
            Ok(Ok(ValidationResponse::Malformed { reason })) => {
                warn!(class = class_name, %reason, "Malformed validation response, failing open");
                AttributeValidation::failed_open(format!("Validation response unreadable: {reason}"))
            }
            Ok(Err(e)) => {
                warn!(class = class_name, error = %e, "Attribute validation failed, failing open");
                AttributeValidation::failed_open(format!("Validation failed: {e}"))
            }
            Err(_) => {
                warn!(class = class_name, "Attribute validation timed out, failing open");
                AttributeValidation::failed_open(format!(
                    "Validation timed out after {}ms",
                    self.timeout.as_millis()
                ))
            }
        }
    }
}
