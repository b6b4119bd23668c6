//! Keyword rules mapping note text to clinical section labels.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

pub const CHIEF_COMPLAINT: &str = "Chief Complaint";
pub const PRESENT_ILLNESS: &str = "History of Present Illness";
pub const PAST_PSYCHIATRIC: &str = "Past Psychiatric History";
pub const FAMILY_PSYCHIATRIC: &str = "Family Psychiatric History";
pub const SUBSTANCE_USE: &str = "Substance Use History";
pub const SOCIAL: &str = "Social History";
pub const MENTAL_STATUS: &str = "Mental Status Examination";
pub const ASSESSMENT: &str = "Assessment";
pub const PLAN: &str = "Plan";

/// `(pattern, label)` in evaluation order. Patterns are case-insensitive.
const SECTION_RULES: &[(&str, &str)] = &[
    (r"\bCC\b", CHIEF_COMPLAINT),
    (r"\bChief\s+Complaint\b", CHIEF_COMPLAINT),
    (r"\bPresenting\s+Complaint\b", CHIEF_COMPLAINT),
    (r"\bHPI\b", PRESENT_ILLNESS),
    (r"\bHistory\s+of\s+Present\s+Illness\b", PRESENT_ILLNESS),
    (r"\bHistory\s*[-:]", PRESENT_ILLNESS),
    (r"\bPast\s+Psychiatric\s+History\b", PAST_PSYCHIATRIC),
    (r"\bPHx\b", PAST_PSYCHIATRIC),
    (r"\bPast\s+History\b", PAST_PSYCHIATRIC),
    (r"\bFamily\s+History\b", FAMILY_PSYCHIATRIC),
    (r"\bFHx\b", FAMILY_PSYCHIATRIC),
    (r"\bSubstance\s+Use\b", SUBSTANCE_USE),
    (r"\bDrug\s+History\b", SUBSTANCE_USE),
    (r"\bAlcohol\s+History\b", SUBSTANCE_USE),
    (r"\bSocial\s+History\b", SOCIAL),
    (r"\bPremorbid\s+Personality\b", SOCIAL),
    (r"\bPremorbid\b", SOCIAL),
    (r"\bMSE\b", MENTAL_STATUS),
    (r"\bMental\s+Status\b", MENTAL_STATUS),
    (r"\bGeneral\s+appearance\b", MENTAL_STATUS),
    (r"\bAppearance\s+and\s+behaviou?r\b", MENTAL_STATUS),
    (r"\bPMA\b", MENTAL_STATUS),
    (r"\bTalk\b", MENTAL_STATUS),
    (r"\bMood\b", MENTAL_STATUS),
    (r"\bAffect\b", MENTAL_STATUS),
    (r"\bThought\b", MENTAL_STATUS),
    (r"\bPerception\b", MENTAL_STATUS),
    (r"\bAssessment\b", ASSESSMENT),
    (r"\bImpression\b", ASSESSMENT),
    (r"\bDiagnosis\b", ASSESSMENT),
    (r"\bDx\b", ASSESSMENT),
    (r"\bPlan\b", PLAN),
    (r"\bManagement\b", PLAN),
    (r"\bTreatment\b", PLAN),
    (r"\bRx\b", PLAN),
];

/// A newline-prefixed run of bullet markers (`*`, `**`, `* *`, `•`).
pub static BULLET_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\n)\s*[*•]+\s*[*•]?\s*").expect("valid regex"));

pub struct SectionRule {
    pub pattern: Regex,
    pub label: &'static str,
}

pub static RULES: LazyLock<Vec<SectionRule>> = LazyLock::new(|| {
    SECTION_RULES
        .iter()
        .map(|(pattern, label)| SectionRule {
            pattern: RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("valid regex"),
            label,
        })
        .collect()
});

/// Every distinct label the rules can assign, in first-appearance order.
pub fn known_labels() -> Vec<&'static str> {
    let mut labels: Vec<&'static str> = Vec::new();
    for (_, label) in SECTION_RULES {
        if !labels.contains(label) {
            labels.push(label);
        }
    }
    labels
}
