use std::fmt;

use serde::Serialize;

/// Classification category the pipelines run, each backed by one label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sections,
    Domains,
    Safety,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Sections, Category::Domains, Category::Safety];

    pub fn label_set_id(self) -> &'static str {
        match self {
            Category::Sections => "psychiatry_sections",
            Category::Domains => "psychiatry_domains",
            Category::Safety => "psychiatry_safety",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::Sections => "Section Classification",
            Category::Domains => "Symptom Domain Classification",
            Category::Safety => "Safety Screening",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::Sections => "Identify note section type (CC, HPI, MSE, etc.)",
            Category::Domains => "Classify symptom domains (mood, anxiety, psychosis, etc.)",
            Category::Safety => "Screen for suicidal/homicidal ideation",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Sections => "sections",
            Category::Domains => "domains",
            Category::Safety => "safety",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
