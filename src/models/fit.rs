use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// How well a posting matches a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitAnalysis {
    pub score: u8,
    #[serde(default)]
    pub matching_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub confidence: Confidence,
}

impl FitAnalysis {
    /// Estimate used when the analyst replied but not with usable JSON.
    pub fn unparsed_estimate(skills: &[String]) -> Self {
        Self {
            score: 70,
            matching_skills: skills.iter().take(3).cloned().collect(),
            missing_skills: Vec::new(),
            recommendations: vec![
                "Customize your application to highlight relevant experience".to_string(),
            ],
            confidence: Confidence::Medium,
        }
    }

    /// Estimate used when the analyst could not be reached at all.
    pub fn unavailable() -> Self {
        Self {
            score: 50,
            matching_skills: Vec::new(),
            missing_skills: Vec::new(),
            recommendations: vec!["Unable to analyze job fit".to_string()],
            confidence: Confidence::Low,
        }
    }
}
