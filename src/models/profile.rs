use serde::{Deserialize, Serialize};

/// The applicant's details used to personalize outreach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: String,
    pub experience_years: u32,
    #[serde(default)]
    pub skills: Vec<String>,
    pub education: String,
    pub resume_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub cover_letter_template: Option<String>,
}

#[cfg(test)]
pub(crate) fn sample_profile() -> ApplicantProfile {
    ApplicantProfile {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: None,
        location: "London".to_string(),
        experience_years: 6,
        skills: vec![
            "Rust".to_string(),
            "Tokio".to_string(),
            "PostgreSQL".to_string(),
            "Kubernetes".to_string(),
        ],
        education: "BSc Mathematics".to_string(),
        resume_url: None,
        linkedin_url: Some("https://linkedin.com/in/ada".to_string()),
        portfolio_url: None,
        cover_letter_template: None,
    }
}
