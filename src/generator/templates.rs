//! Prompt templates, system instructions and the static fallbacks used when
//! generation is unavailable.

use minijinja::{Environment, context};

use crate::error::AppError;
use crate::models::job::JobPosting;
use crate::models::message::MessageKind;
use crate::models::profile::ApplicantProfile;

const COVER_LETTER_PROMPT: &str = "\
You are a professional job application assistant. Generate a compelling cover letter for the following job posting.

Job Details:
- Title: {{ job.title }}
- Company: {{ job.company }}
- Location: {{ job.location }}
- Description: {{ job.description }}
{%- if job.requirements %}
- Requirements: {{ job.requirements|join(', ') }}
{%- endif %}

Applicant Profile:
- Name: {{ user.name }}
- Experience: {{ user.experience_years }} years
- Skills: {{ user.skills|join(', ') }}
- Education: {{ user.education }}
- Location: {{ user.location }}

Instructions:
1. Write a professional cover letter that highlights the applicant's relevant experience and skills
2. Address the specific requirements mentioned in the job description
3. Show enthusiasm for the company and position
4. Keep it concise (200-300 words)
5. Use a professional tone
6. Include a clear call to action

Generate the cover letter:
";

const FOLLOW_UP_PROMPT: &str = "\
You are a professional follow-up email assistant. Generate a polite follow-up email for a job application.

Job Details:
- Title: {{ job.title }}
- Company: {{ job.company }}
- Applied Date: {{ applied_date }}

Applicant Profile:
- Name: {{ user.name }}
- Email: {{ user.email }}

Instructions:
1. Write a polite follow-up email
2. Reference the specific position and application date
3. Express continued interest
4. Keep it brief and professional
5. Ask about the status of the application
6. Thank them for their time

Generate the follow-up email:
";

const NETWORKING_PROMPT: &str = "\
You are a professional networking email assistant. Generate a networking email to connect with someone at a company.

Company: {{ job.company }}
Position of Interest: {{ job.title }}

Applicant Profile:
- Name: {{ user.name }}
- Experience: {{ user.experience_years }} years
- Skills: {{ user.skills|join(', ') }}
- LinkedIn: {{ user.linkedin_url or 'not provided' }}

Instructions:
1. Write a professional networking email
2. Introduce yourself briefly
3. Express interest in the company
4. Mention specific skills or experience relevant to the company
5. Request an informational interview or connection
6. Keep it concise and respectful

Generate the networking email:
";

pub fn prompt_template(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::CoverLetter => COVER_LETTER_PROMPT,
        MessageKind::FollowUp => FOLLOW_UP_PROMPT,
        MessageKind::Networking => NETWORKING_PROMPT,
    }
}

pub fn system_instruction(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::CoverLetter => {
            "You are a professional job application assistant. Generate compelling cover letters that are personalized, professional, and highlight relevant experience."
        }
        MessageKind::FollowUp => {
            "You are a professional follow-up email assistant. Generate polite and professional follow-up emails for job applications."
        }
        MessageKind::Networking => {
            "You are a professional networking email assistant. Generate professional networking emails that are respectful and value-focused."
        }
    }
}

pub const SUBJECT_INSTRUCTION: &str =
    "You are a professional email subject line generator. Generate concise, professional subject lines.";

pub const ANALYST_INSTRUCTION: &str =
    "You are a job matching analyst. Provide detailed analysis in JSON format.";

pub fn subject_prompt(posting: &JobPosting, kind: MessageKind) -> String {
    match kind {
        MessageKind::CoverLetter => format!(
            "Generate a professional subject line for a cover letter for the position of {} at {}. Keep it under 60 characters.",
            posting.title, posting.company
        ),
        MessageKind::FollowUp => format!(
            "Generate a professional follow-up email subject line for the position of {} at {}. Keep it under 60 characters.",
            posting.title, posting.company
        ),
        MessageKind::Networking => format!(
            "Generate a professional networking email subject line to connect with someone at {}. Keep it under 60 characters.",
            posting.company
        ),
    }
}

pub fn analysis_prompt(posting: &JobPosting, profile: &ApplicantProfile) -> String {
    let description: String = posting.description.chars().take(500).collect();
    format!(
        "Analyze the fit between the job posting and the candidate profile.

Job: {title} at {company}
Job Requirements: {requirements}
Job Description: {description}...

Candidate Skills: {skills}
Candidate Experience: {years} years
Candidate Education: {education}

Provide a JSON response with:
1. fit_score (0-100)
2. matching_skills (list of skills that match)
3. missing_skills (list of skills the candidate lacks)
4. recommendations (list of suggestions to improve fit)
5. confidence_level (high/medium/low)
",
        title = posting.title,
        company = posting.company,
        requirements = posting.requirements.join(", "),
        skills = profile.skills.join(", "),
        years = profile.experience_years,
        education = profile.education,
    )
}

/// Render a Jinja template with `job`, `user` and `applied_date` bound.
pub fn render_prompt(
    template: &str,
    posting: &JobPosting,
    profile: &ApplicantProfile,
) -> Result<String, AppError> {
    let env = Environment::new();
    env.render_str(
        template,
        context! {
            job => posting,
            user => profile,
            applied_date => "recently",
        },
    )
    .map_err(|e| AppError::Generation(format!("Template error: {e}")))
}

pub fn fallback_subject(posting: &JobPosting) -> String {
    format!("Application for {} Position", posting.title)
}

pub fn fallback_body(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::CoverLetter => FALLBACK_COVER_LETTER,
        MessageKind::FollowUp => FALLBACK_FOLLOW_UP,
        MessageKind::Networking => FALLBACK_NETWORKING,
    }
}

const FALLBACK_COVER_LETTER: &str = "\
Dear Hiring Manager,

I am writing to express my strong interest in the [Position Title] role at [Company Name]. With my background in [relevant skills] and [X] years of experience, I am confident I would be a valuable addition to your team.

I am particularly drawn to [Company Name] because of [specific reason]. My experience in [specific skill/area] aligns well with the requirements outlined in the job description.

I would welcome the opportunity to discuss how my skills and experience can contribute to [Company Name]'s continued success. Thank you for considering my application.

Best regards,
[Your Name]
";

const FALLBACK_FOLLOW_UP: &str = "\
Dear Hiring Manager,

I hope this email finds you well. I wanted to follow up on my application for the [Position Title] role at [Company Name], which I submitted on [date].

I remain very interested in this opportunity and would appreciate any updates on the status of my application. I am available for an interview at your convenience.

Thank you for your time and consideration.

Best regards,
[Your Name]
";

const FALLBACK_NETWORKING: &str = "\
Dear [Name],

I hope this email finds you well. I am reaching out to connect and learn more about opportunities at [Company Name].

With my background in [relevant skills], I am interested in exploring how I might contribute to your team. I would appreciate the opportunity to have a brief conversation about your experience at [Company Name].

Thank you for your time.

Best regards,
[Your Name]
";
