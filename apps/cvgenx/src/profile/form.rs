//! Line-oriented profile editor.
//!
//! The form is an ordered list of fields, each asked in turn over any
//! `BufRead`/`Write` pair so the same code drives a terminal or a test buffer.

use std::io::{self, BufRead, Write};

use crate::models::{Project, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// One answer line. Empty input keeps the current value.
    Line,
    /// Lines until the first blank one. Entering nothing keeps the current value.
    Lines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Phone,
    Email,
    Linkedin,
    Github,
    Portfolio,
    Address,
    Education,
    Projects,
    ProfessionalExperience,
    BaseSummary,
}

#[derive(Debug, Clone, Copy)]
pub struct FormField {
    pub field: ProfileField,
    pub prompt: &'static str,
    pub kind: FieldKind,
}

const fn line(field: ProfileField, prompt: &'static str) -> FormField {
    FormField {
        field,
        prompt,
        kind: FieldKind::Line,
    }
}

const fn lines(field: ProfileField, prompt: &'static str) -> FormField {
    FormField {
        field,
        prompt,
        kind: FieldKind::Lines,
    }
}

pub const PROFILE_FORM: &[FormField] = &[
    line(ProfileField::Name, "Name"),
    line(ProfileField::Phone, "Phone"),
    line(ProfileField::Email, "Email"),
    line(ProfileField::Linkedin, "LinkedIn"),
    line(ProfileField::Github, "GitHub"),
    line(ProfileField::Portfolio, "Portfolio"),
    line(ProfileField::Address, "Address"),
    lines(ProfileField::Education, "Education"),
    lines(ProfileField::Projects, "Projects (name | url | description)"),
    lines(ProfileField::ProfessionalExperience, "Professional experience"),
    line(ProfileField::BaseSummary, "Base summary"),
];

impl ProfileField {
    fn text_mut(self, profile: &mut UserProfile) -> Option<&mut String> {
        Some(match self {
            ProfileField::Name => &mut profile.name,
            ProfileField::Phone => &mut profile.phone,
            ProfileField::Email => &mut profile.email,
            ProfileField::Linkedin => &mut profile.linkedin,
            ProfileField::Github => &mut profile.github,
            ProfileField::Portfolio => &mut profile.portfolio,
            ProfileField::Address => &mut profile.address,
            ProfileField::BaseSummary => &mut profile.base_summary,
            _ => return None,
        })
    }

    /// Current value as display lines.
    fn current(self, profile: &UserProfile) -> Vec<String> {
        match self {
            ProfileField::Education => profile.education.clone(),
            ProfileField::ProfessionalExperience => profile.professional_experience.clone(),
            ProfileField::Projects => profile.projects.iter().map(Project::to_line).collect(),
            ProfileField::Name => vec![profile.name.clone()],
            ProfileField::Phone => vec![profile.phone.clone()],
            ProfileField::Email => vec![profile.email.clone()],
            ProfileField::Linkedin => vec![profile.linkedin.clone()],
            ProfileField::Github => vec![profile.github.clone()],
            ProfileField::Portfolio => vec![profile.portfolio.clone()],
            ProfileField::Address => vec![profile.address.clone()],
            ProfileField::BaseSummary => vec![profile.base_summary.clone()],
        }
    }

    fn apply(self, profile: &mut UserProfile, mut values: Vec<String>) {
        match self {
            ProfileField::Education => profile.education = values,
            ProfileField::ProfessionalExperience => profile.professional_experience = values,
            ProfileField::Projects => {
                profile.projects = values.iter().map(|l| Project::from_line(l)).collect()
            }
            _ => {
                if let Some(slot) = self.text_mut(profile) {
                    *slot = values.pop().unwrap_or_default();
                }
            }
        }
    }
}

/// Reads one line. `None` on end of input.
fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim_end_matches(&['\r', '\n'][..]).to_string()))
}

/// Walks `PROFILE_FORM` starting from `current` and returns the edited
/// profile. Once input ends every remaining field keeps its value.
pub fn run_form<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    current: UserProfile,
) -> io::Result<UserProfile> {
    let mut profile = current;

    for form_field in PROFILE_FORM {
        let existing = form_field.field.current(&profile);
        let answer = match form_field.kind {
            FieldKind::Line => {
                let default = existing.first().map(String::as_str).unwrap_or_default();
                write!(output, "{} [{}]: ", form_field.prompt, default)?;
                output.flush()?;
                match read_line(input)? {
                    Some(answer) if !answer.trim().is_empty() => {
                        vec![answer.trim().to_string()]
                    }
                    Some(_) => Vec::new(),
                    None => break,
                }
            }
            FieldKind::Lines => {
                if !existing.is_empty() {
                    writeln!(output, "Current {}:", form_field.prompt.to_lowercase())?;
                    for entry in &existing {
                        writeln!(output, "  {entry}")?;
                    }
                }
                writeln!(
                    output,
                    "{} (one per line, blank line to finish):",
                    form_field.prompt
                )?;
                output.flush()?;

                let mut entered = Vec::new();
                let mut ended = false;
                loop {
                    match read_line(input)? {
                        Some(answer) if answer.trim().is_empty() => break,
                        Some(answer) => entered.push(answer.trim().to_string()),
                        None => {
                            ended = true;
                            break;
                        }
                    }
                }
                if ended && entered.is_empty() {
                    break;
                }
                entered
            }
        };

        if !answer.is_empty() {
            form_field.field.apply(&mut profile, answer);
        }
    }

    writeln!(output)?;
    Ok(profile)
}
