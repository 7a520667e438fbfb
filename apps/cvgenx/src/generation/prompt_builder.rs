//! Prompt Builder: maps (profile, job description, kind, reference text) to
//! the instruction string sent to the provider.
//!
//! Pure and total: no I/O, no failure path. Absent profile fields render as
//! empty segments. `both` is expanded by the caller; this only sees atomic kinds.

use crate::generation::prompts::{
    CANDIDATE_CONTEXT_TEMPLATE, COVER_LETTER_PROMPT_TEMPLATE, REFERENCE_SECTION_TEMPLATE,
    RESUME_PROMPT_TEMPLATE,
};
use crate::models::{ContentKind, Project, UserProfile};

/// Builds the provider prompt for one content kind.
pub fn build_prompt(
    profile: &UserProfile,
    job_description: &str,
    kind: ContentKind,
    reference_text: Option<&str>,
) -> String {
    let context = candidate_context(profile, job_description, reference_text);

    match kind {
        ContentKind::Resume => fill_template(
            RESUME_PROMPT_TEMPLATE,
            &[
                ("context", &context),
                ("header_block", &header_block(profile)),
            ],
        ),
        ContentKind::CoverLetter => fill_template(
            COVER_LETTER_PROMPT_TEMPLATE,
            &[("context", &context), ("name", profile.name.trim())],
        ),
    }
}

fn candidate_context(
    profile: &UserProfile,
    job_description: &str,
    reference_text: Option<&str>,
) -> String {
    let reference_section = match reference_text.map(str::trim) {
        Some(text) if !text.is_empty() => {
            fill_template(
                REFERENCE_SECTION_TEMPLATE,
                &[("reference_text", text), ("fence", &code_fence(text))],
            )
        }
        _ => String::new(),
    };

    fill_template(
        CANDIDATE_CONTEXT_TEMPLATE,
        &[
            ("name", &profile.name),
            ("phone", &profile.phone),
            ("email", &profile.email),
            ("linkedin", &profile.linkedin),
            ("github", &profile.github),
            ("portfolio", &profile.portfolio),
            ("address", &profile.address),
            ("base_summary", &profile.base_summary),
            ("education", &bullet_list(&profile.education)),
            ("projects", &project_list(&profile.projects)),
            ("experience", &bullet_list(&profile.professional_experience)),
            ("reference_section", &reference_section),
            ("job_description", job_description),
            ("jd_fence", &code_fence(job_description)),
        ],
    )
}

/// The fixed resume header: name, then contact line, then profile links.
/// Empty fields are dropped rather than rendered as dangling separators.
fn header_block(profile: &UserProfile) -> String {
    let mut lines = Vec::new();

    if !profile.name.trim().is_empty() {
        lines.push(format!("# {}", profile.name.trim()));
    }

    let contact = join_present(&[&profile.email, &profile.phone, &profile.address]);
    if !contact.is_empty() {
        lines.push(contact);
    }

    let links: Vec<String> = [
        ("LinkedIn", &profile.linkedin),
        ("GitHub", &profile.github),
        ("Portfolio", &profile.portfolio),
    ]
    .iter()
    .filter(|(_, url)| !url.trim().is_empty())
    .map(|(label, url)| format!("[{label}]({})", url.trim()))
    .collect();
    if !links.is_empty() {
        lines.push(links.join(" | "));
    }

    if lines.is_empty() {
        "(no contact details provided; omit the header)".to_string()
    } else {
        lines.join("\n")
    }
}

/// A backtick fence longer than any backtick run in `text`, so the text
/// cannot close it early. At least three backticks.
fn code_fence(text: &str) -> String {
    let longest = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

fn join_present(values: &[&String]) -> String {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn project_list(projects: &[Project]) -> String {
    projects
        .iter()
        .filter_map(|p| {
            let name = p.name.trim();
            let description = p.description.trim();
            let url = p.url.trim();
            if name.is_empty() && description.is_empty() && url.is_empty() {
                return None;
            }
            let mut line = format!("- {name}");
            if !description.is_empty() {
                line.push_str(": ");
                line.push_str(description);
            }
            if !url.is_empty() {
                line.push_str(&format!(" ({url})"));
            }
            Some(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single-pass `{key}` substitution. Unknown keys and stray braces are copied
/// through, and substituted values are never scanned again.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match values.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => {
                        out.push_str(value);
                        rest = &after[end + 1..];
                    }
                    None => {
                        out.push('{');
                        rest = after;
                    }
                }
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const JD: &str = "Backend engineer, Go, Kubernetes";

    fn jane() -> UserProfile {
        UserProfile {
            name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            education: vec!["BS CS".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_profile_still_carries_job_description() {
        for kind in [ContentKind::Resume, ContentKind::CoverLetter] {
            let prompt = build_prompt(&UserProfile::default(), JD, kind, None);
            assert!(!prompt.is_empty());
            assert!(prompt.contains(JD));
        }
    }

    #[test]
    fn test_job_description_is_fenced_verbatim() {
        let jd = "Line one\n  indented {braces} line\n";
        let prompt = build_prompt(&jane(), jd, ContentKind::Resume, None);
        assert!(prompt.contains(&format!("```\n{jd}\n```")));
    }

    #[test]
    fn test_fence_outgrows_backticks_in_job_description() {
        let jd = "Nice to have:\n```\nkubectl apply\n```\n";
        let prompt = build_prompt(&jane(), jd, ContentKind::Resume, None);
        assert!(prompt.contains(&format!("````\n{jd}\n````")));

        let reference = "uses ````` in a sample";
        let prompt = build_prompt(&jane(), JD, ContentKind::Resume, Some(reference));
        assert!(prompt.contains(&format!("``````\n{reference}\n``````")));
    }

    #[test]
    fn test_code_fence_length() {
        assert_eq!(code_fence("plain"), "```");
        assert_eq!(code_fence("a ` b `` c"), "```");
        assert_eq!(code_fence("```"), "````");
    }

    #[test]
    fn test_resume_prompt_contains_name_and_header() {
        let prompt = build_prompt(&jane(), JD, ContentKind::Resume, None);
        assert!(prompt.contains("Jane Doe"));
        assert!(prompt.contains(JD));
        assert!(prompt.contains("# Jane Doe\njane@x.com"));
        assert!(prompt.contains("- BS CS"));
        assert!(prompt.contains("## "));
    }

    #[test]
    fn test_cover_letter_prompt_has_narrative_structure() {
        let prompt = build_prompt(&jane(), JD, ContentKind::CoverLetter, None);
        assert!(prompt.contains("Hook"));
        assert!(prompt.contains("Bridge"));
        assert!(prompt.contains("Close"));
        assert!(prompt.contains("Sign off with the candidate's name: Jane Doe"));
        assert!(!prompt.contains("TASK: Write a complete resume"));
    }

    #[test]
    fn test_deterministic() {
        let a = build_prompt(&jane(), JD, ContentKind::Resume, Some("Old resume"));
        let b = build_prompt(&jane(), JD, ContentKind::Resume, Some("Old resume"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_reference_section_only_when_present() {
        let with = build_prompt(&jane(), JD, ContentKind::Resume, Some("Acme Corp 2019-2023"));
        assert!(with.contains("REFERENCE RESUME"));
        assert!(with.contains("Acme Corp 2019-2023"));

        let blank = build_prompt(&jane(), JD, ContentKind::Resume, Some("   "));
        assert!(!blank.contains("REFERENCE RESUME"));
        let none = build_prompt(&jane(), JD, ContentKind::Resume, None);
        assert_eq!(blank, none);
    }

    #[test]
    fn test_projects_render_with_optional_parts() {
        let profile = UserProfile {
            projects: vec![
                Project {
                    name: "cvgenx".into(),
                    url: "https://github.com/x/cvgenx".into(),
                    description: "Resume generator".into(),
                },
                Project {
                    name: "Notes".into(),
                    ..Default::default()
                },
                Project::default(),
            ],
            ..Default::default()
        };
        let prompt = build_prompt(&profile, JD, ContentKind::Resume, None);
        assert!(prompt.contains("- cvgenx: Resume generator (https://github.com/x/cvgenx)"));
        assert!(prompt.contains("- Notes\n"));
    }

    #[test]
    fn test_header_skips_empty_fields() {
        let profile = UserProfile {
            name: "Jane Doe".into(),
            github: "https://github.com/jane".into(),
            ..Default::default()
        };
        assert_eq!(
            header_block(&profile),
            "# Jane Doe\n[GitHub](https://github.com/jane)"
        );
        assert!(header_block(&UserProfile::default()).contains("no contact details"));
    }

    #[test]
    fn test_placeholders_in_user_data_are_not_expanded() {
        let profile = UserProfile {
            name: "{job_description}".into(),
            ..Default::default()
        };
        let prompt = build_prompt(&profile, "REAL JD", ContentKind::Resume, None);
        assert!(prompt.contains("Name: {job_description}"));
        assert_eq!(prompt.matches("REAL JD").count(), 1);
    }

    #[test]
    fn test_fill_template_edge_cases() {
        assert_eq!(fill_template("a {x} b", &[("x", "1")]), "a 1 b");
        assert_eq!(fill_template("{unknown} {x}", &[("x", "1")]), "{unknown} 1");
        assert_eq!(fill_template("open { only", &[]), "open { only");
        assert_eq!(fill_template("{{x}}", &[("x", "1")]), "{1}");
    }
}
