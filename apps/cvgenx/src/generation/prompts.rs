// Prompt templates for resume and cover-letter generation.
// Placeholders are `{name}` and are filled in a single pass by
// `prompt_builder::fill_template`, so braces inside user data are left alone.

/// Shared candidate context. Replace: {name}, {phone}, {email}, {linkedin},
/// {github}, {portfolio}, {address}, {base_summary}, {education}, {projects},
/// {experience}, {job_description}, {jd_fence}, {reference_section}
pub const CANDIDATE_CONTEXT_TEMPLATE: &str = r#"You are an expert resume writer and career coach. Your goal is to get the candidate an interview for the job below.
Write in a natural, specific, human voice. Never mention that the text was generated.
Stay faithful to the candidate's background: reframe and emphasize what is relevant, but do not invent employers, degrees or dates.

CANDIDATE CONTACT INFO:
Name: {name}
Phone: {phone}
Email: {email}
LinkedIn: {linkedin}
GitHub: {github}
Portfolio: {portfolio}
Address: {address}

BASE SUMMARY:
{base_summary}

EDUCATION:
{education}

PROJECTS:
{projects}

PROFESSIONAL EXPERIENCE:
{experience}
{reference_section}
JOB DESCRIPTION:
{jd_fence}
{job_description}
{jd_fence}
"#;

/// Included only when a reference resume is available. Replace: {reference_text}, {fence}
pub const REFERENCE_SECTION_TEMPLATE: &str = r#"
REFERENCE RESUME (the candidate's existing resume; reuse its facts and structure where it helps):
{fence}
{reference_text}
{fence}
"#;

/// Resume task. Replace: {context}, {header_block}
pub const RESUME_PROMPT_TEMPLATE: &str = r#"{context}
TASK: Write a complete resume tailored to the job description above, in Markdown.

Start with exactly this header block, keeping lines whose value is empty out of it:
{header_block}

Then include these sections, in this order, each as a level-2 heading (`## `):
1. Summary: 2-3 sentences aimed squarely at this role.
2. Technical Skills: grouped lists, covering the job's keywords the candidate can credibly claim.
3. Professional Experience: one entry per role, 3-5 bullet points each, starting with action verbs and quantifying impact.
4. Education: use the candidate's education as given.
5. Projects: use the candidate's projects, re-described to show relevance to this job, with links.

FORMATTING RULES:
- Markdown only. Do NOT wrap the answer in code fences.
- Use `-` for bullet points and `**bold**` for role titles and employer names.
- Keep it to what fits on one or two pages.
- Do not add commentary before or after the resume."#;

/// Cover-letter task. Replace: {context}, {name}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"{context}
TASK: Write a short, persuasive cover letter (at most 4 paragraphs) for the job description above, in Markdown.

STRUCTURE:
1. Hook: open with why this specific role and company matter to the candidate, naming the company if the job description does.
2. Bridge: connect two or three concrete achievements from the candidate's background to the job's key requirements.
3. Close: restate enthusiasm and ask directly for an interview.

RULES:
- Begin with a line reading `[Date]` for the candidate to fill in.
- Address the letter to the hiring manager or team named in the job description; if none is named, use "Dear Hiring Manager,".
- Sign off with the candidate's name: {name}
- Sound genuinely human-written; avoid cliches and filler.
- Markdown only. Do NOT wrap the answer in code fences and do not add commentary."#;
