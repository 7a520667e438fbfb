use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// The user's identity and background, fed whole into every prompt.
///
/// Every field defaults to empty and an explicit JSON `null` is read as
/// absent, so partially filled profiles never fail to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub phone: String,
    #[serde(deserialize_with = "nullable")]
    pub email: String,
    #[serde(deserialize_with = "nullable")]
    pub linkedin: String,
    #[serde(deserialize_with = "nullable")]
    pub github: String,
    #[serde(deserialize_with = "nullable")]
    pub portfolio: String,
    #[serde(deserialize_with = "nullable")]
    pub address: String,
    #[serde(deserialize_with = "nullable")]
    pub base_summary: String,
    #[serde(deserialize_with = "nullable")]
    pub education: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "nullable")]
    pub professional_experience: Vec<String>,
}

/// A portfolio project. Accepts either an object or the editor's
/// `name | url | description` line form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Project {
    pub name: String,
    pub url: String,
    pub description: String,
}

impl Project {
    /// Parses `name | url | description`. Missing segments are left empty.
    pub fn from_line(line: &str) -> Self {
        let mut parts = line.splitn(3, '|').map(|p| p.trim().to_string());
        Project {
            name: parts.next().unwrap_or_default(),
            url: parts.next().unwrap_or_default(),
            description: parts.next().unwrap_or_default(),
        }
    }

    pub fn to_line(&self) -> String {
        format!("{} | {} | {}", self.name, self.url, self.description)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectRepr {
    Line(String),
    Object {
        #[serde(default, deserialize_with = "nullable")]
        name: String,
        #[serde(default, deserialize_with = "nullable")]
        url: String,
        #[serde(default, deserialize_with = "nullable")]
        description: String,
    },
}

impl<'de> Deserialize<'de> for Project {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match ProjectRepr::deserialize(deserializer)? {
            ProjectRepr::Line(line) => Project::from_line(&line),
            ProjectRepr::Object {
                name,
                url,
                description,
            } => Project {
                name,
                url,
                description,
            },
        })
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A named, saved profile. Generation can target one instead of the
/// profile held in the configuration record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: i64,
    pub name: String,
    pub data: UserProfile,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_yields_default_profile() {
        let profile: UserProfile = serde_json::from_value(json!({})).unwrap();
        assert_eq!(profile, UserProfile::default());
    }

    #[test]
    fn test_null_fields_are_treated_as_absent() {
        let profile: UserProfile = serde_json::from_value(json!({
            "name": "Jane Doe",
            "email": null,
            "education": null,
            "projects": [{"name": "cvgenx", "url": null}]
        }))
        .unwrap();
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.email, "");
        assert!(profile.education.is_empty());
        assert_eq!(profile.projects[0].url, "");
    }

    #[test]
    fn test_project_accepts_editor_line_form() {
        let profile: UserProfile = serde_json::from_value(json!({
            "projects": ["Tracker | https://example.com | Habit tracker app", "Solo"]
        }))
        .unwrap();
        assert_eq!(profile.projects[0].name, "Tracker");
        assert_eq!(profile.projects[0].url, "https://example.com");
        assert_eq!(profile.projects[0].description, "Habit tracker app");
        assert_eq!(profile.projects[1].name, "Solo");
        assert_eq!(profile.projects[1].description, "");
    }

    #[test]
    fn test_camel_case_field_names() {
        let profile = UserProfile {
            base_summary: "Engineer".into(),
            professional_experience: vec!["Acme".into()],
            ..Default::default()
        };
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["baseSummary"], "Engineer");
        assert_eq!(value["professionalExperience"][0], "Acme");
    }
}
