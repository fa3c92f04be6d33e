use std::fs;
use serde::{Deserialize, Serialize};

/// The owner's portfolio record. Loaded once at startup and read-only
/// for the life of the process; the prompt composer and the profile
/// endpoint both consume it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub tagline: String,
    pub email: String,
    pub location: String,
    pub bio: Vec<String>,
    pub skills: Vec<Skill>,
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub category: String,    // "frontend", "backend", "tools", "ai"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub role: String,
    pub company: String,
    pub period: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub slug: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    pub tags: Vec<String>,
    pub image: String,
    pub color: String,       // accent color for hover effects per project
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialLink {
    pub name: String,
    pub url: String,
    pub icon: String,
}

pub fn load_profile(path: &str) -> Result<Profile, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read profile data from {}: {}", path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse profile data: {}", e))
}
