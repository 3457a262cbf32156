use std::collections::HashSet;
use std::env;

/// Subjects granted the admin role in addition to the `is_admin` flag
/// stored on the user row. Comma separated in `ADMIN_SUBJECTS`.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    admin_subjects: HashSet<String>,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let admin_subjects = env::var("ADMIN_SUBJECTS")
            .map(|raw| parse_subjects(&raw))
            .unwrap_or_default();

        Self { admin_subjects }
    }

    pub fn is_admin_subject(&self, subject: &str) -> bool {
        self.admin_subjects.contains(subject)
    }
}

fn parse_subjects(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
