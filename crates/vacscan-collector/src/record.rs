use serde::{Deserialize, Serialize};

/// One vacancy after salary normalization and markup stripping.
///
/// `has_salary` is true iff at least one of `salary_from` / `salary_to` is
/// set; both bounds are already in the base currency and net of tax.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyRecord {
    pub id: String,
    pub employer: String,
    pub name: String,
    pub has_salary: bool,
    pub salary_from: Option<i64>,
    pub salary_to: Option<i64>,
    pub experience: String,
    pub schedule: String,
    pub key_skills: Vec<String>,
    pub description: String,
}

impl VacancyRecord {
    /// Placeholder for a vacancy whose body could not be read.
    #[must_use]
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}
