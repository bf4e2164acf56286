//! Column-oriented result table.
//!
//! [`CollectionResult`] is the unit the cache persists and the reporting
//! layer consumes. Rows go in through [`CollectionResult::from_records`] or
//! [`CollectionResult::push`] only, so every column always has the same
//! length and the same identifier order.

use crate::record::VacancyRecord;
use serde::{Deserialize, Serialize};

/// Column names in table order.
pub const FIELD_NAMES: [&str; 10] = [
    "Ids",
    "Employer",
    "Name",
    "Salary",
    "From",
    "To",
    "Experience",
    "Schedule",
    "Keys",
    "Description",
];

/// Borrowed view of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Column<'a> {
    Text(&'a [String]),
    Flags(&'a [bool]),
    Amounts(&'a [Option<i64>]),
    Tags(&'a [Vec<String>]),
}

impl Column<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(values) => values.len(),
            Self::Flags(values) => values.len(),
            Self::Amounts(values) => values.len(),
            Self::Tags(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Vacancy table keyed by column. Serialized keys are the [`FIELD_NAMES`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionResult {
    #[serde(rename = "Ids")]
    ids: Vec<String>,
    #[serde(rename = "Employer")]
    employers: Vec<String>,
    #[serde(rename = "Name")]
    names: Vec<String>,
    #[serde(rename = "Salary")]
    has_salary: Vec<bool>,
    #[serde(rename = "From")]
    salary_from: Vec<Option<i64>>,
    #[serde(rename = "To")]
    salary_to: Vec<Option<i64>>,
    #[serde(rename = "Experience")]
    experience: Vec<String>,
    #[serde(rename = "Schedule")]
    schedule: Vec<String>,
    #[serde(rename = "Keys")]
    key_skills: Vec<Vec<String>>,
    #[serde(rename = "Description")]
    descriptions: Vec<String>,
}

impl CollectionResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transpose records into columns, keeping their order.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = VacancyRecord>,
    {
        let mut result = Self::new();
        for record in records {
            result.push(record);
        }
        result
    }

    /// Append one row to every column.
    pub fn push(&mut self, record: VacancyRecord) {
        self.ids.push(record.id);
        self.employers.push(record.employer);
        self.names.push(record.name);
        self.has_salary.push(record.has_salary);
        self.salary_from.push(record.salary_from);
        self.salary_to.push(record.salary_to);
        self.experience.push(record.experience);
        self.schedule.push(record.schedule);
        self.key_skills.push(record.key_skills);
        self.descriptions.push(record.description);
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// True when every column has the same length. Always holds for tables
    /// built through this API; deserialized tables must be checked.
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        FIELD_NAMES
            .iter()
            .filter_map(|name| self.column(name))
            .all(|column| column.len() == self.len())
    }

    /// Look up a column by its field name (see [`FIELD_NAMES`]).
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Column<'_>> {
        let column = match name {
            "Ids" => Column::Text(&self.ids),
            "Employer" => Column::Text(&self.employers),
            "Name" => Column::Text(&self.names),
            "Salary" => Column::Flags(&self.has_salary),
            "From" => Column::Amounts(&self.salary_from),
            "To" => Column::Amounts(&self.salary_to),
            "Experience" => Column::Text(&self.experience),
            "Schedule" => Column::Text(&self.schedule),
            "Keys" => Column::Tags(&self.key_skills),
            "Description" => Column::Text(&self.descriptions),
            _ => return None,
        };
        Some(column)
    }

    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[must_use]
    pub fn employers(&self) -> &[String] {
        &self.employers
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn has_salary(&self) -> &[bool] {
        &self.has_salary
    }

    #[must_use]
    pub fn salary_from(&self) -> &[Option<i64>] {
        &self.salary_from
    }

    #[must_use]
    pub fn salary_to(&self) -> &[Option<i64>] {
        &self.salary_to
    }

    #[must_use]
    pub fn experience(&self) -> &[String] {
        &self.experience
    }

    #[must_use]
    pub fn schedule(&self) -> &[String] {
        &self.schedule
    }

    #[must_use]
    pub fn key_skills(&self) -> &[Vec<String>] {
        &self.key_skills
    }

    #[must_use]
    pub fn descriptions(&self) -> &[String] {
        &self.descriptions
    }

    /// Rebuild row `index` as a record.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<VacancyRecord> {
        if index >= self.len() || !self.is_aligned() {
            return None;
        }
        Some(VacancyRecord {
            id: self.ids[index].clone(),
            employer: self.employers[index].clone(),
            name: self.names[index].clone(),
            has_salary: self.has_salary[index],
            salary_from: self.salary_from[index],
            salary_to: self.salary_to[index],
            experience: self.experience[index].clone(),
            schedule: self.schedule[index].clone(),
            key_skills: self.key_skills[index].clone(),
            description: self.descriptions[index].clone(),
        })
    }

    /// Iterate rows in order.
    pub fn rows(&self) -> impl Iterator<Item = VacancyRecord> + '_ {
        (0..self.len()).filter_map(|index| self.row(index))
    }
}
