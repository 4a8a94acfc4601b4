use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

impl fmt::Display for School {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.city {
            Some(city) => write!(f, "{}, {} ({})", self.name, city, self.id),
            None => write!(f, "{} ({})", self.name, self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub company: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl fmt::Display for Education {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.institution)?;
        if !self.degree.is_empty() {
            write!(f, ", {}", self.degree)?;
        }
        match (self.start_year, self.end_year) {
            (Some(start), Some(end)) => write!(f, " ({start}-{end})"),
            (Some(start), None) => write!(f, " ({start}-)"),
            (None, Some(end)) => write!(f, " (-{end})"),
            (None, None) => Ok(()),
        }
    }
}

impl fmt::Display for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.title, self.company)?;
        if self.current {
            write!(f, " (current)")?;
        } else if let Some(end) = &self.end_date {
            write!(f, " (until {end})")?;
        }
        Ok(())
    }
}

/// Profile sections that share the same CRUD endpoints shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Education,
    Experience,
}

impl RecordKind {
    pub fn collection_path(&self) -> &'static str {
        match self {
            RecordKind::Education => "/api/educations",
            RecordKind::Experience => "/api/experiences",
        }
    }

    /// Key under which the backend may wrap a list of this record.
    pub fn envelope_key(&self) -> &'static str {
        match self {
            RecordKind::Education => "educations",
            RecordKind::Experience => "experiences",
        }
    }

    /// Key under which the backend may wrap a single record.
    pub fn item_key(&self) -> &'static str {
        match self {
            RecordKind::Education => "education",
            RecordKind::Experience => "experience",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Education => write!(f, "education"),
            RecordKind::Experience => write!(f, "experience"),
        }
    }
}

/// A profile section record addressable through [`RecordKind`].
pub trait ProfileRecord: Serialize + for<'de> Deserialize<'de> + Send + Sync {
    const KIND: RecordKind;

    fn record_id(&self) -> Option<&str>;
}

impl ProfileRecord for Education {
    const KIND: RecordKind = RecordKind::Education;

    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl ProfileRecord for Experience {
    const KIND: RecordKind = RecordKind::Experience;

    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}
