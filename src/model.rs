use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One company row of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub name: String,
    pub website_url: Option<String>,
}

impl CompanyRecord {
    pub fn new(name: impl Into<String>, website_url: Option<String>) -> Self {
        Self {
            name: name.into(),
            website_url: website_url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
        }
    }

    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Contact data extracted from a company site. Absent fields were not found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub emails: BTreeSet<String>,
    pub phones: BTreeSet<String>,
    pub address: Option<String>,
    pub about_text: Option<String>,
    pub instagram_handle: Option<String>,
    pub linkedin_url: Option<String>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
            && self.phones.is_empty()
            && self.address.is_none()
            && self.about_text.is_none()
            && self.instagram_handle.is_none()
            && self.linkedin_url.is_none()
    }

    /// Field-wise merge where `preferred` wins whenever it holds a non-empty value.
    pub fn merge_preferring(self, preferred: ExtractionResult) -> ExtractionResult {
        fn pick(preferred: Option<String>, fallback: Option<String>) -> Option<String> {
            preferred.filter(|v| !v.trim().is_empty()).or(fallback)
        }

        ExtractionResult {
            emails: if preferred.emails.is_empty() {
                self.emails
            } else {
                preferred.emails
            },
            phones: if preferred.phones.is_empty() {
                self.phones
            } else {
                preferred.phones
            },
            address: pick(preferred.address, self.address),
            about_text: pick(preferred.about_text, self.about_text),
            instagram_handle: pick(preferred.instagram_handle, self.instagram_handle),
            linkedin_url: pick(preferred.linkedin_url, self.linkedin_url),
        }
    }

    /// Caller-facing value for one output field; list fields are joined with `, `.
    pub fn value(&self, field: Field) -> Option<String> {
        match field {
            Field::Email => join_set(&self.emails),
            Field::Phone => join_set(&self.phones),
            Field::Address => self.address.clone(),
            Field::About => self.about_text.clone(),
            Field::Instagram => self.instagram_handle.clone(),
            Field::Linkedin => self.linkedin_url.clone(),
        }
    }

    /// Every output field with its caller-facing value.
    pub fn fields(&self) -> Vec<(Field, Option<String>)> {
        Field::ALL.iter().map(|f| (*f, self.value(*f))).collect()
    }
}

fn join_set(values: &BTreeSet<String>) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().cloned().collect::<Vec<_>>().join(", "))
    }
}

/// Output columns written back to the company table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Email,
    Instagram,
    Linkedin,
    Phone,
    Address,
    About,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Email,
        Field::Instagram,
        Field::Linkedin,
        Field::Phone,
        Field::Address,
        Field::About,
    ];

    /// Default column header in the company table.
    pub fn default_column(self) -> &'static str {
        match self {
            Field::Email => "Mail",
            Field::Instagram => "Instagram",
            Field::Linkedin => "Linkedin",
            Field::Phone => "Telefon",
            Field::Address => "Adres",
            Field::About => "Hakkımızda",
        }
    }

    pub fn parse(name: &str) -> Option<Field> {
        match name.trim().to_lowercase().as_str() {
            "email" | "mail" => Some(Field::Email),
            "instagram" => Some(Field::Instagram),
            "linkedin" => Some(Field::Linkedin),
            "phone" | "telefon" => Some(Field::Phone),
            "address" | "adres" => Some(Field::Address),
            "about" | "hakkımızda" | "hakkimizda" => Some(Field::About),
            _ => None,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_column())
    }
}
