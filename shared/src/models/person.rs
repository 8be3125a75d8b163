//! Person Model

use serde::{Deserialize, Serialize};

use crate::ids::{Fingerprint, FingerprintBuilder, Fingerprinted, LocalId};

/// Membership grade of a person
///
/// Parsed from the authority's string codes; anything unrecognised maps to
/// `Unknown`, which is also the fallback key for menu pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Alevi,
    Infantil,
    Juvenil,
    SituEsp,
    Fester,
    Jubilat,
    Colaborador,
    Baixa,
    Unknown,
}

impl Grade {
    /// The authority's code for this grade
    pub fn code(&self) -> &'static str {
        match self {
            Grade::Alevi => "alevi",
            Grade::Infantil => "infantil",
            Grade::Juvenil => "juvenil",
            Grade::SituEsp => "situ_esp",
            Grade::Fester => "fester",
            Grade::Jubilat => "jubilat",
            Grade::Colaborador => "colaborador",
            Grade::Baixa => "baixa",
            Grade::Unknown => "unknown",
        }
    }

    /// Parse an authority code, falling back to `Unknown`
    pub fn parse(code: Option<&str>) -> Grade {
        match code {
            Some("alevi") => Grade::Alevi,
            Some("infantil") => Grade::Infantil,
            Some("juvenil") => Grade::Juvenil,
            Some("situ_esp") => Grade::SituEsp,
            Some("fester") => Grade::Fester,
            Some("jubilat") => Grade::Jubilat,
            Some("colaborador") => Grade::Colaborador,
            Some("baixa") => Grade::Baixa,
            _ => Grade::Unknown,
        }
    }
}

/// Member record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Immutable once created
    pub id: LocalId,
    pub name: String,
    pub family_name: String,
    pub nif: String,
    pub grade: Grade,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub permissions: Vec<String>,
}

impl Person {
    /// Presentable name, derived from the raw name fields
    ///
    /// Derived data: excluded from the fingerprint.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.name.trim(), self.family_name.trim());
        capitalize_words(full.trim())
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Capitalize the first letter of every whitespace-separated word
fn capitalize_words(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl Fingerprinted for Person {
    fn fingerprint(&self) -> Fingerprint {
        let mut builder = FingerprintBuilder::new()
            .int(self.id.0)
            .field(&self.name)
            .field(&self.family_name)
            .field(&self.nif)
            .field(self.grade.code())
            .opt(self.email.as_deref())
            .opt(self.phone.as_deref())
            .opt(self.mobile_phone.as_deref());
        for permission in &self.permissions {
            builder = builder.field(permission);
        }
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Person {
        Person {
            id: LocalId(43),
            name: "  josé ".into(),
            family_name: "garcía vidal".into(),
            nif: "12345678Z".into(),
            grade: Grade::Fester,
            email: Some("jose@example.com".into()),
            phone: None,
            mobile_phone: None,
            permissions: vec!["events:list".into()],
        }
    }

    #[test]
    fn display_name_trims_and_capitalizes() {
        assert_eq!(person().display_name(), "José García Vidal");
    }

    #[test]
    fn grade_parse_falls_back_to_unknown() {
        assert_eq!(Grade::parse(Some("fester")), Grade::Fester);
        assert_eq!(Grade::parse(Some("president")), Grade::Unknown);
        assert_eq!(Grade::parse(None), Grade::Unknown);
    }

    #[test]
    fn fingerprint_ignores_derived_name_but_not_raw_fields() {
        let a = person();
        let mut b = person();
        b.email = Some("other@example.com".into());
        assert_eq!(a.fingerprint(), person().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
