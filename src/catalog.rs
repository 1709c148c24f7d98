//! Fixed option lists shared with the matching backend. Values are matched
//! exactly (case-sensitive) by the API, so inputs are normalized to the
//! catalog spelling before a request is built.

pub const LOCATIONS: [&str; 19] = [
    "London",
    "Manchester",
    "Birmingham",
    "Edinburgh",
    "Cardiff",
    "Glasgow",
    "Leeds",
    "Bristol",
    "Liverpool",
    "Belfast",
    "Nottingham",
    "Sunderland",
    "Brighton",
    "Croydon",
    "Cambridge",
    "Auchterarder",
    "Aberdeen",
    "Stirling",
    "Dundee",
];

pub const SKILLS: [&str; 14] = [
    "Gardening",
    "Tutor",
    "Driving",
    "Cooking",
    "Web Design",
    "Social Media",
    "Elder Care",
    "First Aid",
    "Translation",
    "Mentoring",
    "DIY/Maintenance",
    "Admin/Clerical",
    "Fundraising",
    "Event Planning",
];

pub const AVAILABILITY: [&str; 4] = ["WEEKDAYS", "WEEKENDS", "EVENINGS", "FULLTIME"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionKind {
    Location,
    Skill,
    Availability,
}

impl OptionKind {
    #[must_use]
    pub const fn values(self) -> &'static [&'static str] {
        match self {
            Self::Location => &LOCATIONS,
            Self::Skill => &SKILLS,
            Self::Availability => &AVAILABILITY,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Skill => "skill",
            Self::Availability => "availability",
        }
    }
}

/// Returns the catalog spelling of `input`, ignoring case and surrounding space.
///
/// # Errors
/// Returns a message listing the accepted values when `input` is unknown.
pub fn normalize(kind: OptionKind, input: &str) -> Result<&'static str, String> {
    let needle = input.trim();
    kind.values()
        .iter()
        .copied()
        .find(|value| value.eq_ignore_ascii_case(needle))
        .ok_or_else(|| {
            format!(
                "unknown {} '{needle}', expected one of: {}",
                kind.label(),
                kind.values().join(", ")
            )
        })
}
