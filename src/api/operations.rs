//! The two privileged operations of the matching API and their results.

use super::{GraphqlError, GraphqlRequest, GraphqlResponse, error::CallError};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

pub const REGISTER_VOLUNTEER: &str = r"mutation RegisterVolunteer(
  $name: String!
  $location: String!
  $skills: [String!]!
  $availability: String!
) {
  registerVolunteer(
    name: $name
    location: $location
    skills: $skills
    availability: $availability
  ) {
    id
    name
    skills
  }
}";

pub const FIND_MATCHES: &str = r"mutation FindMatches($skillRequired: String!, $location: String!) {
  findMatches(skillRequired: $skillRequired, location: $location) {
    volunteer {
      name
      location
      skills
    }
    matchScore
  }
}";

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct VolunteerInput {
    pub name: String,
    pub location: String,
    pub skills: Vec<String>,
    pub availability: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchCriteria {
    pub skill_required: String,
    pub location: String,
}

fn request_for<V: Serialize>(query: &str, variables: &V) -> Result<GraphqlRequest, CallError> {
    let variables = serde_json::to_value(variables)
        .map_err(|err| CallError::Serialization(format!("Failed to encode variables: {err}")))?;
    Ok(GraphqlRequest {
        query: query.to_string(),
        variables,
    })
}

impl VolunteerInput {
    /// # Errors
    /// Returns an error if the variables cannot be encoded.
    pub fn request(&self) -> Result<GraphqlRequest, CallError> {
        request_for(REGISTER_VOLUNTEER, self)
    }
}

impl MatchCriteria {
    /// # Errors
    /// Returns an error if the variables cannot be encoded.
    pub fn request(&self) -> Result<GraphqlRequest, CallError> {
        request_for(FIND_MATCHES, self)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RegisteredVolunteer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct MatchedVolunteer {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerMatch {
    pub volunteer: MatchedVolunteer,
    pub match_score: f64,
}

impl VolunteerMatch {
    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::of(self.match_score)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreBand {
    Strong,
    Fair,
    Weak,
}

impl ScoreBand {
    #[must_use]
    pub fn of(score: f64) -> Self {
        if score >= 80.0 {
            Self::Strong
        } else if score >= 50.0 {
            Self::Fair
        } else {
            Self::Weak
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strong => write!(f, "strong"),
            Self::Fair => write!(f, "fair"),
            Self::Weak => write!(f, "weak"),
        }
    }
}

/// Either the typed payload of a field or the application errors that
/// replaced it.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldOutcome<T> {
    Data(T),
    Errors(Vec<GraphqlError>),
}

/// Extracts `field` from `data`. Application errors take precedence.
///
/// # Errors
/// Returns an error if the field is missing or has an unexpected shape.
pub fn extract<T: DeserializeOwned>(
    response: GraphqlResponse,
    field: &str,
) -> Result<FieldOutcome<T>, CallError> {
    if !response.errors().is_empty() {
        return Ok(FieldOutcome::Errors(response.errors.unwrap_or_default()));
    }

    let value = response
        .data
        .as_ref()
        .and_then(|data| data.get(field))
        .cloned()
        .unwrap_or(Value::Null);

    serde_json::from_value(value)
        .map(FieldOutcome::Data)
        .map_err(|err| CallError::Parse(format!("Unexpected {field} payload: {err}")))
}

/// Plain-text table of match results.
pub struct MatchTable<'a>(pub &'a [VolunteerMatch]);

impl fmt::Display for MatchTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(
                f,
                "Query successful, but no matches were found for the criteria."
            );
        }

        let rows: Vec<[String; 4]> = self
            .0
            .iter()
            .map(|entry| {
                [
                    entry.volunteer.name.clone(),
                    entry.volunteer.location.clone(),
                    entry.volunteer.skills.join(", "),
                    format!("{}% ({})", entry.match_score, entry.band()),
                ]
            })
            .collect();

        let headers = ["NAME", "LOCATION", "SKILLS", "SCORE"];
        let mut widths = headers.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let line = |f: &mut fmt::Formatter<'_>, cells: [&str; 4]| -> fmt::Result {
            writeln!(
                f,
                "{:<w0$}  {:<w1$}  {:<w2$}  {}",
                cells[0],
                cells[1],
                cells[2],
                cells[3],
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2],
            )
        };

        line(f, headers)?;
        for row in &rows {
            line(f, [&row[0], &row[1], &row[2], &row[3]])?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_variables_use_graphql_names() {
        let input = VolunteerInput {
            name: "Ada".to_string(),
            location: "Leeds".to_string(),
            skills: vec!["Cooking".to_string(), "Driving".to_string()],
            availability: "WEEKENDS".to_string(),
        };
        let request = input.request().unwrap();
        assert_eq!(request.query, REGISTER_VOLUNTEER);
        assert_eq!(
            request.variables,
            json!({
                "name": "Ada",
                "location": "Leeds",
                "skills": ["Cooking", "Driving"],
                "availability": "WEEKENDS"
            })
        );
    }

    #[test]
    fn match_variables_are_camel_case() {
        let criteria = MatchCriteria {
            skill_required: "Tutor".to_string(),
            location: "Dundee".to_string(),
        };
        assert_eq!(
            criteria.request().unwrap().variables,
            json!({"skillRequired": "Tutor", "location": "Dundee"})
        );
    }

    #[test]
    fn score_bands() {
        assert_eq!(ScoreBand::of(100.0), ScoreBand::Strong);
        assert_eq!(ScoreBand::of(80.0), ScoreBand::Strong);
        assert_eq!(ScoreBand::of(79.5), ScoreBand::Fair);
        assert_eq!(ScoreBand::of(50.0), ScoreBand::Fair);
        assert_eq!(ScoreBand::of(49.0), ScoreBand::Weak);
    }

    #[test]
    fn extract_prefers_errors() {
        let response: GraphqlResponse = serde_json::from_value(json!({
            "data": {"findMatches": []},
            "errors": [{"message": "Match query failed"}]
        }))
        .unwrap();
        let outcome: FieldOutcome<Vec<VolunteerMatch>> = extract(response, "findMatches").unwrap();
        assert!(matches!(outcome, FieldOutcome::Errors(errors) if errors.len() == 1));
    }

    #[test]
    fn extract_reads_matches() {
        let response: GraphqlResponse = serde_json::from_value(json!({
            "data": {"findMatches": [{
                "volunteer": {"name": "Ada", "location": "Leeds", "skills": ["Tutor"]},
                "matchScore": 100
            }]}
        }))
        .unwrap();
        let outcome: FieldOutcome<Vec<VolunteerMatch>> = extract(response, "findMatches").unwrap();
        let FieldOutcome::Data(matches) = outcome else {
            panic!("expected data");
        };
        assert_eq!(matches[0].volunteer.name, "Ada");
        assert_eq!(matches[0].band(), ScoreBand::Strong);
    }

    #[test]
    fn extract_rejects_missing_field() {
        let response = GraphqlResponse::default();
        let result: Result<FieldOutcome<RegisteredVolunteer>, _> =
            extract(response, "registerVolunteer");
        assert!(matches!(result, Err(CallError::Parse(_))));
    }

    #[test]
    fn table_renders_rows_and_empty_state() {
        let matches = vec![VolunteerMatch {
            volunteer: MatchedVolunteer {
                name: "Ada".to_string(),
                location: "Leeds".to_string(),
                skills: vec!["Tutor".to_string(), "Cooking".to_string()],
            },
            match_score: 100.0,
        }];
        let rendered = MatchTable(&matches).to_string();
        assert!(rendered.starts_with("NAME"));
        assert!(rendered.contains("Tutor, Cooking"));
        assert!(rendered.contains("100% (strong)"));

        let empty = MatchTable(&[]).to_string();
        assert!(empty.contains("no matches"));
    }
}
