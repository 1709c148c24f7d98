use crate::{
    api::operations::{MatchCriteria, VolunteerInput},
    catalog::{self, OptionKind},
};
use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command};

pub const SUBCOMMAND_VOLUNTEER: &str = "volunteer";
pub const SUBCOMMAND_MATCH: &str = "match";
pub const SUBCOMMAND_OPTIONS: &str = "options";

pub const ARG_NAME: &str = "name";
pub const ARG_LOCATION: &str = "location";
pub const ARG_SKILL: &str = "skill";
pub const ARG_AVAILABILITY: &str = "availability";

fn location_arg() -> Arg {
    Arg::new(ARG_LOCATION)
        .short('l')
        .long(ARG_LOCATION)
        .help("Location, see `matchgate options`")
        .required(true)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(SUBCOMMAND_VOLUNTEER)
                .about("Register a volunteer profile")
                .arg(
                    Arg::new(ARG_NAME)
                        .short('n')
                        .long(ARG_NAME)
                        .help("Volunteer full name")
                        .required(true),
                )
                .arg(location_arg())
                .arg(
                    Arg::new(ARG_SKILL)
                        .short('s')
                        .long(ARG_SKILL)
                        .help("Skill offered; repeat or separate with commas")
                        .action(ArgAction::Append)
                        .value_delimiter(',')
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_AVAILABILITY)
                        .short('a')
                        .long(ARG_AVAILABILITY)
                        .help("One of WEEKDAYS, WEEKENDS, EVENINGS, FULLTIME")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new(SUBCOMMAND_MATCH)
                .about("Find volunteers for a skill and location")
                .arg(
                    Arg::new(ARG_SKILL)
                        .short('s')
                        .long(ARG_SKILL)
                        .help("Skill required")
                        .required(true),
                )
                .arg(location_arg()),
        )
        .subcommand(
            Command::new(SUBCOMMAND_OPTIONS)
                .about("List accepted locations, skills and availability"),
        )
}

fn catalog_value(matches: &ArgMatches, id: &str, kind: OptionKind) -> Result<String> {
    let raw = matches
        .get_one::<String>(id)
        .with_context(|| format!("missing required argument: --{id}"))?;
    catalog::normalize(kind, raw)
        .map(str::to_string)
        .map_err(|err| anyhow!(err))
}

/// # Errors
/// Returns an error if a value is missing or not in the option catalog.
pub fn volunteer_input(matches: &ArgMatches) -> Result<VolunteerInput> {
    let name = matches
        .get_one::<String>(ARG_NAME)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .context("missing required argument: --name")?;

    let mut skills: Vec<String> = Vec::new();
    for raw in matches
        .get_many::<String>(ARG_SKILL)
        .into_iter()
        .flatten()
        .filter(|raw| !raw.trim().is_empty())
    {
        let skill = catalog::normalize(OptionKind::Skill, raw).map_err(|err| anyhow!(err))?;
        if !skills.iter().any(|known| known == skill) {
            skills.push(skill.to_string());
        }
    }
    if skills.is_empty() {
        return Err(anyhow!("at least one --skill is required"));
    }

    Ok(VolunteerInput {
        name,
        location: catalog_value(matches, ARG_LOCATION, OptionKind::Location)?,
        skills,
        availability: catalog_value(matches, ARG_AVAILABILITY, OptionKind::Availability)?,
    })
}

/// # Errors
/// Returns an error if a value is missing or not in the option catalog.
pub fn match_criteria(matches: &ArgMatches) -> Result<MatchCriteria> {
    Ok(MatchCriteria {
        skill_required: catalog_value(matches, ARG_SKILL, OptionKind::Skill)?,
        location: catalog_value(matches, ARG_LOCATION, OptionKind::Location)?,
    })
}
