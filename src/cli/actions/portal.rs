use crate::{
    api::{
        GraphqlClient, GraphqlError, GraphqlRequest, GraphqlResponse,
        operations::{
            self, FieldOutcome, MatchCriteria, MatchTable, RegisteredVolunteer, VolunteerInput,
            VolunteerMatch,
        },
    },
    cli::globals::GlobalArgs,
    pages::{self, Navigation, PrivilegedAction},
    session::{Decision, Denial, SessionGuard},
};
use anyhow::{Result, anyhow};
use serde::de::DeserializeOwned;
use tracing::info;

#[derive(Debug)]
pub struct VolunteerArgs {
    pub globals: GlobalArgs,
    pub input: VolunteerInput,
}

#[derive(Debug)]
pub struct MatchArgs {
    pub globals: GlobalArgs,
    pub criteria: MatchCriteria,
}

/// Failure a user can act on, rendered by the binary as the error message.
fn sign_in_required(reason: Option<&Denial>) -> anyhow::Error {
    match reason {
        Some(denial) => anyhow!("{denial}. Please sign in with `matchgate login`."),
        None => anyhow!("Please sign in with `matchgate login`."),
    }
}

fn application_errors(errors: &[GraphqlError]) -> anyhow::Error {
    let rendered = serde_json::to_string_pretty(errors)
        .unwrap_or_else(|_| format!("{} error(s)", errors.len()));
    anyhow!("request returned errors:\n{rendered}")
}

async fn run<T: DeserializeOwned>(
    guard: &SessionGuard,
    client: &GraphqlClient,
    action: PrivilegedAction,
    request: &GraphqlRequest,
    field: &str,
) -> Result<T> {
    let page = action
        .page()
        .ok_or_else(|| anyhow!("{action} is not available from any page"))?;
    if let Navigation::Redirect { reason, .. } = pages::enter(page, guard) {
        return Err(sign_in_required(reason.as_ref()));
    }

    let response: GraphqlResponse = match client.execute_guarded(guard, request).await? {
        Decision::Proceed(response) => response,
        Decision::Redirect(denial) => return Err(sign_in_required(Some(&denial))),
    };

    match operations::extract::<T>(response, field)? {
        FieldOutcome::Data(value) => Ok(value),
        FieldOutcome::Errors(errors) => Err(application_errors(&errors)),
    }
}

/// # Errors
/// Returns an error when no usable session exists, the call fails, or the
/// API reports application errors.
pub async fn register_volunteer(
    guard: &SessionGuard,
    client: &GraphqlClient,
    input: &VolunteerInput,
) -> Result<RegisteredVolunteer> {
    let volunteer: RegisteredVolunteer = run(
        guard,
        client,
        PrivilegedAction::RegisterVolunteer,
        &input.request()?,
        "registerVolunteer",
    )
    .await?;
    info!(id = %volunteer.id, "volunteer registered");
    Ok(volunteer)
}

/// # Errors
/// Returns an error when no usable session exists, the call fails, or the
/// API reports application errors.
pub async fn match_volunteers(
    guard: &SessionGuard,
    client: &GraphqlClient,
    criteria: &MatchCriteria,
) -> Result<Vec<VolunteerMatch>> {
    run(
        guard,
        client,
        PrivilegedAction::FindMatches,
        &criteria.request()?,
        "findMatches",
    )
    .await
}

/// # Errors
/// See [`register_volunteer`].
pub async fn volunteer(args: VolunteerArgs) -> Result<()> {
    let guard = args.globals.session_guard();
    let client = args.globals.graphql_client()?;
    let volunteer = register_volunteer(&guard, &client, &args.input).await?;

    println!(
        "Volunteer {} registered (id {}) with skills: {}",
        volunteer.name,
        volunteer.id,
        volunteer.skills.join(", ")
    );
    Ok(())
}

/// # Errors
/// See [`match_volunteers`].
pub async fn find_matches(args: MatchArgs) -> Result<()> {
    let guard = args.globals.session_guard();
    let client = args.globals.graphql_client()?;
    let matches = match_volunteers(&guard, &client, &args.criteria).await?;

    print!("{}", MatchTable(&matches));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::{
        ManualClock, MemoryStore, STORAGE_KEY, SessionStore, credential::encode_for_test,
    };
    use serde_json::json;
    use std::{net::TcpListener, sync::Arc, time::Duration};
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NOW: i64 = 1_750_000_000;

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn client_for(server: &MockServer) -> GraphqlClient {
        let endpoint = Url::parse(&format!("{}/graphql", server.uri())).unwrap();
        GraphqlClient::new(endpoint, "matchgate-test/0.1", Duration::from_secs(5)).unwrap()
    }

    fn signed_in(store: &Arc<MemoryStore>) -> SessionGuard {
        let token = encode_for_test(&json!({"sub": "charity-1", "exp": NOW + 600}));
        store.set(STORAGE_KEY, &token).unwrap();
        let guard = SessionGuard::new(store.clone(), Arc::new(ManualClock::at(NOW)));
        guard.load_session();
        guard
    }

    fn criteria() -> MatchCriteria {
        MatchCriteria {
            skill_required: "Tutor".to_string(),
            location: "Leeds".to_string(),
        }
    }

    #[tokio::test]
    async fn match_without_session_sends_nothing() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let guard = SessionGuard::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at(NOW)),
        );
        guard.load_session();

        let err = match_volunteers(&guard, &client_for(&server), &criteria())
            .await
            .err()
            .map(|e| e.to_string());
        assert_eq!(
            err.as_deref(),
            Some("no session established. Please sign in with `matchgate login`.")
        );
    }

    #[tokio::test]
    async fn match_renders_results() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"findMatches": [
                    {
                        "volunteer": {"name": "Ada", "location": "Leeds", "skills": ["Tutor"]},
                        "matchScore": 85
                    },
                    {
                        "volunteer": {"name": "Bob", "location": "Leeds", "skills": ["Cooking"]},
                        "matchScore": 40
                    }
                ]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let guard = signed_in(&store);
        let matches = match_volunteers(&guard, &client_for(&server), &criteria())
            .await
            .unwrap();

        let table = MatchTable(&matches).to_string();
        assert!(table.contains("85% (strong)"));
        assert!(table.contains("40% (weak)"));
    }

    #[tokio::test]
    async fn forbidden_revokes_session() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let guard = signed_in(&store);
        let err = match_volunteers(&guard, &client_for(&server), &criteria())
            .await
            .err()
            .map(|e| e.to_string());

        assert!(err.is_some_and(|e| e.contains("Please sign in")));
        assert!(!guard.is_valid());
        assert_eq!(store.get(STORAGE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn application_errors_keep_session() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{
                    "message": "Authorisation denied. Matching only available to charity users"
                }]
            })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let guard = signed_in(&store);
        let input = VolunteerInput {
            name: "Ada".to_string(),
            location: "Leeds".to_string(),
            skills: vec!["Tutor".to_string()],
            availability: "WEEKENDS".to_string(),
        };
        let err = register_volunteer(&guard, &client_for(&server), &input)
            .await
            .err()
            .map(|e| e.to_string());

        assert!(err.is_some_and(|e| e.contains("Matching only available to charity users")));
        assert!(guard.is_valid());
        assert!(store.get(STORAGE_KEY).unwrap().is_some());
    }
}
