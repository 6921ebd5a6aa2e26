use dejavu_core::ipc::{DejavuRequest, DejavuResponse};

use crate::state::AppState;
use crate::subsystems::{accounts, ask, history};

pub async fn handle_request(request: DejavuRequest, state: &AppState) -> DejavuResponse {
    match request {
        DejavuRequest::Ping => DejavuResponse::pong(),
        DejavuRequest::Health => match dejavu_core::db::health_check(&state.pool).await {
            Ok(pg_ver) => DejavuResponse::ok(serde_json::json!({
                "postgresql": pg_ver,
                "classifier": state.classifier.name(),
                "generator": state.generator.name(),
                "status": "healthy"
            })),
            Err(e) => DejavuResponse::err(format!("DB health check failed: {}", e)),
        },
        DejavuRequest::Register {
            username,
            email,
            password,
        } => match accounts::register(&state.pool, &username, &email, &password).await {
            Ok(user) => DejavuResponse::ok(serde_json::json!({
                "id": user.id,
                "username": user.username,
                "email": user.email,
            })),
            Err(e) => DejavuResponse::err(e.to_string()),
        },
        DejavuRequest::Login { email, password } => {
            match accounts::login(&state.pool, &email, &password).await {
                Ok(session) => DejavuResponse::ok(serde_json::json!({
                    "token": session.token,
                    "user_id": session.user_id,
                    "username": session.username,
                })),
                Err(e) => DejavuResponse::err(e.to_string()),
            }
        }
        DejavuRequest::Ask { token, question } => {
            let session = match accounts::authenticate(&state.pool, token).await {
                Ok(s) => s,
                Err(e) => return DejavuResponse::err(e.to_string()),
            };
            match ask::submit_question(
                &state.pool,
                &session,
                &question,
                state.classifier.as_ref(),
                state.generator.as_ref(),
                state.config.generation.max_tokens,
            )
            .await
            {
                Ok(outcome) => match serde_json::to_value(&outcome) {
                    Ok(data) => DejavuResponse::ok(data),
                    Err(e) => DejavuResponse::err(e.to_string()),
                },
                Err(e) => DejavuResponse::err(e.to_string()),
            }
        }
        DejavuRequest::History { token } => {
            let session = match accounts::authenticate(&state.pool, token).await {
                Ok(s) => s,
                Err(e) => return DejavuResponse::err(e.to_string()),
            };
            match history::list_questions(&state.pool, session.user_id).await {
                Ok(questions) => {
                    let count = questions.len();
                    DejavuResponse::ok(serde_json::json!({
                        "questions": questions,
                        "count": count,
                    }))
                }
                Err(e) => DejavuResponse::err(e.to_string()),
            }
        }
    }
}
