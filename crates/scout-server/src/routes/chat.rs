use crate::state::AppState;
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

const CHAT_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Scout</title>
  <style>
    body { font-family: sans-serif; max-width: 640px; margin: 2em auto; }
    .message { margin: 0.75em 0; }
    .message.user .bubble { background: #e8f0fe; }
    .message.bot .bubble { background: #f1f3f4; }
    .bubble { display: inline-block; padding: 0.5em 0.75em; border-radius: 8px; }
    #chat-form { display: flex; gap: 0.5em; margin-top: 1em; }
    #message { flex: 1; }
  </style>
</head>
<body>
  <h1>Scout</h1>
  <div id="messages"></div>
  <form id="chat-form">
    <input id="message" name="message" autocomplete="off" placeholder="Ask anything">
    <button type="submit">Send</button>
  </form>
  <script>
    const form = document.getElementById('chat-form');
    const box = document.getElementById('messages');
    form.addEventListener('submit', async (event) => {
      event.preventDefault();
      const field = document.getElementById('message');
      const body = new URLSearchParams({ message: field.value });
      field.value = '';
      const response = await fetch('/chat', { method: 'POST', body });
      if (response.ok) {
        box.insertAdjacentHTML('beforeend', await response.text());
      } else {
        const detail = await response.json();
        box.insertAdjacentHTML('beforeend',
          '<div class="message bot"><div class="bubble">' + detail.error + '</div></div>');
      }
      box.scrollTop = box.scrollHeight;
    });
  </script>
</body>
</html>
"#;

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    message: String,
}

async fn index() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

async fn chat_handler(
    State(state): State<AppState>,
    Form(form): Form<ChatForm>,
) -> Result<Html<String>, (StatusCode, Json<Value>)> {
    let message = form.message.trim().to_string();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "no message provided"})),
        ));
    }

    let guard = state.gateway.check_input(&message);
    if guard.tripped {
        tracing::info!(token = guard.matched, "guardrail rejected a message");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "that message looks like SQL this assistant will not run"
            })),
        ));
    }

    // `ask` blocks on a runtime of its own, so it must leave the async
    // context first.
    let gateway = state.gateway.clone();
    let question = message.clone();
    let response = tokio::task::spawn_blocking(move || gateway.ask(&question))
        .await
        .map_err(|err| {
            tracing::error!("agent task panicked: {err}");
            internal_error()
        })?
        .map_err(|err| {
            // Detail stays in the log; the user gets a generic failure.
            tracing::error!("agent request failed: {err:#}");
            internal_error()
        })?;

    Ok(Html(message_fragment(&message, &response)))
}

fn internal_error() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "the assistant could not answer, try again"})),
    )
}

/// The fragment appended to the page: the user's message (escaped) and the
/// agent's answer (already HTML).
fn message_fragment(message: &str, response: &str) -> String {
    format!(
        "<div class=\"message user\"><div class=\"bubble\">{}</div></div>\n\
         <div class=\"message bot\"><div class=\"bubble\">{}</div></div>",
        escape_html(message),
        response
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat_handler))
        .with_state(state)
}
