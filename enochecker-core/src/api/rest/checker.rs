//! Task submission and service description endpoints

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, Json},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{handle_eno_error, json_error, AppState};
use crate::api::schemas::ErrorResponse;
use crate::types::{InfoMessage, ResultMessage, TaskDescription, TaskMessage};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// `POST /`: run one task
///
/// The body is decoded by hand so a malformed task is answered with a 400
/// and an error body instead of reaching the dispatcher. If the scheduler
/// drops the request, the task is cancelled.
pub async fn submit_task(State(state): State<AppState>, body: Bytes) -> ApiResult<ResultMessage> {
    let message: TaskMessage = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Malformed task body");
        json_error(StatusCode::BAD_REQUEST, format!("Malformed task: {}", e))
    })?;

    let task = TaskDescription::try_from(message).map_err(|e| {
        warn!(error = %e, "Invalid task");
        handle_eno_error(e)
    })?;
    debug!(task_id = task.task_id(), method = %task.method(), "Task accepted");

    let cancel = CancellationToken::new();
    let _abort_on_drop = cancel.clone().drop_guard();
    let result = state.dispatcher.execute(&task, cancel).await;
    Ok(Json(result))
}

/// `GET /service`
pub async fn service_info(State(state): State<AppState>) -> Json<InfoMessage> {
    Json(state.dispatcher.info())
}

/// `GET /`: manual task submission form
pub async fn index_page(State(state): State<AppState>) -> Html<String> {
    Html(INDEX_TEMPLATE.replace("{{service}}", &html_escape(&state.dispatcher.info().service_name)))
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{{service}} checker</title>
    <style>
        body { font-family: system-ui, sans-serif; max-width: 720px; margin: 40px auto; }
        label { display: block; margin-top: 8px; }
        input, select { width: 100%; padding: 4px; }
        pre { background: #f4f4f4; padding: 12px; }
    </style>
</head>
<body>
    <h1>{{service}} checker</h1>
    <form id="task">
        <label>Method
            <select name="method">
                <option>putflag</option><option>getflag</option>
                <option>putnoise</option><option>getnoise</option>
                <option>havoc</option>
            </select>
        </label>
        <label>Address <input name="address" value="localhost"></label>
        <label>Flag <input name="flag" value="ENOFLAG"></label>
        <label>Team id <input name="teamId" type="number" value="1"></label>
        <label>Related round <input name="relatedRoundId" type="number" value="1"></label>
        <label>Current round <input name="currentRoundId" type="number" value="1"></label>
        <label>Variant <input name="variantId" type="number" value="0"></label>
        <label>Timeout (ms) <input name="timeout" type="number" value="10000"></label>
        <button type="submit">Run</button>
    </form>
    <pre id="result"></pre>
    <script>
        const kinds = { putflag: "flag", getflag: "flag", putnoise: "noise", getnoise: "noise", havoc: "havoc" };
        document.getElementById("task").addEventListener("submit", async (ev) => {
            ev.preventDefault();
            const f = new FormData(ev.target);
            const n = (k) => Number(f.get(k));
            const method = f.get("method");
            const task = {
                taskId: Date.now() % 1000000, method, address: f.get("address"),
                teamId: n("teamId"), teamName: "manual", currentRoundId: n("currentRoundId"),
                relatedRoundId: n("relatedRoundId"), flag: f.get("flag") || null,
                variantId: n("variantId"), timeout: n("timeout"), roundLength: 60000,
                taskChainId: `${kinds[method]}_s0_r${n("relatedRoundId")}_t${n("teamId")}_i${n("variantId")}`,
            };
            const res = await fetch("/", { method: "POST", headers: { "Content-Type": "application/json" }, body: JSON.stringify(task) });
            document.getElementById("result").textContent = JSON.stringify(await res.json(), null, 2);
        });
    </script>
</body>
</html>
"#;
