//! CLI binary for assembling a rendering context via stdin.
//!
//! Usage:
//!   echo '{"document": "minuta", "form": {...}, "user": {...}}' \
//!     | cargo run --bin assemble
//!
//! Input (JSON on stdin):
//!   - document: String — "minuta" or "matriz"
//!   - form: Object — the document form payload
//!   - user: Object — acting user ({id, username, role})
//!   - date: Optional<String> — reference date (YYYY-MM-DD), defaults to today
//!
//! Output (JSON on stdout):
//!   - context: Object — the assembled rendering context
//!   - error: Optional<String> — error message if assembly failed

use minutario_engine::{build_matriz_context, build_minuta_context, ActingUser};
use std::io::Read;

#[derive(serde::Deserialize)]
struct AssembleRequest {
    document: String,
    form: serde_json::Value,
    user: ActingUser,
    #[serde(default)]
    date: Option<String>,
}

#[derive(serde::Serialize)]
struct AssembleResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn error_response(msg: String) -> AssembleResponse {
    AssembleResponse {
        context: None,
        error: Some(msg),
    }
}

fn print_and_exit(resp: AssembleResponse) -> ! {
    println!("{}", serde_json::to_string(&resp).unwrap_or_default());
    std::process::exit(1);
}

fn main() {
    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        print_and_exit(error_response(format!("Failed to read stdin: {e}")));
    }

    let request: AssembleRequest = match serde_json::from_str(&input) {
        Ok(r) => r,
        Err(e) => print_and_exit(error_response(format!("Failed to parse request JSON: {e}"))),
    };

    let today = match &request.date {
        Some(date) => match chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => print_and_exit(error_response(format!(
                "Invalid date format '{date}': expected YYYY-MM-DD"
            ))),
        },
        None => chrono::Local::now().date_naive(),
    };

    let context = match request.document.as_str() {
        "minuta" => serde_json::from_value(request.form)
            .map_err(|e| format!("Failed to parse minuta form: {e}"))
            .and_then(|form| {
                build_minuta_context(&form, &request.user, today).map_err(|e| e.to_string())
            }),
        "matriz" => serde_json::from_value(request.form)
            .map_err(|e| format!("Failed to parse matriz form: {e}"))
            .and_then(|form| {
                build_matriz_context(&form, &request.user, today).map_err(|e| e.to_string())
            }),
        other => Err(format!(
            "Unknown document kind '{other}': expected 'minuta' or 'matriz'"
        )),
    };

    match context {
        Ok(ctx) => {
            let json: serde_json::Value = ctx
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect::<serde_json::Map<_, _>>()
                .into();
            let resp = AssembleResponse {
                context: Some(json),
                error: None,
            };
            println!("{}", serde_json::to_string(&resp).unwrap_or_default());
        }
        Err(msg) => print_and_exit(error_response(msg)),
    }
}
