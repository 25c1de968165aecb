use serde_json::json;

use crate::cli::identity::Claims;
use crate::db::connection;
use crate::engine::{self, SortKey, TaskFilter};
use crate::error::EngineError;
use crate::output;

/// Dashboard view: the summary and breakdown the portal's landing pages
/// show, computed over everything the actor can see.
pub fn run(json_output: bool, claims: &Claims) -> i32 {
    let result = run_inner(json_output, claims);
    match result {
        Ok(code) => code,
        Err(e) => {
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::error(&e)).unwrap()
                );
            } else {
                eprintln!("Error: {}", e.message);
            }
            1
        }
    }
}

fn run_inner(json_output: bool, claims: &Claims) -> Result<i32, EngineError> {
    let conn = connection::open_db()?;
    let actor = claims.resolve_actor()?;
    let today = claims.resolve_as_of()?;

    let listing = engine::list_tasks(
        &conn,
        &actor,
        &TaskFilter::default(),
        SortKey::Deadline,
        1,
        today,
    )?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "summary": output::json::summary_json(&listing.summary),
                "breakdown": listing
                    .breakdown
                    .as_deref()
                    .map(output::json::breakdown_json),
                "as_of": today.to_string()
            })))
            .unwrap()
        );
    } else {
        println!("Status as of {today}");
        output::text::print_summary(&listing.summary);
        if let Some(ref rows) = listing.breakdown {
            output::text::print_breakdown(rows);
        }
    }
    Ok(0)
}
