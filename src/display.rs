//! Plain-text rendering of outcomes and the leaderboard.

use chrono::Local;

use crate::store::Record;
use crate::submission::SubmissionOutcome;

const BOARD_TITLE: &str = "CLASIFICACIÓN RECIENTE";
const EMPTY_BOARD: &str = "No hay registros. Verifica tu tabla o la conexión.";

/// Render up to `limit` records, newest first, one per line.
pub fn render_board(records: &[Record], limit: usize) -> String {
    let mut out = format!("{BOARD_TITLE}\n");
    if records.is_empty() {
        out.push_str(&format!("  {EMPTY_BOARD}\n"));
        return out;
    }

    let width = records
        .iter()
        .take(limit)
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0);

    for record in records.iter().take(limit) {
        let score = record.score();
        let date = record.created_at.with_timezone(&Local).format("%d/%m/%Y");
        out.push_str(&format!(
            "  {} {:<width$}  {:>3}%  {}\n",
            score.emoji(),
            record.name,
            score,
            date,
            width = width,
        ));
    }
    if records.len() > limit {
        out.push_str(&format!("  … y {} más\n", records.len() - limit));
    }
    out
}

/// Render the outcome of one submission.
pub fn render_outcome(outcome: &SubmissionOutcome) -> String {
    match outcome {
        SubmissionOutcome::Success { comment, .. } => {
            format!("Coach Insight:\n  \"{comment}\"")
        }
        SubmissionOutcome::Failure(e) => format!("✗ {e}"),
    }
}
