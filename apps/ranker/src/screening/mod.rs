// Resume screening: multipart intake, PDF + corpus scoring, per-source ranking.
// Model inference goes through the `Embedder` in AppState; PDF parsing runs on the blocking pool.

pub mod handlers;
pub mod pipeline;
pub mod ranking;
pub mod uploads;
