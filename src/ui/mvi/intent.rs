/// Marker trait for intents: user actions (filter edits, paging) and
/// completion events (a fetch returned or failed).
pub trait Intent: Send + 'static {}
