/// Marker trait for screen state.
///
/// States are cloned to publish snapshots and compared to skip redundant
/// renders.
pub trait UiState: Clone + PartialEq + Default + Send + 'static {}
