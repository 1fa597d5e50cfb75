/// Aggregation layer: one snapshot in, the full view bundle out.
///
/// Every view is computed from the same snapshot, so the whole bundle
/// reflects exactly one filter state. No operation here can fail: empty
/// and degenerate inputs produce each view's defined zero/empty form, and
/// the optional product-level view degrades to a structured marker.

pub mod bundle;
pub mod views;
