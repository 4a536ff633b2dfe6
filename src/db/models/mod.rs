mod area;
mod building;
mod listing;
mod snapshot;

pub use area::Area;
pub use building::Building;
pub use listing::{Listing, ListingKind};
pub use snapshot::MarketSnapshot;
