pub mod area_snapshots;
pub mod building_snapshots;
