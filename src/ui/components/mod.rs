pub mod card_area;
pub mod header;
pub mod status_panel;
pub mod summary;
