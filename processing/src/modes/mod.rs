mod draw_segments;
mod find_groups;
mod neighbours;

pub use draw_segments::draw_segments;
pub use find_groups::{find_groups, select_starts, write_groups, StartGroups};
pub use neighbours::neighbours;
