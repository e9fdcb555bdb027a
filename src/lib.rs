pub mod config;
pub mod error;
pub mod hyperlink;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub use cli::run;
pub use error::TreeError;
pub use hyperlink::link_person_labels;
pub use layout::{EgoOutcome, Layout, compute_ego_layout, compute_tree_layout};
pub use parser::parse_tree_json;
pub use render::render_svg;
