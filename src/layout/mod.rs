mod ego;
pub mod geometry;
mod timeline;
pub mod traversal;
pub(crate) mod types;
pub use ego::compute_ego_layout;
pub use timeline::compute_tree_layout;
pub use types::*;

use geometry::{
    DateScale, MarkerDirection, approx_text_width, fade_in, fade_out, marker_triangle, polyline,
    segment,
};
use traversal::{UnplacedPool, find_patriarch, next_person};

use crate::config::{EgoConfig, EraLabel, LayoutConfig, TimelineConfig};
use crate::error::TreeError;
use crate::ir::{GrampsId, GrampsTree, Person};
use crate::theme::Theme;
use chrono::{Datelike, NaiveDate};
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, info, warn};
