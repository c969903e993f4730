pub mod layout;
pub mod metric_store;
pub mod occurrence_store;

pub use layout::{ensemble_dir, ensemble_edge_list, GraphDirectory};
pub use metric_store::{GraphletMetricReader, MetricStore};
pub use occurrence_store::{archive_listing, read_occurrences, write_occurrences};
