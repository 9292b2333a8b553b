pub mod aggregate;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod series;
pub mod table;
pub mod transform;
pub mod visualize;
