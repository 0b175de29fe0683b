//! Output encodings of a [`Scene`](crate::layout::Scene).

pub mod raster;
pub mod table;

pub use raster::{rasterize, RasterImage};
pub use table::{encode_table, RichText, TableOptions};
