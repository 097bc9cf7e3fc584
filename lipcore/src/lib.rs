// error module
pub mod error;

// geometry module
pub mod geometry {
    pub mod periodic;
    pub mod spatial_grid;
}

// data module
pub mod data {
    pub mod frame_range;
    pub mod leaflet;
    pub mod mask;
    pub mod groups;
    pub mod provider;
}

// neighbours module
pub mod neighbours {
    pub mod adjacency;
    pub mod cluster;
    pub mod store;
    pub mod count;
}

// flip-flop module
pub mod flipflop {
    pub mod state;
    pub mod detector;
}

// Re-export commonly used types
pub use error::{AnalysisError, Result};
pub use data::leaflet::Leaflet;
pub use geometry::periodic::{BoxDimensions, PeriodicMode, Position};
