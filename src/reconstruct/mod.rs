//! Layout reconstruction.
//!
//! Heuristics that turn a page of drawing primitives into slide structure:
//! rings, tables, chart rasters, icon rasters and text blocks. [`Reconstructor`] runs
//! them in order; each stage is also usable on its own.

mod chart_clusterer;
mod icon_extractor;
mod options;
mod overlap_filter;
mod reconstructor;
mod role_classifier;
mod shape_merger;
mod table_detector;
mod text_assembler;
mod union_find;

pub use chart_clusterer::{ChartCluster, ChartClusterer, ClusterKind};
pub use icon_extractor::IconExtractor;
pub use options::{
    ChartClusterConfig, IconConfig, LayoutRoleConfig, OverlapFilterConfig, PageSelection,
    ReconstructOptions, ShapeMergerConfig, TableDetectorConfig, TextAssemblyConfig,
};
pub use overlap_filter::OverlapFilter;
pub use reconstructor::Reconstructor;
pub use role_classifier::RoleClassifier;
pub use shape_merger::{merge_shapes, ShapeMerger};
pub use table_detector::{select_row_height, TableDetection, TableDetector};
pub use text_assembler::TextAssembler;
