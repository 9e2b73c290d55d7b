// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

// Configuration sections
pub const SECTION_GLOBAL: &str = "global";
pub const SECTION_INFERENCE: &str = "inference";
pub const SECTION_POST_PROCESSING: &str = "post-processing";
pub const SECTION_BUILDINGS: &str = "buildings";

// Key holding the training configuration inside a checkpoint
pub const CHECKPOINT_PARAMS_KEY: &str = "params";
pub const CHECKPOINT_MODEL_KEY: &str = "model";

// Default discovery pattern, relative to the checkpoint directory
pub const DEFAULT_GLOB_PATTERN: &str = "**/*_inference.tif";

// Default external executables
pub const DEFAULT_QGIS_PROCESS: &str = "qgis_process";
pub const DEFAULT_GDAL_TRANSLATE: &str = "gdal_translate";

// Default geometry simplification parameters
pub const DEFAULT_CELLSIZE_RESAMP: f64 = 0.0;
pub const DEFAULT_REMOVE_HOLES_UNDER: f64 = 0.0;
pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 0.2;
pub const DEFAULT_REDUCE_BEND_TOLERANCE: f64 = 3.0;
pub const DEFAULT_RECTANGULARITY_TOLERANCE: f64 = 0.7;
pub const DEFAULT_COMPACTNESS_TOLERANCE: f64 = 0.8;
pub const DEFAULT_PATTERN_TOLERANCE: f64 = 0.3;
pub const DEFAULT_ORTHOGONALIZE_ANGLE_THRESHOLD: f64 = 20.0;

// Processing models exposed by the qgis project
pub const MODEL_R2VECT: &str = "model:r2vect";
pub const MODEL_SIMPLIFY_ROADS: &str = "model:simplify-road";
pub const MODEL_SIMPLIFY_BUILDINGS: &str = "model:simplify-buildings";
pub const MODEL_SIMPLIFY_4CLASSES: &str = "model:simplify-4classes";
pub const ALGORITHM_PACKAGE: &str = "native:package";

// Creation options passed to gdal_translate for cloud-optimized output
pub const COG_CREATION_OPTIONS: [&str; 3] = ["TILED=YES", "COPY_SRC_OVERVIEWS=YES", "COMPRESS=LZW"];

// Prefix of the temporary directory receiving raw vectorization output
pub const TEMP_DIR_PREFIX: &str = "gdl_qgis_process";
