//! Application-wide constants.

/// Prefix prepended to the source file name to build the destination object key.
pub const EXTRACT_KEY_PREFIX: &str = "extract/";

/// Source file fetched when no `url` parameter is supplied.
pub const DEFAULT_SOURCE_URL: &str = "https://people.sc.fsu.edu/~jburkardt/data/csv/deniro.csv";

/// Bucket used when no `s3_bucket` parameter is supplied.
pub const DEFAULT_BUCKET: &str = "test-bucket";

/// Region used when no `region` parameter is supplied.
pub const DEFAULT_REGION: &str = "eu-central-1";

/// Identifier of the example pipeline graph.
pub const EXAMPLE_DAG_ID: &str = "example_dag";
