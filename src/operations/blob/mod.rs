mod grouper;

pub use grouper::{blob_count, Blob, BlobGrouper};
