//! Hand the encoded copy to the output sink.

use crate::error::ResizeError;
use crate::storage::BlobSink;
use tracing::info;

/// Write all of `bytes` to `path` on `sink`. Returns the number of bytes written.
pub async fn write(sink: &dyn BlobSink, path: &str, bytes: &[u8]) -> Result<u64, ResizeError> {
    info!("Saving resized copy to {}", path);
    sink.write(path, bytes)
        .await
        .map_err(|source| ResizeError::Write {
            path: path.to_string(),
            source,
        })?;
    Ok(bytes.len() as u64)
}
