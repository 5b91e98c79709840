//! Async batch processing module
//!
//! This module decodes many image files concurrently, bounded by a
//! configurable concurrency limit.

#[cfg(feature = "async")]
/// Concurrent file decoding with a configurable concurrency limit
pub mod processor {
    use crate::async_decode::{decode_file_async, save_png_async};
    use crate::{IndexedImage, Result, XpkfError};
    use futures::stream::{self, StreamExt, TryStreamExt};
    use std::path::{Path, PathBuf};

    /// Concurrent image decoder
    #[derive(Debug, Clone)]
    pub struct AsyncBatchProcessor {
        concurrency_limit: usize,
    }

    impl AsyncBatchProcessor {
        /// Create a new batch processor, one job per CPU
        pub fn new() -> Self {
            Self {
                concurrency_limit: num_cpus::get(),
            }
        }

        /// Set the concurrency limit
        pub fn with_concurrency(mut self, limit: usize) -> Self {
            self.concurrency_limit = limit.max(1);
            self
        }

        /// Concurrency limit in effect
        pub fn concurrency(&self) -> usize {
            self.concurrency_limit
        }

        /// Decode multiple files concurrently; fails on the first error
        pub async fn decode_files<P: AsRef<Path> + Send + Sync>(
            &self,
            files: Vec<P>,
        ) -> Result<Vec<(PathBuf, IndexedImage)>> {
            stream::iter(files.into_iter().map(|path| async move {
                let path = path.as_ref().to_path_buf();
                let image = decode_file_async(&path).await?;
                Ok::<_, XpkfError>((path, image))
            }))
            .buffer_unordered(self.concurrency_limit)
            .try_collect()
            .await
        }

        /// Stream results as they complete, keeping failures per file
        pub fn decode_files_streaming<P: AsRef<Path> + Send + Sync + 'static>(
            &self,
            files: Vec<P>,
        ) -> impl futures::Stream<Item = (PathBuf, Result<IndexedImage>)> + '_ {
            stream::iter(files.into_iter().map(|path| async move {
                let path = path.as_ref().to_path_buf();
                let result = decode_file_async(&path).await;
                (path, result)
            }))
            .buffer_unordered(self.concurrency_limit)
        }

        /// Decode every file and write `<stem>.png` into `output_dir`
        pub async fn convert_to_png<P: AsRef<Path> + Send + Sync>(
            &self,
            files: Vec<P>,
            output_dir: &Path,
        ) -> Result<Vec<PathBuf>> {
            stream::iter(files.into_iter().map(|path| async move {
                let path = path.as_ref();
                let image = decode_file_async(path).await?;
                let stem = path.file_stem().unwrap_or(path.as_os_str());
                let target = output_dir.join(stem).with_extension("png");
                save_png_async(image, &target).await?;
                Ok::<_, XpkfError>(target)
            }))
            .buffer_unordered(self.concurrency_limit)
            .try_collect()
            .await
        }
    }

    impl Default for AsyncBatchProcessor {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(feature = "async")]
pub use processor::AsyncBatchProcessor;
