//! Writes rendered digest pages to a directory instead of mailing them.
//!
//! Used for dry runs and for inspecting the rendered output.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{info, instrument};

use tracker::{DigestPage, DigestSink, SinkError};

use crate::error::MailerError;
use crate::renderer::DigestRenderer;

#[derive(Debug)]
pub struct DirectorySink {
    directory: PathBuf,
    renderer: DigestRenderer,
}

impl DirectorySink {
    pub fn new(directory: impl Into<PathBuf>, renderer: DigestRenderer) -> Self {
        Self {
            directory: directory.into(),
            renderer,
        }
    }

    /// File that page `number` is written to.
    pub fn page_path(&self, number: usize) -> PathBuf {
        self.directory.join(format!("digest-{number:03}.html"))
    }

    async fn write(&self, page: &DigestPage) -> Result<PathBuf, MailerError> {
        let html = self.renderer.render(page)?;
        let path = self.page_path(page.number);
        let write_error = |source| MailerError::Write {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(write_error)?;
        tokio::fs::write(&path, html).await.map_err(write_error)?;
        Ok(path)
    }
}

#[async_trait]
impl DigestSink for DirectorySink {
    #[instrument(skip_all, fields(page = page.number, of = page.count))]
    async fn deliver(&self, page: &DigestPage) -> Result<(), SinkError> {
        let path = self.write(page).await?;
        info!(path = %path.display(), releases = page.release_count(), "wrote digest page");
        Ok(())
    }
}
