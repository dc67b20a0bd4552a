use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use log::{info, warn};

use crate::app_config::Config;
use crate::caption::CaptionFile;
use crate::file_utils::FileManager;
use crate::reflow_service::ReflowService;

// @module: Application controller for caption reflow

/// Tag inserted into output filenames (`movie.srt` -> `movie.reflowed.srt`)
const OUTPUT_TAG: &str = "reflowed";

/// Main application controller for caption reflow
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Reflow service wired to the configured oracle
    service: ReflowService,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let service = ReflowService::new(config.clone());
        Ok(Self { config, service })
    }

    /// Create a controller with an explicit service, used by tests
    pub fn with_service(config: Config, service: ReflowService) -> Self {
        Self { config, service }
    }

    /// Check that the configured oracle is reachable
    pub async fn test_connection(&self) -> Result<()> {
        self.service
            .test_connection()
            .await
            .map_err(|e| anyhow!("Oracle connection test failed: {}", e))
    }

    /// Run the main workflow for a file or a directory of .srt files
    pub async fn run(&self, input_path: PathBuf, force_overwrite: bool) -> Result<()> {
        if FileManager::dir_exists(&input_path) {
            self.run_folder(&input_path, force_overwrite).await
        } else if FileManager::file_exists(&input_path) {
            self.run_file(&input_path, force_overwrite).await
        } else {
            Err(anyhow!("Input path does not exist: {:?}", input_path))
        }
    }

    /// Reflow every .srt file under a directory
    async fn run_folder(&self, input_dir: &Path, force_overwrite: bool) -> Result<()> {
        let files = FileManager::collect_srt_files(input_dir);
        if files.is_empty() {
            return Err(anyhow!("No .srt files found in {:?}", input_dir));
        }

        info!("Found {} caption file(s) in {:?}", files.len(), input_dir);

        let mut failures = 0;
        for file in &files {
            // Never re-reflow our own outputs
            if file
                .file_stem()
                .map(|s| s.to_string_lossy().ends_with(&format!(".{}", OUTPUT_TAG)))
                .unwrap_or(false)
            {
                continue;
            }

            if let Err(e) = self.run_file(file, force_overwrite).await {
                warn!("Failed to reflow {:?}: {}", file, e);
                failures += 1;
            }
        }

        if failures > 0 {
            return Err(anyhow!("{} of {} file(s) failed to reflow", failures, files.len()));
        }
        Ok(())
    }

    /// Reflow one caption file
    async fn run_file(&self, input_file: &Path, force_overwrite: bool) -> Result<()> {
        let start_time = std::time::Instant::now();

        let output_path = FileManager::generate_output_path(input_file, OUTPUT_TAG);
        if output_path.exists() && !force_overwrite {
            warn!(
                "Skipping {:?}, output already exists (use -f to force overwrite)",
                input_file
            );
            return Ok(());
        }

        let source = CaptionFile::from_file(input_file)?;
        info!(
            "Reflowing {:?} ({} entries, max {} chars/line)",
            input_file,
            source.entries.len(),
            self.config.reflow.max_line_chars
        );

        let reflowed = self.service.reflow(&source.entries).await?;

        let mut output = CaptionFile::new(output_path.clone());
        output.entries = reflowed;
        output.write_to_file(&output_path)?;

        info!(
            "Wrote {} entries to {:?} in {:.1}s",
            output.entries.len(),
            output_path,
            start_time.elapsed().as_secs_f32()
        );
        Ok(())
    }
}
