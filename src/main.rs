//! # similar-scan CLI
//!
//! Command-line interface for the image similarity analyzer.
//!
//! ## Usage
//! ```bash
//! similar-scan scan ~/Photos --threshold 8
//! similar-scan scan ~/Photos --verbose --output json
//! ```

mod cli;

use image_similarity_analyzer::Result;

fn main() -> Result<()> {
    cli::run()
}
