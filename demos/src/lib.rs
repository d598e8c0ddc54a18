//! QKS Demo Suite
//!
//! Console helpers shared by the demo binaries, and small statistics over
//! featurized data:
//!
//! - **Per-class mean activation**: how often each feature fires per label
//! - **Nearest-centroid accuracy**: a quick linear-separability check on the
//!   binary features
//!
//! ```ignore
//! use qks_demos::stats::{class_means, nearest_centroid_accuracy};
//!
//! let means = class_means(features.view(), labels.view())?;
//! let accuracy = nearest_centroid_accuracy(features.view(), labels.view())?;
//! ```

pub mod stats;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar for featurization runs.
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}
