#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing shared by the `pet_map` binary: stage progress bars
//! backed by `indicatif`, and a `pretty_env_logger` logger routed through
//! `indicatif-log-bridge` so log lines print above the bars.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use pet_map_spatial::progress::ProgressCallback;

pub use indicatif::MultiProgress;

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg}";
const FACILITY_TEMPLATE: &str = "  {msg} {wide_bar:.cyan/dim} {pos}/{len} facilities {percent}% [{eta}]";
const SOURCE_TEMPLATE: &str = "{msg} {wide_bar:.green/dim} {pos}/{len} files [{elapsed_precise}]";

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("=>-"))
}

/// A pipeline stage rendered as an `indicatif` bar.
///
/// Stages whose size is unknown up front spin until
/// [`ProgressCallback::set_total`] is called, then switch to `sized`.
pub struct StageProgress {
    bar: ProgressBar,
    sized: ProgressStyle,
}

impl StageProgress {
    fn attach(multi: &MultiProgress, bar: ProgressBar, sized: ProgressStyle, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(bar);
        bar.set_message(message.to_string());
        Arc::new(Self { bar, sized })
    }

    /// Bar for per-facility work such as the spatial join.
    #[must_use]
    pub fn facilities(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = ProgressBar::new_spinner().with_style(style(SPINNER_TEMPLATE));
        bar.enable_steady_tick(Duration::from_millis(120));
        Self::attach(multi, bar, style(FACILITY_TEMPLATE), message)
    }

    /// Bar counting source files.
    #[must_use]
    pub fn sources(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let sized = style(SOURCE_TEMPLATE);
        let bar = ProgressBar::new(0).with_style(sized.clone());
        Self::attach(multi, bar, sized, message)
    }
}

impl ProgressCallback for StageProgress {
    fn set_total(&self, total: u64) {
        self.bar.disable_steady_tick();
        self.bar.set_style(self.sized.clone());
        self.bar.set_length(total);
        self.bar.reset();
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Installs the global logger and returns the [`MultiProgress`] every
/// stage bar has to be added to.
///
/// Level defaults to `info`; `RUST_LOG` overrides it. Calling this twice
/// keeps the first logger.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let logger = builder.build();
    let level = logger.filter();

    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden() -> MultiProgress {
        MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden())
    }

    #[test]
    fn facility_bar_switches_to_sized_style() {
        let multi = hidden();
        let progress = StageProgress::facilities(&multi, "Joining");
        progress.set_total(3);
        progress.inc(2);
        progress.set_message("Still joining".to_string());
        progress.finish("Done".to_string());
    }

    #[test]
    fn source_bar_counts_files() {
        let multi = hidden();
        let progress = StageProgress::sources(&multi, "Sources");
        progress.set_total(2);
        progress.inc(1);
        progress.inc(1);
        progress.finish("Sources done".to_string());
    }

    #[test]
    fn second_logger_init_is_harmless() {
        let _first = init_logger();
        let _second = init_logger();
        log::info!("logger ready");
    }
}
