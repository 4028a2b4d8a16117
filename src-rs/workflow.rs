use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dialog::{Dialogs, DONE_TITLE, ERROR_TITLE};
use crate::error::RunError;
use crate::fetch::ImageFetcher;
use crate::params::MapRequestParams;
use crate::prefs::{PreferenceStore, PREF_API_KEY, PREF_STYLES};
use crate::request::{build_with_endpoint, STATIC_MAPS_ENDPOINT};
use crate::shape::TargetShape;
use crate::style::translate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    Filled,
    SkippedUnsupported(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_count: usize,
    pub filled_count: usize,
    pub skipped_labels: Vec<String>,
}

impl RunSummary {
    fn record(&mut self, outcome: FillOutcome) {
        match outcome {
            FillOutcome::Filled => self.filled_count += 1,
            FillOutcome::SkippedUnsupported(kind) => self.skipped_labels.push(kind),
        }
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped_labels.len()
    }

    pub fn has_skips(&self) -> bool {
        !self.skipped_labels.is_empty()
    }

    /// Body of the "Done" dialog: one line per skipped shape, then the tally.
    pub fn message(&self) -> String {
        let mut lines: Vec<String> = self
            .skipped_labels
            .iter()
            .map(|kind| format!("{kind} is not supported and so was skipped."))
            .collect();
        lines.push(format!(
            "{} of {} selected objects were filled",
            self.filled_count, self.total_count
        ));
        lines.join("\n")
    }
}

/// Runs a batch against the default Static Maps endpoint.
pub fn run<S: TargetShape>(
    params: &MapRequestParams,
    selection: &mut [S],
    prefs: &mut dyn PreferenceStore,
    fetcher: &mut dyn ImageFetcher,
) -> Result<RunSummary, RunError> {
    run_with_endpoint(STATIC_MAPS_ENDPOINT, params, selection, prefs, fetcher)
}

/// Fills each shape of `selection`, in order, with a map sized to it.
///
/// Unsupported shapes are skipped and reported in the summary. Validation,
/// preference and fetch failures stop the run; shapes filled before the
/// failure keep their new fill.
pub fn run_with_endpoint<S: TargetShape>(
    endpoint: &str,
    params: &MapRequestParams,
    selection: &mut [S],
    prefs: &mut dyn PreferenceStore,
    fetcher: &mut dyn ImageFetcher,
) -> Result<RunSummary, RunError> {
    let rules = params.validate()?;
    let style_fragment = translate(&rules);

    let mut summary = RunSummary {
        total_count: selection.len(),
        ..RunSummary::default()
    };
    info!(
        shapes = summary.total_count,
        style_rules = rules.len(),
        "generating maps"
    );

    for shape in selection.iter_mut() {
        let outcome = fill_shape(endpoint, params, &style_fragment, shape, prefs, fetcher)?;
        summary.record(outcome);
    }

    info!(
        filled = summary.filled_count,
        skipped = summary.skipped_count(),
        "map generation finished"
    );
    Ok(summary)
}

fn fill_shape<S: TargetShape>(
    endpoint: &str,
    params: &MapRequestParams,
    style_fragment: &str,
    shape: &mut S,
    prefs: &mut dyn PreferenceStore,
    fetcher: &mut dyn ImageFetcher,
) -> Result<FillOutcome, RunError> {
    let size = match shape.fill_dimensions() {
        Ok(size) => size,
        Err(unsupported) => {
            warn!(kind = %unsupported.kind, "skipping unsupported shape");
            return Ok(FillOutcome::SkippedUnsupported(unsupported.kind));
        }
    };

    // Saved before every request so a later failure still keeps these values.
    prefs.set(PREF_API_KEY, &params.api_key)?;
    prefs.set(PREF_STYLES, params.styles_text())?;

    let request = build_with_endpoint(endpoint, params, size, style_fragment);
    debug!(
        kind = shape.kind(),
        width = size.width,
        height = size.height,
        "fetching map"
    );
    let image = fetcher.fetch(&request)?;
    shape.apply_image_fill(&image);
    Ok(FillOutcome::Filled)
}

/// Runs the batch and reports the result through `dialogs`: one error
/// dialog on a fatal failure, a summary only when shapes were skipped.
pub fn generate_map<S: TargetShape>(
    endpoint: &str,
    params: &MapRequestParams,
    selection: &mut [S],
    prefs: &mut dyn PreferenceStore,
    fetcher: &mut dyn ImageFetcher,
    dialogs: &mut dyn Dialogs,
) -> Result<RunSummary, RunError> {
    match run_with_endpoint(endpoint, params, selection, prefs, fetcher) {
        Ok(summary) => {
            if summary.has_skips() {
                dialogs.alert(DONE_TITLE, &summary.message());
            }
            Ok(summary)
        }
        Err(err) => {
            dialogs.error(ERROR_TITLE, &err.to_string());
            Err(err)
        }
    }
}
