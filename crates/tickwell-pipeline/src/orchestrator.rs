//! Window loop, failure policy and live tail.

use tickwell_fetch::{
    Decompressor, FetchResponse, LzmaDecompressor, Payload, SourceFetcher, TickDecoder,
};
use tickwell_sink::{PersistenceSink, SinkSet};
use tickwell_types::{Tick, Window};
use tracing::{debug, info, trace, warn};

use crate::control::{CancellationProbe, Clock, NeverCancel, SystemClock};
use crate::progress::{NoProgress, ProgressObserver, ProgressUpdate};
use crate::resume::{ResumeCoordinator, last_completed_hour};
use crate::{PipelineError, PipelineState, RunConfig, RunSummary, Settings, WindowFault};

/// Drives one ingestion run from resume planning to the final flush.
///
/// Windows are fetched strictly in order, one at a time. Per window the
/// failure policy is:
///
/// - 404: skip the rest of that calendar day
/// - other non-200 or transport failure: skip the hour
/// - empty body: zero ticks
/// - decompression failure: skip the hour
/// - bad record: skip that record
///
/// Sink failures abort the run immediately.
pub struct PipelineOrchestrator<F> {
    config: RunConfig,
    fetcher: F,
    sinks: SinkSet,
    decompressor: Box<dyn Decompressor>,
    progress: Box<dyn ProgressObserver>,
    clock: Box<dyn Clock>,
    cancel: Box<dyn CancellationProbe>,
}

impl<F: SourceFetcher> PipelineOrchestrator<F> {
    /// Creates an orchestrator with the default decompressor, wall clock,
    /// no progress output and no cancellation.
    #[must_use]
    pub fn new(config: RunConfig, fetcher: F, sinks: SinkSet) -> Self {
        Self {
            config,
            fetcher,
            sinks,
            decompressor: Box::new(LzmaDecompressor),
            progress: Box::new(NoProgress),
            clock: Box::new(SystemClock),
            cancel: Box::new(NeverCancel),
        }
    }

    /// Validates `settings`, opens the sinks it names and creates an
    /// orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] for invalid settings and
    /// [`PipelineError::Sink`] if a sink cannot be opened.
    pub fn from_settings(settings: Settings, fetcher: F) -> Result<Self, PipelineError> {
        let config = settings.validate()?;
        let sinks = config.open_sinks()?;
        Ok(Self::new(config, fetcher, sinks))
    }

    /// Replaces the decompressor.
    #[must_use]
    pub fn with_decompressor(mut self, decompressor: impl Decompressor + 'static) -> Self {
        self.decompressor = Box::new(decompressor);
        self
    }

    /// Replaces the progress observer.
    #[must_use]
    pub fn with_progress(mut self, progress: impl ProgressObserver + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replaces the cancellation probe.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: impl CancellationProbe + 'static) -> Self {
        self.cancel = Box::new(cancel);
        self
    }

    /// Returns the run configuration.
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs to the end of the range, or until cancelled in live-tail mode.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Sink`] on the first sink failure. Window
    /// faults are counted in the summary and never returned.
    pub async fn run(mut self) -> Result<RunSummary, PipelineError> {
        let symbol = self.config.instrument.symbol();
        let decoder = TickDecoder::for_instrument(&self.config.instrument);
        let schema = self.config.schema();

        self.sinks.initialize(schema)?;
        let plan = ResumeCoordinator::new(self.config.resume, schema).plan(
            &mut self.sinks,
            &self.config.range,
            self.clock.now(),
        )?;
        if plan.reset {
            self.sinks.reset()?;
        } else if let Some(from) = plan.replay_from {
            let removed = self.sinks.truncate_from(from)?;
            if removed > 0 {
                info!(from = %from, rows = removed, "Removed rows to be rebuilt");
            }
        }

        let mut summary = RunSummary {
            resumed_from: plan.resumed_from,
            ..RunSummary::default()
        };
        let mut state = PipelineState::new(&symbol, plan.start, plan.end, self.config.interval)
            .with_write_from(plan.replay_from);

        info!(
            asset = %symbol,
            start = %plan.start,
            end = %plan.end,
            windows = state.total(),
            %schema,
            sinks = %self.sinks.describe(),
            resume = %self.config.resume,
            "Starting ingestion"
        );
        if let Some(last) = plan.resumed_from {
            info!(last = %last, from = %plan.start, "Resuming after last persisted row");
        }
        if let Some(first) = self.config.data_starts_after_range() {
            warn!(
                asset = %symbol,
                first = %first,
                "Range starts before the first available data"
            );
        }
        if plan.is_up_to_date() {
            info!(asset = %symbol, "Already up to date");
        }

        self.progress.on_start(state.total());

        loop {
            while let Some(window) = state.next_window() {
                self.process_window(&window, &decoder, &mut state, &mut summary)
                    .await?;
            }

            if !plan.tail {
                break;
            }
            if self.cancel.is_cancelled() {
                info!(asset = %symbol, "Live tail cancelled");
                summary.cancelled = true;
                break;
            }

            self.progress.on_tail_wait(self.config.tail_poll);
            debug!(wait_secs = self.config.tail_poll.as_secs(), "Waiting for new data");
            tokio::time::sleep(self.config.tail_poll).await;
            summary.tail_cycles += 1;

            state.extend_to(last_completed_hour(self.clock.now()));
            debug!(end = %state.end(), remaining = state.remaining(), "Extended live tail");
            self.progress.on_extend(update(&state));
        }

        if let Some(bar) = state.flush_bar() {
            self.sinks.append_bar(&bar)?;
            summary.bars += 1;
        }
        self.sinks.flush()?;

        summary.bytes_downloaded = state.bytes_downloaded();
        info!(asset = %symbol, %summary, "Ingestion finished");
        self.progress.on_finish(&summary);
        Ok(summary)
    }

    async fn process_window(
        &mut self,
        window: &Window,
        decoder: &TickDecoder,
        state: &mut PipelineState,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        let url = self.config.feed.tick_url(&window.asset, window.hour_start);
        trace!(fetch = state.fetch_index(), %url, "Fetching");
        summary.windows_fetched += 1;

        match self.fetcher.fetch(&url).await {
            Ok(response) if response.is_ok() => {
                state.add_bytes(response.body.len());
                self.handle_body(window, response, decoder, state, summary)?;
            }
            Ok(response) if response.is_not_found() => {
                summary.not_found += 1;
                let skipped = state.skip_rest_of_day(window);
                summary.windows_skipped += skipped;
                report(window, &WindowFault::NotFound);
                debug!(window = %window, skipped, "Skipping rest of day");
            }
            Ok(response) => {
                summary.transient_errors += 1;
                let fault = WindowFault::TransientFetch(format!("HTTP {}", response.status));
                report(window, &fault);
            }
            Err(err) => {
                summary.transient_errors += 1;
                report(window, &WindowFault::from(err));
            }
        }

        self.sinks.flush()?;
        self.progress.on_window(window, update(state));
        Ok(())
    }

    fn handle_body(
        &mut self,
        window: &Window,
        response: FetchResponse,
        decoder: &TickDecoder,
        state: &mut PipelineState,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        if response.body.is_empty() {
            summary.empty_blobs += 1;
            debug!(window = %window, "Empty blob, no ticks this hour");
            return Ok(());
        }

        let raw = match self.decompressor.decompress(&response.body) {
            Ok(raw) => raw,
            Err(err) => {
                summary.decompression_errors += 1;
                report(window, &WindowFault::from(err));
                return Ok(());
            }
        };
        drop(response);

        let payload = Payload::split(&raw);
        if payload.banner_lines > 0 {
            summary.banner_lines += payload.banner_lines;
            debug!(window = %window, lines = payload.banner_lines, "Stripped text banner");
        }
        if payload.is_truncated() {
            summary.truncated_blobs += 1;
            warn!(
                window = %window,
                size = raw.len(),
                trailing_bytes = payload.trailing_bytes,
                "Blob is not a whole number of records, truncating"
            );
        }

        let before = summary.ticks;
        for result in decoder.decode_all(&payload, window.hour_start) {
            match result {
                Ok(tick) => self.route(tick, state, summary)?,
                Err(err) => {
                    summary.malformed_records += 1;
                    report(window, &WindowFault::from(err));
                }
            }
        }
        debug!(
            window = %window,
            bytes = raw.len(),
            ticks = summary.ticks - before,
            "Processed window"
        );
        Ok(())
    }

    fn route(
        &mut self,
        tick: Tick,
        state: &mut PipelineState,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        if !state.accepts(&tick) {
            summary.ticks_before_resume += 1;
            return Ok(());
        }
        summary.ticks += 1;
        match state.aggregator_mut() {
            Some(aggregator) => {
                if let Some(bar) = aggregator.process(&tick) {
                    trace!(start = %bar.interval_start, ticks = bar.tick_count, "Bar complete");
                    self.sinks.append_bar(&bar)?;
                    summary.bars += 1;
                }
            }
            None => {
                trace!(ts = %tick.timestamp, ask = tick.ask, bid = tick.bid, "Tick");
                self.sinks.append_tick(&tick)?;
            }
        }
        Ok(())
    }
}

impl<F> std::fmt::Debug for PipelineOrchestrator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("config", &self.config)
            .field("sinks", &self.sinks)
            .finish_non_exhaustive()
    }
}

fn update(state: &PipelineState) -> ProgressUpdate {
    ProgressUpdate {
        done: state.consumed(),
        total: state.total(),
        bytes: state.bytes_downloaded(),
    }
}

fn report(window: &Window, fault: &WindowFault) {
    match fault {
        WindowFault::NotFound => debug!(window = %window, kind = fault.kind(), "No data"),
        WindowFault::MalformedRecord(_) => {
            warn!(window = %window, kind = fault.kind(), "Skipping record: {fault}");
        }
        _ => warn!(window = %window, kind = fault.kind(), "Skipping hour: {fault}"),
    }
}
