//! # Cooperative style scheduler
//!
//! Drawing thousands of segments, or restyling all of them when the time cursor moves,
//! is split into small batches. The host calls [`StyleScheduler::run_frame`] once per
//! animation frame (or any other yield point), and each call does one batch of work.
//!
//! ## Cancellation
//!
//! Each queued job carries the [`Epoch`] that was current when it was scheduled.
//! Starting a new restyle bumps the style epoch; tearing down bumps both.
//! A job whose epoch is no longer current is dropped without touching anything,
//! so a superseded restyle can never write after a newer one was issued.

use crate::catalog::{RoadCatalog, RoadId, SegmentKey};
use crate::config::BatchSize;
use crate::congestion::{Classification, CongestionError, CongestionIndex};
use crate::selection::SelectionState;
use crate::style::SegmentStyle;
use crate::widget::MapWidget;
use chrono::NaiveDateTime;
use congestion_data::format_timestamp;
use std::collections::{HashMap, VecDeque};
use std::fmt::{Display, Formatter};
use tracing::{debug, info, warn};

/// A generation counter. Work tagged with an older epoch is stale.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for Epoch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Job {
    Draw { next_road: usize },
    Restyle { time: NaiveDateTime, next_segment: usize },
}

#[derive(Copy, Clone, Debug)]
struct ScheduledJob {
    epoch: Epoch,
    job: Job,
}

/// One line on the map: a single part of a road.
#[derive(Debug, Clone)]
pub struct DrawnSegment<H> {
    key: SegmentKey,
    handle: H,
    style: SegmentStyle,
    /// Set while the pointer is over the segment; restyles leave it alone.
    emphasized: bool,
}

impl<H> DrawnSegment<H> {
    pub fn key(&self) -> &SegmentKey {
        &self.key
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn style(&self) -> &SegmentStyle {
        &self.style
    }

    pub fn is_emphasized(&self) -> bool {
        self.emphasized
    }
}

/// Read-only data a frame needs.
#[derive(Copy, Clone, Debug)]
pub struct Lookup<'a> {
    pub catalog: &'a RoadCatalog,
    pub congestion: &'a CongestionIndex,
}

/// How far the initial draw pass has come.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DrawProgress {
    pub roads_drawn: usize,
    pub total_roads: usize,
}

impl DrawProgress {
    pub fn is_complete(&self) -> bool {
        self.roads_drawn >= self.total_roads
    }

    pub fn percent(&self) -> usize {
        (self.roads_drawn * 100)
            .checked_div(self.total_roads)
            .unwrap_or(100)
    }
}

/// What a single call to [`StyleScheduler::run_frame`] did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Nothing live was queued.
    Idle,
    Drew(DrawProgress),
    Restyled {
        epoch: Epoch,
        applied: usize,
        remaining: usize,
    },
}

/// Whether an immediate override marks the segment as emphasized.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Emphasis {
    Hovered,
    None,
}

/// The congestion-driven style for a road at the selection's current time.
///
/// Without a snapshot for that time, the road is styled as unknown.
pub fn baseline_style(
    road_id: &RoadId,
    congestion: &CongestionIndex,
    selection: &SelectionState,
) -> SegmentStyle {
    let classification = congestion
        .classify(road_id.as_str(), selection.selected_time())
        .unwrap_or_else(|_| Classification::unknown());
    SegmentStyle::baseline(&classification, selection.is_selected(road_id))
}

/// Owns the drawn segments and every pending batch of work on them.
#[derive(Debug)]
pub struct StyleScheduler<H> {
    segments: Vec<DrawnSegment<H>>,
    by_key: HashMap<SegmentKey, usize>,
    queue: VecDeque<ScheduledJob>,
    draw_epoch: Epoch,
    style_epoch: Epoch,
    draw_batch: BatchSize,
    restyle_batch: BatchSize,
    progress: DrawProgress,
}

impl<H> StyleScheduler<H> {
    pub fn new(draw_batch: BatchSize, restyle_batch: BatchSize) -> Self {
        Self {
            segments: Vec::new(),
            by_key: HashMap::new(),
            queue: VecDeque::new(),
            draw_epoch: Epoch::default(),
            style_epoch: Epoch::default(),
            draw_batch,
            restyle_batch,
            progress: DrawProgress {
                roads_drawn: 0,
                total_roads: 0,
            },
        }
    }

    /// Drawn segments, in draw order.
    pub fn segments(&self) -> &[DrawnSegment<H>] {
        &self.segments
    }

    pub fn segment(&self, key: &SegmentKey) -> Option<&DrawnSegment<H>> {
        self.by_key.get(key).map(|&i| &self.segments[i])
    }

    pub fn style_of(&self, key: &SegmentKey) -> Option<&SegmentStyle> {
        self.segment(key).map(DrawnSegment::style)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True while any drawn part of the road is emphasized.
    pub fn is_road_emphasized(&self, road_id: &RoadId) -> bool {
        self.segments
            .iter()
            .any(|segment| segment.emphasized && segment.key.road_id() == road_id)
    }

    pub fn style_epoch(&self) -> Epoch {
        self.style_epoch
    }

    pub fn draw_progress(&self) -> DrawProgress {
        self.progress
    }

    /// True when no live work is queued.
    pub fn is_idle(&self) -> bool {
        !self.queue.iter().any(|scheduled| self.is_live(scheduled))
    }

    fn is_live(&self, scheduled: &ScheduledJob) -> bool {
        match scheduled.job {
            Job::Draw { .. } => scheduled.epoch == self.draw_epoch,
            Job::Restyle { .. } => scheduled.epoch == self.style_epoch,
        }
    }

    /// Schedules drawing every road in the catalog.
    ///
    /// Anything drawn earlier is torn down first.
    pub fn begin_draw<W: MapWidget<Handle = H>>(&mut self, catalog: &RoadCatalog, widget: &mut W) {
        if !self.segments.is_empty() || !self.queue.is_empty() {
            self.teardown(widget);
        }
        self.draw_epoch = self.draw_epoch.next();
        self.progress = DrawProgress {
            roads_drawn: 0,
            total_roads: catalog.len(),
        };
        self.queue.push_back(ScheduledJob {
            epoch: self.draw_epoch,
            job: Job::Draw { next_road: 0 },
        });
        info!(
            roads = catalog.len(),
            batch = self.draw_batch.into_inner(),
            "Drawing roads"
        );
    }

    /// Schedules restyling every drawn segment for `time`.
    ///
    /// Supersedes any restyle still in progress.
    ///
    /// # Errors
    ///
    /// [`CongestionError::NoSnapshotForTime`] if there is no data for `time`.
    /// Nothing is scheduled or cancelled in that case, so existing styles stay as they are.
    pub fn apply_all(
        &mut self,
        time: NaiveDateTime,
        congestion: &CongestionIndex,
    ) -> Result<Epoch, CongestionError> {
        let snapshot = congestion.snapshot_at(time)?;
        self.style_epoch = self.style_epoch.next();
        self.queue.push_back(ScheduledJob {
            epoch: self.style_epoch,
            job: Job::Restyle {
                time: snapshot.timestamp(),
                next_segment: 0,
            },
        });
        debug!(
            epoch = %self.style_epoch,
            time = %format_timestamp(&snapshot.timestamp()),
            segments = self.segments.len(),
            "Scheduled restyle"
        );
        Ok(self.style_epoch)
    }

    /// Runs one batch of the oldest live job. Stale jobs are discarded along the way.
    pub fn run_frame<W: MapWidget<Handle = H>>(
        &mut self,
        lookup: Lookup<'_>,
        selection: &SelectionState,
        widget: &mut W,
    ) -> FrameOutcome {
        while let Some(scheduled) = self.queue.pop_front() {
            if !self.is_live(&scheduled) {
                debug!(epoch = %scheduled.epoch, job = ?scheduled.job, "Dropping superseded job");
                continue;
            }
            let ScheduledJob { epoch, job } = scheduled;
            return match job {
                Job::Draw { next_road } => {
                    self.run_draw_batch(next_road, lookup, selection, widget)
                }
                Job::Restyle { time, next_segment } => {
                    self.run_restyle_batch(epoch, time, next_segment, lookup, selection, widget)
                }
            };
        }

        FrameOutcome::Idle
    }

    fn run_draw_batch<W: MapWidget<Handle = H>>(
        &mut self,
        start: usize,
        lookup: Lookup<'_>,
        selection: &SelectionState,
        widget: &mut W,
    ) -> FrameOutcome {
        let roads = lookup.catalog.roads();
        let end = (start + self.draw_batch.into_inner()).min(roads.len());
        let initial = SegmentStyle::initial();

        for road in &roads[start..end] {
            for (key, path) in road.segments() {
                match widget.create_line(&key, path, &initial) {
                    Ok(handle) => {
                        self.by_key.insert(key.clone(), self.segments.len());
                        self.segments.push(DrawnSegment {
                            key,
                            handle,
                            style: initial,
                            emphasized: false,
                        });
                    }
                    Err(error) => warn!(segment = %key, %error, "Skipping segment"),
                }
            }
        }

        self.progress.roads_drawn = end;
        if end < roads.len() {
            self.queue.push_back(ScheduledJob {
                epoch: self.draw_epoch,
                job: Job::Draw { next_road: end },
            });
        } else {
            info!(segments = self.segments.len(), "Finished drawing roads");
            // The time may have changed while drawing, so read it now
            if let Err(error) = self.apply_all(selection.selected_time(), lookup.congestion) {
                warn!(%error, "Keeping initial styles");
            }
        }

        FrameOutcome::Drew(self.progress)
    }

    fn run_restyle_batch<W: MapWidget<Handle = H>>(
        &mut self,
        epoch: Epoch,
        time: NaiveDateTime,
        start: usize,
        lookup: Lookup<'_>,
        selection: &SelectionState,
        widget: &mut W,
    ) -> FrameOutcome {
        let snapshot = match lookup.congestion.snapshot_at(time) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%epoch, %error, "Abandoning restyle");
                return FrameOutcome::Restyled {
                    epoch,
                    applied: 0,
                    remaining: 0,
                };
            }
        };

        let end = (start + self.restyle_batch.into_inner()).min(self.segments.len());
        let mut applied = 0;
        for segment in &mut self.segments[start..end] {
            if segment.emphasized {
                continue;
            }
            let road_id = segment.key.road_id();
            let classification = snapshot.classify(road_id.as_str());
            let style = SegmentStyle::baseline(&classification, selection.is_selected(road_id));
            widget.set_style(&segment.handle, &style);
            segment.style = style;
            applied += 1;
        }

        let remaining = self.segments.len() - end;
        if remaining > 0 {
            self.queue.push_back(ScheduledJob {
                epoch,
                job: Job::Restyle {
                    time,
                    next_segment: end,
                },
            });
        } else {
            debug!(%epoch, "Restyle complete");
        }

        FrameOutcome::Restyled {
            epoch,
            applied,
            remaining,
        }
    }

    /// Applies a style to one segment right away, bypassing the queue.
    ///
    /// Returns false if no such segment is drawn.
    pub fn apply_one<W: MapWidget<Handle = H>>(
        &mut self,
        key: &SegmentKey,
        style: SegmentStyle,
        emphasis: Emphasis,
        widget: &mut W,
    ) -> bool {
        let Some(&i) = self.by_key.get(key) else {
            debug!(segment = %key, "No drawn segment to style");
            return false;
        };
        let segment = &mut self.segments[i];
        widget.set_style(&segment.handle, &style);
        segment.style = style;
        segment.emphasized = emphasis == Emphasis::Hovered;
        true
    }

    /// Cancels all pending work and removes every drawn line.
    pub fn teardown<W: MapWidget<Handle = H>>(&mut self, widget: &mut W) {
        self.draw_epoch = self.draw_epoch.next();
        self.style_epoch = self.style_epoch.next();
        self.queue.clear();
        for segment in self.segments.drain(..) {
            widget.remove_line(&segment.handle);
        }
        self.by_key.clear();
        self.progress = DrawProgress {
            roads_drawn: 0,
            total_roads: 0,
        };
        debug!("Tore down drawn segments");
    }

    /// Runs one frame after another until nothing live is queued.
    ///
    /// Returns the number of frames that did work.
    pub fn run_until_idle<W: MapWidget<Handle = H>>(
        &mut self,
        lookup: Lookup<'_>,
        selection: &SelectionState,
        widget: &mut W,
    ) -> usize {
        let mut frames = 0;
        while self.run_frame(lookup, selection, widget) != FrameOutcome::Idle {
            frames += 1;
        }
        frames
    }
}
