//! Observer implementations for simulation runs
//!
//! Observers allow composable data collection during a run without coupling
//! the trial loop to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    ports::{Observer, TickReport, TripOutcome, TripSummary},
    types::{Action, Position, State},
};

/// Observation of a single tick during a trip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepObservation {
    /// Tick number within the trip
    pub tick: u64,
    /// State key the decision was made in
    pub state: State,
    /// Action taken
    pub action: Action,
    /// Value the policy reported for the action
    pub value: f64,
    /// Reward received
    pub reward: f64,
    /// Deadline before acting
    pub deadline: i64,
    /// Value written to the table, if an update settled this tick
    pub updated: Option<f64>,
}

impl From<&TickReport> for StepObservation {
    fn from(report: &TickReport) -> Self {
        Self {
            tick: report.tick,
            state: report.state,
            action: report.action,
            value: report.value,
            reward: report.reward,
            deadline: report.deadline,
            updated: report.updated,
        }
    }
}

/// Complete observation of one trip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripObservation {
    /// Trip index (0-based)
    pub trip: usize,
    /// Destination of the trip
    pub destination: Option<Position>,
    /// How the trip ended
    pub outcome: TripOutcome,
    /// Sum of rewards
    pub total_reward: f64,
    /// Ticks in the trip
    pub steps: Vec<StepObservation>,
}

/// Progress bar observer - Shows run progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    arrivals: usize,
    misses: usize,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            arrivals: 0,
            misses: 0,
        }
    }

    fn message(&self) -> String {
        format!("{} missed:{}", self.arrivals, self.misses)
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_trips: usize) -> Result<()> {
        let pb = ProgressBar::new(total_trips as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} trips (arrived:{msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_trip_end(&mut self, summary: &TripSummary) -> Result<()> {
        if summary.outcome.is_success() {
            self.arrivals += 1;
        } else {
            self.misses += 1;
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_position(summary.trip as u64 + 1);
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Metrics observer - Tracks run metrics
#[derive(Debug, Default)]
pub struct MetricsObserver {
    arrivals: usize,
    deadline_misses: usize,
    tick_limit_hits: usize,
    total_trips: usize,
    penalised_ticks: usize,
    tick_counts: Vec<u64>,
}

impl MetricsObserver {
    /// Create a new metrics observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current arrival rate
    pub fn arrival_rate(&self) -> f64 {
        if self.total_trips == 0 {
            0.0
        } else {
            self.arrivals as f64 / self.total_trips as f64
        }
    }

    /// Get average trip length in ticks
    pub fn avg_trip_length(&self) -> f64 {
        if self.tick_counts.is_empty() {
            0.0
        } else {
            self.tick_counts.iter().sum::<u64>() as f64 / self.tick_counts.len() as f64
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_trips: self.total_trips,
            arrivals: self.arrivals,
            deadline_misses: self.deadline_misses,
            tick_limit_hits: self.tick_limit_hits,
            penalised_ticks: self.penalised_ticks,
            arrival_rate: self.arrival_rate(),
            avg_trip_length: self.avg_trip_length(),
        }
    }
}

/// Summary of run metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_trips: usize,
    pub arrivals: usize,
    pub deadline_misses: usize,
    pub tick_limit_hits: usize,
    /// Ticks with a negative reward: illegal moves and detours
    pub penalised_ticks: usize,
    pub arrival_rate: f64,
    pub avg_trip_length: f64,
}

impl Observer for MetricsObserver {
    fn on_tick(&mut self, _trip: usize, report: &TickReport) -> Result<()> {
        if report.reward < 0.0 {
            self.penalised_ticks += 1;
        }
        Ok(())
    }

    fn on_trip_end(&mut self, summary: &TripSummary) -> Result<()> {
        self.total_trips += 1;
        self.tick_counts.push(summary.ticks);
        match summary.outcome {
            TripOutcome::Arrived => self.arrivals += 1,
            TripOutcome::DeadlineExpired => self.deadline_misses += 1,
            TripOutcome::TickLimit => self.tick_limit_hits += 1,
        }
        Ok(())
    }
}

/// JSONL observer - Exports one trip per line
pub struct JsonlObserver {
    writer: BufWriter<File>,
    current_steps: Vec<StepObservation>,
    current_destination: Option<Position>,
}

impl JsonlObserver {
    /// Create a new JSONL observer
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self {
            writer,
            current_steps: Vec::new(),
            current_destination: None,
        })
    }
}

impl Observer for JsonlObserver {
    fn on_trip_start(&mut self, _trip: usize, destination: Position) -> Result<()> {
        self.current_destination = Some(destination);
        self.current_steps.clear();
        Ok(())
    }

    fn on_tick(&mut self, _trip: usize, report: &TickReport) -> Result<()> {
        self.current_steps.push(StepObservation::from(report));
        Ok(())
    }

    fn on_trip_end(&mut self, summary: &TripSummary) -> Result<()> {
        let observation = TripObservation {
            trip: summary.trip,
            destination: self.current_destination.take(),
            outcome: summary.outcome,
            total_reward: summary.total_reward,
            steps: std::mem::take(&mut self.current_steps),
        };

        serde_json::to_writer(&mut self.writer, &observation)?;
        writeln!(&mut self.writer)?;
        self.writer.flush()?;

        Ok(())
    }
}

/// Milestone observer - Tracks the first arrival and the last failed trip
///
/// A run whose last failure comes before its first arrival has settled
/// into reliably reaching the destination.
#[derive(Debug, Default)]
pub struct MilestoneObserver {
    first_arrival: Option<usize>,
    last_failure: Option<usize>,
    trips_seen: usize,
}

impl MilestoneObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// First trip that reached its destination (0-based)
    pub fn first_arrival(&self) -> Option<usize> {
        self.first_arrival
    }

    /// Last trip that did not reach its destination (0-based)
    pub fn last_failure(&self) -> Option<usize> {
        self.last_failure
    }

    /// Trips since the last failure, or all trips if none failed
    pub fn streak(&self) -> usize {
        match self.last_failure {
            Some(trip) => self.trips_seen.saturating_sub(trip + 1),
            None => self.trips_seen,
        }
    }

    /// Display milestone summary
    pub fn display_summary(&self) {
        println!("\n=== Learning Milestones ===");
        match self.first_arrival {
            Some(trip) => println!("  First arrival: trip #{}", trip + 1),
            None => println!("  First arrival: not achieved"),
        }
        match self.last_failure {
            Some(trip) => println!("  Last failure: trip #{}", trip + 1),
            None => println!("  Last failure: none"),
        }
        println!("  Current streak: {} trips", self.streak());
    }
}

impl Observer for MilestoneObserver {
    fn on_trip_end(&mut self, summary: &TripSummary) -> Result<()> {
        self.trips_seen += 1;
        if summary.outcome.is_success() {
            self.first_arrival.get_or_insert(summary.trip);
        } else {
            self.last_failure = Some(summary.trip);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Light;

    fn summary(trip: usize, outcome: TripOutcome) -> TripSummary {
        TripSummary {
            trip,
            outcome,
            ticks: 4,
            total_reward: 6.0,
            deadline_left: 1,
        }
    }

    fn report(tick: u64, reward: f64) -> TickReport {
        TickReport {
            trip: 1,
            tick,
            state: State::clear(Light::Green, Action::Forward),
            action: Action::Forward,
            value: 25.0,
            reward,
            deadline: 10,
            updated: Some(26.0),
        }
    }

    #[test]
    fn metrics_count_outcomes() {
        let mut metrics = MetricsObserver::new();
        metrics.on_tick(0, &report(0, 2.0)).unwrap();
        metrics.on_tick(0, &report(1, -1.0)).unwrap();
        metrics.on_tick(0, &report(2, -0.5)).unwrap();
        metrics.on_trip_end(&summary(0, TripOutcome::Arrived)).unwrap();
        metrics
            .on_trip_end(&summary(1, TripOutcome::DeadlineExpired))
            .unwrap();

        let summary = metrics.summary();
        assert_eq!(summary.total_trips, 2);
        assert_eq!(summary.arrivals, 1);
        assert_eq!(summary.deadline_misses, 1);
        assert_eq!(summary.penalised_ticks, 2);
        assert_eq!(summary.arrival_rate, 0.5);
        assert_eq!(summary.avg_trip_length, 4.0);
    }

    #[test]
    fn milestones_track_first_arrival_and_last_failure() {
        let mut milestones = MilestoneObserver::new();
        for (trip, outcome) in [
            TripOutcome::DeadlineExpired,
            TripOutcome::Arrived,
            TripOutcome::DeadlineExpired,
            TripOutcome::Arrived,
            TripOutcome::Arrived,
        ]
        .into_iter()
        .enumerate()
        {
            milestones.on_trip_end(&summary(trip, outcome)).unwrap();
        }
        assert_eq!(milestones.first_arrival(), Some(1));
        assert_eq!(milestones.last_failure(), Some(2));
        assert_eq!(milestones.streak(), 2);
    }

    #[test]
    fn jsonl_writes_one_line_per_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.jsonl");
        {
            let mut observer = JsonlObserver::new(&path).unwrap();
            for trip in 0..2 {
                observer.on_trip_start(trip, Position::new(3, 4)).unwrap();
                observer.on_tick(trip, &report(0, 2.0)).unwrap();
                observer.on_tick(trip, &report(1, 12.0)).unwrap();
                observer.on_trip_end(&summary(trip, TripOutcome::Arrived)).unwrap();
            }
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: TripObservation = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.steps.len(), 2);
        assert_eq!(first.destination, Some(Position::new(3, 4)));
        assert_eq!(first.steps[1].reward, 12.0);
    }
}
