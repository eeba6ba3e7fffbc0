// wayfinder_core/src/engine.rs

//! The full localization and callout pipeline behind one entry point.
//!
//! Raw fixes are smoothed, gated against the road network, matched to a road, and
//! finally turned into callouts for the audio sink. The engine owns every piece of
//! filter state; the map is borrowed per call so it can be swapped between ticks.

use crate::callouts::{AudioSink, AutoCallout, CalloutPipeline, PipelineEvent, PipelineState};
use crate::config::EngineConfig;
use crate::estimation::{KalmanHeadingFilter, KalmanLocationFilter};
use crate::filters::{FilterContext, MapMatchFilter, MatchedLocation, NearestRoadFilter};
use crate::mapping::MapSnapshot;
use crate::messages::{HeadingFix, LocationFix, PositionedString, SensorInput};
use crate::rulers::{CheapRuler, Ruler};
use crate::types::{LngLatAlt, TimestampMs, WayId};
use crate::user_geometry::UserGeometry;

/// Heading accuracy, in degrees, assumed for course over ground.
const TRAVEL_HEADING_ACCURACY: f64 = 15.0;

/// What one input produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    /// The smoothed location, once there has been a valid fix.
    pub location: Option<LngLatAlt>,
    pub nearest_road: Option<WayId>,
    pub matched: Option<MatchedLocation>,
    /// Callouts submitted to the pipeline by this input.
    pub callouts: Vec<PositionedString>,
    pub pipeline_state: PipelineState,
}

#[derive(Debug, Clone)]
pub struct GeoEngine {
    config: EngineConfig,
    ruler: Option<CheapRuler>,
    location_filter: KalmanLocationFilter,
    heading_filter: KalmanHeadingFilter,
    nearest_road: NearestRoadFilter,
    map_match: MapMatchFilter,
    auto_callout: AutoCallout,
    pipeline: CalloutPipeline,
    phone_heading: Option<(f64, f64)>,
    last_location: Option<(LngLatAlt, TimestampMs)>,
    travel_heading: Option<f64>,
}

impl GeoEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            ruler: None,
            location_filter: KalmanLocationFilter::new(config.kalman.position_sigma),
            heading_filter: KalmanHeadingFilter::new(config.kalman.heading_sigma),
            nearest_road: NearestRoadFilter::new(config.nearest_road.clone()),
            map_match: MapMatchFilter::new(config.map_match.clone()),
            auto_callout: AutoCallout::new(&config.callouts, config.fov.clone()),
            pipeline: CalloutPipeline::new(),
            phone_heading: None,
            last_location: None,
            travel_heading: None,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The ruler in use, once the first fix has fixed its latitude.
    pub fn ruler(&self) -> Option<&CheapRuler> {
        self.ruler.as_ref()
    }

    pub fn pipeline_state(&self) -> PipelineState {
        self.pipeline.state()
    }

    /// Forgets all history, as after a long gap in the location stream.
    pub fn reset(&mut self) {
        self.ruler = None;
        self.location_filter.reset();
        self.heading_filter.reset();
        self.nearest_road.reset();
        self.map_match.reset();
        self.auto_callout.reset();
        self.pipeline = CalloutPipeline::new();
        self.phone_heading = None;
        self.last_location = None;
        self.travel_heading = None;
    }

    pub fn process(&mut self, input: SensorInput, map: &MapSnapshot, sink: &mut dyn AudioSink) -> EngineOutput {
        match input {
            SensorInput::Location(fix) => self.on_location(&fix, map, sink),
            SensorInput::Heading(fix) => {
                self.on_heading(&fix);
                self.output(Vec::new())
            }
            SensorInput::AudioQueueEmpty => {
                self.pipeline.handle(PipelineEvent::AudioQueueEmpty, sink);
                self.output(Vec::new())
            }
            SensorInput::Cancel => {
                tracing::info!("callouts cancelled");
                self.pipeline.handle(PipelineEvent::Cancel, sink);
                self.output(Vec::new())
            }
        }
    }

    fn on_heading(&mut self, fix: &HeadingFix) {
        let heading = self.heading_filter.process(fix.heading, fix.timestamp_ms, fix.accuracy);
        self.phone_heading = Some((heading, fix.accuracy));
    }

    fn on_location(&mut self, fix: &LocationFix, map: &MapSnapshot, sink: &mut dyn AudioSink) -> EngineOutput {
        if !fix.location.is_valid() {
            tracing::warn!(
                longitude = fix.location.longitude,
                latitude = fix.location.latitude,
                "ignoring invalid fix"
            );
            return self.output(Vec::new());
        }

        let location = self
            .location_filter
            .process(&fix.location, fix.timestamp_ms, fix.accuracy);
        let ruler = match self.ruler {
            Some(ruler) if !ruler.needs_replacing(location.latitude) => ruler,
            _ => {
                tracing::debug!(latitude = location.latitude, "new ruler");
                CheapRuler::new(location.latitude)
            }
        };
        self.ruler = Some(ruler);

        let mut derived_speed = 0.0;
        if let Some((previous, previous_ms)) = self.last_location {
            let moved = ruler.distance(&previous, &location);
            let elapsed_ms = fix.timestamp_ms.saturating_sub(previous_ms);
            if elapsed_ms > 0 {
                derived_speed = moved * 1000.0 / elapsed_ms as f64;
            }
            if moved > 0.0 {
                self.travel_heading = Some(ruler.bearing(&previous, &location));
            }
        }
        self.last_location = Some((location, fix.timestamp_ms));

        let ctx = FilterContext::new(map, &ruler);
        let bearing = self
            .travel_heading
            .map(|heading| (heading, TRAVEL_HEADING_ACCURACY))
            .or(self.phone_heading);
        self.nearest_road.update(&location, bearing, fix.timestamp_ms, &ctx);
        let matched = self.map_match.filter(&location, &ctx);

        let mut user = UserGeometry::new(location, fix.timestamp_ms);
        user.phone_heading = self.phone_heading.map(|(heading, _)| heading);
        user.travel_heading = self.travel_heading;
        user.speed = fix.speed.unwrap_or(derived_speed);
        user.fov_distance = self.config.fov.distance;
        user.map_matched_way = matched.map(|m| m.way);
        user.map_matched_location = matched.map(|m| m.projection);

        let callouts = self.auto_callout.update(&user, map, &ruler);
        if !callouts.is_empty() {
            for callout in &callouts {
                tracing::debug!(text = %callout.text, "callout");
            }
            self.pipeline.handle(PipelineEvent::Submit(callouts.clone()), sink);
        }
        self.output(callouts)
    }

    fn output(&self, callouts: Vec<PositionedString>) -> EngineOutput {
        EngineOutput {
            location: self.last_location.map(|(location, _)| location),
            nearest_road: self.nearest_road.get(),
            matched: self.map_match.matched().copied(),
            callouts,
            pipeline_state: self.pipeline.state(),
        }
    }
}
