use crate::dlog;
use crate::storage::KeyValueStore;
use crate::store::WorkoutLog;
use crate::workout::{self, FormFields, LatLng, ValidationError, Workout, WorkoutKind};
use thiserror::Error;

/// Zoom level applied whenever the view re-centers.
pub const MAP_ZOOM: u8 = 15;

/// One-shot source of the user's current coordinates.
pub trait PositionSource {
    fn locate(&mut self) -> Result<LatLng, PositionError>;
}

/// The map, as far as the controller is concerned.
pub trait MapSink {
    fn center(&mut self, at: LatLng, zoom: u8);
    fn place_marker(&mut self, at: LatLng, label: &str);
}

/// The entry list. Rendered entries carry the workout id so a later
/// `open_entry` can point back at the record.
pub trait ListSink {
    fn render(&mut self, workout: &Workout);
}

/// Non-fatal, user-visible notifications.
pub trait Notifier {
    fn alert(&mut self, message: &str);
}

#[derive(Debug, Clone, Error)]
#[error("Could not get your position: {0}")]
pub struct PositionError(pub String);

/// The controller. Owns the history, borrows the surfaces, and reacts to
/// one event at a time; every handler runs to completion before the next.
pub struct App<'ui> {
    map: &'ui mut dyn MapSink,
    list: &'ui mut dyn ListSink,
    notifier: &'ui mut dyn Notifier,
    storage: &'ui mut dyn KeyValueStore,
    log: WorkoutLog,
    selected: WorkoutKind,
    map_ready: bool,
    pending_click: Option<LatLng>,
}

impl<'ui> App<'ui> {
    /// Load the persisted history (fail-open) and render it into the list.
    /// Markers wait until `start` has a map to put them on.
    pub fn new(
        map: &'ui mut dyn MapSink,
        list: &'ui mut dyn ListSink,
        notifier: &'ui mut dyn Notifier,
        storage: &'ui mut dyn KeyValueStore,
    ) -> Self {
        let log = WorkoutLog::load(storage);
        dlog!("history_loaded count={}", log.len());

        let mut app = Self {
            map,
            list,
            notifier,
            storage,
            log,
            selected: WorkoutKind::Running,
            map_ready: false,
            pending_click: None,
        };
        for w in app.log.iter() {
            app.list.render(w);
        }
        app
    }

    /// Startup: resolve the position once. Success centers the map and pins
    /// every stored workout; failure leaves the session without a map, so
    /// nothing can be created, but the list still shows the history.
    pub fn start(&mut self, position: &mut dyn PositionSource) {
        match position.locate() {
            Ok(at) => {
                self.map.center(at, MAP_ZOOM);
                self.map.place_marker(at, "Your Location");
                for w in self.log.iter() {
                    self.map.place_marker(w.at, &marker_label(w));
                }
                self.map_ready = true;
                dlog!("map_ready at={at}");
            }
            Err(e) => {
                tracing::warn!(err = %e, "position unavailable; map stays off");
                self.notifier.alert(&e.to_string());
            }
        }
    }

    pub fn select_kind(&mut self, kind: WorkoutKind) {
        self.selected = kind;
        dlog!("kind_selected kind={}", kind.label());
    }

    pub fn selected_kind(&self) -> WorkoutKind {
        self.selected
    }

    /// A click on the loaded map: remember where, so the next submit can
    /// attach coordinates.
    pub fn map_click(&mut self, at: LatLng) {
        if !self.map_ready {
            dlog!("click_ignored map_not_ready");
            return;
        }
        self.pending_click = Some(at);
    }

    pub fn pending_click(&self) -> Option<LatLng> {
        self.pending_click
    }

    pub fn map_ready(&self) -> bool {
        self.map_ready
    }

    /// Form submission. Without a pending click there is nothing to attach
    /// the workout to and the submit is dropped. A rejected form alerts and
    /// keeps the click, so the user can correct the fields and resubmit.
    /// On success the record is appended, the whole history is mirrored to
    /// storage, and both surfaces get the new entry.
    pub fn submit(&mut self, form: &FormFields) -> Result<(), ValidationError> {
        let Some(at) = self.pending_click else {
            dlog!("submit_ignored no_pending_click");
            return Ok(());
        };

        let workout = match workout::from_form(self.selected, at, form) {
            Ok(w) => w,
            Err(e) => {
                self.notifier.alert(&e.to_string());
                return Err(e);
            }
        };

        dlog!(
            "workout_created id={} kind={}",
            workout.id,
            workout.kind().label()
        );
        self.log.push(workout);
        if let Err(e) = self.log.persist(self.storage) {
            tracing::warn!(err = %e, "could not mirror workouts to storage");
        }

        if let Some(w) = self.log.last() {
            self.list.render(w);
            self.map.place_marker(w.at, &marker_label(w));
        }
        self.pending_click = None;
        Ok(())
    }

    /// A click on a list entry: look the record up by id and re-center the
    /// map on where it happened.
    pub fn open_entry(&mut self, id: &str) {
        let Some(w) = self.log.find(id) else {
            tracing::warn!(id = %id, "no workout with that id");
            return;
        };
        if self.map_ready {
            self.map.center(w.at, MAP_ZOOM);
        }
    }

    pub fn workouts(&self) -> &WorkoutLog {
        &self.log
    }
}

fn marker_label(w: &Workout) -> String {
    format!("{} {}", w.kind().icon(), w.describe())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, WORKOUTS_KEY};

    const HERE: LatLng = LatLng {
        lat: 51.5,
        lng: -0.1,
    };
    const THERE: LatLng = LatLng {
        lat: 48.86,
        lng: 2.35,
    };

    #[derive(Default)]
    struct TestMap {
        centers: Vec<(LatLng, u8)>,
        markers: Vec<(LatLng, String)>,
    }

    impl MapSink for TestMap {
        fn center(&mut self, at: LatLng, zoom: u8) {
            self.centers.push((at, zoom));
        }
        fn place_marker(&mut self, at: LatLng, label: &str) {
            self.markers.push((at, label.to_string()));
        }
    }

    #[derive(Default)]
    struct TestList {
        entries: Vec<String>,
    }

    impl ListSink for TestList {
        fn render(&mut self, workout: &Workout) {
            self.entries.push(workout.id.clone());
        }
    }

    #[derive(Default)]
    struct TestNotifier {
        alerts: Vec<String>,
    }

    impl Notifier for TestNotifier {
        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }
    }

    struct FixedPosition(Result<LatLng, PositionError>);

    impl PositionSource for FixedPosition {
        fn locate(&mut self) -> Result<LatLng, PositionError> {
            self.0.clone()
        }
    }

    // App mutably borrows all four surfaces, so each test drives the app
    // to completion first and inspects the surfaces afterwards.
    struct Surfaces {
        map: TestMap,
        list: TestList,
        notifier: TestNotifier,
        storage: MemoryStore,
    }

    fn surfaces() -> Surfaces {
        Surfaces {
            map: TestMap::default(),
            list: TestList::default(),
            notifier: TestNotifier::default(),
            storage: MemoryStore::new(),
        }
    }

    fn run_form(distance: &str, duration: &str, cadence: &str) -> FormFields {
        FormFields {
            distance: distance.to_string(),
            duration: duration.to_string(),
            cadence: cadence.to_string(),
            ..FormFields::default()
        }
    }

    #[test]
    fn start_centers_and_pins_your_location() {
        let mut s = surfaces();
        let mut app = App::new(&mut s.map, &mut s.list, &mut s.notifier, &mut s.storage);
        app.start(&mut FixedPosition(Ok(HERE)));
        assert!(app.map_ready());

        assert_eq!(s.map.centers, vec![(HERE, MAP_ZOOM)]);
        assert_eq!(s.map.markers.len(), 1);
        assert_eq!(s.map.markers[0].1, "Your Location");
    }

    #[test]
    fn position_failure_alerts_and_blocks_creation() {
        let mut s = surfaces();
        let mut app = App::new(&mut s.map, &mut s.list, &mut s.notifier, &mut s.storage);
        app.start(&mut FixedPosition(Err(PositionError("denied".to_string()))));
        assert!(!app.map_ready());

        // Clicks and submits bounce off a session without a map.
        app.map_click(HERE);
        assert_eq!(app.pending_click(), None);
        app.submit(&run_form("5", "30", "180")).unwrap();
        assert!(app.workouts().is_empty());

        assert_eq!(
            s.notifier.alerts,
            vec!["Could not get your position: denied".to_string()]
        );
        assert!(s.map.centers.is_empty());
        assert!(s.map.markers.is_empty());
    }

    #[test]
    fn submit_without_click_is_dropped() {
        let mut s = surfaces();
        let mut app = App::new(&mut s.map, &mut s.list, &mut s.notifier, &mut s.storage);
        app.start(&mut FixedPosition(Ok(HERE)));
        app.submit(&run_form("5", "30", "180")).unwrap();
        assert!(app.workouts().is_empty());

        assert_eq!(s.storage.get(WORKOUTS_KEY).unwrap(), None);
        assert!(s.list.entries.is_empty());
    }

    #[test]
    fn valid_submit_appends_persists_and_renders() {
        let mut s = surfaces();
        let mut app = App::new(&mut s.map, &mut s.list, &mut s.notifier, &mut s.storage);
        app.start(&mut FixedPosition(Ok(HERE)));
        app.map_click(THERE);
        app.submit(&run_form("5", "30", "180")).unwrap();
        assert_eq!(app.workouts().len(), 1);
        // The click is consumed; the next submit needs a fresh one.
        assert_eq!(app.pending_click(), None);

        assert_eq!(s.list.entries.len(), 1);
        assert_eq!(s.map.markers.len(), 2);
        assert_eq!(s.map.markers[1].0, THERE);
        assert!(s.map.markers[1].1.contains("🏃"));

        let raw = s.storage.get(WORKOUTS_KEY).unwrap().unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["kind"], "running");
    }

    #[test]
    fn rejected_submit_alerts_and_keeps_the_click() {
        let mut s = surfaces();
        let mut app = App::new(&mut s.map, &mut s.list, &mut s.notifier, &mut s.storage);
        app.start(&mut FixedPosition(Ok(HERE)));
        app.map_click(THERE);

        assert!(app.submit(&run_form("0", "30", "180")).is_err());
        assert!(app.workouts().is_empty());
        assert_eq!(app.pending_click(), Some(THERE));

        // Corrected fields go through without another click.
        app.submit(&run_form("5", "30", "180")).unwrap();
        assert_eq!(app.workouts().len(), 1);

        assert_eq!(s.notifier.alerts.len(), 1);
        assert_eq!(s.list.entries.len(), 1);
    }

    #[test]
    fn selected_kind_routes_the_extra_field() {
        let mut s = surfaces();
        let mut app = App::new(&mut s.map, &mut s.list, &mut s.notifier, &mut s.storage);
        app.start(&mut FixedPosition(Ok(HERE)));
        app.select_kind(WorkoutKind::Cycling);
        app.map_click(THERE);

        let form = FormFields {
            distance: "20".to_string(),
            duration: "60".to_string(),
            elevation: "400".to_string(),
            ..FormFields::default()
        };
        app.submit(&form).unwrap();

        let speed = app.workouts().last().and_then(Workout::speed_km_per_h);
        assert_eq!(speed, Some(20.0 / 60.0));
    }

    #[test]
    fn open_entry_recenters_on_the_record() {
        let mut s = surfaces();
        let mut app = App::new(&mut s.map, &mut s.list, &mut s.notifier, &mut s.storage);
        app.start(&mut FixedPosition(Ok(HERE)));
        app.map_click(THERE);
        app.submit(&run_form("5", "30", "180")).unwrap();

        let id = app.workouts().last().map(|w| w.id.clone()).unwrap();
        app.open_entry(&id);
        // Unknown ids leave the view alone.
        app.open_entry("no-such-id");

        assert_eq!(s.map.centers, vec![(HERE, MAP_ZOOM), (THERE, MAP_ZOOM)]);
    }

    #[test]
    fn stored_history_is_rendered_and_pinned_on_startup() {
        let mut s = surfaces();
        {
            let mut log = WorkoutLog::new();
            log.push(Workout::running(5.0, 30.0, HERE, 180.0));
            log.push(Workout::cycling(20.0, 60.0, THERE, 400.0));
            log.persist(&mut s.storage).unwrap();
        }

        let mut app = App::new(&mut s.map, &mut s.list, &mut s.notifier, &mut s.storage);
        assert_eq!(app.workouts().len(), 2);
        app.start(&mut FixedPosition(Ok(HERE)));
        assert!(app.map_ready());

        assert_eq!(s.list.entries.len(), 2);
        // "Your Location" plus one marker per stored workout.
        assert_eq!(s.map.markers.len(), 3);
        assert!(s.map.markers[2].1.contains("🚴"));
    }
}
