use crate::app::{App, ListSink, MapSink, Notifier, PositionError, PositionSource};
use crate::storage::SqliteStore;
use crate::store::WorkoutLog;
use crate::workout::{FormFields, LatLng, Workout, WorkoutDetails, WorkoutKind};
use anyhow::{Context, Result, bail};
use std::io::{self, Write};
use std::path::Path;

/// Map surface of the terminal session: every map action becomes one line,
/// so the session transcript shows what a real map would have done.
pub struct TerminalMap;

impl MapSink for TerminalMap {
    fn center(&mut self, at: LatLng, zoom: u8) {
        println!("[map] centered on {at} (zoom {zoom})");
    }

    fn place_marker(&mut self, at: LatLng, label: &str) {
        println!("[map] marker at {at}: {label}");
    }
}

pub struct TerminalList;

impl ListSink for TerminalList {
    fn render(&mut self, workout: &Workout) {
        println!("{}", entry_line(workout, false));
    }
}

pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn alert(&mut self, message: &str) {
        println!("! {message}");
    }
}

/// Stands in for the browser's one-shot geolocation request: answers
/// exactly once per call, success or failure, from the `--at` flag.
pub struct CliPosition {
    raw: String,
}

impl CliPosition {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

impl PositionSource for CliPosition {
    fn locate(&mut self) -> Result<LatLng, PositionError> {
        LatLng::parse(&self.raw)
            .ok_or_else(|| PositionError(format!("\"{}\" is not a LAT,LNG pair", self.raw)))
    }
}

/// One list entry. `details` adds the id, coordinates and timestamp.
pub fn entry_line(w: &Workout, details: bool) -> String {
    let metric = match w.details {
        WorkoutDetails::Running {
            cadence_spm,
            pace_min_per_km,
        } => format!("{pace_min_per_km:.1} min/km\t{cadence_spm} spm"),
        WorkoutDetails::Cycling {
            elevation_gain_m,
            speed_km_per_h,
        } => format!("{speed_km_per_h:.1} km/h\t{elevation_gain_m} m"),
    };

    let mut line = format!(
        "{} {}\t{} km\t{} min\t{metric}",
        w.kind().icon(),
        w.describe(),
        w.distance_km,
        w.duration_min
    );
    if details {
        line.push_str(&format!(
            "\tid={}\tat={}\tcreated={}",
            w.id,
            w.at,
            w.created_at.to_rfc3339()
        ));
    }
    line
}

/// Print the stored history, newest last.
pub fn print_workouts(db: &Path, details: bool) -> Result<()> {
    let storage = SqliteStore::open(db)?;
    let log = WorkoutLog::load(&storage);
    if log.is_empty() {
        bail!("No workouts recorded yet. Start a session and click the map to add one.");
    }
    for w in log.iter() {
        println!("{}", entry_line(w, details));
    }
    Ok(())
}

/// Run the interactive session against the given database. Reads commands
/// from stdin until `quit` or EOF.
pub fn run_session(db: &Path, at: &str) -> Result<()> {
    let mut storage = SqliteStore::open(db)?;
    let mut map = TerminalMap;
    let mut list = TerminalList;
    let mut notifier = TerminalNotifier;

    let mut app = App::new(&mut map, &mut list, &mut notifier, &mut storage);
    app.start(&mut CliPosition::new(at));

    println!("Session open. `help` lists the commands, `quit` leaves.");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush().context("Flushing prompt")?;

        line.clear();
        let read = stdin
            .read_line(&mut line)
            .context("Reading session input")?;
        if read == 0 {
            break; // EOF leaves like `quit`
        }
        if dispatch(&mut app, line.trim()) == Directive::Quit {
            break;
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Directive {
    Continue,
    Quit,
}

fn dispatch(app: &mut App<'_>, line: &str) -> Directive {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Directive::Continue;
    };
    let rest: Vec<&str> = words.collect();

    match (command, rest.as_slice()) {
        ("quit" | "exit", _) => return Directive::Quit,
        ("help", _) => print_help(),
        ("kind", [raw]) => match WorkoutKind::parse(raw) {
            Some(kind) => {
                app.select_kind(kind);
                println!(
                    "{} selected; `add` takes distance km, duration min, {}",
                    kind.label(),
                    kind.extra_field()
                );
            }
            None => println!("Unknown kind. Use `kind running` or `kind cycling`."),
        },
        ("click", [lat, lng]) => {
            let coords = lat.parse::<f64>().ok().zip(lng.parse::<f64>().ok());
            let Some((lat, lng)) = coords.filter(|(a, b)| a.is_finite() && b.is_finite()) else {
                println!("Usage: click LAT LNG");
                return Directive::Continue;
            };
            let at = LatLng { lat, lng };
            app.map_click(at);
            if app.pending_click() == Some(at) {
                println!(
                    "Form open at {at}. `add DISTANCE DURATION {}`",
                    app.selected_kind().extra_field().to_uppercase()
                );
            } else {
                println!("The map is not loaded; clicks go nowhere.");
            }
        }
        ("add", [distance, duration, extra]) => {
            if app.pending_click().is_none() {
                println!("Click the map first: `click LAT LNG`");
                return Directive::Continue;
            }
            let mut form = FormFields {
                distance: (*distance).to_string(),
                duration: (*duration).to_string(),
                ..FormFields::default()
            };
            match app.selected_kind() {
                WorkoutKind::Running => form.cadence = (*extra).to_string(),
                WorkoutKind::Cycling => form.elevation = (*extra).to_string(),
            }
            // A rejected form already alerted through the notifier; the
            // click is still armed for the corrected retry.
            let _ = app.submit(&form);
        }
        ("open", [id]) => app.open_entry(id),
        ("list", []) => {
            for w in app.workouts().iter() {
                println!("{}", entry_line(w, false));
            }
        }
        _ => println!("Unrecognized. `help` lists the commands."),
    }

    Directive::Continue
}

fn print_help() {
    println!("Commands:");
    println!("  kind running|cycling       pick the activity for the next workout");
    println!("  click LAT LNG              click the map (opens the form)");
    println!("  add DIST DUR EXTRA         submit the form; EXTRA is cadence (spm) or elevation (m)");
    println!("  open ID                    re-center the map on a recorded workout");
    println!("  list                       print the recorded workouts");
    println!("  quit                       leave the session");
}
