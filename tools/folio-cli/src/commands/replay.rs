//! Replay a scripted session against the portfolio page.

use std::collections::BTreeMap;
use std::path::PathBuf;

use folio_common::clock::sanitize_ms;
use folio_common::config::AppConfig;
use folio_host::{Host, MIN_INTERVAL_MS};
use folio_motion::scene::{Scene, SceneFrame};
use folio_motion::script::load_script;
use folio_motion::trace::{TraceHeader, TraceWriter};
use folio_page_model::page::PageLayout;

pub fn run(
    config: &AppConfig,
    events: PathBuf,
    out: Option<PathBuf>,
    until_ms: Option<f64>,
    sample_ms: f64,
) -> anyhow::Result<()> {
    let motion = &config.motion;
    motion.validate()?;
    let script = load_script(&events)?;

    let host = Host::from_config(motion);
    let layout = PageLayout::portfolio();
    let scene = Scene::mount(&host, &layout, motion);

    let mut trace = match out {
        Some(path) => Some(TraceWriter::create(path, &TraceHeader::new(motion))?),
        None => None,
    };

    let last_event_ms = script.last().map_or(0.0, |e| e.timestamp_ms);
    let end_ms = until_ms.map_or(last_event_ms, sanitize_ms).max(last_event_ms);
    let sample_ms = sanitize_ms(sample_ms).max(MIN_INTERVAL_MS);

    tracing::info!(
        count = script.len(),
        end_ms,
        sample_ms,
        "Replaying {}",
        events.display()
    );

    let mut sampler = Sampler::new(sample_ms);
    for event in &script {
        sampler.sample_until(&host, &scene, event.timestamp_ms, trace.as_mut())?;
        host.advance_to(event.timestamp_ms);
        host.apply_event(event);
        tracing::debug!(t = event.timestamp_ms, kind = ?event.kind, "Applied event");
    }
    sampler.sample_until(&host, &scene, end_ms, trace.as_mut())?;
    host.advance_to(end_ms);

    let frame = scene.frame();
    print_summary(&frame, &sampler, script.len());

    if let Some(mut writer) = trace {
        writer.flush()?;
        println!(
            "Trace: {} ({} frames)",
            writer.path().display(),
            writer.frames_written()
        );
    }
    Ok(())
}

/// Samples scene frames on a fixed grid and remembers when each section
/// was first seen in view.
struct Sampler {
    interval_ms: f64,
    next_ms: f64,
    frames: usize,
    first_in_view: BTreeMap<String, f64>,
}

impl Sampler {
    fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            next_ms: 0.0,
            frames: 0,
            first_in_view: BTreeMap::new(),
        }
    }

    fn sample_until(
        &mut self,
        host: &Host,
        scene: &Scene,
        until_ms: f64,
        mut trace: Option<&mut TraceWriter>,
    ) -> anyhow::Result<()> {
        while self.next_ms <= until_ms {
            host.advance_to(self.next_ms);
            let frame = scene.frame();
            self.record(&frame);
            if let Some(writer) = trace.as_deref_mut() {
                writer.write_frame(&frame)?;
            }
            self.next_ms += self.interval_ms;
        }
        Ok(())
    }

    fn record(&mut self, frame: &SceneFrame) {
        self.frames += 1;
        for section in frame.sections.iter().filter(|s| s.in_view) {
            self.first_in_view
                .entry(section.id.clone())
                .or_insert(frame.time_ms);
        }
    }
}

fn print_summary(frame: &SceneFrame, sampler: &Sampler, events: usize) {
    println!(
        "Replayed {events} events over {:.0} ms ({} frames sampled)",
        frame.time_ms, sampler.frames
    );
    println!();

    println!("Sections:");
    for section in &frame.sections {
        match sampler.first_in_view.get(&section.id) {
            Some(t) => println!(
                "  {:<12} revealed by {:>6.0} ms  ({}/{} children)",
                section.id, t, section.revealed, section.items
            ),
            None => println!("  {:<12} never revealed", section.id),
        }
    }
    println!();

    let hero = &frame.hero_role;
    println!(
        "Hero role: {:?}{}",
        hero.revealed_text,
        if hero.is_complete { " (complete)" } else { "" }
    );
    println!("Navigation scrolled: {}", frame.nav_scrolled);
    println!(
        "Pointer: ({:.3}, {:.3}) normalized",
        frame.pointer.normalized_x, frame.pointer.normalized_y
    );
    println!();

    println!("Stats:");
    for stat in &frame.stats {
        println!("  {:>6}  {}", stat.display, stat.label);
    }
}
