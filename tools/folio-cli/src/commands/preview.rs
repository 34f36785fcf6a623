//! Live terminal preview of the typewriter.

use std::io::Write;
use std::ops::ControlFlow;
use std::time::Duration;

use folio_common::clock::RateController;
use folio_common::config::AppConfig;
use folio_host::{run_realtime, Host, RealtimeOptions};
use folio_motion::typewriter::{Typewriter, TypewriterOptions, TypewriterState};

/// Terminal redraw rate.
const REDRAW_HZ: u32 = 30;

pub async fn run(
    config: &AppConfig,
    text: String,
    speed_ms: Option<f64>,
    delay_ms: Option<f64>,
    duration_secs: f64,
) -> anyhow::Result<()> {
    let motion = &config.motion;
    motion.validate()?;
    let run_for = preview_duration(duration_secs)?;

    let host = Host::from_config(motion);
    let options = TypewriterOptions::new(text)
        .with_speed(speed_ms.unwrap_or(motion.typewriter_speed_ms))
        .with_delay(delay_ms.unwrap_or(motion.typewriter_delay_ms));
    let typewriter = Typewriter::mount(&host, options, motion.cursor_blink_ms);

    let mut redraw = RateController::new(REDRAW_HZ);
    let mut stdout = std::io::stdout();

    let realtime = RealtimeOptions {
        run_for: Some(run_for),
        ..RealtimeOptions::for_host(&host)
    };
    let mut write_error = None;
    run_realtime(&host, realtime, |host| {
        if !redraw.should_tick(host.now_ms()) {
            return ControlFlow::Continue(());
        }
        match draw(&mut stdout, &typewriter.snapshot()) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                write_error = Some(e);
                ControlFlow::Break(())
            }
        }
    })
    .await;

    if let Some(e) = write_error {
        return Err(e.into());
    }
    draw(&mut stdout, &typewriter.snapshot())?;
    writeln!(stdout)?;
    typewriter.unmount();
    Ok(())
}

fn draw(out: &mut impl Write, state: &TypewriterState) -> std::io::Result<()> {
    let cursor = if state.cursor_visible { '|' } else { ' ' };
    write!(out, "\r\x1b[2K{}{}", state.revealed_text, cursor)?;
    out.flush()
}

/// `--duration-secs` as a `Duration`; negative, NaN and out-of-range values
/// are rejected.
fn preview_duration(secs: f64) -> anyhow::Result<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) => Ok(duration),
        Err(e) => anyhow::bail!("Invalid --duration-secs {secs}: {e}"),
    }
}
