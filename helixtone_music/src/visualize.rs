// Two-panel SVG chart of a conversion.
//
// Top panel: one colored cell per base, labelled with its letter.
// Bottom panel: one bar per note, placed at its onset, 0.9 of its duration
// wide and as tall as its pitch, labelled with note name and length.
//
// The chart reads the sequence and events and never modifies them. An empty
// conversion has nothing to draw, so no file is written.

use crate::alphabet::Sequence;
use crate::beats::Beats;
use crate::error::VisualizeError;
use crate::events::{NoteEvent, total_beats};
use crate::table::{ColorTable, note_name};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fmt;
use std::path::Path;

const HEIGHT: u32 = 720;
const SEQUENCE_PANEL_HEIGHT: u32 = 240;

/// Draw the chart to `path`. Returns `false` without touching the
/// filesystem when there is nothing to draw.
pub fn render_svg(
    sequence: &Sequence,
    events: &[NoteEvent],
    colors: &ColorTable,
    path: &Path,
) -> Result<bool, VisualizeError> {
    if sequence.is_empty() || events.is_empty() {
        log::info!("No sequence or notes to visualize.");
        return Ok(false);
    }
    let end = total_beats(events)
        .ok_or("schedule end is not representable")
        .map_err(render_error(path))?
        .as_f64();

    let width = (sequence.len() as u32).saturating_mul(24).clamp(800, 8000);
    let root = SVGBackend::new(path, (width, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error(path))?;
    let (upper, lower) = root.split_vertically(SEQUENCE_PANEL_HEIGHT);

    let centered = |size: f64| {
        TextStyle::from(FontDesc::new(FontFamily::SansSerif, size, FontStyle::Normal))
            .pos(Pos::new(HPos::Center, VPos::Center))
    };

    let n = sequence.len() as f64;
    let mut top = ChartBuilder::on(&upper)
        .caption("DNA Sequence", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(25)
        .build_cartesian_2d(-0.5f64..n - 0.5, 0f64..1f64)
        .map_err(render_error(path))?;
    top.configure_mesh()
        .disable_mesh()
        .disable_y_axis()
        .x_labels(sequence.len().min(40))
        .x_label_formatter(&|x: &f64| format!("{}", x.round() as i64))
        .draw()
        .map_err(render_error(path))?;
    top.draw_series(sequence.iter().enumerate().map(|(i, base)| {
        let [r, g, b] = *colors.get(base);
        let x = i as f64;
        Rectangle::new([(x - 0.5, 0.0), (x + 0.5, 1.0)], RGBColor(r, g, b).filled())
    }))
    .map_err(render_error(path))?;
    top.draw_series(sequence.iter().enumerate().map(|(i, _)| {
        let x = i as f64;
        Rectangle::new([(x - 0.5, 0.0), (x + 0.5, 1.0)], BLACK.stroke_width(1))
    }))
    .map_err(render_error(path))?;
    top.draw_series(
        sequence
            .iter()
            .enumerate()
            .map(|(i, base)| Text::new(base.to_string(), (i as f64, 0.5), centered(14.0))),
    )
    .map_err(render_error(path))?;

    let lowest = events.iter().map(|e| e.pitch).min().unwrap_or(0);
    let highest = events.iter().map(|e| e.pitch).max().unwrap_or(127);
    let y_floor = f64::from(lowest.saturating_sub(5));
    let y_ceiling = f64::from(highest) + 5.0;

    let mut bottom = ChartBuilder::on(&lower)
        .caption("Musical Notes", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..end, y_floor..y_ceiling)
        .map_err(render_error(path))?;
    bottom
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Time (beats)")
        .y_desc("Note Pitch")
        .y_label_formatter(&|y: &f64| note_name(y.round().clamp(0.0, 127.0) as u8))
        .draw()
        .map_err(render_error(path))?;
    bottom
        .draw_series(sequence.iter().zip(events).map(|(base, event)| {
            let [r, g, b] = *colors.get(base);
            let start = event.onset.as_f64();
            let width = event.duration.as_f64() * 0.9;
            Rectangle::new(
                [(start, y_floor), (start + width, f64::from(event.pitch))],
                RGBColor(r, g, b).mix(0.7).filled(),
            )
        }))
        .map_err(render_error(path))?;
    bottom
        .draw_series(events.iter().map(|event| {
            let middle = event.onset.as_f64() + event.duration.as_f64() / 2.0;
            Text::new(
                note_label(event),
                (middle, f64::from(event.pitch) + 1.5),
                centered(10.0),
            )
        }))
        .map_err(render_error(path))?;

    root.present().map_err(render_error(path))?;
    log::debug!("wrote visualization to {}", path.display());
    Ok(true)
}

fn note_label(event: &NoteEvent) -> String {
    let beats = event.duration.as_f64();
    let plural = if event.duration == Beats::ONE {
        ""
    } else {
        "s"
    };
    format!("{} ({beats} beat{plural})", note_name(event.pitch))
}

fn render_error<E: fmt::Display>(path: &Path) -> impl Fn(E) -> VisualizeError + '_ {
    move |e| VisualizeError::Render {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
