//! Offline classifier and glyph lookups.

use serde::Serialize;

use digiprobe_core::{
    CategoryColor, Metrics, OperatorGlyph, QualityCategory, classify, color_of, format_mos,
    format_ping, format_speed, glyph_of,
};

use crate::cli::{ClassifyArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Classification {
    category: QualityCategory,
    color: CategoryColor,
    hex: &'static str,
    metrics: Metrics,
}

fn classification(metrics: Metrics) -> Classification {
    let category = classify(&metrics);
    let color = color_of(category);
    Classification {
        category,
        color,
        hex: color.hex(),
        metrics,
    }
}

pub fn handle_classify(args: &ClassifyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let result = classification(Metrics {
        ping_ms: args.ping,
        download_mbps: args.download,
        upload_mbps: args.upload,
        browsing_ms: args.browsing,
        video_mos: args.mos,
    });

    let colored = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &result,
        |c| {
            output::detail_lines(&[
                (
                    "Quality",
                    output::paint(&c.category.to_string(), Some(c.color), colored),
                ),
                ("Color", format!("{} ({})", c.color, c.hex)),
                ("Ping", format_ping(c.metrics.ping_ms)),
                ("Download", format_speed(c.metrics.download_mbps)),
                ("Video MOS", format_mos(c.metrics.video_mos)),
            ])
        },
        |c| c.category.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[derive(Debug, Serialize)]
struct GlyphView<'a> {
    operator: &'a str,
    #[serde(flatten)]
    glyph: OperatorGlyph,
}

pub fn handle_glyph(label: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let view = GlyphView {
        operator: label,
        glyph: glyph_of(label),
    };
    let out = output::render_single(
        &global.output,
        &view,
        |v| {
            output::detail_lines(&[
                ("Operator", v.operator.to_owned()),
                ("Letter", v.glyph.letter.to_string()),
                ("Color", v.glyph.color.to_owned()),
            ])
        },
        |v| v.glyph.letter.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_carries_matching_color() {
        let c = classification(Metrics {
            ping_ms: 20.0,
            download_mbps: 5.0,
            upload_mbps: 0.0,
            browsing_ms: 0.0,
            video_mos: 4.0,
        });
        assert_eq!(c.category, QualityCategory::Good);
        assert_eq!(c.color, CategoryColor::Green);
        assert_eq!(c.hex, "#22c55e");
    }
}
