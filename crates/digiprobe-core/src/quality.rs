// ── Quality classification ──
//
// Pure, deterministic rules turning raw metrics into a category, a display
// color, and an operator marker glyph. No I/O, no state.

use serde::Serialize;

use crate::model::{CategoryColor, Metrics, QualityCategory};

const DEFAULT_GLYPH_COLOR: &str = "#0EA5E9";

/// Operator marker groups, matched in order. First hit wins.
const OPERATOR_GROUPS: [(&[&str], char, &str); 3] = [
    (&["telkomsel", "telekomunikasi selular"], 'T', "#ef4444"),
    (&["indosat", "ooredoo", "hutchison"], 'H', "#eab308"),
    (&["xl", "smartfren", "axiata"], 'X', "#a855f7"),
];

/// Classify a run.
///
/// Bands are checked in order and the first match wins. They are not
/// jointly exhaustive: anything outside the three named bands is `Poor`,
/// even when each metric on its own looks healthy.
pub fn classify(metrics: &Metrics) -> QualityCategory {
    let Metrics {
        ping_ms: ping,
        download_mbps: download,
        video_mos: mos,
        ..
    } = *metrics;

    if download > 5.0 && ping < 20.0 && mos > 4.0 {
        return QualityCategory::Excellent;
    }

    if (2.5..=5.0).contains(&download) && (20.0..=50.0).contains(&ping) && (3.0..=4.0).contains(&mos)
    {
        return QualityCategory::Good;
    }

    if (1.0..2.5).contains(&download) && (50.0..=100.0).contains(&ping) && (2.0..3.0).contains(&mos)
    {
        return QualityCategory::Fair;
    }

    QualityCategory::Poor
}

/// Fixed category → color table.
pub fn color_of(category: QualityCategory) -> CategoryColor {
    match category {
        QualityCategory::Excellent => CategoryColor::Blue,
        QualityCategory::Good => CategoryColor::Green,
        QualityCategory::Fair => CategoryColor::Yellow,
        QualityCategory::Poor => CategoryColor::Red,
    }
}

/// Map marker letter and color for an operator label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperatorGlyph {
    pub letter: char,
    pub color: &'static str,
}

/// Resolve the marker glyph for an operator label.
///
/// Known cellular operator families get their brand letter; anything else
/// uses its own first character, or `W` for an empty label.
pub fn glyph_of(operator_label: &str) -> OperatorGlyph {
    let label = operator_label.to_lowercase();

    for (needles, letter, color) in OPERATOR_GROUPS {
        if needles.iter().any(|n| label.contains(n)) {
            return OperatorGlyph { letter, color };
        }
    }

    let letter = operator_label
        .chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('W');

    OperatorGlyph {
        letter,
        color: DEFAULT_GLYPH_COLOR,
    }
}

// ── Display formatting ───────────────────────────────────────────

/// `"12.34 Mbps"`, or `"512 Kbps"` below 1 Mbps.
pub fn format_speed(mbps: f64) -> String {
    if mbps >= 1.0 {
        format!("{mbps:.2} Mbps")
    } else {
        format!("{:.0} Kbps", mbps * 1000.0)
    }
}

pub fn format_ping(ms: f64) -> String {
    format!("{ms:.0} ms")
}

pub fn format_mos(mos: f64) -> String {
    format!("{mos:.1}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(download: f64, ping: f64, mos: f64) -> Metrics {
        Metrics {
            ping_ms: ping,
            download_mbps: download,
            upload_mbps: 1.0,
            browsing_ms: 700.0,
            video_mos: mos,
        }
    }

    #[test]
    fn excellent_band() {
        assert_eq!(classify(&metrics(12.0, 8.0, 4.6)), QualityCategory::Excellent);
    }

    #[test]
    fn good_band() {
        assert_eq!(classify(&metrics(3.0, 35.0, 3.5)), QualityCategory::Good);
    }

    #[test]
    fn fair_band() {
        assert_eq!(classify(&metrics(1.5, 75.0, 2.5)), QualityCategory::Fair);
    }

    #[test]
    fn healthy_looking_mix_outside_all_bands_is_poor() {
        assert_eq!(classify(&metrics(3.0, 10.0, 3.5)), QualityCategory::Poor);
    }

    #[test]
    fn excellent_boundary_falls_to_good() {
        let m = metrics(5.0, 20.0, 4.0);
        assert_ne!(classify(&m), QualityCategory::Excellent);
        assert_eq!(classify(&m), QualityCategory::Good);
    }

    #[test]
    fn fair_upper_download_bound_is_exclusive() {
        // 2.5 Mbps belongs to the good band only, and ping 75 is outside it.
        assert_eq!(classify(&metrics(2.5, 75.0, 2.5)), QualityCategory::Poor);
    }

    #[test]
    fn fair_inclusive_ping_bounds() {
        assert_eq!(classify(&metrics(1.0, 50.0, 2.0)), QualityCategory::Fair);
        assert_eq!(classify(&metrics(2.4, 100.0, 2.9)), QualityCategory::Fair);
    }

    #[test]
    fn classify_is_deterministic() {
        let m = metrics(4.2, 48.0, 3.1);
        let first = classify(&m);
        for _ in 0..10 {
            assert_eq!(classify(&m), first);
        }
    }

    #[test]
    fn color_table() {
        assert_eq!(color_of(QualityCategory::Excellent), CategoryColor::Blue);
        assert_eq!(color_of(QualityCategory::Good), CategoryColor::Green);
        assert_eq!(color_of(QualityCategory::Fair), CategoryColor::Yellow);
        assert_eq!(color_of(QualityCategory::Poor), CategoryColor::Red);
    }

    #[test]
    fn glyph_known_operators() {
        assert_eq!(
            glyph_of("PT Telkomsel"),
            OperatorGlyph {
                letter: 'T',
                color: "#ef4444"
            }
        );
        assert_eq!(glyph_of("Indosat Ooredoo").letter, 'H');
        assert_eq!(glyph_of("Tri (Hutchison)").letter, 'H');
        assert_eq!(glyph_of("XL Axiata").color, "#a855f7");
        assert_eq!(glyph_of("smartfren").letter, 'X');
    }

    #[test]
    fn glyph_group_order_wins() {
        // Matches both the Telkomsel and XL families; the first group wins.
        assert_eq!(glyph_of("Telkomsel via XL roaming").letter, 'T');
    }

    #[test]
    fn glyph_fallbacks() {
        assert_eq!(
            glyph_of("Starlink"),
            OperatorGlyph {
                letter: 'S',
                color: "#0EA5E9"
            }
        );
        assert_eq!(glyph_of("biznet").letter, 'B');
        assert_eq!(
            glyph_of(""),
            OperatorGlyph {
                letter: 'W',
                color: "#0EA5E9"
            }
        );
    }

    #[test]
    fn speed_formatting() {
        assert_eq!(format_speed(12.346), "12.35 Mbps");
        assert_eq!(format_speed(0.512), "512 Kbps");
        assert_eq!(format_ping(41.6), "42 ms");
        assert_eq!(format_mos(3.74), "3.7");
    }
}
