//! Fixed colour tables for tone pills and chart bars.

use newsdigest_shared::Tone;

/// `(background, foreground)` per tone label.
const TONE_COLORS: [(&str, (&str, &str)); 6] = [
    ("🤔 思辨", ("#f0e6ff", "#6b21a8")),
    ("😤 批评", ("#ffe4e6", "#be123c")),
    ("🎉 兴奋", ("#fef3c7", "#b45309")),
    ("🧪 实验记录", ("#d1fae5", "#047857")),
    ("📊 分析", ("#dbeafe", "#1d4ed8")),
    ("💡 洞察", ("#fef9c3", "#a16207")),
];

/// Used for labels outside the tone vocabulary.
pub const NEUTRAL: (&str, &str) = ("#f0f0f5", "#515154");

/// Bar colours for the topic chart, cycled by rank.
pub const BAR_COLORS: [&str; 8] = [
    "#0071e3", "#34c759", "#ff9500", "#af52de", "#ff3b30", "#5ac8fa", "#ff2d55", "#ffcc00",
];

/// Colours for a tone label; unknown labels get [`NEUTRAL`].
pub fn label_colors(label: &str) -> (&'static str, &'static str) {
    TONE_COLORS
        .iter()
        .find(|(l, _)| *l == label)
        .map_or(NEUTRAL, |(_, colors)| *colors)
}

/// Colours for a tone; [`Tone::Other`] labels get [`NEUTRAL`].
pub fn tone_colors(tone: &Tone) -> (&'static str, &'static str) {
    label_colors(tone.label())
}

pub fn bar_color(rank: usize) -> &'static str {
    BAR_COLORS[rank % BAR_COLORS.len()]
}
