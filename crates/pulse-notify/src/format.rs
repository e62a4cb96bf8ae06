//! Alert message template (Telegram Markdown)

use std::fmt::Display;

use chrono::{Local, TimeZone};

use pulse_core::{MarketItem, Signal};

/// Summaries longer than this are cut and suffixed with `...`
pub const MAX_SUMMARY_CHARS: usize = 300;

/// Icon and label for a signal
pub const fn signal_badge(signal: Signal) -> &'static str {
    match signal {
        Signal::Buy => "🟢 BUY",
        Signal::Sell => "🔴 SELL",
        Signal::Neutral => "⚪ NEUTRAL",
        Signal::Hold => "🟠 HOLD",
    }
}

/// Cut `summary` to `max_chars` characters plus an ellipsis
pub fn truncate_summary(summary: &str, max_chars: usize) -> String {
    match summary.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &summary[..cut]),
        None => summary.to_string(),
    }
}

/// Render the alert for `item`, with its time shown in `tz`
pub fn render_message<Tz>(item: &MarketItem, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time = item.timestamp.with_timezone(tz).format("%H:%M");
    let summary = truncate_summary(&item.summary, MAX_SUMMARY_CHARS);

    let mut message = format!(
        "*{badge}* | {time}\n\n*{title}*\n\n{summary}\n\n🧠 *AI confidence:* {confidence}%\n📊 *Source score:* {credibility}/10\n",
        badge = signal_badge(item.signal),
        title = item.title,
        confidence = item.confidence,
        credibility = item.source_credibility,
    );
    if let Some(url) = &item.url {
        message.push_str(&format!("🔗 [Read more]({url})\n"));
    }
    message
}

/// [`render_message`] in the host's local time zone
pub fn render_local(item: &MarketItem) -> String {
    render_message(item, &Local)
}
