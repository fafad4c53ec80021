use std::str::FromStr;

use crate::quote::Quote;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportMarkup {
    /// `<b>`/`<i>` tags, the chat client's parse mode.
    #[default]
    Html,
    Plain,
}

impl FromStr for ReportMarkup {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "html" => Ok(Self::Html),
            "plain" => Ok(Self::Plain),
            _ => Err(format!("unknown markup '{value}'")),
        }
    }
}

impl ReportMarkup {
    fn bold(self, text: &str) -> String {
        match self {
            Self::Html => format!("<b>{text}</b>"),
            Self::Plain => text.to_string(),
        }
    }

    fn italic(self, text: &str) -> String {
        match self {
            Self::Html => format!("<i>{text}</i>"),
            Self::Plain => text.to_string(),
        }
    }
}

/// Renders the fixed-layout quote report. Plain digits, no grouping; the
/// update time is shown in the timestamp's own offset.
pub fn render(quote: &Quote, convert: &str, markup: ReportMarkup) -> String {
    let symbol = quote.symbol.as_str();
    let snapshot = &quote.snapshot;
    let updated = snapshot.last_updated;

    let mut out = markup.bold(&format!("{symbol} - {convert}"));
    out.push_str("\n\n");

    push_field(&mut out, markup, "Max Supply", format!("{:.0}", quote.max_supply), Some(symbol));
    push_field(
        &mut out,
        markup,
        "Circulating Supply",
        format!("{:.0}", quote.circulating_supply),
        Some(symbol),
    );
    push_field(
        &mut out,
        markup,
        "Total Supply",
        format!("{:.0}", quote.total_supply),
        Some(symbol),
    );
    out.push('\n');

    push_field(&mut out, markup, "Price", format!("{:.8}", snapshot.price), Some(convert));
    push_field(&mut out, markup, "Volume", format!("{:.3}", snapshot.volume_24h), Some(convert));
    push_field(
        &mut out,
        markup,
        "1 Hour Change Percent",
        format!("{:.2}%", snapshot.percent_change_1h),
        None,
    );
    push_field(
        &mut out,
        markup,
        "Daily Change Percent",
        format!("{:.2}%", snapshot.percent_change_24h),
        None,
    );
    push_field(
        &mut out,
        markup,
        "Market Cap",
        format!("{:.3}", snapshot.market_cap),
        Some(convert),
    );
    push_field(
        &mut out,
        markup,
        "Data Last Updated",
        format!(
            "{:02}:{:02}:{:02}",
            updated.hour(),
            updated.minute(),
            updated.second()
        ),
        None,
    );

    out
}

fn push_field(
    out: &mut String,
    markup: ReportMarkup,
    label: &str,
    value: String,
    unit: Option<&str>,
) {
    out.push_str(&markup.bold(&format!("{label}: ")));
    out.push_str(&markup.italic(&value));
    if let Some(unit) = unit {
        out.push(' ');
        out.push_str(unit);
    }
    out.push('\n');
}
