use rust_decimal::Decimal;

pub fn write_csv<I, R, W>(records: I, writer: W) -> anyhow::Result<()>
where
    I: IntoIterator<Item = R>,
    R: serde::Serialize,
    W: std::io::Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records.into_iter() {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Two decimal places, no currency symbol
pub fn format_amount(amount: Decimal) -> String {
    let amount = amount.round_dp(2);
    if amount.is_zero() {
        return "0.00".to_string();
    }
    format!("{:.2}", amount)
}

pub fn format_money(amount: Decimal) -> String {
    let amount = amount.round_dp(2);
    if amount.is_zero() {
        return "$0.00".to_string();
    }
    if amount < Decimal::ZERO {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}

pub fn format_percent(pct: Option<Decimal>) -> String {
    pct.map_or("-".to_string(), |p| format!("{:.2}%", p.round_dp(2)))
}
