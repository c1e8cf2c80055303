//! Human-readable English and Chinese summaries of a policy record.

use serde::Serialize;

use crate::models::record::PolicyRecord;

/// Rendered policy text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPolicy {
    pub en: String,
    pub cn: String,
}

/// Render a record into short English and Chinese sentences.
pub fn render_policy(record: &PolicyRecord) -> RenderedPolicy {
    if record.text("policy.cancellable") == Some("false") {
        return RenderedPolicy {
            en: "This booking is non-refundable and cannot be cancelled.".to_string(),
            cn: "此预订不可取消或退款。".to_string(),
        };
    }

    let mut en = Vec::new();
    let mut cn = Vec::new();

    if let Some((cutoff_en, cutoff_cn)) = render_cutoff(record) {
        en.push(format!("Free cancellation {}.", cutoff_en));
        cn.push(format!("可免费取消，{}。", cutoff_cn));
    }

    if let Some((fee_en, fee_cn)) = render_fee(record) {
        en.push(format!("After the deadline, cancellation incurs a penalty of {}.", fee_en));
        cn.push(format!("在截止时间之后取消，将收取 {}。", fee_cn));
    }

    RenderedPolicy {
        en: en.join(" "),
        cn: cn.join(" "),
    }
}

fn field(record: &PolicyRecord, path: &str) -> Option<String> {
    record.get(path).filter(|v| !v.is_empty()).map(ToString::to_string)
}

fn render_cutoff(record: &PolicyRecord) -> Option<(String, String)> {
    if let Some(iso) = field(record, "deadline.iso") {
        return Some((format!("until {}", iso), format!("至 {}", iso)));
    }

    if let Some(date) = field(record, "deadline.date_ddmmmyy") {
        let time = match (
            record.number("deadline.local_hour"),
            record.number("deadline.local_minute"),
        ) {
            (Some(h), Some(m)) => format!("{:0>2}:{:0>2}", h.normalize().to_string(), m.normalize().to_string()),
            (Some(h), None) => format!("{:0>2}:00", h.normalize().to_string()),
            _ => field(record, "deadline.local_hour").unwrap_or_else(|| "23:59".to_string()),
        };
        return Some((
            format!("until {} on {} (hotel local time)", time, date),
            format!("至 {} {}（酒店当地时间）", date, time),
        ));
    }

    field(record, "window.cutoff_days").map(|days| {
        (
            format!("until {} day(s) before arrival", days),
            format!("入住前 {} 天之前", days),
        )
    })
}

fn render_fee(record: &PolicyRecord) -> Option<(String, String)> {
    let (mut en, mut cn) = match record.text("fee.type")? {
        "fixed_amount" => {
            let amount = field(record, "fee.amount").unwrap_or_default();
            let currency = field(record, "fee.currency").unwrap_or_default();
            let mut en = format!("{} {}", amount, currency).trim().to_string();
            let mut cn = format!("{} {}", currency, amount).trim().to_string();
            if record.text("fee.per_room") == Some("true") {
                en.push_str(" per room");
                cn.push_str(" 每间客房");
            }
            (en, cn)
        }
        "nights_penalty" => {
            let nights = field(record, "fee.nights").unwrap_or_else(|| "1".to_string());
            (format!("{} night penalty", nights), format!("扣除 {} 晚房费", nights))
        }
        "percentage" => {
            let percent = field(record, "fee.percent")?;
            (format!("{}% of the stay", percent), format!("房费的 {}%", percent))
        }
        "full_stay" | "entire_stay_room_and_tax" => ("the full stay".to_string(), "全额房费".to_string()),
        _ => return None,
    };

    match record.text("fee.tax_scope") {
        Some("excluded") => {
            en.push_str(" (excluding taxes/fees)");
            cn.push_str("（不含税费）");
        }
        Some("included") => {
            en.push_str(" (including taxes/fees)");
            cn.push_str("（含税费）");
        }
        _ => {}
    }

    Some((en, cn))
}
