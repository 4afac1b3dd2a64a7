use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Histogram, TextEncoder, register_counter, register_histogram};


lazy_static! {
    pub static ref SUBMISSIONS_TOTAL: Counter =
        register_counter!("leadform_submissions_total", "Total submit attempts").unwrap();
    pub static ref SUBMISSIONS_SENT: Counter =
        register_counter!("leadform_submissions_sent_total", "Leads accepted by the webhook").unwrap();
    pub static ref SUBMISSIONS_FAILED: Counter =
        register_counter!("leadform_submissions_failed_total", "Leads the webhook did not accept").unwrap();
    pub static ref SUBMISSIONS_THROTTLED: Counter =
        register_counter!("leadform_submissions_throttled_total", "Submits refused by the rate limiter").unwrap();
    pub static ref WEBHOOK_LATENCY: Histogram = register_histogram!(
        "leadform_webhook_latency_seconds",
        "Webhook round trip in seconds"
    )
    .unwrap();
}

// Text exposition of everything in the default registry
pub fn render() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_counters() {
        SUBMISSIONS_TOTAL.inc();
        let text = render().unwrap();
        assert!(text.contains("leadform_submissions_total"));
    }
}
