//! Prometheus naming conventions of the CloudWatch exporter (YACE)
//!
//! Metric and label names built here must be identical to what YACE emits for
//! the same CloudWatch metric, so dashboards written against YACE keep working
//! on streamed metrics.

/// Characters YACE replaces with `_`
const SEPARATORS: &[char] = &[
    ' ', ',', '\t', '/', '\\', '.', '-', ':', '=', '\u{201C}', '@', '<', '>', '(', ')',
];

/// Convert text to a snake_case Prometheus string.
///
/// Separators become `_`, `%` becomes `_percent`, and an `_` is inserted
/// before an upper-case letter that follows a lower-case letter or digit.
pub fn prom_string(text: &str) -> String {
    let mut buf = String::with_capacity(text.len());
    push_prom_string(text, &mut buf);
    buf
}

fn push_prom_string(text: &str, buf: &mut String) {
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if SEPARATORS.contains(&c) {
            buf.push('_');
        } else if c == '%' {
            buf.push_str("_percent");
        } else {
            if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_numeric()) {
                buf.push('_');
            }
            buf.extend(c.to_lowercase());
        }
        prev = Some(c);
    }
}

/// Replace separator characters without touching case
pub fn sanitize(text: &str) -> String {
    let mut buf = String::with_capacity(text.len());
    for c in text.chars() {
        if SEPARATORS.contains(&c) {
            buf.push('_');
        } else if c == '%' {
            buf.push_str("_percent");
        } else {
            buf.push(c);
        }
    }
    buf
}

/// Check a name against the Prometheus label name syntax `[a-zA-Z_][a-zA-Z0-9_]*`
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Normalize a source name (dimension, tag, static label key) into a label name.
///
/// Returns `None` when the normalized name is not a valid label name; the
/// caller drops the label rather than substituting anything.
pub fn prom_label_name(text: &str, snake_case: bool) -> Option<String> {
    let name = if snake_case {
        prom_string(text)
    } else {
        sanitize(text)
    };
    is_valid_label_name(&name).then_some(name)
}

/// Compose a metric name from namespace, CloudWatch metric name and statistic.
///
/// `("AWS/EC2", "CPUUtilization", "Average")` gives `aws_ec2_cpuutilization_average`.
/// Metric names repeating a namespace part as prefix (Glue) have it removed.
pub fn build_metric_name(namespace: &str, metric_name: &str, statistic: &str) -> String {
    let mut name = String::with_capacity(namespace.len() + metric_name.len() + 16);

    // Namespaces like /aws/sagemaker/TrainingJobs start with a separator
    let prom_ns = prom_string(&namespace.to_lowercase());
    let prom_ns = prom_ns.strip_prefix('_').unwrap_or(&prom_ns);
    if !prom_ns.starts_with("aws") {
        name.push_str("aws_");
    }
    name.push_str(prom_ns);
    name.push('_');

    let prom_metric = prom_string(metric_name);
    let mut skip = 0;
    for part in prom_ns.split('_') {
        if prom_metric
            .get(skip..)
            .is_some_and(|rest| rest.starts_with(part))
        {
            skip = part.len();
        }
    }
    let rest = prom_metric.get(skip..).unwrap_or_default();
    name.push_str(rest.strip_prefix('_').unwrap_or(rest));

    if !statistic.is_empty() {
        name.push('_');
        push_prom_string(statistic, &mut name);
    }

    name
}
