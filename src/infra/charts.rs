// ============================================================
// Layer 6 - Terminal Charts
// ============================================================
// Plain-text stand-ins for the plots of the exploration report
// and the model comparison. Every function returns a String;
// the caller decides where it goes.
//
//   pie_shares()      → class shares as "%0.2f" percentages
//   histogram()       → one or more series over shared bins
//   correlation_grid()→ labelled square matrix
//   bar_chart()       → one bar per item (top words)
//   grouped_bars()    → several values per category, scaled
//                       between a floor and a ceiling
//
// Bars are drawn with '#', scaled to the given width.

const BAR: &str = "#";

fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || !value.is_finite() || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max).min(1.0) * width as f64).round() as usize;
    BAR.repeat(len)
}

/// Share of every slice, printed like matplotlib's `autopct="%0.2f"`
pub fn pie_shares(slices: &[(&str, usize)], width: usize) -> String {
    let total: usize = slices.iter().map(|(_, n)| n).sum();
    let name_w = slices.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    let mut out = String::new();
    for (name, count) in slices {
        let pct = if total == 0 { 0.0 } else { 100.0 * *count as f64 / total as f64 };
        out.push_str(&format!(
            "{:<name_w$} {:>6.2}% |{}\n",
            name,
            pct,
            bar(pct, 100.0, width)
        ));
    }
    out
}

/// Counts of every series in `bins` equal-width bins spanning the
/// smallest and largest value over all series.
pub fn histogram(title: &str, series: &[(&str, &[f64])], bins: usize, width: usize) -> String {
    let mut out = format!("{title}\n");
    let values = series.iter().flat_map(|(_, v)| v.iter().copied()).filter(|v| v.is_finite());
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if bins == 0 || lo > hi {
        out.push_str("  (no data)\n");
        return out;
    }

    let span = (hi - lo).max(f64::EPSILON);
    let step = span / bins as f64;
    let counts: Vec<Vec<usize>> = series
        .iter()
        .map(|(_, values)| {
            let mut c = vec![0usize; bins];
            for &v in values.iter().filter(|v| v.is_finite()) {
                let b = (((v - lo) / step) as usize).min(bins - 1);
                c[b] += 1;
            }
            c
        })
        .collect();
    let max = counts.iter().flatten().copied().max().unwrap_or(0) as f64;
    let name_w = series.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    for b in 0..bins {
        let start = lo + step * b as f64;
        for ((name, _), c) in series.iter().zip(&counts) {
            out.push_str(&format!(
                "{:>10.1} {:<name_w$} {:>5} |{}\n",
                start,
                name,
                c[b],
                bar(c[b] as f64, max, width)
            ));
        }
    }
    out
}

pub fn correlation_grid(names: &[&str], matrix: &[Vec<f64>]) -> String {
    let w = names.iter().map(|n| n.len()).max().unwrap_or(0).max(6);

    let mut out = format!("{:w$}", "");
    for name in names {
        out.push_str(&format!(" {:>w$}", name));
    }
    out.push('\n');
    for (name, row) in names.iter().zip(matrix) {
        out.push_str(&format!("{:<w$}", name));
        for v in row {
            out.push_str(&format!(" {:>w$.2}", v));
        }
        out.push('\n');
    }
    out
}

/// One bar per item, longest bar = largest value
pub fn bar_chart(title: &str, items: &[(String, f64)], width: usize) -> String {
    let mut out = format!("{title}\n");
    let max = items.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let name_w = items.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    for (name, value) in items {
        out.push_str(&format!("{:<name_w$} {:>8} |{}\n", name, value, bar(*value, max, width)));
    }
    out
}

/// Several series per category on a shared [floor, ceiling] axis.
/// Values at or below the floor get an empty bar.
pub fn grouped_bars(
    categories: &[&str],
    series:     &[(&str, Vec<f64>)],
    floor:      f64,
    ceiling:    f64,
    width:      usize,
) -> String {
    let cat_w = categories.iter().map(|c| c.len()).max().unwrap_or(0);
    let ser_w = series.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let range = ceiling - floor;

    let mut out = format!("{:cat_w$} {:ser_w$}        {floor:.2}{:>w$}\n", "", "", format!("{ceiling:.2}"), w = width);
    for (i, category) in categories.iter().enumerate() {
        for (name, values) in series {
            let Some(&v) = values.get(i) else { continue };
            out.push_str(&format!(
                "{:<cat_w$} {:<ser_w$} {:>6.4} |{}\n",
                category,
                name,
                v,
                bar(v - floor, range, width)
            ));
        }
    }
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pie_shares_two_decimals() {
        let text = pie_shares(&[("ham", 4516), ("spam", 653)], 20);
        assert!(text.contains("87.37%"));
        assert!(text.contains("12.63%"));
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let ham  = [1.0, 2.0, 2.5, 9.0];
        let spam = [10.0, 10.0];
        let text = histogram("chars", &[("ham", &ham[..]), ("spam", &spam[..])], 3, 10);

        let total: usize = text
            .lines()
            .skip(1)
            .filter_map(|l| l.split('|').next()?.split_whitespace().last()?.parse::<usize>().ok())
            .sum();
        assert_eq!(total, 6);
        // three bins, two series each
        assert_eq!(text.lines().count(), 1 + 6);
    }

    #[test]
    fn test_histogram_without_data() {
        let empty: [f64; 0] = [];
        assert!(histogram("empty", &[("ham", &empty[..])], 5, 10).contains("no data"));
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(5.0, 10.0, 10), "#####");
        assert_eq!(bar(20.0, 10.0, 10).len(), 10);
        assert_eq!(bar(-1.0, 10.0, 10), "");
    }

    #[test]
    fn test_grouped_bars_use_floor() {
        let text = grouped_bars(&["NB"], &[("Accuracy", vec![0.75]), ("Precision", vec![1.0])], 0.5, 1.0, 10);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].ends_with("|#####"));
        assert!(lines[2].ends_with("|##########"));
    }

    #[test]
    fn test_correlation_grid_layout() {
        let text = correlation_grid(&["a", "b"], &[vec![1.0, -0.5], vec![-0.5, 1.0]]);
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("-0.50"));
    }
}
