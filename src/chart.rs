//! Time series of one exercise type, for on-screen plotting and PNG export.

use chrono::{Datelike, NaiveDate};
use egui_plot::{Line, MarkerShape, PlotPoints, Points};
use plotters::prelude::*;
use std::path::Path;

use crate::workouts::WorkoutRecord;

/// Date shapes accepted in the `date` field, tried in order.
///
/// Two-digit years come before four-digit ones because `%Y` would happily
/// read `24` as the year 24.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Points for a single exercise type in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub exercise_type: String,
    pub points: Vec<ChartPoint>,
    /// Matching records left out because their date or amount did not parse.
    pub skipped: usize,
}

impl ChartSeries {
    pub fn title(&self) -> String {
        format!("Your {} Over Time", self.exercise_type)
    }

    /// A line needs at least two points; fewer still renders.
    pub fn has_enough_points(&self) -> bool {
        self.points.len() >= 2
    }

    /// Hints shown above the plot when the series cannot draw a full line.
    pub fn notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if !self.has_enough_points() {
            notes.push("(Chart only works for workout types with 2 or more entries)".to_string());
        }
        if self.skipped > 0 {
            notes.push(format!(
                "{} entries without a usable date or amount are not shown.",
                self.skipped
            ));
        }
        notes
    }

    /// `[x, y]` pairs where x is the day number since the common era.
    pub fn plot_points(&self) -> Vec<[f64; 2]> {
        self.points
            .iter()
            .map(|p| [p.date.num_days_from_ce() as f64, p.amount])
            .collect()
    }

    pub fn line(&self) -> Line {
        Line::new(PlotPoints::from(self.plot_points())).name(&self.exercise_type)
    }

    pub fn markers(&self) -> Points {
        Points::new(self.plot_points())
            .shape(MarkerShape::Circle)
            .radius(3.0)
            .name(&self.exercise_type)
    }
}

/// Collect the chartable points of `exercise_type`.
///
/// Records with an unparseable date or a non-numeric amount are skipped and
/// counted. Same-day entries keep their log order.
pub fn series_for(records: &[WorkoutRecord], exercise_type: &str) -> ChartSeries {
    let mut points = Vec::new();
    let mut skipped = 0usize;
    for r in records.iter().filter(|r| r.exercise_type == exercise_type) {
        match (parse_date(&r.date), parse_amount(&r.amount)) {
            (Some(date), Some(amount)) => points.push(ChartPoint { date, amount }),
            _ => skipped += 1,
        }
    }
    points.sort_by_key(|p| p.date);
    if skipped > 0 {
        log::debug!("Skipped {skipped} unchartable {exercise_type} entries");
    }
    ChartSeries {
        exercise_type: exercise_type.to_string(),
        points,
        skipped,
    }
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

pub fn parse_amount(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Axis label for a day number, formatted month-day.
pub fn format_day(day: i32) -> String {
    NaiveDate::from_num_days_from_ce_opt(day)
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_else(|| day.to_string())
}

/// Render `series` to a PNG image at `path`.
pub fn save_png(
    series: &ChartSeries,
    path: &Path,
    size: (u32, u32),
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    if series.points.is_empty() {
        root.present()?;
        return Ok(());
    }
    let data: Vec<(i32, f64)> = series
        .points
        .iter()
        .map(|p| (p.date.num_days_from_ce(), p.amount))
        .collect();
    let (min_x, max_x) = data
        .iter()
        .fold((i32::MAX, i32::MIN), |(lo, hi), &(x, _)| (lo.min(x), hi.max(x)));
    let (min_y, max_y) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
            (lo.min(y), hi.max(y))
        });
    let pad = ((max_y - min_y) * 0.1).max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(series.title(), ("sans-serif", 25))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(min_x - 1..max_x + 1, (min_y - pad)..(max_y + pad))?;
    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Amount")
        .x_label_formatter(&|d| format_day(*d))
        .draw()?;
    chart
        .draw_series(LineSeries::new(data.iter().copied(), &BLUE))?
        .label(series.exercise_type.clone())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
    chart.draw_series(
        data.iter()
            .map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())),
    )?;
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, kind: &str, amount: &str) -> WorkoutRecord {
        WorkoutRecord {
            date: date.into(),
            exercise_type: kind.into(),
            amount: amount.into(),
            unit: String::new(),
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn filters_by_type_and_sorts_by_date() {
        let records = vec![
            record("2024-01-02", "Running", "5"),
            record("2024-01-01", "Running", "3"),
            record("2024-01-01", "Pushups", "20"),
        ];
        let s = series_for(&records, "Running");
        assert_eq!(
            s.points,
            vec![
                ChartPoint {
                    date: ymd(2024, 1, 1),
                    amount: 3.0
                },
                ChartPoint {
                    date: ymd(2024, 1, 2),
                    amount: 5.0
                },
            ]
        );
        assert_eq!(s.skipped, 0);
        assert!(s.has_enough_points());
        assert!(s.notes().is_empty());
        assert_eq!(s.title(), "Your Running Over Time");
    }

    #[test]
    fn same_day_entries_keep_log_order() {
        let records = vec![
            record("2024-02-01", "Running", "7"),
            record("2024-01-15", "Running", "1"),
            record("2024-02-01", "Running", "2"),
        ];
        let amounts: Vec<f64> = series_for(&records, "Running")
            .points
            .iter()
            .map(|p| p.amount)
            .collect();
        assert_eq!(amounts, vec![1.0, 7.0, 2.0]);
    }

    #[test]
    fn bad_entries_are_skipped_not_fatal() {
        let records = vec![
            record("No date set", "Running", "3"),
            record("2024-01-03", "Running", "Unknown"),
            record("2024-01-04", "Running", "4.5"),
        ];
        let s = series_for(&records, "Running");
        assert_eq!(s.points.len(), 1);
        assert_eq!(s.skipped, 2);
        assert!(!s.has_enough_points());
        assert_eq!(
            s.notes(),
            vec![
                "(Chart only works for workout types with 2 or more entries)".to_string(),
                "2 entries without a usable date or amount are not shown.".to_string(),
            ]
        );
    }

    #[test]
    fn unknown_type_gives_empty_series() {
        let s = series_for(&[record("2024-01-01", "Running", "3")], "Yoga");
        assert!(s.points.is_empty());
        assert!(s.plot_points().is_empty());
    }

    #[test]
    fn parses_common_date_shapes() {
        assert_eq!(parse_date("2024-03-05"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date(" 2024/03/05 "), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("03/05/2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("03/05/24"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("5 Mar 2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("March 5, 2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn amount_must_be_finite_number() {
        assert_eq!(parse_amount(" 12.5 "), Some(12.5));
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("lots"), None);
    }

    #[test]
    fn axis_labels_are_month_day() {
        let day = ymd(2024, 1, 9).num_days_from_ce();
        assert_eq!(format_day(day), "01-09");
    }

    #[test]
    fn empty_series_still_writes_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let s = series_for(&[], "Running");
        save_png(&s, &path, (320, 200)).unwrap();
        assert!(path.exists());
    }
}
