//! CSV export of cached analyses
//!
//! An export is several logical sheets stacked in one CSV body. Every row
//! starts with a `Sheet` column naming its sheet, each sheet ends with a
//! `---` separator row, and the header is the union of all sheet columns.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::utils::error::ExportError;

/// Result type for exports
pub type ExportResult<T> = Result<T, ExportError>;

/// One rendered export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

/// A named table inside an export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Build a sheet from JSON objects; columns are the union of their keys
    pub fn from_records(name: impl Into<String>, records: &[Value]) -> Self {
        let mut sheet = Self {
            name: name.into(),
            ..Default::default()
        };
        for record in records {
            if let Value::Object(obj) = record {
                for key in obj.keys() {
                    if !sheet.columns.contains(key) {
                        sheet.columns.push(key.clone());
                    }
                }
            }
        }
        for record in records {
            let row = sheet
                .columns
                .iter()
                .map(|col| record.get(col).map(cell).unwrap_or_default())
                .collect();
            sheet.rows.push(row);
        }
        sheet
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Render a JSON value as a CSV cell
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn field<'a>(obj: &'a Value, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn text(obj: &Value, key: &str, default: &str) -> String {
    field(obj, key).map_or_else(|| default.to_string(), cell)
}

fn number(obj: &Value, key: &str) -> String {
    field(obj, key).map_or_else(|| "0".to_string(), cell)
}

fn records<'a>(obj: &'a Value, key: &str) -> &'a [Value] {
    obj.get(key).and_then(Value::as_array).map_or(&[], Vec::as_slice)
}

fn as_object(data: &Value) -> ExportResult<&Map<String, Value>> {
    data.as_object()
        .ok_or_else(|| ExportError::Malformed("expected a JSON object".to_string()))
}

/// Quote a field when it holds a delimiter, quote or line break
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_row(out: &mut String, cells: &[String]) {
    let line: Vec<String> = cells.iter().map(|c| escape(c)).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

/// Stack sheets into one CSV body
pub fn render(sheets: &[Sheet]) -> String {
    let sheets: Vec<&Sheet> = sheets.iter().filter(|s| !s.is_empty()).collect();
    let mut out = String::new();

    if sheets.is_empty() {
        write_row(&mut out, &["Message".to_string()]);
        write_row(&mut out, &["No data available for export".to_string()]);
        return out;
    }

    let mut header: Vec<String> = vec!["Sheet".to_string()];
    for sheet in &sheets {
        for col in &sheet.columns {
            if !header.contains(col) {
                header.push(col.clone());
            }
        }
    }
    write_row(&mut out, &header);

    for sheet in sheets {
        let positions: Vec<usize> = sheet
            .columns
            .iter()
            .filter_map(|c| header.iter().position(|h| h == c))
            .collect();

        for row in &sheet.rows {
            let mut line = vec![String::new(); header.len()];
            line[0] = sheet.name.clone();
            for (value, &pos) in row.iter().zip(&positions) {
                line[pos] = value.clone();
            }
            write_row(&mut out, &line);
        }

        let mut separator = vec![String::new(); header.len()];
        separator[0] = "---".to_string();
        for &pos in &positions {
            separator[pos] = "---".to_string();
        }
        write_row(&mut out, &separator);
    }

    out
}

/// `{base}_{YYYYmmdd_HHMMSS}.csv`
pub fn export_filename(base: &str, now: DateTime<Utc>) -> String {
    format!("{base}_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

fn finish(base: &str, sheets: &[Sheet], now: DateTime<Utc>) -> CsvExport {
    let export = CsvExport {
        filename: export_filename(base, now),
        body: render(sheets),
    };
    tracing::debug!(filename = %export.filename, sheets = sheets.len(), "Rendered CSV export");
    export
}

// ============================================================================
// Analysis exports
// ============================================================================

/// Channel info, growth, upload heatmap, keywords and recent videos
pub fn export_channel_analysis(data: &Value, now: DateTime<Utc>) -> ExportResult<CsvExport> {
    let obj = as_object(data)?;
    let mut sheets = Vec::new();

    if let Some(info) = obj.get("channel_info") {
        let mut sheet = Sheet::new(
            "Channel_Info",
            &[
                "Channel ID",
                "Channel Name",
                "Subscriber Count",
                "Total Views",
                "Video Count",
                "Country",
                "Created Date",
                "Custom URL",
            ],
        );
        sheet.push_row(vec![
            text(info, "id", ""),
            text(info, "title", ""),
            number(info, "subscriber_count"),
            number(info, "view_count"),
            number(info, "video_count"),
            text(info, "country", "N/A"),
            text(info, "published_at", ""),
            text(info, "custom_url", "N/A"),
        ]);
        sheets.push(sheet);
    }

    sheets.push(Sheet::from_records("Growth_Trends", records(data, "growth_data")));
    if let Some(freq) = obj.get("upload_frequency") {
        sheets.push(Sheet::from_records("Upload_Frequency", records(freq, "heatmap_data")));
    }
    sheets.push(Sheet::from_records("Top_Keywords", records(data, "top_keywords")));
    sheets.push(Sheet::from_records("Recent_Videos", records(data, "recent_videos")));

    Ok(finish("channel_analysis", &sheets, now))
}

/// Video info, engagement, sentiment, keywords and toxicity
pub fn export_video_analysis(data: &Value, now: DateTime<Utc>) -> ExportResult<CsvExport> {
    let obj = as_object(data)?;
    let mut sheets = Vec::new();

    if let Some(info) = obj.get("video_info") {
        let tags = records(info, "tags")
            .iter()
            .map(cell)
            .collect::<Vec<_>>()
            .join(", ");
        let mut sheet = Sheet::new(
            "Video_Info",
            &[
                "Video ID",
                "Title",
                "Channel",
                "Views",
                "Likes",
                "Comments",
                "Duration",
                "Published Date",
                "Tags",
            ],
        );
        sheet.push_row(vec![
            text(info, "id", ""),
            text(info, "title", ""),
            text(info, "channel_title", ""),
            number(info, "view_count"),
            number(info, "like_count"),
            number(info, "comment_count"),
            text(info, "duration", ""),
            text(info, "published_at", ""),
            tags,
        ]);
        sheets.push(sheet);
    }

    if let Some(engagement) = obj.get("engagement_metrics") {
        sheets.push(Sheet::from_records("Engagement_Metrics", std::slice::from_ref(engagement)));
    }

    if let Some(comments) = obj.get("comment_analysis") {
        if let Some(scores) = field(comments, "sentiment_scores").filter(|v| v.as_object().is_some_and(|o| !o.is_empty())) {
            sheets.push(Sheet::from_records("Sentiment_Scores", std::slice::from_ref(scores)));
        }
        sheets.push(Sheet::from_records("Comment_Keywords", records(comments, "keywords")));

        if let Some(tox) = field(comments, "toxicity_analysis").filter(|v| v.as_object().is_some_and(|o| !o.is_empty())) {
            let health = tox.get("community_health_score").cloned().unwrap_or(Value::Null);
            let mut sheet = Sheet::new(
                "Toxicity_Analysis",
                &[
                    "Total Comments Analyzed",
                    "Toxic Comments Count",
                    "Toxicity Rate (%)",
                    "Average Toxicity Score",
                    "Community Health Score",
                    "Health Level",
                ],
            );
            sheet.push_row(vec![
                number(tox, "total_comments_analyzed"),
                number(tox, "toxic_comments_count"),
                number(tox, "toxicity_rate"),
                number(tox, "avg_toxicity_score"),
                number(&health, "score"),
                text(&health, "level", "Unknown"),
            ]);
            sheets.push(sheet);
            sheets.push(Sheet::from_records("Toxic_Comments", records(tox, "most_toxic_comments")));
        }
    }

    Ok(finish("video_analysis", &sheets, now))
}

/// Trending list, velocity ranking and category mix
pub fn export_trending_analysis(data: &Value, now: DateTime<Utc>) -> ExportResult<CsvExport> {
    let obj = as_object(data)?;
    let mut sheets = Vec::new();

    let mut videos = Sheet::new(
        "Trending_Videos",
        &[
            "Video ID",
            "Title",
            "Channel",
            "Views",
            "Likes",
            "Comments",
            "Category ID",
            "Duration",
            "Published Date",
            "Thumbnail URL",
        ],
    );
    for v in records(data, "videos") {
        videos.push_row(vec![
            text(v, "id", ""),
            text(v, "title", ""),
            text(v, "channel_title", ""),
            number(v, "view_count"),
            number(v, "like_count"),
            number(v, "comment_count"),
            text(v, "category_id", ""),
            text(v, "duration", ""),
            text(v, "published_at", ""),
            text(v, "thumbnail_url", ""),
        ]);
    }
    sheets.push(videos);

    sheets.push(Sheet::from_records("View_Velocity", records(data, "velocity_data")));

    if let Some(Value::Object(dist)) = obj.get("category_distribution") {
        let mut sheet = Sheet::new("Category_Distribution", &["Category ID", "Video Count"]);
        for (name, count) in dist {
            sheet.push_row(vec![name.clone(), cell(count)]);
        }
        sheets.push(sheet);
    }

    Ok(finish("trending_analysis", &sheets, now))
}

fn comparison_tail(data: &Value, sheets: &mut Vec<Sheet>) {
    if let Some(Value::Object(rankings)) = data.get("rankings") {
        let mut sheet = Sheet::new("Rankings", &["Metric", "Rank", "ID", "Name", "Value"]);
        for (metric, entries) in rankings {
            for entry in entries.as_array().map_or(&[][..], Vec::as_slice) {
                sheet.push_row(vec![
                    metric.clone(),
                    number(entry, "rank"),
                    text(entry, "id", ""),
                    text(entry, "name", ""),
                    number(entry, "value"),
                ]);
            }
        }
        sheets.push(sheet);
    }

    let mut insights = Sheet::new("Insights", &["Insight"]);
    for insight in records(data, "insights") {
        insights.push_row(vec![cell(insight)]);
    }
    sheets.push(insights);
}

/// Side-by-side channels, per-metric values, rankings and insights
pub fn export_channel_comparison(data: &Value, now: DateTime<Utc>) -> ExportResult<CsvExport> {
    as_object(data)?;
    let mut sheets = Vec::new();

    let mut channels = Sheet::new(
        "Channel_Comparison",
        &[
            "Channel ID",
            "Channel Name",
            "Subscribers",
            "Total Views",
            "Video Count",
            "Country",
            "Created Date",
        ],
    );
    for c in records(data, "channels") {
        channels.push_row(vec![
            text(c, "id", ""),
            text(c, "title", ""),
            number(c, "subscriber_count"),
            number(c, "view_count"),
            number(c, "video_count"),
            text(c, "country", "N/A"),
            text(c, "published_at", ""),
        ]);
    }
    sheets.push(channels);

    if let Some(Value::Object(metrics)) = data.get("comparison_metrics") {
        let mut sheet = Sheet::new("Comparison_Metrics", &["Channel_Index", "Metric", "Value"]);
        for (metric, values) in metrics {
            for (i, value) in values.as_array().map_or(&[][..], Vec::as_slice).iter().enumerate() {
                sheet.push_row(vec![i.to_string(), metric.clone(), cell(value)]);
            }
        }
        sheets.push(sheet);
    }

    comparison_tail(data, &mut sheets);
    Ok(finish("channel_comparison", &sheets, now))
}

/// Side-by-side videos, rankings and insights
pub fn export_video_comparison(data: &Value, now: DateTime<Utc>) -> ExportResult<CsvExport> {
    as_object(data)?;
    let mut sheets = Vec::new();

    let mut videos = Sheet::new(
        "Video_Comparison",
        &[
            "Video ID",
            "Title",
            "Channel",
            "Views",
            "Likes",
            "Comments",
            "Duration",
            "Published Date",
        ],
    );
    for v in records(data, "videos") {
        videos.push_row(vec![
            text(v, "id", ""),
            text(v, "title", ""),
            text(v, "channel_title", ""),
            number(v, "view_count"),
            number(v, "like_count"),
            number(v, "comment_count"),
            text(v, "duration", ""),
            text(v, "published_at", ""),
        ]);
    }
    sheets.push(videos);

    comparison_tail(data, &mut sheets);
    Ok(finish("video_comparison", &sheets, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    #[test]
    fn test_filename() {
        assert_eq!(export_filename("video_analysis", now()), "video_analysis_20240305_140709.csv");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_empty_export_message() {
        let body = render(&[Sheet::new("Empty", &["A"])]);
        assert_eq!(body, "Message\r\nNo data available for export\r\n");
    }

    #[test]
    fn test_render_unions_columns() {
        let mut a = Sheet::new("A", &["x", "y"]);
        a.push_row(vec!["1".into(), "2".into()]);
        let mut b = Sheet::new("B", &["y", "z"]);
        b.push_row(vec!["3".into(), "4".into()]);

        let body = render(&[a, b]);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "Sheet,x,y,z");
        assert_eq!(lines[1], "A,1,2,");
        assert_eq!(lines[2], "---,---,---,");
        assert_eq!(lines[3], "B,,3,4");
        assert_eq!(lines[4], "---,,---,---");
    }

    #[test]
    fn test_channel_export() {
        let data = json!({
            "channel_info": {"id": "UC1", "title": "Rust, Daily", "subscriber_count": 10,
                             "view_count": 100, "video_count": 3, "country": null},
            "growth_data": [{"date": "2024-01-01", "cumulative_views": 5}],
            "upload_frequency": {"heatmap_data": [{"day": 0, "hour": 1, "count": 2}]},
            "top_keywords": [],
            "recent_videos": []
        });
        let export = export_channel_analysis(&data, now()).unwrap();
        assert!(export.filename.starts_with("channel_analysis_"));
        assert!(export.body.contains("Channel_Info,UC1,\"Rust, Daily\",10,100,3,N/A"));
        assert!(export.body.contains("Growth_Trends"));
        assert!(export.body.contains("Upload_Frequency"));
        assert!(!export.body.contains("Top_Keywords"));
    }

    #[test]
    fn test_video_export_toxicity_sheet() {
        let data = json!({
            "video_info": {"id": "dQw4w9WgXcQ", "title": "t", "tags": ["a", "b"]},
            "comment_analysis": {
                "sentiment_scores": {},
                "keywords": [],
                "toxicity_analysis": {
                    "total_comments_analyzed": 4, "toxic_comments_count": 1,
                    "toxicity_rate": 25.0, "avg_toxicity_score": 0.2,
                    "community_health_score": {"score": 40.0, "level": "Moderate"},
                    "most_toxic_comments": [{"comment_id": "c1", "toxicity_score": 0.9}]
                }
            }
        });
        let body = export_video_analysis(&data, now()).unwrap().body;
        assert!(body.contains("\"a, b\""));
        assert!(body.contains("Toxicity_Analysis"));
        assert!(body.contains("Moderate"));
        assert!(body.contains("Toxic_Comments"));
        assert!(!body.contains("Sentiment_Scores"));
    }

    #[test]
    fn test_comparison_export() {
        let data = json!({
            "channels": [{"id": "UC1", "title": "A"}, {"id": "UC2", "title": "B"}],
            "comparison_metrics": {"view_counts": [5, 7]},
            "rankings": {"view_counts": [{"rank": 1, "id": "UC2", "name": "B", "value": 7}]},
            "insights": ["B leads"]
        });
        let body = export_channel_comparison(&data, now()).unwrap().body;
        assert!(body.contains("Comparison_Metrics"));
        assert!(body.contains("Rankings"));
        assert!(body.contains("B leads"));

        assert!(export_video_comparison(&json!([1, 2]), now()).is_err());
    }
}
