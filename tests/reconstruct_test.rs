//! End-to-end reconstruction tests over decoder page dumps.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use pdfdeck::error::{Error, Result};
use pdfdeck::model::{BBox, BorderSide, RasterImage, RingType, ShapeKind, ShapeRole, TextRole};
use pdfdeck::{
    parse_input, reconstruct, reconstruct_file, to_json, Color, DocumentInput, JsonFormat,
    PageSelection, Rasterizer, ReconstructOptions, ReconstructionStats, Reconstructor,
};

fn rect(x: f32, y: f32, w: f32, h: f32, fill: Option<&str>, stroke: Option<&str>) -> Value {
    json!({
        "x": x, "y": y, "width": w, "height": h,
        "fill_color": fill,
        "stroke_color": stroke,
        "stroke_width": if stroke.is_some() { 0.75 } else { 0.0 },
        "line_count": 4,
    })
}

fn text(content: &str, x: f32, y: f32, x2: f32, y2: f32, bold: bool) -> Value {
    json!({
        "content": content, "x": x, "y": y, "x2": x2, "y2": y2,
        "font_size": y2 - y, "is_bold": bold, "color": "#333333",
    })
}

/// A slide with a ring badge, a 3x3 table and a bar chart.
fn busy_slide() -> Value {
    let mut shapes = vec![
        // Ring: outer fill, then inner stroke
        json!({"x": 700, "y": 60, "width": 60, "height": 60, "fill_color": "#ED7D31",
               "curve_count": 4}),
        json!({"x": 703, "y": 63, "width": 54, "height": 54, "stroke_color": "#ED7D31",
               "stroke_width": 3, "curve_count": 4}),
    ];
    for r in 0..3 {
        for c in 0..3 {
            let fill = if r == 0 { "#4472C4" } else { "#FFFFFF" };
            shapes.push(rect(
                100.0 + 120.0 * c as f32,
                100.0 + 30.0 * r as f32,
                120.0,
                30.0,
                Some(fill),
                Some("#BFBFBF"),
            ));
        }
    }
    let colors = ["#4472C4", "#ED7D31", "#A5A5A5"];
    for i in 0..5 {
        let h = 60.0 + 30.0 * i as f32;
        shapes.push(rect(560.0 + 40.0 * i as f32, 480.0 - h, 30.0, h, Some(colors[i % 3]), None));
    }

    json!({
        "width": 960, "height": 540,
        "shapes": shapes,
        "texts": [
            text("Quarterly Review", 40.0, 20.0, 300.0, 50.0, true),
            text("(draft)", 305.0, 20.0, 360.0, 50.0, false),
            text("Region", 105.0, 108.0, 160.0, 122.0, true),
            text("North", 105.0, 138.0, 150.0, 152.0, false),
            text("Q1", 570.0, 466.0, 590.0, 478.0, false),
            text("Revenue by quarter", 560.0, 500.0, 700.0, 512.0, false),
        ],
    })
}

/// The stacked-highlight case from generated decks.
fn duplicate_slide() -> Value {
    json!({
        "width": 1440, "height": 810,
        "shapes": [
            {"x": 60, "y": 215, "width": 1320, "height": 88.7, "fill_color": "#DAE3F3",
             "fill_opacity": 1.0},
            {"x": 61.5, "y": 215, "width": 1258.5, "height": 88.7, "fill_color": "#DAE3F3",
             "fill_opacity": 0.0314},
        ],
    })
}

/// A 2x2 table ruled with lines, header cells painted separately.
fn ruled_slide() -> Value {
    let line = |x: f32, y: f32, w: f32, h: f32| {
        json!({"x": x, "y": y, "width": w, "height": h, "stroke_color": "#000000",
               "stroke_width": 0.75, "line_count": 1})
    };
    let mut shapes: Vec<Value> = [100.0, 130.0, 160.0]
        .iter()
        .map(|&y| line(100.0, y - 0.5, 300.0, 1.0))
        .collect();
    shapes.extend([100.0, 250.0, 400.0].iter().map(|&x| line(x - 0.5, 100.0, 1.0, 60.0)));
    shapes.push(rect(100.0, 100.0, 150.0, 30.0, Some("#4472C4"), None));
    shapes.push(rect(250.0, 100.0, 150.0, 30.0, Some("#4472C4"), None));

    json!({
        "width": 960, "height": 540,
        "shapes": shapes,
        "texts": [
            text("Region", 110.0, 108.0, 160.0, 122.0, true),
            text("North", 110.0, 138.0, 150.0, 152.0, false),
            {"content": "\u{F0E0}", "x": 600, "y": 300, "x2": 620, "y2": 320,
             "font_size": 20, "font_name": "FontAwesome6Free-Solid"},
            text("Contact", 40.0, 515.0, 100.0, 527.0, false),
        ],
    })
}

fn document(pages: Vec<Value>) -> DocumentInput {
    parse_input(&json!({ "pages": pages }).to_string()).unwrap()
}

#[test]
fn test_busy_slide_structure() {
    let layout = reconstruct(&document(vec![busy_slide()]));
    assert_eq!(layout.page_count(), 1);
    assert!(layout.failed_pages.is_empty());
    let page = &layout.pages[0];

    // Only the ring survives as a vector shape
    assert_eq!(page.shapes.len(), 1);
    let ring = &page.shapes[0];
    assert!(ring.is_ring);
    assert_eq!(ring.ring_type, Some(RingType::Paired));
    assert_eq!(ring.shape_type, ShapeKind::Oval);
    assert_eq!(ring.ring_color, Some(Color::rgb(0xED, 0x7D, 0x31)));
    assert_eq!(ring.fill_color, Some(Color::WHITE));
    assert_eq!(ring.bbox, BBox::new(700.0, 60.0, 760.0, 120.0));

    assert_eq!(page.tables.len(), 1);
    let table = &page.tables[0];
    assert_eq!((table.rows, table.cols), (3, 3));
    assert_eq!(table.cell(0, 0).unwrap().text, "Region");
    assert_eq!(table.cell(1, 0).unwrap().text, "North");
    assert_eq!(table.cell(0, 1).unwrap().fill_color, Color::rgb(0x44, 0x72, 0xC4));

    assert_eq!(page.charts.len(), 1);
    let chart = &page.charts[0];
    assert!(chart.is_chart);
    assert_eq!(chart.members.len(), 5);
    assert!(chart.raster.width_px > 0);

    // Title split by style, chart label gone, caption kept
    let texts: Vec<&str> = page.text_blocks.iter().map(|b| b.text.as_str()).collect();
    assert_eq!(texts, vec!["Quarterly Review", "(draft)", "Revenue by quarter"]);
}

#[test]
fn test_duplicate_overlap_keeps_transparent_shape_and_border() {
    let layout = reconstruct(&document(vec![duplicate_slide()]));
    let shapes = &layout.pages[0].shapes;
    assert_eq!(shapes.len(), 2);

    let border = &shapes[0];
    assert_eq!(border.border_side, Some(BorderSide::Left));
    assert_eq!(border.role, Some(ShapeRole::Border));
    assert_eq!((border.bbox.x0, border.bbox.x1, border.bbox.y0), (60.0, 61.5, 215.0));
    assert!((border.bbox.y1 - 303.7).abs() < 1e-3);
    assert_eq!(border.fill_color, Some(Color::rgb(0xDA, 0xE3, 0xF3)));
    assert_eq!(border.fill_opacity, 1.0);

    assert!((shapes[1].fill_opacity - 0.0314).abs() < 1e-6);
    assert_eq!(shapes[1].bbox.x0, 61.5);
}

#[test]
fn test_ruled_table_icons_and_roles() {
    let layout = reconstruct(&document(vec![ruled_slide(), busy_slide()]));
    let page = &layout.pages[0];

    assert_eq!(page.tables.len(), 1);
    let table = &page.tables[0];
    assert_eq!((table.rows, table.cols), (2, 2));
    assert_eq!(table.rule_sources.len(), 6);
    assert_eq!(table.cell(0, 1).unwrap().fill_color, Color::rgb(0x44, 0x72, 0xC4));
    assert_eq!(table.cell(0, 0).unwrap().text, "Region");
    assert_eq!(table.cell(1, 0).unwrap().text, "North");
    assert!(page.shapes.is_empty());

    assert_eq!(page.icons.len(), 1);
    assert_eq!(page.icons[0].glyph, "\u{F0E0}");
    assert_eq!(page.text_blocks.len(), 1);
    assert_eq!(page.text_blocks[0].role, Some(TextRole::Footer));

    // Big bold title near the top of the second slide
    let title = &layout.pages[1].text_blocks[0];
    assert_eq!(title.text, "Quarterly Review");
    assert_eq!(title.role, Some(TextRole::Title));

    let stats = ReconstructionStats::from_layout(&layout);
    assert_eq!(stats.icon_count, 1);
    assert_eq!(stats.table_count, 2);

    let value: Value = serde_json::from_str(&to_json(&layout, JsonFormat::Compact).unwrap()).unwrap();
    assert_eq!(value["pages"][0]["text_blocks"][0]["role"], "footer");
    assert_eq!(value["pages"][0]["icons"][0]["raster"]["format"], "png");
    assert!(value["pages"][1].get("icons").is_none());
}

#[test]
fn test_failed_page_does_not_stop_document() {
    let broken = json!({"width": -1, "height": 540, "texts": [text("kept", 0.0, 0.0, 30.0, 12.0, false)]});
    let layout = reconstruct(&document(vec![busy_slide(), broken, duplicate_slide()]));

    assert_eq!(layout.page_count(), 3);
    assert_eq!(layout.failed_pages, vec![2]);
    let failed = layout.page(2).unwrap();
    assert!(failed.passthrough);
    assert_eq!(failed.text_blocks[0].text, "kept");
    assert_eq!(layout.page(3).unwrap().shapes.len(), 2);
}

#[test]
fn test_malformed_records_are_skipped() {
    let page = json!({
        "width": 960, "height": 540,
        "shapes": [
            {"x": 10, "y": 10, "height": 20, "fill_color": "#FF0000"},
            {"x": 10, "y": 10, "width": 20, "height": 20, "fill_color": "not a color"},
            {"x": 10, "y": 10, "width": 20, "height": 20, "fill_color": "None"},
        ],
        "texts": [{"x": 1, "y": 1, "x2": 5, "y2": 5}],
    });
    let layout = reconstruct(&document(vec![page]));
    let page = &layout.pages[0];
    assert!(!page.passthrough);
    assert_eq!(page.shapes.len(), 1);
    assert_eq!(page.shapes[0].fill_color, None);
    assert!(page.text_blocks.is_empty());
}

#[test]
fn test_coefficients_scale_geometry() {
    let input = parse_input(
        &json!({
            "coefficients": {"scale": 0.5, "stroke_width_scale": 2.0},
            "pages": [{"width": 1920, "height": 1080, "shapes": [
                {"x": 100, "y": 100, "width": 300, "height": 40, "stroke_color": "#000000", "stroke_width": 2}
            ]}],
        })
        .to_string(),
    )
    .unwrap();
    let layout = reconstruct(&input);
    let page = &layout.pages[0];
    assert_eq!((page.width, page.height), (960.0, 540.0));
    assert_eq!(page.shapes[0].bbox, BBox::new(50.0, 50.0, 200.0, 70.0));
    assert_eq!(page.shapes[0].stroke_width, 2.0);
}

#[test]
fn test_page_selection() {
    let input = document(vec![busy_slide(), duplicate_slide(), busy_slide()]);
    let options = ReconstructOptions::default().with_pages(PageSelection::parse("1,3").unwrap());
    let layout = Reconstructor::new(options).reconstruct(&input);
    let numbers: Vec<u32> = layout.pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 3]);
}

/// Fails a fixed number of times before rendering.
struct FlakyRasterizer {
    failures: u32,
    calls: AtomicU32,
}

impl Rasterizer for FlakyRasterizer {
    fn rasterize(&self, _page: u32, clip: &BBox, zoom: f32) -> Result<RasterImage> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(Error::Raster("renderer busy".to_string()));
        }
        Ok(RasterImage {
            format: "png".to_string(),
            width_px: (clip.width() * zoom) as u32,
            height_px: (clip.height() * zoom) as u32,
            data: vec![0x89, b'P', b'N', b'G'],
        })
    }
}

#[test]
fn test_rasterizer_retries_then_succeeds() {
    let rasterizer = Arc::new(FlakyRasterizer {
        failures: 2,
        calls: AtomicU32::new(0),
    });
    let reconstructor = Reconstructor::new(ReconstructOptions::default().with_raster_retries(2))
        .with_rasterizer(rasterizer.clone());
    let layout = reconstructor.reconstruct(&document(vec![busy_slide()]));

    assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 3);
    assert_eq!(layout.pages[0].charts.len(), 1);
    assert_eq!(layout.pages[0].charts[0].raster.data, vec![0x89, b'P', b'N', b'G']);
}

#[test]
fn test_rasterizer_exhausted_keeps_vectors() {
    let rasterizer = Arc::new(FlakyRasterizer {
        failures: u32::MAX,
        calls: AtomicU32::new(0),
    });
    let reconstructor = Reconstructor::new(ReconstructOptions::default().with_raster_retries(1))
        .with_rasterizer(rasterizer);
    let layout = reconstructor.reconstruct(&document(vec![busy_slide()]));
    let page = &layout.pages[0];

    assert!(page.charts.is_empty());
    // Ring plus the five bars
    assert_eq!(page.shapes.len(), 6);
    assert!(page.text_blocks.iter().any(|b| b.text == "Q1"));
}

#[test]
fn test_reconstruct_file_with_config() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("deck.json");
    std::fs::write(&input_path, json!({ "pages": [busy_slide()] }).to_string()).unwrap();
    let config_path = dir.path().join("thresholds.json");
    std::fs::write(&config_path, r#"{"detect_charts": false, "tables": {"min_rows": 4}}"#).unwrap();

    let options = ReconstructOptions::from_json_file(&config_path).unwrap();
    let layout = reconstruct_file(&input_path, options).unwrap();
    let page = &layout.pages[0];
    assert!(page.charts.is_empty());
    assert!(page.tables.is_empty());
}

#[test]
fn test_missing_file_is_io_error() {
    let err = reconstruct_file("does/not/exist.json", ReconstructOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_stats_and_json_output() {
    let layout = reconstruct(&document(vec![busy_slide(), duplicate_slide()]));
    let stats = ReconstructionStats::from_layout(&layout);
    assert_eq!(stats.page_count, 2);
    assert_eq!(stats.ring_count, 1);
    assert_eq!(stats.table_count, 1);
    assert_eq!(stats.cell_count, 9);
    assert_eq!(stats.chart_count, 1);
    assert_eq!(stats.charted_shape_count, 5);
    assert_eq!(stats.failed_page_count, 0);

    let json = to_json(&layout, JsonFormat::Compact).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["pages"][0]["tables"][0]["cols"], 3);
    assert_eq!(value["pages"][0]["shapes"][0]["ring_type"], "paired");
    assert_eq!(value["pages"][0]["charts"][0]["is_chart"], true);
}
