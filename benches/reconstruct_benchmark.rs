//! Benchmarks for pdfdeck reconstruction performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic slides: a cell grid, a bar chart, ring
//! badges and scattered text.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pdfdeck::model::{
    BBox, Color, DocumentInput, Page, PageInput, RawShape, RawTextRun, Shape, ShapeId, TextRun,
};
use pdfdeck::reconstruct::{TableDetector, TextAssembler};
use pdfdeck::{merge_shapes, ReconstructOptions, Reconstructor};

const PALETTE: [Color; 3] = [
    Color::rgb(0x44, 0x72, 0xC4),
    Color::rgb(0xED, 0x7D, 0x31),
    Color::rgb(0xA5, 0xA5, 0xA5),
];

/// Creates a busy synthetic slide.
fn create_test_page(number: u32, rows: usize, cols: usize) -> Page {
    let mut page = Page::widescreen(number);

    for r in 0..rows {
        for c in 0..cols {
            let bbox = BBox::from_xywh(40.0 + 70.0 * c as f32, 120.0 + 24.0 * r as f32, 70.0, 24.0);
            // Background, foreground and border stacked like generated decks
            page.add_shape(Shape::new(ShapeId(0), bbox).with_fill(Color::WHITE));
            if r == 0 {
                page.add_shape(Shape::new(ShapeId(0), bbox).with_fill(PALETTE[0]));
            }
            page.add_shape(Shape::new(ShapeId(0), bbox).with_stroke(Color::rgb(0xBF, 0xBF, 0xBF), 0.75));
            page.add_text(TextRun::new(
                format!("r{}c{}", r, c),
                BBox::new(bbox.x0 + 4.0, bbox.y0 + 6.0, bbox.x0 + 40.0, bbox.y0 + 18.0),
                10.0,
            ));
        }
    }

    for i in 0..12 {
        let h = 40.0 + 10.0 * (i % 7) as f32;
        page.add_shape(
            Shape::new(ShapeId(0), BBox::from_xywh(600.0 + 25.0 * i as f32, 460.0 - h, 20.0, h))
                .with_fill(PALETTE[i % 3]),
        );
    }

    for i in 0..4 {
        let x = 600.0 + 80.0 * i as f32;
        page.add_shape(Shape::new(ShapeId(0), BBox::from_xywh(x, 40.0, 50.0, 50.0)).with_fill(PALETTE[1]));
        page.add_shape(
            Shape::new(ShapeId(0), BBox::from_xywh(x + 3.0, 43.0, 44.0, 44.0)).with_stroke(PALETTE[1], 3.0),
        );
    }

    for i in 0..40 {
        let (x, y) = (40.0 + 45.0 * (i % 12) as f32, 20.0 + 20.0 * (i / 12) as f32);
        page.add_text(TextRun::new(
            format!("word{}", i),
            BBox::new(x, y, x + 40.0, y + 12.0),
            12.0,
        ));
    }
    page
}

/// Converts a page back into decoder records.
fn create_test_input(page_count: u32) -> DocumentInput {
    let pages = (1..=page_count)
        .map(|n| {
            let page = create_test_page(n, 6, 6);
            PageInput {
                number: Some(n),
                width: page.width,
                height: page.height,
                texts: page
                    .texts
                    .iter()
                    .map(|t| RawTextRun {
                        content: Some(t.content.clone()),
                        x: Some(t.bbox.x0),
                        y: Some(t.bbox.y0),
                        x2: Some(t.bbox.x1),
                        y2: Some(t.bbox.y1),
                        font_size: Some(t.font_size),
                        ..Default::default()
                    })
                    .collect(),
                shapes: page
                    .shapes
                    .iter()
                    .map(|s| RawShape {
                        x: Some(s.bbox.x0),
                        y: Some(s.bbox.y0),
                        width: Some(s.bbox.width()),
                        height: Some(s.bbox.height()),
                        fill_color: s.fill_color.map(|c| c.to_string()),
                        stroke_color: s.stroke_color.map(|c| c.to_string()),
                        stroke_width: Some(s.stroke_width),
                        ..Default::default()
                    })
                    .collect(),
                images: Vec::new(),
            }
        })
        .collect();
    DocumentInput {
        coefficients: Default::default(),
        pages,
    }
}

/// Benchmark the individual stages on one slide.
fn bench_stages(c: &mut Criterion) {
    let page = create_test_page(1, 8, 8);

    c.bench_function("merge_shapes", |b| {
        b.iter(|| merge_shapes(black_box(page.shapes.clone())));
    });

    let detector = TableDetector::new();
    let merged = merge_shapes(page.shapes.clone());
    c.bench_function("detect_tables", |b| {
        b.iter(|| detector.detect(black_box(merged.clone()), page.texts.clone(), page.width, page.height));
    });

    let assembler = TextAssembler::new();
    c.bench_function("assemble_text", |b| {
        b.iter(|| assembler.assemble(black_box(page.texts.clone())));
    });
}

/// Benchmark whole documents at various sizes.
fn bench_documents(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct_document");

    for page_count in [1, 10, 50].iter() {
        let input = create_test_input(*page_count);

        group.bench_function(format!("{}_pages", page_count), |b| {
            let reconstructor = Reconstructor::default();
            b.iter(|| reconstructor.reconstruct(black_box(&input)));
        });

        #[cfg(feature = "parallel")]
        group.bench_function(format!("{}_pages_parallel", page_count), |b| {
            let reconstructor = Reconstructor::new(ReconstructOptions::default().with_parallel(true));
            b.iter(|| reconstructor.reconstruct(black_box(&input)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_stages, bench_documents);
criterion_main!(benches);
