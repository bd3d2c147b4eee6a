//! Invariants that must hold on any page, checked over generated slides.

use std::collections::HashSet;

use pdfdeck::model::{BBox, Color, Page, Shape, ShapeId, TextRun};
use pdfdeck::reconstruct::{OverlapFilter, TableDetector, TextAssembler};
use pdfdeck::{merge_shapes, ReconstructOptions, Reconstructor};

/// Small deterministic generator so failures reproduce.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (self.next() % 10_000) as f32 / 10_000.0 * (hi - lo)
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next() as usize % items.len()]
    }
}

const PALETTE: [Color; 5] = [
    Color::rgb(0x44, 0x72, 0xC4),
    Color::rgb(0xED, 0x7D, 0x31),
    Color::rgb(0xA5, 0xA5, 0xA5),
    Color::rgb(0xFF, 0xFF, 0xFF),
    Color::rgb(0x00, 0x00, 0x00),
];

fn random_page(seed: u64) -> Page {
    let mut rng = Lcg(seed);
    let mut page = Page::widescreen(1);

    let shapes = 5 + rng.next() % 40;
    for _ in 0..shapes {
        let (x, y) = (rng.range(0.0, 900.0), rng.range(0.0, 500.0));
        let (w, h) = (rng.range(1.0, 200.0), rng.range(1.0, 120.0));
        let mut shape = Shape::new(ShapeId(0), BBox::from_xywh(x, y, w, h));
        match rng.next() % 4 {
            0 => shape = shape.with_fill(*rng.pick(&PALETTE)),
            1 => shape = shape.with_stroke(*rng.pick(&PALETTE), rng.range(0.5, 4.0)),
            2 => {
                shape = shape
                    .with_fill(*rng.pick(&PALETTE))
                    .with_stroke(*rng.pick(&PALETTE), 1.0)
            }
            _ => shape = shape.with_fill(*rng.pick(&PALETTE)).with_fill_opacity(rng.range(0.0, 1.0)),
        }
        page.add_shape(shape);
    }

    // A regular grid on some pages
    if rng.next() % 2 == 0 {
        let rows = 2 + rng.next() % 4;
        let cols = 2 + rng.next() % 4;
        for r in 0..rows {
            for c in 0..cols {
                page.add_shape(
                    Shape::new(
                        ShapeId(0),
                        BBox::from_xywh(60.0 + 90.0 * c as f32, 300.0 + 28.0 * r as f32, 90.0, 28.0),
                    )
                    .with_fill(Color::WHITE)
                    .with_stroke(Color::rgb(0xBF, 0xBF, 0xBF), 0.75),
                );
            }
        }
    }

    let texts = rng.next() % 30;
    for i in 0..texts {
        let (x, y) = (rng.range(0.0, 900.0), rng.range(0.0, 520.0));
        let mut run = TextRun::new(format!("w{}", i), BBox::new(x, y, x + rng.range(5.0, 60.0), y + 12.0), 12.0);
        run.is_bold = rng.next() % 3 == 0;
        page.add_text(run);
    }
    page
}

#[test]
fn test_shape_merging_is_idempotent() {
    for seed in 0..50 {
        let once = merge_shapes(random_page(seed).shapes);
        let twice = merge_shapes(once.clone());
        assert_eq!(once, twice, "seed {}", seed);
    }
}

#[test]
fn test_merged_rings_never_share_sources() {
    for seed in 0..50 {
        let merged = merge_shapes(random_page(seed).shapes);
        let mut seen = HashSet::new();
        for shape in merged.iter().filter(|s| s.is_ring) {
            for source in &shape.sources {
                assert!(seen.insert(*source), "seed {}: {:?} used twice", seed, source);
            }
        }
    }
}

#[test]
fn test_text_assembly_keeps_every_run() {
    let assembler = TextAssembler::new();
    for seed in 0..50 {
        let runs = random_page(seed).texts;
        let count = runs.len();
        let blocks = assembler.assemble(runs);
        let total: usize = blocks.iter().map(|b| b.runs.len()).sum();
        assert_eq!(total, count, "seed {}", seed);
        for block in &blocks {
            assert!(block.runs.iter().all(|r| r.is_bold == block.is_bold));
        }
    }
}

#[test]
fn test_table_columns_are_monotonic_and_plausible() {
    let detector = TableDetector::new();
    let config = ReconstructOptions::default().tables;
    for seed in 0..50 {
        let page = random_page(seed);
        let result = detector.detect(merge_shapes(page.shapes), page.texts, page.width, page.height);
        for table in &result.tables {
            let xs = &table.column_x_positions;
            assert!(xs.windows(2).all(|w| w[1] - w[0] >= config.column_merge_tolerance), "seed {}", seed);
            assert_eq!(xs.len(), table.cols);
            assert_eq!(table.column_widths.len(), table.cols);
            assert_eq!(table.row_heights.len(), table.rows);
            assert!(table.rows >= 2 && table.cols >= 2);
            for cell in &table.cells {
                assert!(cell.row + cell.row_span <= table.rows, "seed {}", seed);
                assert!(cell.col + cell.col_span <= table.cols, "seed {}", seed);
            }
        }
    }
}

#[test]
fn test_filters_only_remove() {
    let filter = OverlapFilter::new();
    let assembler = TextAssembler::new();
    for seed in 0..30 {
        let page = random_page(seed);
        let blocks = assembler.assemble(page.texts);
        let before: HashSet<ShapeId> = page.shapes.iter().map(|s| s.id).collect();
        let after = filter.filter_decorations(page.shapes, &blocks);
        assert!(after.iter().all(|s| before.contains(&s.id)));
    }
}

#[test]
fn test_consumed_shapes_are_not_reported_twice() {
    let reconstructor = Reconstructor::default();
    for seed in 0..30 {
        let layout = reconstructor.reconstruct_page(random_page(seed)).unwrap();
        let mut seen = HashSet::new();
        for id in layout.shapes.iter().map(|s| s.id) {
            assert!(seen.insert(id), "seed {}", seed);
        }
        for table in &layout.tables {
            for id in table.source_shapes() {
                assert!(seen.insert(id), "seed {}: {:?} in table and elsewhere", seed, id);
            }
        }
        for chart in &layout.charts {
            for id in &chart.members {
                assert!(seen.insert(*id), "seed {}: {:?} in chart and elsewhere", seed, id);
            }
        }
    }
}
