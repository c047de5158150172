use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pnr_loader::record::map_records;
use pnr_loader::table::PnrTable;
use pnr_loader::xml_flatten::flatten_str;
use rand::{seq::SliceRandom, thread_rng, Rng};

const HEADER: [&str; 10] = [
    "firstname",
    "lastname",
    "address",
    "age",
    "source",
    "dest",
    "travelDate",
    "class",
    "bookingTime",
    "npass",
];

// Build a SpreadsheetML-style document with `rows` data rows, ~5% of them incomplete
fn generate_document(rows: usize) -> String {
    let mut rng = thread_rng();
    let airports = ["JFK", "LAX", "ORD", "ATL", "DFW", "SFO"];
    let classes = ["Economy", "Business", "First"];

    let mut xml = String::from("<Workbook><Worksheet><Table>\n");
    let push_row = |xml: &mut String, cells: &[String]| {
        xml.push_str("<Row>");
        for cell in cells {
            xml.push_str("<Cell><Data ss:Type=\"String\">");
            xml.push_str(cell);
            xml.push_str("</Data></Cell>");
        }
        xml.push_str("</Row>\n");
    };

    let header: Vec<String> = HEADER.iter().map(|h| h.to_string()).collect();
    push_row(&mut xml, &header);

    for i in 0..rows {
        let mut cells = vec![
            format!("First{}", i),
            format!("Last{}", i),
            format!("{} Main St", rng.gen_range(1..999)),
            rng.gen_range(1..99).to_string(),
            airports.choose(&mut rng).unwrap().to_string(),
            airports.choose(&mut rng).unwrap().to_string(),
            format!("2021-05-{:02}", rng.gen_range(1..29)),
            classes.choose(&mut rng).unwrap().to_string(),
            format!("2021-04-{:02} 10:00:00", rng.gen_range(1..29)),
            rng.gen_range(1..6).to_string(),
        ];
        if rng.gen_bool(0.05) {
            let blank = rng.gen_range(0..cells.len());
            cells[blank].clear();
        }
        push_row(&mut xml, &cells);
    }

    xml.push_str("</Table></Worksheet></Workbook>\n");
    xml
}

pub fn flatten_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pnr_flatten_and_clean");

    for rows in [100, 1_000, 10_000].iter() {
        let xml = generate_document(*rows);

        group.bench_with_input(BenchmarkId::from_parameter(rows), &xml, |b, xml| {
            b.iter(|| {
                let sheet = flatten_str(xml).unwrap();
                let mut table = PnrTable::from_sheet(sheet).unwrap();
                table.drop_incomplete();
                black_box(map_records(&table).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, flatten_benchmark);
criterion_main!(benches);
