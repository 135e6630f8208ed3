//! Benchmarks for placeholder scanning and a full generation run.

use std::path::Path;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use cimdoc_document::{CaptionLabels, Document, FlowDocument, MemoryApp};
use cimdoc_model::{ClassDoc, DocModel, PackageDoc, PropertiesDoc};
use cimdoc_writer::{CursorList, Writer, WriterOptions, scan_captions};

/// Template with `sections` headings, each followed by a caption, prose and
/// a few placeholders.
fn generate_template(sections: usize) -> FlowDocument {
    let mut doc = FlowDocument::new();
    for i in 0..sections {
        doc.push_paragraph(None, &format!("Section {i}"))
            .push_caption("Table", i + 1, &format!("Existing table {i}"))
            .push_paragraph(
                None,
                &format!("Class {i} is described in {{CLASS:P{i}.C{i}}} of {{FILE}}."),
            )
            .push_paragraph(None, &format!("Value: {{ATTR:C{i}.value}}"))
            .push_table(&[&["a", "b"], &["c", "{FILE}"]]);
    }
    doc
}

fn generate_model(sections: usize) -> DocModel {
    let packages = (0..sections)
        .map(|i| PackageDoc {
            name: format!("P{i}"),
            classes: vec![ClassDoc {
                name: format!("C{i}"),
                description: format!("Class number {i}."),
                attributes: vec![PropertiesDoc {
                    name: "value".to_owned(),
                    type_name: "String".to_owned(),
                    value: Some(i.to_string()),
                    ..PropertiesDoc::default()
                }],
                ..ClassDoc::default()
            }],
            ..PackageDoc::default()
        })
        .collect();
    DocModel::new("bench.eap", packages)
}

fn bench_scan(c: &mut Criterion) {
    let labels = CaptionLabels::default();
    let mut group = c.benchmark_group("scan_by_size");

    for sections in [10, 100, 500] {
        let template = generate_template(sections);
        group.throughput(Throughput::Bytes(template.text().len() as u64));
        group.bench_with_input(
            BenchmarkId::new("captions_and_cursors", sections),
            &template,
            |b, template| {
                b.iter(|| {
                    let mut doc = template.clone();
                    let captions = scan_captions(&mut doc, &labels);
                    CursorList::scan(&doc, &captions)
                });
            },
        );
    }

    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let sections = 50;
    let model = generate_model(sections);
    let app = MemoryApp::new().with_document("template.docx", generate_template(sections));
    let mut writer = Writer::new(app, WriterOptions::default());

    c.bench_function("generate_50_sections", |b| {
        b.iter(|| {
            writer
                .write(Path::new("template.docx"), Path::new("out.docx"), &model)
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_scan, bench_generate);
criterion_main!(benches);
